// Shared SQL store handle

use crate::connection::{create_pool, SqlBackend};
use crate::error::map_sqlx_error;
use crate::migration::run_migrations;
use conveyor_core::error::Result;
use sqlx::{Any, AnyPool, Transaction};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Pool plus the in-process writer gate shared by both repositories
///
/// Mutations read the current row before writing it, inside one
/// transaction. Serializing in-process writers keeps those transactions
/// from racing each other into SQLITE_BUSY on upgrade.
#[derive(Clone)]
pub struct SqlStore {
    pool: AnyPool,
    backend: SqlBackend,
    write_gate: Arc<Mutex<()>>,
}

impl SqlStore {
    /// Wrap an already migrated pool
    pub fn new(pool: AnyPool, backend: SqlBackend) -> Self {
        Self {
            pool,
            backend,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Open the data source and bring its schema up to date
    pub async fn connect(backend: SqlBackend, dsn: &str, max_connections: u32) -> Result<Self> {
        let pool = create_pool(backend, dsn, max_connections).await?;
        run_migrations(&pool, backend).await?;
        Ok(Self::new(pool, backend))
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn backend(&self) -> SqlBackend {
        self.backend
    }

    pub(crate) async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }

    /// Begin a transaction that will write
    ///
    /// SQLite takes the write lock up front: a deferred transaction that
    /// reads first fails with SQLITE_BUSY on upgrade when another handle
    /// holds the lock, while BEGIN IMMEDIATE waits out the busy timeout.
    pub(crate) async fn begin_write(&self) -> Result<Transaction<'static, Any>> {
        let tx = match self.backend {
            SqlBackend::Sqlite => self.pool.begin_with("BEGIN IMMEDIATE").await,
            SqlBackend::MySql => self.pool.begin().await,
        };
        tx.map_err(map_sqlx_error)
    }
}
