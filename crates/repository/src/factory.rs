// Repository Factory - driver name -> consistent pair of repositories

use crate::config::{Driver, RepositoryConfig};
use conveyor_core::error::{AppError, Result};
use conveyor_core::port::{QueueRepository, RoutingRepository};
use conveyor_infra_memory::{MemoryQueueRepository, MemoryRoutingRepository, MemoryStore};
use conveyor_infra_sql::{SqlBackend, SqlQueueRepository, SqlRoutingRepository, SqlStore};
use std::sync::Arc;
use tracing::info;

/// Queue and routing repositories bound to the same store
#[derive(Clone)]
pub struct Repositories {
    pub queue: Arc<dyn QueueRepository>,
    pub routing: Arc<dyn RoutingRepository>,
}

/// Build both repositories for the configured driver
///
/// Errors are configuration failures (missing DSN, unreachable data
/// source, failed migration): callers should stop starting up.
pub async fn new_repositories(config: &RepositoryConfig) -> Result<Repositories> {
    info!(driver = %config.driver, "Selecting driver for repositories");

    match config.driver {
        Driver::Sqlite => sql_repositories(SqlBackend::Sqlite, config).await,
        Driver::MySql => sql_repositories(SqlBackend::MySql, config).await,
        Driver::InMemory => {
            let store = MemoryStore::new();
            Ok(Repositories {
                queue: Arc::new(MemoryQueueRepository::new(store.clone())),
                routing: Arc::new(MemoryRoutingRepository::new(store)?),
            })
        }
    }
}

async fn sql_repositories(backend: SqlBackend, config: &RepositoryConfig) -> Result<Repositories> {
    let dsn = config
        .dsn
        .as_deref()
        .ok_or_else(|| AppError::Config(format!("No data source name for {}", backend)))?;

    info!(backend = %backend, "Connecting database ...");
    let store = SqlStore::connect(backend, dsn, config.max_connections).await?;

    // The initial cache fill must succeed before anyone routes jobs
    let routing = SqlRoutingRepository::load(store.clone())
        .await
        .map_err(|e| AppError::Config(format!("Initial routing load failed: {}", e)))?;

    Ok(Repositories {
        queue: Arc::new(SqlQueueRepository::new(store)),
        routing: Arc::new(routing),
    })
}
