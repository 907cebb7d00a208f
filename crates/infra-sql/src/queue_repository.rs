// SQL QueueRepository Implementation

use crate::connection::SqlBackend;
use crate::error::map_sqlx_error;
use crate::revision;
use crate::store::SqlStore;
use async_trait::async_trait;
use conveyor_core::domain::{ConfigDomain, DomainError, Queue, Revision};
use conveyor_core::error::{AppError, Result};
use conveyor_core::port::QueueRepository;
use sqlx::AnyConnection;
use std::time::Duration;
use tracing::debug;

const SELECT_QUEUES: &str = r#"
    SELECT q.name, q.polling_interval_ms, q.max_workers,
           t.max_dispatches_per_second, t.max_burst_size
    FROM queue q
    LEFT JOIN queue_throttle t ON t.name = q.name
"#;

pub struct SqlQueueRepository {
    store: SqlStore,
}

impl SqlQueueRepository {
    pub fn new(store: SqlStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl QueueRepository for SqlQueueRepository {
    async fn add(&self, queue: &Queue) -> Result<bool> {
        queue
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let _gate = self.store.lock_writes().await;
        let mut tx = self.store.begin_write().await?;

        let backend = self.store.backend();
        let base_changed = upsert_base(&mut tx, backend, queue).await?;
        let throttle_changed = upsert_throttle(&mut tx, backend, queue).await?;
        let changed = base_changed || throttle_changed;

        // One bump per logical write, committed together with the rows
        let revision = if changed {
            Some(revision::bump(&mut tx, backend, ConfigDomain::QueueDefinition).await?)
        } else {
            None
        };

        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(
            queue = %queue.name,
            changed,
            base_changed,
            throttle_changed,
            revision = ?revision,
            "Queue definition written"
        );
        Ok(changed)
    }

    async fn find_all(&self) -> Result<Vec<Queue>> {
        let rows: Vec<QueueRow> = sqlx::query_as(&format!("{} ORDER BY q.name", SELECT_QUEUES))
            .fetch_all(self.store.pool())
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(QueueRow::into_queue).collect()
    }

    async fn find_by_name(&self, name: &str) -> Result<Queue> {
        let row: Option<QueueRow> = sqlx::query_as(&format!("{} WHERE q.name = ?", SELECT_QUEUES))
            .bind(name)
            .fetch_optional(self.store.pool())
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => row.into_queue(),
            None => Err(AppError::NotFound(format!("Queue {} not found", name))),
        }
    }

    async fn delete_by_name(&self, name: &str) -> Result<()> {
        let _gate = self.store.lock_writes().await;
        let mut tx = self.store.begin_write().await?;

        let deleted = sqlx::query("DELETE FROM queue WHERE name = ?")
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        // A missing throttle row is fine
        sqlx::query("DELETE FROM queue_throttle WHERE name = ?")
            .bind(name)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let revision = if deleted > 0 {
            let backend = self.store.backend();
            Some(revision::bump(&mut tx, backend, ConfigDomain::QueueDefinition).await?)
        } else {
            None
        };

        tx.commit().await.map_err(map_sqlx_error)?;

        debug!(queue = %name, existed = deleted > 0, revision = ?revision, "Queue deleted");
        Ok(())
    }

    async fn revision(&self) -> Result<Revision> {
        revision::current(self.store.pool(), ConfigDomain::QueueDefinition).await
    }
}

/// Write the queue row if missing or different
async fn upsert_base(conn: &mut AnyConnection, backend: SqlBackend, queue: &Queue) -> Result<bool> {
    let polling_interval_ms = i64::try_from(queue.polling_interval_ms()).map_err(|_| {
        AppError::Validation(format!("polling interval of {} is too large", queue.name))
    })?;
    let max_workers = i64::from(queue.max_workers);

    let existing: Option<(i64, i64)> =
        sqlx::query_as("SELECT polling_interval_ms, max_workers FROM queue WHERE name = ?")
            .bind(&queue.name)
            .fetch_optional(&mut *conn)
            .await
            .map_err(map_sqlx_error)?;

    if existing == Some((polling_interval_ms, max_workers)) {
        return Ok(false);
    }

    // Upsert even when the read saw nothing: another process may insert
    // the same name before this transaction does.
    let statement = format!(
        "INSERT INTO queue (name, polling_interval_ms, max_workers) VALUES (?, ?, ?) {}",
        backend.upsert_clause("name", &["polling_interval_ms", "max_workers"])
    );
    sqlx::query(&statement)
        .bind(&queue.name)
        .bind(polling_interval_ms)
        .bind(max_workers)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    Ok(true)
}

/// Write the throttle row if missing or different
async fn upsert_throttle(
    conn: &mut AnyConnection,
    backend: SqlBackend,
    queue: &Queue,
) -> Result<bool> {
    let max_burst_size = i64::from(queue.max_burst_size);

    let existing: Option<(f64, i64)> = sqlx::query_as(
        "SELECT max_dispatches_per_second, max_burst_size FROM queue_throttle WHERE name = ?",
    )
    .bind(&queue.name)
    .fetch_optional(&mut *conn)
    .await
    .map_err(map_sqlx_error)?;

    if existing == Some((queue.max_dispatches_per_second, max_burst_size)) {
        return Ok(false);
    }

    let statement = format!(
        "INSERT INTO queue_throttle (name, max_dispatches_per_second, max_burst_size) \
         VALUES (?, ?, ?) {}",
        backend.upsert_clause("name", &["max_dispatches_per_second", "max_burst_size"])
    );
    sqlx::query(&statement)
        .bind(&queue.name)
        .bind(queue.max_dispatches_per_second)
        .bind(max_burst_size)
        .execute(&mut *conn)
        .await
        .map_err(map_sqlx_error)?;

    Ok(true)
}

/// SQL row representation (queue joined with its optional throttle row)
#[derive(Debug, sqlx::FromRow)]
struct QueueRow {
    name: String,
    polling_interval_ms: i64,
    max_workers: i64,
    max_dispatches_per_second: Option<f64>,
    max_burst_size: Option<i64>,
}

impl QueueRow {
    fn into_queue(self) -> Result<Queue> {
        let out_of_range =
            |field: &str| DomainError::OutOfRange(format!("{}.{}", self.name, field));

        let polling_interval_ms = u64::try_from(self.polling_interval_ms)
            .map_err(|_| out_of_range("polling_interval_ms"))?;
        let max_workers =
            u32::try_from(self.max_workers).map_err(|_| out_of_range("max_workers"))?;
        let max_burst_size = u32::try_from(self.max_burst_size.unwrap_or(0))
            .map_err(|_| out_of_range("max_burst_size"))?;

        Ok(Queue {
            polling_interval: Duration::from_millis(polling_interval_ms),
            max_workers,
            max_dispatches_per_second: self.max_dispatches_per_second.unwrap_or(0.0),
            max_burst_size,
            name: self.name,
        })
    }
}
