// SQL RoutingRepository Implementation

use crate::error::map_sqlx_error;
use crate::revision;
use crate::store::SqlStore;
use async_trait::async_trait;
use conveyor_core::application::RoutingCache;
use conveyor_core::domain::{ConfigDomain, Revision, Routing};
use conveyor_core::error::{AppError, Result};
use conveyor_core::port::RoutingRepository;
use tracing::{debug, info};

pub struct SqlRoutingRepository {
    store: SqlStore,
    cache: RoutingCache,
}

impl SqlRoutingRepository {
    /// Build the repository and fill its cache from storage
    pub async fn load(store: SqlStore) -> Result<Self> {
        let repo = Self {
            store,
            cache: RoutingCache::new(),
        };
        repo.reload().await?;
        Ok(repo)
    }
}

#[async_trait]
impl RoutingRepository for SqlRoutingRepository {
    async fn add(&self, job_category: &str, queue_name: &str) -> Result<bool> {
        let _gate = self.store.lock_writes().await;
        let mut tx = self.store.begin_write().await?;

        let queues: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queue WHERE name = ?")
            .bind(queue_name)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        if queues == 0 {
            return Err(AppError::queue_not_found(queue_name));
        }

        let existing: Option<String> =
            sqlx::query_scalar("SELECT queue_name FROM routing WHERE job_category = ?")
                .bind(job_category)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

        let revision = if existing.as_deref() == Some(queue_name) {
            None
        } else {
            // Upsert even when the read saw nothing: last write wins over a
            // category inserted by another process in the meantime.
            let backend = self.store.backend();
            let statement = format!(
                "INSERT INTO routing (job_category, queue_name) VALUES (?, ?) {}",
                backend.upsert_clause("job_category", &["queue_name"])
            );
            sqlx::query(&statement)
                .bind(job_category)
                .bind(queue_name)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            Some(revision::bump(&mut tx, backend, ConfigDomain::Routing).await?)
        };

        tx.commit().await.map_err(map_sqlx_error)?;

        // Durable state is known now; overwrite even on a no-op so a stale
        // entry for this category heals.
        self.cache.insert(job_category, queue_name);

        let changed = revision.is_some();
        debug!(
            job_category = %job_category,
            queue = %queue_name,
            changed,
            revision = ?revision,
            "Routing written"
        );
        Ok(changed)
    }

    fn find_queue_name_by_job_category(&self, job_category: &str) -> Option<String> {
        self.cache.get(job_category)
    }

    async fn find_all(&self) -> Result<Vec<Routing>> {
        // Held across the scan so an in-process add cannot be overwritten by
        // an older snapshot; readers only wait for the final swap.
        let _gate = self.store.lock_writes().await;

        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT job_category, queue_name FROM routing ORDER BY queue_name, job_category",
        )
        .fetch_all(self.store.pool())
        .await
        .map_err(map_sqlx_error)?;

        let entries = self.cache.replace_all(rows.iter().cloned());
        info!(entries, "Routing cache reloaded");

        Ok(rows
            .into_iter()
            .map(|(job_category, queue_name)| Routing {
                job_category,
                queue_name,
            })
            .collect())
    }

    async fn delete_by_job_category(&self, job_category: &str) -> Result<()> {
        let _gate = self.store.lock_writes().await;
        let mut tx = self.store.begin_write().await?;

        let deleted = sqlx::query("DELETE FROM routing WHERE job_category = ?")
            .bind(job_category)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        let revision = if deleted > 0 {
            Some(revision::bump(&mut tx, self.store.backend(), ConfigDomain::Routing).await?)
        } else {
            None
        };

        tx.commit().await.map_err(map_sqlx_error)?;
        self.cache.remove(job_category);

        debug!(
            job_category = %job_category,
            existed = deleted > 0,
            revision = ?revision,
            "Routing deleted"
        );
        Ok(())
    }

    async fn revision(&self) -> Result<Revision> {
        revision::current(self.store.pool(), ConfigDomain::Routing).await
    }
}
