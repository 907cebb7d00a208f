// Routing Repository Port (Interface)

use crate::domain::{Revision, Routing};
use crate::error::Result;
use async_trait::async_trait;

/// Durable job category -> queue mappings with an in-process lookup cache
#[async_trait]
pub trait RoutingRepository: Send + Sync {
    /// Upsert the mapping for `job_category`
    ///
    /// # Errors
    /// - `AppError::QueueNotFound` if `queue_name` is not a defined queue;
    ///   nothing is written and the cache is untouched
    async fn add(&self, job_category: &str, queue_name: &str) -> Result<bool>;

    /// Cached lookup for the dispatch hot path (no I/O)
    fn find_queue_name_by_job_category(&self, job_category: &str) -> Option<String>;

    /// All mappings ordered by queue name; replaces the whole cache
    async fn find_all(&self) -> Result<Vec<Routing>>;

    /// Remove the mapping; bumps revision if a row existed
    async fn delete_by_job_category(&self, job_category: &str) -> Result<()>;

    /// Resynchronize the cache from durable storage
    async fn reload(&self) -> Result<()> {
        self.find_all().await.map(|_| ())
    }

    /// Current `routing` revision (0 if never mutated)
    async fn revision(&self) -> Result<Revision>;
}
