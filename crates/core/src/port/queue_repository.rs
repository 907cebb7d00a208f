// Queue Repository Port (Interface)

use crate::domain::{Queue, Revision};
use crate::error::Result;
use async_trait::async_trait;

/// Durable CRUD over queue definitions and their throttle settings
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Upsert the queue and its throttle overlay as one logical write
    ///
    /// Returns `true` when any stored value changed. The `queue_definition`
    /// revision is bumped exactly once per changing call.
    async fn add(&self, queue: &Queue) -> Result<bool>;

    /// All queues ordered by name, throttle values merged in
    async fn find_all(&self) -> Result<Vec<Queue>>;

    /// Find queue by name
    ///
    /// # Errors
    /// - `AppError::NotFound` if no queue has this name
    async fn find_by_name(&self, name: &str) -> Result<Queue>;

    /// Remove queue and throttle rows; bumps revision if the queue existed
    async fn delete_by_name(&self, name: &str) -> Result<()>;

    /// Current `queue_definition` revision (0 if never mutated)
    async fn revision(&self) -> Result<Revision>;
}
