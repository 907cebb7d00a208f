// In-memory QueueRepository Implementation

use crate::store::{MemoryStore, QueueRecord, Tables, ThrottleRecord};
use async_trait::async_trait;
use conveyor_core::domain::{ConfigDomain, Queue, Revision};
use conveyor_core::error::{AppError, Result};
use conveyor_core::port::QueueRepository;
use std::time::Duration;
use tracing::debug;

pub struct MemoryQueueRepository {
    store: MemoryStore,
}

impl MemoryQueueRepository {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

fn merged(tables: &Tables, name: &str, record: &QueueRecord) -> Queue {
    let throttle = tables.throttles.get(name);
    Queue {
        name: name.to_string(),
        polling_interval: record.polling_interval,
        max_workers: record.max_workers,
        max_dispatches_per_second: throttle.map_or(0.0, |t| t.max_dispatches_per_second),
        max_burst_size: throttle.map_or(0, |t| t.max_burst_size),
    }
}

#[async_trait]
impl QueueRepository for MemoryQueueRepository {
    async fn add(&self, queue: &Queue) -> Result<bool> {
        queue
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let base = QueueRecord {
            // Whole milliseconds, as persisted by the SQL driver
            polling_interval: Duration::from_millis(queue.polling_interval_ms()),
            max_workers: queue.max_workers,
        };
        let throttle = ThrottleRecord {
            max_dispatches_per_second: queue.max_dispatches_per_second,
            max_burst_size: queue.max_burst_size,
        };

        let revision = self.store.with_tables(|t| {
            let existing = {
                let tables: &Tables = t;
                tables
                    .queues
                    .get(&queue.name)
                    .map(|record| merged(tables, &queue.name, record))
            };
            let base_changed = existing.as_ref().map_or(true, |e| !e.same_base(queue));
            let throttle_changed = existing.as_ref().map_or(true, |e| !e.same_throttle(queue));

            t.queues.insert(queue.name.clone(), base);
            t.throttles.insert(queue.name.clone(), throttle);

            (base_changed || throttle_changed)
                .then(|| t.bump_revision(ConfigDomain::QueueDefinition))
        })?;

        let changed = revision.is_some();
        debug!(queue = %queue.name, changed, revision = ?revision, "Queue definition written");
        Ok(changed)
    }

    async fn find_all(&self) -> Result<Vec<Queue>> {
        self.store.with_tables(|t| {
            let t: &Tables = t;
            t.queues
                .iter()
                .map(|(name, record)| merged(t, name, record))
                .collect()
        })
    }

    async fn find_by_name(&self, name: &str) -> Result<Queue> {
        self.store
            .with_tables(|t| {
                let t: &Tables = t;
                t.queues.get(name).map(|record| merged(t, name, record))
            })?
            .ok_or_else(|| AppError::NotFound(format!("Queue {} not found", name)))
    }

    async fn delete_by_name(&self, name: &str) -> Result<()> {
        let revision = self.store.with_tables(|t| {
            let existed = t.queues.remove(name).is_some();
            t.throttles.remove(name);
            existed.then(|| t.bump_revision(ConfigDomain::QueueDefinition))
        })?;

        debug!(queue = %name, existed = revision.is_some(), revision = ?revision, "Queue deleted");
        Ok(())
    }

    async fn revision(&self) -> Result<Revision> {
        self.store
            .with_tables(|t| t.revision(ConfigDomain::QueueDefinition))
    }
}
