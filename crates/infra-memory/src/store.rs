// In-memory tables shared by both repositories

use conveyor_core::domain::{ConfigDomain, Revision};
use conveyor_core::error::{AppError, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// `queue` row
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QueueRecord {
    pub polling_interval: Duration,
    pub max_workers: u32,
}

/// `queue_throttle` row
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ThrottleRecord {
    pub max_dispatches_per_second: f64,
    pub max_burst_size: u32,
}

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub queues: BTreeMap<String, QueueRecord>,
    pub throttles: BTreeMap<String, ThrottleRecord>,
    pub routings: BTreeMap<String, String>,
    revisions: HashMap<ConfigDomain, Revision>,
}

impl Tables {
    pub fn revision(&self, domain: ConfigDomain) -> Revision {
        self.revisions.get(&domain).copied().unwrap_or(0)
    }

    pub fn bump_revision(&mut self, domain: ConfigDomain) -> Revision {
        let revision = self.revisions.entry(domain).or_insert(0);
        *revision += 1;
        *revision
    }
}

/// Process-local store; clones share the same tables
///
/// Every repository call runs as one closure under the table lock, which
/// makes each logical mutation (rows + revision bump) atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))?;
        Ok(f(&mut tables))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revisions_start_at_zero_and_are_independent() {
        let store = MemoryStore::new();
        let (queue_rev, routing_rev) = store
            .with_tables(|t| {
                t.bump_revision(ConfigDomain::QueueDefinition);
                t.bump_revision(ConfigDomain::QueueDefinition);
                (
                    t.revision(ConfigDomain::QueueDefinition),
                    t.revision(ConfigDomain::Routing),
                )
            })
            .unwrap();
        assert_eq!(queue_rev, 2);
        assert_eq!(routing_rev, 0);
    }

    #[test]
    fn test_clones_share_tables() {
        let store = MemoryStore::new();
        let other = store.clone();
        store
            .with_tables(|t| t.routings.insert("email".to_string(), "default".to_string()))
            .unwrap();
        let seen = other
            .with_tables(|t| t.routings.get("email").cloned())
            .unwrap();
        assert_eq!(seen.as_deref(), Some("default"));
    }
}
