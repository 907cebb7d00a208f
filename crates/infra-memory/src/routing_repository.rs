// In-memory RoutingRepository Implementation

use crate::store::MemoryStore;
use async_trait::async_trait;
use conveyor_core::application::RoutingCache;
use conveyor_core::domain::{ConfigDomain, Revision, Routing};
use conveyor_core::error::{AppError, Result};
use conveyor_core::port::RoutingRepository;
use tracing::{debug, info};

pub struct MemoryRoutingRepository {
    store: MemoryStore,
    cache: RoutingCache,
}

impl MemoryRoutingRepository {
    /// Build the repository and fill its cache from the store
    pub fn new(store: MemoryStore) -> Result<Self> {
        let repo = Self {
            store,
            cache: RoutingCache::new(),
        };
        repo.scan()?;
        Ok(repo)
    }

    // Cache steps run while the table lock is held, so a scan can never
    // publish a snapshot older than a concurrent add.
    fn scan(&self) -> Result<Vec<Routing>> {
        let routings = self.store.with_tables(|t| {
            let mut routings: Vec<Routing> = t
                .routings
                .iter()
                .map(|(category, queue)| Routing::new(category.clone(), queue.clone()))
                .collect();
            routings.sort_by(|a, b| {
                a.queue_name
                    .cmp(&b.queue_name)
                    .then_with(|| a.job_category.cmp(&b.job_category))
            });
            self.cache.replace_all(
                routings
                    .iter()
                    .map(|r| (r.job_category.clone(), r.queue_name.clone())),
            );
            routings
        })?;

        info!(entries = routings.len(), "Routing cache reloaded");
        Ok(routings)
    }
}

#[async_trait]
impl RoutingRepository for MemoryRoutingRepository {
    async fn add(&self, job_category: &str, queue_name: &str) -> Result<bool> {
        let revision = self.store.with_tables(|t| {
            if !t.queues.contains_key(queue_name) {
                return Err(AppError::queue_not_found(queue_name));
            }
            let previous = t
                .routings
                .insert(job_category.to_string(), queue_name.to_string());
            self.cache.insert(job_category, queue_name);

            Ok((previous.as_deref() != Some(queue_name))
                .then(|| t.bump_revision(ConfigDomain::Routing)))
        })??;

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
        self.scan()
    }

    async fn delete_by_job_category(&self, job_category: &str) -> Result<()> {
        let revision = self.store.with_tables(|t| {
            let existed = t.routings.remove(job_category).is_some();
            self.cache.remove(job_category);
            existed.then(|| t.bump_revision(ConfigDomain::Routing))
        })?;

        debug!(
            job_category = %job_category,
            existed = revision.is_some(),
            revision = ?revision,
            "Routing deleted"
        );
        Ok(())
    }

    async fn revision(&self) -> Result<Revision> {
        self.store.with_tables(|t| t.revision(ConfigDomain::Routing))
    }
}
