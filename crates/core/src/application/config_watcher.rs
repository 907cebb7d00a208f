// Config Watcher - revision polling in place of push invalidation

use crate::application::shutdown::ShutdownToken;
use crate::domain::Revision;
use crate::error::Result;
use crate::port::{QueueRepository, RoutingRepository};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default revision poll interval (1s)
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(1);

/// What a single poll did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WatchOutcome {
    pub routing_reloaded: bool,
    pub queue_revision_changed: bool,
}

/// Detects configuration changes made by other processes
///
/// Compares the stored revision counters with the last observed values.
/// A routing change triggers a cache reload; a queue definition change is
/// published to subscribers, who re-read the queues they care about.
pub struct ConfigWatcher {
    queues: Arc<dyn QueueRepository>,
    routing: Arc<dyn RoutingRepository>,
    interval: Duration,
    routing_seen: Option<Revision>,
    queue_seen: Option<Revision>,
    queue_tx: watch::Sender<Revision>,
}

impl ConfigWatcher {
    pub fn new(
        queues: Arc<dyn QueueRepository>,
        routing: Arc<dyn RoutingRepository>,
        interval: Duration,
    ) -> Self {
        let (queue_tx, _) = watch::channel(0);
        Self {
            queues,
            routing,
            interval,
            routing_seen: None,
            queue_seen: None,
            queue_tx,
        }
    }

    /// Receive the latest observed `queue_definition` revision
    pub fn subscribe_queue_revision(&self) -> watch::Receiver<Revision> {
        self.queue_tx.subscribe()
    }

    /// Compare revisions once and react to changes
    pub async fn poll_once(&mut self) -> Result<WatchOutcome> {
        let mut outcome = WatchOutcome::default();

        // Read the revision before reloading: a write racing the reload
        // bumps it again and is picked up on the next poll.
        let routing_rev = self.routing.revision().await?;
        if self.routing_seen != Some(routing_rev) {
            self.routing.reload().await?;
            info!(
                previous = ?self.routing_seen,
                revision = routing_rev,
                "Routing revision changed, cache reloaded"
            );
            self.routing_seen = Some(routing_rev);
            outcome.routing_reloaded = true;
        }

        let queue_rev = self.queues.revision().await?;
        if self.queue_seen != Some(queue_rev) {
            info!(
                previous = ?self.queue_seen,
                revision = queue_rev,
                "Queue definition revision changed"
            );
            self.queue_seen = Some(queue_rev);
            self.queue_tx.send_replace(queue_rev);
            outcome.queue_revision_changed = true;
        }

        Ok(outcome)
    }

    /// Poll until shutdown (spawn in tokio::spawn)
    pub async fn run(mut self, mut shutdown: ShutdownToken) {
        info!(interval = ?self.interval, "Config watcher started");

        let mut tick = interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match self.poll_once().await {
                        Ok(outcome) => debug!(?outcome, "Config poll completed"),
                        Err(e) => warn!(error = ?e, "Config poll failed"),
                    }
                }
                _ = shutdown.wait() => {
                    info!("Config watcher stopped");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::shutdown::shutdown_channel;
    use crate::domain::{Queue, Routing};
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeRepos {
        routing_rev: AtomicU64,
        queue_rev: AtomicU64,
        reloads: AtomicUsize,
        fail_revision: AtomicBool,
    }

    #[async_trait]
    impl QueueRepository for FakeRepos {
        async fn add(&self, _queue: &Queue) -> Result<bool> {
            Ok(false)
        }
        async fn find_all(&self) -> Result<Vec<Queue>> {
            Ok(Vec::new())
        }
        async fn find_by_name(&self, name: &str) -> Result<Queue> {
            Err(AppError::NotFound(name.to_string()))
        }
        async fn delete_by_name(&self, _name: &str) -> Result<()> {
            Ok(())
        }
        async fn revision(&self) -> Result<Revision> {
            Ok(self.queue_rev.load(Ordering::SeqCst))
        }
    }

    #[async_trait]
    impl RoutingRepository for FakeRepos {
        async fn add(&self, _job_category: &str, _queue_name: &str) -> Result<bool> {
            Ok(false)
        }
        fn find_queue_name_by_job_category(&self, _job_category: &str) -> Option<String> {
            None
        }
        async fn find_all(&self) -> Result<Vec<Routing>> {
            self.reloads.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
        async fn delete_by_job_category(&self, _job_category: &str) -> Result<()> {
            Ok(())
        }
        async fn revision(&self) -> Result<Revision> {
            if self.fail_revision.load(Ordering::SeqCst) {
                return Err(AppError::Database("connection refused".to_string()));
            }
            Ok(self.routing_rev.load(Ordering::SeqCst))
        }
    }

    fn watcher(repos: &Arc<FakeRepos>) -> ConfigWatcher {
        ConfigWatcher::new(
            repos.clone(),
            repos.clone(),
            Duration::from_millis(10),
        )
    }

    #[tokio::test]
    async fn test_first_poll_reloads_and_publishes() {
        let repos = Arc::new(FakeRepos::default());
        let mut watcher = watcher(&repos);

        let outcome = watcher.poll_once().await.unwrap();
        assert!(outcome.routing_reloaded);
        assert!(outcome.queue_revision_changed);
        assert_eq!(repos.reloads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reload_only_on_revision_change() {
        let repos = Arc::new(FakeRepos::default());
        let mut watcher = watcher(&repos);
        let mut queue_rx = watcher.subscribe_queue_revision();
        watcher.poll_once().await.unwrap();

        let unchanged = watcher.poll_once().await.unwrap();
        assert_eq!(unchanged, WatchOutcome::default());
        assert_eq!(repos.reloads.load(Ordering::SeqCst), 1);

        repos.routing_rev.store(3, Ordering::SeqCst);
        repos.queue_rev.store(7, Ordering::SeqCst);
        let changed = watcher.poll_once().await.unwrap();
        assert!(changed.routing_reloaded);
        assert!(changed.queue_revision_changed);
        assert_eq!(repos.reloads.load(Ordering::SeqCst), 2);
        assert_eq!(*queue_rx.borrow_and_update(), 7);
    }

    #[tokio::test]
    async fn test_poll_error_keeps_last_seen() {
        let repos = Arc::new(FakeRepos::default());
        let mut watcher = watcher(&repos);
        watcher.poll_once().await.unwrap();

        repos.fail_revision.store(true, Ordering::SeqCst);
        assert!(watcher.poll_once().await.is_err());

        repos.fail_revision.store(false, Ordering::SeqCst);
        let outcome = watcher.poll_once().await.unwrap();
        assert!(!outcome.routing_reloaded);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let repos = Arc::new(FakeRepos::default());
        let watcher = watcher(&repos);
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn(watcher.run(token));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.shutdown();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("watcher did not stop")
            .unwrap();
        assert!(repos.reloads.load(Ordering::SeqCst) >= 1);
    }
}
