// Application Layer - Cache and change detection services

pub mod config_watcher;
pub mod routing_cache;
pub mod shutdown;

// Re-exports
pub use config_watcher::{ConfigWatcher, WatchOutcome, DEFAULT_WATCH_INTERVAL};
pub use routing_cache::RoutingCache;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
