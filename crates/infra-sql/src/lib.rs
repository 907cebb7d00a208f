// Conveyor Infrastructure - SQL Adapter
// Implements: QueueRepository, RoutingRepository over SQLite or MySQL

mod connection;
mod error;
mod migration;
mod queue_repository;
mod revision;
mod routing_repository;
mod store;

pub use connection::{create_pool, SqlBackend};
pub use error::map_sqlx_error;
pub use migration::run_migrations;
pub use queue_repository::SqlQueueRepository;
pub use routing_repository::SqlRoutingRepository;
pub use store::SqlStore;

// Note: sqlx::Error conversion goes through map_sqlx_error
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
