// Conveyor Repository Factory
// The single place where a storage driver is chosen

pub mod config;
pub mod factory;

pub use crate::config::{env_config, watch_interval, Driver, RepositoryConfig};
pub use factory::{new_repositories, Repositories};
