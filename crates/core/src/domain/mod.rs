// Domain Layer - Queue configuration entities

pub mod error;
pub mod queue;
pub mod revision;
pub mod routing;

// Re-exports
pub use error::DomainError;
pub use queue::{Queue, QueueName};
pub use revision::{ConfigDomain, Revision};
pub use routing::{JobCategory, Routing};
