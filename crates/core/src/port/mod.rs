// Port Layer - Interfaces implemented by storage drivers

pub mod queue_repository;
pub mod routing_repository;

// Re-exports
pub use queue_repository::QueueRepository;
pub use routing_repository::RoutingRepository;
