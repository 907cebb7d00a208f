// Conveyor Infrastructure - In-Memory Adapter
// Implements: QueueRepository, RoutingRepository for tests and ephemeral use

mod queue_repository;
mod routing_repository;
mod store;

pub use queue_repository::MemoryQueueRepository;
pub use routing_repository::MemoryRoutingRepository;
pub use store::MemoryStore;
