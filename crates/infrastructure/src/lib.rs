pub mod in_memory_job_store;
pub mod observability;

pub use in_memory_job_store::InMemoryJobStore;
pub use observability::*;
