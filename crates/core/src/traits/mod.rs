pub mod job_handler;
pub mod job_store;
pub mod scheduler;

pub use job_handler::*;
pub use job_store::*;
pub use scheduler::*;
