//! Dispatcher
//!
//! The scheduling engine that owns job state transitions and fires due jobs,
//! and the task controller that the management API drives by numeric id.

pub mod controller;
pub mod scheduler;
pub mod task_id;

pub use controller::{format_create_time, TaskController, CREATE_TIME_FORMAT};
pub use scheduler::{JobAmendment, SchedulerEngine, TickOutcome};
pub use task_id::TaskIdGenerator;
