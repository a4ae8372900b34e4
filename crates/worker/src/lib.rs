pub mod executor_factory;
pub mod executors;

pub use executor_factory::{build_registry, HTTP_JOB, LOG_JOB};
pub use executors::{HttpJobExecutor, HttpJobParams, LoggingJobHandler};
