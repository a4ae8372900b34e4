pub mod clock;
pub mod config;
pub mod cron_utils;
pub mod errors;
pub mod job_registry;
pub mod models;
pub mod traits;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    ApiConfig, AppConfig, BootstrapJob, HttpExecutorConfig, ObservabilityConfig, SchedulerConfig,
};
pub use cron_utils::CronScheduler;
pub use errors::*;
pub use job_registry::{JobRegistry, JobRegistryBuilder};
pub use models::*;
pub use traits::{
    EntryMutation, JobExecutionContext, JobHandler, JobStore, TaskControlService,
};

/// 统一的Result类型
pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;
