use std::sync::Arc;

use tracing::info;

use scheduler_core::{HttpExecutorConfig, JobRegistry, SchedulerResult};

use super::executors::{HttpJobExecutor, LoggingJobHandler};

/// 发出HTTP请求的处理器类型名
pub const HTTP_JOB: &str = "HttpJob";
/// 只记录日志的处理器类型名
pub const LOG_JOB: &str = "LogJob";

/// 构建进程内置的处理器注册表
pub fn build_registry(http_config: &HttpExecutorConfig) -> SchedulerResult<JobRegistry> {
    let registry = JobRegistry::builder()
        .register(HTTP_JOB, Arc::new(HttpJobExecutor::new(http_config)?))
        .register(LOG_JOB, Arc::new(LoggingJobHandler))
        .build();

    info!("已注册任务处理器: {:?}", registry.handler_types());
    Ok(registry)
}
