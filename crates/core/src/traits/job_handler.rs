use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::{models::JobKey, SchedulerResult};

/// 任务执行上下文
///
/// 处理器需要的全部信息都通过上下文或构造函数注入，不依赖全局状态。
#[derive(Debug, Clone)]
pub struct JobExecutionContext {
    pub key: JobKey,
    pub task_id: i32,
    pub parameters: HashMap<String, String>,
    /// 本次触发对应的计划时间
    pub scheduled_fire_time: DateTime<Utc>,
    /// 实际开始执行的时间
    pub fire_time: DateTime<Utc>,
}

impl JobExecutionContext {
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

/// 任务处理器
///
/// 调度引擎在每次触发时调用 `execute`。返回的错误只会被记录，
/// 不影响任务的调度状态。
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn execute(&self, context: &JobExecutionContext) -> SchedulerResult<()>;
}
