use thiserror::Error;

use crate::models::JobState;

/// 调度器错误类型定义
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("无效的CRON表达式: {expr} - {message}")]
    InvalidCron { expr: String, message: String },

    #[error("未注册的任务处理器类型: {handler_type}")]
    HandlerNotFound { handler_type: String },

    #[error("任务已存在, jobName:{name}, jobGroup:{group}")]
    JobAlreadyExists { name: String, group: String },

    #[error("任务不存在, jobName:{name}, jobGroup:{group}")]
    JobNotFound { name: String, group: String },

    #[error("任务未找到: {id}")]
    TaskNotFound { id: i32 },

    #[error("任务当前状态为 {state}, 无法执行该操作, jobName:{name}, jobGroup:{group}")]
    JobNotSchedulable {
        name: String,
        group: String,
        state: JobState,
    },

    #[error("任务ID冲突: {id}")]
    TaskIdConflict { id: i32 },

    #[error("任务执行错误: {0}")]
    TaskExecution(String),

    #[error("无效的任务参数: {0}")]
    InvalidTaskParams(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误分类，供调用方映射为不同的响应
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 输入不合法，在任何状态变更之前被拒绝
    Validation,
    /// 任务标识或数字ID不存在，或任务不处于可操作的状态
    NotFound,
    /// 任务标识重复
    Conflict,
    /// 处理器执行失败，只记录日志
    Execution,
    /// 存储或调度引擎本身的故障
    Engine,
}

impl SchedulerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulerError::Validation(_)
            | SchedulerError::InvalidCron { .. }
            | SchedulerError::HandlerNotFound { .. } => ErrorKind::Validation,
            SchedulerError::JobNotFound { .. }
            | SchedulerError::TaskNotFound { .. }
            | SchedulerError::JobNotSchedulable { .. } => ErrorKind::NotFound,
            SchedulerError::JobAlreadyExists { .. } => ErrorKind::Conflict,
            SchedulerError::TaskExecution(_)
            | SchedulerError::InvalidTaskParams(_) => ErrorKind::Execution,
            SchedulerError::TaskIdConflict { .. }
            | SchedulerError::Configuration(_)
            | SchedulerError::Internal(_) => ErrorKind::Engine,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        SchedulerError::Validation(message.into())
    }
}

/// 统一的Result类型
pub type Result<T> = std::result::Result<T, SchedulerError>;
