use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::cron_utils::CronScheduler;
use crate::models::CreateTaskRequest;

/// 调度引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// 没有任务即将到期时，驱动循环最长的休眠时间
    pub max_idle_seconds: u64,
    /// 每个任务保留的触发记录条数
    pub history_limit: usize,
    /// 启动时创建的任务
    pub jobs: Vec<BootstrapJob>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_idle_seconds: 60,
            history_limit: 20,
            jobs: Vec::new(),
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_idle_seconds == 0 {
            return Err(anyhow::anyhow!("max_idle_seconds必须大于0"));
        }
        if self.history_limit == 0 {
            return Err(anyhow::anyhow!("history_limit必须大于0"));
        }
        for job in &self.jobs {
            CronScheduler::validate_cron_expression(&job.cron_expression).map_err(|e| {
                anyhow::anyhow!("启动任务 {}.{} 配置无效: {e}", job.job_group, job.job_name)
            })?;
        }
        Ok(())
    }
}

/// 配置文件中声明的启动任务
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapJob {
    pub job_name: String,
    pub job_group: String,
    #[serde(default)]
    pub job_description: Option<String>,
    pub cron_expression: String,
    #[serde(default)]
    pub handler_type: Option<String>,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

impl From<&BootstrapJob> for CreateTaskRequest {
    fn from(job: &BootstrapJob) -> Self {
        CreateTaskRequest {
            job_name: Some(job.job_name.clone()),
            job_group: Some(job.job_group.clone()),
            job_description: job.job_description.clone(),
            cron_expression: Some(job.cron_expression.clone()),
            handler_type: job.handler_type.clone(),
            parameters: job.parameters.clone(),
        }
    }
}

/// HTTP任务执行器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpExecutorConfig {
    pub connect_timeout_seconds: u64,
    pub response_timeout_seconds: u64,
}

impl Default for HttpExecutorConfig {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: 10,
            response_timeout_seconds: 30,
        }
    }
}

impl HttpExecutorConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.connect_timeout_seconds == 0 || self.response_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("HTTP执行器超时时间必须大于0"));
        }
        Ok(())
    }
}
