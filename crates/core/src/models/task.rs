use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::job::{JobEntry, JobStatus};

/// 管理接口对外展示的任务视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: i32,
    pub job_name: String,
    pub job_group: String,
    pub job_description: Option<String>,
    pub job_status: Option<JobStatus>,
    pub cron_expression: String,
    pub create_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_fire_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_fire_time: Option<DateTime<Utc>>,
}

impl TaskRecord {
    pub fn from_entry(entry: &JobEntry) -> Self {
        Self::with_status(entry, JobStatus::from(entry.state))
    }

    pub fn with_status(entry: &JobEntry, status: JobStatus) -> Self {
        Self {
            id: entry.task_id,
            job_name: entry.definition.key.name.clone(),
            job_group: entry.definition.key.group.clone(),
            job_description: entry.definition.description.clone(),
            job_status: Some(status),
            cron_expression: entry.trigger.cron_expression().to_string(),
            create_time: entry.create_time.clone(),
            next_fire_time: entry.next_fire_time,
            previous_fire_time: entry.previous_fire_time,
        }
    }
}

/// 创建任务请求
///
/// 必填字段声明为 `Option`，缺失时由服务层返回校验错误而不是反序列化错误。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub job_name: Option<String>,
    pub job_group: Option<String>,
    pub job_description: Option<String>,
    pub cron_expression: Option<String>,
    /// 缺省时使用 `job_name` 作为处理器类型
    pub handler_type: Option<String>,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

/// 编辑任务请求，按数字ID定位任务
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTaskRequest {
    pub id: Option<i32>,
    pub job_name: Option<String>,
    pub job_group: Option<String>,
    pub job_description: Option<String>,
    pub cron_expression: Option<String>,
    /// 提供时整体替换任务参数
    pub parameters: Option<HashMap<String, String>>,
}
