use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::cron_utils::CronScheduler;
use crate::{Result, SchedulerError};

/// 任务标识，`(name, group)` 组合在存储中唯一
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobKey {
    pub name: String,
    pub group: String,
}

impl JobKey {
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let group = group.into();
        if name.trim().is_empty() {
            return Err(SchedulerError::validation("任务名称不能为空"));
        }
        if group.trim().is_empty() {
            return Err(SchedulerError::validation("任务分组不能为空"));
        }
        Ok(Self { name, group })
    }

    pub fn not_found(&self) -> SchedulerError {
        SchedulerError::JobNotFound {
            name: self.name.clone(),
            group: self.group.clone(),
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}

/// 任务定义
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDefinition {
    pub key: JobKey,
    /// 在 JobRegistry 中注册的处理器类型名
    pub handler_type: String,
    pub description: Option<String>,
    pub parameters: HashMap<String, String>,
}

/// 错过触发时间的处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MisfirePolicy {
    /// 跳过错过的触发，不补偿执行
    #[default]
    DoNothing,
}

/// 触发器：编译后的CRON表达式加错过触发策略
#[derive(Debug, Clone)]
pub struct TriggerSpec {
    pub schedule: CronScheduler,
    pub misfire_policy: MisfirePolicy,
}

impl TriggerSpec {
    pub fn compile(cron_expression: &str) -> Result<Self> {
        Ok(Self {
            schedule: CronScheduler::new(cron_expression)?,
            misfire_policy: MisfirePolicy::DoNothing,
        })
    }

    pub fn cron_expression(&self) -> &str {
        self.schedule.expression()
    }

    pub fn next_fire_time(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.next_execution_time(after)
    }
}

/// 任务在存储中的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Scheduled,
    Paused,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Scheduled => write!(f, "SCHEDULED"),
            JobState::Paused => write!(f, "PAUSED"),
        }
    }
}

/// 对外展示的任务状态，`Error` 只在查询状态失败时出现，不会被存储
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Scheduled,
    Paused,
    Error,
}

impl From<JobState> for JobStatus {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Scheduled => JobStatus::Scheduled,
            JobState::Paused => JobStatus::Paused,
        }
    }
}

/// 单次触发的执行记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FireRecord {
    /// 本次触发对应的计划时间
    pub scheduled_at: DateTime<Utc>,
    pub fired_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    pub error: Option<String>,
}

/// 存储中的一条任务记录：定义、当前触发器和运行时状态
#[derive(Debug, Clone)]
pub struct JobEntry {
    /// 管理接口使用的数字ID
    pub task_id: i32,
    pub definition: JobDefinition,
    pub trigger: TriggerSpec,
    pub state: JobState,
    pub create_time: String,
    /// 暂停期间保持冻结
    pub next_fire_time: Option<DateTime<Utc>>,
    pub previous_fire_time: Option<DateTime<Utc>>,
    pub history: VecDeque<FireRecord>,
}

impl JobEntry {
    pub fn new(
        task_id: i32,
        definition: JobDefinition,
        trigger: TriggerSpec,
        create_time: String,
        now: DateTime<Utc>,
    ) -> Self {
        let next_fire_time = trigger.next_fire_time(now);
        Self {
            task_id,
            definition,
            trigger,
            state: JobState::Scheduled,
            create_time,
            next_fire_time,
            previous_fire_time: None,
            history: VecDeque::new(),
        }
    }

    pub fn key(&self) -> &JobKey {
        &self.definition.key
    }

    /// 处于调度状态且到期
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.state == JobState::Scheduled
            && self.next_fire_time.map(|next| next <= now).unwrap_or(false)
    }

    pub fn record_fire(&mut self, record: FireRecord, limit: usize) {
        self.history.push_back(record);
        while self.history.len() > limit {
            self.history.pop_front();
        }
    }
}
