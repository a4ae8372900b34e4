use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use tracing::{debug, info, warn};

use scheduler_core::{
    models::{
        CreateTaskRequest, EditTaskRequest, FireRecord, JobDefinition, JobKey, TaskRecord,
        TriggerSpec,
    },
    traits::{JobStore, TaskControlService},
    BootstrapJob, Clock, SchedulerError, SchedulerResult,
};

use crate::scheduler::{JobAmendment, SchedulerEngine};
use crate::task_id::TaskIdGenerator;

/// `createTime` 的展示格式
pub const CREATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 生成的数字ID与已有任务冲突时最多重试的次数
const MAX_ID_ATTEMPTS: usize = 8;

pub fn format_create_time(now: DateTime<Utc>) -> String {
    now.with_timezone(&Local).format(CREATE_TIME_FORMAT).to_string()
}

/// 任务管理服务
///
/// 把管理接口的数字ID解析为任务标识，校验输入后驱动调度引擎完成状态迁移。
pub struct TaskController {
    engine: Arc<SchedulerEngine>,
    store: Arc<dyn JobStore>,
    clock: Arc<dyn Clock>,
    id_generator: TaskIdGenerator,
}

impl TaskController {
    pub fn new(engine: Arc<SchedulerEngine>, store: Arc<dyn JobStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            engine,
            store,
            clock,
            id_generator: TaskIdGenerator::new(),
        }
    }

    /// 创建配置文件中声明的启动任务，单个任务失败只记录日志
    pub async fn bootstrap(&self, jobs: &[BootstrapJob]) -> usize {
        let mut created = 0;
        for job in jobs {
            match self.create_task(CreateTaskRequest::from(job)).await {
                Ok(record) => {
                    info!(
                        job_name = %record.job_name,
                        job_group = %record.job_group,
                        task_id = record.id,
                        "启动任务已创建"
                    );
                    created += 1;
                }
                Err(e) => warn!(
                    job_name = %job.job_name,
                    job_group = %job.job_group,
                    "创建启动任务失败: {}",
                    e
                ),
            }
        }
        created
    }

    async fn resolve_key(&self, task_id: i32) -> SchedulerResult<JobKey> {
        self.store
            .find_by_id(task_id)
            .await?
            .ok_or(SchedulerError::TaskNotFound { id: task_id })
    }
}

fn required_field(value: Option<String>, message: &str) -> SchedulerResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SchedulerError::validation(message))
}

/// 编辑时提供的名称或分组必须与原任务一致
fn ensure_unchanged(provided: Option<&str>, current: &str, field: &str) -> SchedulerResult<()> {
    match provided.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) if value != current => Err(SchedulerError::validation(format!(
            "不支持修改{field}: {current} -> {value}"
        ))),
        _ => Ok(()),
    }
}

#[async_trait]
impl TaskControlService for TaskController {
    async fn list_tasks(&self) -> SchedulerResult<Vec<TaskRecord>> {
        let entries = self.store.list().await?;
        let mut records = Vec::with_capacity(entries.len());

        for entry in &entries {
            // 读取快照之后被删除的任务不再展示
            if let Some(status) = self.engine.job_status(entry.key()).await {
                records.push(TaskRecord::with_status(entry, status));
            }
        }

        debug!("列出任务 {} 个", records.len());
        Ok(records)
    }

    async fn get_task(&self, task_id: i32) -> SchedulerResult<TaskRecord> {
        let key = self.resolve_key(task_id).await?;
        let entry = self
            .store
            .get(&key)
            .await?
            .ok_or(SchedulerError::TaskNotFound { id: task_id })?;
        Ok(TaskRecord::from_entry(&entry))
    }

    async fn create_task(&self, request: CreateTaskRequest) -> SchedulerResult<TaskRecord> {
        let job_name = required_field(request.job_name, "任务名称不能为空")?;
        let job_group = required_field(request.job_group, "任务分组不能为空")?;
        let cron_expression = required_field(request.cron_expression, "CRON表达式不能为空")?;

        let trigger = TriggerSpec::compile(&cron_expression)?;
        let handler_type = request
            .handler_type
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| job_name.clone());
        let definition = JobDefinition {
            key: JobKey::new(job_name, job_group)?,
            handler_type,
            description: request.job_description,
            parameters: request.parameters,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            let now = self.clock.now();
            let task_id = self.id_generator.next_id(now);

            match self
                .engine
                .schedule(
                    task_id,
                    definition.clone(),
                    trigger.clone(),
                    format_create_time(now),
                )
                .await
            {
                Ok(entry) => return Ok(TaskRecord::from_entry(&entry)),
                Err(SchedulerError::TaskIdConflict { id }) if attempt < MAX_ID_ATTEMPTS => {
                    debug!("任务ID {} 已被占用, 重新生成", id);
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn edit_task(&self, request: EditTaskRequest) -> SchedulerResult<TaskRecord> {
        let id = request
            .id
            .ok_or_else(|| SchedulerError::validation("任务ID不能为空"))?;
        let key = self.resolve_key(id).await?;
        ensure_unchanged(request.job_name.as_deref(), &key.name, "任务名称")?;
        ensure_unchanged(request.job_group.as_deref(), &key.group, "任务分组")?;

        let cron_expression = required_field(request.cron_expression, "CRON表达式不能为空")?;
        let trigger = TriggerSpec::compile(&cron_expression)?;

        let amendment = JobAmendment {
            description: request.job_description,
            parameters: request.parameters,
            create_time: Some(format_create_time(self.clock.now())),
        };
        let entry = self
            .engine
            .reschedule_with(&key, trigger, Some(amendment))
            .await?;
        Ok(TaskRecord::from_entry(&entry))
    }

    async fn delete_task(&self, task_id: i32) -> SchedulerResult<TaskRecord> {
        let key = self.resolve_key(task_id).await?;
        let entry = self.engine.unschedule(&key).await?;
        Ok(TaskRecord::from_entry(&entry))
    }

    async fn pause_task(&self, task_id: i32) -> SchedulerResult<TaskRecord> {
        let key = self.resolve_key(task_id).await?;
        let entry = self.engine.pause(&key).await?;
        Ok(TaskRecord::from_entry(&entry))
    }

    async fn resume_task(&self, task_id: i32) -> SchedulerResult<TaskRecord> {
        let key = self.resolve_key(task_id).await?;
        let entry = self.engine.resume(&key).await?;
        Ok(TaskRecord::from_entry(&entry))
    }

    async fn task_history(&self, task_id: i32) -> SchedulerResult<Vec<FireRecord>> {
        let key = self.resolve_key(task_id).await?;
        let entry = self
            .store
            .get(&key)
            .await?
            .ok_or(SchedulerError::TaskNotFound { id: task_id })?;
        Ok(entry.history.into_iter().collect())
    }
}
