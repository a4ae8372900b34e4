use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use scheduler_core::{
    models::{FireRecord, JobDefinition, JobEntry, JobKey, JobState, JobStatus, TriggerSpec},
    traits::{JobExecutionContext, JobStore},
    Clock, JobRegistry, SchedulerConfig, SchedulerError, SchedulerResult,
};
use scheduler_infrastructure::MetricsCollector;

/// 统计错过触发次数时最多向后推算的触发点个数
const MISFIRE_COUNT_LIMIT: usize = 1000;

/// 编辑任务时随新触发器一起替换的定义字段
#[derive(Debug, Clone, Default)]
pub struct JobAmendment {
    pub description: Option<String>,
    /// 为 `None` 时保留原参数
    pub parameters: Option<HashMap<String, String>>,
    pub create_time: Option<String>,
}

/// 一次调度扫描的结果
#[derive(Debug, Default)]
pub struct TickOutcome {
    /// 本次被触发执行的任务
    pub fired: Vec<JobKey>,
    /// 因上一次执行尚未结束而跳过的任务
    pub skipped: Vec<JobKey>,
    handles: Vec<JoinHandle<()>>,
}

impl TickOutcome {
    /// 等待本次扫描启动的所有执行结束
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

enum FireDecision {
    NotDue,
    Fire {
        scheduled_at: DateTime<Utc>,
        task_id: i32,
        definition: JobDefinition,
        missed: usize,
    },
    Skip {
        missed: usize,
    },
}

/// 正在执行的任务标识
///
/// 按标识而不是按存储记录登记：执行期间任务被删除后以相同标识重新创建，
/// 新记录在旧的执行结束之前也不会被触发。
type RunningJobs = Arc<Mutex<HashSet<JobKey>>>;

/// 调度引擎
///
/// 持有任务的全部状态迁移：创建、替换触发器、暂停、恢复、删除，以及按时触发。
/// 每次触发都在独立的 tokio 任务中执行，同一任务同一时刻最多只有一次执行。
pub struct SchedulerEngine {
    store: Arc<dyn JobStore>,
    registry: Arc<JobRegistry>,
    clock: Arc<dyn Clock>,
    metrics: Arc<MetricsCollector>,
    running: RunningJobs,
    wakeup: Arc<Notify>,
    history_limit: usize,
    max_idle: Duration,
}

impl SchedulerEngine {
    pub fn new(
        store: Arc<dyn JobStore>,
        registry: Arc<JobRegistry>,
        clock: Arc<dyn Clock>,
        metrics: Arc<MetricsCollector>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            store,
            registry,
            clock,
            metrics,
            running: Arc::new(Mutex::new(HashSet::new())),
            wakeup: Arc::new(Notify::new()),
            history_limit: config.history_limit.max(1),
            max_idle: Duration::from_secs(config.max_idle_seconds.max(1)),
        }
    }

    /// 创建任务并进入调度状态，标识已存在时返回 `JobAlreadyExists`
    pub async fn schedule(
        &self,
        task_id: i32,
        definition: JobDefinition,
        trigger: TriggerSpec,
        create_time: String,
    ) -> SchedulerResult<JobEntry> {
        if !self.registry.contains(&definition.handler_type) {
            return Err(SchedulerError::HandlerNotFound {
                handler_type: definition.handler_type,
            });
        }

        let entry = JobEntry::new(task_id, definition, trigger, create_time, self.clock.now());
        if entry.next_fire_time.is_none() {
            return Err(never_fires(&entry.trigger));
        }
        self.store.insert(entry.clone()).await?;

        info!(
            job_name = %entry.key().name,
            job_group = %entry.key().group,
            task_id = entry.task_id,
            "任务已调度, 下次触发时间: {:?}",
            entry.next_fire_time
        );
        self.refresh_registered_gauge().await;
        self.wakeup.notify_one();
        Ok(entry)
    }

    /// 替换任务的触发器，任务状态保持不变
    pub async fn reschedule(&self, key: &JobKey, trigger: TriggerSpec) -> SchedulerResult<JobEntry> {
        self.reschedule_with(key, trigger, None).await
    }

    /// 替换触发器并在同一次原子修改中更新任务定义
    pub async fn reschedule_with(
        &self,
        key: &JobKey,
        trigger: TriggerSpec,
        amendment: Option<JobAmendment>,
    ) -> SchedulerResult<JobEntry> {
        let now = self.clock.now();
        let Some(next_fire_time) = trigger.next_fire_time(now) else {
            return Err(never_fires(&trigger));
        };
        let entry = self
            .store
            .update(
                key,
                Box::new(move |entry: &mut JobEntry| {
                    entry.next_fire_time = Some(next_fire_time);
                    entry.trigger = trigger;
                    if let Some(amendment) = amendment {
                        entry.definition.description = amendment.description;
                        if let Some(parameters) = amendment.parameters {
                            entry.definition.parameters = parameters;
                        }
                        if let Some(create_time) = amendment.create_time {
                            entry.create_time = create_time;
                        }
                    }
                    Ok(())
                }),
            )
            .await?;

        info!(
            job_name = %key.name,
            job_group = %key.group,
            "任务触发器已替换为 {}, 下次触发时间: {:?}",
            entry.trigger.cron_expression(),
            entry.next_fire_time
        );
        self.wakeup.notify_one();
        Ok(entry)
    }

    /// 暂停任务，只允许从调度状态迁移
    pub async fn pause(&self, key: &JobKey) -> SchedulerResult<JobEntry> {
        let entry = self
            .store
            .update(
                key,
                Box::new(|entry: &mut JobEntry| {
                    ensure_state(entry, JobState::Scheduled)?;
                    entry.state = JobState::Paused;
                    Ok(())
                }),
            )
            .await?;

        info!(job_name = %key.name, job_group = %key.group, "任务已暂停");
        Ok(entry)
    }

    /// 恢复任务，只允许从暂停状态迁移
    ///
    /// 暂停期间错过的触发不会补偿执行。
    pub async fn resume(&self, key: &JobKey) -> SchedulerResult<JobEntry> {
        let now = self.clock.now();
        let mut missed = 0;
        let entry = self
            .store
            .update(
                key,
                Box::new(|entry: &mut JobEntry| {
                    ensure_state(entry, JobState::Paused)?;
                    entry.state = JobState::Scheduled;
                    if let Some(due) = entry.next_fire_time.filter(|due| *due <= now) {
                        missed = 1 + entry.trigger.schedule.fires_between(
                            due,
                            now,
                            MISFIRE_COUNT_LIMIT,
                        );
                        entry.next_fire_time = entry.trigger.schedule.next_after_misfire(due, now);
                    }
                    Ok(())
                }),
            )
            .await?;

        self.metrics.record_job_misfired(key, missed as u64);
        info!(
            job_name = %key.name,
            job_group = %key.group,
            "任务已恢复, 下次触发时间: {:?}",
            entry.next_fire_time
        );
        self.wakeup.notify_one();
        Ok(entry)
    }

    /// 删除任务及其触发器，正在执行的触发会自然结束
    pub async fn unschedule(&self, key: &JobKey) -> SchedulerResult<JobEntry> {
        let entry = self.store.remove(key).await?;
        info!(
            job_name = %key.name,
            job_group = %key.group,
            task_id = entry.task_id,
            "任务已删除"
        );
        self.refresh_registered_gauge().await;
        Ok(entry)
    }

    /// 查询任务状态，读取失败时返回 `Error` 状态
    ///
    /// 任务已不存在时返回 `None`。
    pub async fn job_status(&self, key: &JobKey) -> Option<JobStatus> {
        match self.store.state(key).await {
            Ok(state) => Some(JobStatus::from(state)),
            Err(SchedulerError::JobNotFound { .. }) => None,
            Err(e) => {
                warn!(job_name = %key.name, job_group = %key.group, "查询任务状态失败: {}", e);
                Some(JobStatus::Error)
            }
        }
    }

    /// 该标识是否有一次触发正在执行
    pub fn is_running(&self, key: &JobKey) -> bool {
        lock_running(&self.running).contains(key)
    }

    /// 在给定时间点执行一次调度扫描
    ///
    /// 对每个到期任务在存储锁内完成占用检查：没有正在进行的执行时标记占用并启动执行，
    /// 否则跳过本次触发。两种情况下下一次触发时间都推进到 `now` 之后。
    pub async fn tick(&self, now: DateTime<Utc>) -> SchedulerResult<TickOutcome> {
        let mut outcome = TickOutcome::default();

        for key in self.store.due_keys(now).await? {
            let mut decision = FireDecision::NotDue;
            let running = &self.running;
            let claimed = self
                .store
                .update(
                    &key,
                    Box::new(|entry: &mut JobEntry| claim(entry, now, running, &mut decision)),
                )
                .await;

            match claimed {
                Ok(_) => {}
                Err(SchedulerError::JobNotFound { .. }) => continue,
                Err(e) => {
                    error!(job_name = %key.name, job_group = %key.group, "任务触发失败: {}", e);
                    continue;
                }
            }

            match decision {
                FireDecision::NotDue => {}
                FireDecision::Skip { missed } => {
                    warn!(
                        job_name = %key.name,
                        job_group = %key.group,
                        "上一次执行尚未结束, 跳过本次触发"
                    );
                    self.metrics.record_job_skipped(&key);
                    self.metrics.record_job_misfired(&key, missed as u64);
                    outcome.skipped.push(key);
                }
                FireDecision::Fire {
                    scheduled_at,
                    task_id,
                    definition,
                    missed,
                } => {
                    self.metrics.record_job_fired(&key);
                    self.metrics.record_job_misfired(&key, missed as u64);
                    let handle = self.spawn_execution(task_id, definition, scheduled_at, now);
                    outcome.handles.push(handle);
                    outcome.fired.push(key);
                }
            }
        }

        Ok(outcome)
    }

    /// 驱动循环：睡眠到最早的下一次触发时间，或被任务变更唤醒，直到收到关闭信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("调度引擎启动, 最长空闲等待 {:?}", self.max_idle);

        loop {
            let now = self.clock.now();
            match self.tick(now).await {
                Ok(outcome) if !outcome.fired.is_empty() || !outcome.skipped.is_empty() => {
                    debug!(
                        "调度扫描完成: 触发 {} 个, 跳过 {} 个",
                        outcome.fired.len(),
                        outcome.skipped.len()
                    );
                }
                Ok(_) => {}
                Err(e) => error!("调度扫描失败: {}", e),
            }

            let idle = self.idle_duration(now).await;
            tokio::select! {
                _ = tokio::time::sleep(idle) => {}
                _ = self.wakeup.notified() => {
                    debug!("任务变更, 重新计算下次唤醒时间");
                }
                _ = shutdown_rx.recv() => {
                    info!("调度引擎收到关闭信号, 停止调度新的触发");
                    break;
                }
            }
        }
    }

    async fn idle_duration(&self, now: DateTime<Utc>) -> Duration {
        match self.store.earliest_next_fire().await {
            Ok(Some(next)) => (next - now)
                .to_std()
                .unwrap_or(Duration::ZERO)
                .min(self.max_idle),
            Ok(None) => self.max_idle,
            Err(e) => {
                error!("读取下次触发时间失败: {}", e);
                self.max_idle
            }
        }
    }

    fn spawn_execution(
        &self,
        task_id: i32,
        definition: JobDefinition,
        scheduled_at: DateTime<Utc>,
        fired_at: DateTime<Utc>,
    ) -> JoinHandle<()> {
        let store = self.store.clone();
        let registry = self.registry.clone();
        let clock = self.clock.clone();
        let metrics = self.metrics.clone();
        let wakeup = self.wakeup.clone();
        let running = self.running.clone();
        let history_limit = self.history_limit;

        tokio::spawn(async move {
            let key = definition.key.clone();
            let context = JobExecutionContext {
                key: key.clone(),
                task_id,
                parameters: definition.parameters,
                scheduled_fire_time: scheduled_at,
                fire_time: fired_at,
            };

            debug!(job_name = %key.name, job_group = %key.group, "开始执行任务");
            let started = Instant::now();
            let result = match registry.resolve(&definition.handler_type) {
                Ok(handler) => {
                    // 处理器在单独的任务中运行，panic 不会影响完成登记
                    match tokio::spawn(async move { handler.execute(&context).await }).await {
                        Ok(result) => result,
                        Err(e) => Err(SchedulerError::TaskExecution(format!("处理器异常退出: {e}"))),
                    }
                }
                Err(e) => Err(e),
            };
            let elapsed = started.elapsed();

            if let Err(e) = &result {
                error!(
                    job_name = %key.name,
                    job_group = %key.group,
                    task_id = task_id,
                    "任务执行失败: {}",
                    e
                );
            }
            metrics.record_job_completed(&key, result.is_ok(), elapsed.as_secs_f64());

            let finished_at = clock.now();
            let record = FireRecord {
                scheduled_at,
                fired_at,
                finished_at,
                duration_ms: elapsed.as_millis() as u64,
                success: result.is_ok(),
                error: result.err().map(|e| e.to_string()),
            };

            let released = store
                .update(
                    &key,
                    Box::new(move |entry: &mut JobEntry| {
                        // 执行期间任务被删除后又以相同标识重新创建
                        if entry.task_id != task_id {
                            return Ok(());
                        }
                        entry.record_fire(record, history_limit);
                        // 暂停期间的下一次触发时间保持冻结
                        if entry.state != JobState::Scheduled {
                            return Ok(());
                        }
                        if let Some(next) = entry.next_fire_time.filter(|next| *next <= finished_at)
                        {
                            entry.next_fire_time =
                                entry.trigger.schedule.next_after_misfire(next, finished_at);
                        }
                        Ok(())
                    }),
                )
                .await;
            lock_running(&running).remove(&key);

            match released {
                Ok(_) => wakeup.notify_one(),
                Err(SchedulerError::JobNotFound { .. }) => {
                    debug!(job_name = %key.name, job_group = %key.group, "任务已在执行期间被删除");
                }
                Err(e) => error!(job_name = %key.name, job_group = %key.group, "登记执行结果失败: {}", e),
            }
        })
    }

    async fn refresh_registered_gauge(&self) {
        if let Ok(count) = self.store.len().await {
            self.metrics.update_registered_jobs(count);
        }
    }
}

fn ensure_state(entry: &JobEntry, expected: JobState) -> SchedulerResult<()> {
    if entry.state != expected {
        return Err(SchedulerError::JobNotSchedulable {
            name: entry.key().name.clone(),
            group: entry.key().group.clone(),
            state: entry.state,
        });
    }
    Ok(())
}

fn lock_running(running: &Mutex<HashSet<JobKey>>) -> std::sync::MutexGuard<'_, HashSet<JobKey>> {
    running.lock().unwrap_or_else(PoisonError::into_inner)
}

fn never_fires(trigger: &TriggerSpec) -> SchedulerError {
    SchedulerError::InvalidCron {
        expr: trigger.cron_expression().to_string(),
        message: "该触发器永远不会触发".to_string(),
    }
}

/// 在存储锁内检查并登记执行占用
fn claim(
    entry: &mut JobEntry,
    now: DateTime<Utc>,
    running: &Mutex<HashSet<JobKey>>,
    decision: &mut FireDecision,
) -> SchedulerResult<()> {
    if !entry.is_due(now) {
        return Ok(());
    }
    let Some(scheduled_at) = entry.next_fire_time else {
        return Ok(());
    };

    let missed = entry
        .trigger
        .schedule
        .fires_between(scheduled_at, now, MISFIRE_COUNT_LIMIT);
    entry.next_fire_time = entry.trigger.schedule.next_after_misfire(scheduled_at, now);

    if !lock_running(running).insert(entry.key().clone()) {
        *decision = FireDecision::Skip { missed };
        return Ok(());
    }

    entry.previous_fire_time = Some(scheduled_at);
    *decision = FireDecision::Fire {
        scheduled_at,
        task_id: entry.task_id,
        definition: entry.definition.clone(),
        missed,
    };
    Ok(())
}
