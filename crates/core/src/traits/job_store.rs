use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    models::{JobEntry, JobKey, JobState},
    SchedulerResult,
};

/// 对单条任务记录的原子修改
///
/// 闭包返回错误时存储保持不变。
pub type EntryMutation<'a> =
    Box<dyn FnOnce(&mut JobEntry) -> SchedulerResult<()> + Send + 'a>;

/// 任务存储接口
///
/// 每个操作相对存储都是原子的。状态迁移规则由调度引擎通过 [`JobStore::update`]
/// 表达，存储只负责互斥与一致性。
#[async_trait]
pub trait JobStore: Send + Sync {
    /// 独占插入：标识已存在时返回 `JobAlreadyExists`，数字ID重复时返回 `TaskIdConflict`
    async fn insert(&self, entry: JobEntry) -> SchedulerResult<()>;

    async fn get(&self, key: &JobKey) -> SchedulerResult<Option<JobEntry>>;

    /// 通过数字ID查找任务标识（线性扫描）
    async fn find_by_id(&self, task_id: i32) -> SchedulerResult<Option<JobKey>>;

    async fn list(&self) -> SchedulerResult<Vec<JobEntry>>;

    /// 标识不存在时返回 `JobNotFound`
    async fn state(&self, key: &JobKey) -> SchedulerResult<JobState>;

    /// 在存储锁内对记录执行修改并返回修改后的副本
    async fn update(&self, key: &JobKey, mutation: EntryMutation<'_>) -> SchedulerResult<JobEntry>;

    /// 删除任务及其触发器，标识不存在时返回 `JobNotFound`
    async fn remove(&self, key: &JobKey) -> SchedulerResult<JobEntry>;

    /// 处于调度状态且 `next_fire_time <= now` 的任务
    async fn due_keys(&self, now: DateTime<Utc>) -> SchedulerResult<Vec<JobKey>>;

    /// 所有调度状态任务中最早的下一次触发时间
    async fn earliest_next_fire(&self) -> SchedulerResult<Option<DateTime<Utc>>>;

    async fn len(&self) -> SchedulerResult<usize>;
}
