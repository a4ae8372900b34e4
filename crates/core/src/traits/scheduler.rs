use async_trait::async_trait;

use crate::{
    models::{CreateTaskRequest, EditTaskRequest, FireRecord, TaskRecord},
    SchedulerResult,
};

/// 任务管理服务接口
///
/// 管理接口通过数字ID操作任务，实现负责把ID解析为任务标识并驱动调度引擎。
#[async_trait]
pub trait TaskControlService: Send + Sync {
    /// 列出所有任务
    async fn list_tasks(&self) -> SchedulerResult<Vec<TaskRecord>>;

    /// 获取单个任务
    async fn get_task(&self, task_id: i32) -> SchedulerResult<TaskRecord>;

    /// 创建任务并立即进入调度
    async fn create_task(&self, request: CreateTaskRequest) -> SchedulerResult<TaskRecord>;

    /// 替换任务的触发器与描述
    async fn edit_task(&self, request: EditTaskRequest) -> SchedulerResult<TaskRecord>;

    /// 删除任务，返回删除前的视图
    async fn delete_task(&self, task_id: i32) -> SchedulerResult<TaskRecord>;

    /// 暂停任务
    async fn pause_task(&self, task_id: i32) -> SchedulerResult<TaskRecord>;

    /// 恢复任务
    async fn resume_task(&self, task_id: i32) -> SchedulerResult<TaskRecord>;

    /// 任务最近的触发记录，按时间先后排列
    async fn task_history(&self, task_id: i32) -> SchedulerResult<Vec<FireRecord>>;
}
