use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    Json,
};
use tracing::info;

use scheduler_core::models::{CreateTaskRequest, EditTaskRequest, FireRecord, TaskRecord};

use crate::{
    error::{ApiResult, OperationContext},
    response::{success, ApiResponse},
    routes::AppState,
};

/// 获取任务列表
pub async fn list_tasks(State(state): State<AppState>) -> ApiResult<ApiResponse<Vec<TaskRecord>>> {
    let tasks = state
        .task_controller
        .list_tasks()
        .await
        .during("获取任务列表失败")?;
    Ok(success(tasks, "获取任务列表成功"))
}

/// 创建任务
pub async fn create_task(
    State(state): State<AppState>,
    request: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<TaskRecord>> {
    let Json(request) = request?;
    let record = state
        .task_controller
        .create_task(request)
        .await
        .during("添加任务失败")?;

    info!(
        job_name = %record.job_name,
        job_group = %record.job_group,
        task_id = record.id,
        "任务已创建"
    );
    Ok(success(record, "添加任务成功"))
}

/// 编辑任务
pub async fn edit_task(
    State(state): State<AppState>,
    request: Result<Json<EditTaskRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<TaskRecord>> {
    let Json(request) = request?;
    let record = state
        .task_controller
        .edit_task(request)
        .await
        .during("修改任务失败")?;

    info!(task_id = record.id, "任务已修改");
    Ok(success(record, "修改任务成功"))
}

/// 删除任务
pub async fn delete_task(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<ApiResponse<TaskRecord>> {
    let Path(id) = id?;
    let record = state
        .task_controller
        .delete_task(id)
        .await
        .during("删除任务失败")?;

    info!(task_id = id, "任务已删除");
    Ok(success(record, "删除任务成功"))
}

/// 暂停任务
pub async fn pause_task(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<ApiResponse<TaskRecord>> {
    let Path(id) = id?;
    let record = state
        .task_controller
        .pause_task(id)
        .await
        .during("暂停任务失败")?;

    info!(task_id = id, "任务已暂停");
    Ok(success(record, "暂停任务成功"))
}

/// 恢复任务
pub async fn resume_task(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<ApiResponse<TaskRecord>> {
    let Path(id) = id?;
    let record = state
        .task_controller
        .resume_task(id)
        .await
        .during("恢复任务失败")?;

    info!(task_id = id, "任务已恢复");
    Ok(success(record, "恢复任务成功"))
}

/// 获取单个任务
pub async fn get_task(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<ApiResponse<TaskRecord>> {
    let Path(id) = id?;
    let record = state
        .task_controller
        .get_task(id)
        .await
        .during("获取任务失败")?;
    Ok(success(record, "获取任务成功"))
}

/// 获取任务的触发历史
pub async fn task_history(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<ApiResponse<Vec<FireRecord>>> {
    let Path(id) = id?;
    let history = state
        .task_controller
        .task_history(id)
        .await
        .during("获取任务执行历史失败")?;
    Ok(success(history, "获取任务执行历史成功"))
}
