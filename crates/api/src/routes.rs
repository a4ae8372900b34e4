use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;

use scheduler_core::traits::TaskControlService;

use crate::handlers::{
    health::health_check,
    tasks::{
        create_task, delete_task, edit_task, get_task, list_tasks, pause_task, resume_task,
        task_history,
    },
};

/// 任务管理接口的路径前缀
pub const API_PREFIX: &str = "/api/v1/scheduling";

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub task_controller: Arc<dyn TaskControlService>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    let scheduling = Router::new()
        .route("/list", get(list_tasks))
        .route("/create", post(create_task))
        .route("/edit", put(edit_task))
        .route("/delete/{id}", delete(delete_task))
        .route("/pause/{id}", patch(pause_task))
        .route("/resume/{id}", patch(resume_task))
        .route("/task/{id}", get(get_task))
        .route("/history/{id}", get(task_history));

    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        // 任务管理API
        .nest(API_PREFIX, scheduling)
        .with_state(state)
}
