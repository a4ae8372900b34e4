//! # 调度管理API
//!
//! 基于axum的HTTP管理接口，所有任务操作都委托给 [`TaskControlService`]。
//!
//! ## 路由
//!
//! | 方法 | 路径 | 说明 |
//! |------|------|------|
//! | GET | `/api/v1/scheduling/list` | 任务列表 |
//! | POST | `/api/v1/scheduling/create` | 创建任务 |
//! | PUT | `/api/v1/scheduling/edit` | 修改任务 |
//! | DELETE | `/api/v1/scheduling/delete/{id}` | 删除任务 |
//! | PATCH | `/api/v1/scheduling/pause/{id}` | 暂停任务 |
//! | PATCH | `/api/v1/scheduling/resume/{id}` | 恢复任务 |
//! | GET | `/api/v1/scheduling/task/{id}` | 任务详情 |
//! | GET | `/api/v1/scheduling/history/{id}` | 触发历史 |
//! | GET | `/health` | 健康检查 |
//!
//! 所有任务接口都返回统一的 [`response::ApiResponse`] 包装：
//!
//! ```json
//! {
//!   "success": true,
//!   "statusCode": 200,
//!   "message": "添加任务成功",
//!   "data": { "id": 1712000123, "jobName": "HttpJob", "jobStatus": "SCHEDULED" }
//! }
//! ```
//!
//! 失败时 `success` 为 `false`，`statusCode` 与HTTP状态码一致，`errors` 列出错误详情。
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use scheduler_api::create_app;
//! use scheduler_core::{traits::TaskControlService, ApiConfig};
//!
//! async fn serve(task_controller: Arc<dyn TaskControlService>) -> anyhow::Result<()> {
//!     let config = ApiConfig::default();
//!     let app = create_app(task_controller, &config, None);
//!     let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower::ServiceBuilder;

use handlers::metrics::prometheus_metrics;
use middleware::{cors_layer, request_logging, timeout_layer, trace_layer};
use routes::{create_routes, AppState};
use scheduler_core::{traits::TaskControlService, ApiConfig};

pub use error::{ApiError, ApiResult};
pub use response::ApiResponse;
pub use routes::API_PREFIX;

/// 指标导出端点
#[derive(Clone)]
pub struct MetricsEndpoint {
    pub path: String,
    pub handle: PrometheusHandle,
}

/// 创建完整的API应用
pub fn create_app(
    task_controller: Arc<dyn TaskControlService>,
    api_config: &ApiConfig,
    metrics: Option<MetricsEndpoint>,
) -> Router {
    let state = AppState { task_controller };

    let mut app = create_routes(state);
    if let Some(endpoint) = metrics {
        app = app.merge(
            Router::new()
                .route(&endpoint.path, get(prometheus_metrics))
                .with_state(endpoint.handle),
        );
    }

    let app = app.layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(axum::middleware::from_fn(request_logging))
            .layer(timeout_layer(api_config.request_timeout_seconds)),
    );

    if api_config.cors_enabled {
        app.layer(cors_layer())
    } else {
        app
    }
}
