use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use scheduler_core::{ErrorKind, SchedulerError};
use tracing::{error, warn};

use crate::response::ApiResponse;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 调度服务返回的错误，`operation` 描述失败的操作
    #[error("{operation}: {source}")]
    Scheduler {
        operation: &'static str,
        #[source]
        source: SchedulerError,
    },

    #[error("请求参数错误: {message}")]
    BadRequest { status: StatusCode, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Scheduler { source, .. } => match source.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Execution | ErrorKind::Engine => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest { status, .. } => *status,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// 为调度服务的结果附加失败的操作描述
pub trait OperationContext<T> {
    fn during(self, operation: &'static str) -> ApiResult<T>;
}

impl<T> OperationContext<T> for Result<T, SchedulerError> {
    fn during(self, operation: &'static str) -> ApiResult<T> {
        self.map_err(|source| ApiError::Scheduler { operation, source })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Scheduler { source, .. } => source.to_string(),
            ApiError::BadRequest { message, .. } => message.clone(),
        };

        if status.is_server_error() {
            error!("请求处理失败: {}", self);
        } else {
            warn!("请求被拒绝: {}", self);
        }

        ApiResponse::error(status, self.to_string(), vec![detail]).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
