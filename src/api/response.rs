use crate::error::AppError;
use crate::models::Notice;
use axum::{
    extract::Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// 统一响应体
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub notices: Vec<Notice>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, notices: Vec<Notice>) -> Response {
        let response = ApiResponse {
            success: true,
            message: "OK".to_string(),
            data: Some(data),
            notices,
        };
        (StatusCode::OK, Json(response)).into_response()
    }
}

impl ApiResponse<()> {
    pub fn failure(status: StatusCode, message: String, notices: Vec<Notice>) -> Response {
        let response = ApiResponse::<()> {
            success: false,
            message,
            data: None,
            notices,
        };
        (status, Json(response)).into_response()
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidDate => StatusCode::BAD_REQUEST,
            AppError::InvalidState(_) | AppError::OperationInProgress(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        ApiResponse::<()>::failure(status, format!("Error: {}", self), Vec::new())
    }
}
