//! HTTP 错误映射

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use clinic_core::ClinicError;
use serde_json::json;

/// 处理器统一错误，包装 [`ClinicError`]
#[derive(Debug)]
pub struct ApiError(pub ClinicError);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<ClinicError> for ApiError {
    fn from(err: ClinicError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        tracing::warn!("Rejected request body: {}", message);
        ApiError(ClinicError::Validation(message))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            ClinicError::NotFound(_) => StatusCode::NOT_FOUND,
            ClinicError::Validation(_) => StatusCode::BAD_REQUEST,
            ClinicError::Conflict(_) => StatusCode::CONFLICT,
            ClinicError::Config(_)
            | ClinicError::Database(_)
            | ClinicError::Serialization(_)
            | ClinicError::Io(_)
            | ClinicError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // 服务端故障只记录日志，不向客户端暴露细节
        let body = if self.0.is_server_fault() {
            tracing::error!("Request failed: {}", self.0);
            json!({
                "error": true,
                "message": "服务器内部错误",
                "status": status.as_u16()
            })
        } else if let ClinicError::Validation(msg) = &self.0 {
            json!({
                "error": true,
                "message": msg,
                "errors": msg.split("; ").collect::<Vec<_>>(),
                "status": status.as_u16()
            })
        } else {
            json!({
                "error": true,
                "message": self.0.to_string(),
                "status": status.as_u16()
            })
        };

        (status, Json(body)).into_response()
    }
}
