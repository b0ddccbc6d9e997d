//! # API 响应结构
//!
//! 定义了标准的 JSON API 响应格式，包括成功和失败响应。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCategory};
use crate::{ldebug, lerror, logging::{LogComponent, LogStage}};

/// # 标准成功响应
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// # 标准错误信息
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

/// # 标准错误响应
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorInfo,
    pub timestamp: DateTime<Utc>,
}

/// # API响应枚举
///
/// 统一所有API出口，方便转换为 `axum::response::Response`
#[derive(Debug)]
pub enum ApiResponse<T: Serialize> {
    Success(T),
    Created(T),
    NoContent,
    Error(StatusCode, String, String),
    AppError(AppError),
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success(data) => envelope(StatusCode::OK, data),
            ApiResponse::Created(data) => envelope(StatusCode::CREATED, data),
            ApiResponse::NoContent => StatusCode::NO_CONTENT.into_response(),
            ApiResponse::Error(status, code, message) => error_body(status, code, message),
            ApiResponse::AppError(error) => {
                let (status, code) = error.to_http_response_parts();
                match error.category() {
                    ErrorCategory::Server => lerror!(
                        "system",
                        LogStage::Error,
                        LogComponent::Api,
                        "server_error",
                        &format!("请求处理失败: {error:?}"),
                        code = code,
                    ),
                    ErrorCategory::Client => ldebug!(
                        "system",
                        LogStage::Response,
                        LogComponent::Api,
                        "client_error",
                        &format!("请求被拒绝: {error}"),
                        code = code,
                    ),
                }
                error_body(status, code.to_string(), error.public_message())
            }
        }
    }
}

fn envelope<T: Serialize>(status: StatusCode, data: T) -> Response {
    (
        status,
        Json(SuccessResponse {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now(),
        }),
    )
        .into_response()
}

fn error_body(status: StatusCode, code: String, message: String) -> Response {
    let error_response = ErrorResponse {
        success: false,
        error: ErrorInfo { code, message },
        timestamp: Utc::now(),
    };
    (status, Json(error_response)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::AppError(self).into_response()
    }
}

/// # 便捷函数：成功响应
pub fn success<T: Serialize>(data: T) -> Response {
    ApiResponse::Success(data).into_response()
}

/// # 便捷函数：创建成功响应
pub fn created<T: Serialize>(data: T) -> Response {
    ApiResponse::Created(data).into_response()
}

/// # 便捷函数：无响应体
pub fn no_content() -> Response {
    ApiResponse::<()>::NoContent.into_response()
}

/// # 便捷函数：HTTP错误响应
pub fn error(status: StatusCode, code: &str, message: &str) -> Response {
    ApiResponse::<()>::Error(status, code.to_string(), message.to_string()).into_response()
}

/// # 便捷函数：应用错误响应
pub fn app_error(error: AppError) -> Response {
    ApiResponse::<()>::AppError(error).into_response()
}
