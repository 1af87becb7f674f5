//! 통합 API 에러 타입.
//!
//! 모든 엔드포인트가 같은 형식으로 에러를 응답합니다.
//!
//! ```json
//! { "code": "ITEM_NOT_FOUND", "msg": "Item not found" }
//! ```
//!
//! 내부 에러의 상세 내용은 서버 로그에만 남고 응답에는 일반 메시지만 포함됩니다.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use crud_core::CoreError;
use serde::{Deserialize, Serialize};
use std::any::Any;

use crate::auth::{AuthError, PasswordError, TokenError};

/// 내부 에러 응답 메시지.
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong";

/// 에러 응답 본문.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "VALIDATION_ERROR", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 메시지
    pub msg: String,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            msg: msg.into(),
        }
    }
}

/// API 에러.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 누락되었거나 잘못된 입력 (400)
    #[error("{0}")]
    Validation(String),

    /// 인증 미들웨어 실패
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// 로그인 실패 (401)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// 리소스 없음 (404)
    #[error("{0}")]
    NotFound(String),

    /// 중복 (400)
    #[error("{0}")]
    Conflict(String),

    /// 요청 처리 시간 초과 (408)
    #[error("Request timed out")]
    Timeout,

    /// 예상하지 못한 에러 (500). 상세 내용은 로그에만 기록.
    #[error("{0}")]
    Internal(String),
}

/// API 핸들러 Result 타입.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(e) => e.status(),
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Auth(e) => e.code(),
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Timeout => "REQUEST_TIMEOUT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 클라이언트에 노출할 응답 본문.
    pub fn to_response(&self) -> ApiErrorResponse {
        let msg = match self {
            ApiError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
            other => other.to_string(),
        };
        ApiErrorResponse::new(self.code(), msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "요청 처리 중 내부 에러");
        }

        (self.status(), Json(self.to_response())).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(msg) => ApiError::Validation(msg),
            CoreError::NotFound(msg) => ApiError::NotFound(msg),
            CoreError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => ApiError::Auth(AuthError::Expired),
            TokenError::Malformed(_) => ApiError::Auth(AuthError::Malformed),
            TokenError::UserNotFound(_) => ApiError::Auth(AuthError::UserNotFound),
            TokenError::Store(e) => e.into(),
            TokenError::Encoding(e) => ApiError::Internal(format!("토큰 인코딩 실패: {}", e)),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// `CatchPanicLayer`용 패닉 핸들러.
///
/// 패닉 메시지는 로그에만 남기고 일반 500 응답을 반환합니다.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "알 수 없는 패닉".to_string()
    };

    ApiError::Internal(format!("핸들러 패닉: {}", detail)).into_response()
}

/// `TimeoutLayer`가 만든 본문 없는 408 응답을 공통 에러 형식으로 교체.
///
/// `axum::middleware::map_response`로 타임아웃 레이어 바깥에 적용합니다.
pub async fn timeout_response(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT
        && !response.headers().contains_key(CONTENT_TYPE)
    {
        tracing::warn!("요청 처리 시간 초과");
        return ApiError::Timeout.into_response();
    }
    response
}
