//! Axum용 Bearer 토큰 인증 미들웨어.
//!
//! 보호된 라우트 앞에서 요청마다 다음 순서로 판정합니다:
//!
//! 1. `Authorization: Bearer <token>` 헤더 확인 (없으면 403)
//! 2. 토큰 검증 (만료 401, 그 외 디코딩 실패 401)
//! 3. subject 사용자 조회 (없으면 404)
//! 4. [`CurrentUser`]를 요청 extension에 넣고 핸들러 실행
//!
//! 인증 실패는 모두 이 경계 안에서 응답으로 끝나며 핸들러까지 도달하지 않습니다.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use crud_core::User;
use std::sync::Arc;
use tracing::Instrument;

use super::jwt::TokenError;
use crate::error::ApiError;
use crate::metrics::record_auth_failure;
use crate::state::AppState;

/// 인증 실패 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Token is missing or malformed")]
    Missing,
    #[error("Token is invalid")]
    Malformed,
    #[error("Token has expired")]
    Expired,
    #[error("User not found")]
    UserNotFound,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Missing => StatusCode::FORBIDDEN,
            AuthError::Malformed | AuthError::Expired => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Missing => "MISSING_TOKEN",
            AuthError::Malformed => "INVALID_TOKEN",
            AuthError::Expired => "TOKEN_EXPIRED",
            AuthError::UserNotFound => "USER_NOT_FOUND",
        }
    }

    /// 메트릭 라벨.
    fn reason(&self) -> &'static str {
        match self {
            AuthError::Missing => "missing",
            AuthError::Malformed => "invalid",
            AuthError::Expired => "expired",
            AuthError::UserNotFound => "user_not_found",
        }
    }
}

/// 인증된 사용자 추출기.
///
/// [`require_auth`]가 적용된 라우트에서만 사용할 수 있습니다.
///
/// ```rust,ignore
/// async fn handler(CurrentUser(user): CurrentUser) -> String {
///     format!("Hello, {}!", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::Internal("인증 미들웨어 없이 CurrentUser 요청".to_string()))
    }
}

/// `Authorization` 헤더에서 Bearer 토큰 추출.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
}

fn reject(error: AuthError) -> ApiError {
    match error {
        AuthError::Expired => tracing::info!("[AUTH] 만료된 토큰"),
        AuthError::Missing => tracing::warn!("[AUTH] Authorization 헤더 누락 또는 형식 오류"),
        AuthError::Malformed => tracing::warn!("[AUTH] 유효하지 않은 토큰"),
        AuthError::UserNotFound => tracing::warn!("[AUTH] 토큰 subject 사용자 없음"),
    }
    record_auth_failure(error.reason());
    ApiError::Auth(error)
}

/// 토큰 인증 미들웨어.
///
/// `axum::middleware::from_fn_with_state`로 보호된 라우터에 `route_layer`로 적용합니다.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 헤더 판정은 저장소 접근 전에 끝나야 함
    let token = bearer_token(req.headers()).ok_or_else(|| reject(AuthError::Missing))?;

    let claims = state.tokens.validate(token).map_err(|e| match e {
        TokenError::Expired => reject(AuthError::Expired),
        _ => reject(AuthError::Malformed),
    })?;
    let user_id = claims.user_id().map_err(|_| reject(AuthError::Malformed))?;

    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| reject(AuthError::UserNotFound))?;

    tracing::info!(
        "[AUTH] {} {} by user: {} (id={})",
        req.method(),
        req.uri().path(),
        user.username,
        user.id
    );

    let span = state
        .tracer
        .request_span(&user, req.method().as_str(), req.uri().path());
    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).instrument(span).await)
}
