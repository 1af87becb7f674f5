//! 가입 및 로그인 endpoint.
//!
//! 가입은 토큰을 발급하지 않습니다. 로그인에 성공하면 Bearer Access Token을 받습니다.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, Uri},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use super::extract::{extract_json, extract_validated_json};
use crate::auth::{hash_password_blocking, verify_password_blocking};
use crate::error::{ApiError, ApiResult};
use crate::metrics::{record_login, record_signup};
use crate::state::AppState;

/// 가입/로그인 요청.
///
/// 비밀번호가 로그에 남지 않도록 `Debug`를 구현하지 않습니다.
#[derive(Deserialize, Validate)]
pub struct Credentials {
    #[validate(length(min = 1, message = "username must not be empty"))]
    pub username: String,
    #[validate(length(min = 1, message = "password must not be empty"))]
    pub password: String,
}

/// 단순 메시지 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// 로그인 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// 만료까지 남은 시간 (초)
    pub expires_in: i64,
}

/// 가입.
///
/// POST /signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    body: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    tracing::info!("[ANON] {} {} signup attempt", method, uri.path());
    let credentials = extract_validated_json(body)?;

    if state
        .store
        .find_user_by_username(&credentials.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password_blocking(credentials.password).await?;

    // 사전 확인 이후의 동시 가입은 저장소의 고유 제약이 막음
    let user = state
        .store
        .create_user(&credentials.username, &password_hash)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::Conflict("User already exists".to_string()),
            other => other,
        })?;

    record_signup();
    tracing::info!(user_id = user.id, username = %user.username, "사용자 가입");

    Ok(Json(MessageResponse::new("User created successfully")))
}

/// 로그인.
///
/// 사용자가 없거나 비밀번호가 다르면 같은 401 응답을 반환합니다.
/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    body: Result<Json<Credentials>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    tracing::info!("[ANON] {} {} login attempt", method, uri.path());
    let credentials = extract_json(body)?;

    let Some(user) = state
        .store
        .find_user_by_username(&credentials.username)
        .await?
    else {
        record_login(false);
        return Err(ApiError::InvalidCredentials);
    };

    let verified =
        verify_password_blocking(credentials.password, user.password_hash.clone()).await?;
    if !verified {
        record_login(false);
        tracing::warn!(username = %user.username, "로그인 실패: 비밀번호 불일치");
        return Err(ApiError::InvalidCredentials);
    }

    let access_token = state.tokens.issue(user.id).await?;
    record_login(true);

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.ttl().num_seconds(),
    }))
}

/// 가입/로그인 라우터 생성.
pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}
