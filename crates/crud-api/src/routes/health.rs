//! 환영 메시지와 헬스 체크 endpoint.
//!
//! `/healthz`는 로드밸런서나 오케스트레이션 시스템(Kubernetes 등)의 liveness probe용입니다.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

/// 환영 메시지 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

/// 헬스 체크 응답 구조체.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 서비스 상태 ("ok" | "unhealthy")
    pub status: String,

    /// 저장소 에러 상세 (비정상일 때만)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// API 버전
    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,
}

/// 환영 메시지.
///
/// GET /
pub async fn welcome(State(state): State<Arc<AppState>>) -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: format!(
            "Welcome to the {} version v{}!",
            state.config.project_name, state.version
        ),
    })
}

/// 헬스 체크.
///
/// 저장소에 `SELECT 1` 수준의 요청을 보내 연결 가능 여부를 확인합니다.
/// GET /healthz
pub async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status_code, status, error) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok", None),
        Err(e) => {
            tracing::error!(error = %e, "헬스 체크 실패");
            (StatusCode::INTERNAL_SERVER_ERROR, "unhealthy", Some(e.to_string()))
        }
    };

    let response = HealthResponse {
        status: status.to_string(),
        error,
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
    };

    (status_code, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(welcome))
        .route("/healthz", get(healthz))
}
