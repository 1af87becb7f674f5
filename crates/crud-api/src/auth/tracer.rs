//! 인증된 요청용 tracing span.
//!
//! 추적이 꺼져 있으면 [`NoopTracer`]가 비활성 span을 돌려주므로
//! 미들웨어는 추적 설정 여부로 분기하지 않습니다.

use crud_core::{TracingConfig, User};
use std::sync::Arc;
use tracing::Span;

/// 인증된 요청에 span을 붙이는 트레이서.
pub trait AuthTracer: Send + Sync {
    fn request_span(&self, user: &User, method: &str, path: &str) -> Span;
}

/// 사용자 정보가 기록된 `authenticated-request` span 생성.
pub struct SpanTracer {
    service_name: String,
}

impl SpanTracer {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

impl AuthTracer for SpanTracer {
    fn request_span(&self, user: &User, method: &str, path: &str) -> Span {
        tracing::info_span!(
            "authenticated-request",
            service.name = %self.service_name,
            user.id = user.id,
            user.username = %user.username,
            http.method = %method,
            http.path = %path,
        )
    }
}

/// 추적 비활성화 시 사용.
pub struct NoopTracer;

impl AuthTracer for NoopTracer {
    fn request_span(&self, _user: &User, _method: &str, _path: &str) -> Span {
        Span::none()
    }
}

/// 설정에 따라 트레이서 선택.
pub fn tracer_from_config(config: &TracingConfig) -> Arc<dyn AuthTracer> {
    if config.enabled {
        tracing::info!(service = %config.service_name, "인증 요청 추적 활성화");
        Arc::new(SpanTracer::new(config.service_name.clone()))
    } else {
        Arc::new(NoopTracer)
    }
}
