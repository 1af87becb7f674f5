//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 시작 시 한 번 생성되어 `Arc`로 래핑된 채 라우터와 인증 미들웨어에 주입됩니다.
//! 요청 간에 공유되는 가변 상태는 저장소 연결 풀뿐입니다.

use chrono::{DateTime, Utc};
use crud_core::AppConfig;
use std::sync::Arc;

use crate::auth::{tracer_from_config, AuthTracer, TokenService};
use crate::repository::Store;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 시작 시 로드된 설정
    pub config: Arc<AppConfig>,

    /// 사용자/아이템 저장소
    pub store: Arc<dyn Store>,

    /// 토큰 발급/검증
    pub tokens: Arc<TokenService>,

    /// 인증된 요청용 트레이서 (비활성 시 no-op)
    pub tracer: Arc<dyn AuthTracer>,

    /// 서버 시작 시간
    pub started_at: DateTime<Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 설정과 저장소로 상태 생성.
    ///
    /// 트레이서는 `TRACING_ENABLED` 설정에 따라 선택됩니다.
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        let tokens = Arc::new(TokenService::new(&config.jwt, store.clone()));
        let tracer = tracer_from_config(&config.tracing);

        Self {
            config: Arc::new(config),
            store,
            tokens,
            tracer,
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 서버 업타임(초) 반환.
    pub fn uptime_secs(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}

/// 테스트용 설정.
#[cfg(any(test, feature = "test-utils"))]
pub fn test_config() -> AppConfig {
    use crud_core::{
        DatabaseConfig, JwtAlgorithm, JwtConfig, LogFormat, LoggingConfig, ServerConfig,
        TracingConfig,
    };
    use secrecy::SecretString;

    AppConfig {
        project_name: "Item CRUD App".to_string(),
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: SecretString::new("postgres://localhost/crud_test".into()),
            max_connections: 1,
            acquire_timeout_secs: 1,
        },
        jwt: JwtConfig {
            secret: SecretString::new("test-secret-key-for-jwt-testing-minimum-32-chars".into()),
            algorithm: JwtAlgorithm::Hs256,
            access_token_expire_minutes: 30,
        },
        tracing: TracingConfig {
            enabled: false,
            service_name: "crud-api".to_string(),
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        },
    }
}

/// 주어진 메모리 저장소로 테스트 상태 생성.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state_with_store(store: Arc<crate::repository::MemoryStore>) -> Arc<AppState> {
    Arc::new(AppState::new(test_config(), store))
}

/// 빈 메모리 저장소로 테스트 상태 생성.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> Arc<AppState> {
    create_test_state_with_store(Arc::new(crate::repository::MemoryStore::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_defaults() {
        let state = create_test_state();

        assert_eq!(state.version, env!("CARGO_PKG_VERSION"));
        assert!(state.uptime_secs() >= 0);
        assert_eq!(state.tokens.ttl(), chrono::Duration::minutes(30));
        assert_eq!(state.config.project_name, "Item CRUD App");
    }
}
