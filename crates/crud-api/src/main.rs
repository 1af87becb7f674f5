//! 아이템 CRUD API 서버.
//!
//! 설정을 로드하고 데이터베이스 마이그레이션을 실행한 뒤 Axum 서버를 시작합니다.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use crud_api::metrics::setup_metrics_recorder;
use crud_api::repository::PgStore;
use crud_api::routes::create_router;
use crud_api::state::AppState;
use crud_core::{init_logging, AppConfig, LogConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // 필수 설정이 없으면 시작하지 않음
    let config = AppConfig::from_env().context("설정 로드 실패 (DATABASE_URL, JWT_SECRET 확인)")?;

    // tracing 초기화. 실패해도 요청 처리는 계속
    if let Err(e) = init_logging(LogConfig::from_app_config(&config)) {
        eprintln!("로깅 초기화 실패: {}", e);
    }

    info!("Starting Item CRUD API server...");

    // Prometheus 메트릭 레코더 설정
    let metrics_handle = setup_metrics_recorder().context("메트릭 레코더 설정 실패")?;
    info!("Prometheus metrics recorder initialized");

    let addr = config.server.socket_addr().map_err(|e| {
        error!(
            host = %config.server.host,
            port = config.server.port,
            error = %e,
            "소켓 주소 설정이 유효하지 않습니다. API_HOST, API_PORT 환경변수를 확인하세요."
        );
        e
    })?;

    // 데이터베이스 연결 및 테이블 생성
    let store = PgStore::connect(&config.database)
        .await
        .context("데이터베이스 연결 실패")?;
    store.migrate().await.context("마이그레이션 실패")?;
    info!("Database connected and migrated");

    let state = Arc::new(AppState::new(config, Arc::new(store)));
    info!(
        version = %state.version,
        tracing_enabled = state.config.tracing.enabled,
        jwt_algorithm = state.config.jwt.algorithm.as_str(),
        "Application state initialized"
    );

    // 라우터 생성
    let app = create_router(state, metrics_handle);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(%addr, "API server listening");
    info!("Metrics available at http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
/// 시그널 핸들러 설치에 실패하면 해당 시그널은 무시됩니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Ctrl+C 핸들러 설치 실패");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "SIGTERM 핸들러 설치 실패");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
