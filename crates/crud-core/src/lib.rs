//! # CRUD Core
//!
//! 아이템 CRUD 서비스의 핵심 타입을 제공합니다.
//!
//! - 설정 관리 (환경 변수 기반, 시작 시 한 번 로드)
//! - 로깅 인프라
//! - 공통 에러 타입
//! - 도메인 레코드 (사용자, 아이템)

pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::{
    AppConfig, DatabaseConfig, JwtAlgorithm, JwtConfig, LoggingConfig, ServerConfig,
    TracingConfig,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use model::{Item, ItemPatch, NewItem, User};
