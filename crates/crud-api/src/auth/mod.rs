//! 인증.
//!
//! 비밀번호 해싱, JWT Access Token, 보호된 라우트용 미들웨어를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`TokenService`]: 토큰 발급/검증
//! - [`require_auth`]: Bearer 토큰 인증 미들웨어
//! - [`CurrentUser`]: 인증된 사용자 추출기
//! - [`AuthTracer`]: 인증된 요청의 tracing span
//! - 비밀번호 해싱/검증 함수
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/items/all", get(list_items))
//!     .route_layer(from_fn_with_state(state.clone(), require_auth));
//!
//! async fn list_items(CurrentUser(user): CurrentUser) -> impl IntoResponse {
//!     format!("Hello, {}!", user.username)
//! }
//! ```

mod jwt;
mod middleware;
mod password;
mod tracer;

pub use jwt::{Claims, TokenError, TokenService};
pub use middleware::{require_auth, AuthError, CurrentUser};
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
    PasswordError,
};
pub use tracer::{tracer_from_config, AuthTracer, NoopTracer, SpanTracer};
