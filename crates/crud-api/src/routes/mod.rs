//! REST API 라우트.
//!
//! 모든 라우트는 최상위 경로에 병합됩니다.
//!
//! # 라우트 구조
//!
//! - `/`, `/healthz` - 환영 메시지, 헬스 체크
//! - `/signup`, `/login` - 가입, 로그인
//! - `/items/*` - 아이템 CRUD (Bearer 토큰 필요)
//! - `/metrics` - Prometheus 메트릭

pub mod extract;
pub mod health;
pub mod items;
pub mod users;

use axum::{
    extract::State,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state, map_response},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::require_auth;
use crate::error::{handle_panic, timeout_response};
use crate::middleware::metrics_layer;
use crate::state::AppState;

pub use health::{health_router, HealthResponse, WelcomeResponse};
pub use items::items_router;
pub use users::{users_router, Credentials, MessageResponse, TokenResponse};

/// API 라우터 생성.
///
/// 아이템 라우트에만 인증 미들웨어가 `route_layer`로 적용됩니다.
pub fn create_api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = items_router().route_layer(from_fn_with_state(state, require_auth));

    Router::new()
        .merge(health_router())
        .merge(users_router())
        .merge(protected)
}

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

/// 전체 라우터 생성.
pub fn create_router(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let timeout = state.config.server.request_timeout();

    // 메트릭 라우터 (별도 상태)
    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let api_router = create_api_router(state.clone()).with_state(state);

    with_middleware(Router::new().merge(metrics_router).merge(api_router), timeout)
}

/// 공통 미들웨어 스택 적용.
///
/// 바깥에서부터 패닉 처리, 타임아웃(408, JSON 본문), 요청 로그, 메트릭 순입니다.
pub fn with_middleware(router: Router, timeout: Duration) -> Router {
    router
        .layer(from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(map_response(timeout_response))
        .layer(CatchPanicLayer::custom(handle_panic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Claims, TokenService};
    use crate::repository::MemoryStore;
    use crate::state::{create_test_state, create_test_state_with_store, test_config};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request},
    };
    use crud_core::Item;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(state: Arc<AppState>) -> Router {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        create_router(state, handle)
    }

    async fn call(
        app: Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn signup_and_login(state: &Arc<AppState>, username: &str, password: &str) -> String {
        let credentials = json!({"username": username, "password": password});

        let (status, _) = call(app(state.clone()), Method::POST, "/signup", None, Some(credentials.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(app(state.clone()), Method::POST, "/login", None, Some(credentials)).await;
        assert_eq!(status, StatusCode::OK);
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn create(state: &Arc<AppState>, token: &str, name: &str, description: &str) -> Item {
        let (status, body) = call(
            app(state.clone()),
            Method::POST,
            "/items/create",
            Some(token),
            Some(json!({"name": name, "description": description})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn test_signup_login_token_resolves_user() {
        let state = create_test_state();
        let token = signup_and_login(&state, "alice", "wonderland").await;

        let claims = state.tokens.validate(&token).unwrap();
        let user = state
            .store
            .find_user_by_id(claims.user_id().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "wonderland");
    }

    #[tokio::test]
    async fn test_signup_response() {
        let state = create_test_state();

        let (status, body) = call(
            app(state.clone()),
            Method::POST,
            "/signup",
            None,
            Some(json!({"username": "bob", "password": "pw"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["msg"], "User created successfully");
        assert!(body.get("access_token").is_none());

        let (status, body) = call(
            app(state),
            Method::POST,
            "/signup",
            None,
            Some(json!({"username": "bob", "password": "other"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "User already exists");
    }

    #[tokio::test]
    async fn test_signup_rejects_bad_input() {
        let state = create_test_state();

        let (status, body) = call(
            app(state.clone()),
            Method::POST,
            "/signup",
            None,
            Some(json!({"username": "", "password": "pw"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = call(
            app(state),
            Method::POST,
            "/signup",
            None,
            Some(json!({"username": "carol"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_concurrent_signups_single_winner() {
        let state = create_test_state();
        let credentials = json!({"username": "dave", "password": "pw"});

        let attempts = (0..4).map(|_| {
            call(
                app(state.clone()),
                Method::POST,
                "/signup",
                None,
                Some(credentials.clone()),
            )
        });
        let results = spawn_all(attempts).await;

        let ok = results.iter().filter(|(s, _)| *s == StatusCode::OK).count();
        let rejected = results
            .iter()
            .filter(|(s, _)| *s == StatusCode::BAD_REQUEST)
            .count();
        assert_eq!(ok, 1);
        assert_eq!(rejected, results.len() - 1);
    }

    /// 각 future를 별도 태스크로 동시에 실행.
    async fn spawn_all<F>(futures: impl Iterator<Item = F>) -> Vec<F::Output>
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let handles: Vec<_> = futures.map(tokio::spawn).collect();
        let mut outputs = Vec::with_capacity(handles.len());
        for handle in handles {
            outputs.push(handle.await.unwrap());
        }
        outputs
    }

    #[tokio::test]
    async fn test_login_failures() {
        let state = create_test_state();
        signup_and_login(&state, "erin", "secret").await;

        let (status, body) = call(
            app(state.clone()),
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "erin", "password": "wrong"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["msg"], "Invalid credentials");

        let (status, _) = call(
            app(state),
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "nobody", "password": "secret"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_token_response() {
        let state = create_test_state();
        signup_and_login(&state, "frank", "pw").await;

        let (_, body) = call(
            app(state),
            Method::POST,
            "/login",
            None,
            Some(json!({"username": "frank", "password": "pw"})),
        )
        .await;
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["expires_in"], 30 * 60);
    }

    #[tokio::test]
    async fn test_create_then_get_item() {
        let state = create_test_state();
        let token = signup_and_login(&state, "alice", "pw").await;

        let item = create(&state, &token, "A", "B").await;

        let (status, body) = call(
            app(state),
            Method::GET,
            &format!("/items?item_id={}", item.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "A");
        assert_eq!(body["description"], "B");
    }

    #[tokio::test]
    async fn test_list_items() {
        let state = create_test_state();
        let token = signup_and_login(&state, "alice", "pw").await;

        create(&state, &token, "first", "1").await;
        create(&state, &token, "second", "2").await;

        let (status, body) = call(app(state), Method::GET, "/items/all", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let items: Vec<Item> = serde_json::from_value(body).unwrap();
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let state = create_test_state();
        let token = signup_and_login(&state, "alice", "pw").await;
        let item = create(&state, &token, "A", "B").await;

        let (status, body) = call(
            app(state.clone()),
            Method::PATCH,
            &format!("/items/update?item_id={}", item.id),
            Some(&token),
            Some(json!({"name": "C"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "C");
        assert_eq!(body["description"], "B");

        let (status, body) = call(
            app(state),
            Method::PUT,
            &format!("/items/update?item_id={}", item.id),
            Some(&token),
            Some(json!({"description": "D"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "C");
        assert_eq!(body["description"], "D");
    }

    #[tokio::test]
    async fn test_empty_update_returns_current_item() {
        let state = create_test_state();
        let token = signup_and_login(&state, "alice", "pw").await;
        let item = create(&state, &token, "A", "B").await;

        let (status, body) = call(
            app(state.clone()),
            Method::PATCH,
            &format!("/items/update?item_id={}", item.id),
            Some(&token),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_value::<Item>(body).unwrap(), item);

        let (status, body) = call(
            app(state),
            Method::PUT,
            "/items/update?item_id=999",
            Some(&token),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["msg"], "Item not found");
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let state = create_test_state();
        let token = signup_and_login(&state, "alice", "pw").await;
        let item = create(&state, &token, "A", "B").await;

        let (status, body) = call(
            app(state.clone()),
            Method::DELETE,
            &format!("/items/delete?item_id={}", item.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["msg"], format!("Item {} deleted", item.id));

        let (status, body) = call(
            app(state.clone()),
            Method::GET,
            &format!("/items?item_id={}", item.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["msg"], "Item not found");

        let (status, _) = call(
            app(state),
            Method::DELETE,
            &format!("/items/delete?item_id={}", item.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_item_id_validation() {
        let state = create_test_state();
        let token = signup_and_login(&state, "alice", "pw").await;

        for (method, uri) in [
            (Method::GET, "/items"),
            (Method::DELETE, "/items/delete"),
            (Method::DELETE, "/items/delete?item_id=abc"),
        ] {
            let (status, body) = call(app(state.clone()), method, uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["code"], "VALIDATION_ERROR");
        }

        let (status, body) = call(
            app(state.clone()),
            Method::PATCH,
            "/items/update",
            Some(&token),
            Some(json!({"name": "C"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["msg"], "item_id is required");

        let (status, _) = call(
            app(state),
            Method::PATCH,
            "/items/update?item_id=999",
            Some(&token),
            Some(json!({"name": "C"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_protected_routes_require_header() {
        let store = Arc::new(MemoryStore::new());
        let state = create_test_state_with_store(store.clone());

        for (method, uri) in [
            (Method::POST, "/items/create"),
            (Method::GET, "/items/all"),
            (Method::GET, "/items?item_id=1"),
            (Method::PUT, "/items/update?item_id=1"),
            (Method::PATCH, "/items/update?item_id=1"),
            (Method::DELETE, "/items/delete?item_id=1"),
        ] {
            let (status, body) = call(app(state.clone()), method, uri, None, None).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
            assert_eq!(body["msg"], "Token is missing or malformed");
        }

        assert_eq!(store.access_count(), 0);
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let state = create_test_state();
        let token = signup_and_login(&state, "alice", "pw").await;
        let user_id = state.tokens.validate(&token).unwrap().user_id().unwrap();

        let expired = state
            .tokens
            .sign(&Claims::new(user_id, chrono::Duration::minutes(-1)))
            .unwrap();

        let (status, body) = call(app(state), Method::GET, "/items/all", Some(&expired), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["msg"], "Token has expired");
    }

    #[tokio::test]
    async fn test_foreign_secret_rejected() {
        let state = create_test_state();
        let token = signup_and_login(&state, "alice", "pw").await;
        let user_id = state.tokens.validate(&token).unwrap().user_id().unwrap();

        let mut config = test_config();
        config.jwt.secret = secrecy::SecretString::new("another-secret-entirely-32-characters".into());
        let foreign = TokenService::new(&config.jwt, state.store.clone())
            .sign(&Claims::new(user_id, chrono::Duration::minutes(5)))
            .unwrap();

        let (status, body) = call(app(state), Method::GET, "/items/all", Some(&foreign), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["msg"], "Token is invalid");
    }

    #[tokio::test]
    async fn test_deleted_user_token() {
        let state = create_test_state();
        let token = state.tokens.sign(&Claims::new(77, chrono::Duration::minutes(5))).unwrap();

        let (status, body) = call(app(state), Method::GET, "/items/all", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["msg"], "User not found");
    }

    #[tokio::test]
    async fn test_store_failure_is_generic_500() {
        let store = Arc::new(MemoryStore::new());
        let state = create_test_state_with_store(store.clone());

        store.set_unavailable(true);
        let (status, body) = call(
            app(state),
            Method::POST,
            "/signup",
            None,
            Some(json!({"username": "bob", "password": "pw"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["msg"], "Something went wrong");
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_panic_is_caught() {
        async fn boom() -> &'static str {
            panic!("handler exploded")
        }

        let router = with_middleware(
            Router::new().route("/boom", get(boom)),
            Duration::from_secs(5),
        );

        let (status, body) = call(router, Method::GET, "/boom", None, None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["msg"], "Something went wrong");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_json_408() {
        async fn slow() -> &'static str {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }

        let router = with_middleware(
            Router::new().route("/slow", get(slow)),
            Duration::from_millis(50),
        );

        let (status, body) = call(router, Method::GET, "/slow", None, None).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["code"], "REQUEST_TIMEOUT");
        assert_eq!(body["msg"], "Request timed out");
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (status, _) = call(app(create_test_state()), Method::GET, "/metrics", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
