//! Shared helpers for API integration tests.
//!
//! Builds the same router the binary builds, against a per-test database,
//! with fixed secrets so tests can mint tokens and sign webhook bodies.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::PgPool;
use tower::ServiceExt;

use glaze_api::auth::jwt::Claims;
use glaze_api::config::{GatewayConfig, IdentityConfig, LimitsConfig, ServerConfig};
use glaze_api::router::build_app_router;
use glaze_api::state::AppState;
use glaze_gateway::{GatewayClient, GatewayEndpoints};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Build a test `ServerConfig` with fixed secrets and default limits.
///
/// Both service keys are set so routing tests do not fail on configuration;
/// no test in this suite actually reaches an upstream provider.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        identity: IdentityConfig {
            jwt_secret: TEST_JWT_SECRET.to_string(),
        },
        gateway: GatewayConfig {
            direct_api_key: Some("test-direct-key".to_string()),
            aggregator_api_key: Some("test-aggregator-key".to_string()),
            direct_base_url: "http://127.0.0.1:1".to_string(),
            aggregator_base_url: "http://127.0.0.1:1".to_string(),
        },
        limits: LimitsConfig {
            max_instruction_chars: 10_000,
            max_image_bytes: 25 * 1024 * 1024,
            min_balance_tokens: 500,
            fallback_token_cost: 1290,
        },
        webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool. Mirrors the construction in `main.rs` so tests
/// exercise the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    app_with_config(pool, test_config())
}

/// Like [`build_test_app`], but pointing the aggregator gateway at a local
/// stub server so a test can drive the dispatch-and-settle path end to end.
pub fn build_test_app_with_aggregator(pool: PgPool, aggregator_base_url: &str) -> Router {
    let mut config = test_config();
    config.gateway.aggregator_base_url = aggregator_base_url.to_string();
    app_with_config(pool, config)
}

fn app_with_config(pool: PgPool, config: ServerConfig) -> Router {
    let gateway = GatewayClient::new(GatewayEndpoints {
        direct_base_url: config.gateway.direct_base_url.clone(),
        aggregator_base_url: config.gateway.aggregator_base_url.clone(),
    });
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        gateway: Arc::new(gateway),
    };
    build_app_router(state, &config)
}

/// Spawn a stub OpenAI-compatible upstream on an ephemeral port that answers
/// every `/chat/completions` call with the given body. Returns its base URL.
pub async fn spawn_aggregator_stub(response: serde_json::Value) -> String {
    let app = Router::new().route(
        "/chat/completions",
        axum::routing::post(move || {
            let body = response.clone();
            async move { axum::Json(body) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Mint a valid HS256 bearer token for a test user.
pub fn mint_token(user_id: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + 3600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// Issue a GET request to the app.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Issue an authenticated request with a JSON body.
pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    user_id: &str,
    body: &serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", mint_token(user_id)))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Issue an authenticated GET request.
pub async fn get_authed(app: Router, uri: &str, user_id: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", mint_token(user_id)))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Post a raw webhook body with the given signature header value.
pub async fn post_webhook(app: Router, body: &[u8], signature: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/webhooks/payment")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-glaze-signature", signature)
        .body(Body::from(body.to_vec()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert a response is an error envelope with the given status and code.
pub async fn assert_error(response: Response<Body>, status: StatusCode, code: &str) {
    assert_eq!(response.status(), status);
    let json = body_json(response).await;
    assert_eq!(json["code"], code);
    assert!(json["error"].is_string());
}
