//! Shared fixtures for router-level tests. Every external endpoint points at a closed
//! local port, so anything that reaches past request validation fails fast.

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;

use crate::billing::stripe::StripeClient;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::pdf::cache::{PdfCache, DEFAULT_TTL};
use crate::pdf::renderer::LatexRenderer;
use crate::state::AppState;
use crate::supabase::SupabaseClient;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
const CLOSED_PORT_URL: &str = "http://127.0.0.1:9";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://postgres@127.0.0.1:9/resumeforge".to_string(),
        redis_url: "redis://127.0.0.1:9/".to_string(),
        s3_bucket: "resumeforge-test".to_string(),
        s3_endpoint: CLOSED_PORT_URL.to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        supabase_url: CLOSED_PORT_URL.to_string(),
        supabase_service_role_key: "service-role".to_string(),
        stripe_secret_key: "sk_test".to_string(),
        stripe_webhook_secret: WEBHOOK_SECRET.to_string(),
        stripe_pro_price_id: "price_test".to_string(),
        app_url: "http://localhost:3000".to_string(),
        anthropic_api_key: None,
        openai_api_key: None,
        latex_engine: "tectonic".to_string(),
        ai_rate_limit_per_hour: 50,
        pdf_cache_ttl_secs: DEFAULT_TTL.as_secs(),
        port: 0,
        rust_log: "debug".to_string(),
    }
}

pub fn test_state() -> AppState {
    state_from(test_config())
}

/// State whose token checks go to `auth_url` (see `spawn_fake_auth`).
pub fn test_state_with_auth(auth_url: &str) -> AppState {
    let mut config = test_config();
    config.supabase_url = auth_url.to_string();
    state_from(config)
}

/// Serves `GET /auth/v1/user` on an ephemeral port, accepting any token as one fixed
/// user. Returns the base URL.
pub async fn spawn_fake_auth() -> String {
    let app = Router::new().route(
        "/auth/v1/user",
        get(|| async {
            Json(json!({
                "id": "00000000-0000-0000-0000-000000000001",
                "email": "user@example.com",
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn state_from(config: Config) -> AppState {

    let db = PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_millis(200))
        .connect_lazy(&config.database_url)
        .unwrap();
    let redis = redis::Client::open(config.redis_url.clone()).unwrap();
    let s3 = aws_sdk_s3::Client::from_conf(
        aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .endpoint_url(CLOSED_PORT_URL)
            .build(),
    );
    let supabase =
        SupabaseClient::new(&config.supabase_url, config.supabase_service_role_key.clone())
            .unwrap();

    AppState {
        db,
        redis,
        s3,
        llm: LlmClient::new().unwrap(),
        stripe: StripeClient::with_base_url(config.stripe_secret_key.clone(), CLOSED_PORT_URL)
            .unwrap(),
        user_directory: Arc::new(supabase.clone()),
        supabase,
        renderer: Arc::new(LatexRenderer::new(config.latex_engine.clone())),
        pdf_cache: Arc::new(PdfCache::new(DEFAULT_TTL)),
        config,
    }
}
