mod admin;
mod ai;
mod auth;
mod billing;
mod config;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod pdf;
mod profiles;
mod resumes;
mod routes;
mod state;
mod supabase;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::billing::stripe::StripeClient;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::models::DEFAULT_MODEL;
use crate::llm_client::LlmClient;
use crate::pdf::cache::{spawn_sweeper, PdfCache, SWEEP_INTERVAL};
use crate::pdf::renderer::LatexRenderer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::supabase::SupabaseClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ResumeForge API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis (AI rate limiter)
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize S3 / MinIO (PDF archive)
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Initialize outbound HTTP clients
    let llm = LlmClient::new()?;
    info!(
        "LLM client initialized (default model: {DEFAULT_MODEL}, server keys: anthropic={}, openai={})",
        config.anthropic_api_key.is_some(),
        config.openai_api_key.is_some()
    );
    let stripe = StripeClient::new(config.stripe_secret_key.clone())?;
    let supabase = SupabaseClient::new(
        &config.supabase_url,
        config.supabase_service_role_key.clone(),
    )?;
    info!("Stripe and Supabase clients initialized");

    // PDF rendering: external engine plus content-addressed cache
    let renderer = Arc::new(LatexRenderer::new(config.latex_engine.clone()));
    let pdf_cache = Arc::new(PdfCache::new(Duration::from_secs(config.pdf_cache_ttl_secs)));
    spawn_sweeper(pdf_cache.clone(), SWEEP_INTERVAL);
    info!(
        "PDF renderer: {} (cache TTL {}s)",
        config.latex_engine, config.pdf_cache_ttl_secs
    );

    // Build app state
    let state = AppState {
        db,
        redis,
        s3,
        llm,
        stripe,
        user_directory: Arc::new(supabase.clone()),
        supabase,
        renderer,
        pdf_cache,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to APP_URL once the web app is deployed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "resumeforge-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
