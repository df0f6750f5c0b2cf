use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::billing::stripe::StripeClient;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::pdf::cache::PdfCache;
use crate::pdf::renderer::PdfRenderer;
use crate::supabase::{SupabaseClient, UserDirectory};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Backs the per-user AI rate limiter.
    pub redis: RedisClient,
    /// Archive for rendered PDFs.
    pub s3: S3Client,
    pub llm: LlmClient,
    pub stripe: StripeClient,
    pub supabase: SupabaseClient,
    /// Admin user listing. Default: the Supabase admin API.
    pub user_directory: Arc<dyn UserDirectory>,
    /// Pluggable typesetter. Default: `LatexRenderer` running `config.latex_engine`.
    pub renderer: Arc<dyn PdfRenderer>,
    pub pdf_cache: Arc<PdfCache>,
    pub config: Config,
}
