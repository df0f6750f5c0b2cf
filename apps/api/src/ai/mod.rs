pub mod actions;
pub mod handlers;
pub mod model_selection;
pub mod prompts;
pub mod rate_limit;

use tracing::info;
use uuid::Uuid;

use crate::ai::model_selection::{resolve_model, AiConfig, ServerKeys};
use crate::ai::rate_limit::check_rate_limit;
use crate::billing::repo::effective_plan;
use crate::errors::AppError;
use crate::llm_client::ModelTarget;
use crate::state::AppState;

/// Gate shared by every AI action: resolve the plan, pick model and key, count the call.
pub async fn prepare_model(
    state: &AppState,
    user_id: Uuid,
    ai_config: &AiConfig,
) -> Result<ModelTarget, AppError> {
    let plan = effective_plan(&state.db, user_id).await?;
    let target = resolve_model(plan, ai_config, &ServerKeys::from_config(&state.config))?;
    check_rate_limit(
        &state.redis,
        user_id,
        plan,
        state.config.ai_rate_limit_per_hour,
    )
    .await?;
    info!(
        "AI call for user {user_id} on {} ({} plan)",
        target.model,
        plan.as_str()
    );
    Ok(target)
}
