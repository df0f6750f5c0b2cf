//! Plan gating: decides which model and whose API key serve an AI request.
//!
//! Pro subscribers run catalog models marked `pro_hosted` on server keys. Everyone
//! else (and pro users picking a non-hosted model) must bring their own key.

use serde::Deserialize;

use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::models::{find_model, Provider, DEFAULT_MODEL};
use crate::llm_client::ModelTarget;
use crate::models::subscription::Plan;

/// Client-supplied model choice. Keys live in the browser and ride along per request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub model: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ServerKeys {
    pub anthropic: Option<String>,
    pub openai: Option<String>,
}

impl ServerKeys {
    pub fn from_config(config: &Config) -> Self {
        Self {
            anthropic: config.anthropic_api_key.clone(),
            openai: config.openai_api_key.clone(),
        }
    }

    fn for_provider(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Anthropic => self.anthropic.as_deref(),
            Provider::OpenAi => self.openai.as_deref(),
            _ => None,
        }
    }
}

pub fn resolve_model(
    plan: Plan,
    config: &AiConfig,
    server_keys: &ServerKeys,
) -> Result<ModelTarget, AppError> {
    let model_id = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
    let model = find_model(model_id)
        .ok_or_else(|| AppError::Validation(format!("Unknown model '{model_id}'")))?;

    let user_key = config
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());

    let server_key = (plan == Plan::Pro && model.pro_hosted)
        .then(|| server_keys.for_provider(model.provider))
        .flatten();

    let api_key = match (server_key, user_key) {
        (Some(key), _) => key,
        (None, Some(key)) => key,
        (None, None) if plan == Plan::Free => {
            return Err(AppError::PaymentRequired(format!(
                "Upgrade to Pro or add your own {} API key to use {}",
                model.provider.as_str(),
                model.name
            )))
        }
        (None, None) => {
            return Err(AppError::Validation(format!(
                "{} requires your own {} API key",
                model.name,
                model.provider.as_str()
            )))
        }
    };

    Ok(ModelTarget {
        provider: model.provider,
        model: model.id.to_string(),
        api_key: api_key.to_string(),
    })
}
