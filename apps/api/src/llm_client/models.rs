//! Model catalog: which model ids exist, which provider serves them, and which are
//! available on server keys to pro subscribers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenAi,
    Groq,
    DeepSeek,
    Google,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::OpenAi => "openai",
            Provider::Groq => "groq",
            Provider::DeepSeek => "deepseek",
            Provider::Google => "google",
        }
    }

    /// OpenAI-compatible base URL. Unused for Anthropic.
    pub fn base_url(&self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com/v1",
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Groq => "https://api.groq.com/openai/v1",
            Provider::DeepSeek => "https://api.deepseek.com/v1",
            Provider::Google => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub provider: Provider,
    /// Served on server keys for pro subscribers.
    pub pro_hosted: bool,
}

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "claude-sonnet-4-5",
        name: "Claude Sonnet 4.5",
        provider: Provider::Anthropic,
        pro_hosted: true,
    },
    ModelInfo {
        id: "claude-haiku-4-5",
        name: "Claude Haiku 4.5",
        provider: Provider::Anthropic,
        pro_hosted: true,
    },
    ModelInfo {
        id: "gpt-4.1",
        name: "GPT-4.1",
        provider: Provider::OpenAi,
        pro_hosted: true,
    },
    ModelInfo {
        id: "gpt-4.1-mini",
        name: "GPT-4.1 Mini",
        provider: Provider::OpenAi,
        pro_hosted: true,
    },
    ModelInfo {
        id: "llama-3.3-70b-versatile",
        name: "Llama 3.3 70B (Groq)",
        provider: Provider::Groq,
        pro_hosted: false,
    },
    ModelInfo {
        id: "deepseek-chat",
        name: "DeepSeek V3",
        provider: Provider::DeepSeek,
        pro_hosted: false,
    },
    ModelInfo {
        id: "gemini-2.5-flash",
        name: "Gemini 2.5 Flash",
        provider: Provider::Google,
        pro_hosted: false,
    },
];

pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_is_in_catalog() {
        let model = find_model(DEFAULT_MODEL).unwrap();
        assert_eq!(model.provider, Provider::Anthropic);
        assert!(model.pro_hosted);
    }

    #[test]
    fn test_unknown_model() {
        assert!(find_model("gpt-2").is_none());
    }

    #[test]
    fn test_provider_serde_lowercase() {
        let p: Provider = serde_json::from_str(r#""deepseek""#).unwrap();
        assert_eq!(p, Provider::DeepSeek);
        assert_eq!(serde_json::to_string(&Provider::OpenAi).unwrap(), r#""openai""#);
    }
}
