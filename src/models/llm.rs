use serde::{Deserialize, Serialize};

use crate::llm::provider::Sampling;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    OpenaiCompatible,
}

/// Model backend settings; every field except the key has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Replaces the built-in advisor persona when set.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl ModelSettings {
    pub fn sampling(&self) -> Sampling {
        Sampling {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model_id: default_model_id(),
            api_key: String::new(),
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            system_prompt: None,
        }
    }
}

fn default_provider() -> ProviderKind {
    ProviderKind::OpenaiCompatible
}

fn default_model_id() -> String {
    "gpt-4-1106-preview".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1500
}

fn default_timeout_secs() -> u64 {
    60
}
