// Adapters layer: concrete implementations for external systems (LLM APIs).

pub mod factory;
pub mod openai;

use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Everything a provider needs to connect; resolved by the config layer.
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}
