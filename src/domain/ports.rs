use crate::domain::model::{GenerationRequest, GenerationResponse, ProviderCapability, ProviderInfo};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// A remote model that turns instructions (plus optional code) into text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Display name, e.g. `OpenAIProvider`.
    fn name(&self) -> &str;

    fn model_name(&self) -> &str;

    fn capabilities(&self) -> &BTreeSet<ProviderCapability>;

    fn supports_capability(&self, capability: ProviderCapability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Rejects requests the provider would refuse anyway (bad ranges, too many tokens).
    fn validate_request(&self, request: &GenerationRequest) -> Result<()>;

    fn estimate_tokens(&self, text: &str) -> usize;

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse>;

    /// `false` on any failure; never errors.
    async fn check_health(&self) -> bool;

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: self.name().to_string(),
            model: self.model_name().to_string(),
            capabilities: self.capabilities().iter().copied().collect(),
            health_check: None,
        }
    }
}
