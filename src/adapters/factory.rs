use crate::adapters::openai::OpenAiProvider;
use crate::adapters::ProviderOptions;
use crate::domain::ports::LlmProvider;
use crate::utils::error::{AcaError, Result};
use std::collections::HashMap;

pub type ProviderConstructor =
    Box<dyn Fn(ProviderOptions) -> Result<Box<dyn LlmProvider>> + Send + Sync>;

/// Name → constructor registry. Names are matched case-insensitively.
pub struct ProviderFactory {
    providers: HashMap<String, ProviderConstructor>,
}

impl ProviderFactory {
    /// Registry holding the built-in providers.
    pub fn new() -> Self {
        let mut factory = Self {
            providers: HashMap::new(),
        };
        factory.register("openai", |options| {
            Ok(Box::new(OpenAiProvider::new(options)?) as Box<dyn LlmProvider>)
        });
        factory
    }

    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(ProviderOptions) -> Result<Box<dyn LlmProvider>> + Send + Sync + 'static,
    {
        self.providers.insert(name.to_lowercase(), Box::new(constructor));
    }

    pub fn available_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.providers.contains_key(&name.to_lowercase())
    }

    pub fn create(&self, name: &str, options: ProviderOptions) -> Result<Box<dyn LlmProvider>> {
        let constructor =
            self.providers
                .get(&name.to_lowercase())
                .ok_or_else(|| AcaError::UnsupportedProvider {
                    name: name.to_string(),
                    available: self.available_providers().join(", "),
                })?;

        tracing::debug!("Creating provider '{}'", name);
        constructor(options).map_err(|e| match e {
            // already actionable on their own
            AcaError::MissingConfigError { .. } | AcaError::UnsupportedModel { .. } => e,
            other => AcaError::ProviderInitError {
                provider: name.to_string(),
                message: other.to_string(),
            },
        })
    }
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}
