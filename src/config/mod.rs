#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::ProviderOptions;
use crate::core::assistant::AssistantSettings;
use crate::domain::model::GenerationRequest;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml_config::{TomlConfig, CONFIG_FILE_NAME};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const DEFAULT_PROVIDER: &str = "openai";

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub config_file: Option<PathBuf>,
}

/// Fully resolved configuration for one invocation.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub assistant: AssistantSettings,
    pub max_tokens: u32,
    pub temperature: f32,
    /// The file that was loaded, if any.
    pub source: Option<PathBuf>,
}

/// Resolves defaults ← config file ← environment ← overrides, reading the
/// process environment.
pub fn resolve(project_root: &Path, overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    resolve_with(project_root, overrides, |name| std::env::var(name).ok())
}

/// Same as [`resolve`] with an explicit environment lookup.
pub fn resolve_with<F>(project_root: &Path, overrides: &ConfigOverrides, env: F) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let (file, source) = load_file(project_root, overrides.config_file.as_deref(), &env)?;
    file.validate()?;

    let env_value = |name: &str| env(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let provider_options = ProviderOptions {
        api_key: env_value(API_KEY_ENV).or_else(|| file.api_key().map(str::to_string)),
        model: overrides.model.clone().or_else(|| file.provider.model.clone()),
        base_url: env_value(BASE_URL_ENV).or_else(|| file.base_url().map(str::to_string)),
        timeout: file
            .provider
            .timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(ProviderOptions::default().timeout),
    };

    let defaults = AssistantSettings::default();
    let assistant = AssistantSettings {
        provider: overrides
            .provider
            .clone()
            .or_else(|| file.provider.name.clone())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
        provider_options,
        max_file_size: file.files.max_file_size.unwrap_or(defaults.max_file_size),
        backup_dir: file.files.backup_dir.clone().map(PathBuf::from).unwrap_or(defaults.backup_dir),
        max_backups: file.files.max_backups.unwrap_or(defaults.max_backups),
        extra_ignore: file.files.ignore.clone(),
    };

    tracing::debug!(
        "Resolved config: provider={}, model={:?}, config_file={:?}",
        assistant.provider,
        assistant.provider_options.model,
        source
    );

    Ok(ResolvedConfig {
        assistant,
        max_tokens: file.generation.max_tokens.unwrap_or(GenerationRequest::DEFAULT_MAX_TOKENS),
        temperature: file.generation.temperature.unwrap_or(GenerationRequest::DEFAULT_TEMPERATURE),
        source,
    })
}

/// An explicit file must exist; the implicit `<root>/aca.toml` is optional.
fn load_file<F>(project_root: &Path, explicit: Option<&Path>, env: &F) -> Result<(TomlConfig, Option<PathBuf>)>
where
    F: Fn(&str) -> Option<String>,
{
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let implicit = project_root.join(CONFIG_FILE_NAME);
            if !implicit.is_file() {
                return Ok((TomlConfig::default(), None));
            }
            implicit
        }
    };

    let config = TomlConfig::from_file_with(&path, env)?;
    tracing::info!("Loaded configuration from {}", path.display());
    Ok((config, Some(path)))
}
