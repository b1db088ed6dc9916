use crate::utils::error::{AcaError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "aca.toml";

/// `aca.toml`. Every section and key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub provider: ProviderSection,
    pub files: FilesSection,
    pub generation: GenerationSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub name: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesSection {
    pub max_file_size: Option<u64>,
    pub backup_dir: Option<String>,
    pub max_backups: Option<usize>,
    pub ignore: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSection {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl TomlConfig {
    /// Reads and parses `path`, resolving `${VAR}` placeholders through `lookup`.
    pub fn from_file_with<P, F>(path: P, lookup: F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| AcaError::ConfigError {
            message: format!("Cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str_with(&content, lookup)
    }

    /// Parses with `${VAR}` placeholders resolved through `lookup`.
    pub fn from_toml_str_with<F>(content: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let processed = Self::substitute_env_vars(content, lookup)?;

        toml::from_str(&processed).map_err(|e| AcaError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value. Unknown variables are left as-is.
    fn substitute_env_vars<F>(content: &str, lookup: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AcaError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    /// The API key, unless it is missing, blank or an unresolved placeholder.
    pub fn api_key(&self) -> Option<&str> {
        self.provider
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && !is_placeholder(k))
    }

    pub fn base_url(&self) -> Option<&str> {
        self.provider
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty() && !is_placeholder(u))
    }

    pub fn validate_config(&self) -> Result<()> {
        if let Some(name) = &self.provider.name {
            validation::validate_non_empty_string("provider.name", name)?;
        }
        if let Some(model) = &self.provider.model {
            validation::validate_non_empty_string("provider.model", model)?;
        }
        if let Some(base_url) = self.base_url() {
            validation::validate_url("provider.base_url", base_url)?;
        }
        if let Some(timeout) = self.provider.timeout_seconds {
            validation::validate_positive_number("provider.timeout_seconds", timeout as usize, 1)?;
        }

        if let Some(size) = self.files.max_file_size {
            validation::validate_positive_number("files.max_file_size", size as usize, 1)?;
        }
        if let Some(dir) = &self.files.backup_dir {
            validation::validate_path("files.backup_dir", dir)?;
        }
        if let Some(max_backups) = self.files.max_backups {
            validation::validate_positive_number("files.max_backups", max_backups, 1)?;
        }

        if let Some(max_tokens) = self.generation.max_tokens {
            validation::validate_positive_number("generation.max_tokens", max_tokens as usize, 1)?;
        }
        if let Some(temperature) = self.generation.temperature {
            validation::validate_range("generation.temperature", temperature, 0.0, 2.0)?;
        }

        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

fn is_placeholder(value: &str) -> bool {
    value.starts_with("${") && value.ends_with('}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[provider]
name = "openai"
model = "gpt-4"
base_url = "http://localhost:8080/v1"
timeout_seconds = 30

[files]
max_file_size = 2048
backup_dir = "var/backups"
max_backups = 3
ignore = ["target/*", "*.min.js"]

[generation]
max_tokens = 1000
temperature = 0.5
"#;

        let config = TomlConfig::from_toml_str_with(toml_content, no_env).unwrap();

        assert_eq!(config.provider.model.as_deref(), Some("gpt-4"));
        assert_eq!(config.provider.timeout_seconds, Some(30));
        assert_eq!(config.files.max_backups, Some(3));
        assert_eq!(config.files.ignore, vec!["target/*", "*.min.js"]);
        assert_eq!(config.generation.max_tokens, Some(1000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_is_valid() {
        let config = TomlConfig::from_toml_str_with("", no_env).unwrap();
        assert!(config.provider.name.is_none());
        assert!(config.files.ignore.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        let toml_content = "[provider]\napi_key = \"${ACA_TEST_KEY}\"\n";

        let config = TomlConfig::from_toml_str_with(toml_content, |name| {
            (name == "ACA_TEST_KEY").then(|| "sk-from-env".to_string())
        })
        .unwrap();
        assert_eq!(config.api_key(), Some("sk-from-env"));

        let unresolved = TomlConfig::from_toml_str_with(toml_content, no_env).unwrap();
        assert_eq!(unresolved.provider.api_key.as_deref(), Some("${ACA_TEST_KEY}"));
        assert_eq!(unresolved.api_key(), None);
    }

    #[test]
    fn test_config_validation() {
        let bad_url = TomlConfig::from_toml_str_with("[provider]\nbase_url = \"ftp://x\"\n", no_env).unwrap();
        assert!(bad_url.validate().is_err());

        let bad_temperature = TomlConfig::from_toml_str_with("[generation]\ntemperature = 3.0\n", no_env).unwrap();
        assert!(bad_temperature.validate().is_err());

        let zero_backups = TomlConfig::from_toml_str_with("[files]\nmax_backups = 0\n", no_env).unwrap();
        assert!(zero_backups.validate().is_err());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = TomlConfig::from_toml_str_with("[provider\nname = 1", no_env).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[provider]\nmodel = \"gpt-3.5-turbo\"\n")
            .unwrap();

        let config = TomlConfig::from_file_with(temp_file.path(), no_env).unwrap();
        assert_eq!(config.provider.model.as_deref(), Some("gpt-3.5-turbo"));

        let err = TomlConfig::from_file_with("/no/such/aca.toml", no_env).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
