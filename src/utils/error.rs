use thiserror::Error;

#[derive(Error, Debug)]
pub enum AcaError {
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse configuration ({field}): {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Unsupported provider: {name}. Available providers: {available}")]
    UnsupportedProvider { name: String, available: String },

    #[error("Failed to initialize LLM provider '{provider}': {message}")]
    ProviderInitError { provider: String, message: String },

    #[error("Unsupported model: {model}. Supported models: {supported}")]
    UnsupportedModel { model: String, supported: String },

    #[error("{provider} API returned {status}: {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider} error: {message}")]
    ProviderError { provider: String, message: String },

    #[error("Estimated request tokens ({estimated}) exceed model limit ({limit})")]
    TokenLimitExceeded { estimated: usize, limit: usize },

    #[error("Provider {provider} does not support {capability}")]
    CapabilityNotSupported {
        provider: String,
        capability: String,
    },

    #[error("Instruction cannot be empty")]
    EmptyInstruction,

    #[error("Validation error ({field}): {message}")]
    ValidationError { field: String, message: String },

    #[error("File operation '{operation}' failed for {path}: {message}")]
    FileOperationError {
        path: String,
        operation: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, AcaError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Provider,
    Network,
    FileSystem,
    Validation,
    Capability,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code for the CLI.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl AcaError {
    pub fn file_op(path: impl Into<String>, operation: &str, message: impl Into<String>) -> Self {
        AcaError::FileOperationError {
            path: path.into(),
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        AcaError::ProviderError {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AcaError::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code, printed next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            AcaError::HttpError(_) => "NETWORK_ERROR",
            AcaError::IoError(_) => "IO_ERROR",
            AcaError::SerializationError(_) => "SERIALIZATION_ERROR",
            AcaError::ConfigError { .. }
            | AcaError::ConfigValidationError { .. }
            | AcaError::InvalidConfigValueError { .. } => "CONFIG_ERROR",
            AcaError::MissingConfigError { .. } => "MISSING_CONFIG",
            AcaError::UnsupportedProvider { .. } | AcaError::ProviderInitError { .. } => {
                "PROVIDER_INIT_ERROR"
            }
            AcaError::UnsupportedModel { .. } => "UNSUPPORTED_MODEL",
            AcaError::ApiError { .. } | AcaError::ProviderError { .. } => "PROVIDER_ERROR",
            AcaError::TokenLimitExceeded { .. } => "TOKEN_LIMIT_EXCEEDED",
            AcaError::CapabilityNotSupported { .. } => "CAPABILITY_NOT_SUPPORTED",
            AcaError::EmptyInstruction => "EMPTY_INSTRUCTION",
            AcaError::ValidationError { .. } => "VALIDATION_ERROR",
            AcaError::FileOperationError { .. } => "FILE_OPERATION_ERROR",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AcaError::HttpError(_) => ErrorCategory::Network,
            AcaError::IoError(_) | AcaError::FileOperationError { .. } => {
                ErrorCategory::FileSystem
            }
            AcaError::SerializationError(_) => ErrorCategory::Internal,
            AcaError::ConfigError { .. }
            | AcaError::MissingConfigError { .. }
            | AcaError::InvalidConfigValueError { .. }
            | AcaError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            AcaError::UnsupportedProvider { .. }
            | AcaError::ProviderInitError { .. }
            | AcaError::UnsupportedModel { .. }
            | AcaError::ApiError { .. }
            | AcaError::ProviderError { .. } => ErrorCategory::Provider,
            AcaError::TokenLimitExceeded { .. }
            | AcaError::EmptyInstruction
            | AcaError::ValidationError { .. } => ErrorCategory::Validation,
            AcaError::CapabilityNotSupported { .. } => ErrorCategory::Capability,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // transient: the same command may succeed when re-run
            AcaError::HttpError(_) => ErrorSeverity::Medium,
            AcaError::ApiError { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Medium
            }
            AcaError::SerializationError(_) => ErrorSeverity::Critical,
            AcaError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            AcaError::HttpError(_) => {
                "Check your network connection and the provider base URL, then retry".to_string()
            }
            AcaError::ApiError { status: 401, .. } => {
                "Verify that OPENAI_API_KEY holds a valid API key".to_string()
            }
            AcaError::ApiError { status: 429, .. } => {
                "Rate limit reached; wait a moment and retry".to_string()
            }
            AcaError::ApiError { status, .. } if *status >= 500 => {
                "The provider is having trouble; retry later".to_string()
            }
            AcaError::ApiError { .. } | AcaError::ProviderError { .. } => {
                "Check the model name and request parameters".to_string()
            }
            AcaError::MissingConfigError { field } => {
                format!("Set {} in the environment, .env file or aca.toml", field)
            }
            AcaError::ConfigError { .. }
            | AcaError::InvalidConfigValueError { .. }
            | AcaError::ConfigValidationError { .. } => {
                "Review aca.toml and command-line options".to_string()
            }
            AcaError::UnsupportedProvider { available, .. } => {
                format!("Use one of: {}", available)
            }
            AcaError::ProviderInitError { .. } => {
                "Check the provider configuration and API key".to_string()
            }
            AcaError::UnsupportedModel { supported, .. } => {
                format!("Pick a supported model with --model ({})", supported)
            }
            AcaError::TokenLimitExceeded { .. } => {
                "Lower --max-tokens or work on a smaller file".to_string()
            }
            AcaError::CapabilityNotSupported { .. } => {
                "Switch to a model that supports this operation".to_string()
            }
            AcaError::EmptyInstruction => "Provide a non-empty instruction".to_string(),
            AcaError::ValidationError { .. } => "Adjust the rejected parameter".to_string(),
            AcaError::FileOperationError { .. } | AcaError::IoError(_) => {
                "Check that the path exists, is readable and is not ignored".to_string()
            }
            AcaError::SerializationError(_) => {
                "The provider returned an unexpected payload; retry or report it".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        format!("[{}] {}", self.code(), self)
    }
}
