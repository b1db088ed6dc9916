pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod file_ops;
pub mod utils;

#[cfg(feature = "cli")]
pub mod app;

#[cfg(feature = "cli")]
pub use config::cli::Cli;

pub use adapters::{factory::ProviderFactory, openai::OpenAiProvider, ProviderOptions};
pub use config::{ConfigOverrides, ResolvedConfig};
pub use core::assistant::{AssistantSettings, CodeAssistant, GenerateOptions, Workspace};
pub use domain::model::{
    CodeContext, GenerationRequest, GenerationResponse, ProviderCapability, ProviderInfo,
};
pub use domain::ports::LlmProvider;
pub use file_ops::{BackupManager, CodeAnalyzer, FileReader, FileWriter};
pub use utils::error::{AcaError, Result};
