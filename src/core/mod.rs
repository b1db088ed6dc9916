pub mod assistant;

pub use crate::domain::model::{FileReport, InstructionOutcome, ProjectAnalysis};
pub use crate::domain::ports::LlmProvider;
pub use crate::utils::error::Result;
pub use assistant::{AssistantSettings, CodeAssistant, GenerateOptions, Workspace};
