use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderCapability {
    CodeGeneration,
    CodeReview,
    CodeRefactoring,
    Documentation,
    Testing,
    Streaming,
    FunctionCalling,
    Vision,
}

impl ProviderCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderCapability::CodeGeneration => "code_generation",
            ProviderCapability::CodeReview => "code_review",
            ProviderCapability::CodeRefactoring => "code_refactoring",
            ProviderCapability::Documentation => "documentation",
            ProviderCapability::Testing => "testing",
            ProviderCapability::Streaming => "streaming",
            ProviderCapability::FunctionCalling => "function_calling",
            ProviderCapability::Vision => "vision",
        }
    }
}

impl fmt::Display for ProviderCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source code handed to the model alongside an instruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeContext {
    pub content: String,
    pub filepath: Option<String>,
    pub language: Option<String>,
    pub line_start: Option<usize>,
    pub line_end: Option<usize>,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub instruction: String,
    pub context: Option<CodeContext>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stop_sequences: Vec<String>,
    pub metadata: HashMap<String, serde_json::Value>,
}

impl GenerationRequest {
    pub const DEFAULT_MAX_TOKENS: u32 = 4096;
    pub const DEFAULT_TEMPERATURE: f32 = 0.2;

    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            context: None,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            temperature: Self::DEFAULT_TEMPERATURE,
            stop_sequences: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_context(mut self, context: Option<CodeContext>) -> Self {
        self.context = context;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub content: String,
    pub tokens_used: u64,
    pub model: String,
    pub finish_reason: String,
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
    pub capabilities: Vec<ProviderCapability>,
    pub health_check: Option<bool>,
}

/// Result of `generate` / `refactor`.
#[derive(Debug, Clone, Serialize)]
pub struct InstructionOutcome {
    pub instruction: String,
    pub target_file: Option<String>,
    pub generated_content: String,
    pub tokens_used: u64,
    pub model: String,
    pub finish_reason: String,
    pub success: bool,
    pub backup_created: bool,
    pub backup_path: Option<String>,
    pub file_modified: bool,
}

/// Result of `review` and `document`: free text about one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub filepath: String,
    pub language: Option<String>,
    pub text: String,
    pub tokens_used: u64,
    pub model: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileAnalysis {
    pub filepath: String,
    pub language: Option<String>,
    pub dependencies: Vec<String>,
    pub line_count: usize,
    pub char_count: usize,
    pub blank_lines: usize,
    pub comment_lines: usize,
    pub functions: Option<usize>,
    pub classes: Option<usize>,
    pub arrow_functions: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisFailure {
    pub file: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectAnalysis {
    pub project_root: String,
    pub files: Vec<FileAnalysis>,
    pub languages: BTreeMap<String, usize>,
    pub dependencies: Vec<String>,
    pub total_files: usize,
    pub total_lines: usize,
    pub errors: Vec<AnalysisFailure>,
}
