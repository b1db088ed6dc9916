use crate::adapters::factory::ProviderFactory;
use crate::adapters::ProviderOptions;
use crate::domain::model::{
    AnalysisFailure, CodeContext, FileReport, GenerationRequest, InstructionOutcome,
    ProjectAnalysis, ProviderCapability, ProviderInfo,
};
use crate::domain::ports::LlmProvider;
use crate::file_ops::backup::{DEFAULT_BACKUP_DIR, DEFAULT_MAX_BACKUPS};
use crate::file_ops::reader::DEFAULT_MAX_FILE_SIZE;
use crate::file_ops::{BackupManager, CodeAnalyzer, FileReader, FileWriter};
use crate::utils::error::{AcaError, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    "__pycache__/*",
    "*.pyc",
    "*.pyo",
    "*.pyd",
    ".git/*",
    ".svn/*",
    ".hg/*",
    "node_modules/*",
    "*.log",
    "*.tmp",
    "*.temp",
    ".DS_Store",
    "Thumbs.db",
];

const REVIEW_INSTRUCTION: &str = "Review this code for potential issues, improvements, and best practices. \
Provide specific, actionable feedback focusing on:\n\
1. Code quality and maintainability\n\
2. Performance considerations\n\
3. Security vulnerabilities\n\
4. Error handling\n\
5. Code style and conventions\n\
Format your response as a structured review.";

const REFACTOR_PREFIX: &str = "Refactor the following code according to these instructions: ";

pub const REVIEW_MAX_TOKENS: u32 = 2048;
pub const REVIEW_TEMPERATURE: f32 = 0.1;
pub const REFACTOR_TEMPERATURE: f32 = 0.1;
pub const DOCUMENTATION_MAX_TOKENS: u32 = 3072;
pub const DOCUMENTATION_TEMPERATURE: f32 = 0.2;

/// Everything needed to build a [`CodeAssistant`], resolved by the config layer.
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub provider: String,
    pub provider_options: ProviderOptions,
    pub max_file_size: u64,
    /// Relative paths are taken from the project root.
    pub backup_dir: PathBuf,
    pub max_backups: usize,
    pub extra_ignore: Vec<String>,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            provider_options: ProviderOptions::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
            max_backups: DEFAULT_MAX_BACKUPS,
            extra_ignore: Vec::new(),
        }
    }
}

/// Knobs for [`CodeAssistant::process_instruction`].
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub target_file: Option<PathBuf>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub create_backup: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            target_file: None,
            max_tokens: GenerationRequest::DEFAULT_MAX_TOKENS,
            temperature: GenerationRequest::DEFAULT_TEMPERATURE,
            create_backup: true,
        }
    }
}

/// The project directory with its file helpers; usable without a provider.
pub struct Workspace {
    project_root: PathBuf,
    reader: FileReader,
    writer: FileWriter,
    analyzer: CodeAnalyzer,
    backups: BackupManager,
}

impl Workspace {
    /// Resolves the root and installs ignore patterns: built-in defaults, the
    /// backup directory, `.gitignore` lines and `settings.extra_ignore`.
    pub fn open(project_root: &Path, settings: &AssistantSettings) -> Result<Self> {
        let root = fs::canonicalize(project_root).map_err(|e| {
            AcaError::file_op(project_root.display().to_string(), "resolve_root", e.to_string())
        })?;
        if !root.is_dir() {
            return Err(AcaError::file_op(
                root.display().to_string(),
                "resolve_root",
                "Project root is not a directory",
            ));
        }

        let backup_dir = if settings.backup_dir.is_absolute() {
            settings.backup_dir.clone()
        } else {
            root.join(&settings.backup_dir)
        };

        let patterns = ignore_patterns(&root, &backup_dir, &settings.extra_ignore);
        let mut reader = FileReader::with_max_file_size(settings.max_file_size);
        reader.set_ignore_patterns(Some(&root), &patterns);
        tracing::debug!("Loaded {} ignore patterns for {}", patterns.len(), root.display());

        Ok(Self {
            backups: BackupManager::new(backup_dir, root.clone(), settings.max_backups),
            project_root: root,
            reader,
            writer: FileWriter::new(),
            analyzer: CodeAnalyzer::new(),
        })
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn reader(&self) -> &FileReader {
        &self.reader
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Relative paths are taken from the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// Relative to the project root when possible, absolute otherwise.
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.project_root)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    fn build_context(&self, path: &Path) -> Result<CodeContext> {
        let content = self.reader.read_file(path)?;
        let language = self.analyzer.detect_language(path, Some(&content))?;
        let dependencies = self.analyzer.extract_dependencies(path, Some(&content))?;

        Ok(CodeContext {
            content,
            filepath: Some(self.display_path(path)),
            language: language.map(str::to_string),
            dependencies,
            ..CodeContext::default()
        })
    }

    /// Statistics over the project (or over files matching `include`, relative to the root).
    /// Per-file failures are collected rather than aborting the scan.
    pub fn analyze_project(&self, include: &[String]) -> Result<ProjectAnalysis> {
        let mut analysis = ProjectAnalysis {
            project_root: self.project_root.display().to_string(),
            ..ProjectAnalysis::default()
        };
        let mut dependencies = BTreeSet::new();

        let candidates = if include.is_empty() {
            self.walk_project(&mut analysis.errors)
        } else {
            self.glob_project(include, &mut analysis.errors)?
        };

        for path in candidates {
            if self.reader.should_ignore_file(&path) || !self.reader.is_text_file(&path) {
                continue;
            }

            match self.analyzer.analyze_file_structure(&path, None) {
                Ok(mut file) => {
                    file.filepath = self.display_path(&path);
                    if let Some(language) = &file.language {
                        *analysis.languages.entry(language.clone()).or_insert(0) += 1;
                    }
                    dependencies.extend(file.dependencies.iter().cloned());
                    analysis.total_files += 1;
                    analysis.total_lines += file.line_count;
                    analysis.files.push(file);
                }
                Err(e) => analysis.errors.push(AnalysisFailure {
                    file: self.display_path(&path),
                    error: e.to_string(),
                }),
            }
        }

        analysis.dependencies = dependencies.into_iter().collect();
        tracing::info!(
            "Analyzed {} files ({} lines, {} errors)",
            analysis.total_files,
            analysis.total_lines,
            analysis.errors.len()
        );
        Ok(analysis)
    }

    fn walk_project(&self, errors: &mut Vec<AnalysisFailure>) -> Vec<PathBuf> {
        let reader = &self.reader;
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.project_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && reader.should_ignore_dir(e.path())));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => errors.push(AnalysisFailure {
                    file: e
                        .path()
                        .map(|p| self.display_path(p))
                        .unwrap_or_else(|| self.project_root.display().to_string()),
                    error: e.to_string(),
                }),
            }
        }
        files
    }

    fn glob_project(&self, include: &[String], errors: &mut Vec<AnalysisFailure>) -> Result<Vec<PathBuf>> {
        let root = glob::Pattern::escape(&self.project_root.to_string_lossy());
        let mut files = BTreeSet::new();

        for pattern in include {
            let full = format!("{}/{}", root.trim_end_matches('/'), pattern.trim_start_matches('/'));
            let paths = glob::glob(&full)
                .map_err(|e| AcaError::validation("include", format!("Invalid pattern '{}': {}", pattern, e)))?;

            for entry in paths {
                match entry {
                    Ok(path) if path.is_file() => {
                        files.insert(path);
                    }
                    Ok(_) => {}
                    Err(e) => errors.push(AnalysisFailure {
                        file: self.display_path(e.path()),
                        error: e.error().to_string(),
                    }),
                }
            }
        }
        Ok(files.into_iter().collect())
    }
}

/// A [`Workspace`] driven by an LLM provider.
pub struct CodeAssistant {
    workspace: Workspace,
    provider: Box<dyn LlmProvider>,
}

impl CodeAssistant {
    pub fn new(settings: &AssistantSettings, project_root: &Path) -> Result<Self> {
        let provider = ProviderFactory::new().create(&settings.provider, settings.provider_options.clone())?;
        Self::with_provider(provider, project_root, settings)
    }

    /// Uses an already constructed provider; `settings.provider*` are ignored.
    pub fn with_provider(
        provider: Box<dyn LlmProvider>,
        project_root: &Path,
        settings: &AssistantSettings,
    ) -> Result<Self> {
        let workspace = Workspace::open(project_root, settings)?;

        tracing::info!(
            "🤖 Assistant ready: {} ({}) in {}",
            provider.name(),
            provider.model_name(),
            workspace.project_root().display()
        );

        Ok(Self { workspace, provider })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    pub fn analyze_project(&self, include: &[String]) -> Result<ProjectAnalysis> {
        self.workspace.analyze_project(include)
    }

    /// Generates code for `instruction`. With a target file, its current content
    /// (when it exists) is sent as context and the reply replaces the file.
    pub async fn process_instruction(
        &self,
        instruction: &str,
        options: &GenerateOptions,
    ) -> Result<InstructionOutcome> {
        if instruction.trim().is_empty() {
            return Err(AcaError::EmptyInstruction);
        }

        let target = options.target_file.as_deref().map(|p| self.workspace.resolve_path(p));
        let context = match &target {
            Some(path) if path.exists() => Some(self.workspace.build_context(path)?),
            _ => None,
        };

        let request = GenerationRequest::new(instruction)
            .with_context(context)
            .with_max_tokens(options.max_tokens)
            .with_temperature(options.temperature);

        self.provider.validate_request(&request)?;
        self.require(ProviderCapability::CodeGeneration)?;

        tracing::info!("Sending instruction to {} ({})", self.provider.name(), self.provider.model_name());
        let response = self.provider.generate(&request).await?;
        tracing::info!("✅ Generated {} chars using {} tokens", response.content.len(), response.tokens_used);

        let mut outcome = InstructionOutcome {
            instruction: instruction.to_string(),
            target_file: options.target_file.as_ref().map(|p| p.display().to_string()),
            generated_content: response.content,
            tokens_used: response.tokens_used,
            model: response.model,
            finish_reason: response.finish_reason,
            success: true,
            backup_created: false,
            backup_path: None,
            file_modified: false,
        };

        if let Some(path) = target {
            if options.create_backup && path.exists() {
                let backup = self.workspace.backups.create_backup(&path)?;
                outcome.backup_created = true;
                outcome.backup_path = Some(backup.display().to_string());
            }

            self.workspace.writer.write_file(&path, &strip_code_fence(&outcome.generated_content))?;
            outcome.file_modified = true;
            tracing::info!("💾 Wrote {}", path.display());
        }

        Ok(outcome)
    }

    pub async fn review_code(&self, path: &Path) -> Result<FileReport> {
        self.require(ProviderCapability::CodeReview)?;

        let context = self.workspace.build_context(&self.workspace.resolve_path(path))?;
        self.report(path, context, REVIEW_INSTRUCTION.to_string(), REVIEW_MAX_TOKENS, REVIEW_TEMPERATURE)
            .await
    }

    pub async fn refactor_code(&self, path: &Path, instruction: &str, create_backup: bool) -> Result<InstructionOutcome> {
        self.require(ProviderCapability::CodeRefactoring)?;

        let resolved = self.workspace.resolve_path(path);
        if !resolved.is_file() {
            return Err(AcaError::file_op(
                resolved.display().to_string(),
                "refactor",
                format!("File does not exist: {}", resolved.display()),
            ));
        }

        let options = GenerateOptions {
            target_file: Some(path.to_path_buf()),
            temperature: REFACTOR_TEMPERATURE,
            create_backup,
            ..GenerateOptions::default()
        };
        self.process_instruction(&format!("{}{}", REFACTOR_PREFIX, instruction), &options)
            .await
    }

    pub async fn generate_documentation(&self, path: &Path) -> Result<FileReport> {
        self.require(ProviderCapability::Documentation)?;

        let context = self.workspace.build_context(&self.workspace.resolve_path(path))?;
        let language = context.language.clone().unwrap_or_else(|| "code".to_string());
        let instruction = format!(
            "Generate comprehensive documentation for this {} code. Include:\n\
             1. Module/file overview\n\
             2. Function and class documentation\n\
             3. Parameter descriptions\n\
             4. Return value descriptions\n\
             5. Usage examples where appropriate\n\
             Follow the standard documentation conventions for the language.",
            language
        );

        let mut report = self
            .report(path, context, instruction, DOCUMENTATION_MAX_TOKENS, DOCUMENTATION_TEMPERATURE)
            .await?;
        report.language = Some(language);
        Ok(report)
    }

    /// Static provider info plus a live health check.
    pub async fn provider_info(&self) -> ProviderInfo {
        let mut info = self.provider.provider_info();
        info.health_check = Some(self.provider.check_health().await);
        info
    }

    async fn report(
        &self,
        path: &Path,
        context: CodeContext,
        instruction: String,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<FileReport> {
        let language = context.language.clone();
        let request = GenerationRequest::new(instruction)
            .with_context(Some(context))
            .with_max_tokens(max_tokens)
            .with_temperature(temperature);

        self.provider.validate_request(&request)?;
        let response = self.provider.generate(&request).await?;

        Ok(FileReport {
            filepath: path.display().to_string(),
            language,
            text: response.content,
            tokens_used: response.tokens_used,
            model: response.model,
        })
    }

    fn require(&self, capability: ProviderCapability) -> Result<()> {
        if self.provider.supports_capability(capability) {
            Ok(())
        } else {
            Err(AcaError::CapabilityNotSupported {
                provider: self.provider.name().to_string(),
                capability: capability.to_string(),
            })
        }
    }
}

fn ignore_patterns(root: &Path, backup_dir: &Path, extra: &[String]) -> Vec<String> {
    let mut patterns: Vec<String> = DEFAULT_IGNORE_PATTERNS.iter().map(|p| p.to_string()).collect();

    if let Ok(relative) = backup_dir.strip_prefix(root) {
        if !relative.as_os_str().is_empty() {
            patterns.push(format!("/{}/", relative.to_string_lossy()));
        }
    }

    let gitignore = root.join(".gitignore");
    if let Ok(content) = fs::read_to_string(&gitignore) {
        patterns.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_string),
        );
    }

    patterns.extend(extra.iter().cloned());
    patterns
}

/// Unwraps a reply that consists of exactly one fenced code block.
pub fn strip_code_fence(content: &str) -> String {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") || !trimmed.ends_with("```") || trimmed.matches("```").count() != 2 {
        return content.to_string();
    }

    let Some((_, body)) = trimmed.split_once('\n') else {
        return content.to_string();
    };
    let body = body.trim_end_matches("```").trim_end_matches(['\n', '\r']);
    format!("{}\n", body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::GenerationResponse;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct ScriptedProvider {
        reply: String,
        capabilities: BTreeSet<ProviderCapability>,
        requests: Arc<Mutex<Vec<GenerationRequest>>>,
    }

    impl ScriptedProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                capabilities: [
                    ProviderCapability::CodeGeneration,
                    ProviderCapability::CodeReview,
                    ProviderCapability::CodeRefactoring,
                    ProviderCapability::Documentation,
                ]
                .into_iter()
                .collect(),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn requests(&self) -> Arc<Mutex<Vec<GenerationRequest>>> {
            Arc::clone(&self.requests)
        }

        fn without(mut self, capability: ProviderCapability) -> Self {
            self.capabilities.remove(&capability);
            self
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "ScriptedProvider"
        }

        fn model_name(&self) -> &str {
            "scripted-1"
        }

        fn capabilities(&self) -> &BTreeSet<ProviderCapability> {
            &self.capabilities
        }

        fn validate_request(&self, _request: &GenerationRequest) -> Result<()> {
            Ok(())
        }

        fn estimate_tokens(&self, text: &str) -> usize {
            (text.len() / 4).max(1)
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(GenerationResponse {
                content: self.reply.clone(),
                tokens_used: 42,
                model: "scripted-1".to_string(),
                finish_reason: "stop".to_string(),
                metadata: HashMap::new(),
            })
        }

        async fn check_health(&self) -> bool {
            true
        }
    }

    fn assistant(dir: &TempDir, provider: ScriptedProvider) -> CodeAssistant {
        CodeAssistant::with_provider(Box::new(provider), dir.path(), &AssistantSettings::default()).unwrap()
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```python\nprint(1)\n```"), "print(1)\n");
        assert_eq!(strip_code_fence("  ```\nx = 1\n```\n"), "x = 1\n");
        assert_eq!(strip_code_fence("plain text"), "plain text");

        let two_blocks = "```\na\n```\ntext\n```\nb\n```";
        assert_eq!(strip_code_fence(two_blocks), two_blocks);
    }

    #[test]
    fn test_ignore_patterns_include_gitignore_and_backup_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "# build output\ntarget/\n\n*.swp\n").unwrap();

        let patterns = ignore_patterns(dir.path(), &dir.path().join(".backups"), &["dist/*".to_string()]);
        assert!(patterns.contains(&"/.backups/".to_string()));
        assert!(patterns.contains(&"target/".to_string()));
        assert!(patterns.contains(&"*.swp".to_string()));
        assert_eq!(patterns.last().map(String::as_str), Some("dist/*"));
        assert!(!patterns.iter().any(|p| p.starts_with('#')));
    }

    #[tokio::test]
    async fn test_empty_instruction_is_rejected() {
        let dir = TempDir::new().unwrap();
        let assistant = assistant(&dir, ScriptedProvider::new("x"));

        let err = assistant
            .process_instruction("   ", &GenerateOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "EMPTY_INSTRUCTION");
    }

    #[tokio::test]
    async fn test_generate_creates_missing_target_without_backup() {
        let dir = TempDir::new().unwrap();
        let assistant = assistant(&dir, ScriptedProvider::new("```python\ndef add(a, b):\n    return a + b\n```"));

        let options = GenerateOptions {
            target_file: Some(PathBuf::from("pkg/math.py")),
            ..GenerateOptions::default()
        };
        let outcome = assistant.process_instruction("write add", &options).await.unwrap();

        assert!(outcome.file_modified);
        assert!(!outcome.backup_created);
        assert_eq!(outcome.tokens_used, 42);
        assert_eq!(
            fs::read_to_string(dir.path().join("pkg/math.py")).unwrap(),
            "def add(a, b):\n    return a + b\n"
        );
    }

    #[tokio::test]
    async fn test_generate_with_existing_target_sends_context_and_backs_up() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.py"), "import os\nprint('old')\n").unwrap();
        let provider = ScriptedProvider::new("print('new')\n");
        let requests = provider.requests();
        let assistant = assistant(&dir, provider);

        let options = GenerateOptions {
            target_file: Some(PathBuf::from("app.py")),
            ..GenerateOptions::default()
        };
        let outcome = assistant.process_instruction("modernize", &options).await.unwrap();

        assert!(outcome.backup_created);
        let backup = PathBuf::from(outcome.backup_path.unwrap());
        assert_eq!(fs::read_to_string(&backup).unwrap(), "import os\nprint('old')\n");
        assert_eq!(fs::read_to_string(dir.path().join("app.py")).unwrap(), "print('new')\n");

        let sent = requests.lock().unwrap();
        let context = sent[0].context.as_ref().unwrap();
        assert_eq!(context.content, "import os\nprint('old')\n");
        assert_eq!(context.filepath.as_deref(), Some("app.py"));
        assert_eq!(context.language.as_deref(), Some("python"));
        assert_eq!(sent[0].instruction, "modernize");
    }

    #[tokio::test]
    async fn test_context_is_relative_with_language_and_dependencies() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "use serde::Serialize;\nfn main() {}\n").unwrap();
        let assistant = assistant(&dir, ScriptedProvider::new("review text"));

        let context = assistant.workspace().build_context(&assistant.workspace().resolve_path(Path::new("src/main.rs"))).unwrap();
        assert_eq!(context.filepath.as_deref(), Some(Path::new("src").join("main.rs").to_str().unwrap()));
        assert_eq!(context.language.as_deref(), Some("rust"));
        assert_eq!(context.dependencies, vec!["serde::Serialize".to_string()]);
    }

    #[tokio::test]
    async fn test_review_uses_low_temperature() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        let provider = ScriptedProvider::new("looks fine");
        let requests = provider.requests();
        let assistant = assistant(&dir, provider);

        let report = assistant.review_code(Path::new("a.py")).await.unwrap();
        assert_eq!(report.text, "looks fine");
        assert_eq!(report.language.as_deref(), Some("python"));

        let sent = requests.lock().unwrap();
        assert_eq!(sent[0].temperature, REVIEW_TEMPERATURE);
        assert_eq!(sent[0].max_tokens, REVIEW_MAX_TOKENS);
        assert_eq!(sent[0].context.as_ref().map(|c| c.content.as_str()), Some("x = 1\n"));
    }

    #[tokio::test]
    async fn test_refactor_requires_capability() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        let assistant = assistant(
            &dir,
            ScriptedProvider::new("y = 1").without(ProviderCapability::CodeRefactoring),
        );

        let err = assistant
            .refactor_code(Path::new("a.py"), "rename x", true)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CAPABILITY_NOT_SUPPORTED");
        assert_eq!(fs::read_to_string(dir.path().join("a.py")).unwrap(), "x = 1\n");
    }

    #[tokio::test]
    async fn test_refactor_missing_file() {
        let dir = TempDir::new().unwrap();
        let assistant = assistant(&dir, ScriptedProvider::new("y"));

        let err = assistant
            .refactor_code(Path::new("ghost.py"), "anything", false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "FILE_OPERATION_ERROR");
        assert!(!dir.path().join("ghost.py").exists());
    }

    #[tokio::test]
    async fn test_documentation_language_falls_back_to_code() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "just words\n").unwrap();
        let assistant = assistant(&dir, ScriptedProvider::new("docs"));

        let report = assistant.generate_documentation(Path::new("notes.txt")).await.unwrap();
        assert_eq!(report.language.as_deref(), Some("code"));
        assert_eq!(report.text, "docs");
    }

    #[test]
    fn test_analyze_project_skips_ignored_and_binary() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/lib")).unwrap();
        fs::create_dir_all(root.join(".backups")).unwrap();
        fs::write(root.join("src/app.py"), "import requests\n\ndef run():\n    pass\n").unwrap();
        fs::write(root.join("src/index.js"), "import React from 'react';\n").unwrap();
        fs::write(root.join("node_modules/lib/x.js"), "import y from 'y';\n").unwrap();
        fs::write(root.join(".backups/app_20240101_000000000.py.bak"), "old").unwrap();
        fs::write(root.join("logo.png"), [0u8, 1, 2]).unwrap();
        fs::write(root.join("debug.log"), "noise").unwrap();

        let assistant = assistant(&dir, ScriptedProvider::new(""));
        let analysis = assistant.analyze_project(&[]).unwrap();

        assert_eq!(analysis.total_files, 2);
        assert_eq!(analysis.total_lines, 5);
        assert_eq!(analysis.languages.get("python"), Some(&1));
        assert_eq!(analysis.languages.get("javascript"), Some(&1));
        assert_eq!(analysis.dependencies, vec!["react".to_string(), "requests".to_string()]);
        assert!(analysis.errors.is_empty());
    }

    #[test]
    fn test_analyze_project_with_include_globs() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/a.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("src/b.js"), "const b = 1;\n").unwrap();

        let assistant = assistant(&dir, ScriptedProvider::new(""));
        let analysis = assistant.analyze_project(&["src/*.py".to_string()]).unwrap();

        assert_eq!(analysis.total_files, 1);
        assert_eq!(analysis.files[0].filepath, Path::new("src").join("a.py").display().to_string());
    }

    #[cfg(unix)]
    #[test]
    fn test_include_globs_record_unreadable_directories() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir_all(locked.join("inner")).unwrap();
        fs::write(dir.path().join("top.py"), "x = 1\n").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // permission bits are not enforced for root
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let assistant = assistant(&dir, ScriptedProvider::new(""));
        let analysis = assistant.analyze_project(&["**/*.py".to_string()]);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let analysis = analysis.unwrap();

        assert_eq!(analysis.total_files, 1);
        assert!(!analysis.errors.is_empty());
        assert!(analysis.errors.iter().all(|e| e.file == "locked"));
    }

    #[tokio::test]
    async fn test_provider_info_includes_health() {
        let dir = TempDir::new().unwrap();
        let assistant = assistant(&dir, ScriptedProvider::new(""));

        let info = assistant.provider_info().await;
        assert_eq!(info.name, "ScriptedProvider");
        assert_eq!(info.health_check, Some(true));
        assert_eq!(info.capabilities.len(), 4);
    }
}
