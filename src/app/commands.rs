use crate::app::render;
use crate::config::cli::{BackupCommand, Cli, Command};
use crate::config::{self, ConfigOverrides, ResolvedConfig};
use crate::core::assistant::{CodeAssistant, GenerateOptions, Workspace};
use crate::utils::error::{AcaError, Result};
use std::future::Future;
use std::path::{Path, PathBuf};

/// Runs one CLI invocation to completion.
pub async fn run(cli: Cli) -> Result<()> {
    let overrides = ConfigOverrides {
        provider: cli.provider.clone(),
        model: cli.model.clone(),
        config_file: cli.config.clone(),
    };
    let config = config::resolve(&cli.project_root, &overrides)?;
    tracing::debug!("{}", describe(&config));

    match cli.command {
        Command::Analyze { include } => {
            let workspace = Workspace::open(&cli.project_root, &config.assistant)?;
            analyze(&workspace, &include)
        }
        Command::Backup { command } => {
            let workspace = Workspace::open(&cli.project_root, &config.assistant)?;
            backup(&workspace, command)
        }
        command => {
            let assistant = CodeAssistant::new(&config.assistant, &cli.project_root)?;
            run_with_provider(&assistant, command, &config).await
        }
    }
}

async fn run_with_provider(assistant: &CodeAssistant, command: Command, config: &ResolvedConfig) -> Result<()> {
    match command {
        Command::Generate {
            instruction,
            file,
            max_tokens,
            temperature,
            no_backup,
            dry_run,
        } => {
            let options = generate_options(file, max_tokens, temperature, no_backup, dry_run, config);
            generate(assistant, &instruction, &options).await
        }
        Command::Review { path } => {
            let report = with_spinner("Reviewing code...", assistant.review_code(&path)).await?;
            render::print_report("Code review", &report);
            Ok(())
        }
        Command::Refactor {
            path,
            instruction,
            no_backup,
            yes,
        } => refactor(assistant, &path, &instruction, !no_backup, yes).await,
        Command::Document { path } => {
            let report = with_spinner("Generating documentation...", assistant.generate_documentation(&path)).await?;
            render::print_report("Documentation", &report);
            Ok(())
        }
        Command::Info => {
            let info = with_spinner("Checking provider health...", assistant.provider_info()).await;
            render::print_provider_info(&info);
            Ok(())
        }
        Command::Analyze { include } => analyze(assistant.workspace(), &include),
        Command::Backup { command } => backup(assistant.workspace(), command),
    }
}

/// A dry run drops the target, so no file context is sent and nothing is written.
fn generate_options(
    file: Option<PathBuf>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    no_backup: bool,
    dry_run: bool,
    config: &ResolvedConfig,
) -> GenerateOptions {
    GenerateOptions {
        target_file: if dry_run { None } else { file },
        max_tokens: max_tokens.unwrap_or(config.max_tokens),
        temperature: temperature.unwrap_or(config.temperature),
        create_backup: !no_backup,
    }
}

async fn with_spinner<T, F>(message: &str, future: F) -> T
where
    F: Future<Output = T>,
{
    let pb = render::spinner(message);
    let output = future.await;
    pb.finish_and_clear();
    output
}

async fn generate(assistant: &CodeAssistant, instruction: &str, options: &GenerateOptions) -> Result<()> {
    tracing::debug!("Generate options: {:?}", options);
    let outcome = with_spinner("Generating code...", assistant.process_instruction(instruction, options)).await?;
    render::print_outcome(&outcome);
    Ok(())
}

async fn refactor(
    assistant: &CodeAssistant,
    path: &Path,
    instruction: &str,
    create_backup: bool,
    assume_yes: bool,
) -> Result<()> {
    if !assume_yes {
        let prompt = format!("Refactor {} in place?", path.display());
        if !render::confirm(&prompt)? {
            println!("Refactoring cancelled");
            return Ok(());
        }
    }

    let outcome = with_spinner(
        "Refactoring code...",
        assistant.refactor_code(path, instruction, create_backup),
    )
    .await?;
    render::print_outcome(&outcome);
    Ok(())
}

fn analyze(workspace: &Workspace, include: &[String]) -> Result<()> {
    let pb = render::spinner("Analyzing project...");
    let analysis = workspace.analyze_project(include);
    pb.finish_and_clear();

    render::print_analysis(&analysis?);
    Ok(())
}

fn backup(workspace: &Workspace, command: BackupCommand) -> Result<()> {
    let backups = workspace.backups();

    match command {
        BackupCommand::List { path } => {
            render::print_backups(&backups.list_backups(path.as_deref())?);
        }
        BackupCommand::Restore { backup, to } => {
            let source = locate_backup(workspace, &backup)?;
            let restored = backups.restore_backup(&source, to.as_deref())?;
            println!("✅ Restored {}", restored.display());
        }
        BackupCommand::Clean { path, days } => {
            let removed = backups.cleanup_old_backups(path.as_deref(), days)?;
            println!("🧹 Removed {} backups older than {} days", removed, days);
        }
        BackupCommand::Stats => {
            render::print_backup_stats(&backups.stats()?);
        }
    }
    Ok(())
}

/// A backup given as a bare name is looked up in the backup directory.
fn locate_backup(workspace: &Workspace, backup: &Path) -> Result<PathBuf> {
    if backup.is_file() {
        return Ok(backup.to_path_buf());
    }

    let in_backup_dir = workspace.backups().backup_dir().join(backup);
    if in_backup_dir.is_file() {
        return Ok(in_backup_dir);
    }

    Err(AcaError::file_op(
        backup.display().to_string(),
        "restore",
        format!("Backup file does not exist: {}", backup.display()),
    ))
}

fn describe(config: &ResolvedConfig) -> String {
    format!(
        "provider={} model={} backup_dir={} config_file={}",
        config.assistant.provider,
        config.assistant.provider_options.model.as_deref().unwrap_or("<default>"),
        config.assistant.backup_dir.display(),
        config
            .source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assistant::AssistantSettings;
    use std::fs;
    use tempfile::TempDir;

    fn resolved() -> ResolvedConfig {
        ResolvedConfig {
            assistant: AssistantSettings::default(),
            max_tokens: 1024,
            temperature: 0.4,
            source: None,
        }
    }

    #[test]
    fn test_dry_run_drops_target() {
        let config = resolved();

        let dry = generate_options(Some(PathBuf::from("a.py")), None, None, false, true, &config);
        assert!(dry.target_file.is_none());
        assert_eq!(dry.max_tokens, 1024);
        assert_eq!(dry.temperature, 0.4);

        let real = generate_options(Some(PathBuf::from("a.py")), Some(64), Some(0.9), true, false, &config);
        assert_eq!(real.target_file, Some(PathBuf::from("a.py")));
        assert_eq!(real.max_tokens, 64);
        assert_eq!(real.temperature, 0.9);
        assert!(!real.create_backup);
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        use crate::domain::model::{GenerationRequest, GenerationResponse, ProviderCapability};
        use crate::domain::ports::LlmProvider;
        use async_trait::async_trait;
        use std::collections::{BTreeSet, HashMap};
        use std::sync::{Arc, Mutex};

        struct Recording {
            capabilities: BTreeSet<ProviderCapability>,
            seen: Arc<Mutex<Vec<GenerationRequest>>>,
        }

        #[async_trait]
        impl LlmProvider for Recording {
            fn name(&self) -> &str {
                "Recording"
            }
            fn model_name(&self) -> &str {
                "rec-1"
            }
            fn capabilities(&self) -> &BTreeSet<ProviderCapability> {
                &self.capabilities
            }
            fn validate_request(&self, _request: &GenerationRequest) -> Result<()> {
                Ok(())
            }
            fn estimate_tokens(&self, text: &str) -> usize {
                text.len() / 4
            }
            async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
                self.seen.lock().unwrap().push(request.clone());
                Ok(GenerationResponse {
                    content: "print('new')".to_string(),
                    tokens_used: 1,
                    model: "rec-1".to_string(),
                    finish_reason: "stop".to_string(),
                    metadata: HashMap::new(),
                })
            }
            async fn check_health(&self) -> bool {
                true
            }
        }

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "print('old')\n").unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let provider = Recording {
            capabilities: [ProviderCapability::CodeGeneration].into_iter().collect(),
            seen: Arc::clone(&seen),
        };
        let assistant =
            CodeAssistant::with_provider(Box::new(provider), dir.path(), &AssistantSettings::default()).unwrap();

        let options = generate_options(Some(PathBuf::from("a.py")), None, None, false, true, &resolved());
        let outcome = assistant.process_instruction("rewrite", &options).await.unwrap();

        assert!(!outcome.file_modified);
        assert!(seen.lock().unwrap()[0].context.is_none());
        assert_eq!(fs::read_to_string(dir.path().join("a.py")).unwrap(), "print('old')\n");
        assert!(!dir.path().join(".backups").exists());
    }

    #[test]
    fn test_locate_backup_by_bare_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("app.py"), "x = 1\n").unwrap();
        let workspace = Workspace::open(dir.path(), &AssistantSettings::default()).unwrap();
        let created = workspace.backups().create_backup(&workspace.resolve_path(Path::new("app.py"))).unwrap();
        let name = PathBuf::from(created.file_name().unwrap());

        assert_eq!(locate_backup(&workspace, &name).unwrap(), created);
        assert_eq!(locate_backup(&workspace, &created).unwrap(), created);

        let err = locate_backup(&workspace, Path::new("missing_20240101_000000000.py.bak")).unwrap_err();
        assert_eq!(err.code(), "FILE_OPERATION_ERROR");
    }
}
