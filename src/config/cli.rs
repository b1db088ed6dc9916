use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

/// Upper bound for `backup clean --days`, roughly a thousand years.
pub const MAX_CLEANUP_DAYS: i64 = 365_000;

/// Autonomous code assistant: generate, review, refactor and document code with an LLM
#[derive(Parser, Debug, Clone)]
#[command(name = "aca")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// LLM provider to use [default: openai]
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Model name (provider default when omitted)
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Project root directory
    #[arg(long, global = true, default_value = ".", value_hint = ValueHint::DirPath)]
    pub project_root: PathBuf,

    /// Configuration file (default: <project-root>/aca.toml when present)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generate code from an instruction
    Generate {
        /// What to generate
        instruction: String,
        /// File to send as context and overwrite with the result
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// Maximum tokens to generate
        #[arg(long)]
        max_tokens: Option<u32>,
        /// Sampling temperature (0.0 - 2.0)
        #[arg(long)]
        temperature: Option<f32>,
        /// Do not back up the target file
        #[arg(long)]
        no_backup: bool,
        /// Print the result without touching any file
        #[arg(long)]
        dry_run: bool,
    },

    /// Review a file
    Review {
        #[arg(value_hint = ValueHint::FilePath)]
        path: PathBuf,
    },

    /// Refactor a file in place
    Refactor {
        #[arg(value_hint = ValueHint::FilePath)]
        path: PathBuf,
        /// How to refactor
        instruction: String,
        /// Do not back up the file first
        #[arg(long)]
        no_backup: bool,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Analyze project structure and dependencies
    Analyze {
        /// Glob relative to the project root (repeatable)
        #[arg(long = "include")]
        include: Vec<String>,
    },

    /// Generate documentation for a file
    Document {
        #[arg(value_hint = ValueHint::FilePath)]
        path: PathBuf,
    },

    /// Show provider information and health
    Info,

    /// Manage file backups
    Backup {
        #[command(subcommand)]
        command: BackupCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum BackupCommand {
    /// List backups, newest first
    List {
        /// Only backups of this file
        path: Option<PathBuf>,
    },
    /// Restore a backup
    Restore {
        /// Backup file
        #[arg(value_hint = ValueHint::FilePath)]
        backup: PathBuf,
        /// Restore here instead of the original location
        #[arg(long)]
        to: Option<PathBuf>,
    },
    /// Delete old backups
    Clean {
        /// Only backups of this file
        path: Option<PathBuf>,
        /// Age threshold in days
        #[arg(long, default_value_t = 30)]
        days: i64,
    },
    /// Backup directory statistics
    Stats,
}

impl Validate for Cli {
    fn validate(&self) -> Result<()> {
        if let Some(provider) = &self.provider {
            validation::validate_non_empty_string("provider", provider)?;
        }
        if let Some(model) = &self.model {
            validation::validate_non_empty_string("model", model)?;
        }
        validation::validate_path("project_root", &self.project_root.to_string_lossy())?;

        match &self.command {
            Command::Generate {
                max_tokens,
                temperature,
                ..
            } => {
                if let Some(max_tokens) = max_tokens {
                    validation::validate_positive_number("max_tokens", *max_tokens as usize, 1)?;
                }
                if let Some(temperature) = temperature {
                    validation::validate_range("temperature", *temperature, 0.0, 2.0)?;
                }
            }
            Command::Refactor { instruction, .. } => {
                validation::validate_non_empty_string("instruction", instruction)?;
            }
            Command::Backup {
                command: BackupCommand::Clean { days, .. },
            } => {
                validation::validate_range("days", *days, 0, MAX_CLEANUP_DAYS)?;
            }
            _ => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_defaults() {
        let cli = Cli::try_parse_from(["aca", "generate", "write a parser"]).unwrap();
        assert!(cli.provider.is_none());
        assert_eq!(cli.project_root, PathBuf::from("."));
        assert_eq!(cli.log_format, LogFormat::Compact);
        match cli.command {
            Command::Generate {
                instruction,
                file,
                max_tokens,
                no_backup,
                dry_run,
                ..
            } => {
                assert_eq!(instruction, "write a parser");
                assert!(file.is_none());
                assert!(max_tokens.is_none());
                assert!(!no_backup);
                assert!(!dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["aca", "info", "--model", "gpt-4", "-v", "--log-format", "json"]).unwrap();
        assert_eq!(cli.model.as_deref(), Some("gpt-4"));
        assert!(cli.verbose);
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_backup_subcommands() {
        let cli = Cli::try_parse_from(["aca", "backup", "clean", "src/a.py", "--days", "7"]).unwrap();
        match cli.command {
            Command::Backup {
                command: BackupCommand::Clean { path, days },
            } => {
                assert_eq!(path, Some(PathBuf::from("src/a.py")));
                assert_eq!(days, 7);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_validate_bounds_cleanup_age() {
        let cli = Cli::try_parse_from(["aca", "backup", "clean", "--days", "100000000"]).unwrap();
        assert_eq!(cli.validate().unwrap_err().code(), "CONFIG_ERROR");

        let cli = Cli::try_parse_from(["aca", "backup", "clean", "--days=-1"]).unwrap();
        assert!(cli.validate().is_err());

        let cli = Cli::try_parse_from(["aca", "backup", "clean", "--days", "0"]).unwrap();
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let cli = Cli::try_parse_from(["aca", "generate", "x", "--temperature", "2.5"]).unwrap();
        assert!(cli.validate().is_err());

        let cli = Cli::try_parse_from(["aca", "generate", "x", "--max-tokens", "0"]).unwrap();
        assert!(cli.validate().is_err());

        let cli = Cli::try_parse_from(["aca", "generate", "x", "--temperature", "0.7"]).unwrap();
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_refactor_requires_instruction() {
        assert!(Cli::try_parse_from(["aca", "refactor", "a.py"]).is_err());
        let cli = Cli::try_parse_from(["aca", "refactor", "a.py", "   "]).unwrap();
        assert!(cli.validate().is_err());
    }
}
