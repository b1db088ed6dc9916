//! Terminal output for command results. Everything here writes to stdout,
//! except the spinner and prompts, which use stderr.

use crate::domain::model::{FileReport, InstructionOutcome, ProjectAnalysis, ProviderInfo};
use crate::file_ops::{BackupEntry, BackupStats};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::time::Duration;

const RULE_WIDTH: usize = 60;
const MAX_LISTED_DEPENDENCIES: usize = 20;

pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn rule() -> String {
    "─".repeat(RULE_WIDTH)
}

pub fn panel(title: &str, body: &str) {
    println!("{}", rule().dimmed());
    println!("{}", title.bold().cyan());
    println!("{}", rule().dimmed());
    println!("{}", body.trim_end());
    println!("{}", rule().dimmed());
}

pub fn code_panel(title: &str, code: &str) {
    panel(title, &number_lines(code));
}

/// Right-aligned 1-based line numbers.
pub fn number_lines(code: &str) -> String {
    let lines: Vec<&str> = code.lines().collect();
    let width = lines.len().to_string().len();
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>width$} │ {}", i + 1, line, width = width))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn print_outcome(outcome: &InstructionOutcome) {
    if outcome.file_modified {
        println!(
            "{} {}",
            "✅ Updated".green().bold(),
            outcome.target_file.as_deref().unwrap_or_default()
        );
        if let Some(backup) = &outcome.backup_path {
            println!("{} {}", "💾 Backup:".dimmed(), backup);
        }
    } else {
        code_panel("Generated code", &outcome.generated_content);
    }
    println!(
        "{}",
        format!(
            "model: {}  tokens: {}  finish: {}",
            outcome.model, outcome.tokens_used, outcome.finish_reason
        )
        .dimmed()
    );
}

pub fn print_report(title: &str, report: &FileReport) {
    let heading = match &report.language {
        Some(language) => format!("{}: {} ({})", title, report.filepath, language),
        None => format!("{}: {}", title, report.filepath),
    };
    panel(&heading, &report.text);
    println!(
        "{}",
        format!("model: {}  tokens: {}", report.model, report.tokens_used).dimmed()
    );
}

pub fn print_analysis(analysis: &ProjectAnalysis) {
    println!("{} {}", "📁 Project:".bold(), analysis.project_root);
    println!("  Files analyzed: {}", analysis.total_files.to_string().green());
    println!("  Total lines:    {}", analysis.total_lines.to_string().green());

    if !analysis.languages.is_empty() {
        println!("\n{}", "Languages".bold().cyan());
        for (language, count) in &analysis.languages {
            println!("  {:<12} {}", language, count);
        }
    }

    if !analysis.dependencies.is_empty() {
        println!("\n{}", "Dependencies".bold().cyan());
        for line in dependency_lines(&analysis.dependencies, MAX_LISTED_DEPENDENCIES) {
            println!("  {}", line);
        }
    }

    if !analysis.errors.is_empty() {
        println!(
            "\n{} {} files could not be analyzed",
            "⚠".yellow(),
            analysis.errors.len()
        );
    }
}

/// At most `limit` entries, then an `... and N more` line.
pub fn dependency_lines(dependencies: &[String], limit: usize) -> Vec<String> {
    let mut lines: Vec<String> = dependencies.iter().take(limit).cloned().collect();
    if dependencies.len() > limit {
        lines.push(format!("... and {} more", dependencies.len() - limit));
    }
    lines
}

pub fn print_provider_info(info: &ProviderInfo) {
    let health = match info.health_check {
        Some(true) => "healthy".green(),
        Some(false) => "unreachable".red(),
        None => "unknown".yellow(),
    };
    println!("{:<14} {}", "Provider:".bold(), info.name);
    println!("{:<14} {}", "Model:".bold(), info.model);
    println!("{:<14} {}", "Health:".bold(), health);
    println!("{}", "Capabilities:".bold());
    for capability in &info.capabilities {
        println!("  • {}", capability);
    }
}

pub fn print_backups(backups: &[BackupEntry]) {
    if backups.is_empty() {
        println!("{}", "No backups found".yellow());
        return;
    }

    println!("{:<20} {:>10}  {:<24} {}", "CREATED".bold(), "SIZE".bold(), "ORIGINAL".bold(), "BACKUP".bold());
    for backup in backups {
        println!(
            "{:<20} {:>10}  {:<24} {}",
            backup.created.format("%Y-%m-%d %H:%M:%S"),
            format_size(backup.size),
            backup.original_name,
            backup.path.display()
        );
    }
}

pub fn print_backup_stats(stats: &BackupStats) {
    let stamp = |t: Option<chrono::NaiveDateTime>| {
        t.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    println!("{:<16} {}", "Backups:".bold(), stats.total_backups);
    println!("{:<16} {}", "Total size:".bold(), format_size(stats.total_size));
    println!("{:<16} {}", "Oldest:".bold(), stamp(stats.oldest_backup));
    println!("{:<16} {}", "Newest:".bold(), stamp(stats.newest_backup));
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// An empty line counts as yes.
pub fn parse_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes")
}

/// Asks on stderr, reads one line from stdin.
pub fn confirm(prompt: &str) -> io::Result<bool> {
    eprint!("{} [Y/n] ", prompt);
    io::stderr().flush()?;

    confirm_from(&mut io::stdin().lock())
}

/// Closed input is a refusal; only an actual empty line takes the default.
pub fn confirm_from<R: BufRead>(input: &mut R) -> io::Result<bool> {
    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        eprintln!();
        return Ok(false);
    }
    Ok(parse_confirmation(&answer))
}
