use crate::utils::error::{AcaError, Result};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BACKUP_DIR: &str = ".backups";
pub const DEFAULT_MAX_BACKUPS: usize = 10;

const BACKUP_EXTENSION: &str = ".bak";

#[derive(Debug, Clone, Serialize)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub created: NaiveDateTime,
    /// File name the backup was taken from.
    pub original_name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BackupStats {
    pub total_backups: usize,
    pub total_size: u64,
    pub oldest_backup: Option<NaiveDateTime>,
    pub newest_backup: Option<NaiveDateTime>,
}

/// Timestamped copies of files, kept flat in one directory.
///
/// Backups are named `<stem>_<YYYYMMDD>_<HHMMSSmmm><suffix>.bak`, which is
/// enough to recover both the original file name and the creation time.
#[derive(Debug, Clone)]
pub struct BackupManager {
    backup_dir: PathBuf,
    restore_root: PathBuf,
    max_backups: usize,
}

impl BackupManager {
    /// `restore_root` is where restores land when no explicit target is given.
    /// The backup directory is created lazily on the first backup.
    pub fn new(backup_dir: impl Into<PathBuf>, restore_root: impl Into<PathBuf>, max_backups: usize) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            restore_root: restore_root.into(),
            max_backups,
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn create_backup(&self, path: &Path) -> Result<PathBuf> {
        if !path.is_file() {
            return Err(AcaError::file_op(
                path.display().to_string(),
                "backup",
                format!("Cannot backup non-existent file: {}", path.display()),
            ));
        }

        fs::create_dir_all(&self.backup_dir).map_err(|e| backup_error(path, e))?;

        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let suffix = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        // two backups within the same millisecond get consecutive timestamps
        let mut stamp = Local::now().naive_local();
        let mut backup_path = self.backup_dir.join(backup_name(&stem, &suffix, stamp));
        while backup_path.exists() {
            stamp += Duration::milliseconds(1);
            backup_path = self.backup_dir.join(backup_name(&stem, &suffix, stamp));
        }

        fs::copy(path, &backup_path).map_err(|e| backup_error(path, e))?;
        tracing::info!("💾 Backed up {} to {}", path.display(), backup_path.display());

        self.prune(path)?;
        Ok(backup_path)
    }

    /// Copies a backup back. Without `target`, restores to the original file
    /// name under the restore root. Returns the restored path.
    pub fn restore_backup(&self, backup: &Path, target: Option<&Path>) -> Result<PathBuf> {
        if !backup.is_file() {
            return Err(AcaError::file_op(
                backup.display().to_string(),
                "restore",
                format!("Backup file does not exist: {}", backup.display()),
            ));
        }

        let target = match target {
            Some(t) => t.to_path_buf(),
            None => {
                let name = backup.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                let (original, _) = parse_backup_name(&name);
                self.restore_root.join(original)
            }
        };

        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| restore_error(backup, e))?;
        }
        fs::copy(backup, &target).map_err(|e| restore_error(backup, e))?;

        tracing::info!("♻️ Restored {} from {}", target.display(), backup.display());
        Ok(target)
    }

    /// Newest first. With `original`, only backups of that file name.
    pub fn list_backups(&self, original: Option<&Path>) -> Result<Vec<BackupEntry>> {
        let wanted = original
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned());

        let dir = match fs::read_dir(&self.backup_dir) {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AcaError::file_op(self.backup_dir.display().to_string(), "list", e.to_string())),
        };

        let mut backups = Vec::new();
        for entry in dir.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(BACKUP_EXTENSION) {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };

            let (original_name, stamp) = parse_backup_name(&name);
            if wanted.as_ref().is_some_and(|w| *w != original_name) {
                continue;
            }

            let created = stamp
                .or_else(|| {
                    metadata
                        .modified()
                        .ok()
                        .map(|t| chrono::DateTime::<Local>::from(t).naive_local())
                })
                .unwrap_or_default();

            backups.push(BackupEntry {
                path: entry.path(),
                name,
                size: metadata.len(),
                created,
                original_name,
            });
        }

        backups.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.name.cmp(&a.name)));
        Ok(backups)
    }

    pub fn latest_backup(&self, original: &Path) -> Result<Option<PathBuf>> {
        Ok(self.list_backups(Some(original))?.into_iter().next().map(|b| b.path))
    }

    /// Deletes backups older than `days`. Returns how many were removed.
    /// A threshold reaching past the representable calendar removes nothing.
    pub fn cleanup_old_backups(&self, original: Option<&Path>, days: i64) -> Result<usize> {
        if days < 0 {
            return Err(AcaError::validation("days", "Age threshold cannot be negative"));
        }
        let Some(cutoff) = Duration::try_days(days).and_then(|age| Local::now().naive_local().checked_sub_signed(age))
        else {
            tracing::debug!("Age threshold of {} days predates every backup", days);
            return Ok(0);
        };
        let mut removed = 0;

        for backup in self.list_backups(original)? {
            if backup.created < cutoff {
                match fs::remove_file(&backup.path) {
                    Ok(()) => removed += 1,
                    Err(e) => tracing::warn!("Could not delete {}: {}", backup.path.display(), e),
                }
            }
        }

        Ok(removed)
    }

    pub fn stats(&self) -> Result<BackupStats> {
        let backups = self.list_backups(None)?;

        Ok(BackupStats {
            total_backups: backups.len(),
            total_size: backups.iter().map(|b| b.size).sum(),
            oldest_backup: backups.iter().map(|b| b.created).min(),
            newest_backup: backups.iter().map(|b| b.created).max(),
        })
    }

    /// Keeps the newest `max_backups` backups of one file.
    fn prune(&self, original: &Path) -> Result<()> {
        if self.max_backups == 0 {
            return Ok(());
        }

        for stale in self.list_backups(Some(original))?.into_iter().skip(self.max_backups) {
            tracing::debug!("Pruning old backup {}", stale.path.display());
            if let Err(e) = fs::remove_file(&stale.path) {
                tracing::warn!("Could not prune {}: {}", stale.path.display(), e);
            }
        }
        Ok(())
    }
}

fn backup_name(stem: &str, suffix: &str, stamp: NaiveDateTime) -> String {
    format!(
        "{}_{}{}{}",
        stem,
        stamp.format("%Y%m%d_%H%M%S%3f"),
        suffix,
        BACKUP_EXTENSION
    )
}

/// Splits `<stem>_<date>_<time><suffix>.bak` into the original file name and timestamp.
/// Names that don't follow the pattern map to themselves minus `.bak`, without a timestamp.
pub fn parse_backup_name(name: &str) -> (String, Option<NaiveDateTime>) {
    let base = name.strip_suffix(BACKUP_EXTENSION).unwrap_or(name);
    parse_stamped(base).unwrap_or_else(|| (base.to_string(), None))
}

fn parse_stamped(base: &str) -> Option<(String, Option<NaiveDateTime>)> {
    let (rest, time_and_suffix) = base.rsplit_once('_')?;
    let (stem, date) = rest.rsplit_once('_')?;

    let digits = time_and_suffix.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits != 9 || date.len() != 8 || !date.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (time, suffix) = time_and_suffix.split_at(digits);

    let num = |s: &str| s.parse::<u32>().ok();
    let day = NaiveDate::from_ymd_opt(num(&date[..4])? as i32, num(&date[4..6])?, num(&date[6..])?)?;
    let clock = NaiveTime::from_hms_milli_opt(num(&time[..2])?, num(&time[2..4])?, num(&time[4..6])?, num(&time[6..])?)?;

    Some((format!("{}{}", stem, suffix), Some(day.and_time(clock))))
}

fn backup_error(path: &Path, e: std::io::Error) -> AcaError {
    AcaError::file_op(path.display().to_string(), "backup", format!("Failed to create backup: {}", e))
}

fn restore_error(path: &Path, e: std::io::Error) -> AcaError {
    AcaError::file_op(path.display().to_string(), "restore", format!("Failed to restore backup: {}", e))
}
