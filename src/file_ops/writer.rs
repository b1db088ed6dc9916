use crate::utils::error::{AcaError, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes files atomically (temp file + rename in the target directory).
///
/// With safety copies enabled, an existing target is first copied to a sibling
/// `<name>.bak` file. The copy is put back if the write fails and removed once
/// the write succeeded.
#[derive(Debug, Clone)]
pub struct FileWriter {
    safety_copies: bool,
    backup_suffix: String,
}

impl FileWriter {
    pub fn new() -> Self {
        Self {
            safety_copies: true,
            backup_suffix: ".bak".to_string(),
        }
    }

    pub fn with_safety_copies(mut self, enabled: bool) -> Self {
        self.safety_copies = enabled;
        self
    }

    pub fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        ensure_parent(path, "write")?;

        let safety_copy = if self.safety_copies && path.exists() {
            Some(self.create_safety_copy(path)?)
        } else {
            None
        };

        if let Err(e) = write_atomic(path, content) {
            if let Some(copy) = &safety_copy {
                if let Err(restore_err) = fs::rename(copy, path) {
                    tracing::warn!("Could not restore {} from {}: {}", path.display(), copy.display(), restore_err);
                }
            }
            return Err(op_error(path, "write", e));
        }

        if let Some(copy) = safety_copy {
            if let Err(e) = fs::remove_file(&copy) {
                tracing::warn!("Could not remove safety copy {}: {}", copy.display(), e);
            }
        }

        tracing::debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(())
    }

    pub fn append_file(&self, path: &Path, content: &str) -> Result<()> {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| f.write_all(content.as_bytes()))
            .map_err(|e| op_error(path, "append", e))
    }

    /// Joins with `\n` and terminates the last line.
    pub fn write_file_lines<S: AsRef<str>>(&self, path: &Path, lines: &[S]) -> Result<()> {
        let mut content = lines.iter().map(|l| l.as_ref()).collect::<Vec<_>>().join("\n");
        if !lines.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        self.write_file(path, &content)
    }

    /// Replaces lines `start..=end` (1-based; `end = None` means to the end of the file).
    pub fn update_file_section(
        &self,
        path: &Path,
        new_content: &str,
        start: usize,
        end: Option<usize>,
    ) -> Result<()> {
        let existing = fs::read_to_string(path).map_err(|e| op_error(path, "update_section", e))?;
        let lines: Vec<&str> = existing.split_inclusive('\n').collect();

        let start_idx = start.saturating_sub(1).min(lines.len());
        let end_idx = end.map_or(lines.len(), |e| e.min(lines.len())).max(start_idx);

        let mut replacement = new_content.to_string();
        if !replacement.is_empty() && !replacement.ends_with('\n') {
            replacement.push('\n');
        }

        let mut updated = String::with_capacity(existing.len() + replacement.len());
        updated.extend(lines[..start_idx].iter().copied());
        updated.push_str(&replacement);
        updated.extend(lines[end_idx..].iter().copied());

        self.write_file(path, &updated)
    }

    /// Returns `false` when the file already existed.
    pub fn create_file_if_not_exists(&self, path: &Path, content: &str) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        self.write_file(path, content)?;
        Ok(true)
    }

    /// Missing files are not an error.
    pub fn delete_file(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(op_error(path, "delete", e)),
        }
    }

    pub fn copy_file(&self, src: &Path, dst: &Path) -> Result<()> {
        ensure_parent(dst, "copy")?;
        fs::copy(src, dst).map_err(|e| {
            AcaError::file_op(
                src.display().to_string(),
                "copy",
                format!("to {}: {}", dst.display(), e),
            )
        })?;
        Ok(())
    }

    fn create_safety_copy(&self, path: &Path) -> Result<PathBuf> {
        let base = sibling_with_suffix(path, &self.backup_suffix);
        let mut candidate = base.clone();
        let mut counter = 1;
        while candidate.exists() {
            candidate = sibling_with_suffix(&base, &format!(".{}", counter));
            counter += 1;
        }

        fs::copy(path, &candidate).map_err(|e| op_error(path, "backup", e))?;
        Ok(candidate)
    }
}

impl Default for FileWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn ensure_parent(path: &Path, operation: &str) -> Result<()> {
    fs::create_dir_all(parent_dir(path)).map_err(|e| op_error(path, operation, e))
}

fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{}.", name))
        .suffix(".tmp")
        .tempfile_in(parent_dir(path))?;
    temp.write_all(content.as_bytes())?;
    // the temp file starts out owner-only; keep the target's mode
    if let Ok(meta) = fs::metadata(path) {
        temp.as_file().set_permissions(meta.permissions())?;
    }
    temp.as_file().sync_all()?;

    // the temp file is removed on drop if persisting fails
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn op_error(path: &Path, operation: &str, e: std::io::Error) -> AcaError {
    AcaError::file_op(path.display().to_string(), operation, e.to_string())
}
