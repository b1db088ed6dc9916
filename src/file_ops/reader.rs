use crate::file_ops::ignore::IgnoreRules;
use crate::utils::error::{AcaError, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::Path;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

const SAMPLE_SIZE: u64 = 8192;

const TEXT_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "jsx", "tsx", "java", "cpp", "c", "h", "hpp", "cs", "go", "rs", "php", "rb",
    "swift", "kt", "scala", "dart", "html", "htm", "css", "scss", "sass", "less", "xml", "json",
    "yaml", "yml", "toml", "ini", "cfg", "conf", "md", "rst", "txt", "sql", "sh", "bash", "zsh",
    "fish", "ps1", "bat", "cmd", "dockerfile", "makefile", "cmake", "gradle", "maven", "pom",
    "lock", "gitignore", "gitattributes", "editorconfig", "flake8", "pylintrc",
];

const BINARY_EXTENSIONS: &[&str] = &[
    "pyc", "pyo", "pyd", "exe", "dll", "so", "dylib", "o", "obj", "a", "lib", "jar", "war", "ear",
    "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "pdf", "doc", "docx", "xls", "xlsx", "ppt",
    "pptx", "png", "jpg", "jpeg", "gif", "bmp", "tiff", "svg", "ico", "mp3", "mp4", "avi", "mov",
    "wmv", "flv", "webm", "ogg", "wav",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

/// Decodes file bytes: UTF-8 when valid, otherwise Latin-1 (every byte maps to one char).
pub fn decode_text(bytes: Vec<u8>) -> (String, TextEncoding) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, TextEncoding::Utf8),
        Err(e) => {
            let text = e.into_bytes().into_iter().map(char::from).collect();
            (text, TextEncoding::Latin1)
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub path: String,
    pub name: String,
    pub stem: String,
    pub suffix: String,
    pub size: u64,
    pub modified: Option<DateTime<Local>>,
    pub is_text: bool,
    pub should_ignore: bool,
}

#[derive(Debug, Clone)]
pub struct FileReader {
    max_file_size: u64,
    ignore: IgnoreRules,
}

impl FileReader {
    pub fn new() -> Self {
        Self::with_max_file_size(DEFAULT_MAX_FILE_SIZE)
    }

    pub fn with_max_file_size(max_file_size: u64) -> Self {
        Self {
            max_file_size,
            ignore: IgnoreRules::default(),
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Replaces the ignore rules; paths under `root` are matched relative to it.
    pub fn set_ignore_patterns<S: AsRef<str>>(&mut self, root: Option<&Path>, patterns: &[S]) {
        self.ignore = IgnoreRules::new(root, patterns);
    }

    pub fn read_file(&self, path: &Path) -> Result<String> {
        self.read_file_with_encoding(path).map(|(text, _)| text)
    }

    pub fn read_file_with_encoding(&self, path: &Path) -> Result<(String, TextEncoding)> {
        self.validate_file(path)?;

        let bytes = fs::read(path).map_err(|e| read_error(path, e))?;
        let (text, encoding) = decode_text(bytes);
        if encoding != TextEncoding::Utf8 {
            tracing::debug!("{} is not valid UTF-8, decoded as {:?}", path.display(), encoding);
        }
        Ok((text, encoding))
    }

    /// Lines `start..=end` (1-based). `end = None` reads to the end of the file.
    pub fn read_file_lines(&self, path: &Path, start: usize, end: Option<usize>) -> Result<Vec<String>> {
        let content = self.read_file(path)?;
        let lines: Vec<&str> = content.lines().collect();

        let start_idx = start.saturating_sub(1).min(lines.len());
        let end_idx = end.map_or(lines.len(), |e| e.min(lines.len())).max(start_idx);

        Ok(lines[start_idx..end_idx].iter().map(|l| l.to_string()).collect())
    }

    pub fn is_text_file(&self, path: &Path) -> bool {
        if let Some(ext) = extension(path) {
            if BINARY_EXTENSIONS.contains(&ext.as_str()) {
                return false;
            }
            if TEXT_EXTENSIONS.contains(&ext.as_str()) {
                return true;
            }
        }

        // No telling extension: sniff the first bytes. A NUL is a strong binary marker;
        // anything else decodes as UTF-8 or Latin-1.
        let mut sample = Vec::new();
        match fs::File::open(path).and_then(|f| f.take(SAMPLE_SIZE).read_to_end(&mut sample)) {
            Ok(_) => !sample.contains(&0),
            Err(_) => false,
        }
    }

    pub fn should_ignore_file(&self, path: &Path) -> bool {
        self.ignore.is_ignored(path, false)
    }

    pub fn should_ignore_dir(&self, path: &Path) -> bool {
        self.ignore.is_ignored(path, true)
    }

    pub fn file_info(&self, path: &Path) -> Result<FileInfo> {
        let metadata = fs::metadata(path).map_err(|e| AcaError::file_op(path.display().to_string(), "stat", e.to_string()))?;

        Ok(FileInfo {
            path: path.display().to_string(),
            name: os_str(path.file_name()),
            stem: os_str(path.file_stem()),
            suffix: extension(path).map(|e| format!(".{}", e)).unwrap_or_default(),
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Local>::from),
            is_text: self.is_text_file(path),
            should_ignore: self.should_ignore_file(path),
        })
    }

    fn validate_file(&self, path: &Path) -> Result<()> {
        let display = path.display().to_string();

        if !path.exists() {
            return Err(AcaError::file_op(&display, "validate", format!("File does not exist: {}", display)));
        }

        if !path.is_file() {
            return Err(AcaError::file_op(&display, "validate", format!("Path is not a file: {}", display)));
        }

        let size = fs::metadata(path).map_err(|e| read_error(path, e))?.len();
        if size > self.max_file_size {
            return Err(AcaError::file_op(
                &display,
                "validate",
                format!("File too large: {} bytes (max: {})", size, self.max_file_size),
            ));
        }

        if self.should_ignore_file(path) {
            return Err(AcaError::file_op(&display, "validate", format!("File matches ignore patterns: {}", display)));
        }

        if !self.is_text_file(path) {
            return Err(AcaError::file_op(&display, "validate", format!("File is not a text file: {}", display)));
        }

        Ok(())
    }
}

impl Default for FileReader {
    fn default() -> Self {
        Self::new()
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn os_str(value: Option<&std::ffi::OsStr>) -> String {
    value.map(|v| v.to_string_lossy().into_owned()).unwrap_or_default()
}

fn read_error(path: &Path, e: std::io::Error) -> AcaError {
    AcaError::file_op(path.display().to_string(), "read", e.to_string())
}
