use crate::domain::model::FileAnalysis;
use crate::utils::error::{AcaError, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::Path;

const DETECTION_SAMPLE: u64 = 8192;

struct LanguageSpec {
    name: &'static str,
    extensions: &'static [&'static str],
    patterns: &'static [&'static str],
    keywords: &'static [&'static str],
    dependencies: &'static [&'static str],
    comment_prefixes: &'static [&'static str],
}

const C_STYLE_COMMENTS: &[&str] = &["//", "/*", "*"];

// Table order breaks ties during content-based detection.
const LANGUAGES: &[LanguageSpec] = &[
    LanguageSpec {
        name: "python",
        extensions: &["py", "pyx", "pyi"],
        patterns: &[
            r"^\s*import\s+\w+",
            r"^\s*from\s+\w+\s+import",
            r"^\s*def\s+\w+\s*\(",
            r"^\s*class\s+\w+\s*[\(:]",
            r#"^\s*if\s+__name__\s*==\s*["']__main__["']"#,
        ],
        keywords: &["def", "class", "import", "from", "if", "elif", "else", "for", "while", "try", "except"],
        dependencies: &[r"^\s*import\s+(\w+(?:\.\w+)*)", r"^\s*from\s+(\w+(?:\.\w+)*)\s+import"],
        comment_prefixes: &["#"],
    },
    LanguageSpec {
        name: "javascript",
        extensions: &["js", "mjs"],
        patterns: &[
            r"^\s*function\s+\w+\s*\(",
            r"^\s*const\s+\w+\s*=",
            r"^\s*let\s+\w+\s*=",
            r"^\s*var\s+\w+\s*=",
            r#"^\s*import\s+.*\s+from\s+["']"#,
            r"^\s*export\s+",
        ],
        keywords: &["function", "const", "let", "var", "import", "export", "if", "else", "for", "while"],
        dependencies: &[
            r#"^\s*import\s+.*\s+from\s+["']([^"']+)["']"#,
            r#"^\s*const\s+.*\s*=\s*require\s*\(\s*["']([^"']+)["']\s*\)"#,
        ],
        comment_prefixes: C_STYLE_COMMENTS,
    },
    LanguageSpec {
        name: "typescript",
        extensions: &["ts", "tsx"],
        patterns: &[
            r"^\s*interface\s+\w+\s*\{",
            r"^\s*type\s+\w+\s*=",
            r"^\s*enum\s+\w+\s*\{",
            r":\s*\w+\s*[=;]",
            r#"^\s*import\s+.*\s+from\s+["']"#,
        ],
        keywords: &["interface", "type", "enum", "function", "const", "let", "import", "export"],
        dependencies: &[r#"^\s*import\s+.*\s+from\s+["']([^"']+)["']"#],
        comment_prefixes: C_STYLE_COMMENTS,
    },
    LanguageSpec {
        name: "java",
        extensions: &["java"],
        patterns: &[
            r"^\s*public\s+class\s+\w+",
            r"^\s*private\s+\w+\s+\w+",
            r"^\s*public\s+static\s+void\s+main",
            r"^\s*package\s+\w+",
            r"^\s*import\s+\w+",
        ],
        keywords: &["public", "private", "protected", "class", "interface", "package", "import"],
        dependencies: &[r"^\s*import\s+([\w\.]+)"],
        comment_prefixes: C_STYLE_COMMENTS,
    },
    LanguageSpec {
        name: "go",
        extensions: &["go"],
        patterns: &[
            r"^\s*package\s+\w+",
            r#"^\s*import\s+["\(]"#,
            r"^\s*func\s+\w+\s*\(",
            r"^\s*type\s+\w+\s+struct",
            r"^\s*var\s+\w+\s+\w+",
        ],
        keywords: &["package", "import", "func", "type", "struct", "var", "const"],
        dependencies: &[
            r#"^\s*import\s+["']([^"']+)["']"#,
            r#"^\s*import\s+\w+\s+["']([^"']+)["']"#,
        ],
        comment_prefixes: C_STYLE_COMMENTS,
    },
    LanguageSpec {
        name: "rust",
        extensions: &["rs"],
        patterns: &[
            r"^\s*fn\s+\w+\s*\(",
            r"^\s*struct\s+\w+\s*\{",
            r"^\s*impl\s+\w+\s*\{",
            r"^\s*use\s+\w+",
            r"^\s*mod\s+\w+",
        ],
        keywords: &["fn", "struct", "impl", "use", "mod", "let", "mut"],
        dependencies: &[r"^\s*use\s+([\w:]+)"],
        comment_prefixes: C_STYLE_COMMENTS,
    },
];

struct CompiledLanguage {
    spec: &'static LanguageSpec,
    patterns: Vec<Regex>,
    keywords: Vec<Regex>,
    dependencies: Vec<Regex>,
}

struct StructurePatterns {
    py_functions: Regex,
    py_classes: Regex,
    js_functions: Regex,
    js_arrow_functions: Regex,
    js_classes: Regex,
}

/// Heuristic language detection, import extraction and line statistics.
pub struct CodeAnalyzer {
    languages: Vec<CompiledLanguage>,
    structure: StructurePatterns,
}

fn multiline(pattern: &str) -> Regex {
    Regex::new(&format!("(?m){}", pattern)).expect("built-in analyzer pattern must compile")
}

impl CodeAnalyzer {
    pub fn new() -> Self {
        let languages = LANGUAGES
            .iter()
            .map(|spec| CompiledLanguage {
                spec,
                patterns: spec.patterns.iter().map(|p| multiline(p)).collect(),
                keywords: spec
                    .keywords
                    .iter()
                    .map(|k| multiline(&format!(r"\b{}\b", regex::escape(k))))
                    .collect(),
                dependencies: spec.dependencies.iter().map(|p| multiline(p)).collect(),
            })
            .collect();

        Self {
            languages,
            structure: StructurePatterns {
                py_functions: multiline(r"^\s*def\s+\w+\s*\("),
                py_classes: multiline(r"^\s*class\s+\w+\s*[\(:]"),
                js_functions: multiline(r"^\s*function\s+\w+\s*\("),
                js_arrow_functions: multiline(r"\w+\s*=\s*\([^)]*\)\s*=>"),
                js_classes: multiline(r"^\s*class\s+\w+"),
            },
        }
    }

    pub fn supported_languages(&self) -> Vec<&'static str> {
        self.languages.iter().map(|l| l.spec.name).collect()
    }

    fn language(&self, name: &str) -> Option<&CompiledLanguage> {
        self.languages.iter().find(|l| l.spec.name == name)
    }

    /// Extension first; otherwise the best pattern/keyword score over `content`
    /// (or the first 8 KiB of the file when no content is given).
    pub fn detect_language(&self, path: &Path, content: Option<&str>) -> Result<Option<&'static str>> {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let ext = ext.to_lowercase();
            if let Some(lang) = self.languages.iter().find(|l| l.spec.extensions.contains(&ext.as_str())) {
                return Ok(Some(lang.spec.name));
            }
        }

        let sampled;
        let content = match content {
            Some(c) => c,
            None => {
                sampled = read_sample(path, "language_detection")?;
                sampled.as_str()
            }
        };

        Ok(self.detect_from_content(content))
    }

    fn detect_from_content(&self, content: &str) -> Option<&'static str> {
        let mut best: Option<(&'static str, usize)> = None;

        for lang in &self.languages {
            let pattern_score: usize = lang.patterns.iter().map(|re| re.find_iter(content).count() * 2).sum();
            let keyword_score: usize = lang.keywords.iter().map(|re| re.find_iter(content).count()).sum();
            let score = pattern_score + keyword_score;

            if score > 0 && best.map_or(true, |(_, top)| score > top) {
                best = Some((lang.spec.name, score));
            }
        }

        best.map(|(name, _)| name)
    }

    /// Sorted, de-duplicated import targets. Relative imports are skipped.
    pub fn extract_dependencies(&self, path: &Path, content: Option<&str>) -> Result<Vec<String>> {
        let full;
        let content = match content {
            Some(c) => c,
            None => {
                full = read_lossy(path, "dependency_extraction")?;
                full.as_str()
            }
        };

        let Some(language) = self.detect_language(path, Some(content))? else {
            return Ok(Vec::new());
        };
        Ok(self.dependencies_for(language, content))
    }

    fn dependencies_for(&self, language: &str, content: &str) -> Vec<String> {
        let Some(lang) = self.language(language) else {
            return Vec::new();
        };

        let mut found = BTreeSet::new();
        for re in &lang.dependencies {
            for caps in re.captures_iter(content) {
                if let Some(m) = caps.get(1) {
                    let dependency = m.as_str().trim();
                    if !dependency.is_empty() && !dependency.starts_with('.') {
                        found.insert(dependency.to_string());
                    }
                }
            }
        }
        found.into_iter().collect()
    }

    fn count_comment_lines(&self, lines: &[&str], language: Option<&str>) -> usize {
        let Some(lang) = language.and_then(|l| self.language(l)) else {
            return 0;
        };
        lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty() && lang.spec.comment_prefixes.iter().any(|p| l.starts_with(p)))
            .count()
    }

    pub fn analyze_file_structure(&self, path: &Path, content: Option<&str>) -> Result<FileAnalysis> {
        let full;
        let content = match content {
            Some(c) => c,
            None => {
                full = read_lossy(path, "structure_analysis")?;
                full.as_str()
            }
        };

        let language = self.detect_language(path, Some(content))?;
        let lines: Vec<&str> = content.lines().collect();

        let mut analysis = FileAnalysis {
            filepath: path.display().to_string(),
            language: language.map(str::to_string),
            dependencies: language.map(|l| self.dependencies_for(l, content)).unwrap_or_default(),
            line_count: lines.len(),
            char_count: content.chars().count(),
            blank_lines: lines.iter().filter(|l| l.trim().is_empty()).count(),
            comment_lines: self.count_comment_lines(&lines, language),
            ..FileAnalysis::default()
        };

        let s = &self.structure;
        match language {
            Some("python") => {
                analysis.functions = Some(s.py_functions.find_iter(content).count());
                analysis.classes = Some(s.py_classes.find_iter(content).count());
            }
            Some("javascript") | Some("typescript") => {
                analysis.functions = Some(s.js_functions.find_iter(content).count());
                analysis.arrow_functions = Some(s.js_arrow_functions.find_iter(content).count());
                analysis.classes = Some(s.js_classes.find_iter(content).count());
            }
            _ => {}
        }

        Ok(analysis)
    }
}

impl Default for CodeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn read_sample(path: &Path, operation: &str) -> Result<String> {
    let mut bytes = Vec::new();
    fs::File::open(path)
        .and_then(|f| f.take(DETECTION_SAMPLE).read_to_end(&mut bytes))
        .map_err(|e| AcaError::file_op(path.display().to_string(), operation, e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_lossy(path: &Path, operation: &str) -> Result<String> {
    let bytes = fs::read(path)
        .map_err(|e| AcaError::file_op(path.display().to_string(), operation, e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PYTHON: &str = "import os\nfrom collections import OrderedDict\nfrom . import sibling\n\n# helper\ndef main():\n    pass\n\nclass Thing:\n    pass\n\nif __name__ == \"__main__\":\n    main()\n";

    #[test]
    fn test_detect_by_extension() {
        let analyzer = CodeAnalyzer::new();
        let detect = |p: &str| analyzer.detect_language(Path::new(p), Some("")).unwrap();
        assert_eq!(detect("a.py"), Some("python"));
        assert_eq!(detect("b.MJS"), Some("javascript"));
        assert_eq!(detect("c.tsx"), Some("typescript"));
        assert_eq!(detect("D.java"), Some("java"));
        assert_eq!(detect("e.go"), Some("go"));
        assert_eq!(detect("f.rs"), Some("rust"));
        assert_eq!(detect("notes.txt"), None);
    }

    #[test]
    fn test_detect_by_content() {
        let analyzer = CodeAnalyzer::new();
        let script = Path::new("bin/tool");
        assert_eq!(analyzer.detect_language(script, Some(PYTHON)).unwrap(), Some("python"));

        let go = "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(1)\n}\n";
        assert_eq!(analyzer.detect_language(script, Some(go)).unwrap(), Some("go"));

        let rust = "use std::fs;\n\nstruct Config {\n}\n\nfn main() {\n    let mut x = 1;\n}\n";
        assert_eq!(analyzer.detect_language(script, Some(rust)).unwrap(), Some("rust"));
    }

    #[test]
    fn test_detect_nothing_for_prose() {
        let analyzer = CodeAnalyzer::new();
        assert_eq!(
            analyzer.detect_language(Path::new("README"), Some("Plain words only.")).unwrap(),
            None
        );
    }

    #[test]
    fn test_detect_reads_missing_file_error() {
        let analyzer = CodeAnalyzer::new();
        let err = analyzer.detect_language(Path::new("/definitely/not/here"), None).unwrap_err();
        assert_eq!(err.code(), "FILE_OPERATION_ERROR");
    }

    #[test]
    fn test_python_dependencies() {
        let analyzer = CodeAnalyzer::new();
        let deps = analyzer.extract_dependencies(Path::new("m.py"), Some(PYTHON)).unwrap();
        assert_eq!(deps, vec!["collections".to_string(), "os".to_string()]);
    }

    #[test]
    fn test_js_dependencies_skip_relative() {
        let analyzer = CodeAnalyzer::new();
        let js = "import React from 'react';\nimport util from './util';\nconst fs = require(\"fs\");\n";
        let deps = analyzer.extract_dependencies(Path::new("app.js"), Some(js)).unwrap();
        assert_eq!(deps, vec!["fs".to_string(), "react".to_string()]);
    }

    #[test]
    fn test_rust_and_java_dependencies() {
        let analyzer = CodeAnalyzer::new();
        let rust = "use std::collections::HashMap;\nuse serde::Serialize;\n";
        assert_eq!(
            analyzer.extract_dependencies(Path::new("lib.rs"), Some(rust)).unwrap(),
            vec!["serde::Serialize".to_string(), "std::collections::HashMap".to_string()]
        );

        let java = "package demo;\nimport java.util.List;\n";
        assert_eq!(
            analyzer.extract_dependencies(Path::new("A.java"), Some(java)).unwrap(),
            vec!["java.util.List".to_string()]
        );
    }

    #[test]
    fn test_python_structure() {
        let analyzer = CodeAnalyzer::new();
        let analysis = analyzer.analyze_file_structure(Path::new("m.py"), Some(PYTHON)).unwrap();

        assert_eq!(analysis.language.as_deref(), Some("python"));
        assert_eq!(analysis.line_count, 13);
        assert_eq!(analysis.blank_lines, 3);
        assert_eq!(analysis.comment_lines, 1);
        assert_eq!(analysis.functions, Some(1));
        assert_eq!(analysis.classes, Some(1));
        assert_eq!(analysis.arrow_functions, None);
    }

    #[test]
    fn test_js_structure() {
        let analyzer = CodeAnalyzer::new();
        let js = "// entry\nfunction a() {}\nconst b = (x) => x;\nclass C {}\n";
        let analysis = analyzer.analyze_file_structure(Path::new("x.js"), Some(js)).unwrap();

        assert_eq!(analysis.functions, Some(1));
        assert_eq!(analysis.arrow_functions, Some(1));
        assert_eq!(analysis.classes, Some(1));
        assert_eq!(analysis.comment_lines, 1);
    }
}
