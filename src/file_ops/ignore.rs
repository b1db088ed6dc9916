use glob::{MatchOptions, Pattern};
use std::path::{Component, Path, PathBuf};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct IgnoreRule {
    pattern: Pattern,
    negated: bool,
    anchored: bool,
    dir_only: bool,
    has_slash: bool,
}

impl IgnoreRule {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let dir_only = body.ends_with('/');
        let body = body.trim_end_matches('/');
        let anchored = body.starts_with('/');
        let body = body.trim_start_matches('/');
        if body.is_empty() {
            return None;
        }

        match Pattern::new(body) {
            Ok(pattern) => Some(Self {
                pattern,
                negated,
                anchored,
                dir_only,
                has_slash: body.contains('/'),
            }),
            Err(e) => {
                tracing::warn!("Skipping invalid ignore pattern '{}': {}", line, e);
                None
            }
        }
    }

    /// `components` is the path relative to the root; `is_dir` describes its last element.
    fn matches(&self, components: &[String], is_dir: bool) -> bool {
        let n = components.len();
        // a dir-only rule may hit the last element only when it is itself a directory
        let last_end = if self.dir_only && !is_dir { n - 1 } else { n };

        if !self.has_slash {
            let candidates = if self.anchored { 1.min(last_end) } else { last_end };
            return components[..candidates]
                .iter()
                .any(|c| self.pattern.matches_with(c, MATCH_OPTIONS));
        }

        let starts = if self.anchored { 1 } else { n };
        for start in 0..starts.min(n) {
            for end in (start + 1)..=last_end {
                let window = components[start..end].join("/");
                if self.pattern.matches_with(&window, MATCH_OPTIONS) {
                    return true;
                }
            }
        }
        false
    }
}

/// Gitignore-style path filter.
///
/// Rules without a slash match any single path component; rules with a slash
/// match a run of components. Both float to any depth unless they start with
/// `/`, so `config/local.py` also matches `app/config/local.py`. A trailing
/// `/` limits a rule to directories, and a matching directory
/// ignores everything beneath it. `!rule` re-includes; the last matching rule wins.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    root: Option<PathBuf>,
    rules: Vec<IgnoreRule>,
}

impl IgnoreRules {
    pub fn new<S: AsRef<str>>(root: Option<&Path>, patterns: &[S]) -> Self {
        Self {
            root: root.map(Path::to_path_buf),
            rules: patterns
                .iter()
                .filter_map(|p| IgnoreRule::parse(p.as_ref()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    fn components(&self, path: &Path) -> Vec<String> {
        let relative = match &self.root {
            Some(root) => path.strip_prefix(root).unwrap_or(path),
            None => path,
        };
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect()
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        if self.rules.is_empty() {
            return false;
        }
        let components = self.components(path);
        if components.is_empty() {
            return false;
        }

        let mut ignored = false;
        for rule in &self.rules {
            if rule.matches(&components, is_dir) {
                ignored = !rule.negated;
            }
        }
        ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(patterns: &[&str]) -> IgnoreRules {
        IgnoreRules::new(Some(Path::new("/repo")), patterns)
    }

    #[test]
    fn test_comments_and_blanks_are_skipped() {
        let r = rules(&["# comment", "", "   ", "*.log"]);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_extension_glob_matches_at_any_depth() {
        let r = rules(&["*.pyc"]);
        assert!(r.is_ignored(Path::new("/repo/a.pyc"), false));
        assert!(r.is_ignored(Path::new("/repo/pkg/sub/b.pyc"), false));
        assert!(!r.is_ignored(Path::new("/repo/pkg/b.py"), false));
    }

    #[test]
    fn test_directory_star_ignores_contents() {
        let r = rules(&["node_modules/*", ".git/*"]);
        assert!(r.is_ignored(Path::new("/repo/node_modules/left-pad/index.js"), false));
        assert!(r.is_ignored(Path::new("/repo/web/node_modules/x.js"), false));
        assert!(r.is_ignored(Path::new("/repo/.git/config"), false));
        assert!(!r.is_ignored(Path::new("/repo/src/git.rs"), false));
    }

    #[test]
    fn test_bare_name_matches_component() {
        let r = rules(&["target", ".DS_Store"]);
        assert!(r.is_ignored(Path::new("/repo/target/debug/app"), false));
        assert!(r.is_ignored(Path::new("/repo/docs/.DS_Store"), false));
        assert!(!r.is_ignored(Path::new("/repo/targets.rs"), false));
    }

    #[test]
    fn test_dir_only_rule() {
        let r = rules(&["build/"]);
        assert!(r.is_ignored(Path::new("/repo/build/out.o"), false));
        assert!(r.is_ignored(Path::new("/repo/build"), true));
        assert!(!r.is_ignored(Path::new("/repo/build"), false));
    }

    #[test]
    fn test_inner_slash_rule_floats() {
        let r = rules(&["config/local.py"]);
        assert!(r.is_ignored(Path::new("/repo/config/local.py"), false));
        assert!(r.is_ignored(Path::new("/repo/app/config/local.py"), false));
        assert!(!r.is_ignored(Path::new("/repo/config/settings.py"), false));

        let anchored = rules(&["/config/local.py"]);
        assert!(!anchored.is_ignored(Path::new("/repo/app/config/local.py"), false));
    }

    #[test]
    fn test_anchored_rule_only_matches_at_root() {
        let r = rules(&["/dist"]);
        assert!(r.is_ignored(Path::new("/repo/dist/app.js"), false));
        assert!(!r.is_ignored(Path::new("/repo/web/dist/app.js"), false));
    }

    #[test]
    fn test_negation_reincludes() {
        let r = rules(&["*.log", "!keep.log"]);
        assert!(r.is_ignored(Path::new("/repo/debug.log"), false));
        assert!(!r.is_ignored(Path::new("/repo/keep.log"), false));
    }

    #[test]
    fn test_relative_paths_without_root() {
        let r = IgnoreRules::new(None, &["*.tmp"]);
        assert!(r.is_ignored(Path::new("scratch/a.tmp"), false));
        assert!(!IgnoreRules::default().is_ignored(Path::new("a.tmp"), false));
    }
}
