//! Minimal `.gitignore`/`.npmignore` rule matching.
//!
//! Supports comments, `!` negation, trailing `/` for directory-only rules,
//! patterns anchored by a `/`, and `*`/`**`/`?` globs. A path is ignored
//! when it or one of its ancestor directories matches; as with git, a
//! negation cannot re-include a file whose parent directory is excluded.

use glob::{MatchOptions, Pattern};
use std::path::Path;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct IgnoreRule {
    pattern: Pattern,
    negated: bool,
    dir_only: bool,
    anchored: bool,
}

impl IgnoreRule {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let (negated, rest) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let (dir_only, rest) = match rest.strip_suffix('/') {
            Some(rest) => (true, rest),
            None => (false, rest),
        };
        let anchored = rest.contains('/');
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        if rest.is_empty() {
            return None;
        }

        match Pattern::new(rest) {
            Ok(pattern) => Some(Self {
                pattern,
                negated,
                dir_only,
                anchored,
            }),
            Err(e) => {
                tracing::debug!("Skipping invalid ignore pattern '{line}': {e}");
                None
            }
        }
    }

    fn matches(&self, path: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        if self.anchored {
            self.pattern.matches_with(path, MATCH_OPTIONS)
        } else {
            let name = path.rsplit('/').next().unwrap_or(path);
            self.pattern.matches_with(name, MATCH_OPTIONS)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    rules: Vec<IgnoreRule>,
}

impl IgnoreRules {
    pub fn parse(content: &str) -> Self {
        Self {
            rules: content.lines().filter_map(IgnoreRule::parse).collect(),
        }
    }

    /// Rules from `path`, or `None` when the file cannot be read.
    pub fn load(path: &Path) -> Option<Self> {
        std::fs::read_to_string(path).ok().map(|content| Self::parse(&content))
    }

    /// Whether the `/`-separated relative `path` is ignored.
    #[must_use]
    pub fn is_ignored(&self, path: &str, is_dir: bool) -> bool {
        let path = path.trim_matches('/');
        let segments: Vec<&str> = path.split('/').collect();

        for end in 1..segments.len() {
            if self.decide(&segments[..end].join("/"), true) {
                return true;
            }
        }
        self.decide(path, is_dir)
    }

    /// Last matching rule wins.
    fn decide(&self, path: &str, is_dir: bool) -> bool {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(path, is_dir))
            .is_some_and(|rule| !rule.negated)
    }
}
