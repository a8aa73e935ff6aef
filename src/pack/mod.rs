//! The set of files a push publishes into the store.
//!
//! Mirrors what `npm pack` would ship, closely enough for local linking:
//!
//! 1. Files under well-known junk names are never published
//!    (`node_modules`, VCS directories, lockfiles, `.nlm`, ...).
//! 2. With a non-empty `files` field, only matching files are published;
//!    directories expand to their contents and `!` entries exclude.
//! 3. Without it, every file is published except those matched by
//!    `.npmignore` (or `.gitignore` when there is no `.npmignore`).
//! 4. `package.json`, README, LICENSE/LICENCE, CHANGELOG and HISTORY files at
//!    the package root, and the manifest's entry points, are always included.

pub mod ignore;

use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;
use walkdir::WalkDir;

pub use ignore::IgnoreRules;

use crate::manifest::PackageManifest;
use crate::utils::fs::normalize_path_for_storage;

const DEFAULT_IGNORES: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "CVS",
    ".DS_Store",
    "._*",
    ".*.swp",
    ".npmrc",
    ".lock-wscript",
    ".wafpickle-*",
    "config.gypi",
    "npm-debug.log",
    "*.orig",
    "node_modules",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    ".npmignore",
    ".gitignore",
    ".nlm",
    "nlm.sig",
];

const ALWAYS_INCLUDE_PREFIXES: &[&str] = &["readme", "license", "licence", "changelog", "history"];

static DEFAULT_IGNORE_PATTERNS: LazyLock<Vec<Pattern>> =
    LazyLock::new(|| DEFAULT_IGNORES.iter().filter_map(|p| Pattern::new(p).ok()).collect());

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn is_default_ignored(name: &str) -> bool {
    DEFAULT_IGNORE_PATTERNS.iter().any(|pattern| pattern.matches(name))
}

/// Relative, `/`-separated paths of every regular file under `root`,
/// skipping default-ignored names at any depth.
fn walk_files(root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root).follow_links(false).into_iter().filter_entry(|entry| {
        entry.depth() == 0 || !entry.file_name().to_str().is_some_and(is_default_ignored)
    });

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).with_context(|| {
            format!("Walked outside of package root: {}", entry.path().display())
        })?;
        files.push(normalize_path_for_storage(relative));
    }
    Ok(files)
}

/// An entry of the `files` field.
struct FilesEntry {
    pattern: Option<Pattern>,
    literal: String,
}

impl FilesEntry {
    fn new(raw: &str) -> Self {
        let literal = raw.trim().trim_start_matches("./").trim_end_matches('/').to_string();
        Self {
            pattern: Pattern::new(&literal).ok(),
            literal,
        }
    }

    /// Matches the file itself or any of its ancestor directories.
    fn matches(&self, file: &str) -> bool {
        if self.literal.is_empty() {
            return false;
        }
        let mut candidate = file;
        loop {
            if candidate == self.literal
                || self.pattern.as_ref().is_some_and(|p| p.matches_with(candidate, MATCH_OPTIONS))
            {
                return true;
            }
            match candidate.rfind('/') {
                Some(index) => candidate = &candidate[..index],
                None => return false,
            }
        }
    }
}

fn is_always_included(file: &str) -> bool {
    if file.contains('/') {
        return false;
    }
    let lower = file.to_ascii_lowercase();
    lower == "package.json" || ALWAYS_INCLUDE_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
}

/// Files under `root` that a push publishes, sorted and `/`-separated.
pub fn publishable_files(root: &Path, manifest: &PackageManifest) -> Result<Vec<String>> {
    let all = walk_files(root)?;
    let mut selected = BTreeSet::new();

    if manifest.files.is_empty() {
        let rules = IgnoreRules::load(&root.join(".npmignore"))
            .or_else(|| IgnoreRules::load(&root.join(".gitignore")))
            .unwrap_or_default();
        selected.extend(all.iter().filter(|file| !rules.is_ignored(file, false)).cloned());
    } else {
        let (excludes, includes): (Vec<&String>, Vec<&String>) =
            manifest.files.iter().partition(|entry| entry.trim().starts_with('!'));
        let includes: Vec<FilesEntry> = includes.iter().map(|e| FilesEntry::new(e)).collect();
        let excludes: Vec<FilesEntry> =
            excludes.iter().map(|e| FilesEntry::new(e.trim().trim_start_matches('!'))).collect();

        selected.extend(
            all.iter()
                .filter(|file| includes.iter().any(|entry| entry.matches(file)))
                .filter(|file| !excludes.iter().any(|entry| entry.matches(file)))
                .cloned(),
        );
    }

    selected.extend(all.iter().filter(|file| is_always_included(file)).cloned());

    for entry_point in manifest.entry_points() {
        if all.contains(&entry_point) {
            selected.insert(entry_point);
        }
    }

    tracing::debug!("{} publishable files in {}", selected.len(), root.display());
    Ok(selected.into_iter().collect())
}
