//! Keeps the project's private `.nlm` directory out of version control.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::constants::PROJECT_NLM_DIR;
use crate::pack::IgnoreRules;

/// Make sure `<project>/.gitignore` ignores `.nlm`.
///
/// Returns whether `.nlm` is ignored afterwards. A project without a
/// `.gitignore` only gets a warning; write failures are warnings too.
pub fn ensure_gitignore_has_nlm(project: &Path) -> bool {
    let path = project.join(".gitignore");
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => {
            tracing::warn!(
                "No .gitignore in {}; add '{}' to it to keep linked packages out of version control",
                project.display(),
                PROJECT_NLM_DIR
            );
            return false;
        }
    };

    if IgnoreRules::parse(&content).is_ignored(PROJECT_NLM_DIR, true) {
        return true;
    }

    let mut addition = String::new();
    if !content.is_empty() && !content.ends_with('\n') {
        addition.push('\n');
    }
    addition.push_str(PROJECT_NLM_DIR);
    addition.push('\n');

    let result = OpenOptions::new()
        .append(true)
        .open(&path)
        .and_then(|mut file| file.write_all(addition.as_bytes()));

    match result {
        Ok(()) => {
            tracing::info!("Added '{}' to {}", PROJECT_NLM_DIR, path.display());
            true
        }
        Err(e) => {
            tracing::warn!("Failed to update {}: {}", path.display(), e);
            false
        }
    }
}
