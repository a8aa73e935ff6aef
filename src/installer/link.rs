//! Link repair for `node_modules/<name>`.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::core::NlmError;
use crate::utils::fs::{ensure_dir, remove_path};
use crate::utils::platform::create_dir_symlink;

/// Path of `target` relative to the directory containing `link`.
fn relative_target(target: &Path, link: &Path) -> PathBuf {
    let base = link.parent().unwrap_or_else(|| Path::new(""));
    pathdiff::diff_paths(target, base).unwrap_or_else(|| target.to_path_buf())
}

/// Make `link` a relative directory symlink to `target`.
///
/// An existing link pointing at `target` (relative or absolute form) is left
/// alone. Anything else at `link` is removed first, and a missing parent
/// directory (the scope directory of a scoped package) is created.
pub fn ensure_symlink(target: &Path, link: &Path) -> Result<()> {
    let relative = relative_target(target, link);

    if let Ok(metadata) = std::fs::symlink_metadata(link) {
        if metadata.file_type().is_symlink() {
            if let Ok(current) = std::fs::read_link(link) {
                if current == relative || current == target {
                    tracing::trace!("Link {} already points at {}", link.display(), target.display());
                    return Ok(());
                }
            }
        }
        remove_path(link)?;
    }

    if let Some(parent) = link.parent() {
        ensure_dir(parent)?;
    }

    create_dir_symlink(&relative, link).map_err(|e| NlmError::LinkRepairFailed {
        path: link.display().to_string(),
        reason: e.to_string(),
    })?;

    tracing::debug!("Linked {} -> {}", link.display(), relative.display());
    Ok(())
}

/// Whether `link` is a symlink that resolves to `target`.
#[must_use]
pub fn is_linked_to(link: &Path, target: &Path) -> bool {
    let is_symlink =
        std::fs::symlink_metadata(link).is_ok_and(|metadata| metadata.file_type().is_symlink());
    if !is_symlink {
        return false;
    }
    match (std::fs::canonicalize(link), std::fs::canonicalize(target)) {
        (Ok(resolved), Ok(expected)) => resolved == expected,
        _ => false,
    }
}
