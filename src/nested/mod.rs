//! Replacing nested duplicates of a linked package.
//!
//! Other dependencies may carry their own copy of a package under
//! `node_modules/<dep>/node_modules/<name>`. Those copies are swapped for
//! symlinks to the project's private copy so every import resolves to the
//! same instance.

use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::constants::{MAX_NESTED_DEPTH, NESTED_SKIP_DIRS, NODE_MODULES};
use crate::installer::{ensure_symlink, is_linked_to};
use crate::utils::fs::remove_path;

struct Frame {
    dir: PathBuf,
    depth: usize,
    /// `dir` is a `node_modules` directory whose children are packages.
    is_dependency_dir: bool,
}

/// Every copy of `package_name` below `<project>/node_modules`, excluding
/// the top-level one.
#[must_use]
pub fn find_nested_occurrences(project_root: &Path, package_name: &str) -> Vec<PathBuf> {
    let root = project_root.join(NODE_MODULES);
    let top_level = root.join(package_name);

    let mut occurrences = Vec::new();
    let mut found: HashSet<PathBuf> = HashSet::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut stack = vec![Frame {
        dir: root,
        depth: 0,
        is_dependency_dir: true,
    }];

    while let Some(frame) = stack.pop() {
        if frame.depth > MAX_NESTED_DEPTH || !visited.insert(frame.dir.clone()) {
            continue;
        }

        if frame.is_dependency_dir {
            let candidate = frame.dir.join(package_name);
            if candidate != top_level && std::fs::symlink_metadata(&candidate).is_ok() {
                tracing::trace!("Nested copy at {}", candidate.display());
                found.insert(candidate.clone());
                occurrences.push(candidate);
            }
        }

        let entries = match std::fs::read_dir(&frame.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Skipping {}: {e}", frame.dir.display());
                continue;
            }
        };

        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_symlink() || !file_type.is_dir() {
                continue;
            }
            let name = entry.file_name();
            if NESTED_SKIP_DIRS.iter().any(|skip| name == *skip) {
                continue;
            }
            let child = entry.path();
            if child == top_level || found.contains(&child) {
                continue;
            }

            let nested = child.join(NODE_MODULES);
            if nested.is_dir() {
                stack.push(Frame {
                    dir: nested,
                    depth: frame.depth + 1,
                    is_dependency_dir: true,
                });
            } else {
                stack.push(Frame {
                    dir: child,
                    depth: frame.depth + 1,
                    is_dependency_dir: false,
                });
            }
        }
    }

    occurrences.sort();
    occurrences
}

/// Replace nested copies of `package_name` with links to `canonical_dir`.
///
/// Returns how many copies were replaced. Copies already linked to
/// `canonical_dir` are not counted; a copy that cannot be replaced is
/// logged and skipped.
pub fn replace_nested(project_root: &Path, package_name: &str, canonical_dir: &Path) -> Result<usize> {
    let occurrences = find_nested_occurrences(project_root, package_name);
    if occurrences.is_empty() {
        return Ok(0);
    }

    let mut replaced = 0;
    let mut failed = 0;
    for occurrence in occurrences {
        if is_linked_to(&occurrence, canonical_dir) {
            continue;
        }
        let result = remove_path(&occurrence).and_then(|()| ensure_symlink(canonical_dir, &occurrence));
        match result {
            Ok(()) => {
                tracing::debug!("Replaced nested {}", occurrence.display());
                replaced += 1;
            }
            Err(e) => {
                tracing::warn!("Failed to replace nested {}: {e:#}", occurrence.display());
                failed += 1;
            }
        }
    }

    if replaced > 0 || failed > 0 {
        tracing::info!("{package_name}: replaced {replaced} nested copies, {failed} failed");
    }
    Ok(replaced)
}
