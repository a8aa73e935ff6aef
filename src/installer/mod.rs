//! Moving package content between source, store and project.
//!
//! ```text
//!  source dir ──push_to_store──▶ <store>/packages/<name>/<version>/
//!                                         │
//!                              install_to_project (hard links)
//!                                         ▼
//!                         <project>/.nlm/<name>/ ◀── node_modules/<name> (symlink)
//! ```
//!
//! Both directions short-circuit when the destination already carries the
//! source's signature, unless `--force` was given.

pub mod gitignore;
pub mod link;

use anyhow::{Context, Result};
use futures::future::try_join_all;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub use gitignore::ensure_gitignore_has_nlm;
pub use link::{ensure_symlink, is_linked_to};

use crate::config::Runtime;
use crate::core::NlmError;
use crate::manifest::PackageManifest;
use crate::signature::{compute_signature, read_signature, signatures_match, write_signature};
use crate::store::Store;
use crate::utils::fs::{atomic_write, ensure_dir, ensure_parent_dir, remove_path};

/// Result of a copy step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyOutcome {
    pub signature: String,
    /// `false` when the destination was already up to date.
    pub changed: bool,
}

/// Publish `files` (relative to `source`) as `manifest.name@manifest.version`.
pub async fn push_to_store(
    store: &Store,
    source: &Path,
    manifest: &PackageManifest,
    files: &[String],
    force: bool,
) -> Result<CopyOutcome> {
    if files.is_empty() {
        return Err(NlmError::NoFilesToPublish {
            name: manifest.name.clone(),
        }
        .into());
    }

    let signature = compute_signature(files, source).await?;
    let destination = store.package_dir(&manifest.name, &manifest.version);

    if !force && destination.is_dir() && signatures_match(&read_signature(&destination), &signature)
    {
        tracing::debug!("{}@{} unchanged in store", manifest.name, manifest.version);
        return Ok(CopyOutcome {
            signature,
            changed: false,
        });
    }

    remove_path(&destination)?;
    ensure_dir(&destination)?;
    copy_grouped(source, &destination, files).await.with_context(|| {
        format!("Failed to copy {}@{} into the store", manifest.name, manifest.version)
    })?;
    write_signature(&destination, &signature)?;

    tracing::debug!(
        "Stored {} files of {}@{} ({})",
        files.len(),
        manifest.name,
        manifest.version,
        destination.display()
    );

    Ok(CopyOutcome {
        signature,
        changed: true,
    })
}

/// Copy exactly `files`, one blocking task per top-level entry.
async fn copy_grouped(source: &Path, destination: &Path, files: &[String]) -> Result<()> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for file in files {
        let top = file.split('/').next().unwrap_or(file).to_string();
        groups.entry(top).or_default().push(file.clone());
    }

    let tasks = groups.into_values().map(|group| {
        let source = source.to_path_buf();
        let destination = destination.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<()> {
            for file in &group {
                let from = source.join(file);
                let to = destination.join(file);
                ensure_parent_dir(&to)?;
                std::fs::copy(&from, &to).with_context(|| {
                    format!("Failed to copy {} to {}", from.display(), to.display())
                })?;
            }
            Ok(())
        })
    });

    for result in try_join_all(tasks).await.context("Failed to join copy tasks")? {
        result?;
    }
    Ok(())
}

/// Materialize `name@version` from the store into the project of `ctx`.
pub async fn install_to_project(
    ctx: &Runtime,
    store: &Store,
    name: &str,
    version: &str,
) -> Result<CopyOutcome> {
    let source = store.package_dir(name, version);
    if !source.is_dir() {
        return Err(NlmError::PackageNotInStore {
            name: format!("{name}@{version}"),
        }
        .into());
    }

    ensure_gitignore_has_nlm(&ctx.working_dir);

    let private_dir = ctx.private_dir(name);
    let link = ctx.link_path(name);
    let signature = read_signature(&source);

    if !ctx.force
        && private_dir.is_dir()
        && signatures_match(&read_signature(&private_dir), &signature)
    {
        ensure_symlink(&private_dir, &link)?;
        tracing::debug!("{name}@{version} already up to date in {}", ctx.working_dir.display());
        return Ok(CopyOutcome {
            signature,
            changed: false,
        });
    }

    remove_path(&private_dir)?;
    let (from, to) = (source.clone(), private_dir.clone());
    tokio::task::spawn_blocking(move || copy_with_hardlinks(&from, &to))
        .await
        .context("Failed to join copy task")?
        .with_context(|| format!("Failed to copy {name}@{version} into the project"))?;
    ensure_symlink(&private_dir, &link)?;

    Ok(CopyOutcome {
        signature,
        changed: true,
    })
}

/// Recreate `source` at `destination`, hard-linking files where the file
/// system allows and copying otherwise. Symlinks are recreated as symlinks.
pub fn copy_with_hardlinks(source: &Path, destination: &Path) -> Result<()> {
    ensure_dir(destination)?;

    for entry in WalkDir::new(source).min_depth(1).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to walk {}", source.display()))?;
        let relative = entry.path().strip_prefix(source)?;
        let target: PathBuf = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            ensure_dir(&target)?;
        } else if file_type.is_symlink() {
            let pointee = std::fs::read_link(entry.path())?;
            ensure_parent_dir(&target)?;
            crate::utils::platform::create_dir_symlink(&pointee, &target)
                .or_else(|_| std::fs::copy(entry.path(), &target).map(|_| ()))
                .with_context(|| format!("Failed to recreate link {}", target.display()))?;
        } else {
            ensure_parent_dir(&target)?;
            if let Err(e) = std::fs::hard_link(entry.path(), &target) {
                tracing::trace!("Hard link failed for {} ({e}), copying", target.display());
                std::fs::copy(entry.path(), &target).with_context(|| {
                    format!("Failed to copy {} to {}", entry.path().display(), target.display())
                })?;
            }
        }
    }
    Ok(())
}

/// Replace `path` with an independent copy of its content, so writes through
/// it no longer reach a store file it may be hard-linked to.
pub fn detach_file(path: &Path) -> Result<()> {
    let content =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    atomic_write(path, &content)
}
