//! Install, update, uninstall and push, end to end.
//!
//! [`Linker`] ties the pieces together for one project: it resolves a
//! version from the store, materializes it, resolves dependency conflicts,
//! replaces nested duplicates and keeps the lockfile and the store's usage
//! index in step. A push re-runs [`Linker::update`] in every project that
//! uses the package, each with its own [`Runtime`].

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use strsim::levenshtein;

use crate::config::Runtime;
use crate::constants::{DEFAULT_BUILD_SCRIPT, LATEST};
use crate::core::NlmError;
use crate::deps::{self, PackageManagerCommand};
use crate::installer::{CopyOutcome, install_to_project, push_to_store};
use crate::lockfile::{LockEntry, ProjectLock};
use crate::manifest::{PackageManifest, PackageSpec, read_manifest};
use crate::nested::replace_nested;
use crate::pack::publishable_files;
use crate::store::Store;
use crate::utils::fs::{remove_dir_if_empty, remove_path};
use crate::version::{ResolvedVersion, resolve, sort_versions_desc};

/// Maximum edit distance, as a percentage of the name length, for "did you
/// mean" suggestions.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub name: String,
    pub version: String,
    /// Specifier written to the lockfile.
    pub requested: String,
    pub changed: bool,
    pub had_conflicts: bool,
    pub nested_replaced: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub name: String,
    pub version: String,
    pub changed: bool,
    pub nested_replaced: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PushOptions {
    /// Package script to run before collecting files. Without one, `build`
    /// runs when the package defines it.
    pub build_script: Option<String>,
    /// Skip the build step entirely.
    pub skip_build: bool,
}

impl PushOptions {
    /// The script a push of `manifest` runs, if any.
    #[must_use]
    pub fn script_for(&self, manifest: &PackageManifest) -> Option<String> {
        if self.skip_build {
            return None;
        }
        self.build_script.clone().or_else(|| {
            manifest
                .scripts
                .contains_key(DEFAULT_BUILD_SCRIPT)
                .then(|| DEFAULT_BUILD_SCRIPT.to_string())
        })
    }
}

/// What happened to one dependent project during a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshStatus {
    Updated(UpdateOutcome),
    /// The project is gone or no longer locks the package.
    Pruned,
    /// The locked specifier matches none of the stored versions.
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRefresh {
    pub project: PathBuf,
    pub status: RefreshStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    pub name: String,
    pub version: String,
    pub files: usize,
    pub changed: bool,
    /// Script run before publishing.
    pub built_with: Option<String>,
    pub refreshed: Vec<ProjectRefresh>,
}

impl PushOutcome {
    #[must_use]
    pub fn failures(&self) -> usize {
        self.refreshed
            .iter()
            .filter(|r| matches!(r.status, RefreshStatus::Failed(_)))
            .count()
    }
}

pub struct Linker<'a> {
    ctx: &'a Runtime,
    store: Store,
    lock: ProjectLock,
}

impl<'a> Linker<'a> {
    #[must_use]
    pub fn new(ctx: &'a Runtime) -> Self {
        Self {
            ctx,
            store: ctx.store(),
            lock: ProjectLock::new(&ctx.working_dir),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn lock(&self) -> &ProjectLock {
        &self.lock
    }

    /// Fail with [`NlmError::InvalidProject`] outside an npm project.
    pub fn ensure_project(&self) -> Result<()> {
        if self.ctx.is_valid_project() {
            Ok(())
        } else {
            Err(NlmError::InvalidProject {
                path: self.ctx.working_dir.display().to_string(),
            }
            .into())
        }
    }

    /// A bare name that is already locked is refreshed rather than
    /// installed, keeping its locked specifier.
    pub fn should_update(&self, spec: &PackageSpec) -> Result<bool> {
        Ok(spec.version.is_none() && self.lock.has(&spec.name)?)
    }

    pub async fn install(&self, input: &str) -> Result<InstallOutcome> {
        let spec = PackageSpec::parse(input)?;
        self.ensure_in_store(&spec.name)?;

        let resolved = self.resolve_version(&spec.name, spec.version.as_deref())?;
        tracing::debug!("Resolved {spec} to {} ({:?})", resolved.version, resolved.kind);

        let (copy, had_conflicts, nested_replaced) =
            self.materialize(&spec.name, &resolved.version).await?;

        let requested = spec.version.clone().unwrap_or_else(|| LATEST.to_string());
        self.lock.set(
            &spec.name,
            LockEntry {
                version: requested.clone(),
                signature: copy.signature,
            },
        )?;
        self.store.record_usage(&spec.name, &self.ctx.working_dir).await?;

        Ok(InstallOutcome {
            name: spec.name,
            version: resolved.version,
            requested,
            changed: copy.changed,
            had_conflicts,
            nested_replaced,
        })
    }

    /// Re-resolve the locked specifier of `name` and refresh the project.
    pub async fn update(&self, name: &str) -> Result<UpdateOutcome> {
        let entry = self.lock.get(name)?.ok_or_else(|| NlmError::NotInstalled {
            name: name.to_string(),
        })?;
        self.ensure_in_store(name)?;

        let resolved = self.resolve_version(name, Some(&entry.version))?;
        let (copy, _, nested_replaced) = self.materialize(name, &resolved.version).await?;

        self.lock.set(
            name,
            LockEntry {
                version: entry.version,
                signature: copy.signature,
            },
        )?;
        self.store.record_usage(name, &self.ctx.working_dir).await?;

        Ok(UpdateOutcome {
            name: name.to_string(),
            version: resolved.version,
            changed: copy.changed,
            nested_replaced,
        })
    }

    pub async fn uninstall(&self, name: &str) -> Result<()> {
        if !self.lock.has(name)? {
            return Err(NlmError::NotInstalled {
                name: name.to_string(),
            }
            .into());
        }

        let link = self.ctx.link_path(name);
        let private_dir = self.ctx.private_dir(name);
        remove_path(&link)?;
        remove_path(&private_dir)?;

        // `@scope/` directories left empty by the last scoped package
        if name.starts_with('@') {
            for dir in [link.parent(), private_dir.parent()].into_iter().flatten() {
                remove_dir_if_empty(dir)?;
            }
        }

        self.lock.remove(name)?;
        remove_dir_if_empty(&self.ctx.nlm_dir())?;
        self.store.remove_usage(name, &self.ctx.working_dir).await?;

        tracing::debug!("Uninstalled {name} from {}", self.ctx.working_dir.display());
        Ok(())
    }

    /// Publish the package in the working directory and refresh every
    /// project using it.
    pub async fn push(&self, options: &PushOptions) -> Result<PushOutcome> {
        let source = &self.ctx.working_dir;
        let manifest = read_manifest(source).ok_or_else(|| NlmError::InvalidPackage {
            path: source.display().to_string(),
        })?;

        let build_script = options.script_for(&manifest);
        if let Some(script) = &build_script {
            run_build_script(&self.ctx.package_manager(), script, source).await?;
        }

        let files = publishable_files(source, &manifest)?;
        let copy = push_to_store(&self.store, source, &manifest, &files, self.ctx.force).await?;
        self.store.record_push(&manifest.name, source).await?;

        let mut outcome = PushOutcome {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            files: files.len(),
            changed: copy.changed,
            built_with: build_script,
            refreshed: Vec::new(),
        };
        if !copy.changed {
            return Ok(outcome);
        }

        let users = self.store.entry(&manifest.name)?.map(|e| e.used_by).unwrap_or_default();
        for project in users {
            let project = PathBuf::from(project);
            let status = self.refresh_project(&manifest.name, &project).await;
            outcome.refreshed.push(ProjectRefresh {
                project,
                status,
            });
        }

        Ok(outcome)
    }

    async fn refresh_project(&self, name: &str, project: &Path) -> RefreshStatus {
        let locked = if project.is_dir() {
            ProjectLock::new(project).has(name)
        } else {
            Ok(false)
        };

        match locked {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("Pruning {} from users of {name}", project.display());
                return match self.store.remove_usage(name, project).await {
                    Ok(()) => RefreshStatus::Pruned,
                    Err(e) => RefreshStatus::Failed(format!("{e:#}")),
                };
            }
            Err(e) => return RefreshStatus::Failed(format!("{e:#}")),
        }

        let ctx = match self.ctx.for_project(project).await {
            Ok(ctx) => ctx,
            Err(e) => return RefreshStatus::Failed(format!("{e:#}")),
        };

        match Linker::new(&ctx).update(name).await {
            Ok(update) => RefreshStatus::Updated(update),
            Err(e) => {
                if let Some(NlmError::NoMatchingVersion { .. }) = e.downcast_ref::<NlmError>() {
                    tracing::warn!("Skipping {}: {e}", project.display());
                    RefreshStatus::Skipped(e.to_string())
                } else {
                    tracing::warn!("Failed to update {name} in {}: {e:#}", project.display());
                    RefreshStatus::Failed(format!("{e:#}"))
                }
            }
        }
    }

    async fn materialize(&self, name: &str, version: &str) -> Result<(CopyOutcome, bool, usize)> {
        let copy = install_to_project(self.ctx, &self.store, name, version).await?;
        let had_conflicts = deps::check_and_resolve(self.ctx, name).await?;
        let private_dir = self.ctx.private_dir(name);
        let nested_replaced = replace_nested(&self.ctx.working_dir, name, &private_dir)?;
        Ok((copy, had_conflicts, nested_replaced))
    }

    fn resolve_version(&self, name: &str, requested: Option<&str>) -> Result<ResolvedVersion> {
        let available = self.store.list_versions(name);
        resolve(requested, &available).ok_or_else(|| {
            let mut available = available;
            sort_versions_desc(&mut available);
            NlmError::NoMatchingVersion {
                name: name.to_string(),
                requested: requested.unwrap_or(LATEST).to_string(),
                available,
            }
            .into()
        })
    }

    fn ensure_in_store(&self, name: &str) -> Result<()> {
        if self.store.exists(name) {
            return Ok(());
        }

        let error = anyhow::Error::from(NlmError::PackageNotInStore {
            name: name.to_string(),
        });
        let similar = self.similar_packages(name);
        if similar.is_empty() {
            Err(error)
        } else {
            Err(error.context(format!("Did you mean: {}?", similar.join(", "))))
        }
    }

    /// Up to three stored package names close to `name`.
    fn similar_packages(&self, name: &str) -> Vec<String> {
        let Ok(packages) = self.store.list_packages() else {
            return Vec::new();
        };

        let mut scored: Vec<_> =
            packages.into_iter().map(|p| (levenshtein(name, &p), p)).collect();
        scored.sort();

        scored
            .into_iter()
            .filter(|(distance, _)| *distance <= name.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
            .take(3)
            .map(|(_, package)| package)
            .collect()
    }
}

async fn run_build_script(package_manager: &str, script: &str, dir: &Path) -> Result<()> {
    tracing::info!("Running build script '{script}'");
    let result = PackageManagerCommand::run_script(package_manager, script)
        .current_dir(dir)
        .execute()
        .await;

    match result {
        Ok(()) => Ok(()),
        Err(e) => match e.downcast::<NlmError>() {
            Ok(NlmError::DependencyInstallFailed { status, .. }) => Err(NlmError::BuildScriptFailed {
                script: script.to_string(),
                status,
            }
            .into()),
            Ok(other) => Err(other.into()),
            Err(e) => Err(e).with_context(|| format!("Failed to run build script '{script}'")),
        },
    }
}
