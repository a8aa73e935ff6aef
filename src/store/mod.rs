//! The machine-wide package store.
//!
//! # Layout
//!
//! ```text
//! <store>/
//! ├── nlm-store.json            # index: name -> { target, usedBy, pushedAt }
//! ├── config.toml               # global configuration
//! └── packages/
//!     ├── my-lib/1.0.0/         # publishable files + nlm.sig
//!     └── @scope/ui/2.3.1/      # scoped names are two levels deep
//! ```
//!
//! Version directories are the source of truth for which versions exist;
//! the index only records where each package was pushed from and which
//! projects use it. Index updates are serialized by [`StoreLock`].

pub mod lock;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

pub use lock::StoreLock;

use crate::constants::{CONFIG_FILE_NAME, STORE_INDEX_FILE, STORE_PACKAGES_DIR};
use crate::core::NlmError;
use crate::signature::read_signature;
use crate::utils::fs::write_json_file;

/// Index record for one package name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreEntry {
    /// Source directory the package was last pushed from.
    pub target: String,

    /// Projects that currently have the package installed.
    #[serde(default)]
    pub used_by: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pushed_at: Option<DateTime<Utc>>,
}

pub type StoreIndex = BTreeMap<String, StoreEntry>;

#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.root.join(STORE_INDEX_FILE)
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    #[must_use]
    pub fn packages_dir(&self) -> PathBuf {
        self.root.join(STORE_PACKAGES_DIR)
    }

    #[must_use]
    pub fn package_root(&self, name: &str) -> PathBuf {
        self.packages_dir().join(name)
    }

    #[must_use]
    pub fn package_dir(&self, name: &str, version: &str) -> PathBuf {
        self.package_root(name).join(version)
    }

    /// Whether at least one version of `name` has been pushed.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        !self.list_versions(name).is_empty()
    }

    #[must_use]
    pub fn version_exists(&self, name: &str, version: &str) -> bool {
        self.package_dir(name, version).is_dir()
    }

    /// Stored versions of `name`, in directory order.
    #[must_use]
    pub fn list_versions(&self, name: &str) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.package_root(name)) else {
            return Vec::new();
        };

        entries
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect()
    }

    /// Signature of a stored version, `""` when absent.
    #[must_use]
    pub fn signature(&self, name: &str, version: &str) -> String {
        read_signature(&self.package_dir(name, version))
    }

    /// Read the index. A missing index is empty; a corrupt one is an error.
    pub fn load_index(&self) -> Result<StoreIndex> {
        let path = self.index_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(StoreIndex::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read store index: {}", path.display()));
            }
        };

        if content.trim().is_empty() {
            return Ok(StoreIndex::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            NlmError::StoreIndexParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Names of every package ever pushed, sorted.
    pub fn list_packages(&self) -> Result<Vec<String>> {
        Ok(self.load_index()?.into_keys().collect())
    }

    pub fn entry(&self, name: &str) -> Result<Option<StoreEntry>> {
        Ok(self.load_index()?.remove(name))
    }

    /// Record that `name` was pushed from `target`. `usedBy` is untouched.
    pub async fn record_push(&self, name: &str, target: &Path) -> Result<()> {
        let target = target.display().to_string();
        self.update_index(|index| {
            let entry = index.entry(name.to_string()).or_default();
            entry.target = target;
            entry.pushed_at = Some(Utc::now());
        })
        .await
    }

    /// Add `project` to the users of `name`. Idempotent.
    pub async fn record_usage(&self, name: &str, project: &Path) -> Result<()> {
        let project = project.display().to_string();
        self.update_index(|index| {
            index.entry(name.to_string()).or_default().used_by.insert(project);
        })
        .await
    }

    /// Remove `project` from the users of `name`. Idempotent.
    pub async fn remove_usage(&self, name: &str, project: &Path) -> Result<()> {
        let project = project.display().to_string();
        self.update_index(|index| {
            if let Some(entry) = index.get_mut(name) {
                entry.used_by.remove(&project);
            }
        })
        .await
    }

    async fn update_index(&self, apply: impl FnOnce(&mut StoreIndex)) -> Result<()> {
        let _lock = StoreLock::acquire(&self.root).await?;

        let mut index = self.load_index()?;
        apply(&mut index);
        write_json_file(&self.index_path(), &index)
            .with_context(|| format!("Failed to write store index: {}", self.index_path().display()))
    }
}
