//! Per-project lockfile (`.nlm/nlm-lock.json`).
//!
//! Records, for every package linked into a project, the specifier the user
//! asked for and the signature of the copy that was installed:
//!
//! ```json
//! {
//!   "packages": {
//!     "my-lib": { "version": "^1.0.0", "signature": "3f1c..." }
//!   }
//! }
//! ```
//!
//! `version` keeps the request (`"1.2.3"`, `"^1.0.0"` or `"latest"`), not
//! the resolved version, so `nlm update` re-resolves against the store each
//! time. Every write rewrites the whole document; removing the last entry
//! deletes the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::constants::{LOCKFILE_NAME, PROJECT_NLM_DIR};
use crate::core::NlmError;
use crate::utils::fs::{remove_path, write_json_file};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    /// Specifier as requested by the user.
    pub version: String,
    pub signature: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFile {
    #[serde(default)]
    pub packages: BTreeMap<String, LockEntry>,
}

impl LockFile {
    /// Load from `path`; a missing file is an empty lockfile.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!(
                        "Failed to read lockfile: {}\n\n\
                        Check that the file is readable by the current user",
                        path.display()
                    )
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content).map_err(|e| {
            NlmError::LockfileParse {
                file: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Persist to `path`, deleting the file when no packages remain.
    pub fn save(&self, path: &Path) -> Result<()> {
        if self.packages.is_empty() {
            return remove_path(path);
        }
        write_json_file(path, self)
            .with_context(|| format!("Failed to write lockfile: {}", path.display()))
    }
}

/// The lockfile of one project, read and written whole on every call.
#[derive(Debug, Clone)]
pub struct ProjectLock {
    path: PathBuf,
}

impl ProjectLock {
    pub fn new(project_dir: &Path) -> Self {
        Self {
            path: project_dir.join(PROJECT_NLM_DIR).join(LOCKFILE_NAME),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<LockFile> {
        LockFile::load(&self.path)
    }

    pub fn get(&self, name: &str) -> Result<Option<LockEntry>> {
        Ok(self.load()?.packages.remove(name))
    }

    pub fn has(&self, name: &str) -> Result<bool> {
        Ok(self.load()?.packages.contains_key(name))
    }

    pub fn list_names(&self) -> Result<Vec<String>> {
        Ok(self.load()?.packages.into_keys().collect())
    }

    pub fn set(&self, name: &str, entry: LockEntry) -> Result<()> {
        let mut lock = self.load()?;
        lock.packages.insert(name.to_string(), entry);
        lock.save(&self.path)
    }

    /// Remove `name`; returns whether it was present.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let mut lock = self.load()?;
        let removed = lock.packages.remove(name).is_some();
        if removed {
            lock.save(&self.path)?;
        }
        Ok(removed)
    }
}
