//! Advisory lock serializing updates of the store index.
//!
//! Concurrent `nlm` processes (a push fanning out while another project
//! installs) would otherwise lose `usedBy` updates to last-writer-wins.
//! The lock is held for one read-modify-write of the index and released on
//! drop.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::constants::STORE_LOCK_FILE;

pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Block until the exclusive lock on the store at `store_dir` is held.
    pub async fn acquire(store_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(store_dir).await.with_context(|| {
            format!("Failed to create store directory: {}", store_dir.display())
        })?;

        let lock_path = store_dir.join(STORE_LOCK_FILE);
        let lock_path_clone = lock_path.clone();

        let file = tokio::task::spawn_blocking(move || -> Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path_clone)
                .with_context(|| {
                    format!("Failed to open lock file: {}", lock_path_clone.display())
                })?;

            file.lock_exclusive().with_context(|| {
                format!("Failed to acquire store lock: {}", lock_path_clone.display())
            })?;

            Ok(file)
        })
        .await
        .context("Failed to spawn blocking task for lock acquisition")??;

        tracing::trace!("Acquired store lock {}", lock_path.display());

        Ok(Self {
            file,
            path: lock_path,
        })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        #[allow(unstable_name_collisions)]
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to unlock {}: {}", self.path.display(), e);
        }
    }
}
