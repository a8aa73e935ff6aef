//! Content signatures for package file sets.
//!
//! A signature is a SHA-256 digest over every file's forward-slash relative
//! path and raw bytes. Paths are sorted first, so the result depends only on
//! the contents and names of the files: the same tree yields the same
//! signature on every platform and regardless of directory iteration order.
//!
//! Stored packages and project copies carry their signature in the
//! [`SIGNATURE_FILE_NAME`] sidecar; two copies are considered identical
//! exactly when their sidecars hold the same non-empty string.

use anyhow::{Context, Result};
use futures::future::try_join_all;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::constants::SIGNATURE_FILE_NAME;
use crate::core::NlmError;
use crate::utils::fs::atomic_write;

/// Compute the signature of `files` (relative to `base_dir`).
///
/// Files are hashed concurrently on the blocking pool; all hashes are
/// collected before combining, so the result does not depend on completion
/// order. An unreadable file fails the whole computation.
pub async fn compute_signature(files: &[String], base_dir: &Path) -> Result<String> {
    let mut sorted: Vec<String> = files.iter().map(|f| f.replace('\\', "/")).collect();
    sorted.sort();
    sorted.dedup();

    let tasks = sorted.into_iter().map(|relative| {
        let absolute = base_dir.join(&relative);
        tokio::task::spawn_blocking(move || hash_file(&relative, &absolute))
    });

    let results = try_join_all(tasks).await.context("Failed to join signature tasks")?;

    let mut combined = Sha256::new();
    for digest in results {
        combined.update(digest?.as_bytes());
    }

    Ok(hex::encode(combined.finalize()))
}

/// Hash of one file: its normalized relative path followed by its bytes.
fn hash_file(relative: &str, absolute: &Path) -> Result<String> {
    let io_error = |e: std::io::Error| NlmError::SignatureIo {
        path: absolute.display().to_string(),
        reason: e.to_string(),
    };

    let file = File::open(absolute).map_err(io_error)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    hasher.update(relative.as_bytes());
    std::io::copy(&mut reader, &mut hasher).map_err(io_error)?;

    Ok(hex::encode(hasher.finalize()))
}

/// Signature stored in `dir`'s sidecar, or `""` when absent or unreadable.
#[must_use]
pub fn read_signature(dir: &Path) -> String {
    match std::fs::read_to_string(dir.join(SIGNATURE_FILE_NAME)) {
        Ok(content) => content.trim().to_string(),
        Err(e) => {
            tracing::debug!("No signature in {}: {}", dir.display(), e);
            String::new()
        }
    }
}

/// Replace the sidecar in `dir` with `signature`.
pub fn write_signature(dir: &Path, signature: &str) -> Result<()> {
    let path = dir.join(SIGNATURE_FILE_NAME);
    atomic_write(&path, signature.as_bytes())
        .with_context(|| format!("Failed to write signature file: {}", path.display()))
}

/// Two signatures denote the same content only when equal and non-empty.
#[must_use]
pub fn signatures_match(a: &str, b: &str) -> bool {
    !a.is_empty() && a == b
}
