//! File system helpers.
//!
//! Every document nlm owns (store index, lockfile, signature sidecar, config)
//! is written through [`atomic_write`] so readers never observe a partially
//! written file.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Create `path` and its parents if missing.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).with_context(|| {
            let platform_help = if crate::utils::platform::is_windows() {
                "On Windows: Check that the path length is < 260 chars or that long path support is enabled"
            } else {
                "Check directory permissions and path validity"
            };

            format!("Failed to create directory: {}\n\n{}", path.display(), platform_help)
        })?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

/// Write `content` to `path` via a temp file in the same directory and a rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".nlm-tmp")
        .tempfile_in(parent)
        .with_context(|| format!("Failed to create temp file in: {}", parent.display()))?;

    temp.write_all(content)
        .with_context(|| format!("Failed to write temp file for: {}", path.display()))?;
    temp.as_file().sync_all().with_context(|| "Failed to sync file to disk")?;

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Remove whatever lives at `path`: file, symlink (without following it) or
/// directory tree. A missing path is not an error.
pub fn remove_path(path: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to inspect: {}", path.display()));
        }
    };

    let file_type = metadata.file_type();
    if file_type.is_symlink() {
        // Directory symlinks and junctions on Windows need remove_dir
        fs::remove_file(path)
            .or_else(|_| fs::remove_dir(path))
            .with_context(|| format!("Failed to remove link: {}", path.display()))?;
    } else if file_type.is_dir() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    } else {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove file: {}", path.display()))?;
    }
    Ok(())
}

/// Remove `dir` if it exists and is empty. Returns whether it was removed.
pub fn remove_dir_if_empty(dir: &Path) -> Result<bool> {
    let mut entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read directory: {}", dir.display()));
        }
    };
    if entries.next().is_some() {
        return Ok(false);
    }
    fs::remove_dir(dir).with_context(|| format!("Failed to remove directory: {}", dir.display()))?;
    Ok(true)
}

/// Forward-slash form of a relative path, identical on every platform.
#[must_use]
pub fn normalize_path_for_storage(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

pub fn read_json_file<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON from file: {}", path.display()))
}

pub fn write_json_file<T>(path: &Path, data: &T) -> Result<()>
where
    T: Serialize,
{
    let mut json = serde_json::to_string_pretty(data)
        .with_context(|| format!("Failed to serialize data for: {}", path.display()))?;
    json.push('\n');
    atomic_write(path, json.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp = tempdir().unwrap();
        let file_path = temp.path().join("a").join("b").join("doc.json");

        atomic_write(&file_path, b"{}").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "{}");
        let leftovers: Vec<_> = fs::read_dir(file_path.parent().unwrap()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_atomic_write_replaces_content() {
        let temp = tempdir().unwrap();
        let file_path = temp.path().join("doc.txt");

        atomic_write(&file_path, b"first").unwrap();
        atomic_write(&file_path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "second");
    }

    #[test]
    fn test_remove_path_missing_is_ok() {
        let temp = tempdir().unwrap();
        remove_path(&temp.path().join("nothing")).unwrap();
    }

    #[test]
    fn test_remove_path_directory_and_file() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("dir");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested/file.txt"), "x").unwrap();
        let file = temp.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        remove_path(&dir).unwrap();
        remove_path(&file).unwrap();

        assert!(!dir.exists());
        assert!(!file.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_remove_path_does_not_follow_symlink() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("target");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.txt"), "x").unwrap();
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        remove_path(&link).unwrap();

        assert!(fs::symlink_metadata(&link).is_err());
        assert!(target.join("keep.txt").exists());
    }

    #[test]
    fn test_remove_dir_if_empty() {
        let temp = tempdir().unwrap();
        let scope = temp.path().join("@scope");
        fs::create_dir_all(scope.join("pkg")).unwrap();

        assert!(!remove_dir_if_empty(&scope).unwrap());
        fs::remove_dir(scope.join("pkg")).unwrap();
        assert!(remove_dir_if_empty(&scope).unwrap());
        assert!(!scope.exists());
    }

    #[test]
    fn test_normalize_path_for_storage() {
        assert_eq!(normalize_path_for_storage(Path::new("lib\\index.js")), "lib/index.js");
        assert_eq!(normalize_path_for_storage(Path::new("lib/index.js")), "lib/index.js");
    }

    #[test]
    fn test_json_round_trip_through_atomic_write() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("data.json");
        let value = serde_json::json!({"a": [1, 2]});

        write_json_file(&path, &value).unwrap();
        let loaded: serde_json::Value = read_json_file(&path).unwrap();

        assert_eq!(loaded, value);
    }
}
