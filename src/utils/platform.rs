//! Platform-specific paths and link creation.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::constants::{STORE_DIR_ENV, STORE_DIR_NAME, WINDOWS_STORE_DIR_NAME};

#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Expand `~` and environment variables in a user-supplied path.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .with_context(|| format!("Failed to expand environment variables in: {path}"))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Root of the machine-wide store.
///
/// `$NLM_STORE_DIR` wins; otherwise `%LOCALAPPDATA%\nlm` on Windows and
/// `~/.nlm` elsewhere.
pub fn default_store_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(STORE_DIR_ENV) {
        if !dir.trim().is_empty() {
            return resolve_path(dir.trim());
        }
    }

    if is_windows() {
        let local = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?;
        Ok(local.join(WINDOWS_STORE_DIR_NAME))
    } else {
        Ok(get_home_dir()?.join(STORE_DIR_NAME))
    }
}

/// Create a directory symlink at `link` whose content is `target` verbatim.
#[cfg(unix)]
pub fn create_dir_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

/// Create a directory symlink at `link` whose content is `target` verbatim.
#[cfg(windows)]
pub fn create_dir_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

/// Absolute form of `path` without requiring it to exist.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_store_dir_env_override() {
        let temp = tempfile::tempdir().unwrap();
        // SAFETY: serialized with the other env-touching tests
        unsafe { std::env::set_var(STORE_DIR_ENV, temp.path()) };
        let dir = default_store_dir().unwrap();
        unsafe { std::env::remove_var(STORE_DIR_ENV) };

        assert_eq!(dir, temp.path());
    }

    #[test]
    #[serial]
    fn test_store_dir_default_location() {
        unsafe { std::env::remove_var(STORE_DIR_ENV) };
        let dir = default_store_dir().unwrap();
        if is_windows() {
            assert!(dir.ends_with(WINDOWS_STORE_DIR_NAME));
        } else {
            assert!(dir.ends_with(STORE_DIR_NAME));
        }
    }

    #[test]
    fn test_resolve_path_expands_tilde() {
        let home = get_home_dir().unwrap();
        assert_eq!(resolve_path("~/store").unwrap(), home.join("store"));
    }

    #[test]
    fn test_absolutize_keeps_absolute() {
        let temp = tempfile::tempdir().unwrap();
        assert_eq!(absolutize(temp.path()).unwrap(), temp.path());
    }
}
