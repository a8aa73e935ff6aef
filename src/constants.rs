//! File names, directory names and limits shared across nlm.
//!
//! The on-disk layout of the store and of a project's private directory is
//! defined here so that every component agrees on it.

/// Directory name of the store under the home directory (`~/.nlm`).
pub const STORE_DIR_NAME: &str = ".nlm";

/// Directory name of the store under `%LOCALAPPDATA%` on Windows.
pub const WINDOWS_STORE_DIR_NAME: &str = "nlm";

/// Environment variable that overrides the store location.
pub const STORE_DIR_ENV: &str = "NLM_STORE_DIR";

/// Subdirectory of the store that holds `<name>/<version>/` trees.
pub const STORE_PACKAGES_DIR: &str = "packages";

/// Store index mapping package names to `{target, usedBy}`.
pub const STORE_INDEX_FILE: &str = "nlm-store.json";

/// Advisory lock guarding read-modify-write of the store index.
pub const STORE_LOCK_FILE: &str = ".nlm-store.lock";

/// Private directory inside a project holding package copies.
pub const PROJECT_NLM_DIR: &str = ".nlm";

/// Per-project lockfile, stored inside [`PROJECT_NLM_DIR`].
pub const LOCKFILE_NAME: &str = "nlm-lock.json";

/// Configuration file name, global (store root) and per project.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Signature sidecar written next to every stored and installed package.
pub const SIGNATURE_FILE_NAME: &str = "nlm.sig";

/// Package descriptor file name.
pub const MANIFEST_FILE_NAME: &str = "package.json";

pub const NODE_MODULES: &str = "node_modules";

/// Specifier recorded in the lockfile when no version was requested.
pub const LATEST: &str = "latest";

pub const DEFAULT_PACKAGE_MANAGER: &str = "npm";

/// Script `push` runs when the package defines it and no `-b` was given.
pub const DEFAULT_BUILD_SCRIPT: &str = "build";

/// Depth bound for the nested duplicate walk.
pub const MAX_NESTED_DEPTH: usize = 20;

/// Directory names never descended into while looking for nested copies.
pub const NESTED_SKIP_DIRS: &[&str] = &[".bin", "@types", ".cache", ".pnpm"];

/// Disables spinners when set.
pub const NO_PROGRESS_ENV: &str = "NLM_NO_PROGRESS";
