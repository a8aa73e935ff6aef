//! Test utilities for nlm
//!
//! Helpers shared by unit tests and the integration suite (through the
//! `test-utils` feature): one-time logging setup and on-disk fixtures for
//! library packages and consumer projects.
//!
//! ```rust,no_run
//! use nlm_cli::test_utils::PackageFixture;
//!
//! let temp = tempfile::tempdir().unwrap();
//! let lib = PackageFixture::new(temp.path().join("lib"), "my-lib", "1.0.0").unwrap();
//! let app = PackageFixture::project(temp.path().join("app")).unwrap();
//! ```

use anyhow::{Context, Result};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::manifest::PackageManifest;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; does nothing when neither
/// is set.
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A directory holding a `package.json`, either a library to push or a
/// consumer project.
#[derive(Debug, Clone)]
pub struct PackageFixture {
    root: PathBuf,
}

impl PackageFixture {
    /// A library with `package.json` and `index.js`.
    pub fn new(root: impl Into<PathBuf>, name: &str, version: &str) -> Result<Self> {
        let fixture = Self {
            root: root.into(),
        };
        fixture.write_manifest(&json!({
            "name": name,
            "version": version,
            "main": "index.js",
        }))?;
        fixture.write("index.js", &format!("module.exports = '{name}@{version}';"))?;
        Ok(fixture)
    }

    /// A consumer project with `package.json` and an empty `node_modules`.
    pub fn project(root: impl Into<PathBuf>) -> Result<Self> {
        let fixture = Self {
            root: root.into(),
        };
        fixture.write_manifest(&json!({
            "name": "app",
            "version": "1.0.0",
            "private": true,
        }))?;
        std::fs::create_dir_all(fixture.root.join("node_modules"))
            .context("Failed to create node_modules")?;
        Ok(fixture)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Parsed `package.json`.
    ///
    /// # Panics
    ///
    /// When the fixture's descriptor is not valid.
    #[must_use]
    pub fn manifest(&self) -> PackageManifest {
        crate::manifest::read_manifest(&self.root).expect("fixture package.json is valid")
    }

    pub fn write(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn write_manifest(&self, manifest: &serde_json::Value) -> Result<()> {
        self.write("package.json", &serde_json::to_string_pretty(manifest)?)
    }

    /// Merge `deps` into the descriptor under `field`
    /// (`dependencies`, `peerDependencies`, `devDependencies`).
    pub fn set_dependencies(&self, field: &str, deps: &[(&str, &str)]) -> Result<()> {
        let path = self.root.join("package.json");
        let mut manifest: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        let map: BTreeMap<&str, &str> = deps.iter().copied().collect();
        manifest[field] = json!(map);
        self.write_manifest(&manifest)
    }

    /// Install a plain package directory at `node_modules/<rel>` (a nested
    /// path such as `a/node_modules/b` creates nested installs).
    pub fn add_installed(&self, relative: &str, name: &str, version: &str) -> Result<PathBuf> {
        let dir = self.root.join("node_modules").join(relative);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(
            dir.join("package.json"),
            serde_json::to_string_pretty(&json!({"name": name, "version": version}))?,
        )?;
        Ok(dir)
    }
}
