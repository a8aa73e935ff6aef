//! Shared helpers for the integration tests.

use assert_cmd::Command;
use nlm_cli::test_utils::PackageFixture;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory holding an isolated store plus any number of
/// packages and projects.
pub struct Workspace {
    temp: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    pub fn store_dir(&self) -> PathBuf {
        self.temp.path().join("store")
    }

    pub fn package(&self, dir: &str, name: &str, version: &str) -> PackageFixture {
        PackageFixture::new(self.temp.path().join(dir), name, version).unwrap()
    }

    /// A project with a `.gitignore` so installs do not warn.
    pub fn project(&self, dir: &str) -> PackageFixture {
        let project = PackageFixture::project(self.temp.path().join(dir)).unwrap();
        project.write(".gitignore", "node_modules\n").unwrap();
        project
    }

    /// `nlm` in `dir` with this workspace's store and no spinners.
    pub fn nlm(&self, dir: &Path) -> Command {
        let mut cmd = Command::cargo_bin("nlm").unwrap();
        cmd.current_dir(dir)
            .env("NLM_STORE_DIR", self.store_dir())
            .env("NLM_NO_PROGRESS", "1")
            .env("NO_COLOR", "1")
            .env_remove("DEBUG")
            .env_remove("RUST_LOG")
            .arg("--no-progress");
        cmd
    }

    /// Push `package`, asserting success.
    pub fn push(&self, package: &PackageFixture) {
        self.nlm(package.path()).arg("push").assert().success();
    }
}

/// Whether `link` is a symlink resolving to `target`.
pub fn links_to(link: &Path, target: &Path) -> bool {
    std::fs::symlink_metadata(link).is_ok_and(|m| m.file_type().is_symlink())
        && std::fs::canonicalize(link).ok() == std::fs::canonicalize(target).ok()
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
