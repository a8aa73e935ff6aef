//! Failures surface as `error:` lines on stderr with exit code 1.

use predicates::prelude::*;
use serde_json::json;

use crate::common::Workspace;

#[test]
fn test_install_outside_project() {
    let ws = Workspace::new();
    let lib = ws.package("my-lib", "my-lib", "1.0.0");
    ws.push(&lib);
    let dir = ws.store_dir().parent().unwrap().join("not-a-project");
    std::fs::create_dir_all(&dir).unwrap();

    ws.nlm(&dir)
        .args(["install", "my-lib"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Not a valid project directory"));
}

#[test]
fn test_install_unknown_package_suggests_similar() {
    let ws = Workspace::new();
    ws.push(&ws.package("my-lib", "my-lib", "1.0.0"));
    let app = ws.project("app");

    ws.nlm(app.path())
        .args(["install", "my-lob"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Package 'my-lob' is not in the store"))
        .stderr(predicate::str::contains("Did you mean: my-lib?"))
        .stderr(predicate::str::contains("nlm push"));
}

#[test]
fn test_install_without_matching_version() {
    let ws = Workspace::new();
    ws.push(&ws.package("my-lib", "my-lib", "1.0.0"));
    let app = ws.project("app");

    ws.nlm(app.path())
        .args(["install", "my-lib@^9.0.0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No version of 'my-lib' matches '^9.0.0'"))
        .stderr(predicate::str::contains("Available versions: 1.0.0"));

    assert!(!app.path().join(".nlm/nlm-lock.json").exists());
}

#[test]
fn test_invalid_package_name() {
    let ws = Workspace::new();
    let app = ws.project("app");

    ws.nlm(app.path())
        .args(["install", "../escape"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid package name"));
}

#[test]
fn test_push_without_manifest() {
    let ws = Workspace::new();
    let dir = ws.store_dir().parent().unwrap().join("empty");
    std::fs::create_dir_all(&dir).unwrap();

    ws.nlm(&dir)
        .arg("push")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No valid package.json"));
}

#[test]
fn test_push_with_missing_package_manager() {
    let ws = Workspace::new();
    let lib = ws.package("my-lib", "my-lib", "1.0.0");

    ws.nlm(lib.path())
        .args(["--package-manager", "definitely-not-a-package-manager", "push", "-b", "build"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not installed or not found in PATH"));

    assert!(!ws.store_dir().join("packages/my-lib").exists());
}

#[test]
fn test_corrupt_lockfile() {
    let ws = Workspace::new();
    let app = ws.project("app");
    app.write(".nlm/nlm-lock.json", "{ not json").unwrap();

    ws.nlm(app.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid lockfile syntax"));
}

#[test]
fn test_update_not_installed() {
    let ws = Workspace::new();
    let app = ws.project("app");
    app.write_manifest(&json!({"name": "app", "version": "1.0.0"})).unwrap();

    ws.nlm(app.path())
        .args(["update", "my-lib"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Package 'my-lib' is not installed in this project"));
}

#[test]
fn test_config_rejects_bad_values() {
    let ws = Workspace::new();
    let app = ws.project("app");

    ws.nlm(app.path())
        .args(["config", "set", "lang", "fr"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported language 'fr'"));

    ws.nlm(app.path())
        .args(["config", "get", "colour"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown configuration key 'colour'"));
}
