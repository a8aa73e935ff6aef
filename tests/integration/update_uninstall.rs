//! Refreshing and removing linked packages.

use predicates::prelude::*;
use serde_json::Value;

use crate::common::{Workspace, links_to, read};

#[test]
fn test_update_reports_up_to_date_and_refreshes_changes() {
    let ws = Workspace::new();
    let lib = ws.package("my-lib", "my-lib", "1.0.0");
    let app = ws.project("app");
    ws.push(&lib);
    ws.nlm(app.path()).args(["install", "my-lib"]).assert().success();

    ws.nlm(app.path())
        .arg("update")
        .assert()
        .success()
        .stdout(predicate::str::contains("my-lib@1.0.0 is up to date"));

    // Private copy edited by hand; a forced update restores it
    std::fs::remove_file(app.path().join(".nlm/my-lib/index.js")).unwrap();
    ws.nlm(app.path())
        .args(["up", "my-lib", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated my-lib@1.0.0"));
    assert!(app.path().join("node_modules/my-lib/index.js").is_file());
}

#[test]
fn test_uninstall_removes_everything_install_added() {
    let ws = Workspace::new();
    let lib = ws.package("ui", "@acme/ui", "1.0.0");
    let app = ws.project("app");
    ws.push(&lib);
    ws.nlm(app.path()).args(["install", "@acme/ui"]).assert().success();

    ws.nlm(app.path())
        .args(["uninstall", "@acme/ui"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed @acme/ui"));

    assert!(std::fs::symlink_metadata(app.path().join("node_modules/@acme/ui")).is_err());
    assert!(!app.path().join("node_modules/@acme").exists());
    assert!(!app.path().join(".nlm/@acme").exists());
    assert!(!app.path().join(".nlm/nlm-lock.json").exists());

    let index: Value = serde_json::from_str(&read(&ws.store_dir().join("nlm-store.json"))).unwrap();
    assert!(index["@acme/ui"]["usedBy"].as_array().unwrap().is_empty());
}

#[test]
fn test_uninstall_keeps_other_packages() {
    let ws = Workspace::new();
    let a = ws.package("a", "pkg-a", "1.0.0");
    let b = ws.package("b", "pkg-b", "1.0.0");
    let app = ws.project("app");
    ws.push(&a);
    ws.push(&b);
    ws.nlm(app.path()).args(["install", "pkg-a", "pkg-b"]).assert().success();

    ws.nlm(app.path()).args(["un", "pkg-a"]).assert().success();

    let lock: Value = serde_json::from_str(&read(&app.path().join(".nlm/nlm-lock.json"))).unwrap();
    assert!(lock["packages"].get("pkg-a").is_none());
    assert!(lock["packages"].get("pkg-b").is_some());
    assert!(links_to(&app.path().join("node_modules/pkg-b"), &app.path().join(".nlm/pkg-b")));
}

#[test]
fn test_uninstall_without_names_lists_packages() {
    let ws = Workspace::new();
    let lib = ws.package("my-lib", "my-lib", "1.0.0");
    let app = ws.project("app");
    ws.push(&lib);
    ws.nlm(app.path()).args(["install", "my-lib"]).assert().success();

    ws.nlm(app.path())
        .arg("uninstall")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Linked packages: my-lib"));
}

#[test]
fn test_batch_update_continues_after_failure() {
    let ws = Workspace::new();
    let lib = ws.package("my-lib", "my-lib", "1.0.0");
    let app = ws.project("app");
    ws.push(&lib);
    ws.nlm(app.path()).args(["install", "my-lib"]).assert().success();

    ws.nlm(app.path())
        .args(["update", "missing", "my-lib"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("my-lib@1.0.0 is up to date"))
        .stderr(predicate::str::contains("Failed to update 1 of 2 packages: missing"));
}
