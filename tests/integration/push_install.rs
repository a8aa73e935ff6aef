//! Publishing packages and linking them into projects.

use predicates::prelude::*;
use serde_json::{Value, json};

use crate::common::{Workspace, links_to, read};

#[test]
fn test_push_then_install_links_private_copy() {
    let ws = Workspace::new();
    let lib = ws.package("my-lib", "my-lib", "1.0.0");
    let app = ws.project("app");

    ws.nlm(lib.path())
        .arg("push")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pushed my-lib@1.0.0"));

    let stored = ws.store_dir().join("packages/my-lib/1.0.0");
    assert!(stored.join("index.js").is_file());
    assert!(stored.join("package.json").is_file());
    assert!(!read(&stored.join("nlm.sig")).trim().is_empty());

    ws.nlm(app.path())
        .args(["install", "my-lib"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Linked my-lib@1.0.0"));

    let link = app.path().join("node_modules/my-lib");
    let private = app.path().join(".nlm/my-lib");
    assert!(links_to(&link, &private));
    assert!(std::fs::read_link(&link).unwrap().is_relative());
    assert!(private.join("index.js").is_file());

    let lock: Value = serde_json::from_str(&read(&app.path().join(".nlm/nlm-lock.json"))).unwrap();
    assert_eq!(lock["packages"]["my-lib"]["version"], "latest");
    assert_eq!(
        lock["packages"]["my-lib"]["signature"].as_str().unwrap(),
        read(&stored.join("nlm.sig")).trim()
    );

    assert!(read(&app.path().join(".gitignore")).lines().any(|l| l == ".nlm"));

    let index: Value = serde_json::from_str(&read(&ws.store_dir().join("nlm-store.json"))).unwrap();
    assert_eq!(index["my-lib"]["usedBy"].as_array().unwrap().len(), 1);
}

#[test]
fn test_second_push_is_a_no_op() {
    let ws = Workspace::new();
    let lib = ws.package("my-lib", "my-lib", "1.0.0");
    ws.push(&lib);

    ws.nlm(lib.path())
        .arg("push")
        .assert()
        .success()
        .stdout(predicate::str::contains("already up to date"));

    ws.nlm(lib.path())
        .args(["push", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pushed"));
}

#[test]
fn test_push_refreshes_installed_projects() {
    let ws = Workspace::new();
    let lib = ws.package("my-lib", "my-lib", "1.0.0");
    let app = ws.project("app");
    ws.push(&lib);
    ws.nlm(app.path()).args(["install", "my-lib"]).assert().success();

    lib.write("index.js", "module.exports = 'v2';\n").unwrap();
    ws.push(&lib);

    assert_eq!(read(&app.path().join("node_modules/my-lib/index.js")), "module.exports = 'v2';\n");
}

#[test]
fn test_install_range_picks_highest_match() {
    let ws = Workspace::new();
    let lib = ws.package("my-lib", "my-lib", "1.0.0");
    let app = ws.project("app");
    for version in ["1.0.0", "1.5.0", "2.0.0"] {
        lib.write_manifest(&json!({"name": "my-lib", "version": version, "main": "index.js"}))
            .unwrap();
        ws.push(&lib);
    }

    ws.nlm(app.path())
        .args(["install", "my-lib@^1.0.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("my-lib@1.5.0"));

    let lock: Value = serde_json::from_str(&read(&app.path().join(".nlm/nlm-lock.json"))).unwrap();
    assert_eq!(lock["packages"]["my-lib"]["version"], "^1.0.0");
    let installed: Value =
        serde_json::from_str(&read(&app.path().join("node_modules/my-lib/package.json"))).unwrap();
    assert_eq!(installed["version"], "1.5.0");
}

#[test]
fn test_install_without_names_relinks_lockfile() {
    let ws = Workspace::new();
    let lib = ws.package("my-lib", "my-lib", "1.0.0");
    let app = ws.project("app");
    ws.push(&lib);
    ws.nlm(app.path()).args(["install", "my-lib"]).assert().success();

    let link = app.path().join("node_modules/my-lib");
    std::fs::remove_file(&link).unwrap();

    ws.nlm(app.path()).arg("install").assert().success();
    assert!(links_to(&link, &app.path().join(".nlm/my-lib")));
}

#[test]
fn test_install_replaces_nested_duplicates() {
    let ws = Workspace::new();
    let lib = ws.package("my-lib", "my-lib", "1.0.0");
    let app = ws.project("app");
    let nested = app.add_installed("other/node_modules/my-lib", "my-lib", "0.1.0").unwrap();
    ws.push(&lib);

    ws.nlm(app.path())
        .args(["install", "my-lib"])
        .assert()
        .success()
        .stdout(predicate::str::contains("replaced 1 nested"));

    assert!(links_to(&nested, &app.path().join(".nlm/my-lib")));
}

#[test]
fn test_scoped_package_and_files_field() {
    let ws = Workspace::new();
    let lib = ws.package("ui", "@acme/ui", "0.3.0");
    lib.write_manifest(&json!({
        "name": "@acme/ui",
        "version": "0.3.0",
        "main": "dist/index.js",
        "files": ["dist"]
    }))
    .unwrap();
    lib.write("dist/index.js", "export {};\n").unwrap();
    lib.write("src/index.ts", "export {};\n").unwrap();
    lib.write("README.md", "# ui\n").unwrap();
    let app = ws.project("app");

    ws.push(&lib);
    let stored = ws.store_dir().join("packages/@acme/ui/0.3.0");
    assert!(stored.join("dist/index.js").is_file());
    assert!(stored.join("README.md").is_file());
    assert!(!stored.join("src").exists());

    ws.nlm(app.path()).args(["i", "@acme/ui"]).assert().success();
    assert!(links_to(&app.path().join("node_modules/@acme/ui"), &app.path().join(".nlm/@acme/ui")));
}
