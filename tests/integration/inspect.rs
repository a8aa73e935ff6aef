//! `list`, `search`, `status` and `config`.

use predicates::prelude::*;

use crate::common::Workspace;

#[test]
fn test_list_project_and_store() {
    let ws = Workspace::new();
    let lib = ws.package("my-lib", "my-lib", "1.0.0");
    let app = ws.project("app");

    ws.nlm(app.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No linked packages"));

    ws.push(&lib);
    ws.nlm(app.path()).args(["install", "my-lib"]).assert().success();

    ws.nlm(app.path())
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("my-lib 1.0.0 [latest]"));

    ws.nlm(app.path())
        .args(["list", "--store"])
        .assert()
        .success()
        .stdout(predicate::str::contains("my-lib 1.0.0 (1 projects)"));
}

#[test]
fn test_search_matches_case_insensitively() {
    let ws = Workspace::new();
    ws.push(&ws.package("ui", "@acme/UI-kit", "2.0.0"));
    ws.push(&ws.package("core", "core", "1.0.0"));

    ws.nlm(ws.store_dir().parent().unwrap())
        .args(["search", "ui"])
        .assert()
        .success()
        .stdout(predicate::str::contains("@acme/UI-kit"))
        .stdout(predicate::str::contains("versions: 2.0.0"))
        .stdout(predicate::str::contains("1 packages found"));

    ws.nlm(ws.store_dir().parent().unwrap())
        .args(["s", "nothing-like-this"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No packages matching"));
}

#[test]
fn test_status_reports_broken_links() {
    let ws = Workspace::new();
    let lib = ws.package("my-lib", "my-lib", "1.0.0");
    let app = ws.project("app");
    ws.push(&lib);
    ws.nlm(app.path()).args(["install", "my-lib"]).assert().success();

    ws.nlm(app.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("All 1 packages are healthy."));

    std::fs::remove_file(app.path().join("node_modules/my-lib")).unwrap();
    ws.nlm(app.path())
        .arg("st")
        .assert()
        .success()
        .stdout(predicate::str::contains("does not link to the private copy"));
}

#[test]
fn test_config_precedence() {
    let ws = Workspace::new();
    let app = ws.project("app");

    ws.nlm(app.path())
        .args(["config", "get", "packageManager"])
        .assert()
        .success()
        .stdout("npm\n");

    ws.nlm(app.path()).args(["config", "set", "packageManager", "pnpm", "-g"]).assert().success();
    assert!(ws.store_dir().join("config.toml").is_file());
    ws.nlm(app.path())
        .args(["config", "get", "packageManager"])
        .assert()
        .success()
        .stdout("pnpm\n");

    ws.nlm(app.path()).args(["config", "set", "packageManager", "yarn"]).assert().success();
    assert!(app.path().join(".nlm/config.toml").is_file());
    ws.nlm(app.path())
        .args(["config", "get", "packageManager"])
        .assert()
        .success()
        .stdout("yarn\n");

    ws.nlm(app.path())
        .args(["--package-manager", "bun", "config", "get", "packageManager"])
        .assert()
        .success()
        .stdout("bun\n");

    ws.nlm(app.path()).args(["config", "unset", "packageManager"]).assert().success();
    ws.nlm(app.path())
        .args(["config", "get", "packageManager"])
        .assert()
        .success()
        .stdout("pnpm\n");
}

#[test]
fn test_config_path() {
    let ws = Workspace::new();
    let app = ws.project("app");

    ws.nlm(app.path())
        .args(["config", "path", "--global"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains("store"));
}
