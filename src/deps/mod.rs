//! Dependency conflicts between a linked package and its host project.
//!
//! A linked package resolves its own imports from the project's
//! `node_modules` (it sits behind a symlink), so a dependency the project
//! pins to an incompatible range breaks it. For every such dependency the
//! required version is installed into the package's isolated
//! `.nlm/<name>/node_modules`, which Node's resolution finds first.
//!
//! Detection only reacts to provable conflicts: both sides must be semver
//! specifiers, not textually equal, and have disjoint ranges. Specifiers
//! such as `latest`, git URLs or `workspace:*` are warned about and left
//! alone.

pub mod package_manager;

use anyhow::{Context, Result};
use std::path::Path;

pub use package_manager::PackageManagerCommand;

use crate::config::Runtime;
use crate::constants::{MANIFEST_FILE_NAME, NODE_MODULES};
use crate::installer::detach_file;
use crate::manifest::{PackageManifest, installed_version, read_manifest};
use crate::utils::fs::ensure_dir;
use crate::version::{are_ranges_compatible, is_semver_version_or_range, satisfies};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyConflict {
    pub name: String,
    /// Specifier from the linked package, verbatim.
    pub required_version: String,
    /// Specifier from the project, verbatim.
    pub installed_version: String,
}

impl DependencyConflict {
    #[must_use]
    pub fn install_spec(&self) -> String {
        format!("{}@{}", self.name, self.required_version)
    }
}

/// Dependencies of `linked` that `project` declares with an incompatible range.
#[must_use]
pub fn detect_conflicts(linked: &PackageManifest, project: &PackageManifest) -> Vec<DependencyConflict> {
    let declared = project.declared_dependencies();
    let mut conflicts = Vec::new();

    for (name, required) in linked.link_requirements() {
        let Some(installed) = declared.get(&name) else {
            continue;
        };

        if !is_semver_version_or_range(&required) {
            tracing::warn!(
                "Linked package '{}' requires {name}@{required}, which is not a semver range; skipping conflict check",
                linked.name
            );
            continue;
        }
        if !is_semver_version_or_range(installed) {
            tracing::warn!(
                "Project declares {name}@{installed}, which is not a semver range; skipping conflict check"
            );
            continue;
        }

        if !are_ranges_compatible(&required, installed) {
            conflicts.push(DependencyConflict {
                name,
                required_version: required,
                installed_version: installed.clone(),
            });
        }
    }

    conflicts
}

/// Whether the isolated `node_modules` already satisfies `conflict`.
///
/// An unparseable range counts as satisfied so it is never reinstalled.
fn already_satisfied(conflict: &DependencyConflict, isolated_node_modules: &Path) -> bool {
    let Some(version) = installed_version(&isolated_node_modules.join(&conflict.name)) else {
        return false;
    };
    match satisfies(&version, &conflict.required_version) {
        Ok(satisfied) => satisfied,
        Err(e) => {
            tracing::debug!("Treating {} as satisfied: {e}", conflict.name);
            true
        }
    }
}

/// Conflicts still missing from the isolated `node_modules`.
#[must_use]
pub fn conflicts_needing_install<'a>(
    conflicts: &'a [DependencyConflict],
    isolated_node_modules: &Path,
) -> Vec<&'a DependencyConflict> {
    conflicts.iter().filter(|c| !already_satisfied(c, isolated_node_modules)).collect()
}

/// Install the required versions of `conflicts` into the package's
/// isolated `node_modules`.
pub async fn resolve_conflicts(
    ctx: &Runtime,
    package_name: &str,
    conflicts: &[DependencyConflict],
) -> Result<usize> {
    if conflicts.is_empty() {
        return Ok(0);
    }

    let private_dir = ctx.private_dir(package_name);
    ensure_dir(&private_dir)?;
    let isolated = private_dir.join(NODE_MODULES);

    let pending = conflicts_needing_install(conflicts, &isolated);
    for conflict in conflicts {
        let status = if pending.contains(&conflict) {
            "needs install"
        } else {
            "already installed"
        };
        tracing::info!(
            "{package_name}: {} requires {} but project has {} ({status})",
            conflict.name,
            conflict.required_version,
            conflict.installed_version
        );
    }

    if pending.is_empty() {
        return Ok(0);
    }

    // The package manager rewrites package.json in place; it must not be the
    // store's inode.
    let manifest_path = private_dir.join(MANIFEST_FILE_NAME);
    if manifest_path.is_file() {
        detach_file(&manifest_path)?;
    }

    let specs: Vec<String> = pending.iter().map(|c| c.install_spec()).collect();
    PackageManagerCommand::install(ctx.package_manager(), &specs)
        .current_dir(&private_dir)
        .quiet()
        .execute()
        .await
        .with_context(|| format!("Failed to install conflicting dependencies of {package_name}"))?;

    Ok(specs.len())
}

/// Detect and resolve conflicts for an installed package.
///
/// Returns whether conflicts existed. Missing descriptors mean there is
/// nothing to compare.
pub async fn check_and_resolve(ctx: &Runtime, package_name: &str) -> Result<bool> {
    let Some(linked) = read_manifest(&ctx.private_dir(package_name)) else {
        return Ok(false);
    };
    let Some(project) = read_manifest(&ctx.working_dir) else {
        return Ok(false);
    };

    let conflicts = detect_conflicts(&linked, &project);
    if conflicts.is_empty() {
        return Ok(false);
    }

    resolve_conflicts(ctx, package_name, &conflicts).await?;
    Ok(true)
}

/// Dependencies of `linked` the project does not declare at all.
#[must_use]
pub fn missing_dependencies(linked: &PackageManifest, project: &PackageManifest) -> Vec<String> {
    let declared = project.declared_dependencies();
    linked
        .link_requirements()
        .into_keys()
        .filter(|name| !declared.contains_key(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeOptions;
    use crate::test_utils::PackageFixture;
    use tempfile::tempdir;

    fn manifest(json: &str) -> PackageManifest {
        PackageManifest::parse(json).unwrap()
    }

    #[test]
    fn test_incompatible_majors_conflict_verbatim() {
        let linked = manifest(
            r#"{"name":"lib","version":"1.0.0","peerDependencies":{"react":"^16.0.0"}}"#,
        );
        let project =
            manifest(r#"{"name":"app","version":"1.0.0","dependencies":{"react":"^17.0.0"}}"#);

        assert_eq!(
            detect_conflicts(&linked, &project),
            vec![DependencyConflict {
                name: "react".to_string(),
                required_version: "^16.0.0".to_string(),
                installed_version: "^17.0.0".to_string(),
            }]
        );
    }

    #[test]
    fn test_overlapping_ranges_do_not_conflict() {
        let linked =
            manifest(r#"{"name":"lib","version":"1.0.0","dependencies":{"react":"^17.0.0"}}"#);
        let project =
            manifest(r#"{"name":"app","version":"1.0.0","devDependencies":{"react":"^17.0.2"}}"#);

        assert!(detect_conflicts(&linked, &project).is_empty());
    }

    #[test]
    fn test_undeclared_and_non_semver_are_skipped() {
        let linked = manifest(
            r#"{"name":"lib","version":"1.0.0","dependencies":{
                "lodash":"^4.0.0", "tool":"github:me/tool", "react":"latest"}}"#,
        );
        let project = manifest(
            r#"{"name":"app","version":"1.0.0","dependencies":{"tool":"^1.0.0","react":"^18.0.0"}}"#,
        );

        assert!(detect_conflicts(&linked, &project).is_empty());
        assert_eq!(missing_dependencies(&linked, &project), vec!["lodash"]);
    }

    #[test]
    fn test_conflicts_needing_install_checks_isolated_versions() {
        let temp = tempdir().unwrap();
        let isolated = temp.path().join("node_modules");
        let write = |name: &str, version: &str| {
            let dir = isolated.join(name);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(
                dir.join("package.json"),
                format!(r#"{{"name":"{name}","version":"{version}"}}"#),
            )
            .unwrap();
        };
        write("react", "16.14.0");
        write("vue", "3.0.0");

        let conflict = |name: &str, required: &str| DependencyConflict {
            name: name.to_string(),
            required_version: required.to_string(),
            installed_version: "^99.0.0".to_string(),
        };
        let conflicts =
            vec![conflict("react", "^16.0.0"), conflict("vue", "^2.6.0"), conflict("redux", "^4.0.0")];

        let pending: Vec<&str> = conflicts_needing_install(&conflicts, &isolated)
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(pending, vec!["vue", "redux"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_resolve_runs_package_manager_in_private_dir() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let project = PackageFixture::project(temp.path().join("app")).unwrap();
        let log = temp.path().join("pm.log");
        let script = temp.path().join("fake-pm");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho \"$(pwd -P) $@\" >> {}\n", log.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ctx = Runtime::load(RuntimeOptions {
            working_dir: Some(project.path().to_path_buf()),
            store_dir: Some(temp.path().join("store")),
            package_manager: Some(script.display().to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        let conflicts = vec![DependencyConflict {
            name: "react".to_string(),
            required_version: "^16.0.0".to_string(),
            installed_version: "^17.0.0".to_string(),
        }];
        let installed = resolve_conflicts(&ctx, "my-lib", &conflicts).await.unwrap();
        assert_eq!(installed, 1);

        let logged = std::fs::read_to_string(&log).unwrap();
        assert!(logged.contains("install react@^16.0.0 --legacy-peer-deps"));
        assert!(logged.trim_start().starts_with(&ctx.private_dir("my-lib").display().to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_package_manager_rewrites_do_not_reach_the_store() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let project = PackageFixture::project(temp.path().join("app")).unwrap();
        let script = temp.path().join("fake-pm");
        std::fs::write(
            &script,
            "#!/bin/sh\necho '{\"name\":\"my-lib\",\"version\":\"1.0.0\",\"rewritten\":true}' > package.json\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ctx = Runtime::load(RuntimeOptions {
            working_dir: Some(project.path().to_path_buf()),
            store_dir: Some(temp.path().join("store")),
            package_manager: Some(script.display().to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        let stored = temp.path().join("stored-package.json");
        let original = r#"{"name":"my-lib","version":"1.0.0","peerDependencies":{"react":"^16.0.0"}}"#;
        std::fs::write(&stored, original).unwrap();
        let private_dir = ctx.private_dir("my-lib");
        std::fs::create_dir_all(&private_dir).unwrap();
        std::fs::hard_link(&stored, private_dir.join("package.json")).unwrap();

        let conflicts = vec![DependencyConflict {
            name: "react".to_string(),
            required_version: "^16.0.0".to_string(),
            installed_version: "^17.0.0".to_string(),
        }];
        resolve_conflicts(&ctx, "my-lib", &conflicts).await.unwrap();

        assert_eq!(std::fs::read_to_string(&stored).unwrap(), original);
        let private = std::fs::read_to_string(private_dir.join("package.json")).unwrap();
        assert!(private.contains("rewritten"));
    }

    #[tokio::test]
    async fn test_no_conflicts_is_a_no_op() {
        let temp = tempdir().unwrap();
        let project = PackageFixture::project(temp.path().join("app")).unwrap();
        let ctx = Runtime::load(RuntimeOptions {
            working_dir: Some(project.path().to_path_buf()),
            store_dir: Some(temp.path().join("store")),
            package_manager: Some("definitely-not-installed".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(resolve_conflicts(&ctx, "my-lib", &[]).await.unwrap(), 0);
        assert!(!check_and_resolve(&ctx, "my-lib").await.unwrap());
    }
}
