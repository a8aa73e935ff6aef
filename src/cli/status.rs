//! `nlm status`: health of the packages linked into the current project.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::{load_runtime, package_label};
use crate::config::Runtime;
use crate::constants::NODE_MODULES;
use crate::deps::{conflicts_needing_install, detect_conflicts, missing_dependencies};
use crate::installer::is_linked_to;
use crate::lockfile::LockEntry;
use crate::manifest::{PackageManifest, read_manifest};
use crate::signature::{read_signature, signatures_match};
use crate::sync::Linker;
use crate::version::resolve;

#[derive(Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = load_runtime(config, false).await?;
        let linker = Linker::new(&ctx);
        linker.ensure_project()?;

        let packages = linker.lock().load()?.packages;
        if packages.is_empty() {
            println!("No linked packages in this project.");
            return Ok(());
        }

        let project = read_manifest(&ctx.working_dir);
        let mut problems = 0;
        for (name, entry) in &packages {
            let linked = read_manifest(&ctx.private_dir(name));
            let issues = check_package(&ctx, name, entry, linked.as_ref(), project.as_ref());
            let version = linked.as_ref().map_or("?", |m| m.version.as_str());
            if issues.is_empty() {
                println!("{} {}", "✓".green(), package_label(name, version));
            } else {
                println!("{} {}", "✗".red(), package_label(name, version));
                for issue in &issues {
                    println!("    {issue}");
                }
                problems += 1;
            }

            if let (Some(linked), Some(project)) = (&linked, &project) {
                let missing = missing_dependencies(linked, project);
                if !missing.is_empty() {
                    println!("    {} {}", "not declared by project:".dimmed(), missing.join(", "));
                }
            }
        }

        if problems == 0 {
            println!("\nAll {} packages are healthy.", packages.len());
        } else {
            println!(
                "\n{} {problems} of {} packages need attention; run 'nlm update'",
                "warning:".yellow().bold(),
                packages.len()
            );
        }
        Ok(())
    }
}

/// Problems with one linked package, as printable lines.
fn check_package(
    ctx: &Runtime,
    name: &str,
    entry: &LockEntry,
    linked: Option<&PackageManifest>,
    project: Option<&PackageManifest>,
) -> Vec<String> {
    let store = ctx.store();
    let private_dir = ctx.private_dir(name);
    let mut issues = Vec::new();

    if !private_dir.is_dir() {
        issues.push(format!("private copy .nlm/{name} is missing"));
    } else if !is_linked_to(&ctx.link_path(name), &private_dir) {
        issues.push(format!("{NODE_MODULES}/{name} does not link to the private copy"));
    }

    match resolve(Some(&entry.version), &store.list_versions(name)) {
        None => issues.push(format!("no version in the store matches '{}'", entry.version)),
        Some(resolved) => {
            let stored = store.signature(name, &resolved.version);
            if !signatures_match(&read_signature(&private_dir), &stored) {
                issues.push(format!("outdated; the store has newer content for {}", resolved.version));
            }
        }
    }

    if let (Some(linked), Some(project)) = (linked, project) {
        let conflicts = detect_conflicts(linked, project);
        let isolated = private_dir.join(NODE_MODULES);
        for conflict in conflicts_needing_install(&conflicts, &isolated) {
            issues.push(format!(
                "{} requires {} but the project has {}",
                conflict.name, conflict.required_version, conflict.installed_version
            ));
        }
    }

    issues
}
