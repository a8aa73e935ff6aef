//! `nlm list`: linked packages of the current project, or the store.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::load_runtime;
use crate::config::Runtime;
use crate::installer::is_linked_to;
use crate::manifest::installed_version;
use crate::sync::Linker;
use crate::version::sort_versions_desc;

#[derive(Args)]
pub struct ListCommand {
    /// List the store instead of the current project.
    #[arg(short, long)]
    store: bool,
}

impl ListCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = load_runtime(config, false).await?;
        if self.store {
            list_store(&ctx)
        } else {
            list_project(&ctx)
        }
    }
}

fn list_project(ctx: &Runtime) -> Result<()> {
    let linker = Linker::new(ctx);
    let packages = linker.lock().load()?.packages;
    if packages.is_empty() {
        println!("No linked packages in this project.");
        return Ok(());
    }

    println!("{}", "Linked packages".bold());
    for (name, entry) in &packages {
        let version = installed_version(&ctx.private_dir(name)).unwrap_or_else(|| "?".to_string());
        let link = if is_linked_to(&ctx.link_path(name), &ctx.private_dir(name)) {
            String::new()
        } else {
            format!(" {}", "(link broken)".red())
        };
        println!(
            "  {} {} {}{link}",
            name.cyan().bold(),
            version.green(),
            format!("[{}]", entry.version).dimmed()
        );
    }
    println!("\n{} packages", packages.len());
    Ok(())
}

fn list_store(ctx: &Runtime) -> Result<()> {
    let store = ctx.store();
    let index = store.load_index()?;
    if index.is_empty() {
        println!("The store at {} is empty.", store.root().display());
        return Ok(());
    }

    println!("{} {}", "Store".bold(), store.root().display().to_string().dimmed());
    for (name, entry) in &index {
        let mut versions = store.list_versions(name);
        sort_versions_desc(&mut versions);
        println!(
            "  {} {} {}",
            name.cyan().bold(),
            versions.join(", ").green(),
            format!("({} projects)", entry.used_by.len()).dimmed()
        );
    }
    println!("\n{} packages", index.len());
    Ok(())
}
