//! `nlm uninstall`: remove linked packages from the current project.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::{BatchReport, load_runtime};
use crate::core::NlmError;
use crate::deps::PackageManagerCommand;
use crate::manifest::PackageSpec;
use crate::sync::Linker;

#[derive(Args)]
pub struct UninstallCommand {
    /// Packages to unlink.
    #[arg(value_name = "PACKAGE")]
    packages: Vec<String>,

    /// Install the packages from the registry afterwards.
    #[arg(short, long)]
    install: bool,
}

impl UninstallCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = load_runtime(config, false).await?;
        let linker = Linker::new(&ctx);
        linker.ensure_project()?;

        if self.packages.is_empty() {
            let installed = linker.lock().list_names()?;
            if installed.is_empty() {
                println!("No linked packages in this project.");
                return Ok(());
            }
            return Err(NlmError::Other {
                message: format!(
                    "Specify the packages to uninstall. Linked packages: {}",
                    installed.join(", ")
                ),
            }
            .into());
        }

        let mut report = BatchReport::new();
        let mut removed = Vec::new();
        for input in &self.packages {
            let result = match PackageSpec::parse(input) {
                Ok(spec) => linker.uninstall(&spec.name).await.map(|()| spec.name),
                Err(e) => Err(e.into()),
            };
            match result {
                Ok(name) => {
                    println!("{} Removed {}", "✓".green(), name.cyan().bold());
                    report.success();
                    removed.push(name);
                }
                Err(e) => report.failure(input, e),
            }
        }

        if !removed.is_empty() {
            if self.install {
                PackageManagerCommand::reinstall(ctx.package_manager(), &removed)
                    .current_dir(&ctx.working_dir)
                    .execute()
                    .await?;
                println!("{} Installed {} from the registry", "✓".green(), removed.join(" "));
            } else {
                println!(
                    "{} Run your package manager's install (or 'nlm uninstall -i') to restore registry versions",
                    "note:".yellow()
                );
            }
        }

        report.finish("uninstall")
    }
}
