//! `nlm install`: link packages from the store into the current project.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::{BatchReport, load_runtime, package_label};
use crate::manifest::PackageSpec;
use crate::sync::{InstallOutcome, Linker, UpdateOutcome};
use crate::utils::progress::spinner_with_message;

#[derive(Args)]
pub struct InstallCommand {
    /// Packages as `name`, `name@version` or `name@range`. Without any,
    /// every package in the lockfile is linked again.
    #[arg(value_name = "PACKAGE")]
    packages: Vec<String>,

    /// Copy from the store even when the private copy is up to date.
    #[arg(short, long)]
    force: bool,
}

impl InstallCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = load_runtime(config, self.force).await?;
        let linker = Linker::new(&ctx);
        linker.ensure_project()?;

        if self.packages.is_empty() {
            return relink_locked(&linker).await;
        }

        for input in &self.packages {
            let spec = PackageSpec::parse(input)?;
            let spinner = spinner_with_message(format!("Linking {spec}"));

            if linker.should_update(&spec)? {
                let result = linker.update(&spec.name).await;
                spinner.finish_and_clear();
                print_update(&result?);
            } else {
                let result = linker.install(input).await;
                spinner.finish_and_clear();
                print_install(&result?);
            }
        }

        Ok(())
    }
}

/// Link every locked package again, continuing past failures.
async fn relink_locked(linker: &Linker<'_>) -> Result<()> {
    let names = linker.lock().list_names()?;
    if names.is_empty() {
        println!("No linked packages in this project. Run 'nlm install <package>' to link one.");
        return Ok(());
    }

    let mut report = BatchReport::new();
    for name in names {
        let spinner = spinner_with_message(format!("Linking {name}"));
        let result = linker.update(&name).await;
        spinner.finish_and_clear();
        match result {
            Ok(outcome) => {
                print_update(&outcome);
                report.success();
            }
            Err(e) => report.failure(&name, e),
        }
    }
    report.finish("install")
}

fn print_install(outcome: &InstallOutcome) {
    let label = package_label(&outcome.name, &outcome.version);
    if outcome.changed {
        println!("{} Linked {label}", "✓".green());
    } else {
        println!("{} {label} is already linked", "•".dimmed());
    }
    if outcome.had_conflicts {
        println!("  {} installed conflicting dependencies into .nlm/{}", "!".yellow(), outcome.name);
    }
    print_nested(outcome.nested_replaced);
}

pub(super) fn print_update(outcome: &UpdateOutcome) {
    let label = package_label(&outcome.name, &outcome.version);
    if outcome.changed {
        println!("{} Updated {label}", "✓".green());
    } else {
        println!("{} {label} is up to date", "•".dimmed());
    }
    print_nested(outcome.nested_replaced);
}

fn print_nested(count: usize) {
    if count > 0 {
        println!("  {} replaced {count} nested copies with links", "↳".dimmed());
    }
}
