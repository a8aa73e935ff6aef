//! `nlm push`: publish the current package and refresh its users.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::{load_runtime, package_label};
use crate::sync::{Linker, PushOptions, PushOutcome, RefreshStatus};
use crate::utils::progress::spinner_with_message;

#[derive(Args)]
pub struct PushCommand {
    /// Copy into the store and refresh users even when nothing changed.
    #[arg(short, long)]
    force: bool,

    /// Package script to run before publishing. Defaults to `build` when
    /// the package defines it.
    #[arg(short, long = "build", value_name = "SCRIPT", conflicts_with = "no_build")]
    build: Option<String>,

    /// Publish without running any script.
    #[arg(long)]
    no_build: bool,
}

impl PushCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = load_runtime(config, self.force).await?;
        let linker = Linker::new(&ctx);

        let spinner = spinner_with_message(format!("Pushing {}", ctx.working_dir.display()));
        let result = linker
            .push(&PushOptions {
                build_script: self.build,
                skip_build: self.no_build,
            })
            .await;
        spinner.finish_and_clear();

        print_outcome(&result?);
        Ok(())
    }
}

fn print_outcome(outcome: &PushOutcome) {
    let label = package_label(&outcome.name, &outcome.version);
    if let Some(script) = &outcome.built_with {
        println!("{} Ran script '{script}'", "→".cyan());
    }
    if !outcome.changed {
        println!("{} {label} is already up to date in the store", "•".dimmed());
        return;
    }

    println!("{} Pushed {label} ({} files)", "✓".green(), outcome.files);

    for refresh in &outcome.refreshed {
        let project = refresh.project.display();
        match &refresh.status {
            RefreshStatus::Updated(update) => {
                println!("  {} {project} ({})", "✓".green(), update.version);
            }
            RefreshStatus::Pruned => {
                println!("  {} {project} no longer uses it", "-".dimmed());
            }
            RefreshStatus::Skipped(reason) => {
                println!("  {} {project}: {reason}", "!".yellow());
            }
            RefreshStatus::Failed(reason) => {
                println!("  {} {project}: {reason}", "✗".red());
            }
        }
    }

    let failures = outcome.failures();
    if failures > 0 {
        println!(
            "{} {failures} of {} projects could not be refreshed; run 'nlm update {}' in them",
            "warning:".yellow().bold(),
            outcome.refreshed.len(),
            outcome.name
        );
    }
}
