//! `nlm update`: refresh linked packages from the store.

use anyhow::Result;
use clap::Args;

use super::CliConfig;
use super::common::{BatchReport, load_runtime};
use super::install::print_update;
use crate::manifest::PackageSpec;
use crate::sync::Linker;
use crate::utils::progress::spinner_with_message;

#[derive(Args)]
pub struct UpdateCommand {
    /// Packages to update; all linked packages when omitted.
    #[arg(value_name = "PACKAGE")]
    packages: Vec<String>,

    /// Copy from the store even when the private copy is up to date.
    #[arg(short, long)]
    force: bool,
}

impl UpdateCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = load_runtime(config, self.force).await?;
        let linker = Linker::new(&ctx);
        linker.ensure_project()?;

        let names = if self.packages.is_empty() {
            linker.lock().list_names()?
        } else {
            self.packages
                .iter()
                .map(|input| PackageSpec::parse(input).map(|spec| spec.name))
                .collect::<Result<Vec<_>, _>>()?
        };

        if names.is_empty() {
            println!("No linked packages to update.");
            return Ok(());
        }

        let mut report = BatchReport::new();
        for name in names {
            let spinner = spinner_with_message(format!("Updating {name}"));
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
        report.finish("update")
    }
}
