//! `nlm config`: read and write configuration.
//!
//! Without `--global` the project file `<project>/.nlm/config.toml` is
//! edited; `show` and `get` report the effective values, which also take the
//! global file and `--package-manager` into account.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use super::CliConfig;
use super::common::load_runtime;
use crate::config::{ConfigKey, NlmConfig, Runtime};

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,

    /// Operate on the global configuration in the store.
    #[arg(short, long, global = true)]
    global: bool,
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Show the configuration (the default).
    Show,

    /// Print one value.
    Get {
        /// `packageManager` or `lang`
        key: String,
    },

    /// Set one value.
    Set {
        /// `packageManager` or `lang`
        key: String,
        value: String,
    },

    /// Remove one value.
    Unset {
        /// `packageManager` or `lang`
        key: String,
    },

    /// Print the configuration file path.
    Path,
}

impl ConfigCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let ctx = load_runtime(config, false).await?;
        let path = self.file_path(&ctx);

        match self.command.unwrap_or(ConfigSubcommands::Show) {
            ConfigSubcommands::Show => show(&ctx, &path, self.global).await,
            ConfigSubcommands::Get {
                key,
            } => {
                let key = ConfigKey::parse(&key)?;
                let value = if self.global {
                    NlmConfig::load_from(&path).await?.get(key)
                } else {
                    effective_value(&ctx, key)
                };
                println!("{}", value.unwrap_or_default());
                Ok(())
            }
            ConfigSubcommands::Set {
                key,
                value,
            } => {
                let key = ConfigKey::parse(&key)?;
                let mut file = NlmConfig::load_from(&path).await?;
                file.set(key, &value)?;
                file.save_to(&path).await?;
                println!("{} {} = {}", "✓".green(), key_name(key), value.trim());
                Ok(())
            }
            ConfigSubcommands::Unset {
                key,
            } => {
                let key = ConfigKey::parse(&key)?;
                let mut file = NlmConfig::load_from(&path).await?;
                file.unset(key);
                file.save_to(&path).await?;
                println!("{} {} removed", "✓".green(), key_name(key));
                Ok(())
            }
            ConfigSubcommands::Path => {
                println!("{}", path.display());
                Ok(())
            }
        }
    }

    fn file_path(&self, ctx: &Runtime) -> PathBuf {
        if self.global {
            NlmConfig::global_path(&ctx.store_dir)
        } else {
            NlmConfig::project_path(&ctx.working_dir)
        }
    }
}

async fn show(ctx: &Runtime, path: &Path, global: bool) -> Result<()> {
    let scope = if global { "Global" } else { "Project" };
    println!("{} {}", format!("{scope} configuration").bold(), path.display().to_string().dimmed());
    let file = NlmConfig::load_from(path).await?;
    for key in [ConfigKey::PackageManager, ConfigKey::Lang] {
        let value = file.get(key).unwrap_or_else(|| "-".to_string());
        println!("  {} = {value}", key_name(key));
    }

    if !global {
        println!("\n{}", "Effective".bold());
        for key in [ConfigKey::PackageManager, ConfigKey::Lang] {
            let value = effective_value(ctx, key).unwrap_or_else(|| "-".to_string());
            println!("  {} = {}", key_name(key), value.green());
        }
    }
    Ok(())
}

fn effective_value(ctx: &Runtime, key: ConfigKey) -> Option<String> {
    match key {
        ConfigKey::PackageManager => Some(ctx.package_manager()),
        ConfigKey::Lang => Some(ctx.locale.as_str().to_string()),
    }
}

const fn key_name(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::PackageManager => "packageManager",
        ConfigKey::Lang => "lang",
    }
}
