//! Command-line interface for nlm.
//!
//! Each command lives in its own module with a `clap` argument struct and an
//! `execute` method. Global flags are collected into a [`CliConfig`], which
//! every command turns into a [`Runtime`](crate::config::Runtime) for the
//! directory it was started in.
//!
//! # Available Commands
//!
//! ## In a package
//! - `push` - publish the package into the store and refresh its users
//!
//! ## In a project
//! - `install` - link packages from the store
//! - `update` - re-link packages after the store copy changed
//! - `uninstall` - remove links and private copies
//! - `list` - show linked packages (or the store with `--store`)
//! - `status` - check links, signatures and dependencies
//!
//! ## Anywhere
//! - `search` - find packages in the store
//! - `config` - read and write configuration
//!
//! # Basic Workflow
//!
//! ```bash
//! cd ~/code/my-lib && nlm push
//! cd ~/code/app && nlm install my-lib
//! # edit my-lib, then push again; app is refreshed automatically
//! cd ~/code/my-lib && nlm push
//! ```

mod common;
mod config;
mod install;
mod list;
mod push;
mod search;
mod status;
mod uninstall;
mod update;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::{Locale, RuntimeOptions};
use crate::utils::progress::disable_progress;

/// Settings derived from the global flags, shared by every command.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub debug: bool,
    pub no_progress: bool,
    pub lang: Option<Locale>,
    /// `--package-manager`; beats both configuration files.
    pub package_manager: Option<String>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runtime options for the current directory.
    #[must_use]
    pub fn runtime_options(&self, force: bool) -> RuntimeOptions {
        RuntimeOptions {
            working_dir: None,
            store_dir: None,
            force,
            debug: self.debug,
            locale: self.lang,
            package_manager: self.package_manager.clone(),
        }
    }

    /// Apply process-wide switches. Called once before dispatch.
    pub fn apply(&self) {
        if self.no_progress {
            disable_progress();
        }
    }
}

/// Link locally developed npm packages into projects through a local store.
#[derive(Parser)]
#[command(
    name = "nlm",
    about = "Link locally developed npm packages into projects",
    version,
    long_about = "nlm publishes a package into a machine-wide store with `push` and links it into \
                  any number of projects with `install`. Later pushes refresh every project using \
                  the package."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (same as `DEBUG=nlm`).
    #[arg(long, global = true)]
    debug: bool,

    /// Message language.
    #[arg(long, global = true, value_enum)]
    lang: Option<Locale>,

    /// Package manager used for builds and conflicting dependencies
    /// (overrides configuration).
    #[arg(long = "package-manager", alias = "packageManager", global = true, value_name = "NAME")]
    package_manager: Option<String>,

    /// Disable spinners, for scripts and CI.
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish the package in the current directory to the store.
    Push(push::PushCommand),

    /// Link packages from the store into this project.
    #[command(visible_alias = "i")]
    Install(install::InstallCommand),

    /// Refresh linked packages from the store.
    #[command(visible_alias = "up")]
    Update(update::UpdateCommand),

    /// Remove linked packages from this project.
    #[command(visible_alias = "un")]
    Uninstall(uninstall::UninstallCommand),

    /// List linked packages, or the store contents.
    #[command(visible_alias = "ls")]
    List(list::ListCommand),

    /// Search the store by package name.
    #[command(visible_alias = "s")]
    Search(search::SearchCommand),

    /// Read and write configuration.
    Config(config::ConfigCommand),

    /// Check the health of linked packages.
    #[command(visible_alias = "st")]
    Status(status::StatusCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Whether debug logging was requested by flag or `DEBUG` variable.
    #[must_use]
    pub fn debug_enabled(&self) -> bool {
        self.debug || debug_from_env()
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        CliConfig {
            debug: self.debug_enabled(),
            no_progress: self.no_progress,
            lang: self.lang,
            package_manager: self.package_manager.clone(),
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.apply();

        match self.command {
            Commands::Push(cmd) => cmd.execute(&config).await,
            Commands::Install(cmd) => cmd.execute(&config).await,
            Commands::Update(cmd) => cmd.execute(&config).await,
            Commands::Uninstall(cmd) => cmd.execute(&config).await,
            Commands::List(cmd) => cmd.execute(&config).await,
            Commands::Search(cmd) => cmd.execute(&config).await,
            Commands::Config(cmd) => cmd.execute(&config).await,
            Commands::Status(cmd) => cmd.execute(&config).await,
        }
    }
}

/// `DEBUG=1`, `DEBUG=true` or `DEBUG=nlm`.
fn debug_from_env() -> bool {
    std::env::var("DEBUG").is_ok_and(|value| matches!(value.as_str(), "1" | "true" | "nlm"))
}
