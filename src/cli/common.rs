//! Helpers shared by the CLI commands.

use anyhow::Result;
use colored::Colorize;

use super::CliConfig;
use crate::config::Runtime;
use crate::core::{NlmError, user_friendly_error};

/// Runtime context for the current directory.
pub async fn load_runtime(config: &CliConfig, force: bool) -> Result<Runtime> {
    Runtime::load(config.runtime_options(force)).await
}

/// Collects per-package failures of a batch command so the remaining
/// packages still run.
#[derive(Default)]
pub struct BatchReport {
    total: usize,
    failures: Vec<String>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self) {
        self.total += 1;
    }

    /// Print the error for `name` right away and remember it.
    pub fn failure(&mut self, name: &str, error: anyhow::Error) {
        self.total += 1;
        println!("{} {}", "✗".red(), name.bold());
        user_friendly_error(error).display();
        self.failures.push(name.to_string());
    }

    /// Fail the command when any package failed.
    pub fn finish(self, action: &str) -> Result<()> {
        if self.failures.is_empty() {
            return Ok(());
        }
        Err(NlmError::Other {
            message: format!(
                "Failed to {action} {} of {} packages: {}",
                self.failures.len(),
                self.total,
                self.failures.join(", ")
            ),
        }
        .into())
    }
}

/// `name@version` styled for output.
pub fn package_label(name: &str, version: &str) -> String {
    format!("{}{}", name.cyan().bold(), format!("@{version}").dimmed())
}
