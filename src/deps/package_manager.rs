//! Invoking the project's package manager (npm, pnpm, yarn, ...).
//!
//! Commands run with inherited stdio so the user sees the package
//! manager's own progress and errors.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::core::NlmError;

pub struct PackageManagerCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    capture_output: bool,
}

impl PackageManagerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            capture_output: false,
        }
    }

    /// `<pm> install <specs...> --legacy-peer-deps`
    pub fn install(program: impl Into<String>, specs: &[String]) -> Self {
        Self::new(program).arg("install").args(specs.iter().cloned()).arg("--legacy-peer-deps")
    }

    /// Fetch `names` from the registry again after their links were removed.
    pub fn reinstall(program: impl Into<String>, names: &[String]) -> Self {
        Self::install(program, names)
    }

    /// `<pm> run <script>`
    pub fn run_script(program: impl Into<String>, script: &str) -> Self {
        Self::new(program).arg("run").arg(script)
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Capture stdout/stderr instead of inheriting them.
    pub const fn quiet(mut self) -> Self {
        self.capture_output = true;
        self
    }

    /// Human-readable command line.
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion. A non-zero exit is a
    /// [`NlmError::DependencyInstallFailed`].
    pub async fn execute(self) -> Result<()> {
        let executable = which::which(&self.program).map_err(|_| NlmError::PackageManagerNotFound {
            name: self.program.clone(),
        })?;
        let command_line = self.display();

        let mut cmd = Command::new(&executable);
        cmd.args(&self.args);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        if self.capture_output {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        tracing::debug!(
            target: "package_manager",
            "Executing command: {} (in {})",
            command_line,
            self.current_dir.as_deref().unwrap_or_else(|| Path::new(".")).display()
        );

        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to execute {command_line}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                // Captured output is otherwise lost
                tracing::warn!(target: "package_manager", "{command_line}: {}", stderr.trim());
            }
            return Err(NlmError::DependencyInstallFailed {
                command: command_line,
                status: output.status.to_string(),
            }
            .into());
        }

        Ok(())
    }
}
