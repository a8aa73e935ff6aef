//! Error handling for nlm
//!
//! Two layers, mirroring how the CLI reports failures:
//! 1. [`NlmError`] - strongly typed failure cases raised by the engine
//! 2. [`ErrorContext`] - an [`NlmError`] decorated with details and an
//!    actionable suggestion for the terminal
//!
//! Engine functions return [`anyhow::Result`] and attach context with
//! `.with_context(...)`; typed errors survive the context chain and are
//! recovered by [`user_friendly_error`] when the CLI prints them.
//!
//! ```rust,no_run
//! use nlm_cli::core::{NlmError, user_friendly_error};
//!
//! let err = anyhow::Error::from(NlmError::PackageNotInStore {
//!     name: "my-lib".to_string(),
//! });
//! user_friendly_error(err).display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for nlm operations.
#[derive(Error, Debug)]
pub enum NlmError {
    /// The working directory is not an npm project.
    #[error("Not a valid project directory: {path}")]
    InvalidProject {
        path: String,
    },

    /// The directory being pushed has no usable `package.json`.
    #[error("No valid package.json found in {path}")]
    InvalidPackage {
        path: String,
    },

    #[error("Invalid package name: '{name}'")]
    InvalidPackageName {
        name: String,
    },

    #[error("Package '{name}' is not in the store")]
    PackageNotInStore {
        name: String,
    },

    /// No stored version matches the requested specifier.
    #[error("No version of '{name}' matches '{requested}'")]
    NoMatchingVersion {
        name: String,
        requested: String,
        available: Vec<String>,
    },

    #[error("Package '{name}' is not installed in this project")]
    NotInstalled {
        name: String,
    },

    #[error("No files to publish for package '{name}'")]
    NoFilesToPublish {
        name: String,
    },

    #[error("Failed to read '{path}' while computing signature: {reason}")]
    SignatureIo {
        path: String,
        reason: String,
    },

    /// The package manager exited unsuccessfully.
    #[error("Command '{command}' failed with {status}")]
    DependencyInstallFailed {
        command: String,
        status: String,
    },

    #[error("Build script '{script}' failed with {status}")]
    BuildScriptFailed {
        script: String,
        status: String,
    },

    #[error("Package manager '{name}' is not installed or not found in PATH")]
    PackageManagerNotFound {
        name: String,
    },

    #[error("Failed to create link at {path}: {reason}")]
    LinkRepairFailed {
        path: String,
        reason: String,
    },

    #[error("Invalid lockfile syntax in {file}")]
    LockfileParse {
        file: String,
        reason: String,
    },

    #[error("Invalid store index in {file}")]
    StoreIndexParse {
        file: String,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{message}")]
    Other {
        message: String,
    },
}

impl Clone for NlmError {
    fn clone(&self) -> Self {
        match self {
            Self::InvalidProject {
                path,
            } => Self::InvalidProject {
                path: path.clone(),
            },
            Self::InvalidPackage {
                path,
            } => Self::InvalidPackage {
                path: path.clone(),
            },
            Self::InvalidPackageName {
                name,
            } => Self::InvalidPackageName {
                name: name.clone(),
            },
            Self::PackageNotInStore {
                name,
            } => Self::PackageNotInStore {
                name: name.clone(),
            },
            Self::NoMatchingVersion {
                name,
                requested,
                available,
            } => Self::NoMatchingVersion {
                name: name.clone(),
                requested: requested.clone(),
                available: available.clone(),
            },
            Self::NotInstalled {
                name,
            } => Self::NotInstalled {
                name: name.clone(),
            },
            Self::NoFilesToPublish {
                name,
            } => Self::NoFilesToPublish {
                name: name.clone(),
            },
            Self::SignatureIo {
                path,
                reason,
            } => Self::SignatureIo {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::DependencyInstallFailed {
                command,
                status,
            } => Self::DependencyInstallFailed {
                command: command.clone(),
                status: status.clone(),
            },
            Self::BuildScriptFailed {
                script,
                status,
            } => Self::BuildScriptFailed {
                script: script.clone(),
                status: status.clone(),
            },
            Self::PackageManagerNotFound {
                name,
            } => Self::PackageManagerNotFound {
                name: name.clone(),
            },
            Self::LinkRepairFailed {
                path,
                reason,
            } => Self::LinkRepairFailed {
                path: path.clone(),
                reason: reason.clone(),
            },
            Self::LockfileParse {
                file,
                reason,
            } => Self::LockfileParse {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::StoreIndexParse {
                file,
                reason,
            } => Self::StoreIndexParse {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::IoError(e) => Self::IoError(std::io::Error::new(e.kind(), e.to_string())),
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// An [`NlmError`] with optional details and a suggested fix.
#[derive(Debug)]
pub struct ErrorContext {
    pub error: NlmError,
    pub suggestion: Option<String>,
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: NlmError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into a terminal-friendly [`ErrorContext`].
///
/// Typed [`NlmError`]s anywhere in the context chain get a tailored
/// suggestion. Everything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(nlm_error) = error.chain().find_map(|cause| cause.downcast_ref::<NlmError>()) {
        let mut ctx = create_error_context(nlm_error.clone());
        // Outer context messages carry the command-level story
        let outer = error.to_string();
        if ctx.details.is_none() && outer != nlm_error.to_string() {
            ctx.details = Some(outer);
        }
        return ctx;
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(NlmError::IoError(std::io::Error::new(
                    io_error.kind(),
                    io_error.to_string(),
                )))
                .with_suggestion("Check the ownership and permissions of the store and project directories");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(NlmError::IoError(std::io::Error::new(
                    io_error.kind(),
                    io_error.to_string(),
                )))
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(NlmError::Other {
        message,
    })
}

fn create_error_context(error: NlmError) -> ErrorContext {
    match &error {
        NlmError::InvalidProject { path } => ErrorContext::new(error.clone())
            .with_suggestion("Run nlm from the root of an npm project (a directory with package.json and node_modules)")
            .with_details(format!("{path} is missing package.json or node_modules. Run your package manager's install first")),

        NlmError::InvalidPackage { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Run 'nlm push' from the package directory. package.json must declare both name and version"),

        NlmError::PackageNotInStore { name } => ErrorContext::new(error.clone())
            .with_suggestion(format!("Run 'nlm push' in the source directory of '{name}' first")),

        NlmError::NoMatchingVersion { name, available, .. } => {
            let details = if available.is_empty() {
                format!("The store holds no versions of '{name}'")
            } else {
                format!("Available versions: {}", available.join(", "))
            };
            ErrorContext::new(error.clone())
                .with_suggestion("Request one of the available versions or push the version you need")
                .with_details(details)
        }

        NlmError::NotInstalled { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Run 'nlm list' to see the packages installed in this project"),

        NlmError::NoFilesToPublish { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Check the \"files\" field of package.json and your .npmignore"),

        NlmError::PackageManagerNotFound { name } => ErrorContext::new(error.clone())
            .with_suggestion(format!("Install {name} or choose another one with 'nlm config set packageManager <npm|pnpm|yarn>'")),

        NlmError::DependencyInstallFailed { .. } => ErrorContext::new(error.clone())
            .with_suggestion("Run the command manually inside the package's .nlm directory to see the full output")
            .with_details("Conflicting dependencies are installed into the package's isolated node_modules"),

        NlmError::BuildScriptFailed { script, .. } => ErrorContext::new(error.clone())
            .with_suggestion(format!("Check that the '{script}' script exists in package.json and succeeds on its own")),

        NlmError::LockfileParse { file, reason } => ErrorContext::new(error.clone())
            .with_suggestion(format!("Fix or delete {file} and reinstall the linked packages"))
            .with_details(reason.clone()),

        NlmError::StoreIndexParse { file, reason } => ErrorContext::new(error.clone())
            .with_suggestion(format!("Fix or delete {file}; it is rebuilt on the next push"))
            .with_details(reason.clone()),

        NlmError::LinkRepairFailed { reason, .. } => ErrorContext::new(error.clone())
            .with_suggestion(if cfg!(windows) {
                "Enable Developer Mode or run as Administrator so symlinks can be created"
            } else {
                "Check permissions of the node_modules directory"
            })
            .with_details(reason.clone()),

        NlmError::SignatureIo { reason, .. } => ErrorContext::new(error.clone())
            .with_suggestion("Check that every published file is readable")
            .with_details(reason.clone()),

        _ => ErrorContext::new(error.clone()),
    }
}
