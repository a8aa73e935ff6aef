//! Configuration files.
//!
//! The same [`NlmConfig`] shape is stored in two places:
//!
//! - global: `<store>/config.toml`
//! - project: `<project>/.nlm/config.toml`
//!
//! ```toml
//! package_manager = "pnpm"
//! lang = "en"
//! ```
//!
//! Project values override global ones; unset keys fall through.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::constants::{CONFIG_FILE_NAME, PROJECT_NLM_DIR};
use crate::core::NlmError;

/// Message language. Only recorded; all output is English.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
        }
    }
}

/// Keys accepted by `nlm config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    PackageManager,
    Lang,
}

impl ConfigKey {
    pub fn parse(key: &str) -> Result<Self, NlmError> {
        match key {
            "packageManager" | "package_manager" | "package-manager" => Ok(Self::PackageManager),
            "lang" => Ok(Self::Lang),
            other => Err(NlmError::ConfigError {
                message: format!("Unknown configuration key '{other}' (expected packageManager or lang)"),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NlmConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<Locale>,
}

impl NlmConfig {
    /// Load from `path`; a missing file is the default configuration.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content).map_err(|e| {
            NlmError::ConfigError {
                message: format!("Failed to parse {}: {e}", path.display()),
            }
            .into()
        })
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    #[must_use]
    pub fn global_path(store_dir: &Path) -> PathBuf {
        store_dir.join(CONFIG_FILE_NAME)
    }

    #[must_use]
    pub fn project_path(project_dir: &Path) -> PathBuf {
        project_dir.join(PROJECT_NLM_DIR).join(CONFIG_FILE_NAME)
    }

    /// `self` with every key set in `overrides` replaced.
    #[must_use]
    pub fn merged_with(&self, overrides: &Self) -> Self {
        Self {
            package_manager: overrides
                .package_manager
                .clone()
                .or_else(|| self.package_manager.clone()),
            lang: overrides.lang.or(self.lang),
        }
    }

    #[must_use]
    pub fn get(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::PackageManager => self.package_manager.clone(),
            ConfigKey::Lang => self.lang.map(|l| l.as_str().to_string()),
        }
    }

    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<(), NlmError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(NlmError::ConfigError {
                message: "Configuration values cannot be empty".to_string(),
            });
        }
        match key {
            ConfigKey::PackageManager => self.package_manager = Some(value.to_string()),
            ConfigKey::Lang => {
                self.lang = Some(match value {
                    "en" => Locale::En,
                    "zh" => Locale::Zh,
                    other => {
                        return Err(NlmError::ConfigError {
                            message: format!("Unsupported language '{other}' (expected en or zh)"),
                        });
                    }
                });
            }
        }
        Ok(())
    }

    pub fn unset(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::PackageManager => self.package_manager = None,
            ConfigKey::Lang => self.lang = None,
        }
    }
}
