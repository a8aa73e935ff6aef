//! The per-invocation runtime context.
//!
//! Built once from CLI flags and configuration files, then passed by
//! reference into every component. Nothing reads process-wide mutable
//! state, so a push can refresh other projects simply by deriving a
//! context for each of them with [`Runtime::for_project`].

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::global::{Locale, NlmConfig};
use crate::constants::{DEFAULT_PACKAGE_MANAGER, MANIFEST_FILE_NAME, NODE_MODULES, PROJECT_NLM_DIR};
use crate::store::Store;
use crate::utils::platform::{absolutize, default_store_dir};

/// Inputs gathered from the command line.
#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    pub working_dir: Option<PathBuf>,
    pub store_dir: Option<PathBuf>,
    pub force: bool,
    pub debug: bool,
    pub locale: Option<Locale>,
    pub package_manager: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Runtime {
    pub working_dir: PathBuf,
    pub store_dir: PathBuf,
    pub force: bool,
    pub debug: bool,
    pub locale: Locale,
    /// `--package-manager` from the command line; beats every config file.
    pub forced_package_manager: Option<String>,
    /// Global configuration merged with the project's.
    pub config: NlmConfig,
    global_config: NlmConfig,
}

impl Runtime {
    pub async fn load(options: RuntimeOptions) -> Result<Self> {
        let working_dir = match options.working_dir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        let working_dir = canonical(&working_dir)?;
        let store_dir = match options.store_dir {
            Some(dir) => absolutize(&dir)?,
            None => default_store_dir()?,
        };

        let global_config = NlmConfig::load_from(&NlmConfig::global_path(&store_dir)).await?;
        let project_config = NlmConfig::load_from(&NlmConfig::project_path(&working_dir)).await?;
        let config = global_config.merged_with(&project_config);

        let locale = options.locale.or(config.lang).unwrap_or_default();
        tracing::debug!(
            "Runtime: project={}, store={}, locale={}",
            working_dir.display(),
            store_dir.display(),
            locale.as_str()
        );

        Ok(Self {
            working_dir,
            store_dir,
            force: options.force,
            debug: options.debug,
            locale,
            forced_package_manager: options.package_manager,
            config,
            global_config,
        })
    }

    /// The same invocation, acting on another project.
    pub async fn for_project(&self, project: &Path) -> Result<Self> {
        let project_config = NlmConfig::load_from(&NlmConfig::project_path(project)).await?;
        Ok(Self {
            working_dir: project.to_path_buf(),
            config: self.global_config.merged_with(&project_config),
            ..self.clone()
        })
    }

    #[must_use]
    pub fn store(&self) -> Store {
        Store::new(&self.store_dir)
    }

    /// CLI flag, then project config, then global config, then npm.
    #[must_use]
    pub fn package_manager(&self) -> String {
        self.forced_package_manager
            .clone()
            .or_else(|| self.config.package_manager.clone())
            .unwrap_or_else(|| DEFAULT_PACKAGE_MANAGER.to_string())
    }

    #[must_use]
    pub fn nlm_dir(&self) -> PathBuf {
        self.working_dir.join(PROJECT_NLM_DIR)
    }

    /// Private copy of `name`: `<project>/.nlm/<name>`.
    #[must_use]
    pub fn private_dir(&self, name: &str) -> PathBuf {
        self.nlm_dir().join(name)
    }

    /// Link location of `name`: `<project>/node_modules/<name>`.
    #[must_use]
    pub fn link_path(&self, name: &str) -> PathBuf {
        self.working_dir.join(NODE_MODULES).join(name)
    }

    /// An npm project has a package.json and an installed node_modules.
    #[must_use]
    pub fn is_valid_project(&self) -> bool {
        self.working_dir.join(MANIFEST_FILE_NAME).is_file()
            && self.working_dir.join(NODE_MODULES).is_dir()
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    match std::fs::canonicalize(path) {
        Ok(path) => Ok(path),
        Err(_) => absolutize(path),
    }
}
