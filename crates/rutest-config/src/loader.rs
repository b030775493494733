//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{is_valid_isolation, ProjectConfig, RunnerConfig};
use crate::{ConfigError, ConfigResult, PROJECT_CONFIG_FILE};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.rutest/config.toml) - lowest priority
/// 2. Project config (./rutest.toml) - overrides global
/// 3. Environment variables (RUTEST_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Global config path; resolved from the home directory when unset
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Effective runner settings (global, project and environment merged)
    pub runner: RunnerConfig,

    /// Project root directory (where rutest.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use an explicit global config file instead of ~/.rutest/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find rutest.toml, then merges it over the
    /// global config if one exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        self.assemble(project_root, project_config)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let project_root = config_path.parent().map(|p| p.to_path_buf());
        self.assemble(project_root, project_config)
    }

    fn assemble(
        &mut self,
        project_root: Option<PathBuf>,
        project: ProjectConfig,
    ) -> ConfigResult<Config> {
        let global = self.load_global_config()?;

        let mut runner = global.runner.unwrap_or_default();
        if let Some(project_runner) = &project.runner {
            runner.merge(project_runner);
        }
        apply_env_overrides(&mut runner)?;

        Ok(Config {
            project,
            runner,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration; a missing file or home directory yields defaults
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        if self.global_config_path.is_none() {
            match GlobalConfig::global_config_path() {
                Ok(path) => self.global_config_path = Some(path),
                Err(ConfigError::HomeNotFound) => return Ok(GlobalConfig::default()),
                Err(e) => return Err(e),
            }
        }

        match &self.global_config_path {
            Some(path) if path.exists() => GlobalConfig::load_from_file(path),
            _ => Ok(GlobalConfig::default()),
        }
    }
}

/// Apply environment variable overrides to the runner settings
///
/// Recognised variables: RUTEST_TIMEOUT_MS, RUTEST_ISOLATION, RUTEST_VERBOSE,
/// RUTEST_NO_COLOR and the standard NO_COLOR.
fn apply_env_overrides(runner: &mut RunnerConfig) -> ConfigResult<()> {
    if let Ok(timeout) = env::var("RUTEST_TIMEOUT_MS") {
        let parsed = timeout
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "RUTEST_TIMEOUT_MS".to_string(),
                reason: e.to_string(),
            })?;
        runner.timeout_ms = Some(parsed);
    }

    if let Ok(isolation) = env::var("RUTEST_ISOLATION") {
        if !is_valid_isolation(&isolation) {
            return Err(ConfigError::InvalidValue {
                field: "RUTEST_ISOLATION".to_string(),
                reason: format!("must be 'process' or 'in-process', got '{}'", isolation),
            });
        }
        runner.isolation = Some(isolation);
    }

    if let Ok(verbose) = env::var("RUTEST_VERBOSE") {
        runner.verbose = Some(is_truthy(&verbose));
    }

    if env::var("RUTEST_NO_COLOR").is_ok() || env::var("NO_COLOR").is_ok() {
        runner.color = Some(false);
    }

    Ok(())
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Effective per-case timeout; `None` when unset or zero
    pub fn timeout_ms(&self) -> Option<u64> {
        self.runner.timeout_ms.filter(|ms| *ms > 0)
    }

    /// Effective isolation mode name, if configured
    pub fn isolation(&self) -> Option<&str> {
        self.runner.isolation.as_deref()
    }

    /// Whether verbose output is requested
    pub fn verbose(&self) -> bool {
        self.runner.verbose.unwrap_or(false)
    }

    /// Whether color output is allowed
    pub fn color(&self) -> bool {
        self.runner.color.unwrap_or(true)
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has rutest.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Configured `[executables] working_dir`, relative to the project root.
    /// `None` when unset; executables then run in their own directory.
    pub fn executables_working_dir(&self) -> Option<PathBuf> {
        let root = self.project_root.as_deref();
        let configured = self
            .project
            .executables
            .as_ref()
            .and_then(|e| e.working_dir.as_deref());

        match (root, configured) {
            (Some(root), Some(dir)) => Some(root.join(dir)),
            (None, Some(dir)) => Some(dir.to_path_buf()),
            (_, None) => None,
        }
    }
}
