//! Project Configuration (rutest.toml)
//!
//! Handles project-level configuration stored in `rutest.toml`, found by
//! walking up from the directory a suite or the CLI is started in.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration from rutest.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Runner defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner: Option<RunnerConfig>,

    /// Test executables driven by the `rutest` CLI
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executables: Option<ExecutablesConfig>,
}

/// `[runner]` section, shared by project and global configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Per-case timeout in milliseconds (0 disables the timeout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Case isolation: "process" or "in-process"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isolation: Option<String>,

    /// Print one line per case instead of progress dots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,

    /// Colorize console output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

/// `[executables]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ExecutablesConfig {
    /// Glob patterns selecting test executables
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,

    /// Directory the executables are started in (default: the project root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(runner) = &self.runner {
            runner.validate("runner")?;
        }

        if let Some(executables) = &self.executables {
            if executables.patterns.iter().any(|p| p.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field: "executables.patterns".to_string(),
                    reason: "patterns cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Executable glob patterns, if any are configured
    pub fn executable_patterns(&self) -> &[String] {
        self.executables
            .as_ref()
            .map(|e| e.patterns.as_slice())
            .unwrap_or(&[])
    }

    /// Merge another project config into this one
    /// Other config takes precedence for non-None values
    pub fn merge(&mut self, other: &ProjectConfig) {
        match (&mut self.runner, &other.runner) {
            (Some(base), Some(over)) => base.merge(over),
            (None, Some(over)) => self.runner = Some(over.clone()),
            _ => {}
        }
        if other.executables.is_some() {
            self.executables = other.executables.clone();
        }
    }
}

impl RunnerConfig {
    /// Validate field values; `section` prefixes field names in errors
    pub fn validate(&self, section: &str) -> ConfigResult<()> {
        if let Some(isolation) = &self.isolation {
            if !is_valid_isolation(isolation) {
                return Err(ConfigError::InvalidValue {
                    field: format!("{}.isolation", section),
                    reason: format!("must be 'process' or 'in-process', got '{}'", isolation),
                });
            }
        }
        Ok(())
    }

    /// Field-wise merge; `other` wins where it is set
    pub fn merge(&mut self, other: &RunnerConfig) {
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
        if other.isolation.is_some() {
            self.isolation = other.isolation.clone();
        }
        if other.verbose.is_some() {
            self.verbose = other.verbose;
        }
        if other.color.is_some() {
            self.color = other.color;
        }
    }
}

/// Check if an isolation mode name is recognised
pub fn is_valid_isolation(value: &str) -> bool {
    matches!(value, "process" | "in-process")
}
