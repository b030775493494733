//! Global Configuration (~/.rutest/config.toml)
//!
//! Handles user-level runner defaults stored in `~/.rutest/config.toml`.

use crate::project::RunnerConfig;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.rutest/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Runner defaults applied to every project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runner: Option<RunnerConfig>,
}

impl GlobalConfig {
    /// Load global configuration from a file
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

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(runner) = &self.runner {
            runner.validate("runner")?;
        }
        Ok(())
    }

    /// Get the global config file path (~/.rutest/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".rutest").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_runner_defaults() {
        let toml = r#"
[runner]
timeout_ms = 10000
color = false
"#;
        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.runner.unwrap().timeout_ms, Some(10000));
    }

    #[test]
    fn test_global_rejects_executables_section() {
        let toml = r#"
[executables]
patterns = ["a"]
"#;
        let result: Result<GlobalConfig, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_config_path_under_home() {
        if let Some(home) = dirs::home_dir() {
            let path = GlobalConfig::global_config_path().unwrap();
            assert_eq!(path, home.join(".rutest").join("config.toml"));
        }
    }
}
