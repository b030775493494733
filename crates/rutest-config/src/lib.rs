//! rutest configuration
//!
//! Provides configuration management for rutest suites and the `rutest` CLI:
//! - Project configuration (rutest.toml)
//! - Global user configuration (~/.rutest/config.toml)
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.rutest/config.toml)
//! 2. Project config (./rutest.toml)
//! 3. Environment variables (RUTEST_*)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use rutest_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("timeout: {:?}", config.timeout_ms());
//! ```

pub mod global;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {}: {error}", .file.display())]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use project::{ExecutablesConfig, ProjectConfig, RunnerConfig};

/// Name of the project configuration file
pub const PROJECT_CONFIG_FILE: &str = "rutest.toml";
