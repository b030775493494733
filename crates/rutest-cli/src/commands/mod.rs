//! CLI command implementations

pub mod list;
pub mod run;

use anyhow::{bail, Context, Result};
use rutest::ExecutableRunner;
use rutest_config::{Config, ConfigLoader};
use std::path::{Path, PathBuf};

/// Load configuration for the current directory
pub fn load_config() -> Result<Config> {
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    ConfigLoader::new()
        .load_from_directory(&cwd)
        .context("failed to load configuration")
}

/// Executables to drive: the explicit arguments, else the configured patterns.
///
/// Each runs in the configured working directory, else in its own directory.
pub fn resolve_executables(explicit: &[PathBuf], config: &Config) -> Result<Vec<ExecutableRunner>> {
    let working_dir = config.executables_working_dir();

    let paths = if explicit.is_empty() {
        let base = match working_dir.as_deref().or(config.project_root()) {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir()?,
        };
        expand_patterns(config.project.executable_patterns(), &base)?
    } else {
        explicit.iter().map(|path| absolute(path)).collect()
    };

    tracing::debug!(count = paths.len(), ?working_dir, "resolved executables");

    Ok(paths
        .into_iter()
        .map(|path| {
            let runner = ExecutableRunner::new(path);
            match &working_dir {
                Some(dir) => runner.with_working_dir(dir),
                None => runner,
            }
        })
        .collect())
}

/// Expand glob patterns relative to `base` into a sorted list of files
fn expand_patterns(patterns: &[String], base: &Path) -> Result<Vec<PathBuf>> {
    if patterns.is_empty() {
        bail!("no test executables given and no [executables] patterns configured in rutest.toml");
    }

    let mut found = Vec::new();
    for pattern in patterns {
        let full = if Path::new(pattern).is_absolute() {
            PathBuf::from(pattern)
        } else {
            base.join(pattern)
        };
        let full = full.to_string_lossy().into_owned();

        for entry in glob::glob(&full).with_context(|| format!("invalid pattern '{}'", pattern))? {
            let path = entry.with_context(|| format!("cannot read match of '{}'", pattern))?;
            if path.is_file() {
                found.push(path);
            }
        }
    }

    found.sort();
    found.dedup();

    if found.is_empty() {
        bail!("no test executables match {}", patterns.join(", "));
    }
    Ok(found)
}

/// Existing paths become absolute so a configured working directory can't
/// change what they point at; anything else is left for PATH lookup.
fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
