//! Configuration file loading and parsing.
//!
//! gh-issues reads optional settings from `.gh-issues.toml` in the current
//! directory (or the file named by `GH_ISSUES_CONFIG`). If no config file
//! exists, the system falls back to sensible defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::output::OutputMode;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE: &str = ".gh-issues.toml";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "GH_ISSUES_CONFIG";

/// Environment variable overriding the backend program.
pub const BACKEND_ENV: &str = "GH_ISSUES_BACKEND";

const DEFAULT_PROGRAM: &str = "gh";
const DEFAULT_LIMIT: u32 = 30;

/// Contents of `.gh-issues.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Backend executable (default: gh).
    pub program: Option<String>,
    /// Result limit for list and search (default: 30).
    pub default_limit: Option<u32>,
    /// Output mode when `--output` is not given (default: human).
    pub default_output: Option<OutputMode>,
}

impl FileConfig {
    /// Load configuration from `path` if it exists.
    ///
    /// Returns an empty config if the file doesn't exist.
    /// Returns an error if the file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(FileConfig::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// Effective settings after applying file, environment and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub program: String,
    pub default_limit: u32,
    pub default_output: OutputMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            default_limit: DEFAULT_LIMIT,
            default_output: OutputMode::Human,
        }
    }
}

impl Settings {
    /// Merge a file config with an optional backend override.
    pub fn resolve(file: FileConfig, backend_override: Option<String>) -> Self {
        let defaults = Settings::default();
        Self {
            program: backend_override
                .filter(|p| !p.trim().is_empty())
                .or(file.program)
                .unwrap_or(defaults.program),
            default_limit: file
                .default_limit
                .filter(|l| *l > 0)
                .unwrap_or(defaults.default_limit),
            default_output: file.default_output.unwrap_or(defaults.default_output),
        }
    }

    /// Load settings for a process started in `cwd`, honoring the
    /// `GH_ISSUES_CONFIG` and `GH_ISSUES_BACKEND` environment variables.
    pub fn from_env(cwd: &Path) -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| cwd.join(CONFIG_FILE));

        let file = FileConfig::load(&path)?;
        Ok(Self::resolve(file, std::env::var(BACKEND_ENV).ok()))
    }
}
