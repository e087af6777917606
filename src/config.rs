//! Host configuration.
//!
//! The host reads an optional TOML file named by `WEB_TOOLS_CONFIG`, then
//! applies the search crate's environment overrides on top:
//!
//! ```toml
//! max_output_bytes = 65536
//!
//! [search]
//! default_language = "vi"
//! fast_time_budget_ms = 2500
//! merge_priority = "deep_first"
//!
//! [search.browser]
//! executable = "/usr/bin/chromium"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tiered_search::SearchConfig;

use crate::error::{Result, ToolError};
use crate::tools::DEFAULT_MAX_BYTES;

/// Environment variable holding the path of the TOML config file.
pub const CONFIG_PATH_ENV: &str = "WEB_TOOLS_CONFIG";

/// Top-level configuration for the tool host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Upper bound on a single tool's output, in bytes.
    pub max_output_bytes: usize,
    /// Search, page fetch and wiki settings.
    pub search: SearchConfig,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            max_output_bytes: DEFAULT_MAX_BYTES,
            search: SearchConfig::default(),
        }
    }
}

impl ToolsConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Io`] if the file cannot be read and
    /// [`ToolError::Config`] if it cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ToolError::Io(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| ToolError::Config(format!("invalid config {}: {e}", path.display())))
    }

    /// Build the host configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`ToolsConfig::load`].
    pub fn from_env() -> Result<Self> {
        Self::load(|key| std::env::var(key).ok())
    }

    /// Build the host configuration from a key lookup.
    ///
    /// Reads the file named by [`CONFIG_PATH_ENV`] when set, applies search
    /// overrides (`USER_AGENT`, `LANG_DEFAULT`, `HTTP_TIMEOUT`, ...) and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Io`] or [`ToolError::Config`] when the file is
    /// unusable, and [`ToolError::Config`] for unparsable overrides or a
    /// configuration that fails validation.
    pub fn load<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = lookup(CONFIG_PATH_ENV)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let mut config = match file {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading config file");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.search.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::Config`] if `max_output_bytes` is zero or the
    /// search settings are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.max_output_bytes == 0 {
            return Err(ToolError::Config(
                "max_output_bytes must be greater than 0".into(),
            ));
        }
        self.search.validate()?;
        Ok(())
    }
}
