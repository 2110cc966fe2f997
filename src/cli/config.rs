//! Configuration file
//!
//! ```json
//! {
//!   "dataset": "./dataset.json",
//!   "default_page_size": 25,
//!   "max_page_size": 1000,
//!   "explain_queries": false
//! }
//! ```
//!
//! A relative `dataset` path is resolved against the directory holding the
//! configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::observability::SearchEvent;

use super::errors::{CliError, CliResult};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Dataset file (required)
    pub dataset: PathBuf,

    /// Page size used when a request omits one (optional, default unbounded)
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,

    /// Largest page size a request may ask for (optional, default 1000)
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,

    /// Log compiled query text at TRACE (optional, default false)
    #[serde(default)]
    pub explain_queries: bool,

    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_page_size() -> i64 {
    -1
}
fn default_max_page_size() -> i64 {
    1000
}

impl SearchConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let mut config: SearchConfig = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let config_path = path.display().to_string();
        let dataset = config.dataset_path().display().to_string();
        SearchEvent::ConfigLoaded.log(&[
            ("config", config_path.as_str()),
            ("dataset", dataset.as_str()),
        ]);
        Ok(config)
    }

    /// Validate field ranges
    pub fn validate(&self) -> CliResult<()> {
        if self.dataset.as_os_str().is_empty() {
            return Err(CliError::config_error("dataset must not be empty"));
        }

        if self.max_page_size <= 0 {
            return Err(CliError::config_error("max_page_size must be > 0"));
        }

        if self.default_page_size > self.max_page_size {
            return Err(CliError::config_error(format!(
                "default_page_size ({}) exceeds max_page_size ({})",
                self.default_page_size, self.max_page_size
            )));
        }

        Ok(())
    }

    /// Dataset location, resolved against the config file's directory
    pub fn dataset_path(&self) -> PathBuf {
        if self.dataset.is_absolute() {
            self.dataset.clone()
        } else {
            self.base_dir.join(&self.dataset)
        }
    }

    /// Effective page size for a request.
    ///
    /// Sizes above `max_page_size` are capped; zero and negative sizes keep
    /// their unbounded meaning.
    pub fn page_size(&self, requested: Option<i64>) -> i64 {
        let size = requested.unwrap_or(self.default_page_size);
        size.min(self.max_page_size)
    }
}
