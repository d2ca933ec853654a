//! Configuration file
//!
//! ```json
//! { "data_dir": "./sheetscope-data", "dataset": "./people.json",
//!   "layout": "people", "page_size": 10, "debounce_ms": 1000,
//!   "max_attachment_bytes": 5242880, "identity": "surrogate",
//!   "log_level": "info" }
//! ```
//!
//! Only `data_dir` is required.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::annotations::{AttachmentPolicy, DEFAULT_FLUSH_WINDOW_MS, DEFAULT_MAX_ATTACHMENT_BYTES};
use crate::observability::Severity;
use crate::records::{ColumnLayout, IdentityMode};
use crate::session::{SessionOptions, DEFAULT_PAGE_SIZE};

use super::errors::{CliError, CliResult};

const DEFAULT_DATASET_FILE: &str = "dataset.json";
const STORE_DIR: &str = "store";

/// Column layout selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayoutChoice {
    /// `"people"` or `"inferred"`
    Named(String),
    Inline(ColumnLayout),
}

impl Default for LayoutChoice {
    fn default() -> Self {
        LayoutChoice::Named("inferred".to_string())
    }
}

impl LayoutChoice {
    /// `None` means infer from the dataset
    pub fn resolve(&self) -> CliResult<Option<ColumnLayout>> {
        match self {
            LayoutChoice::Named(name) => match name.as_str() {
                "people" => Ok(Some(ColumnLayout::people())),
                "inferred" => Ok(None),
                other => Err(CliError::config_error(format!(
                    "Invalid layout: '{}'. Must be 'people', 'inferred' or an inline layout.",
                    other
                ))),
            },
            LayoutChoice::Inline(layout) => Ok(Some(layout.clone())),
        }
    }
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Dataset file (optional, default `<data_dir>/dataset.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,

    #[serde(default)]
    pub layout: LayoutChoice,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Annotation write debounce window
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: u64,

    #[serde(default)]
    pub identity: IdentityMode,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}
fn default_debounce_ms() -> u64 {
    DEFAULT_FLUSH_WINDOW_MS as u64
}
fn default_max_attachment_bytes() -> u64 {
    DEFAULT_MAX_ATTACHMENT_BYTES
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Config with every default and the given data directory
    pub fn with_data_dir(data_dir: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            dataset: None,
            layout: LayoutChoice::default(),
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            max_attachment_bytes: default_max_attachment_bytes(),
            identity: IdentityMode::default(),
            log_level: default_log_level(),
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Write configuration as pretty JSON
    pub fn save(&self, path: &Path) -> CliResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| CliError::config_error(format!("Failed to encode config: {}", e)))?;
        fs::write(path, content)
            .map_err(|e| CliError::config_error(format!("Failed to write config: {}", e)))
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if self.page_size == 0 {
            return Err(CliError::config_error("page_size must be > 0"));
        }

        if self.debounce_ms == 0 {
            return Err(CliError::config_error("debounce_ms must be > 0"));
        }

        if self.max_attachment_bytes == 0 {
            return Err(CliError::config_error("max_attachment_bytes must be > 0"));
        }

        self.severity()?;
        self.layout.resolve()?;

        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Where the durable key-value files live
    pub fn store_path(&self) -> PathBuf {
        self.data_path().join(STORE_DIR)
    }

    pub fn dataset_path(&self) -> PathBuf {
        match &self.dataset {
            Some(path) => PathBuf::from(path),
            None => self.data_path().join(DEFAULT_DATASET_FILE),
        }
    }

    /// Minimum log severity
    pub fn severity(&self) -> CliResult<Severity> {
        Severity::parse(&self.log_level).ok_or_else(|| {
            CliError::config_error(format!(
                "Invalid log_level: '{}'. Must be trace, info, warn or error.",
                self.log_level
            ))
        })
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            page_size: self.page_size,
            debounce: Duration::milliseconds(self.debounce_ms as i64),
            policy: AttachmentPolicy::default().with_max_bytes(self.max_attachment_bytes),
        }
    }
}
