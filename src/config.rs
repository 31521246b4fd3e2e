//! Decode configuration
//!
//! Loaded from JSON. Every key is optional; missing keys take the defaults
//! below.
//!
//! ```json
//! {
//!   "max_array_elements": 1048576,
//!   "max_nesting_depth": 64,
//!   "default_endianness": "le",
//!   "log_failures": false,
//!   "log_level": "info"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interpreter::{DecodeLimits, DEFAULT_MAX_ARRAY_ELEMENTS, DEFAULT_MAX_NESTING_DEPTH};
use crate::observability::{log_event, Event, Severity};
use crate::schema::Endianness;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid config value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Limits and defaults applied to every decode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// Largest element count one array field may request
    #[serde(default = "default_max_array_elements")]
    pub max_array_elements: usize,

    /// Deepest chain of nested or embedded schemas
    #[serde(default = "default_max_nesting_depth")]
    pub max_nesting_depth: usize,

    /// Byte order of primitives declared without `le`/`be`
    #[serde(default = "default_endianness")]
    pub default_endianness: String,

    /// Log failed and partial decodes at WARN
    #[serde(default)]
    pub log_failures: bool,

    /// Minimum severity written by the logger
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_array_elements() -> usize {
    DEFAULT_MAX_ARRAY_ELEMENTS
}

fn default_max_nesting_depth() -> usize {
    DEFAULT_MAX_NESTING_DEPTH
}

fn default_endianness() -> String {
    "le".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_array_elements: default_max_array_elements(),
            max_nesting_depth: default_max_nesting_depth(),
            default_endianness: default_endianness(),
            log_failures: false,
            log_level: default_log_level(),
        }
    }
}

impl DecodeConfig {
    /// Reads and validates a JSON config file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        log_event(
            Event::ConfigLoaded,
            &[
                ("path", &path.display().to_string()),
                ("max_array_elements", &config.max_array_elements.to_string()),
                ("max_nesting_depth", &config.max_nesting_depth.to_string()),
            ],
        );
        Ok(config)
    }

    /// Parses and validates JSON config text
    pub fn from_json_str(text: &str) -> ConfigResult<Self> {
        let config: DecodeConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_array_elements == 0 {
            return Err(ConfigError::invalid("max_array_elements", "must be at least 1"));
        }
        if self.max_nesting_depth == 0 {
            return Err(ConfigError::invalid("max_nesting_depth", "must be at least 1"));
        }
        self.endianness()?;
        self.severity()?;
        Ok(())
    }

    pub fn endianness(&self) -> ConfigResult<Endianness> {
        Endianness::from_keyword(&self.default_endianness).ok_or_else(|| {
            ConfigError::invalid(
                "default_endianness",
                format!("expected 'le' or 'be', got '{}'", self.default_endianness),
            )
        })
    }

    pub fn severity(&self) -> ConfigResult<Severity> {
        Severity::from_name(&self.log_level).ok_or_else(|| {
            ConfigError::invalid("log_level", format!("unknown level '{}'", self.log_level))
        })
    }

    pub fn limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_array_elements: self.max_array_elements,
            max_nesting_depth: self.max_nesting_depth,
        }
    }
}
