//! Configuration module for stack-probe
//!
//! This module handles probe configuration including:
//! - Thread report layout (name column cap, default row limit)
//! - Initial CPU-time / contention monitoring flags and the procfs root
//! - Logging filter and optional log file
//!
//! Runtime-mutable state lives in [`settings`].
//!
//! # Config Location
//!
//! The default config file is stored in the platform-appropriate location:
//! - **Linux**: `~/.config/dev.hxyulin.stack-probe/probe.toml`
//! - **macOS**: `~/Library/Application Support/dev.hxyulin.stack-probe/probe.toml`
//! - **Windows**: `%APPDATA%\dev.hxyulin.stack-probe\probe.toml`
//!
//! # Example
//!
//! ```ignore
//! use stack_probe::config::ProbeConfig;
//!
//! let config = ProbeConfig::load_or_default("probe.toml");
//! assert_eq!(config.threads.max_name_width, 50);
//! ```

pub mod settings;

pub use settings::*;

use crate::error::{ProbeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for config directories
pub const APP_ID: &str = "dev.hxyulin.stack-probe";

/// Config filename
pub const CONFIG_FILE: &str = "probe.toml";

/// Default cap on the thread-name column of the `threads` table
pub const DEFAULT_MAX_THREAD_NAME_WIDTH: usize = 50;

/// Default procfs directory listing this process's threads
pub const DEFAULT_TASK_ROOT: &str = "/proc/self/task";

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

/// Complete probe configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Node name, attached to log output
    pub node_name: String,

    /// Thread report settings
    pub threads: ThreadReportConfig,

    /// Platform monitoring settings
    pub monitoring: MonitoringConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            node_name: "node".to_string(),
            threads: ThreadReportConfig::default(),
            monitoring: MonitoringConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ProbeConfig {
    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProbeError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            ProbeError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })
    }

    /// Load a config file, returning defaults if any error occurs
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Using default config: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ProbeError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ProbeError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            ProbeError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }
}

/// Layout of the `threads` report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadReportConfig {
    /// Cap on the thread-name column width
    pub max_name_width: usize,

    /// Row limit used when a command gives none (0 = unlimited)
    pub default_limit: usize,
}

impl Default for ThreadReportConfig {
    fn default() -> Self {
        Self {
            max_name_width: DEFAULT_MAX_THREAD_NAME_WIDTH,
            default_limit: 0,
        }
    }
}

/// Initial monitoring state and platform source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Start with CPU-time monitoring enabled
    pub cpu: bool,

    /// Start with contention monitoring enabled
    pub contention: bool,

    /// procfs directory listing the threads of this process
    pub task_root: PathBuf,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            cpu: true,
            contention: false,
            task_root: PathBuf::from(DEFAULT_TASK_ROOT),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence
    pub filter: String,

    /// Optional log file; enables a non-blocking file writer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            file: None,
        }
    }
}

// ==================== Tests ====================
