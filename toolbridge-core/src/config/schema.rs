//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for toolbridge
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Gemini CLI backend
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Z.ai GLM API backend
    #[serde(default)]
    pub zai: ZaiConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}

/// Gemini CLI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Executable name or path of the gemini CLI
    #[serde(default = "default_gemini_binary")]
    pub binary: String,
    /// Model passed with `-m` when a call does not choose one.
    /// `None` leaves the choice to the CLI.
    #[serde(default)]
    pub default_model: Option<String>,
    /// Bound on prompt invocations, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Bound on `--list-sessions` / `--delete-session`, in seconds
    #[serde(default = "default_admin_timeout_secs")]
    pub admin_timeout_secs: u64,
    /// Default for the stateless chat `yolo` flag
    #[serde(default = "default_yolo")]
    pub yolo: bool,
}

fn default_gemini_binary() -> String {
    "gemini".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_admin_timeout_secs() -> u64 {
    30
}

fn default_yolo() -> bool {
    true
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            binary: default_gemini_binary(),
            default_model: None,
            timeout_secs: default_timeout_secs(),
            admin_timeout_secs: default_admin_timeout_secs(),
            yolo: default_yolo(),
        }
    }
}

/// Z.ai API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZaiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_zai_api_base")]
    pub api_base: String,
    #[serde(default = "default_zai_model")]
    pub default_model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_zai_api_base() -> String {
    "https://api.z.ai/api/paas/v4".to_string()
}

fn default_zai_model() -> String {
    "glm-4.7".to_string()
}

impl Default for ZaiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: default_zai_api_base(),
            default_model: default_zai_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
