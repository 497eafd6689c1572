//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/skai/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/skai/` (~/.config/skai/)
//! - Data: `$XDG_DATA_HOME/skai/` (~/.local/share/skai/)
//! - State/Logs: `$XDG_STATE_HOME/skai/` (~/.local/state/skai/)

use crate::error::{Error, Result};
use crate::operations::OperationKind;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Sign-in behaviour and the persisted session slot
    #[serde(default)]
    pub session: SessionConfig,

    /// Mock operation timings and failure injection
    #[serde(default)]
    pub operations: OperationsConfig,

    /// Display language
    #[serde(default)]
    pub locale: LocaleConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Session configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// Artificial delay applied to every sign-in attempt
    #[serde(default = "default_auth_latency")]
    pub auth_latency_ms: u64,

    /// Name of the key-value slot holding the signed-in user
    #[serde(default = "default_session_slot")]
    pub slot: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auth_latency_ms: default_auth_latency(),
            slot: default_session_slot(),
        }
    }
}

impl SessionConfig {
    pub fn auth_latency(&self) -> Duration {
        Duration::from_millis(self.auth_latency_ms)
    }
}

fn default_auth_latency() -> u64 {
    1500
}

fn default_session_slot() -> String {
    "humanitarian_user".to_string()
}

/// Mock operation configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OperationsConfig {
    #[serde(default = "default_enhance_ms")]
    pub enhance_ms: u64,

    #[serde(default = "default_analyze_ms")]
    pub analyze_ms: u64,

    #[serde(default = "default_summarize_ms")]
    pub summarize_ms: u64,

    #[serde(default = "default_report_ms")]
    pub report_ms: u64,

    /// Delay before the chat assistant answers
    #[serde(default = "default_chat_reply_ms")]
    pub chat_reply_ms: u64,

    /// Operation kinds that always end in failure (testing hook)
    #[serde(default)]
    pub fail: Vec<OperationKind>,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            enhance_ms: default_enhance_ms(),
            analyze_ms: default_analyze_ms(),
            summarize_ms: default_summarize_ms(),
            report_ms: default_report_ms(),
            chat_reply_ms: default_chat_reply_ms(),
            fail: vec![],
        }
    }
}

impl OperationsConfig {
    /// Fixed duration for an operation kind
    pub fn duration_for(&self, kind: OperationKind) -> Duration {
        let ms = match kind {
            OperationKind::Enhance => self.enhance_ms,
            OperationKind::Analyze => self.analyze_ms,
            OperationKind::Summarize => self.summarize_ms,
            OperationKind::GenerateReport => self.report_ms,
        };
        Duration::from_millis(ms)
    }

    pub fn chat_reply_delay(&self) -> Duration {
        Duration::from_millis(self.chat_reply_ms)
    }

    /// Every operation (and the chat reply) completes immediately.
    pub fn instant() -> Self {
        Self {
            enhance_ms: 0,
            analyze_ms: 0,
            summarize_ms: 0,
            report_ms: 0,
            chat_reply_ms: 0,
            fail: vec![],
        }
    }
}

fn default_enhance_ms() -> u64 {
    3000
}

fn default_analyze_ms() -> u64 {
    4000
}

fn default_summarize_ms() -> u64 {
    2500
}

fn default_report_ms() -> u64 {
    2000
}

fn default_chat_reply_ms() -> u64 {
    1500
}

/// Locale configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LocaleConfig {
    /// Initial language code (en, es, fr, ht, ar, zh)
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.session.slot.trim().is_empty() {
            return Err(Error::Config(
                "session.slot must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/skai/config.toml` (~/.config/skai/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("skai").join("config.toml")
    }

    /// Returns the data directory path (for the SQLite key-value store)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("skai")
    }

    /// Returns the state directory path (for logs)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("skai")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/skai/skai.db` (~/.local/share/skai/skai.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("skai.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.session.slot, "humanitarian_user");
        assert_eq!(config.session.auth_latency_ms, 1500);
        assert_eq!(config.operations.enhance_ms, 3000);
        assert_eq!(config.operations.analyze_ms, 4000);
        assert_eq!(config.operations.report_ms, 2000);
        assert_eq!(config.operations.chat_reply_ms, 1500);
        assert!(config.operations.fail.is_empty());
        assert_eq!(config.locale.language, "en");
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[session]
auth_latency_ms = 10

[operations]
enhance_ms = 5
fail = ["analyze", "generate-report"]

[locale]
language = "es"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.session.auth_latency(), Duration::from_millis(10));
        assert_eq!(config.session.slot, "humanitarian_user");
        assert_eq!(
            config.operations.duration_for(OperationKind::Enhance),
            Duration::from_millis(5)
        );
        assert_eq!(
            config.operations.duration_for(OperationKind::Analyze),
            Duration::from_millis(4000)
        );
        assert_eq!(
            config.operations.fail,
            vec![OperationKind::Analyze, OperationKind::GenerateReport]
        );
        assert_eq!(config.locale.language, "es");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_blank_slot_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\nslot = \"  \"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_unknown_operation_kind_rejected() {
        let toml = r#"
[operations]
fail = ["teleport"]
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }
}
