//! Server configuration loaded from TOML with environment overrides.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_new::new;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// SMTP relay settings. Mail is only sent when this section is present.
#[derive(Debug, Clone, Getters, Serialize, Deserialize, new)]
pub struct SmtpConfig {
    /// Relay host name.
    host: String,

    /// Relay port (STARTTLS).
    #[serde(default = "default_smtp_port")]
    port: u16,

    /// Login user.
    username: String,

    /// Login password. Usually supplied through `SMTP_PASSWORD`.
    #[serde(default, skip_serializing)]
    password: String,

    /// `From:` address.
    sender: String,
}

/// Configuration for the game server.
#[derive(Debug, Clone, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_", into)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// SQLite database file for finished games.
    #[serde(default = "default_db_path")]
    db_path: String,

    /// Directory for plain-text game logs.
    #[serde(default = "default_game_log_dir")]
    game_log_dir: PathBuf,

    /// Endpoint proxied by `GET /api/quote`.
    #[serde(default = "default_quote_url")]
    quote_url: String,

    /// Optional SMTP relay.
    #[serde(default)]
    #[setters(skip)]
    smtp: Option<SmtpConfig>,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5555
}

fn default_db_path() -> String {
    "noughts.db".to_string()
}

fn default_game_log_dir() -> PathBuf {
    PathBuf::from("game_logs")
}

fn default_quote_url() -> String {
    "https://zenquotes.io/api/today".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            game_log_dir: default_game_log_dir(),
            quote_url: default_quote_url(),
            smtp: None,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the file if it exists, falling back to defaults, then applies
    /// `NOUGHTS_DB_PATH` and `SMTP_PASSWORD` from the environment.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            Self::from_file(path)?
        } else {
            info!("Config file not found, using defaults");
            Self::default()
        };
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    /// Applies environment overrides read through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(db_path) = lookup("NOUGHTS_DB_PATH") {
            debug!(db_path = %db_path, "Database path overridden from environment");
            self.db_path = db_path;
        }
        if let (Some(smtp), Some(password)) = (self.smtp.as_mut(), lookup("SMTP_PASSWORD")) {
            debug!("SMTP password taken from environment");
            smtp.password = password;
        }
        self
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
