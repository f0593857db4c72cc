//! Configuration management for the Laderas report
//!
//! Handles loading configuration from an optional TOML file and environment
//! variables, and validates everything before the pipeline touches the
//! network or the file system.

use crate::ReportError;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Page the daily report is published on
pub const DEFAULT_SOURCE_URL: &str = "https://laderas.com.ar/parte-diario/";
/// Telegram Bot API endpoint
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "laderas.toml";

/// Environment variable holding the bot token
pub const BOT_TOKEN_ENV: &str = "TOKEN_TELEGRAM_BOT";
/// Environment variable holding the destination chat id
pub const CHAT_ID_ENV: &str = "CHAT_ID_TELEGRAM";
/// Environment variable overriding the config file path
pub const CONFIG_PATH_ENV: &str = "LADERAS_CONFIG";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Source page settings
    #[serde(default)]
    pub source: SourceConfig,
    /// Table image settings
    #[serde(default)]
    pub render: RenderConfig,
    /// Telegram delivery settings
    #[serde(default)]
    pub delivery: DeliveryConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Source page settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the daily report page
    #[serde(default = "default_source_url")]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Retries for transient failures (0 = fail on first error)
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Table image settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Directory to also save `table_{label}.png` files to
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// Telegram delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Base URL of the Bot API
    #[serde(default = "default_telegram_api_url")]
    pub api_base_url: String,
    /// Bot token, usually taken from `TOKEN_TELEGRAM_BOT`
    #[serde(default, skip_serializing)]
    pub bot_token: Option<SecretString>,
    /// Destination chat, usually taken from `CHAT_ID_TELEGRAM`
    #[serde(default)]
    pub chat_id: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Retries per outbound call (0 = fail on first error)
    #[serde(default)]
    pub max_retries: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Validated Telegram credentials
#[derive(Debug, Clone)]
pub struct TelegramCredentials {
    pub token: SecretString,
    /// Numeric chat id or `@channel` username
    pub chat_id: String,
}

// Default value functions
fn default_source_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_telegram_api_url() -> String {
    DEFAULT_TELEGRAM_API_URL.to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_user_agent() -> String {
    format!("laderas-report/{}", crate::VERSION)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            timeout_seconds: default_timeout(),
            max_retries: 0,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_telegram_api_url(),
            bot_token: None,
            chat_id: None,
            timeout_seconds: default_timeout(),
            max_retries: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Reads an environment variable, treating blank values as unset
fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl ReportConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path
            .or_else(|| non_empty_env(CONFIG_PATH_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(FileFormat::Toml),
            );
        }

        // LADERAS_DELIVERY__MAX_RETRIES=2 -> delivery.max_retries
        builder = builder.add_source(
            Environment::with_prefix("LADERAS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder = builder
            .set_override_option("delivery.bot_token", non_empty_env(BOT_TOKEN_ENV))
            .with_context(|| format!("Failed to read {BOT_TOKEN_ENV}"))?
            .set_override_option("delivery.chat_id", non_empty_env(CHAT_ID_ENV))
            .with_context(|| format!("Failed to read {CHAT_ID_ENV}"))?;

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: ReportConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.source.url.is_empty() {
            self.source.url = default_source_url();
        }
        if self.source.timeout_seconds == 0 {
            self.source.timeout_seconds = default_timeout();
        }
        if self.source.user_agent.is_empty() {
            self.source.user_agent = default_user_agent();
        }
        if self.delivery.api_base_url.is_empty() {
            self.delivery.api_base_url = default_telegram_api_url();
        }
        if self.delivery.timeout_seconds == 0 {
            self.delivery.timeout_seconds = default_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings except credentials
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        for (name, timeout) in [
            ("Source", self.source.timeout_seconds),
            ("Delivery", self.delivery.timeout_seconds),
        ] {
            if timeout > 300 {
                return Err(
                    ReportError::config(format!("{name} timeout cannot exceed 300 seconds")).into(),
                );
            }
        }

        for (name, retries) in [
            ("Source", self.source.max_retries),
            ("Delivery", self.delivery.max_retries),
        ] {
            if retries > 10 {
                return Err(
                    ReportError::config(format!("{name} max retries cannot exceed 10")).into(),
                );
            }
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(ReportError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(ReportError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Source URL", &self.source.url),
            ("Telegram API base URL", &self.delivery.api_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(
                    ReportError::config(format!("{name} must be a valid HTTP or HTTPS URL")).into(),
                );
            }
        }

        Ok(())
    }
}

impl DeliveryConfig {
    /// Check the bot token and chat id and turn them into credentials
    ///
    /// Tokens look like `123456789:AA...`; chat ids are a (possibly negative)
    /// integer or a `@channel` username.
    pub fn credentials(&self) -> crate::Result<TelegramCredentials> {
        let token = self
            .bot_token
            .as_ref()
            .map(|token| token.expose_secret().trim())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ReportError::config(format!("Missing {BOT_TOKEN_ENV}")))?;

        let valid_token = token
            .split_once(':')
            .is_some_and(|(bot_id, secret)| {
                !bot_id.is_empty()
                    && bot_id.chars().all(|c| c.is_ascii_digit())
                    && !secret.is_empty()
                    && !secret.contains(char::is_whitespace)
            });
        if !valid_token {
            return Err(ReportError::config(format!(
                "{BOT_TOKEN_ENV} does not look like a bot token"
            )));
        }

        let chat_id = self
            .chat_id
            .as_deref()
            .map(str::trim)
            .filter(|chat_id| !chat_id.is_empty())
            .ok_or_else(|| ReportError::config(format!("Missing {CHAT_ID_ENV}")))?;

        let valid_chat_id = chat_id.parse::<i64>().is_ok()
            || (chat_id.len() > 1 && chat_id.starts_with('@'));
        if !valid_chat_id {
            return Err(ReportError::config(format!(
                "Invalid {CHAT_ID_ENV} '{chat_id}'. Use a numeric id or @channel"
            )));
        }

        Ok(TelegramCredentials {
            token: SecretString::from(token.to_string()),
            chat_id: chat_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use std::sync::{Mutex, PoisonError};
    use tempfile::NamedTempFile;

    // The process environment is shared by every test thread
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn delivery(token: Option<&str>, chat_id: Option<&str>) -> DeliveryConfig {
        DeliveryConfig {
            bot_token: token.map(|token| SecretString::from(token.to_string())),
            chat_id: chat_id.map(str::to_string),
            ..DeliveryConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = ReportConfig::default();
        assert_eq!(config.source.url, "https://laderas.com.ar/parte-diario/");
        assert_eq!(config.source.timeout_seconds, 30);
        assert_eq!(config.source.max_retries, 0);
        assert_eq!(config.delivery.api_base_url, "https://api.telegram.org");
        assert_eq!(config.delivery.max_retries, 0);
        assert!(config.render.output_dir.is_none());
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = ReportConfig::default();
        config.logging.level = "verbose".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = ReportConfig::default();
        config.delivery.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));

        let mut config = ReportConfig::default();
        config.source.max_retries = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_source_url_scheme() {
        let mut config = ReportConfig::default();
        config.source.url = "ftp://laderas.com.ar".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.downcast_ref::<ReportError>().is_some());
    }

    #[test]
    fn test_apply_defaults_fills_empty_values() {
        let mut config = ReportConfig::default();
        config.source.url = String::new();
        config.delivery.timeout_seconds = 0;
        config.apply_defaults();
        assert_eq!(config.source.url, DEFAULT_SOURCE_URL);
        assert_eq!(config.delivery.timeout_seconds, 30);
    }

    #[test]
    fn test_credentials_valid() {
        let credentials = delivery(Some("123456:ABC-def_ghi"), Some("-1001234567"))
            .credentials()
            .unwrap();
        assert_eq!(credentials.chat_id, "-1001234567");
        assert_eq!(credentials.token.expose_secret(), "123456:ABC-def_ghi");

        let credentials = delivery(Some("123456:ABC"), Some("@laderas_parte"))
            .credentials()
            .unwrap();
        assert_eq!(credentials.chat_id, "@laderas_parte");
    }

    #[rstest]
    #[case(None, Some("12345"), "Missing TOKEN_TELEGRAM_BOT")]
    #[case(Some("  "), Some("12345"), "Missing TOKEN_TELEGRAM_BOT")]
    #[case(Some("not-a-token"), Some("12345"), "does not look like a bot token")]
    #[case(Some("abc:def"), Some("12345"), "does not look like a bot token")]
    #[case(Some("123456:ABC"), None, "Missing CHAT_ID_TELEGRAM")]
    #[case(Some("123456:ABC"), Some("laderas"), "Invalid CHAT_ID_TELEGRAM")]
    #[case(Some("123456:ABC"), Some("@"), "Invalid CHAT_ID_TELEGRAM")]
    fn test_credentials_rejected(
        #[case] token: Option<&str>,
        #[case] chat_id: Option<&str>,
        #[case] expected: &str,
    ) {
        let err = delivery(token, chat_id).credentials().unwrap_err();
        assert!(matches!(err, ReportError::Config { .. }));
        assert!(err.to_string().contains(expected), "got: {err}");
    }

    #[test]
    fn test_token_is_not_serialized() {
        let config = delivery(Some("123456:SECRET"), Some("1"));
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("SECRET"));
    }

    #[test]
    fn test_token_is_redacted_in_debug_output() {
        let config = delivery(Some("123456:SECRET"), Some("1"));
        assert!(!format!("{config:?}").contains("SECRET"));
    }

    #[test]
    fn test_load_from_toml_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[source]
timeout_seconds = 45

[delivery]
max_retries = 2

[logging]
format = "json"
"#
        )
        .unwrap();

        let config = ReportConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.source.timeout_seconds, 45);
        assert_eq!(config.source.url, DEFAULT_SOURCE_URL);
        assert_eq!(config.delivery.max_retries, 2);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_load_reads_environment() {
        let _env = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("laderas.toml");

        // SAFETY: environment access is serialised by ENV_LOCK
        unsafe {
            env::set_var(CONFIG_PATH_ENV, &missing);
            env::set_var(BOT_TOKEN_ENV, "123456:ABC");
            env::set_var(CHAT_ID_ENV, "-100200");
            env::set_var("LADERAS_DELIVERY__MAX_RETRIES", "2");
        }
        let loaded = ReportConfig::load();

        // SAFETY: as above
        unsafe {
            env::set_var(CHAT_ID_ENV, "   ");
        }
        let blank_chat_id = ReportConfig::load();

        // SAFETY: as above
        unsafe {
            env::remove_var(CONFIG_PATH_ENV);
            env::remove_var(BOT_TOKEN_ENV);
            env::remove_var(CHAT_ID_ENV);
            env::remove_var("LADERAS_DELIVERY__MAX_RETRIES");
        }

        let config = loaded.unwrap();
        assert_eq!(
            config
                .delivery
                .bot_token
                .as_ref()
                .map(|token| token.expose_secret()),
            Some("123456:ABC")
        );
        assert_eq!(config.delivery.chat_id.as_deref(), Some("-100200"));
        assert_eq!(config.delivery.max_retries, 2);
        assert_eq!(config.source.max_retries, 0);
        assert_eq!(config.source.url, DEFAULT_SOURCE_URL);

        let config = blank_chat_id.unwrap();
        assert!(config.delivery.chat_id.is_none());
        let err = config.delivery.credentials().unwrap_err();
        assert!(err.to_string().contains("Missing CHAT_ID_TELEGRAM"));
    }
}
