//! Error types and handling for the Laderas report pipeline

use thiserror::Error;

/// Main error type for the report pipeline
///
/// Every variant is fatal: the pipeline never recovers from one, it aborts the
/// run and surfaces the error to the operator.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Fetching the source page failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// An expected table is missing or malformed
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Missing or invalid configuration or credentials
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A messaging call was rejected
    #[error("Delivery error: {message}")]
    Delivery { message: String },

    /// Table image could not be produced
    #[error("Render error: {message}")]
    Render { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl ReportError {
    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new delivery error
    pub fn delivery<S: Into<String>>(message: S) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }

    /// Create a new render error
    pub fn render<S: Into<String>>(message: S) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ReportError::Network { .. } => {
                "Unable to download the daily report. Please check your internet connection."
                    .to_string()
            }
            ReportError::Parse { message } => {
                format!("The daily report page changed or is incomplete: {message}")
            }
            ReportError::Config { message } => {
                format!("Configuration error: {message}. Please check TOKEN_TELEGRAM_BOT and CHAT_ID_TELEGRAM.")
            }
            ReportError::Delivery { .. } => {
                "Telegram rejected the report. Check the bot token and chat id.".to_string()
            }
            ReportError::Render { .. } => "Failed to draw the table images.".to_string(),
            ReportError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for ReportError {
    fn from(err: reqwest::Error) -> Self {
        ReportError::network(err.to_string())
    }
}

impl From<reqwest_middleware::Error> for ReportError {
    fn from(err: reqwest_middleware::Error) -> Self {
        ReportError::network(err.to_string())
    }
}

impl From<image::ImageError> for ReportError {
    fn from(err: image::ImageError) -> Self {
        ReportError::render(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = ReportError::config("missing chat id");
        assert!(matches!(config_err, ReportError::Config { .. }));

        let parse_err = ReportError::parse("table not found");
        assert!(matches!(parse_err, ReportError::Parse { .. }));

        let delivery_err = ReportError::delivery("chat not found");
        assert!(matches!(delivery_err, ReportError::Delivery { .. }));
    }

    #[test]
    fn test_user_messages() {
        let network_err = ReportError::network("timeout");
        assert!(network_err.user_message().contains("Unable to download"));

        let parse_err = ReportError::parse("tabla_clima not found");
        assert!(parse_err.user_message().contains("tabla_clima not found"));

        let config_err = ReportError::config("missing chat id");
        assert!(config_err.user_message().contains("CHAT_ID_TELEGRAM"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read only");
        let report_err: ReportError = io_err.into();
        assert!(matches!(report_err, ReportError::Io { .. }));
    }
}
