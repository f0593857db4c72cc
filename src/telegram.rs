//! Minimal Telegram Bot API client
//!
//! Covers the two calls the report needs: `sendMessage` and `sendPhoto`.
//! Request URLs embed the bot token, so they are never logged and are
//! stripped from transport errors.

use std::time::{Duration, SystemTime};

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{RetryDecision, RetryPolicy};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::DeliveryConfig;
use crate::{ReportError, Result};

/// Text formatting mode of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
}

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
    error_code: Option<i64>,
}

/// Failure of one attempt, tagged with whether trying again could help
struct CallError {
    error: ReportError,
    retryable: bool,
}

pub struct TelegramClient {
    http: Client,
    api_base_url: String,
    token: SecretString,
    retry_policy: ExponentialBackoff,
}

impl TelegramClient {
    /// Create a new Bot API client
    pub fn new(config: &DeliveryConfig, token: SecretString) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .build()
            .map_err(|e| ReportError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(500), Duration::from_secs(10))
            .build_with_max_retries(config.max_retries);

        Ok(Self {
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token,
            retry_policy,
        })
    }

    /// Replace the retry policy used for every call
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: ExponentialBackoff) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Send a text message
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<()> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode,
        };
        self.call("sendMessage", || {
            Ok(self.http.post(self.method_url("sendMessage")).json(&body))
        })
        .await
    }

    /// Upload a PNG as a photo message
    #[instrument(skip(self, png), fields(bytes = png.len()))]
    pub async fn send_photo(&self, chat_id: &str, file_name: &str, png: &[u8]) -> Result<()> {
        self.call("sendPhoto", || {
            let photo = Part::bytes(png.to_vec())
                .file_name(file_name.to_string())
                .mime_str("image/png")
                .map_err(|e| ReportError::delivery(format!("Invalid photo part: {e}")))?;
            let form = Form::new()
                .text("chat_id", chat_id.to_string())
                .part("photo", photo);
            Ok(self.http.post(self.method_url("sendPhoto")).multipart(form))
        })
        .await
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base_url,
            self.token.expose_secret()
        )
    }

    /// Run one API call, rebuilding the request for every attempt
    async fn call<F>(&self, method: &str, build: F) -> Result<()>
    where
        F: Fn() -> Result<RequestBuilder>,
    {
        let started = SystemTime::now();
        let mut past_retries = 0;

        loop {
            let error = match self.attempt(method, build()?).await {
                Ok(()) => return Ok(()),
                Err(CallError {
                    error,
                    retryable: false,
                }) => return Err(error),
                Err(CallError { error, .. }) => error,
            };

            match self.retry_policy.should_retry(started, past_retries) {
                RetryDecision::Retry { execute_after } => {
                    let delay = execute_after
                        .duration_since(SystemTime::now())
                        .unwrap_or_default();
                    warn!(
                        method,
                        attempt = past_retries + 1,
                        "Telegram call failed, retrying in {:.1}s: {error}",
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    past_retries += 1;
                }
                RetryDecision::DoNotRetry => return Err(error),
            }
        }
    }

    async fn attempt(&self, method: &str, request: RequestBuilder) -> std::result::Result<(), CallError> {
        let response = request.send().await.map_err(|e| CallError {
            retryable: e.is_connect() || e.is_timeout(),
            error: ReportError::delivery(format!(
                "Telegram {method} request failed: {}",
                e.without_url()
            )),
        })?;

        let status = response.status();
        let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();

        let body: ApiResponse = response.json().await.map_err(|e| CallError {
            retryable,
            error: ReportError::delivery(format!(
                "Telegram {method} returned HTTP {status} with an unreadable body: {}",
                e.without_url()
            )),
        })?;

        if body.ok && status.is_success() {
            debug!(method, "Telegram call accepted");
            return Ok(());
        }

        Err(CallError {
            retryable,
            error: ReportError::delivery(format!(
                "Telegram {method} rejected (code {}): {}",
                body.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                body.description.as_deref().unwrap_or("no description")
            )),
        })
    }
}
