//! Report delivery
//!
//! Sends, in this order and one call at a time: the announcement, one photo
//! per table (weather, trails, lifts) and the HTML summary. The first rejected
//! call ends delivery.

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::Result;
use crate::config::DeliveryConfig;
use crate::renderer::TableImage;
use crate::telegram::{ParseMode, TelegramClient};

/// First message of every delivery
pub const ANNOUNCEMENT: &str = "📊 Resumen del estado del cerro Laderas:";

/// Destination of a finished report
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, images: &[TableImage], html_summary: &str) -> Result<()>;
}

/// Publishes to one Telegram chat
pub struct TelegramPublisher {
    client: TelegramClient,
    chat_id: String,
}

impl TelegramPublisher {
    /// Build a publisher, failing with a configuration error when the bot
    /// token or chat id is missing or malformed
    pub fn new(config: &DeliveryConfig) -> Result<Self> {
        let credentials = config.credentials()?;
        Ok(Self {
            client: TelegramClient::new(config, credentials.token)?,
            chat_id: credentials.chat_id,
        })
    }
}

#[async_trait]
impl Publisher for TelegramPublisher {
    #[instrument(name = "publish_report", skip_all, fields(chat_id = %self.chat_id, images = images.len()))]
    async fn publish(&self, images: &[TableImage], html_summary: &str) -> Result<()> {
        self.client
            .send_message(&self.chat_id, ANNOUNCEMENT, None)
            .await?;

        for image in images {
            self.client
                .send_photo(&self.chat_id, &image.file_name(), &image.png)
                .await?;
        }

        self.client
            .send_message(&self.chat_id, html_summary, Some(ParseMode::Html))
            .await?;

        info!("Report delivered to Telegram");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReportError;
    use httpmock::prelude::*;
    use secrecy::SecretString;
    use serde_json::json;

    fn delivery_config(server: &MockServer, chat_id: Option<&str>) -> DeliveryConfig {
        DeliveryConfig {
            api_base_url: server.base_url(),
            bot_token: Some(SecretString::from("123456:TEST-token".to_string())),
            chat_id: chat_id.map(str::to_string),
            timeout_seconds: 5,
            ..DeliveryConfig::default()
        }
    }

    fn images() -> Vec<TableImage> {
        ["clima", "pistas", "elevacion"]
            .into_iter()
            .map(|label| TableImage {
                label: label.to_string(),
                png: b"\x89PNG".to_vec(),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_publish_sends_all_messages() {
        let server = MockServer::start_async().await;
        let announcement = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/bot123456:TEST-token/sendMessage")
                    .body_contains("Resumen del estado del cerro Laderas");
                then.status(200).json_body(json!({ "ok": true, "result": {} }));
            })
            .await;
        let photos = server
            .mock_async(|when, then| {
                when.method(POST).path("/bot123456:TEST-token/sendPhoto");
                then.status(200).json_body(json!({ "ok": true, "result": {} }));
            })
            .await;
        let summary = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/bot123456:TEST-token/sendMessage")
                    .body_contains("\"parse_mode\":\"HTML\"");
                then.status(200).json_body(json!({ "ok": true, "result": {} }));
            })
            .await;

        let publisher = TelegramPublisher::new(&delivery_config(&server, Some("-100200"))).unwrap();
        publisher
            .publish(&images(), "<b>Resumen</b>")
            .await
            .unwrap();

        announcement.assert_hits_async(1).await;
        photos.assert_hits_async(3).await;
        summary.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_rejected_photo_stops_delivery() {
        let server = MockServer::start_async().await;
        let messages = server
            .mock_async(|when, then| {
                when.method(POST).path("/bot123456:TEST-token/sendMessage");
                then.status(200).json_body(json!({ "ok": true, "result": {} }));
            })
            .await;
        let photos = server
            .mock_async(|when, then| {
                when.method(POST).path("/bot123456:TEST-token/sendPhoto");
                then.status(400).json_body(json!({
                    "ok": false,
                    "error_code": 400,
                    "description": "Bad Request: PHOTO_INVALID_DIMENSIONS"
                }));
            })
            .await;

        let publisher = TelegramPublisher::new(&delivery_config(&server, Some("-100200"))).unwrap();
        let err = publisher
            .publish(&images(), "<b>Resumen</b>")
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::Delivery { .. }));
        // announcement only; the summary is never sent
        messages.assert_hits_async(1).await;
        photos.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_missing_chat_id_fails_before_any_call() {
        let server = MockServer::start_async().await;
        let any_call = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(json!({ "ok": true, "result": {} }));
            })
            .await;

        let result = TelegramPublisher::new(&delivery_config(&server, None));

        assert!(matches!(result, Err(ReportError::Config { .. })));
        any_call.assert_hits_async(0).await;
    }
}
