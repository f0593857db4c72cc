//! Source page download
//!
//! One GET to the daily report page. Transient failures are retried only when
//! `source.max_retries` is set; by default the first failure ends the run.

use crate::config::SourceConfig;
use crate::{ReportError, Result};
use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Anything that can hand back the report page markup
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self) -> Result<String>;
}

/// Downloads the report page over HTTP
pub struct HttpPageSource {
    client: ClientWithMiddleware,
    url: String,
}

impl HttpPageSource {
    /// Create a new page source
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| ReportError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    #[instrument(name = "fetch_page", skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<String> {
        info!("Downloading daily report");
        let start_time = Instant::now();

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ReportError::network(format!("Failed to fetch {}: {e}", self.url)))?;

        let status = response.status();
        debug!(%status, "Received response");
        if !status.is_success() {
            return Err(ReportError::network(format!(
                "{} answered with HTTP {status}",
                self.url
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ReportError::network(format!("Failed to read page body: {e}")))?;

        let elapsed = start_time.elapsed();
        info!(
            bytes = body.len(),
            "Downloaded daily report in {:.3}s",
            elapsed.as_secs_f64()
        );
        if elapsed.as_secs() > 5 {
            warn!("Slow source page response: {:.3}s", elapsed.as_secs_f64());
        }

        Ok(body)
    }
}
