use std::sync::Arc;

use anyhow::{Context, Result};
use laderas_report::{HttpPageSource, ReportConfig, ReportPipeline, TelegramPublisher, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ReportConfig::load().context("Failed to load configuration")?;
    telemetry::init(&config.logging)?;

    // Credentials are checked here, before the page is downloaded
    let publisher = TelegramPublisher::new(&config.delivery).map_err(|e| {
        tracing::error!("{}", e.user_message());
        e
    })?;
    let source = HttpPageSource::new(&config.source)?;

    let pipeline = ReportPipeline::new(
        Arc::new(source),
        Arc::new(publisher),
        config.source.url.clone(),
        &config.render,
    );

    let outcome = pipeline.run().await.map_err(|e| {
        tracing::error!("{}", e.user_message());
        e
    })?;

    println!("{}", outcome.plain_summary);
    Ok(())
}
