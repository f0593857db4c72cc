//! The daily report run: fetch, extract, format, render, publish
//!
//! Stages run strictly one after the other and the first error aborts the
//! run. Images are only written to disk after every table has been extracted
//! and rendered, and nothing is published unless all of them succeeded.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use crate::Result;
use crate::config::RenderConfig;
use crate::extractor::extract_report;
use crate::fetcher::PageSource;
use crate::formatter::{html_summary, plain_summary};
use crate::models::SkiReport;
use crate::publisher::Publisher;
use crate::renderer::{TableImage, render_report};

/// What one successful run produced
#[derive(Debug)]
pub struct RunOutcome {
    pub report: SkiReport,
    pub plain_summary: String,
    pub html_summary: String,
    pub images: Vec<TableImage>,
    /// Image files written, when an output directory is configured
    pub saved_images: Vec<PathBuf>,
}

pub struct ReportPipeline {
    source: Arc<dyn PageSource>,
    publisher: Arc<dyn Publisher>,
    source_url: String,
    output_dir: Option<PathBuf>,
}

impl ReportPipeline {
    pub fn new(
        source: Arc<dyn PageSource>,
        publisher: Arc<dyn Publisher>,
        source_url: impl Into<String>,
        render: &RenderConfig,
    ) -> Self {
        Self {
            source,
            publisher,
            source_url: source_url.into(),
            output_dir: render.output_dir.clone(),
        }
    }

    #[instrument(name = "report_run", skip(self), fields(url = %self.source_url))]
    pub async fn run(&self) -> Result<RunOutcome> {
        let markup = self.source.fetch().await?;
        let report = extract_report(&markup, &self.source_url, Utc::now())?;

        let plain_summary = plain_summary(&report);
        let html_summary = html_summary(&report);

        let images = render_report(&report)?;
        let saved_images = match &self.output_dir {
            Some(dir) => images
                .iter()
                .map(|image| image.save(dir))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };

        self.publisher.publish(&images, &html_summary).await?;

        let trails = report.trail_counts();
        let lifts = report.lift_counts();
        info!(
            open_trails = trails.open,
            total_trails = trails.total,
            open_lifts = lifts.open,
            total_lifts = lifts.total,
            fetched_at = %report.fetched_at_local().format("%d/%m %H:%M"),
            "Daily report published"
        );

        Ok(RunOutcome {
            report,
            plain_summary,
            html_summary,
            images,
            saved_images,
        })
    }
}
