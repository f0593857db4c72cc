//! `laderas-report` - daily Cerro Laderas ski report for Telegram
//!
//! Downloads the resort's "parte diario", extracts the weather, trail and
//! lift tables, summarises them, renders each table as an image and sends the
//! lot to a Telegram chat.

pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod formatter;
pub mod models;
pub mod pipeline;
pub mod publisher;
pub mod renderer;
pub mod telegram;
pub mod telemetry;

// Re-export core types for public API
pub use config::ReportConfig;
pub use error::ReportError;
pub use fetcher::{HttpPageSource, PageSource};
pub use models::{LiftRow, SkiReport, TrailRow, WeatherRow};
pub use pipeline::{ReportPipeline, RunOutcome};
pub use publisher::{Publisher, TelegramPublisher};
pub use renderer::TableImage;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
