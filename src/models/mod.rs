//! Data models for the Laderas daily report
//!
//! This module contains the rows read from the three tables of the daily
//! report ("parte diario"):
//! - Weather: one row per elevation band (cota)
//! - Slopes: trails and lifts with their operating status
//! - Report: the three sequences together with status counts

pub mod report;
pub mod slopes;
pub mod weather;

// Re-export all public types for convenient access
pub use report::{LiftCounts, SkiReport, TrailCounts};
pub use slopes::{LiftRow, LiftStatus, TrailRow, TrailStatus};
pub use weather::WeatherRow;

/// A record that can be drawn as one line of a table grid
pub trait TableRow {
    /// Column titles, in display order
    const HEADERS: &'static [&'static str];

    /// Cell values, one per header
    fn cells(&self) -> Vec<String>;
}
