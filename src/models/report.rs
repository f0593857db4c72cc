//! The extracted daily report and its status counts

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::{LiftRow, LiftStatus, TrailRow, TrailStatus, WeatherRow};

/// Time zone of the resort (Malargüe, Mendoza)
pub const RESORT_TZ: Tz = chrono_tz::America::Argentina::Mendoza;

/// The three tables of one daily report
///
/// Trails and lifts are kept in sorted order; weather rows keep page order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkiReport {
    /// Page the report was read from
    pub source_url: String,
    /// When the page was downloaded
    pub fetched_at: DateTime<Utc>,
    pub weather: Vec<WeatherRow>,
    pub trails: Vec<TrailRow>,
    pub lifts: Vec<LiftRow>,
}

/// Trail counts per status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrailCounts {
    pub open: usize,
    pub closed: usize,
    pub closed_until_noon: usize,
    pub total: usize,
}

/// Lift counts per status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LiftCounts {
    pub open: usize,
    pub closed: usize,
    pub total: usize,
}

impl TrailCounts {
    #[must_use]
    pub fn from_rows(trails: &[TrailRow]) -> Self {
        trails.iter().fold(
            Self {
                total: trails.len(),
                ..Self::default()
            },
            |mut counts, trail| {
                match trail.status {
                    TrailStatus::Open => counts.open += 1,
                    TrailStatus::Closed => counts.closed += 1,
                    TrailStatus::ClosedUntilNoon => counts.closed_until_noon += 1,
                }
                counts
            },
        )
    }
}

impl LiftCounts {
    #[must_use]
    pub fn from_rows(lifts: &[LiftRow]) -> Self {
        let open = lifts
            .iter()
            .filter(|lift| lift.status == LiftStatus::Open)
            .count();
        Self {
            open,
            closed: lifts.len() - open,
            total: lifts.len(),
        }
    }
}

impl SkiReport {
    #[must_use]
    pub fn trail_counts(&self) -> TrailCounts {
        TrailCounts::from_rows(&self.trails)
    }

    #[must_use]
    pub fn lift_counts(&self) -> LiftCounts {
        LiftCounts::from_rows(&self.lifts)
    }

    /// Download time on the resort's wall clock
    #[must_use]
    pub fn fetched_at_local(&self) -> DateTime<Tz> {
        self.fetched_at.with_timezone(&RESORT_TZ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trail(status: TrailStatus) -> TrailRow {
        TrailRow {
            name: "Pista".to_string(),
            difficulty: "Azul".to_string(),
            status,
        }
    }

    fn lift(status: LiftStatus) -> LiftRow {
        LiftRow {
            name: "Telesilla".to_string(),
            hours: "9 a 17".to_string(),
            status,
        }
    }

    #[test]
    fn test_trail_counts_add_up() {
        let trails = vec![
            trail(TrailStatus::Open),
            trail(TrailStatus::Open),
            trail(TrailStatus::Closed),
            trail(TrailStatus::ClosedUntilNoon),
        ];
        let counts = TrailCounts::from_rows(&trails);

        assert_eq!(counts.open, 2);
        assert_eq!(counts.closed, 1);
        assert_eq!(counts.closed_until_noon, 1);
        assert_eq!(
            counts.open + counts.closed + counts.closed_until_noon,
            counts.total
        );
    }

    #[test]
    fn test_lift_counts_add_up() {
        let lifts = vec![
            lift(LiftStatus::Closed),
            lift(LiftStatus::Open),
            lift(LiftStatus::Closed),
        ];
        let counts = LiftCounts::from_rows(&lifts);

        assert_eq!(counts.open, 1);
        assert_eq!(counts.closed, 2);
        assert_eq!(counts.open + counts.closed, counts.total);
    }

    #[test]
    fn test_fetched_at_local_is_argentina_time() {
        let report = SkiReport {
            source_url: String::new(),
            fetched_at: DateTime::from_timestamp(1_720_000_000, 0).unwrap(),
            weather: Vec::new(),
            trails: Vec::new(),
            lifts: Vec::new(),
        };
        // 2024-07-03 09:46:40 UTC, Argentina has no DST
        assert_eq!(
            report.fetched_at_local().format("%Y-%m-%d %H:%M").to_string(),
            "2024-07-03 06:46"
        );
    }

    #[test]
    fn test_empty_counts() {
        assert_eq!(TrailCounts::from_rows(&[]), TrailCounts::default());
        assert_eq!(LiftCounts::from_rows(&[]), LiftCounts::default());
    }
}
