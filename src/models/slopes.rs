//! Trail and lift models with their operating status

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::TableRow;
use crate::error::ReportError;

/// Operating status of a trail
///
/// Variant order is the sort order: it follows the page labels compared as
/// text ("ABIERTO" < "CERRADO" < "CERRADO HASTA MEDIODIA").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrailStatus {
    Open,
    Closed,
    ClosedUntilNoon,
}

/// Operating status of a lift
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LiftStatus {
    Open,
    Closed,
}

impl TrailStatus {
    /// Label as printed on the daily report
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TrailStatus::Open => "ABIERTO",
            TrailStatus::Closed => "CERRADO",
            TrailStatus::ClosedUntilNoon => "CERRADO HASTA MEDIODIA",
        }
    }
}

impl LiftStatus {
    /// Label as printed on the daily report
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            LiftStatus::Open => "ABIERTO",
            LiftStatus::Closed => "CERRADO",
        }
    }
}

/// Uppercase, single-spaced, accent-free form of a status cell
fn normalize_status(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
        .replace('Í', "I")
}

impl FromStr for TrailStatus {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_status(s).as_str() {
            "ABIERTO" => Ok(TrailStatus::Open),
            "CERRADO" => Ok(TrailStatus::Closed),
            "CERRADO HASTA MEDIODIA" => Ok(TrailStatus::ClosedUntilNoon),
            _ => Err(ReportError::parse(format!("Unknown trail status: '{s}'"))),
        }
    }
}

impl FromStr for LiftStatus {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_status(s).as_str() {
            "ABIERTO" => Ok(LiftStatus::Open),
            "CERRADO" => Ok(LiftStatus::Closed),
            _ => Err(ReportError::parse(format!("Unknown lift status: '{s}'"))),
        }
    }
}

impl Display for TrailStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Display for LiftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A ski trail (pista)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailRow {
    pub name: String,
    /// Difficulty grade as published (e.g. "Azul", "Roja")
    pub difficulty: String,
    pub status: TrailStatus,
}

/// A lift (medio de elevación)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiftRow {
    pub name: String,
    /// Operating hours (horario)
    pub hours: String,
    pub status: LiftStatus,
}

impl TrailRow {
    /// Stable sort by status, then difficulty compared as text
    pub fn sort(trails: &mut [TrailRow]) {
        trails.sort_by(|a, b| {
            a.status
                .cmp(&b.status)
                .then_with(|| a.difficulty.cmp(&b.difficulty))
        });
    }

    #[must_use]
    pub fn summary_line(&self) -> String {
        format!("{} ({})", self.name, self.difficulty)
    }
}

impl LiftRow {
    /// Stable sort by status
    pub fn sort(lifts: &mut [LiftRow]) {
        lifts.sort_by_key(|lift| lift.status);
    }

    #[must_use]
    pub fn summary_line(&self) -> String {
        format!("{} (Horario: {})", self.name, self.hours)
    }
}

impl TableRow for TrailRow {
    const HEADERS: &'static [&'static str] = &["Nombre", "Dificultad", "Estado"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.difficulty.clone(),
            self.status.label().to_string(),
        ]
    }
}

impl TableRow for LiftRow {
    const HEADERS: &'static [&'static str] = &["Nombre", "Horario", "Estado"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.hours.clone(),
            self.status.label().to_string(),
        ]
    }
}
