//! Text summaries of the daily report
//!
//! Pure and deterministic: the same rows always give byte-identical output.
//! Both variants share one layout; the HTML one bolds section headers, links
//! the source page and escapes cell text for Telegram's HTML parse mode.

use std::borrow::Cow;
use std::fmt::{self, Display};

use crate::models::{
    LiftCounts, LiftRow, LiftStatus, SkiReport, TrailCounts, TrailRow, TrailStatus, WeatherRow,
};

/// Output flavour of a summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryFormat {
    Plain,
    Html,
}

/// A summary ready to be displayed
pub struct Summary<'a> {
    pub format: SummaryFormat,
    pub source_url: &'a str,
    pub weather: &'a [WeatherRow],
    pub trails: &'a [TrailRow],
    pub lifts: &'a [LiftRow],
}

/// Plain-text summary of a report
#[must_use]
pub fn plain_summary(report: &SkiReport) -> String {
    Summary::from_report(SummaryFormat::Plain, report).to_string()
}

/// HTML summary of a report, for Telegram's HTML parse mode
#[must_use]
pub fn html_summary(report: &SkiReport) -> String {
    Summary::from_report(SummaryFormat::Html, report).to_string()
}

/// Escape the characters Telegram's HTML parser treats as markup
#[must_use]
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

impl<'a> Summary<'a> {
    #[must_use]
    pub fn from_report(format: SummaryFormat, report: &'a SkiReport) -> Self {
        Self {
            format,
            source_url: &report.source_url,
            weather: &report.weather,
            trails: &report.trails,
            lifts: &report.lifts,
        }
    }

    fn heading(&self, f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
        match self.format {
            SummaryFormat::Plain => writeln!(f, "{title}"),
            SummaryFormat::Html => writeln!(f, "<b>{title}</b>"),
        }
    }

    fn line(&self, f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
        match self.format {
            SummaryFormat::Plain => writeln!(f, "{text}"),
            SummaryFormat::Html => writeln!(f, "{}", escape_html(text)),
        }
    }

    fn trail_section(
        &self,
        f: &mut fmt::Formatter<'_>,
        title: &str,
        status: TrailStatus,
        count: usize,
        total: usize,
    ) -> fmt::Result {
        writeln!(f)?;
        self.heading(f, &format!("{title} ({count}/{total}):"))?;
        for trail in self.trails.iter().filter(|t| t.status == status) {
            self.line(f, &trail.summary_line())?;
        }
        Ok(())
    }

    fn lift_section(
        &self,
        f: &mut fmt::Formatter<'_>,
        title: &str,
        status: LiftStatus,
        count: usize,
        total: usize,
    ) -> fmt::Result {
        writeln!(f)?;
        self.heading(f, &format!("{title} ({count}/{total}):"))?;
        for lift in self.lifts.iter().filter(|l| l.status == status) {
            self.line(f, &lift.summary_line())?;
        }
        Ok(())
    }
}

impl Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let trails = TrailCounts::from_rows(self.trails);
        let lifts = LiftCounts::from_rows(self.lifts);

        self.heading(f, "Resumen de la información:")?;
        writeln!(f)?;

        match self.format {
            SummaryFormat::Plain => {
                writeln!(f, "ℹ️ Información obtenida de: {}", self.source_url)?;
            }
            SummaryFormat::Html => writeln!(
                f,
                "ℹ️ Información obtenida de: <a href=\"{}\">Laderas - Parte Diario</a>",
                escape_html(self.source_url)
            )?,
        }
        writeln!(f)?;

        self.heading(f, "🏔️ Clima:")?;
        for row in self.weather {
            self.line(f, &row.summary_line())?;
        }

        self.trail_section(f, "🏂 Pistas abiertas", TrailStatus::Open, trails.open, trails.total)?;
        self.lift_section(
            f,
            "🚠 Medios de elevación abiertos",
            LiftStatus::Open,
            lifts.open,
            lifts.total,
        )?;
        self.trail_section(
            f,
            "🕛🏂 Pistas temporalmente cerradas",
            TrailStatus::ClosedUntilNoon,
            trails.closed_until_noon,
            trails.total,
        )?;
        self.trail_section(
            f,
            "🚫🏂 Pistas cerradas",
            TrailStatus::Closed,
            trails.closed,
            trails.total,
        )?;
        self.lift_section(
            f,
            "🚫🚠 Medios de elevación cerrados",
            LiftStatus::Closed,
            lifts.closed,
            lifts.total,
        )
    }
}
