//! Table extraction from the daily report page
//!
//! The page carries three `<table>` elements told apart by CSS class. Columns
//! are located by header text so that column reordering on the page does not
//! break the run; a missing table, a missing column, a short row or an unknown
//! status is a parse error and nothing is returned.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};

use crate::models::{LiftRow, SkiReport, TrailRow, WeatherRow};
use crate::{ReportError, Result};

pub const WEATHER_TABLE_CLASS: &str = "tabla_clima";
pub const TRAILS_TABLE_CLASS: &str = "tabla_estado_de_pistas";
pub const LIFTS_TABLE_CLASS: &str = "tabla_medios_de_elevacion";

const WEATHER_COLUMNS: &[&str] = &["Cota", "Temp.", "Viento", "Nieve", "Visibilidad"];
const TRAIL_COLUMNS: &[&str] = &["Nombre", "Dificultad", "Estado"];
const LIFT_COLUMNS: &[&str] = &["Nombre", "Horario", "Estado"];

/// Header row plus data rows of one HTML table, as plain text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Extract the three tables and build a sorted report
#[instrument(skip(markup), fields(bytes = markup.len()))]
pub fn extract_report(
    markup: &str,
    source_url: &str,
    fetched_at: DateTime<Utc>,
) -> Result<SkiReport> {
    let document = Html::parse_document(markup);

    let weather = extract_rows(&document, WEATHER_TABLE_CLASS, WEATHER_COLUMNS, |cells| {
        Ok(WeatherRow {
            elevation: cells[0].to_string(),
            temperature: cells[1].to_string(),
            wind: cells[2].to_string(),
            snow: cells[3].to_string(),
            visibility: cells[4].to_string(),
        })
    })?;

    let mut trails = extract_rows(&document, TRAILS_TABLE_CLASS, TRAIL_COLUMNS, |cells| {
        Ok(TrailRow {
            name: cells[0].to_string(),
            difficulty: cells[1].to_string(),
            status: cells[2].parse()?,
        })
    })?;
    TrailRow::sort(&mut trails);

    let mut lifts = extract_rows(&document, LIFTS_TABLE_CLASS, LIFT_COLUMNS, |cells| {
        Ok(LiftRow {
            name: cells[0].to_string(),
            hours: cells[1].to_string(),
            status: cells[2].parse()?,
        })
    })?;
    LiftRow::sort(&mut lifts);

    info!(
        weather = weather.len(),
        trails = trails.len(),
        lifts = lifts.len(),
        "Extracted daily report tables"
    );

    Ok(SkiReport {
        source_url: source_url.to_string(),
        fetched_at,
        weather,
        trails,
        lifts,
    })
}

/// Read the table with the given CSS class as plain text
pub fn read_table(document: &Html, class: &str) -> Result<RawTable> {
    let table_selector = selector(&format!("table.{class}"))?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("th, td")?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| ReportError::parse(format!("Table '{class}' not found")))?;

    let mut rows = table
        .select(&row_selector)
        .map(|row| {
            row.select(&cell_selector)
                .map(cell_text)
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty());

    let headers = rows
        .next()
        .ok_or_else(|| ReportError::parse(format!("Table '{class}' has no header row")))?;

    Ok(RawTable {
        headers,
        rows: rows.collect(),
    })
}

/// Map a table onto typed rows; `build` receives cells in `columns` order
fn extract_rows<T>(
    document: &Html,
    class: &str,
    columns: &[&str],
    build: impl Fn(&[&str]) -> Result<T>,
) -> Result<Vec<T>> {
    let table = read_table(document, class)?;
    let indexes = column_indexes(&table.headers, columns, class)?;

    if table.rows.is_empty() {
        return Err(ReportError::parse(format!("Table '{class}' has no rows")));
    }

    table
        .rows
        .iter()
        .enumerate()
        .map(|(row_number, row)| {
            if row.len() < table.headers.len() {
                return Err(ReportError::parse(format!(
                    "Row {} of table '{class}' has {} cells, expected {}",
                    row_number + 1,
                    row.len(),
                    table.headers.len()
                )));
            }
            let cells: Vec<&str> = indexes.iter().map(|&index| row[index].as_str()).collect();
            build(&cells)
        })
        .collect()
}

fn column_indexes(headers: &[String], columns: &[&str], class: &str) -> Result<Vec<usize>> {
    debug!(?headers, table = class, "Matching table headers");
    columns
        .iter()
        .map(|column| {
            headers
                .iter()
                .position(|header| header.to_lowercase() == column.to_lowercase())
                .ok_or_else(|| {
                    ReportError::parse(format!(
                        "Table '{class}' is missing column '{column}' (found: {})",
                        headers.join(", ")
                    ))
                })
        })
        .collect()
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ReportError::parse(format!("Invalid selector '{css}': {e:?}")))
}
