//! Table images
//!
//! Each table is drawn as a titled grid into an in-memory PNG that is handed
//! straight to the publisher. Text uses the public-domain 8x8 bitmap font so
//! no font file has to ship with the binary; characters it lacks are drawn as
//! `?`.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use font8x8::{BASIC_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tracing::{debug, info, instrument};

use crate::Result;
use crate::models::{SkiReport, TableRow};

pub const WEATHER_LABEL: &str = "clima";
pub const TRAILS_LABEL: &str = "pistas";
pub const LIFTS_LABEL: &str = "elevacion";

const GLYPH_SIZE: u32 = 8;
const CELL_SCALE: u32 = 2;
const TITLE_SCALE: u32 = 3;
const CELL_PADDING: u32 = 10;
const MARGIN: u32 = 24;
const TITLE_GAP: u32 = 20;
const MAX_CELL_CHARS: usize = 48;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const HEADER_FILL: Rgb<u8> = Rgb([221, 230, 240]);
const STRIPE_FILL: Rgb<u8> = Rgb([246, 246, 246]);
const GRID: Rgb<u8> = Rgb([0, 0, 0]);
const TEXT: Rgb<u8> = Rgb([20, 20, 20]);

/// A rendered table
#[derive(Debug, Clone)]
pub struct TableImage {
    /// Table label, e.g. `clima`
    pub label: String,
    /// Encoded PNG bytes
    pub png: Vec<u8>,
}

impl TableImage {
    /// Conventional file name: `table_{label}.png`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("table_{}.png", self.label)
    }

    /// Write the image into `dir`, replacing any previous file of the same name
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, &self.png)?;
        debug!(path = %path.display(), "Saved table image");
        Ok(path)
    }
}

/// Render the three report tables in delivery order: weather, trails, lifts
pub fn render_report(report: &SkiReport) -> Result<Vec<TableImage>> {
    Ok(vec![
        render_table(WEATHER_LABEL, &report.weather)?,
        render_table(TRAILS_LABEL, &report.trails)?,
        render_table(LIFTS_LABEL, &report.lifts)?,
    ])
}

/// Render one table as a PNG titled "Tabla {label}"
#[instrument(skip(rows), fields(row_count = rows.len()))]
pub fn render_table<T: TableRow>(label: &str, rows: &[T]) -> Result<TableImage> {
    let header: Vec<String> = T::HEADERS.iter().map(|h| clip(h)).collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.cells().iter().map(|cell| clip(cell)).collect())
        .collect();

    let column_widths: Vec<u32> = (0..header.len())
        .map(|column| {
            let longest = std::iter::once(&header[column])
                .chain(body.iter().filter_map(|row| row.get(column)))
                .map(|text| px(text.chars().count()))
                .max()
                .unwrap_or(0);
            longest * GLYPH_SIZE * CELL_SCALE + 2 * CELL_PADDING
        })
        .collect();

    let title = format!("Tabla {label}");
    let title_width = text_width(&title, TITLE_SCALE);
    let title_height = GLYPH_SIZE * TITLE_SCALE;
    let row_height = GLYPH_SIZE * CELL_SCALE + 2 * CELL_PADDING;

    let table_width: u32 = column_widths.iter().sum();
    let table_height = row_height * px(body.len() + 1);
    let width = table_width.max(title_width) + 2 * MARGIN;
    let height = MARGIN + title_height + TITLE_GAP + table_height + MARGIN;

    let mut canvas = RgbImage::from_pixel(width + 1, height + 1, BACKGROUND);

    draw_text(
        &mut canvas,
        (width - title_width) / 2,
        MARGIN,
        &title,
        TITLE_SCALE,
        true,
    );

    let table_left = (width - table_width) / 2;
    let table_top = MARGIN + title_height + TITLE_GAP;

    for (index, cells) in std::iter::once(&header).chain(body.iter()).enumerate() {
        let top = table_top + row_height * px(index);
        let fill = match index {
            0 => Some(HEADER_FILL),
            i if i % 2 == 0 => Some(STRIPE_FILL),
            _ => None,
        };
        if let Some(fill) = fill {
            fill_rect(&mut canvas, table_left, top, table_width, row_height, fill);
        }

        let mut left = table_left;
        for (column, column_width) in column_widths.iter().enumerate() {
            let text = cells.get(column).map_or("", String::as_str);
            let x = left + (column_width - text_width(text, CELL_SCALE)) / 2;
            draw_text(&mut canvas, x, top + CELL_PADDING, text, CELL_SCALE, index == 0);
            left += column_width;
        }
    }

    // grid
    for line in 0..=px(body.len() + 1) {
        fill_rect(&mut canvas, table_left, table_top + line * row_height, table_width + 1, 1, GRID);
    }
    let mut left = table_left;
    for column_width in std::iter::once(&0).chain(column_widths.iter()) {
        left += column_width;
        fill_rect(&mut canvas, left, table_top, 1, table_height + 1, GRID);
    }

    let mut png = Vec::new();
    DynamicImage::ImageRgb8(canvas).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

    info!(label, width, height, bytes = png.len(), "Rendered table image");

    Ok(TableImage {
        label: label.to_string(),
        png,
    })
}

fn px(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn clip(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_CHARS {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(MAX_CELL_CHARS - 3).collect();
    clipped.push_str("...");
    clipped
}

fn text_width(text: &str, scale: u32) -> u32 {
    px(text.chars().count()) * GLYPH_SIZE * scale
}

fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

fn draw_text(canvas: &mut RgbImage, x: u32, y: u32, text: &str, scale: u32, bold: bool) {
    let stroke = scale + u32::from(bold);
    for (index, c) in text.chars().enumerate() {
        let origin = x + px(index) * GLYPH_SIZE * scale;
        for (row, bits) in (0u32..).zip(glyph(c)) {
            for column in 0..GLYPH_SIZE {
                // bit 0 is the leftmost pixel
                if bits & (1 << column) != 0 {
                    fill_rect(
                        canvas,
                        origin + column * scale,
                        y + row * scale,
                        stroke,
                        scale,
                        TEXT,
                    );
                }
            }
        }
    }
}

fn fill_rect(canvas: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    for cy in y..y.saturating_add(height) {
        for cx in x..x.saturating_add(width) {
            if let Some(pixel) = canvas.get_pixel_mut_checked(cx, cy) {
                *pixel = color;
            }
        }
    }
}
