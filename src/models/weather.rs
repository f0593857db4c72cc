//! Weather row model

use serde::{Deserialize, Serialize};

use super::TableRow;

/// Conditions at one elevation band, as published on the page
///
/// Values are kept verbatim ("-3°C", "15 km/h NO") because the page mixes
/// units and free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherRow {
    /// Elevation label (cota), e.g. "Base" or "2000"
    pub elevation: String,
    pub temperature: String,
    pub wind: String,
    /// Snow depth
    pub snow: String,
    pub visibility: String,
}

impl WeatherRow {
    /// One summary line for this elevation band
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!(
            "Cota {}: {}, {}, Nieve: {}, Visibilidad: {}",
            self.elevation, self.temperature, self.wind, self.snow, self.visibility
        )
    }
}

impl TableRow for WeatherRow {
    const HEADERS: &'static [&'static str] = &["Cota", "Temp.", "Viento", "Nieve", "Visibilidad"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.elevation.clone(),
            self.temperature.clone(),
            self.wind.clone(),
            self.snow.clone(),
            self.visibility.clone(),
        ]
    }
}
