use rand::rngs::SmallRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::Serialize;

use crate::models::{Coordinate, PreparedRecord};
use crate::severity::Severity;

pub const DEFAULT_SAMPLE_CAP: usize = 2000;
pub const DEFAULT_CENTER: Coordinate = Coordinate { lat: 52.2, lon: 5.3 };
pub const DEFAULT_ZOOM: u8 = 7;
pub const MARKER_LAYER_NAME: &str = "Meetpunten";
pub const MARKER_RADIUS: u8 = 6;
pub const MARKER_FILL_OPACITY: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TileStyle {
    /// CARTO "positron" light basemap.
    CartoPositron,
}

impl TileStyle {
    pub fn url_template(self) -> &'static str {
        match self {
            TileStyle::CartoPositron => {
                "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png"
            }
        }
    }

    pub fn attribution(self) -> &'static str {
        match self {
            TileStyle::CartoPositron => {
                "&copy; OpenStreetMap contributors &copy; CARTO"
            }
        }
    }
}

/// First line is the heading, rendered bold in the popup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub lat: f64,
    pub lon: f64,
    pub severity: Severity,
    pub color: &'static str,
    pub popup: Popup,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: Coordinate,
    pub zoom: u8,
    pub tiles: TileStyle,
    pub layer_name: &'static str,
    pub radius: u8,
    pub fill_opacity: f64,
    pub markers: Vec<Marker>,
}

pub fn sample_size(available: usize, cap: usize) -> usize {
    available.min(cap)
}

/// Picks `min(cap, rows.len())` rows with a seeded generator, returned in input order.
pub fn sample_rows(rows: &[PreparedRecord], cap: usize, seed: u64) -> Vec<&PreparedRecord> {
    let amount = sample_size(rows.len(), cap);
    if amount == rows.len() {
        return rows.iter().collect();
    }

    let mut rng = SmallRng::seed_from_u64(seed);
    let mut picked = index::sample(&mut rng, rows.len(), amount).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| &rows[i]).collect()
}

/// Float formatting that keeps the decimal point: `15.0`, `3.5`.
pub fn format_measurement(value: f64) -> String {
    format!("{value:?}")
}

pub fn popup_for(row: &PreparedRecord) -> Popup {
    let record = &row.record;
    let field = |value: &Option<String>| value.clone().unwrap_or_default();

    let heading = format!("{} {}", field(&record.street), field(&record.house_number));
    let address = format!("{} {}", field(&record.postal_code), field(&record.town));
    let date = record
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    let value = record
        .value
        .map(format_measurement)
        .unwrap_or_else(|| "-".to_string());

    Popup {
        lines: vec![
            heading.trim().to_string(),
            address.trim().to_string(),
            format!("Datum: {date}"),
            format!("Ruw.Res.: {value}"),
        ],
    }
}

pub fn render_map(rows: &[PreparedRecord], cap: usize, seed: u64) -> MapView {
    let markers = sample_rows(rows, cap, seed)
        .into_iter()
        .map(|row| {
            let severity = Severity::for_measurement(row.record.value);
            Marker {
                lat: row.point.lat,
                lon: row.point.lon,
                severity,
                color: severity.color(),
                popup: popup_for(row),
            }
        })
        .collect();

    MapView {
        center: DEFAULT_CENTER,
        zoom: DEFAULT_ZOOM,
        tiles: TileStyle::CartoPositron,
        layer_name: MARKER_LAYER_NAME,
        radius: MARKER_RADIUS,
        fill_opacity: MARKER_FILL_OPACITY,
        markers,
    }
}
