use std::path::PathBuf;

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub postal_code: Option<String>,
    pub town: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub year: Option<i32>,
    pub value: Option<f64>,
}

impl MeasurementRecord {
    /// Builds a record, deriving `year` from `date`.
    pub fn new(
        street: Option<String>,
        house_number: Option<String>,
        postal_code: Option<String>,
        town: Option<String>,
        date: Option<NaiveDateTime>,
        value: Option<f64>,
    ) -> Self {
        Self {
            street,
            house_number,
            postal_code,
            town,
            year: date.map(|d| d.year()),
            date,
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetId(pub u64);

#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: DatasetId,
    pub source: PathBuf,
    pub records: Vec<MeasurementRecord>,
}

impl Dataset {
    /// Distinct years present, ascending. Rows without a date are skipped.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().filter_map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRecord {
    pub record: MeasurementRecord,
    pub point: Coordinate,
}

#[derive(Debug, Clone)]
pub struct YearSummary {
    pub year: i32,
    pub record_count: usize,
    pub placeable_count: usize,
}
