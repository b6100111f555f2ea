//! Reads the measurement spreadsheet into [`MeasurementRecord`]s.
//!
//! Workbooks go through `calamine`, plain exports through `csv`. Both are
//! normalised into [`CellValue`] rows so that column lookup and cell coercion
//! happen in one place. Bad cells never abort the load; a bad file does.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::MeasurementRecord;

pub const COL_DATE: &str = "Datum";
pub const COL_TOWN: &str = "Woonplaats";
pub const COL_VALUE: &str = "Ruw.Res.";
pub const COL_STREET: &str = "Straat";
pub const COL_HOUSE_NUMBER: &str = "Huisnummer";
pub const COL_POSTAL_CODE: &str = "Postcode";

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
];
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%Y/%m/%d"];

static EMPTY_CELL: CellValue = CellValue::Empty;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse workbook: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("cannot parse csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("workbook {0} contains no worksheets")]
    NoWorksheet(PathBuf),
    #[error("input has no header row")]
    MissingHeader,
    #[error("required column `{0}` is missing")]
    MissingColumn(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) | Data::DateTimeIso(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Text(b.to_string()),
            Data::DateTime(dt) => dt
                .as_datetime()
                .map(CellValue::DateTime)
                .unwrap_or(CellValue::Empty),
            _ => CellValue::Empty,
        }
    }
}

impl CellValue {
    fn from_csv_field(field: &str) -> Self {
        if field.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(field.to_string())
        }
    }

    /// Display text; whole numbers drop their `.0` so `12.0` shows as `12`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            CellValue::Number(n) => Some(n.to_string()),
            CellValue::DateTime(dt) => Some(dt.format("%Y-%m-%d").to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => parse_number(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::Text(s) => parse_date_text(s),
            _ => None,
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| trimmed.replace(',', ".").parse::<f64>().ok())
}

/// Returns `None` for anything we cannot read as a date; never an error.
pub fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    town: usize,
    value: usize,
    street: Option<usize>,
    house_number: Option<usize>,
    postal_code: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &[String]) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require =
            |name: &'static str| find(name).ok_or(LoadError::MissingColumn(name));

        Ok(Self {
            date: require(COL_DATE)?,
            town: require(COL_TOWN)?,
            value: require(COL_VALUE)?,
            street: find(COL_STREET),
            house_number: find(COL_HOUSE_NUMBER),
            postal_code: find(COL_POSTAL_CODE),
        })
    }

    fn record(&self, cells: &[CellValue]) -> MeasurementRecord {
        let cell = |idx: usize| cells.get(idx).unwrap_or(&EMPTY_CELL);
        let text = |idx: Option<usize>| idx.and_then(|i| cell(i).as_text());

        MeasurementRecord::new(
            text(self.street),
            text(self.house_number),
            text(self.postal_code),
            cell(self.town).as_text(),
            cell(self.date).as_datetime(),
            cell(self.value).as_number(),
        )
    }
}

/// Reads every row of `path`. Fails only when the file itself is unusable.
pub fn load_records(path: &Path) -> Result<Vec<MeasurementRecord>, LoadError> {
    std::fs::metadata(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    info!(path = %path.display(), "loading measurement data");
    let records = match extension.as_deref() {
        Some("xlsx" | "xlsm" | "xls" | "xlsb" | "ods") => load_workbook(path)?,
        Some("csv") => load_csv(path)?,
        _ => return Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    };

    let undated = records.iter().filter(|r| r.year.is_none()).count();
    info!(
        path = %path.display(),
        rows = records.len(),
        undated,
        "measurement data loaded"
    );
    Ok(records)
}

fn load_workbook(path: &Path) -> Result<Vec<MeasurementRecord>, LoadError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadError::NoWorksheet(path.to_path_buf()))??;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or(LoadError::MissingHeader)?
        .iter()
        .map(|cell| CellValue::from(cell).as_text().unwrap_or_default())
        .collect();
    let columns = Columns::from_headers(&headers)?;
    debug!(?columns, "resolved workbook columns");

    Ok(rows
        .map(|row| {
            let cells: Vec<CellValue> = row.iter().map(CellValue::from).collect();
            columns.record(&cells)
        })
        .collect())
}

fn load_csv(path: &Path) -> Result<Vec<MeasurementRecord>, LoadError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(LoadError::MissingHeader);
    }
    let columns = Columns::from_headers(&headers)?;
    debug!(?columns, "resolved csv columns");

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let cells: Vec<CellValue> = row.iter().map(CellValue::from_csv_field).collect();
        records.push(columns.record(&cells));
    }
    Ok(records)
}
