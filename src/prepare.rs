use rand::rngs::SmallRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::debug;

use crate::jitter::{Jitter, JitterError, LAT_SIGMA, LON_SIGMA};
use crate::models::{Dataset, PreparedRecord};

pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("invalid jitter: {0}")]
    Jitter(#[from] JitterError),
}

/// Rows for `year` whose town is in the table, each with a jittered position.
///
/// The generator is reseeded on every call, so the same dataset and year always
/// produce the same coordinates. Unknown towns are dropped without complaint.
pub fn prepare_year(
    dataset: &Dataset,
    year: i32,
    seed: u64,
) -> Result<Vec<PreparedRecord>, PrepareError> {
    prepare_year_with_sigmas(dataset, year, seed, LAT_SIGMA, LON_SIGMA)
}

pub fn prepare_year_with_sigmas(
    dataset: &Dataset,
    year: i32,
    seed: u64,
    lat_sigma: f64,
    lon_sigma: f64,
) -> Result<Vec<PreparedRecord>, PrepareError> {
    let jitter = Jitter::new(lat_sigma, lon_sigma)?;
    let mut rng = SmallRng::seed_from_u64(seed);

    let mut in_year = 0usize;
    let mut prepared = Vec::new();
    for record in dataset.records.iter().filter(|r| r.year == Some(year)) {
        in_year += 1;
        let Some(town) = record.town.as_deref() else {
            continue;
        };
        if let Some(point) = jitter.place(town, &mut rng) {
            prepared.push(PreparedRecord {
                record: record.clone(),
                point,
            });
        }
    }

    debug!(
        dataset = dataset.id.0,
        year,
        kept = prepared.len(),
        dropped = in_year - prepared.len(),
        "prepared year"
    );
    Ok(prepared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DatasetId, MeasurementRecord};
    use crate::towns;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn record(town: &str, year: i32, value: f64) -> MeasurementRecord {
        let date = NaiveDate::from_ymd_opt(year, 6, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
        MeasurementRecord::new(
            Some("Domstraat".into()),
            Some("1".into()),
            Some("3512 JC".into()),
            Some(town.into()),
            date,
            Some(value),
        )
    }

    fn dataset(records: Vec<MeasurementRecord>) -> Dataset {
        Dataset {
            id: DatasetId(1),
            source: PathBuf::from("memory"),
            records,
        }
    }

    #[test]
    fn unknown_towns_are_dropped() {
        let data = dataset(vec![
            record("Utrecht", 2020, 0.5),
            record("Utrecht", 2020, 15.0),
            record("Mars", 2020, 50.0),
        ]);
        let rows = prepare_year(&data, 2020, DEFAULT_SEED).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows
            .iter()
            .all(|r| r.record.town.as_deref().is_some_and(towns::is_known)));
    }

    #[test]
    fn only_the_requested_year_is_kept() {
        let mut undated = record("Utrecht", 2020, 1.0);
        undated.date = None;
        undated.year = None;
        let data = dataset(vec![
            record("Arnhem", 2019, 1.0),
            record("Arnhem", 2020, 2.0),
            undated,
        ]);
        let rows = prepare_year(&data, 2020, DEFAULT_SEED).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record.value, Some(2.0));
    }

    #[test]
    fn repeated_preparation_is_identical() {
        let data = dataset(
            (0..50)
                .map(|i| record(if i % 2 == 0 { "Sneek" } else { "Almere" }, 2021, i as f64))
                .collect(),
        );
        let first = prepare_year(&data, 2021, DEFAULT_SEED).unwrap();
        let second = prepare_year(&data, 2021, DEFAULT_SEED).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn input_order_is_preserved() {
        let data = dataset(vec![
            record("Sneek", 2022, 1.0),
            record("Mars", 2022, 2.0),
            record("Deventer", 2022, 3.0),
        ]);
        let rows = prepare_year(&data, 2022, DEFAULT_SEED).unwrap();
        let values: Vec<Option<f64>> = rows.iter().map(|r| r.record.value).collect();
        assert_eq!(values, vec![Some(1.0), Some(3.0)]);
    }

    #[test]
    fn empty_year_prepares_nothing() {
        let data = dataset(vec![record("Utrecht", 2020, 1.0)]);
        assert!(prepare_year(&data, 1999, DEFAULT_SEED).unwrap().is_empty());
    }

    #[test]
    fn invalid_sigma_fails_preparation() {
        let data = dataset(vec![record("Utrecht", 2020, 1.0)]);
        let err = prepare_year_with_sigmas(&data, 2020, DEFAULT_SEED, f64::NAN, LON_SIGMA)
            .unwrap_err();
        assert!(matches!(err, PrepareError::Jitter(JitterError::InvalidSigma(_))));
    }
}
