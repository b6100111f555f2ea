//! Memo tables for the two expensive steps: reading the input file and
//! preparing a year. Entries are never evicted; inputs are fixed for the
//! lifetime of the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::loader::{self, LoadError};
use crate::models::{Dataset, DatasetId, MeasurementRecord, PreparedRecord};
use crate::prepare::{self, PrepareError};

#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, Arc<Dataset>>,
    next_id: u64,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `path` the first time it is asked for; later calls reuse the result.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<Dataset>, LoadError> {
        if let Some(dataset) = self.entries.get(path) {
            debug!(path = %path.display(), "dataset cache hit");
            return Ok(Arc::clone(dataset));
        }

        let records = loader::load_records(path)?;
        Ok(self.insert(path.to_path_buf(), records))
    }

    /// Registers already-loaded records under `source`, replacing any previous entry.
    pub fn insert(&mut self, source: PathBuf, records: Vec<MeasurementRecord>) -> Arc<Dataset> {
        self.next_id += 1;
        let dataset = Arc::new(Dataset {
            id: DatasetId(self.next_id),
            source: source.clone(),
            records,
        });
        self.entries.insert(source, Arc::clone(&dataset));
        dataset
    }
}

#[derive(Debug)]
pub struct PreparedCache {
    seed: u64,
    entries: HashMap<(DatasetId, i32), Arc<Vec<PreparedRecord>>>,
}

impl PreparedCache {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            entries: HashMap::new(),
        }
    }

    pub fn get_or_prepare(
        &mut self,
        dataset: &Dataset,
        year: i32,
    ) -> Result<Arc<Vec<PreparedRecord>>, PrepareError> {
        let key = (dataset.id, year);
        if let Some(rows) = self.entries.get(&key) {
            debug!(dataset = dataset.id.0, year, "prepared cache hit");
            return Ok(Arc::clone(rows));
        }

        let rows = Arc::new(prepare::prepare_year(dataset, year, self.seed)?);
        self.entries.insert(key, Arc::clone(&rows));
        info!(
            source = %dataset.source.display(),
            year,
            rows = rows.len(),
            cached_years = self.entries.len(),
            "prepared year cached"
        );
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(
            b"Datum,Woonplaats,Ruw.Res.\n\
              2020-01-01,Utrecht,0.5\n\
              2020-03-01,Utrecht,15\n\
              2020-04-01,Mars,50\n\
              2021-04-01,Zwolle,2\n",
        )
        .unwrap();
        file
    }

    #[test]
    fn dataset_is_read_once_per_path() {
        let file = csv_file();
        let path = file.path().to_path_buf();
        let mut cache = DatasetCache::new();

        let first = cache.get_or_load(&path).unwrap();
        drop(file);
        let second = cache.get_or_load(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.records.len(), 4);
        assert_eq!(cache.entries.len(), 1);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let mut cache = DatasetCache::new();
        assert!(cache.get_or_load(Path::new("/nope/missing.csv")).is_err());
        assert!(cache.entries.is_empty());
    }

    #[test]
    fn datasets_get_distinct_ids() {
        let mut cache = DatasetCache::new();
        let a = cache.insert(PathBuf::from("a"), Vec::new());
        let b = cache.insert(PathBuf::from("b"), Vec::new());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn prepared_rows_are_memoized_per_dataset_and_year() {
        let file = csv_file();
        let mut datasets = DatasetCache::new();
        let dataset = datasets.get_or_load(file.path()).unwrap();
        let mut prepared = PreparedCache::new(prepare::DEFAULT_SEED);

        let first = prepared.get_or_prepare(&dataset, 2020).unwrap();
        let again = prepared.get_or_prepare(&dataset, 2020).unwrap();
        let other = prepared.get_or_prepare(&dataset, 2021).unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(first.len(), 2);
        assert_eq!(other.len(), 1);
        assert_eq!(prepared.entries.len(), 2);
    }

    #[test]
    fn same_year_of_another_dataset_is_prepared_separately() {
        let mut datasets = DatasetCache::new();
        let a = datasets.insert(PathBuf::from("a"), Vec::new());
        let b = datasets.insert(PathBuf::from("b"), Vec::new());
        let mut prepared = PreparedCache::new(prepare::DEFAULT_SEED);

        prepared.get_or_prepare(&a, 2020).unwrap();
        prepared.get_or_prepare(&b, 2020).unwrap();
        assert_eq!(prepared.entries.len(), 2);
    }
}
