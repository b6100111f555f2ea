use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::warn;

use crate::cache::{DatasetCache, PreparedCache};
use crate::map::{self, MapView, DEFAULT_SAMPLE_CAP};
use crate::models::{Dataset, YearSummary};
use crate::prepare::DEFAULT_SEED;
use crate::towns;

#[derive(Debug, Clone, Copy)]
pub struct DashboardSettings {
    pub seed: u64,
    pub sample_cap: usize,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            sample_cap: DEFAULT_SAMPLE_CAP,
        }
    }
}

/// Everything the page needs for one year selection.
#[derive(Debug, Clone)]
pub struct YearView {
    pub years: Vec<i32>,
    pub year: Option<i32>,
    pub count: usize,
    pub map: MapView,
}

/// Wires loader, per-year preparation and map rendering behind the two memo tables.
#[derive(Debug)]
pub struct Dashboard {
    source: PathBuf,
    settings: DashboardSettings,
    datasets: DatasetCache,
    prepared: PreparedCache,
}

impl Dashboard {
    /// Loads `source` eagerly so a bad input fails at startup.
    pub fn open(source: PathBuf, settings: DashboardSettings) -> anyhow::Result<Self> {
        let mut datasets = DatasetCache::new();
        datasets
            .get_or_load(&source)
            .with_context(|| format!("failed to load {}", source.display()))?;
        Ok(Self::with_datasets(source, settings, datasets))
    }

    pub fn with_datasets(
        source: PathBuf,
        settings: DashboardSettings,
        datasets: DatasetCache,
    ) -> Self {
        Self {
            source,
            prepared: PreparedCache::new(settings.seed),
            settings,
            datasets,
        }
    }

    pub fn dataset(&mut self) -> anyhow::Result<Arc<Dataset>> {
        self.datasets
            .get_or_load(&self.source)
            .with_context(|| format!("failed to load {}", self.source.display()))
    }

    /// Falls back to the latest year when `requested` is absent or not in the data.
    pub fn view(&mut self, requested: Option<i32>) -> anyhow::Result<YearView> {
        let dataset = self.dataset()?;
        let years = dataset.years();

        let year = match requested {
            Some(y) if years.contains(&y) => Some(y),
            Some(y) => {
                warn!(year = y, "requested year not in dataset; using latest");
                years.last().copied()
            }
            None => years.last().copied(),
        };

        let rows = match year {
            Some(y) => self.prepared.get_or_prepare(&dataset, y)?,
            None => Arc::new(Vec::new()),
        };
        let map = map::render_map(&rows, self.settings.sample_cap, self.settings.seed);

        Ok(YearView {
            years,
            year,
            count: rows.len(),
            map,
        })
    }

    pub fn summaries(&mut self) -> anyhow::Result<Vec<YearSummary>> {
        let dataset = self.dataset()?;
        let summaries = dataset
            .years()
            .into_iter()
            .map(|year| {
                let in_year = dataset.records.iter().filter(|r| r.year == Some(year));
                let (record_count, placeable_count) =
                    in_year.fold((0, 0), |(all, placeable), record| {
                        let known = record.town.as_deref().is_some_and(towns::is_known);
                        (all + 1, placeable + usize::from(known))
                    });
                YearSummary {
                    year,
                    record_count,
                    placeable_count,
                }
            })
            .collect();
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MeasurementRecord;
    use crate::severity::Severity;
    use chrono::NaiveDate;

    fn record(town: &str, year: i32, value: f64) -> MeasurementRecord {
        let date = NaiveDate::from_ymd_opt(year, 2, 1).and_then(|d| d.and_hms_opt(0, 0, 0));
        MeasurementRecord::new(None, None, None, Some(town.into()), date, Some(value))
    }

    fn dashboard(records: Vec<MeasurementRecord>) -> Dashboard {
        let source = PathBuf::from("memory.csv");
        let mut datasets = DatasetCache::new();
        datasets.insert(source.clone(), records);
        Dashboard::with_datasets(source, DashboardSettings::default(), datasets)
    }

    #[test]
    fn defaults_to_latest_year() {
        let mut dash = dashboard(vec![
            record("Utrecht", 2019, 1.0),
            record("Utrecht", 2024, 1.0),
            record("Arnhem", 2024, 1.0),
        ]);
        let view = dash.view(None).unwrap();
        assert_eq!(view.years, vec![2019, 2024]);
        assert_eq!(view.year, Some(2024));
        assert_eq!(view.count, 2);
    }

    #[test]
    fn unknown_requested_year_falls_back() {
        let mut dash = dashboard(vec![record("Utrecht", 2020, 1.0)]);
        assert_eq!(dash.view(Some(1900)).unwrap().year, Some(2020));
    }

    #[test]
    fn mixed_towns_scenario() {
        let mut dash = dashboard(vec![
            record("Utrecht", 2020, 0.5),
            record("Utrecht", 2020, 15.0),
            record("Mars", 2020, 50.0),
        ]);
        let view = dash.view(Some(2020)).unwrap();
        assert_eq!(view.count, 2);
        let severities: Vec<Severity> = view.map.markers.iter().map(|m| m.severity).collect();
        assert_eq!(severities, vec![Severity::Green, Severity::Orange]);
    }

    #[test]
    fn year_without_placeable_rows_renders_empty_map() {
        let mut dash = dashboard(vec![record("Mars", 2020, 3.0)]);
        let view = dash.view(Some(2020)).unwrap();
        assert_eq!(view.count, 0);
        assert!(view.map.markers.is_empty());
    }

    #[test]
    fn undated_dataset_renders_empty_map() {
        let mut undated = record("Utrecht", 2020, 3.0);
        undated.date = None;
        undated.year = None;
        let mut dash = dashboard(vec![undated]);
        let view = dash.view(None).unwrap();
        assert!(view.years.is_empty());
        assert_eq!(view.year, None);
        assert_eq!(view.count, 0);
    }

    #[test]
    fn views_are_repeatable() {
        let records = (0..30).map(|i| record("Lelystad", 2023, i as f64)).collect();
        let mut dash = dashboard(records);
        let first = dash.view(Some(2023)).unwrap();
        let second = dash.view(Some(2023)).unwrap();
        assert_eq!(first.map, second.map);
    }

    #[test]
    fn summaries_count_placeable_rows() {
        let mut dash = dashboard(vec![
            record("Utrecht", 2020, 1.0),
            record("Mars", 2020, 1.0),
            record("Sneek", 2021, 1.0),
        ]);
        let summaries = dash.summaries().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].year, 2020);
        assert_eq!(summaries[0].record_count, 2);
        assert_eq!(summaries[0].placeable_count, 1);
        assert_eq!(summaries[1].placeable_count, 1);
    }
}
