//! Loads the area table and then every selected dataset from a data directory.
//!
//! The area table comes first because authority-by-year tables only attach measures to areas
//! that already exist. A failure there is returned to the caller. Each dataset after that is
//! ingested on its own: a failure is logged, recorded in the [`LoadReport`], and the next
//! dataset is attempted against the unchanged collection.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::catalogue::{Catalogue, DatasetSource};
use crate::error::{StatsError, StatsResult};
use crate::ingestion::{IngestionOptions, IngestionStats};
use crate::types::AreaCollection;

/// Result of ingesting one catalogue dataset.
#[derive(Debug)]
pub struct DatasetOutcome {
    pub code: String,
    pub path: PathBuf,
    pub result: StatsResult<IngestionStats>,
}

impl DatasetOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// What a full load did.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Counters for the area table.
    pub areas: IngestionStats,
    /// One entry per selected dataset, in load order.
    pub datasets: Vec<DatasetOutcome>,
}

impl LoadReport {
    pub fn loaded(&self) -> usize {
        self.datasets.iter().filter(|d| d.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &DatasetOutcome> {
        self.datasets.iter().filter(|d| !d.is_ok())
    }
}

/// Runs a [`Catalogue`] against the files in one directory.
#[derive(Debug, Clone)]
pub struct Loader<'c> {
    catalogue: &'c Catalogue,
    dir: PathBuf,
    options: IngestionOptions,
}

impl<'c> Loader<'c> {
    pub fn new(catalogue: &'c Catalogue, dir: impl AsRef<Path>, options: IngestionOptions) -> Self {
        Self {
            catalogue,
            dir: dir.as_ref().to_path_buf(),
            options,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ingest the catalogue's area table into `areas`.
    pub fn load_areas(&self, areas: &mut AreaCollection) -> StatsResult<IngestionStats> {
        let request = self.catalogue.areas.request(&self.dir);
        debug!(path = %request.path.display(), "loading area table");
        request.run(areas, &self.options)
    }

    /// Ingest each dataset in turn, continuing past failures.
    pub fn load_datasets(
        &self,
        areas: &mut AreaCollection,
        datasets: &[&DatasetSource],
    ) -> Vec<DatasetOutcome> {
        datasets
            .iter()
            .map(|dataset| {
                let request = dataset.request(&self.dir);
                let result = request.run(areas, &self.options);
                match &result {
                    Ok(stats) => info!(
                        dataset = %dataset.code,
                        values = stats.values,
                        skipped = stats.skipped,
                        "loaded dataset"
                    ),
                    Err(error) => warn!(
                        dataset = %dataset.code,
                        path = %request.path.display(),
                        %error,
                        "skipping dataset"
                    ),
                }
                DatasetOutcome {
                    code: dataset.code.clone(),
                    path: request.path,
                    result,
                }
            })
            .collect()
    }

    /// Load the area table, then the datasets named by `codes` (see [`Catalogue::select`]).
    ///
    /// Fails only if a code is unknown or the area table cannot be loaded.
    pub fn load<S: AsRef<str>>(&self, codes: &[S]) -> StatsResult<(AreaCollection, LoadReport)> {
        let selected = self.catalogue.select(codes)?;

        let mut areas = AreaCollection::new();
        let area_stats = self.load_areas(&mut areas).map_err(|e| match e {
            StatsError::StreamState { message } => StatsError::stream_state(format!(
                "area table {}: {message}",
                self.catalogue.areas.file
            )),
            other => other,
        })?;

        let datasets = self.load_datasets(&mut areas, &selected);
        let report = LoadReport {
            areas: area_stats,
            datasets,
        };
        info!(
            areas = areas.size(),
            loaded = report.loaded(),
            selected = selected.len(),
            "load finished"
        );
        Ok((areas, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn missing_area_table_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let catalogue = Catalogue::builtin();
        let loader = Loader::new(&catalogue, dir.path(), IngestionOptions::default());

        let err = loader.load(&["all"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StreamState);
        assert!(err.to_string().contains("areas.csv"));
    }

    #[test]
    fn unknown_dataset_code_fails_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        let catalogue = Catalogue::builtin();
        let loader = Loader::new(&catalogue, dir.path(), IngestionOptions::default());

        let err = loader.load(&["popden", "weather"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn failed_dataset_is_reported_and_others_still_load() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "areas.csv",
            "Local authority code,Name (eng),Name (cym)\nW06000023,Powys,Powys\n",
        );
        write(
            dir.path(),
            "complete-popu1009-pop.csv",
            "AuthorityCode,2019,2020\nW06000023,132000,133000\n",
        );
        write(dir.path(), "complete-popu1009-area.csv", "AuthorityCode,2020\nW06000023,abc\n");

        let catalogue = Catalogue::builtin();
        let loader = Loader::new(&catalogue, dir.path(), IngestionOptions::default());
        let (areas, report) = loader
            .load(&["complete-area", "complete-pop", "trains"])
            .unwrap();

        assert_eq!(report.areas.areas, 1);
        assert_eq!(report.loaded(), 1);
        let failed: Vec<&str> = report.failed().map(|d| d.code.as_str()).collect();
        assert_eq!(failed, vec!["complete-area", "trains"]);

        let powys = areas.get_area("W06000023").unwrap();
        assert_eq!(powys.get_measure("pop").unwrap().get_value(2020).unwrap(), 133000.0);
        assert!(powys.get_measure("area").is_err());
    }
}
