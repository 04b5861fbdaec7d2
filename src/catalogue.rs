//! Catalogue of known dataset files and their column mappings.
//!
//! The catalogue is plain data: build the built-in one with [`Catalogue::builtin`] or load one
//! from JSON with [`Catalogue::from_json_path`], and hand it to the [`crate::loader`].
//!
//! ```json
//! {
//!   "areas": { "code": "areas", "name": "Areas", "file": "areas.csv",
//!              "format": "authority-code-csv",
//!              "columns": { "auth_code": "Local authority code",
//!                           "auth_name_eng": "Name (eng)", "auth_name_cym": "Name (cym)" } },
//!   "datasets": [ ... ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StatsError, StatsResult};
use crate::ingestion::{ColumnMapping, IngestionRequest, SourceColumn, SourceFormat};

/// One known data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSource {
    /// Short code used to select the dataset (e.g. `popden`).
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// File name relative to the data directory.
    pub file: String,
    pub format: SourceFormat,
    pub columns: ColumnMapping,
}

impl DatasetSource {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        file: impl Into<String>,
        format: SourceFormat,
        columns: ColumnMapping,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            file: file.into(),
            format,
            columns,
        }
    }

    /// Request for this dataset's file inside `dir`.
    pub fn request(&self, dir: &Path) -> IngestionRequest {
        IngestionRequest {
            path: dir.join(&self.file),
            format: self.format,
            columns: self.columns.clone(),
        }
    }
}

/// The area table plus every dataset that can be loaded on top of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalogue {
    /// Authority-code table that must be loaded first.
    pub areas: DatasetSource,
    pub datasets: Vec<DatasetSource>,
}

impl Catalogue {
    /// The Welsh Government statistics files this tool was built around.
    pub fn builtin() -> Self {
        let areas = DatasetSource::new(
            "areas",
            "Areas",
            "areas.csv",
            SourceFormat::AuthorityCodeCsv,
            ColumnMapping::new()
                .with(SourceColumn::AuthCode, "Local authority code")
                .with(SourceColumn::AuthNameEng, "Name (eng)")
                .with(SourceColumn::AuthNameCym, "Name (cym)"),
        );

        let datasets = vec![
            stats_json(
                "popden",
                "Population density",
                "popu1009.json",
                ("Localauthority_Code", "Localauthority_ItemName_ENG"),
                Some(("Measure_Code", "Measure_ItemName_ENG")),
            ),
            stats_json(
                "biz",
                "Active Businesses",
                "econ0080.json",
                ("Area_Code", "Area_ItemName_ENG"),
                Some(("Variable_Code", "Variable_ItemName_ENG")),
            ),
            stats_json(
                "aqi",
                "Air Quality Indicators",
                "envi0201.json",
                ("Area_Code", "Area_ItemName_ENG"),
                Some(("Pollutant_ItemName_ENG", "Pollutant_ItemName_ENG")),
            ),
            {
                let mut trains = stats_json(
                    "trains",
                    "Rail passenger journeys",
                    "tran0152.json",
                    ("LocalAuthority_Code", "LocalAuthority_ItemName_ENG"),
                    None,
                );
                trains.columns.insert(SourceColumn::SingleMeasureCode, "rail");
                trains
                    .columns
                    .insert(SourceColumn::SingleMeasureName, "Rail passenger journeys");
                trains
            },
            by_year(
                "complete-popden",
                "Population density",
                "complete-popu1009-popden.csv",
                ("dens", "Population density"),
            ),
            by_year(
                "complete-pop",
                "Population",
                "complete-popu1009-pop.csv",
                ("pop", "Population"),
            ),
            by_year(
                "complete-area",
                "Land area",
                "complete-popu1009-area.csv",
                ("area", "Land area"),
            ),
        ];

        Self { areas, datasets }
    }

    /// Parse a catalogue from JSON text.
    pub fn from_json_str(input: &str) -> StatsResult<Self> {
        let catalogue: Self = serde_json::from_str(input)?;
        catalogue.resolve_single_measures()
    }

    /// Load a catalogue from a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> StatsResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            StatsError::stream_state(format!("failed to read catalogue {}: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "loading catalogue");
        Self::from_json_str(&text)
    }

    pub fn find(&self, code: &str) -> StatsResult<&DatasetSource> {
        self.datasets
            .iter()
            .find(|d| d.code == code)
            .ok_or_else(|| StatsError::not_found("dataset", code))
    }

    /// Datasets named by `codes`, in request order and without duplicates.
    ///
    /// An empty list, or any entry equal to `all` (any case), selects every dataset.
    pub fn select<S: AsRef<str>>(&self, codes: &[S]) -> StatsResult<Vec<&DatasetSource>> {
        if codes.is_empty() || codes.iter().any(|c| c.as_ref().eq_ignore_ascii_case("all")) {
            return Ok(self.datasets.iter().collect());
        }

        let mut selected: Vec<&DatasetSource> = Vec::with_capacity(codes.len());
        for code in codes {
            let dataset = self.find(code.as_ref())?;
            if !selected.iter().any(|d| d.code == dataset.code) {
                selected.push(dataset);
            }
        }
        Ok(selected)
    }

    /// Measure code of the authority-by-year dataset whose single measure is labelled `label`.
    pub fn single_measure_for(&self, label: &str) -> Option<&str> {
        self.datasets
            .iter()
            .filter(|d| d.format == SourceFormat::AuthorityByYearCsv)
            .filter(|d| d.columns.get(SourceColumn::SingleMeasureName) == Some(label))
            .find_map(|d| d.columns.get(SourceColumn::SingleMeasureCode))
    }

    /// Fill in a missing single-measure code from another dataset declaring the same label.
    fn resolve_single_measures(mut self) -> StatsResult<Self> {
        let mut resolved = Vec::new();
        for (idx, dataset) in self.datasets.iter().enumerate() {
            if dataset.format != SourceFormat::AuthorityByYearCsv
                || dataset.columns.contains(SourceColumn::SingleMeasureCode)
            {
                continue;
            }
            let label = dataset.columns.require(SourceColumn::SingleMeasureName)?;
            let code = self
                .single_measure_for(label)
                .ok_or_else(|| StatsError::not_found("single measure labelled", label))?;
            resolved.push((idx, code.to_owned()));
        }
        for (idx, code) in resolved {
            self.datasets[idx]
                .columns
                .insert(SourceColumn::SingleMeasureCode, code);
        }
        Ok(self)
    }
}

impl Default for Catalogue {
    fn default() -> Self {
        Self::builtin()
    }
}

fn stats_json(
    code: &str,
    name: &str,
    file: &str,
    (auth_code, auth_name): (&str, &str),
    measure: Option<(&str, &str)>,
) -> DatasetSource {
    let mut columns = ColumnMapping::new()
        .with(SourceColumn::AuthCode, auth_code)
        .with(SourceColumn::AuthNameEng, auth_name)
        .with(SourceColumn::Year, "Year_Code")
        .with(SourceColumn::Value, "Data");
    if let Some((measure_code, measure_name)) = measure {
        columns.insert(SourceColumn::MeasureCode, measure_code);
        columns.insert(SourceColumn::MeasureName, measure_name);
    }
    DatasetSource::new(code, name, file, SourceFormat::StatsJson, columns)
}

fn by_year(code: &str, name: &str, file: &str, (measure_code, label): (&str, &str)) -> DatasetSource {
    DatasetSource::new(
        code,
        name,
        file,
        SourceFormat::AuthorityByYearCsv,
        ColumnMapping::new()
            .with(SourceColumn::AuthCode, "AuthorityCode")
            .with(SourceColumn::SingleMeasureCode, measure_code)
            .with(SourceColumn::SingleMeasureName, label),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn builtin_has_areas_table_and_all_datasets() {
        let c = Catalogue::builtin();
        assert_eq!(c.areas.format, SourceFormat::AuthorityCodeCsv);
        let codes: Vec<&str> = c.datasets.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(
            codes,
            vec![
                "popden",
                "biz",
                "aqi",
                "trains",
                "complete-popden",
                "complete-pop",
                "complete-area"
            ]
        );
    }

    #[test]
    fn select_all_or_empty_returns_everything() {
        let c = Catalogue::builtin();
        let none: [&str; 0] = [];
        assert_eq!(c.select(&none).unwrap().len(), c.datasets.len());
        assert_eq!(c.select(&["ALL"]).unwrap().len(), c.datasets.len());
    }

    #[test]
    fn select_keeps_request_order_and_drops_duplicates() {
        let c = Catalogue::builtin();
        let picked = c.select(&["trains", "popden", "trains"]).unwrap();
        let codes: Vec<&str> = picked.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["trains", "popden"]);
    }

    #[test]
    fn select_unknown_code_is_not_found() {
        let err = Catalogue::builtin().select(&["nope"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn single_measure_lookup_by_label() {
        let c = Catalogue::builtin();
        assert_eq!(c.single_measure_for("Population"), Some("pop"));
        assert_eq!(c.single_measure_for("Land area"), Some("area"));
        assert_eq!(c.single_measure_for("Rail passenger journeys"), None);
    }

    #[test]
    fn json_round_trip_preserves_catalogue() {
        let c = Catalogue::builtin();
        let text = serde_json::to_string(&c).unwrap();
        assert!(text.contains("\"format\":\"authority-by-year-csv\""));
        assert_eq!(Catalogue::from_json_str(&text).unwrap(), c);
    }

    #[test]
    fn unknown_format_tag_is_rejected() {
        let text = r#"{"areas":{"code":"areas","name":"Areas","file":"areas.csv","format":"xml","columns":{}},"datasets":[]}"#;
        let err = Catalogue::from_json_str(text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(err.to_string().contains("unsupported source format: xml"));
    }

    #[test]
    fn missing_single_measure_code_is_resolved_by_label() {
        let text = r#"{
            "areas": {"code":"areas","name":"Areas","file":"areas.csv","format":"authority-code-csv","columns":{}},
            "datasets": [
                {"code":"complete-pop","name":"Population","file":"pop.csv","format":"authority-by-year-csv",
                 "columns":{"auth_code":"AuthorityCode","single_measure_code":"pop","single_measure_name":"Population"}},
                {"code":"pop-2","name":"Population","file":"pop2.csv","format":"AuthorityByYearCSV",
                 "columns":{"auth_code":"AuthorityCode","single_measure_name":"Population"}}
            ]
        }"#;
        let c = Catalogue::from_json_str(text).unwrap();
        let second = c.find("pop-2").unwrap();
        assert_eq!(second.columns.get(SourceColumn::SingleMeasureCode), Some("pop"));
    }
}
