//! `area-stats` ingests government area statistics into one merged, in-memory
//! [`types::AreaCollection`]: areas keyed by authority code, each carrying names per language
//! and a set of measures, each measure being a series of yearly values.
//!
//! The primary entrypoint is [`types::AreaCollection::populate_filtered`], which checks the stream,
//! dispatches on [`ingestion::SourceFormat`], and merges the parsed areas into the collection.
//! [`ingestion::ingest_source`] adds observer reporting on top, and [`loader`] runs a whole
//! [`catalogue::Catalogue`] of files.
//!
//! ## What you can ingest
//!
//! - **Authority-code CSV**: one row per area with its code, English name and Welsh name
//! - **Authority-by-year CSV**: one row per area, one column per year, for a single measure
//! - **StatsWales JSON**: `{"value": [...]}` with one record per (area, measure, year)
//!
//! Column names are never hard-coded in the parsers; each source comes with a
//! [`ingestion::ColumnMapping`] from logical role to header or key name.
//!
//! ## Quick example
//!
//! ```rust
//! use area_stats::ingestion::{ColumnMapping, SourceColumn, SourceFormat};
//! use area_stats::types::AreaCollection;
//!
//! # fn main() -> Result<(), area_stats::StatsError> {
//! let areas_csv = "code,eng,cym\nW06000023,Powys,Powys\n";
//! let stats_json = r#"{"value":[{"Localauthority_Code":"W06000023","Measure_Code":"pop",
//!     "Measure_ItemName_ENG":"Population","Year_Code":"2020","Data":12345}]}"#;
//!
//! let mut areas = AreaCollection::new();
//! areas.populate(
//!     areas_csv.as_bytes(),
//!     SourceFormat::AuthorityCodeCsv,
//!     &ColumnMapping::new()
//!         .with(SourceColumn::AuthCode, "code")
//!         .with(SourceColumn::AuthNameEng, "eng")
//!         .with(SourceColumn::AuthNameCym, "cym"),
//! )?;
//! areas.populate(
//!     stats_json.as_bytes(),
//!     SourceFormat::StatsJson,
//!     &ColumnMapping::new()
//!         .with(SourceColumn::AuthCode, "Localauthority_Code")
//!         .with(SourceColumn::MeasureCode, "Measure_Code")
//!         .with(SourceColumn::MeasureName, "Measure_ItemName_ENG")
//!         .with(SourceColumn::Year, "Year_Code")
//!         .with(SourceColumn::Value, "Data"),
//! )?;
//!
//! let pop = areas.get_area("W06000023")?.get_measure("pop")?;
//! assert_eq!(pop.get_value(2020)?, 12345.0);
//! assert_eq!(pop.difference(), 0.0);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: measures, areas and the area collection, with merge semantics
//! - [`ingestion`]: column mappings, filters, format-specific parsers and the dispatcher
//! - [`output`]: JSON and plain-text rendering
//! - [`catalogue`]: the known dataset files and their column mappings
//! - [`loader`]: load the areas table, then every selected dataset
//! - [`cli`]: command-line arguments
//! - [`error`]: error types used across the crate

pub mod catalogue;
pub mod cli;
pub mod error;
pub mod ingestion;
pub mod loader;
pub mod output;
pub mod types;

pub use error::{ErrorKind, StatsError, StatsResult};
