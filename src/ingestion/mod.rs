//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest_source`] (from [`unified`]) or
//! [`crate::types::AreaCollection::populate_filtered`], which:
//!
//! - reject unreadable or empty streams before parsing
//! - dispatch on [`SourceFormat`] to the matching parser
//! - merge the parsed areas into an [`crate::types::AreaCollection`]
//! - optionally report success/failure/alerts to an [`IngestionObserver`]
//!
//! Format-specific parsers are also available under:
//! - [`csv`] (authority-code tables, authority-by-year tables)
//! - [`json`] (StatsWales JSON exports)

pub mod columns;
pub mod csv;
pub mod filters;
pub mod json;
pub mod observability;
mod tokens;
pub mod unified;

pub use columns::{ColumnMapping, SourceColumn};
pub use filters::{Filters, YearRange};
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity,
    IngestionStats, TracingObserver,
};
pub use unified::{
    ingest_source, InputFile, InputSource, IngestionOptions, IngestionRequest, ParsedSource,
    SourceFormat,
};
