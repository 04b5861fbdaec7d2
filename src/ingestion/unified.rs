//! Format dispatch and the per-source entry point.
//!
//! [`AreaCollection::populate_filtered`] checks that a stream is readable and non-empty, hands it
//! to the parser for its [`SourceFormat`], and merges the parsed areas into the collection.
//! [`ingest_source`] wraps that for anything implementing [`InputSource`] and reports the outcome
//! to an optional [`IngestionObserver`].
//!
//! Parsers stage their output separately, so a rejected or malformed source leaves the target
//! collection exactly as it was.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};
use crate::types::AreaCollection;

use super::columns::ColumnMapping;
use super::filters::Filters;
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::{csv, json};

/// Supported source layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SourceFormat {
    /// Authority code, English name, Welsh name per row.
    AuthorityCodeCsv,
    /// Wide single-measure table: authority code then one column per year.
    AuthorityByYearCsv,
    /// StatsWales JSON export, one record per (area, measure, year).
    StatsJson,
}

impl SourceFormat {
    /// Canonical tag, as accepted by [`FromStr`] and used in catalogue files.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::AuthorityCodeCsv => "authority-code-csv",
            Self::AuthorityByYearCsv => "authority-by-year-csv",
            Self::StatsJson => "stats-json",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SourceFormat {
    type Err = StatsError;

    /// Tags are matched case-insensitively, ignoring `-` and `_`, so `authority-code-csv`,
    /// `AuthorityCodeCSV` and `authority_code_csv` are all the same format.
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let key: String = tag
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "authoritycodecsv" => Ok(Self::AuthorityCodeCsv),
            "authoritybyyearcsv" => Ok(Self::AuthorityByYearCsv),
            "statsjson" | "welshstatsjson" => Ok(Self::StatsJson),
            _ => Err(StatsError::unsupported_format(tag)),
        }
    }
}

impl TryFrom<String> for SourceFormat {
    type Error = StatsError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}

impl From<SourceFormat> for String {
    fn from(format: SourceFormat) -> Self {
        format.tag().to_owned()
    }
}

/// Output of a single parser run, not yet merged anywhere.
#[derive(Debug, Clone, Default)]
pub struct ParsedSource {
    pub areas: AreaCollection,
    pub stats: IngestionStats,
}

impl ParsedSource {
    pub(crate) fn finish(mut self) -> Self {
        self.stats.areas = self.areas.size();
        self
    }
}

impl AreaCollection {
    /// [`Self::populate_filtered`] with filters that accept everything.
    pub fn populate<R: BufRead>(
        &mut self,
        reader: R,
        format: SourceFormat,
        cols: &ColumnMapping,
    ) -> StatsResult<IngestionStats> {
        self.populate_filtered(reader, format, cols, &Filters::default())
    }

    /// Parse `reader` as `format` and merge the result into `self`.
    ///
    /// Fails with a stream-state error, without touching `self`, when the stream cannot be read
    /// or is empty. Parse errors also leave `self` untouched.
    pub fn populate_filtered<R: BufRead>(
        &mut self,
        mut reader: R,
        format: SourceFormat,
        cols: &ColumnMapping,
        filters: &Filters,
    ) -> StatsResult<IngestionStats> {
        ensure_readable(&mut reader)?;

        let parsed = match format {
            SourceFormat::AuthorityCodeCsv => csv::parse_authority_code_csv(reader, cols, filters)?,
            SourceFormat::AuthorityByYearCsv => {
                csv::parse_authority_by_year_csv(reader, cols, filters, self)?
            }
            SourceFormat::StatsJson => json::parse_stats_json(reader, cols, filters)?,
        };

        let stats = parsed.stats;
        self.merge(parsed.areas);
        Ok(stats)
    }

    /// Like [`Self::populate_filtered`], with the format given as a tag string.
    ///
    /// The stream is checked first, then the tag; both checks happen before any parsing.
    pub fn populate_tagged<R: BufRead>(
        &mut self,
        mut reader: R,
        tag: &str,
        cols: &ColumnMapping,
        filters: &Filters,
    ) -> StatsResult<IngestionStats> {
        ensure_readable(&mut reader)?;
        let format = tag.parse::<SourceFormat>()?;
        self.populate_filtered(reader, format, cols, filters)
    }
}

fn ensure_readable<R: BufRead>(reader: &mut R) -> StatsResult<()> {
    match reader.fill_buf() {
        Ok([]) => Err(StatsError::stream_state("input stream is empty")),
        Ok(_) => Ok(()),
        Err(e) => Err(StatsError::stream_state(format!(
            "input stream is not readable: {e}"
        ))),
    }
}

/// Something that can produce a readable character stream.
pub trait InputSource {
    /// Identifier of the source (e.g. a file path), used in logs and errors.
    fn source(&self) -> &str;

    /// Open a fresh stream over the source.
    fn open(&self) -> StatsResult<Box<dyn BufRead>>;
}

/// A source backed by a file on disk.
#[derive(Debug, Clone)]
pub struct InputFile {
    path: PathBuf,
    display: String,
}

impl InputFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let display = path.display().to_string();
        Self { path, display }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InputSource for InputFile {
    fn source(&self) -> &str {
        &self.display
    }

    fn open(&self) -> StatsResult<Box<dyn BufRead>> {
        let file = File::open(&self.path).map_err(|e| {
            StatsError::stream_state(format!("failed to open file {}: {e}", self.display))
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Options controlling [`ingest_source`]. The default accepts everything and reports nowhere.
#[derive(Clone)]
pub struct IngestionOptions {
    /// Area / measure / year filters applied while parsing.
    pub filters: Filters,
    /// Receives the outcome of each source.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Failures at or above this severity also trigger `on_alert`.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("filters", &self.filters)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            filters: Filters::default(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Open `source`, ingest it into `areas`, and report the outcome.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with the parser's counters
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// ```no_run
/// use std::sync::Arc;
///
/// use area_stats::ingestion::{
///     ingest_source, ColumnMapping, InputFile, IngestionOptions, SourceColumn, SourceFormat,
///     TracingObserver,
/// };
/// use area_stats::types::AreaCollection;
///
/// # fn main() -> Result<(), area_stats::StatsError> {
/// let cols = ColumnMapping::new()
///     .with(SourceColumn::AuthCode, "Local authority code")
///     .with(SourceColumn::AuthNameEng, "Name (eng)")
///     .with(SourceColumn::AuthNameCym, "Name (cym)");
/// let opts = IngestionOptions {
///     observer: Some(Arc::new(TracingObserver)),
///     ..Default::default()
/// };
///
/// let mut areas = AreaCollection::new();
/// let stats = ingest_source(
///     &mut areas,
///     &InputFile::new("datasets/areas.csv"),
///     SourceFormat::AuthorityCodeCsv,
///     &cols,
///     &opts,
/// )?;
/// println!("areas={}", stats.areas);
/// # Ok(())
/// # }
/// ```
pub fn ingest_source(
    areas: &mut AreaCollection,
    source: &dyn InputSource,
    format: SourceFormat,
    cols: &ColumnMapping,
    options: &IngestionOptions,
) -> StatsResult<IngestionStats> {
    let ctx = IngestionContext {
        source: source.source().to_owned(),
        format,
    };

    let result = source
        .open()
        .and_then(|reader| areas.populate_filtered(reader, format, cols, &options.filters));

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(stats) => obs.on_success(&ctx, *stats),
            Err(e) => {
                let sev = IngestionSeverity::for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

/// An owned description of one file to ingest.
#[derive(Debug, Clone)]
pub struct IngestionRequest {
    pub path: PathBuf,
    /// Layout of the file.
    pub format: SourceFormat,
    /// Column roles for the file.
    pub columns: ColumnMapping,
}

impl IngestionRequest {
    /// Execute the request by calling [`ingest_source`].
    pub fn run(
        &self,
        areas: &mut AreaCollection,
        options: &IngestionOptions,
    ) -> StatsResult<IngestionStats> {
        ingest_source(
            areas,
            &InputFile::new(&self.path),
            self.format,
            &self.columns,
            options,
        )
    }
}
