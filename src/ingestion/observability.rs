//! Reporting of per-source ingestion outcomes.
//!
//! [`super::ingest_source`] calls an [`IngestionObserver`] once per source: `on_success` with the
//! parser's [`IngestionStats`], or `on_failure` (and `on_alert` above a threshold) with the error
//! and its [`IngestionSeverity`].

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{error, info, warn};

use crate::error::{ErrorKind, StatsError};

use super::unified::SourceFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    Info,
    Warning,
    /// The source was rejected; other sources are unaffected.
    Error,
    /// The source could not even be opened or read.
    Critical,
}

impl IngestionSeverity {
    /// Severity of a failed ingestion.
    pub fn for_error(e: &StatsError) -> Self {
        match e.kind() {
            ErrorKind::StreamState => Self::Critical,
            ErrorKind::NotFound | ErrorKind::MalformedInput | ErrorKind::UnsupportedFormat => {
                Self::Error
            }
        }
    }
}

/// Which source an event is about.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// Usually a file path.
    pub source: String,
    pub format: SourceFormat,
}

/// Counters reported on successful ingestion.
///
/// `skipped` counts records rejected by a filter. Records that fail to parse never show up
/// here because they abort the whole source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionStats {
    /// Data records (rows or JSON records) read.
    pub records: usize,
    /// Records dropped by the area/measure/year filters.
    pub skipped: usize,
    /// Year values staged.
    pub values: usize,
    /// Distinct areas touched.
    pub areas: usize,
}

impl fmt::Display for IngestionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "records={} skipped={} values={} areas={}",
            self.records, self.skipped, self.values, self.areas
        )
    }
}

/// Observer interface for ingestion outcomes.
pub trait IngestionObserver: Send + Sync {
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &StatsError) {}

    /// Called for failures at or above the configured alert threshold, after `on_failure`.
    ///
    /// Defaults to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &StatsError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Forwards every callback to each wrapped observer in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }

    pub fn with(mut self, observer: Arc<dyn IngestionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.observers.iter().for_each(|o| o.on_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &StatsError) {
        self.observers
            .iter()
            .for_each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &StatsError) {
        self.observers
            .iter()
            .for_each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Emits ingestion events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        info!(
            source = %ctx.source,
            format = %ctx.format,
            records = stats.records,
            skipped = stats.skipped,
            values = stats.values,
            areas = stats.areas,
            "ingested source"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &StatsError) {
        warn!(source = %ctx.source, format = %ctx.format, ?severity, %error, "source rejected");
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &StatsError) {
        error!(source = %ctx.source, format = %ctx.format, ?severity, %error, "source unreadable");
    }
}

/// Appends one line per event to a log file.
///
/// The file is opened lazily on the first event and kept open. Writes are best-effort: if the
/// file cannot be opened or written, the event is dropped.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileObserver {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, event: &str, ctx: &IngestionContext, detail: fmt::Arguments<'_>) {
        let Ok(mut slot) = self.file.lock() else {
            return;
        };
        if slot.is_none() {
            *slot = OpenOptions::new().create(true).append(true).open(&self.path).ok();
        }
        if let Some(file) = slot.as_mut() {
            let _ = writeln!(
                file,
                "{} {event} source={} format={} {detail}",
                unix_ts(),
                ctx.source,
                ctx.format
            );
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.append("ok", ctx, format_args!("{stats}"));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &StatsError) {
        self.append("fail", ctx, format_args!("severity={severity:?} error={error}"));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &StatsError) {
        self.append("ALERT", ctx, format_args!("severity={severity:?} error={error}"));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
