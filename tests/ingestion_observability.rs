use std::fs;
use std::sync::{Arc, Mutex};

use area_stats::ingestion::{
    ingest_source, ColumnMapping, CompositeObserver, FileObserver, IngestionContext,
    IngestionObserver, IngestionOptions, IngestionSeverity, IngestionStats, InputFile,
    SourceColumn, SourceFormat,
};
use area_stats::types::AreaCollection;
use area_stats::StatsError;

#[derive(Default)]
struct RecordingObserver {
    successes: Mutex<Vec<(String, IngestionStats)>>,
    failures: Mutex<Vec<IngestionSeverity>>,
    alerts: Mutex<Vec<IngestionSeverity>>,
}

impl IngestionObserver for RecordingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.successes
            .lock()
            .unwrap()
            .push((ctx.source.clone(), stats));
    }

    fn on_failure(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &StatsError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &IngestionContext, severity: IngestionSeverity, _error: &StatsError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn areas_mapping() -> ColumnMapping {
    ColumnMapping::new()
        .with(SourceColumn::AuthCode, "Local authority code")
        .with(SourceColumn::AuthNameEng, "Name (eng)")
        .with(SourceColumn::AuthNameCym, "Name (cym)")
}

fn options_with(observer: Arc<dyn IngestionObserver>) -> IngestionOptions {
    IngestionOptions {
        observer: Some(observer),
        alert_at_or_above: IngestionSeverity::Critical,
        ..Default::default()
    }
}

#[test]
fn observer_receives_failure_and_alert_on_critical_io_error() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = options_with(obs.clone());

    // Missing file -> stream error -> Critical
    let mut areas = AreaCollection::new();
    let _ = ingest_source(
        &mut areas,
        &InputFile::new("tests/fixtures/does_not_exist.csv"),
        SourceFormat::AuthorityCodeCsv,
        &areas_mapping(),
        &opts,
    )
    .unwrap_err();

    let failures = obs.failures.lock().unwrap().clone();
    let alerts = obs.alerts.lock().unwrap().clone();
    assert_eq!(failures, vec![IngestionSeverity::Critical]);
    assert_eq!(alerts, vec![IngestionSeverity::Critical]);
}

#[test]
fn observer_receives_failure_without_alert_for_non_critical_error() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = options_with(obs.clone());

    // Area table not loaded -> not found -> Error (not Critical) -> no alert
    let mut areas = AreaCollection::new();
    let mapping = ColumnMapping::new()
        .with(SourceColumn::SingleMeasureCode, "area")
        .with(SourceColumn::SingleMeasureName, "Land area");
    let _ = ingest_source(
        &mut areas,
        &InputFile::new("tests/fixtures/complete-popu1009-area.csv"),
        SourceFormat::AuthorityByYearCsv,
        &mapping,
        &opts,
    )
    .unwrap_err();

    let failures = obs.failures.lock().unwrap().clone();
    assert_eq!(failures, vec![IngestionSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn observer_receives_success_with_counters() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = options_with(obs.clone());

    let mut areas = AreaCollection::new();
    ingest_source(
        &mut areas,
        &InputFile::new("tests/fixtures/areas.csv"),
        SourceFormat::AuthorityCodeCsv,
        &areas_mapping(),
        &opts,
    )
    .unwrap();

    let successes = obs.successes.lock().unwrap().clone();
    assert_eq!(successes.len(), 1);
    assert!(successes[0].0.ends_with("areas.csv"));
    assert_eq!(successes[0].1.records, 5);
    assert_eq!(successes[0].1.areas, 5);
    assert!(obs.failures.lock().unwrap().is_empty());
}

#[test]
fn composite_observer_fans_out_to_every_observer() {
    let first = Arc::new(RecordingObserver::default());
    let second = Arc::new(RecordingObserver::default());
    let composite = CompositeObserver::new(vec![
        first.clone() as Arc<dyn IngestionObserver>,
        second.clone() as Arc<dyn IngestionObserver>,
    ]);
    let opts = options_with(Arc::new(composite));

    let mut areas = AreaCollection::new();
    let _ = ingest_source(
        &mut areas,
        &InputFile::new("tests/fixtures/does_not_exist.csv"),
        SourceFormat::AuthorityCodeCsv,
        &areas_mapping(),
        &opts,
    )
    .unwrap_err();

    for obs in [&first, &second] {
        assert_eq!(obs.failures.lock().unwrap().len(), 1);
        assert_eq!(obs.alerts.lock().unwrap().len(), 1);
    }
}

#[test]
fn file_observer_appends_one_line_per_event() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("ingest.log");
    let opts = options_with(Arc::new(FileObserver::new(&log)));

    let mut areas = AreaCollection::new();
    ingest_source(
        &mut areas,
        &InputFile::new("tests/fixtures/areas.csv"),
        SourceFormat::AuthorityCodeCsv,
        &areas_mapping(),
        &opts,
    )
    .unwrap();
    let _ = ingest_source(
        &mut areas,
        &InputFile::new("tests/fixtures/does_not_exist.csv"),
        SourceFormat::AuthorityCodeCsv,
        &areas_mapping(),
        &opts,
    )
    .unwrap_err();

    let text = fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains(" ok ") && lines[0].contains("records=5"));
    assert!(lines[1].contains(" fail ") && lines[1].contains("severity=Critical"));
    assert!(lines[2].contains(" ALERT ") && lines[2].contains("does_not_exist.csv"));
}
