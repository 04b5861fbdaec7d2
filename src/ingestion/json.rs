//! JSON ingestion implementation for StatsWales-style exports.
//!
//! Supported inputs:
//! - An object with a `value` array of records: `{"value": [{...}, {...}]}` (the export format)
//! - A bare JSON array of records: `[{...}, {...}]`
//! - Newline-delimited JSON (NDJSON), one record per line
//!
//! Each record carries one value for one (area, measure, year). Files that hold a single
//! measure have no measure-code field; for those the measure comes from the
//! [`SourceColumn::SingleMeasureCode`] / [`SourceColumn::SingleMeasureName`] entries of the
//! column mapping. Mapped column names may use dot paths (e.g. `area.code`) to reach nested
//! fields.

use std::borrow::Cow;
use std::io::Read;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{StatsError, StatsResult};
use crate::types::{Area, MeasureSeries};

use super::columns::{ColumnMapping, SourceColumn};
use super::filters::Filters;
use super::tokens::{parse_value, parse_year};
use super::unified::ParsedSource;

/// Parse StatsWales JSON records.
///
/// Filters are applied per record in order area → measure → year; a rejected record is skipped
/// before anything is staged. Accepted records create (or reuse) the area with its English name
/// (a blank name leaves any existing one alone) and merge the single value into the measure
/// series.
pub fn parse_stats_json<R: Read>(
    mut reader: R,
    cols: &ColumnMapping,
    filters: &Filters,
) -> StatsResult<ParsedSource> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| StatsError::malformed(format!("json input is not valid utf-8: {e}")))?;
    let records = records_from_str(&text)?;

    let code_col = cols.require(SourceColumn::AuthCode)?;
    let year_col = cols.require(SourceColumn::Year)?;
    let value_col = cols.require(SourceColumn::Value)?;
    let name_col = cols.get(SourceColumn::AuthNameEng);

    let mut parsed = ParsedSource::default();
    for (idx0, record) in records.iter().enumerate() {
        let row = idx0 + 1;
        let obj = record
            .as_object()
            .ok_or_else(|| StatsError::malformed(format!("record {row} is not a json object")))?;
        parsed.stats.records += 1;

        let code = required_text(obj, code_col, row)?;
        if !filters.accepts_area(&code) {
            parsed.stats.skipped += 1;
            continue;
        }

        let (measure_code, measure_label) = resolve_measure(obj, cols, row)?;
        if !filters.accepts_measure(&measure_code) {
            parsed.stats.skipped += 1;
            continue;
        }

        let year = year_field(obj, year_col, row)?;
        if !filters.accepts_year(year) {
            parsed.stats.skipped += 1;
            continue;
        }

        let value = value_field(obj, value_col, row)?;

        let mut area = Area::new(code.into_owned());
        if let Some(name) = name_col
            .and_then(|col| optional_text(obj, col))
            .filter(|n| !n.trim().is_empty())
        {
            area.set_name("eng", name);
        }
        let mut series = MeasureSeries::new(&measure_code, measure_label);
        series.set_value(year, value);
        area.set_measure(&measure_code, series);
        parsed.areas.insert_area(area);
        parsed.stats.values += 1;
    }

    debug!(
        records = parsed.stats.records,
        skipped = parsed.stats.skipped,
        "parsed stats json"
    );
    Ok(parsed.finish())
}

fn records_from_str(input: &str) -> StatsResult<Vec<Value>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(StatsError::malformed("json input is empty"));
    }

    // First try parsing as a single JSON document.
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(mut doc)) => match doc.remove("value") {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(StatsError::malformed("json field 'value' must be an array")),
            None => Ok(vec![Value::Object(doc)]),
        },
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(StatsError::malformed(
            "json must be an object with a 'value' array, an array of records, or NDJSON",
        )),
        Err(first_err) => {
            // Fall back to NDJSON; a single-line document that failed is reported as is.
            if !trimmed.contains('\n') {
                return Err(first_err.into());
            }
            let mut values = Vec::new();
            for (i, line) in trimmed.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let v = serde_json::from_str::<Value>(line).map_err(|e| {
                    StatsError::malformed(format!("invalid ndjson at line {}: {}", i + 1, e))
                })?;
                values.push(v);
            }
            Ok(values)
        }
    }
}

/// Measure code and label for a record: its own measure-code field when the mapping names one
/// and the record carries it, otherwise the mapping's single-measure entries.
fn resolve_measure(
    obj: &Map<String, Value>,
    cols: &ColumnMapping,
    row: usize,
) -> StatsResult<(String, String)> {
    let explicit = cols
        .get(SourceColumn::MeasureCode)
        .and_then(|col| optional_text(obj, col));

    match explicit {
        Some(code) => {
            let label = cols
                .get(SourceColumn::MeasureName)
                .and_then(|col| optional_text(obj, col))
                .unwrap_or_else(|| code.clone());
            Ok((code.to_lowercase(), label.into_owned()))
        }
        None => {
            let code = cols.get(SourceColumn::SingleMeasureCode).ok_or_else(|| {
                StatsError::malformed(format!(
                    "record {row} has no measure code and the mapping declares no single measure"
                ))
            })?;
            let label = cols.get(SourceColumn::SingleMeasureName).unwrap_or(code);
            Ok((code.to_lowercase(), label.to_owned()))
        }
    }
}

fn required_text<'a>(
    obj: &'a Map<String, Value>,
    column: &str,
    row: usize,
) -> StatsResult<Cow<'a, str>> {
    optional_text(obj, column)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            StatsError::malformed(format!("record {row} missing required field '{column}'"))
        })
}

fn optional_text<'a>(obj: &'a Map<String, Value>, column: &str) -> Option<Cow<'a, str>> {
    match get_by_dot_path(obj, column)? {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        _ => None,
    }
}

fn year_field(obj: &Map<String, Value>, column: &str, row: usize) -> StatsResult<u32> {
    match get_by_dot_path(obj, column) {
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|y| u32::try_from(y).ok())
            .ok_or_else(|| StatsError::parse(row, column, n.to_string(), "expected a year")),
        Some(Value::String(s)) => parse_year(row, column, s),
        Some(other) => Err(StatsError::parse(row, column, other.to_string(), "expected a year")),
        None => Err(StatsError::malformed(format!(
            "record {row} missing required field '{column}'"
        ))),
    }
}

fn value_field(obj: &Map<String, Value>, column: &str, row: usize) -> StatsResult<f64> {
    match get_by_dot_path(obj, column) {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| StatsError::parse(row, column, n.to_string(), "expected number")),
        Some(Value::String(s)) => parse_value(row, column, s),
        Some(other) => Err(StatsError::parse(row, column, other.to_string(), "expected number")),
        None => Err(StatsError::malformed(format!(
            "record {row} missing required field '{column}'"
        ))),
    }
}

fn get_by_dot_path<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    // Exact keys win, so column names that happen to contain dots still work.
    if let Some(v) = root.get(path) {
        return Some(v);
    }

    let mut segments = path.split('.');
    let mut current = root.get(segments.next()?)?;
    for segment in segments {
        match current {
            Value::Object(map) => current = map.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}
