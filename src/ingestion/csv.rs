//! CSV ingestion implementation.
//!
//! Two layouts are supported:
//!
//! - **authority-code table**: one row per area with its authority code, English name and
//!   Welsh name.
//! - **authority-by-year table**: a wide table for a single measure. The header lists the
//!   authority-code column followed by one column per year; each row holds one area's values.
//!
//! Both parsers stage their output in a fresh [`crate::types::AreaCollection`]; nothing is
//! merged anywhere until the whole input has been read successfully.

use std::io::Read;

use csv::StringRecord;
use tracing::debug;

use crate::error::{StatsError, StatsResult};
use crate::types::{Area, AreaCollection, MeasureSeries};

use super::columns::{ColumnMapping, SourceColumn};
use super::filters::Filters;
use super::tokens::{parse_value, parse_year};
use super::unified::ParsedSource;

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All);
    builder
}

/// Parse an authority-code table.
///
/// Rules:
///
/// - The first line is a header. Columns are located through `cols`; headers the mapping does
///   not name fall back to positions 0/1/2 (code, English name, Welsh name).
/// - A row with fewer columns than needed is malformed and aborts the parse.
/// - A blank name cell sets no name for that language.
/// - Rows whose authority code is rejected by `filters` are skipped.
/// - An authority code appearing twice merges into one area (the later row's names win).
pub fn parse_authority_code_csv<R: Read>(
    reader: R,
    cols: &ColumnMapping,
    filters: &Filters,
) -> StatsResult<ParsedSource> {
    let mut rdr = reader_builder().from_reader(reader);
    let headers = rdr.headers()?.clone();

    let code_idx = cols.resolve_index(SourceColumn::AuthCode, headers.iter())?;
    let eng_idx = cols.resolve_index(SourceColumn::AuthNameEng, headers.iter())?;
    let cym_idx = cols.resolve_index(SourceColumn::AuthNameCym, headers.iter())?;
    let required = code_idx.max(eng_idx).max(cym_idx) + 1;

    let mut parsed = ParsedSource::default();
    for (row_idx0, result) in rdr.records().enumerate() {
        // 1-based, and the header is row 1.
        let user_row = row_idx0 + 2;
        let record = result?;
        check_width(&record, required, user_row)?;

        let code = authority_code(&record, code_idx, user_row)?;
        parsed.stats.records += 1;
        if !filters.accepts_area(code) {
            parsed.stats.skipped += 1;
            continue;
        }

        let mut area = Area::new(code);
        for (lang, idx) in [("eng", eng_idx), ("cym", cym_idx)] {
            let name = field(&record, idx);
            if !name.is_empty() {
                area.set_name(lang, name);
            }
        }
        parsed.areas.insert_area(area);
    }

    debug!(
        records = parsed.stats.records,
        skipped = parsed.stats.skipped,
        "parsed authority-code table"
    );
    Ok(parsed.finish())
}

/// Parse an authority-by-year table for the single measure declared in `cols`
/// ([`SourceColumn::SingleMeasureCode`] / [`SourceColumn::SingleMeasureName`]).
///
/// Every area referenced by an accepted row must already exist in `known` (load the
/// authority-code table first); otherwise the parse fails with a not-found error.
///
/// Every row must carry one value per header year; short or long rows are malformed.
///
/// Filtering: rows for rejected areas are skipped; if the measure itself is rejected every row
/// is skipped; year columns outside the year range are dropped.
pub fn parse_authority_by_year_csv<R: Read>(
    reader: R,
    cols: &ColumnMapping,
    filters: &Filters,
    known: &AreaCollection,
) -> StatsResult<ParsedSource> {
    let measure_code = cols.require(SourceColumn::SingleMeasureCode)?;
    let measure_label = cols
        .get(SourceColumn::SingleMeasureName)
        .unwrap_or(measure_code);
    let measure_wanted = filters.accepts_measure(measure_code);

    let mut rdr = reader_builder().from_reader(reader);
    let headers = rdr.headers()?.clone();
    if headers.len() < 2 {
        return Err(StatsError::malformed(format!(
            "authority-by-year header needs at least one year column, found {} column(s)",
            headers.len()
        )));
    }
    let years = headers
        .iter()
        .skip(1)
        .map(|raw| parse_year(1, "header", raw))
        .collect::<StatsResult<Vec<u32>>>()?;

    let mut parsed = ParsedSource::default();
    for (row_idx0, result) in rdr.records().enumerate() {
        let user_row = row_idx0 + 2;
        let record = result?;
        check_width(&record, years.len() + 1, user_row)?;
        if record.len() > years.len() + 1 {
            return Err(StatsError::malformed(format!(
                "row {user_row} has {} values but the header lists {} years",
                record.len() - 1,
                years.len()
            )));
        }

        let code = authority_code(&record, 0, user_row)?;
        parsed.stats.records += 1;
        if !measure_wanted || !filters.accepts_area(code) {
            parsed.stats.skipped += 1;
            continue;
        }
        if !known.contains(code) {
            return Err(StatsError::not_found("area", code));
        }

        let mut series = MeasureSeries::new(measure_code, measure_label);
        for (raw, &year) in record.iter().skip(1).zip(&years) {
            if !filters.accepts_year(year) {
                continue;
            }
            let value = parse_value(user_row, &year.to_string(), raw)?;
            series.set_value(year, value);
        }
        parsed.stats.values += series.len();

        let mut area = Area::new(code);
        area.set_measure(measure_code, series);
        parsed.areas.insert_area(area);
    }

    debug!(
        measure = measure_code,
        years = years.len(),
        records = parsed.stats.records,
        skipped = parsed.stats.skipped,
        "parsed authority-by-year table"
    );
    Ok(parsed.finish())
}

fn check_width(record: &StringRecord, required: usize, row: usize) -> StatsResult<()> {
    if record.len() < required {
        return Err(StatsError::malformed(format!(
            "row {row} has {} column(s), expected at least {required}",
            record.len()
        )));
    }
    Ok(())
}

fn authority_code(record: &StringRecord, idx: usize, row: usize) -> StatsResult<&str> {
    let code = field(record, idx);
    if code.is_empty() {
        return Err(StatsError::malformed(format!("row {row} has an empty authority code")));
    }
    Ok(code)
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}
