//! Core data model.
//!
//! Ingestion builds a three-level hierarchy:
//!
//! - [`AreaCollection`]: every [`Area`] keyed by authority code
//! - [`Area`]: localized names plus a [`MeasureSeries`] per measure code
//! - [`MeasureSeries`]: one value per year
//!
//! Language codes and measure codes are stored lowercase and every lookup normalizes its key the
//! same way, so callers never need to care about the casing used by a particular source file.
//! Authority codes are kept exactly as given.
//!
//! Writes never replace data wholesale. Setting a measure that already exists combines the two
//! series year by year (the incoming series wins on shared years), and inserting an area that
//! already exists merges names and measures into the stored one.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::error::{StatsError, StatsResult};

/// A labelled series of values keyed by year.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureSeries {
    code: String,
    label: String,
    values: BTreeMap<u32, f64>,
}

impl MeasureSeries {
    /// Create an empty series. `code` is lowercased.
    pub fn new(code: impl AsRef<str>, label: impl Into<String>) -> Self {
        Self {
            code: code.as_ref().to_lowercase(),
            label: label.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Insert or overwrite the value for `year`.
    pub fn set_value(&mut self, year: u32, value: f64) {
        self.values.insert(year, value);
    }

    /// Value recorded for `year`.
    pub fn get_value(&self, year: u32) -> StatsResult<f64> {
        self.values
            .get(&year)
            .copied()
            .ok_or_else(|| StatsError::not_found("value for year", year.to_string()))
    }

    /// Number of years with a value.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(year, value)` pairs in ascending year order.
    pub fn values(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.values.iter().map(|(&year, &value)| (year, value))
    }

    /// Copy every year of `other` into `self`, overwriting shared years.
    ///
    /// Years only present in `self` are kept. The label is left as is.
    pub fn combine(&mut self, other: &MeasureSeries) {
        for (&year, &value) in &other.values {
            self.values.insert(year, value);
        }
    }

    /// Mean of all values, or `0.0` for an empty series.
    pub fn average(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.values().sum::<f64>() / self.values.len() as f64
    }

    /// Value of the latest year minus value of the earliest year.
    ///
    /// Returns `0.0` when fewer than two years are present.
    pub fn difference(&self) -> f64 {
        match self.first_and_last() {
            Some((first, last)) => last - first,
            None => 0.0,
        }
    }

    /// [`Self::difference`] as a percentage of the earliest value.
    ///
    /// Returns `0.0` when fewer than two years are present or the earliest value is exactly zero.
    pub fn difference_as_percentage(&self) -> f64 {
        match self.first_and_last() {
            Some((first, last)) if first != 0.0 => (last - first) / first * 100.0,
            _ => 0.0,
        }
    }

    fn first_and_last(&self) -> Option<(f64, f64)> {
        if self.values.len() < 2 {
            return None;
        }
        let first = self.values.first_key_value()?.1;
        let last = self.values.last_key_value()?.1;
        Some((*first, *last))
    }
}

/// A geographic area identified by its authority code.
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    authority_code: String,
    names: BTreeMap<String, String>,
    measures: BTreeMap<String, MeasureSeries>,
}

impl Area {
    pub fn new(authority_code: impl Into<String>) -> Self {
        Self {
            authority_code: authority_code.into(),
            names: BTreeMap::new(),
            measures: BTreeMap::new(),
        }
    }

    pub fn authority_code(&self) -> &str {
        &self.authority_code
    }

    /// Set the name for a language code (e.g. `eng`, `cym`), overwriting any previous one.
    pub fn set_name(&mut self, lang: &str, name: impl Into<String>) {
        self.names.insert(lang.to_lowercase(), name.into());
    }

    pub fn get_name(&self, lang: &str) -> StatsResult<&str> {
        let lang = lang.to_lowercase();
        self.names
            .get(&lang)
            .map(String::as_str)
            .ok_or_else(|| StatsError::not_found("name for language", lang))
    }

    /// Names keyed by lowercase language code.
    pub fn names(&self) -> &BTreeMap<String, String> {
        &self.names
    }

    /// Store `series` under `code`, combining with an existing series for the same code.
    pub fn set_measure(&mut self, code: &str, series: MeasureSeries) {
        match self.measures.entry(code.to_lowercase()) {
            Entry::Occupied(mut existing) => existing.get_mut().combine(&series),
            Entry::Vacant(slot) => {
                slot.insert(series);
            }
        }
    }

    pub fn get_measure(&self, code: &str) -> StatsResult<&MeasureSeries> {
        self.measures
            .get(&code.to_lowercase())
            .ok_or_else(|| StatsError::not_found("measure", code))
    }

    /// Measures keyed by lowercase measure code.
    pub fn measures(&self) -> &BTreeMap<String, MeasureSeries> {
        &self.measures
    }

    /// Number of distinct measures.
    pub fn size(&self) -> usize {
        self.measures.len()
    }

    /// Fold `other` into `self`: its names overwrite ours per language and its measures are
    /// combined into ours per code. The authority code of `self` is kept.
    pub fn merge(&mut self, other: Area) {
        self.names.extend(other.names);
        for (code, series) in other.measures {
            self.set_measure(&code, series);
        }
    }
}

/// Every ingested [`Area`], keyed by authority code and iterated in key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaCollection {
    areas: BTreeMap<String, Area>,
}

impl AreaCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `area` under `code`, merging into an existing area for that code.
    pub fn set_area(&mut self, code: &str, area: Area) {
        match self.areas.entry(code.to_owned()) {
            Entry::Occupied(mut existing) => existing.get_mut().merge(area),
            Entry::Vacant(slot) => {
                slot.insert(area);
            }
        }
    }

    /// Store `area` under its own authority code, merging into an existing one, and return the
    /// stored area so the caller can keep adding names and measures to it.
    pub fn insert_area(&mut self, area: Area) -> &mut Area {
        match self.areas.entry(area.authority_code.clone()) {
            Entry::Occupied(existing) => {
                let stored = existing.into_mut();
                stored.merge(area);
                stored
            }
            Entry::Vacant(slot) => slot.insert(area),
        }
    }

    pub fn get_area(&self, code: &str) -> StatsResult<&Area> {
        self.areas
            .get(code)
            .ok_or_else(|| StatsError::not_found("area", code))
    }

    pub fn get_area_mut(&mut self, code: &str) -> StatsResult<&mut Area> {
        self.areas
            .get_mut(code)
            .ok_or_else(|| StatsError::not_found("area", code))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.areas.contains_key(code)
    }

    /// Number of areas.
    pub fn size(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    /// Areas in authority-code order.
    pub fn iter(&self) -> impl Iterator<Item = &Area> + '_ {
        self.areas.values()
    }

    /// Merge every area of `other` into `self`.
    pub fn merge(&mut self, other: AreaCollection) {
        for (code, area) in other.areas {
            self.set_area(&code, area);
        }
    }
}
