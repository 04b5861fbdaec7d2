//! JSON and plain-text rendering of an [`AreaCollection`].
//!
//! JSON layout:
//!
//! ```text
//! { "<authority code>": { "names": { "eng": "...", "cym": "..." },
//!                         "measures": { "<code>": { "<year>": <value>, ... } } } }
//! ```
//!
//! `cym` is omitted when the area has no Welsh name. An empty collection renders as `{}`.
//!
//! The text form lists areas by authority code and their measures by code, each measure as a
//! year table followed by average, difference and percentage difference.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{StatsError, StatsResult};
use crate::types::{Area, AreaCollection, MeasureSeries};

const COLUMN_WIDTH: usize = 11;

#[derive(Serialize)]
struct AreaJson<'a> {
    names: NamesJson<'a>,
    measures: BTreeMap<&'a str, BTreeMap<String, f64>>,
}

#[derive(Serialize)]
struct NamesJson<'a> {
    eng: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    cym: Option<&'a str>,
}

impl<'a> AreaJson<'a> {
    fn new(area: &'a Area) -> StatsResult<Self> {
        let names = NamesJson {
            eng: area.get_name("eng").map_err(|_| {
                StatsError::not_found("english name for area", area.authority_code())
            })?,
            cym: area.get_name("cym").ok(),
        };
        let measures = area
            .measures()
            .values()
            .map(|series| {
                let years = series
                    .values()
                    .map(|(year, value)| (year.to_string(), value))
                    .collect();
                (series.code(), years)
            })
            .collect();
        Ok(Self { names, measures })
    }
}

impl AreaCollection {
    /// Build the JSON document for every area.
    ///
    /// Fails with a not-found error naming the first area that has no English name.
    pub fn to_json_value(&self) -> StatsResult<serde_json::Value> {
        Ok(serde_json::to_value(self.json_view()?)?)
    }

    /// [`Self::to_json_value`] rendered as a compact string.
    pub fn to_json(&self) -> StatsResult<String> {
        Ok(serde_json::to_string(&self.json_view()?)?)
    }

    fn json_view(&self) -> StatsResult<BTreeMap<&str, AreaJson<'_>>> {
        self.iter()
            .map(|area| Ok((area.authority_code(), AreaJson::new(area)?)))
            .collect()
    }
}

impl fmt::Display for MeasureSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.label(), self.code())?;
        if self.is_empty() {
            return writeln!(f, "<no data>");
        }

        for (year, _) in self.values() {
            write!(f, " {year:>COLUMN_WIDTH$}")?;
        }
        writeln!(
            f,
            " {:>COLUMN_WIDTH$} {:>COLUMN_WIDTH$} {:>COLUMN_WIDTH$}",
            "Average", "Diff.", "% Diff."
        )?;

        for (_, value) in self.values() {
            write!(f, " {value:>COLUMN_WIDTH$.6}")?;
        }
        writeln!(
            f,
            " {:>COLUMN_WIDTH$.6} {:>COLUMN_WIDTH$.6} {:>COLUMN_WIDTH$.6}",
            self.average(),
            self.difference(),
            self.difference_as_percentage()
        )
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eng = self.get_name("eng").ok();
        let cym = self.get_name("cym").ok();
        match (eng, cym) {
            (Some(eng), Some(cym)) => write!(f, "{eng} / {cym}")?,
            (Some(name), None) | (None, Some(name)) => write!(f, "{name}")?,
            (None, None) => write!(f, "Unnamed")?,
        }
        writeln!(f, " ({})", self.authority_code())?;

        if self.measures().is_empty() {
            return writeln!(f, "<no measures>");
        }
        for series in self.measures().values() {
            writeln!(f, "{series}")?;
        }
        Ok(())
    }
}

impl fmt::Display for AreaCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for area in self.iter() {
            writeln!(f, "{area}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn powys() -> Area {
        let mut area = Area::new("W06000023");
        area.set_name("eng", "Powys");
        area.set_name("cym", "Powys");
        area
    }

    #[test]
    fn empty_collection_is_empty_object() {
        assert_eq!(AreaCollection::new().to_json().unwrap(), "{}");
    }

    #[test]
    fn json_omits_missing_welsh_name() {
        let mut areas = AreaCollection::new();
        let mut area = Area::new("W06000011");
        area.set_name("eng", "Swansea");
        areas.insert_area(area);

        let v = areas.to_json_value().unwrap();
        assert_eq!(
            v,
            serde_json::json!({"W06000011": {"names": {"eng": "Swansea"}, "measures": {}}})
        );
    }

    #[test]
    fn json_requires_english_name() {
        let mut areas = AreaCollection::new();
        areas.insert_area(Area::new("W06000011"));
        let err = areas.to_json().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "english name for area not found: W06000011");
    }

    #[test]
    fn json_nests_measures_by_year() {
        let mut areas = AreaCollection::new();
        let area = areas.insert_area(powys());
        let mut pop = MeasureSeries::new("pop", "Population");
        pop.set_value(2020, 12345.0);
        area.set_measure("pop", pop);

        assert_eq!(
            areas.to_json().unwrap(),
            r#"{"W06000023":{"names":{"eng":"Powys","cym":"Powys"},"measures":{"pop":{"2020":12345.0}}}}"#
        );
    }

    #[test]
    fn text_lists_names_and_no_measures() {
        let text = powys().to_string();
        assert!(text.starts_with("Powys / Powys (W06000023)\n"));
        assert!(text.contains("<no measures>"));

        let unnamed = Area::new("W06000099").to_string();
        assert!(unnamed.starts_with("Unnamed (W06000099)\n"));
    }

    #[test]
    fn text_renders_year_table_with_statistics() {
        let mut s = MeasureSeries::new("pop", "Population");
        s.set_value(2010, 100.0);
        s.set_value(2011, 150.0);
        let text = s.to_string();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Population (pop)");
        let header: Vec<&str> = lines[1].split_whitespace().collect();
        assert_eq!(header, vec!["2010", "2011", "Average", "Diff.", "%", "Diff."]);
        let values: Vec<&str> = lines[2].split_whitespace().collect();
        assert_eq!(
            values,
            vec!["100.000000", "150.000000", "125.000000", "50.000000", "50.000000"]
        );
    }

    #[test]
    fn text_orders_areas_and_measures_by_code() {
        let mut areas = AreaCollection::new();
        let mut b = Area::new("W06000024");
        b.set_name("eng", "Merthyr Tydfil");
        let mut a = powys();
        a.set_measure("pop", MeasureSeries::new("pop", "Population"));
        a.set_measure("area", MeasureSeries::new("area", "Land area"));
        areas.insert_area(b);
        areas.insert_area(a);

        let text = areas.to_string();
        let powys_at = text.find("W06000023").unwrap();
        let merthyr_at = text.find("W06000024").unwrap();
        assert!(powys_at < merthyr_at);
        assert!(text.find("(area)").unwrap() < text.find("(pop)").unwrap());
    }
}
