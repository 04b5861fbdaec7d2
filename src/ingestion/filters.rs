//! Area / measure / year filters applied while parsing.
//!
//! An empty area or measure set means "no restriction". A set that contains only codes which
//! never occur in the input is a real restriction and imports nothing. For years, the range
//! `(0, 0)` means "all years"; any other pair is an inclusive range.

use std::collections::HashSet;

/// Inclusive year range, with `(0, 0)` meaning "all years".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YearRange {
    start: u32,
    end: u32,
}

impl YearRange {
    /// The "import everything" range.
    pub const ALL: YearRange = YearRange { start: 0, end: 0 };

    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// A range covering a single year.
    pub fn single(year: u32) -> Self {
        Self::new(year, year)
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn is_all(&self) -> bool {
        self.start == 0 && self.end == 0
    }

    pub fn contains(&self, year: u32) -> bool {
        self.is_all() || (self.start..=self.end).contains(&year)
    }
}

/// The three filters handed to every parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    areas: HashSet<String>,
    measures: HashSet<String>,
    years: YearRange,
}

impl Filters {
    /// Filters that accept everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to these authority codes (matched exactly).
    pub fn with_areas<I, S>(mut self, areas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.areas = areas.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to these measure codes (matched case-insensitively).
    pub fn with_measures<I, S>(mut self, measures: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.measures = measures
            .into_iter()
            .map(|m| m.as_ref().to_lowercase())
            .collect();
        self
    }

    pub fn with_years(mut self, years: YearRange) -> Self {
        self.years = years;
        self
    }

    pub fn areas(&self) -> &HashSet<String> {
        &self.areas
    }

    pub fn measures(&self) -> &HashSet<String> {
        &self.measures
    }

    pub fn years(&self) -> YearRange {
        self.years
    }

    pub fn accepts_area(&self, authority_code: &str) -> bool {
        self.areas.is_empty() || self.areas.contains(authority_code)
    }

    pub fn accepts_measure(&self, measure_code: &str) -> bool {
        self.measures.is_empty() || self.measures.contains(&measure_code.to_lowercase())
    }

    pub fn accepts_year(&self, year: u32) -> bool {
        self.years.contains(year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filters_accept_everything() {
        let f = Filters::new();
        assert!(f.accepts_area("W06000023"));
        assert!(f.accepts_measure("pop"));
        assert!(f.accepts_year(1901));
        assert!(f.years().is_all());
    }

    #[test]
    fn unmatched_area_filter_accepts_nothing_else() {
        let f = Filters::new().with_areas(["W06000999"]);
        assert!(!f.accepts_area("W06000023"));
        assert!(f.accepts_area("W06000999"));
    }

    #[test]
    fn measure_filter_is_case_insensitive() {
        let f = Filters::new().with_measures(["POP", "Dens"]);
        assert!(f.accepts_measure("pop"));
        assert!(f.accepts_measure("DENS"));
        assert!(!f.accepts_measure("area"));
    }

    #[test]
    fn year_range_is_inclusive() {
        let f = Filters::new().with_years(YearRange::new(2010, 2012));
        let kept: Vec<u32> = (2009..=2013).filter(|&y| f.accepts_year(y)).collect();
        assert_eq!(kept, vec![2010, 2011, 2012]);
    }

    #[test]
    fn single_year_range() {
        let r = YearRange::single(2015);
        assert!(r.contains(2015));
        assert!(!r.contains(2014));
        assert!(!r.is_all());
    }
}
