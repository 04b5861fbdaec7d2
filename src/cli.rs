//! Command-line argument definitions for the `area-stats` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{StatsError, StatsResult};
use crate::ingestion::{Filters, YearRange};

/// Load government area statistics and print them as tables or JSON.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "area-stats",
    version,
    about = "Load area statistics datasets, filter them, and print tables or JSON",
    long_about = "Loads the authority-code table and then each selected dataset from a data \
                  directory, merges everything into one collection keyed by authority code, \
                  applies area/measure/year filters while parsing, and prints the result. \
                  A dataset that fails to load is reported and skipped."
)]
pub struct Args {
    /// Directory containing the data files
    #[arg(long = "dir", value_name = "DIR", default_value = "datasets")]
    pub dir: PathBuf,

    /// Comma-separated dataset codes to load, or `all`
    #[arg(short = 'd', long = "datasets", value_name = "LIST", default_value = "all")]
    pub datasets: String,

    /// Comma-separated authority codes to keep, or `all`
    #[arg(short = 'a', long = "areas", value_name = "LIST", default_value = "all")]
    pub areas: String,

    /// Comma-separated measure codes to keep (case-insensitive), or `all`
    #[arg(short = 'm', long = "measures", value_name = "LIST", default_value = "all")]
    pub measures: String,

    /// Single year `YYYY` or inclusive range `YYYY-ZZZZ`; `0` means all years
    #[arg(
        short = 'y',
        long = "years",
        value_name = "YEARS",
        default_value = "0",
        value_parser = parse_years
    )]
    pub years: YearRange,

    /// Print JSON instead of tables
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    /// Load the dataset catalogue from a JSON file instead of the built-in one
    #[arg(long = "catalogue", value_name = "FILE")]
    pub catalogue: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    /// Dataset codes; an empty list means every dataset.
    pub fn dataset_codes(&self) -> Vec<String> {
        parse_list(&self.datasets)
    }

    /// Parsing filters built from `--areas`, `--measures` and `--years`.
    pub fn filters(&self) -> Filters {
        Filters::new()
            .with_areas(parse_list(&self.areas))
            .with_measures(parse_list(&self.measures))
            .with_years(self.years)
    }
}

/// Split a comma-separated list, dropping blanks. Any `all` entry yields an empty list.
pub fn parse_list(input: &str) -> Vec<String> {
    let items: Vec<String> = input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if items.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        return Vec::new();
    }
    items
}

/// Parse `0`, `YYYY` or `YYYY-ZZZZ`.
pub fn parse_years(input: &str) -> StatsResult<YearRange> {
    let input = input.trim();
    if input == "0" {
        return Ok(YearRange::ALL);
    }

    let invalid = || StatsError::malformed(format!("Invalid input for years argument: '{input}'"));
    let year = |s: &str| -> StatsResult<u32> {
        if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse().map_err(|_| invalid())
        } else {
            Err(invalid())
        }
    };

    match input.split_once('-') {
        Some((start, end)) => Ok(YearRange::new(year(start)?, year(end)?)),
        None => Ok(YearRange::single(year(input)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn years_accepts_zero_single_and_range() {
        assert_eq!(parse_years("0").unwrap(), YearRange::ALL);
        assert_eq!(parse_years("2015").unwrap(), YearRange::single(2015));
        assert_eq!(parse_years("2010-2018").unwrap(), YearRange::new(2010, 2018));
    }

    #[test]
    fn years_rejects_other_shapes() {
        for bad in ["", "15", "20150", "2010-", "abcd", "2010-2018-2020", "2010 - 2018"] {
            let err = parse_years(bad).unwrap_err();
            assert!(
                err.to_string().contains("Invalid input for years argument"),
                "{bad:?} gave {err}"
            );
        }
    }

    #[test]
    fn list_all_means_no_restriction() {
        assert!(parse_list("all").is_empty());
        assert!(parse_list("W06000023,ALL").is_empty());
        assert_eq!(parse_list(" pop , dens,,"), vec!["pop", "dens"]);
    }

    #[test]
    fn args_build_filters() {
        let args = Args::parse_from([
            "area-stats",
            "-a",
            "W06000023,W06000024",
            "-m",
            "POP",
            "-y",
            "2010-2012",
            "-j",
        ]);
        assert!(args.json);
        assert_eq!(args.dir, PathBuf::from("datasets"));
        assert!(args.dataset_codes().is_empty());

        let filters = args.filters();
        assert!(filters.accepts_area("W06000024"));
        assert!(!filters.accepts_area("W06000011"));
        assert!(filters.accepts_measure("pop"));
        assert!(!filters.accepts_measure("dens"));
        assert!(filters.accepts_year(2012));
        assert!(!filters.accepts_year(2013));
    }

    #[test]
    fn bad_years_is_a_usage_error() {
        let err = Args::try_parse_from(["area-stats", "--years", "last"]).unwrap_err();
        assert!(err.to_string().contains("Invalid input for years argument"));
    }
}
