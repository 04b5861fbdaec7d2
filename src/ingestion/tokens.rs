//! Parsing of year and value tokens shared by the CSV and JSON parsers.

use crate::error::{StatsError, StatsResult};

pub(crate) fn parse_year(row: usize, column: &str, raw: &str) -> StatsResult<u32> {
    let trimmed = raw.trim();
    trimmed
        .parse::<u32>()
        .map_err(|e| StatsError::parse(row, column, raw, format!("expected a year: {e}")))
}

pub(crate) fn parse_value(row: usize, column: &str, raw: &str) -> StatsResult<f64> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(StatsError::parse(row, column, raw, "expected a finite number")),
        Err(e) => Err(StatsError::parse(row, column, raw, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parses_trimmed_tokens() {
        assert_eq!(parse_year(2, "year", " 2015 ").unwrap(), 2015);
        assert_eq!(parse_value(2, "2015", "12.5").unwrap(), 12.5);
        assert_eq!(parse_value(2, "2015", "-3").unwrap(), -3.0);
    }

    #[test]
    fn rejects_bad_tokens_as_malformed() {
        for err in [
            parse_year(3, "year", "20x5").unwrap_err(),
            parse_year(3, "year", "-2015").unwrap_err(),
            parse_value(3, "2015", "").unwrap_err(),
            parse_value(3, "2015", "NaN").unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::MalformedInput);
            assert!(err.to_string().contains("row 3"));
        }
    }
}
