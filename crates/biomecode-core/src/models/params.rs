//! Loosely typed request parameters.
//!
//! Clients send years and scales as JSON numbers or numeric strings; both are
//! accepted and truncated to integers.

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{BiomeError, Result};

/// Convert a JSON number or numeric string into an integer
pub fn parse_integer(value: &JsonValue, field: &str) -> Result<i64> {
    let parsed = match value {
        JsonValue::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        JsonValue::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| {
        BiomeError::malformed(format!("'{}' must be an integer, got {}", field, value))
    })
}

/// Parse a calendar year field
pub fn parse_year(value: &JsonValue, field: &str) -> Result<i32> {
    let year = parse_integer(value, field)?;
    i32::try_from(year)
        .map_err(|_| BiomeError::malformed(format!("'{}' is out of range: {}", field, year)))
}

/// Parse an optional ground sample distance in metres, falling back to `default`
pub fn parse_scale(value: Option<&JsonValue>, default: u32) -> Result<u32> {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Ok(default);
    };

    let scale = parse_integer(value, "scale")?;
    if scale <= 0 {
        return Err(BiomeError::malformed(format!("'scale' must be positive, got {}", scale)));
    }

    u32::try_from(scale)
        .map_err(|_| BiomeError::malformed(format!("'scale' is out of range: {}", scale)))
}

/// Pair of years compared by the change KPI.
///
/// `from > to` is allowed; the comparison is symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub from: i32,
    pub to: i32,
}

impl YearRange {
    pub fn new(from: i32, to: i32) -> Self {
        Self { from, to }
    }

    /// Parse `year_from` / `year_to` request fields
    pub fn parse(year_from: &JsonValue, year_to: &JsonValue) -> Result<Self> {
        Ok(Self::new(parse_year(year_from, "year_from")?, parse_year(year_to, "year_to")?))
    }

    pub fn is_reversed(&self) -> bool {
        self.from > self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_year_accepts_numbers_and_strings() {
        assert_eq!(parse_year(&json!(2020), "year").unwrap(), 2020);
        assert_eq!(parse_year(&json!("2021"), "year").unwrap(), 2021);
        assert_eq!(parse_year(&json!(" 2022 "), "year").unwrap(), 2022);
        assert_eq!(parse_year(&json!(2023.0), "year").unwrap(), 2023);
        assert_eq!(parse_year(&json!(2019.9), "year").unwrap(), 2019);
    }

    #[test]
    fn test_parse_year_rejects_garbage() {
        for value in [json!(null), json!("twenty"), json!([2020]), json!(true), json!(1e12)] {
            let err = parse_year(&value, "year").unwrap_err();
            assert!(matches!(err, BiomeError::MalformedInput { .. }), "{:?}", value);
        }
    }

    #[test]
    fn test_parse_scale() {
        assert_eq!(parse_scale(None, 20).unwrap(), 20);
        assert_eq!(parse_scale(Some(&json!(null)), 20).unwrap(), 20);
        assert_eq!(parse_scale(Some(&json!(30)), 20).unwrap(), 30);
        assert_eq!(parse_scale(Some(&json!("10")), 20).unwrap(), 10);
        assert!(parse_scale(Some(&json!(0)), 20).is_err());
        assert!(parse_scale(Some(&json!(-5)), 20).is_err());
    }

    #[test]
    fn test_year_range_allows_reversed_order() {
        let range = YearRange::parse(&json!(2024), &json!("2018")).unwrap();
        assert_eq!(range, YearRange::new(2024, 2018));
        assert!(range.is_reversed());
    }
}
