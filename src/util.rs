// Utility helpers for coercing cells and basic statistics.
//
// This module centralizes all the "dirty" export handling so the rest of
// the code can assume clean, typed values.
use crate::types::Cell;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports (commas, spaces, text).
///
/// - Trims whitespace.
/// - Strips thousands separators like `","` before parsing.
/// - Accepts scientific notation (`1.2E+06`).
/// - Returns `None` for text, `NaN` and infinities.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse the date formats seen in social-media exports. Time components
/// are dropped.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            // `%Y` happily reads "24" as year 24; leave short years to `%y`.
            if !fmt.contains("%y") && d.year() < 1000 {
                continue;
            }
            return Some(d);
        }
    }
    None
}

/// Numeric coercion: anything unparsable, non-finite or negative is 0.
pub fn coerce_number(cell: &Cell) -> f64 {
    let value = match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => parse_f64_safe(Some(s)),
        Cell::Missing | Cell::Date(_) => None,
    };
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => 0.0,
    }
}

/// Date coercion: `None` excludes the row from date-dependent metrics.
pub fn coerce_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Text(s) => parse_date_safe(Some(s)),
        Cell::Missing | Cell::Number(_) => None,
    }
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

/// Truncate to at most `max` characters (not bytes).
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed number of decimals with locale-aware thousands separators
    // (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let mut res = match int_part.parse::<u64>() {
        Ok(int_val) => int_val.to_formatted_string(&Locale::en),
        Err(_) => group_thousands(int_part),
    };
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Comma-group a plain digit string too long for `u64`.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages (e.g., `9,855 impressions`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_f64_safe_forgiving() {
        assert_eq!(parse_f64_safe(Some(" 1,234 ")), Some(1234.0));
        assert_eq!(parse_f64_safe(Some("12.5")), Some(12.5));
        assert_eq!(parse_f64_safe(Some("bad")), None);
        assert_eq!(parse_f64_safe(Some("NaN")), None);
        assert_eq!(parse_f64_safe(Some("inf")), None);
        assert_eq!(parse_f64_safe(Some("-Infinity")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn test_coerce_number_defaults_to_zero() {
        assert_eq!(coerce_number(&Cell::from("30")), 30.0);
        assert_eq!(coerce_number(&Cell::from("bad")), 0.0);
        assert_eq!(coerce_number(&Cell::from("-5")), 0.0);
        assert_eq!(coerce_number(&Cell::Missing), 0.0);
        assert_eq!(coerce_number(&Cell::Number(f64::INFINITY)), 0.0);
        assert_eq!(coerce_number(&Cell::Number(7.0)), 7.0);
    }

    #[test]
    fn test_coerce_number_reads_scientific_notation() {
        assert_eq!(coerce_number(&Cell::from("1e3")), 1000.0);
        assert_eq!(coerce_number(&Cell::from("1.5E+03")), 1500.0);
        assert_eq!(coerce_number(&Cell::from("1.2E+06")), 1_200_000.0);
        assert_eq!(coerce_number(&Cell::from("12k")), 0.0);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        for s in [
            "2024-03-05",
            "2024/03/05",
            "03/05/2024",
            "03/05/24",
            "5 Mar 2024",
            "Mar 5, 2024",
            "March 5, 2024",
            "2024-03-05 14:30:00",
            "2024-03-05T14:30:00",
            "2024-03-05T14:30:00.123",
            "2024-03-05T14:30:00+02:00",
        ] {
            assert_eq!(parse_date_safe(Some(s)), Some(expected), "format {s}");
        }
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date_safe(Some("yesterday")), None);
        assert_eq!(parse_date_safe(Some("2024-13-40")), None);
        assert_eq!(parse_date_safe(Some("  ")), None);
        assert_eq!(coerce_date(&Cell::Number(20240305.0)), None);
    }

    #[test]
    fn test_round2_and_average() {
        assert_eq!(round2(40.0 / 3.0), 13.33);
        assert_eq!(round2(2.0 / 3.0), 0.67);
        assert_eq!(average(&[]), 0.0);
        assert_eq!(average(&[1.0, 2.0]), 1.5);
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(0.0, 2), "0.00");
        assert_eq!(format_number(-1500.5, 1), "-1,500.5");
    }

    #[test]
    fn test_format_number_beyond_u64() {
        assert_eq!(format_number(1e20, 2), "100,000,000,000,000,000,000.00");
        assert_eq!(format_int(9855u64), "9,855");
    }
}
