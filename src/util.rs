// Parsing and formatting helpers.
//
// Raw exports are hand-edited spreadsheets, so numeric cells can carry
// currency symbols, thousands separators and stray whitespace. Everything
// downstream works on clean `f64`/`NaiveDate` values.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Parse a measure cell, tolerating `$`, `,` and surrounding whitespace.
///
/// Returns `Some(0.0)` for an empty or missing cell (an empty cell sums as
/// nothing) and `None` only when text is present but not a number.
pub fn parse_measure(s: Option<&str>) -> Option<f64> {
    let s = match s {
        Some(s) => s.trim(),
        None => return Some(0.0),
    };
    if s.is_empty() {
        return Some(0.0);
    }
    let cleaned: String = s.chars().filter(|c| !matches!(c, '$' | ',')).collect();
    cleaned.trim().parse::<f64>().ok()
}

/// Parse a date cell. Exports use `MM/DD/YYYY`; ISO dates are accepted too.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

/// Trimmed, non-empty text or `None`.
pub fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Fixed two-decimal rendering used for every KPI actual.
///
/// `format!` rounds the exact binary value half-to-even, so 4.555 (stored as
/// 4.55499...) renders as `4.55`.
pub fn format_2dp(n: f64) -> String {
    format!("{:.2}", n)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn measures_tolerate_currency_formatting() {
        assert_relative_eq!(parse_measure(Some(" $1,234.50 ")).unwrap(), 1234.5);
        assert_relative_eq!(parse_measure(Some("42")).unwrap(), 42.0);
    }

    #[test]
    fn empty_measures_sum_as_zero() {
        assert_eq!(parse_measure(None), Some(0.0));
        assert_eq!(parse_measure(Some("  ")), Some(0.0));
    }

    #[test]
    fn garbage_measures_are_rejected() {
        assert_eq!(parse_measure(Some("n/a")), None);
    }

    #[test]
    fn dates_in_both_formats() {
        let d = NaiveDate::from_ymd_opt(2025, 11, 28).unwrap();
        assert_eq!(parse_date_safe(Some("11/28/2025")), Some(d));
        assert_eq!(parse_date_safe(Some("2025-11-28")), Some(d));
        assert_eq!(parse_date_safe(Some("28.11.2025")), None);
        assert_eq!(parse_date_safe(Some("")), None);
    }

    #[test]
    fn two_decimal_formatting() {
        assert_eq!(format_2dp(4.0), "4.00");
        assert_eq!(format_2dp(4.555), "4.55");
        assert_eq!(format_2dp(12.3456), "12.35");
        assert_eq!(format_int(9855u64), "9,855");
    }
}
