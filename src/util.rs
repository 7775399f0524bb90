// Utility helpers for parsing and string normalization.
//
// This module centralizes all the "dirty" cell/number/date handling so the
// rest of the pipeline can assume clean, typed values.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Maximum length a source column label is truncated to before cleaning.
const LABEL_MAX_LEN: usize = 25;

/// Clean a source column label into its intermediate merge-friendly form:
/// truncated to 25 characters, trimmed, lowercased, spaces replaced with
/// underscores. Canonical field names are applied later by position; the
/// cleaned labels are only compared across files to detect header drift.
pub fn clean_label(label: &str) -> String {
    let truncated: String = label.chars().take(LABEL_MAX_LEN).collect();
    truncated.trim().to_lowercase().replace(' ', "_")
}

/// Derive the case-insensitive join key used to match area names against
/// the identity lookup. Applied to both sides of the merge.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Parse a string-like cell into a non-negative count while being forgiving
/// about formatting issues common in spreadsheet exports (commas, padding,
/// floats that are really integers).
///
/// - Accepts `Option<&str>` so callers can pass through optional cells.
/// - Rejects values containing alphabetic characters.
/// - Strips thousands separators before parsing.
/// - Accepts a float representation only when it has no fractional part.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_i64_safe(s: Option<&str>) -> Option<i64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    match s.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.abs() < 9e15 => Some(f as i64),
        _ => None,
    }
}

/// Parse a `YYYYMM` reporting-month stamp into the first day of that month.
pub fn parse_month_stamp(stamp: &str) -> Option<NaiveDate> {
    if stamp.len() != 6 || !stamp.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = stamp[..4].parse().ok()?;
    let month: u32 = stamp[4..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// The calendar month before (year, month), rolling January back to
/// December of the prior year.
pub fn month_before(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

/// Shorten an ICB display name by collapsing the standard suffix, e.g.
/// "NHS Devon Integrated Care Board" -> "NHS Devon ICB". Names without the
/// suffix pass through unchanged.
pub fn shorten_icb_name(name: &str) -> String {
    const SUFFIX: &str = "Integrated Care Board";
    match name.trim().strip_suffix(SUFFIX) {
        Some(prefix) => format!("{}ICB", prefix),
        None => name.trim().to_string(),
    }
}

/// Round to 2 decimal places, the precision all derived metrics report at.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for integer-like values, used for
    // counts in console messages (e.g., `1,234 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

/// Render an optional count for CSV export and table previews; nulls become
/// an empty string rather than 0 so "unmeasured" stays distinguishable.
pub fn format_opt_int(n: Option<i64>) -> String {
    n.map(|v| v.to_string()).unwrap_or_default()
}

/// Render an optional 2-decimal metric; null denominators export as empty.
pub fn format_opt_metric(v: Option<f64>) -> String {
    v.map(|x| format!("{:.2}", x)).unwrap_or_default()
}
