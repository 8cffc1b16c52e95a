// Lenient field parsing and small numeric helpers.
//
// Spreadsheet exports arrive messy, so everything here parses permissively
// and signals failure with `None`; each caller decides the fallback (drop
// the row for key fields, substitute zero for secondary ones).
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse numeric text while tolerating the usual export noise: surrounding
/// whitespace and thousands separators. Cells containing letters are
/// rejected outright rather than partially parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() || s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    s.replace(',', "").parse::<f64>().ok()
}

/// Parse a date cell against the formats seen in telematics exports.
/// Datetime cells are accepted and truncated to the date.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if fmt.contains("%H") {
            if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                return Some(dt.date());
            }
        } else if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

/// Convert a duration cell to decimal hours, or `None` if the cell holds
/// neither recognized shape.
///
/// Two shapes occur in the wild: `HH:MM:SS` text, and a bare number that is
/// a spreadsheet fractional-day serialization (0.5 == 12 hours). The first
/// is rounded to 2 decimals.
pub fn try_duration_hours(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(days) = s.parse::<f64>() {
        return Some(days * 24.0);
    }
    let segments = s.split(':').count();
    let parts: Vec<i64> = s.split(':').filter_map(|p| p.trim().parse().ok()).collect();
    if parts.len() < 3 || segments != parts.len() {
        return None;
    }
    let hours = parts[0] as f64 + parts[1] as f64 / 60.0 + parts[2] as f64 / 3600.0;
    Some(round2(hours))
}

/// Zero-defaulting wrapper: a bad duration cell never drops the row,
/// idle/work time just reads as zero.
pub fn duration_to_hours(s: Option<&str>) -> f64 {
    try_duration_hours(s).unwrap_or(0.0)
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn average(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.iter().sum::<f64>() / v.len() as f64
}

/// Percentile with linear interpolation between closest ranks, matching the
/// quantile the planner recommendation was tuned against. `q` in [0, 1].
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Fixed-decimal rendering with locale thousands separators, for report
/// cells and console diagnostics (`12,345.68`).
pub fn format_number(n: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let mut out = int_part
        .parse::<i64>()
        .unwrap_or(0)
        .to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    if n.is_sign_negative() && n != 0.0 {
        out.insert(0, '-');
    }
    out
}

pub fn format_int<T: ToFormattedString>(n: T) -> String {
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f64_parsing_tolerates_commas_and_rejects_text() {
        assert_eq!(parse_f64_safe(Some("1,234.5")), Some(1234.5));
        assert_eq!(parse_f64_safe(Some("  42 ")), Some(42.0));
        assert_eq!(parse_f64_safe(Some("n/a")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
        assert_eq!(parse_f64_safe(None), None);
    }

    #[test]
    fn hms_duration_converts_to_decimal_hours() {
        assert_eq!(duration_to_hours(Some("2:30:00")), 2.5);
        assert_eq!(duration_to_hours(Some("0:45:00")), 0.75);
        // 1h 0m 30s -> 1.0083… rounds to 2 decimals
        assert_eq!(duration_to_hours(Some("1:00:30")), 1.01);
    }

    #[test]
    fn fractional_day_duration_scales_by_24() {
        assert_eq!(duration_to_hours(Some("0.5")), 12.0);
        assert_eq!(duration_to_hours(Some("0.25")), 6.0);
    }

    #[test]
    fn bad_duration_coerces_to_zero() {
        assert_eq!(duration_to_hours(Some("off")), 0.0);
        assert_eq!(duration_to_hours(Some("2:30")), 0.0);
        assert_eq!(duration_to_hours(Some("1:xx:00")), 0.0);
        assert_eq!(duration_to_hours(Some("")), 0.0);
        assert_eq!(duration_to_hours(None), 0.0);
    }

    #[test]
    fn date_parsing_accepts_common_export_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(parse_date_safe(Some("2024-03-07")), Some(d));
        assert_eq!(parse_date_safe(Some("07/03/2024")), Some(d));
        assert_eq!(parse_date_safe(Some("2024-03-07 00:00:00")), Some(d));
        assert_eq!(parse_date_safe(Some("Total")), None);
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&v, 0.75), 3.25);
        assert_eq!(percentile(&v, 0.0), 1.0);
        assert_eq!(percentile(&v, 1.0), 4.0);
        assert_eq!(percentile(&[5.0], 0.75), 5.0);
        assert_eq!(percentile(&[], 0.75), 0.0);
    }

    #[test]
    fn number_formatting_inserts_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-42.5, 1), "-42.5");
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_int(9855), "9,855");
    }
}
