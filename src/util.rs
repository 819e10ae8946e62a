// Utility helpers for numeric coercion and rendering.
//
// Exports are messy: amounts arrive as numbers, as text with thousands
// separators, or as junk. Everything numeric goes through `parse_number` so the
// rest of the code can assume a plain `f64`.
use crate::types::Cell;
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Coerce a cell to `f64`.
///
/// - Numbers pass through.
/// - Text has thousands separators (`,`) stripped and is trimmed, then the
///   longest leading number is read, so `100元` is 100 and `12.5%` is 12.5.
/// - Anything without a leading number, empty or non-finite becomes `0.0`.
///   This never fails.
pub fn parse_number(cell: &Cell) -> f64 {
    let value = match cell {
        Cell::Empty => return 0.0,
        Cell::Number(n) => *n,
        Cell::Text(s) => {
            let cleaned = s.replace(',', "");
            let cleaned = cleaned.trim();
            cleaned[..numeric_prefix_len(cleaned)]
                .parse::<f64>()
                .unwrap_or(0.0)
        }
    };
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Byte length of the leading `[+-]digits[.digits][(e|E)[+-]digits]` run.
///
/// Returns 0 when no digit is present in the mantissa. An exponent marker
/// without digits after it is not part of the number.
fn numeric_prefix_len(s: &str) -> usize {
    let b = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = 0;
    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }
    let int_end = digits_from(i);
    let mut end = int_end;
    let mut has_digits = int_end > i;
    if end < b.len() && b[end] == b'.' {
        let frac_end = digits_from(end + 1);
        has_digits |= frac_end > end + 1;
        end = frac_end;
    }
    if !has_digits {
        return 0;
    }
    if end < b.len() && (b[end] == b'e' || b[end] == b'E') {
        let mut j = end + 1;
        if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            end = exp_end;
        }
    }
    end
}

/// `(numerator / denominator)`, 0 when the denominator is 0.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals with locale-aware thousands separators (`1,234,567.89`).
    let s = format!("{:.*}", decimals, n.abs());
    // Only keep the sign when something non-zero survives rounding.
    let neg = n < 0.0 && s.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Beyond u128 (or for inf) the digits are left ungrouped.
    let mut res = match int_part.parse::<u128>() {
        Ok(v) => v.to_formatted_string(&Locale::en),
        Err(_) => int_part.to_string(),
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

/// Render a ratio as a percentage, `0.1234` -> `12.34%`.
pub fn format_percent(n: f64, decimals: usize) -> String {
    let s = format!("{:.*}", decimals, (n * 100.0).abs());
    let neg = n < 0.0 && s.chars().any(|c| c.is_ascii_digit() && c != '0');
    if neg {
        format!("-{}%", s)
    } else {
        format!("{}%", s)
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// Drop the last extension: `当期_3月.xlsx` -> `当期_3月`.
///
/// Only a trailing `.xxx` segment without further dots or slashes counts.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() && !name[idx + 1..].contains('/') => &name[..idx],
        _ => name,
    }
}

/// `<report>_<YYYY-MM-DD>.<ext>`
pub fn report_file_name(report_name: &str, date: NaiveDate, extension: &str) -> String {
    format!("{}_{}.{}", report_name, date.format("%Y-%m-%d"), extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_strips_separators_and_defaults_to_zero() {
        assert_eq!(parse_number(&Cell::text("1,234.5")), 1234.5);
        assert_eq!(parse_number(&Cell::text("  42 ")), 42.0);
        assert_eq!(parse_number(&Cell::Number(7.25)), 7.25);
        assert_eq!(parse_number(&Cell::text("n/a")), 0.0);
        assert_eq!(parse_number(&Cell::text("")), 0.0);
        assert_eq!(parse_number(&Cell::Empty), 0.0);
        assert_eq!(parse_number(&Cell::text("NaN")), 0.0);
        assert_eq!(parse_number(&Cell::text("inf")), 0.0);
        assert_eq!(parse_number(&Cell::text("100元")), 100.0);
        assert_eq!(parse_number(&Cell::text("12.5%")), 12.5);
        assert_eq!(parse_number(&Cell::text("abc")), 0.0);
        assert_eq!(parse_number(&Cell::text(" -3,000.25 箱")), -3000.25);
        assert_eq!(parse_number(&Cell::text(".5kg")), 0.5);
        assert_eq!(parse_number(&Cell::text("2e3x")), 2000.0);
        assert_eq!(parse_number(&Cell::text("7e")), 7.0);
        assert_eq!(parse_number(&Cell::text("-.")), 0.0);
        assert_eq!(parse_number(&Cell::text("1e999")), 0.0);
    }

    #[test]
    fn safe_ratio_guards_zero_denominator() {
        assert_eq!(safe_ratio(5.0, 0.0), 0.0);
        assert_eq!(safe_ratio(20.0, 100.0), 0.2);
    }

    #[test]
    fn format_number_groups_thousands() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-1500.0, 2), "-1,500.00");
        assert_eq!(format_number(-0.001, 2), "0.00");
        assert_eq!(format_number(12.0, 0), "12");
    }

    #[test]
    fn format_number_keeps_magnitude_past_i64() {
        assert_eq!(format_number(1e19, 2), "10,000,000,000,000,000,000.00");
        assert_eq!(format_number(-1e19, 0), "-10,000,000,000,000,000,000");
        let huge = format_number(1e40, 0);
        assert!(huge.starts_with('1') && huge.len() == 41, "{huge}");
        assert_eq!(format_number(f64::INFINITY, 2), "inf");
    }

    #[test]
    fn format_percent_scales_by_hundred() {
        assert_eq!(format_percent(0.25, 2), "25.00%");
        assert_eq!(format_percent(-0.1, 2), "-10.00%");
        assert_eq!(format_percent(0.0, 2), "0.00%");
    }

    #[test]
    fn strip_extension_removes_only_last_segment() {
        assert_eq!(strip_extension("当期_3月.xlsx"), "当期_3月");
        assert_eq!(strip_extension("a.b.csv"), "a.b");
        assert_eq!(strip_extension("no_extension"), "no_extension");
        assert_eq!(strip_extension("trailing."), "trailing.");
    }

    #[test]
    fn report_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            report_file_name("品种同环比分析", date, "csv"),
            "品种同环比分析_2024-03-09.csv"
        );
    }
}
