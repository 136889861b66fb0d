//! Currency and date formatting for API payloads.
//!
//! Amounts are stored as integer cents and rendered with a dollar symbol,
//! thousands separators and two decimal places, e.g. `$1,234.56`.

use chrono::NaiveDateTime;

use crate::error::{AppError, AppResult};

/// Format cents as a currency string: `$1,234.56`, negative as `-$1,234.56`.
pub fn format_currency(cents: i64) -> String {
    let is_negative = cents < 0;
    let abs_cents = cents.abs();
    let whole = abs_cents / 100;
    let fractional = abs_cents % 100;
    let whole_str = format_with_thousands(whole);

    if is_negative {
        format!("-${}.{:02}", whole_str, fractional)
    } else {
        format!("${}.{:02}", whole_str, fractional)
    }
}

/// Format cents without the currency symbol: `1,234.56`.
pub fn format_currency_no_symbol(cents: i64) -> String {
    let formatted = format_currency(cents);
    formatted.replace('$', "")
}

/// Cents as a plain decimal number for JSON payloads (`12.34`).
pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Parse a user-entered amount like `12.34` or `1,234.5` into cents.
/// Rejects non-numeric input and amounts that are zero or negative.
pub fn parse_amount(input: &str) -> AppResult<i64> {
    let cleaned = input.trim().replace([',', '$'], "");
    let value: f64 = cleaned
        .parse()
        .map_err(|_| AppError::validation(format!("Invalid amount: {}", input)))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::validation("Amount must be greater than zero"));
    }
    Ok((value * 100.0).round() as i64)
}

/// Convert a JSON dollar amount into cents, rejecting non-positive values.
pub fn amount_to_cents(amount: f64) -> AppResult<i64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::validation("Amount must be greater than zero"));
    }
    Ok((amount * 100.0).round() as i64)
}

/// Parse a payload date, accepting `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`.
/// `None` means now.
pub fn parse_date_input(input: Option<&str>) -> AppResult<NaiveDateTime> {
    let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(chrono::Local::now().naive_local());
    };

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|d| d.and_hms_opt(0, 0, 0).expect("midnight is always valid"))
        })
        .map_err(|_| AppError::validation(format!("Invalid date: {}", raw)))
}

/// Render a datetime the way the database stores it.
pub fn to_db_date(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Short date for list rows: `Jan 15, 2026`.
pub fn format_date_short(dt: NaiveDateTime) -> String {
    dt.format("%b %d, %Y").to_string()
}

/// Long date for detail views: `Jan 15, 2026 at 02:30 PM`.
pub fn format_date_long(dt: NaiveDateTime) -> String {
    dt.format("%b %d, %Y at %I:%M %p").to_string()
}

fn format_with_thousands(n: i64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let s = n.to_string();
    let chars: Vec<char> = s.chars().rev().collect();
    let mut result = Vec::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_simple_amount() {
        assert_eq!(format_currency(12345), "$123.45");
    }

    #[test]
    fn test_negative_amount() {
        assert_eq!(format_currency(-12345), "-$123.45");
    }

    #[test]
    fn test_zero_amount() {
        assert_eq!(format_currency(0), "$0.00");
    }

    #[test]
    fn test_thousands_separator() {
        assert_eq!(format_currency(123456789), "$1,234,567.89");
    }

    #[test]
    fn test_no_symbol() {
        assert_eq!(format_currency_no_symbol(100000), "1,000.00");
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(parse_amount("12.34").unwrap(), 1234);
    }

    #[test]
    fn test_parse_with_separators() {
        assert_eq!(parse_amount("$1,234.5").unwrap(), 123450);
    }

    #[test]
    fn test_parse_rounds_to_cents() {
        assert_eq!(parse_amount("0.005").unwrap(), 1);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert!(parse_amount("-5.00").is_err());
    }

    #[test]
    fn test_parse_rejects_zero() {
        assert!(parse_amount("0").is_err());
    }

    #[test]
    fn test_amount_to_cents() {
        assert_eq!(amount_to_cents(12.34).unwrap(), 1234);
        assert!(amount_to_cents(0.0).is_err());
        assert!(amount_to_cents(-3.0).is_err());
        assert!(amount_to_cents(f64::NAN).is_err());
    }

    #[test]
    fn test_parse_date_input_date_only() {
        let dt = parse_date_input(Some("2026-01-15")).unwrap();
        assert_eq!(to_db_date(dt), "2026-01-15T00:00:00");
    }

    #[test]
    fn test_parse_date_input_datetime() {
        let dt = parse_date_input(Some("2026-01-15T14:30:00")).unwrap();
        assert_eq!(to_db_date(dt), "2026-01-15T14:30:00");
    }

    #[test]
    fn test_parse_date_input_rejects_garbage() {
        assert!(parse_date_input(Some("next tuesday")).is_err());
    }

    #[test]
    fn test_date_short() {
        let dt = NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(format_date_short(dt), "Jan 15, 2026");
    }

    #[test]
    fn test_date_long() {
        let dt = NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(format_date_long(dt), "Jan 15, 2026 at 02:30 PM");
    }
}
