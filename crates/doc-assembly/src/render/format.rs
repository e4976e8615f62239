use chrono::NaiveDate;

use crate::jurisdiction::DateFormat;
use crate::validation::{parse_currency_cents, TypedValue};

/// Formats an ISO or already-formatted date. Unparseable input is returned unchanged.
pub fn format_date(value: &str, format: DateFormat) -> String {
    let trimmed = value.trim();
    let parsed = [DateFormat::Iso, DateFormat::UsSlashed]
        .iter()
        .find_map(|candidate| NaiveDate::parse_from_str(trimmed, candidate.pattern()).ok());

    match parsed {
        Some(date) => date.format(format.pattern()).to_string(),
        None => trimmed.to_string(),
    }
}

/// Formats a raw or already-formatted amount as `$1,234.50`.
pub fn format_currency(value: &str) -> String {
    match parse_currency_cents(value) {
        Some(cents) => format_cents(cents),
        None => value.trim().to_string(),
    }
}

pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let whole = (cents / 100).to_string();

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{sign}${grouped}.{:02}", cents % 100)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Renders a typed answer the way it should appear on paper.
pub fn display_value(value: &TypedValue, date_format: DateFormat) -> String {
    match value {
        TypedValue::Text(text) | TypedValue::Choice(text) => text.clone(),
        TypedValue::Number(number) => format_number(*number),
        TypedValue::Currency(cents) => format_cents(*cents),
        TypedValue::Date(date) => date.format(date_format.pattern()).to_string(),
        TypedValue::Boolean(true) => "Yes".to_string(),
        TypedValue::Boolean(false) => "No".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_dates_for_us_and_generic() {
        assert_eq!(format_date("2025-03-14", DateFormat::UsSlashed), "03/14/2025");
        assert_eq!(format_date("03/14/2025", DateFormat::Iso), "2025-03-14");
        assert_eq!(format_date("sometime", DateFormat::UsSlashed), "sometime");
    }

    #[test]
    fn date_formatting_is_idempotent() {
        for raw in ["2024-02-29", "12/31/1999", " 2025-01-05 "] {
            for format in [DateFormat::UsSlashed, DateFormat::Iso] {
                let once = format_date(raw, format);
                assert_eq!(format_date(&once, format), once, "input {raw:?}");
            }
        }
    }

    #[test]
    fn formats_currency_with_grouping() {
        assert_eq!(format_currency("1234.5"), "$1,234.50");
        assert_eq!(format_currency("$1,234.50"), "$1,234.50");
        assert_eq!(format_currency("999"), "$999.00");
        assert_eq!(format_currency("1000000"), "$1,000,000.00");
        assert_eq!(format_cents(-5), "-$0.05");
        assert_eq!(format_currency("free"), "free");
    }

    #[test]
    fn currency_formatting_is_idempotent() {
        for raw in ["0", "12.3", "$45,000", "-7.05"] {
            let once = format_currency(raw);
            assert_eq!(format_currency(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn displays_typed_values() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 4).expect("valid date");
        assert_eq!(
            display_value(&TypedValue::Date(date), DateFormat::UsSlashed),
            "07/04/2025"
        );
        assert_eq!(display_value(&TypedValue::Number(2020.0), DateFormat::Iso), "2020");
        assert_eq!(display_value(&TypedValue::Number(1.5), DateFormat::Iso), "1.5");
        assert_eq!(display_value(&TypedValue::Boolean(true), DateFormat::Iso), "Yes");
        assert_eq!(
            display_value(&TypedValue::Currency(150_000), DateFormat::Iso),
            "$1,500.00"
        );
    }
}
