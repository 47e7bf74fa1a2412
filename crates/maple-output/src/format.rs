//! Display helpers shared by every table.

use maple_metrics::RatioName;

/// Placeholder for absent values.
pub const NOT_AVAILABLE: &str = "n/a";

/// Fraction to percentage points rounded to two decimals (`0.12346` -> `12.35`).
pub fn percent_points(value: f64) -> f64 {
    (value * 100.0 * 100.0).round() / 100.0
}

/// Fraction as `"12.34 %"`.
pub fn format_percent(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{:.2} %", v * 100.0))
}

/// Price with two decimals and an optional currency code.
pub fn format_price(value: Option<f64>, currency: Option<&str>) -> String {
    match (value.filter(|v| v.is_finite()), currency) {
        (Some(v), Some(ccy)) => format!("{v:.2} {ccy}"),
        (Some(v), None) => format!("{v:.2}"),
        (None, _) => NOT_AVAILABLE.to_string(),
    }
}

/// Integer part with comma thousands separators.
pub fn format_thousands(value: Option<f64>) -> String {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return NOT_AVAILABLE.to_string();
    };
    let truncated = value.trunc();
    let digits = format!("{:.0}", truncated.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if truncated < 0.0 {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// Ratio value: percentages for yield and return ratios, two decimals otherwise.
pub fn format_ratio(name: RatioName, value: Option<f64>) -> String {
    if name.is_percentage() {
        format_percent(value)
    } else {
        value
            .filter(|v| v.is_finite())
            .map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.2}"))
    }
}

/// Truncate `text` to at most `width` characters, marking the cut with `...`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Some(0.1234), "12.34 %")]
    #[case(Some(-0.05), "-5.00 %")]
    #[case(Some(f64::NAN), "n/a")]
    #[case(None, "n/a")]
    fn test_format_percent(#[case] value: Option<f64>, #[case] expected: &str) {
        assert_eq!(format_percent(value), expected);
    }

    #[rstest]
    #[case(Some(0.0), "0")]
    #[case(Some(999.9), "999")]
    #[case(Some(1000.0), "1,000")]
    #[case(Some(1234567.8), "1,234,567")]
    #[case(Some(-45678.0), "-45,678")]
    #[case(None, "n/a")]
    fn test_format_thousands(#[case] value: Option<f64>, #[case] expected: &str) {
        assert_eq!(format_thousands(value), expected);
    }

    #[test]
    fn test_percent_points_rounds() {
        assert_relative_eq!(percent_points(0.12346), 12.35);
        assert_relative_eq!(percent_points(-0.031), -3.1);
    }

    #[test]
    fn test_format_ratio_by_kind() {
        assert_eq!(format_ratio(RatioName::DividendYield, Some(0.031)), "3.10 %");
        assert_eq!(format_ratio(RatioName::PriceToEarnings, Some(14.256)), "14.26");
        assert_eq!(format_ratio(RatioName::Beta, None), "n/a");
    }

    #[test]
    fn test_format_price_and_truncate() {
        assert_eq!(format_price(Some(101.5), Some("CAD")), "101.50 CAD");
        assert_eq!(format_price(None, Some("CAD")), "n/a");
        assert_eq!(truncate("Royal Bank of Canada", 10), "Royal B...");
        assert_eq!(truncate("Enbridge", 10), "Enbridge");
    }
}
