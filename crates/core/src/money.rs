//! Defensive parsing and rendering of the free-text amounts found in case records.
//!
//! Historical records carry settlements, policy limits and liability shares as
//! whatever the intake form captured (`"$250,000"`, `"250000 (confidential)"`,
//! `"50%"`). Parsers here return `None` instead of failing so callers can treat
//! a malformed value as an absent one.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Largest magnitude accepted from free text, one quadrillion dollars.
///
/// Anything larger is a data-entry error and is read as unparseable, which keeps
/// sums and scaled amounts far from the `Decimal` range limit.
pub const MAX_CURRENCY_AMOUNT: i64 = 1_000_000_000_000_000;

/// Parses a currency string into a plain amount.
///
/// Dollar signs, thousands separators and whitespace are ignored, and trailing
/// text after the leading number is dropped. Magnitudes above
/// [`MAX_CURRENCY_AMOUNT`] yield `None`.
pub fn parse_currency(raw: &str) -> Option<Decimal> {
    let cleaned: String =
        raw.trim().chars().filter(|ch| !matches!(ch, '$' | ',' | ' ' | '\t')).collect();
    let numeric = leading_number(&cleaned)?;
    Decimal::from_str(&numeric)
        .ok()
        .filter(|amount| amount.abs() <= Decimal::from(MAX_CURRENCY_AMOUNT))
}

/// Parses a percentage such as `"75%"` or `"75"` into `75.0`.
pub fn parse_percentage(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() {
        return None;
    }

    trimmed.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Rounds to the nearest multiple of `increment`, halves away from zero.
///
/// Near the edge of the `Decimal` range the result truncates toward zero instead
/// of overflowing.
pub fn round_to_increment(amount: Decimal, increment: Decimal) -> Decimal {
    if increment <= Decimal::ZERO {
        return amount;
    }
    let Some(steps) = amount.checked_div(increment) else {
        return amount;
    };

    steps
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(increment)
        .or_else(|| steps.trunc().checked_mul(increment))
        .unwrap_or(amount)
}

/// Renders `$` followed by a thousands-grouped whole-dollar amount.
pub fn format_currency(amount: Decimal) -> String {
    let whole = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let negative = whole.is_sign_negative() && !whole.is_zero();
    let digits = whole.abs().to_u128().unwrap_or_default().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn leading_number(value: &str) -> Option<String> {
    let mut numeric = String::new();
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (index, ch) in value.chars().enumerate() {
        match ch {
            '-' | '+' if index == 0 => numeric.push(ch),
            '0'..='9' => {
                seen_digit = true;
                numeric.push(ch);
            }
            '.' if !seen_dot => {
                seen_dot = true;
                numeric.push(ch);
            }
            _ => break,
        }
    }

    if !seen_digit {
        return None;
    }

    let trimmed = numeric.trim_end_matches('.');
    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    if unsigned.starts_with('.') {
        Some(format!("{sign}0{unsigned}"))
    } else {
        Some(format!("{sign}{unsigned}"))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        format_currency, parse_currency, parse_percentage, round_to_increment, MAX_CURRENCY_AMOUNT,
    };

    #[test]
    fn currency_parser_strips_symbols_and_separators() {
        assert_eq!(parse_currency("$250,000"), Some(Decimal::from(250_000)));
        assert_eq!(parse_currency("  $1,234.50 "), Some(Decimal::new(123_450, 2)));
        assert_eq!(parse_currency("75000"), Some(Decimal::from(75_000)));
    }

    #[test]
    fn currency_parser_keeps_leading_number_of_annotated_values() {
        assert_eq!(parse_currency("$90,000 (confidential)"), Some(Decimal::from(90_000)));
        assert_eq!(parse_currency("1500."), Some(Decimal::from(1_500)));
        assert_eq!(parse_currency(".5"), Some(Decimal::new(5, 1)));
        assert_eq!(parse_currency("-$2,000"), Some(Decimal::from(-2_000)));
    }

    #[test]
    fn currency_parser_returns_none_for_unparseable_values() {
        assert_eq!(parse_currency(""), None);
        assert_eq!(parse_currency("undisclosed"), None);
        assert_eq!(parse_currency("$"), None);
        assert_eq!(parse_currency("-"), None);
    }

    #[test]
    fn currency_parser_rejects_amounts_beyond_the_ceiling() {
        assert_eq!(parse_currency("$60,000,000,000,000,000,000,000,000,000"), None);
        assert_eq!(parse_currency("79228162514264337593543950335"), None);
        assert_eq!(parse_currency("-$2,000,000,000,000,000"), None);
        assert_eq!(
            parse_currency("$1,000,000,000,000,000"),
            Some(Decimal::from(MAX_CURRENCY_AMOUNT))
        );
    }

    #[test]
    fn rounding_at_the_decimal_limit_does_not_overflow() {
        let increment = Decimal::from(500);
        let rounded = round_to_increment(Decimal::MAX, increment);
        assert!(rounded <= Decimal::MAX);
        assert!(Decimal::MAX - rounded < increment);
        assert_eq!(round_to_increment(Decimal::MAX, Decimal::new(1, 20)), Decimal::MAX);
    }

    #[test]
    fn percentage_parser_accepts_optional_percent_sign() {
        assert_eq!(parse_percentage("75%"), Some(75.0));
        assert_eq!(parse_percentage(" 60 "), Some(60.0));
        assert_eq!(parse_percentage("12.5 %"), Some(12.5));
        assert_eq!(parse_percentage("disputed"), None);
        assert_eq!(parse_percentage("%"), None);
    }

    #[test]
    fn rounding_goes_to_nearest_increment_with_halves_up() {
        let increment = Decimal::from(500);
        assert_eq!(round_to_increment(Decimal::from(96_240), increment), Decimal::from(96_000));
        assert_eq!(round_to_increment(Decimal::from(96_250), increment), Decimal::from(96_500));
        assert_eq!(round_to_increment(Decimal::from(297_000), increment), Decimal::from(297_000));
        assert_eq!(round_to_increment(Decimal::from(249), increment), Decimal::ZERO);
        assert_eq!(round_to_increment(Decimal::from(1_234), Decimal::ZERO), Decimal::from(1_234));
    }

    #[test]
    fn currency_is_rendered_without_decimals() {
        assert_eq!(format_currency(Decimal::from(297_000)), "$297,000");
        assert_eq!(format_currency(Decimal::new(9_999_950, 2)), "$100,000");
        assert_eq!(format_currency(Decimal::from(950)), "$950");
        assert_eq!(format_currency(Decimal::from(1_000_000)), "$1,000,000");
        assert_eq!(format_currency(Decimal::ZERO), "$0");
        assert_eq!(format_currency(Decimal::from(-2_500)), "-$2,500");
    }
}
