use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use itertools::Itertools;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Why a single cell could not be coerced into its typed form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Failed to parse '{0}' as date")]
    InvalidDate(String),
    #[error("Failed to parse '{0}' as currency")]
    InvalidCurrency(String),
    #[error("Currency value '{0}' is negative")]
    NegativeAmount(String),
    #[error("Currency value '{0}' is out of range")]
    AmountOutOfRange(String),
    #[error("Failed to parse '{0}' as integer")]
    InvalidInteger(String),
}

/// Largest magnitude a currency cell may carry. Sums of bounded values
/// cannot overflow `Decimal` for any realistic row count.
pub const MAX_CURRENCY_MAGNITUDE: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d-%b-%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// Parses an order date; month-first wins for ambiguous slash dates.
pub fn parse_order_date(value: &str) -> Result<NaiveDate, FieldError> {
    let trimmed = value.trim();
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(parsed.date());
        }
    }
    Err(FieldError::InvalidDate(value.to_string()))
}

/// Parses a currency cell such as `$1,234.56` or `-12.5`.
pub fn parse_currency(value: &str) -> Result<Decimal, FieldError> {
    let trimmed = value.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let rest = rest.strip_prefix('$').unwrap_or(rest).trim_start();
    if rest.is_empty()
        || !rest
            .chars()
            .all(|ch| ch.is_ascii_digit() || ch == '.' || ch == ',')
    {
        return Err(FieldError::InvalidCurrency(value.to_string()));
    }
    let digits: String = rest.chars().filter(|ch| *ch != ',').collect();
    let parsed =
        Decimal::from_str(&digits).map_err(|_| FieldError::InvalidCurrency(value.to_string()))?;
    if parsed > MAX_CURRENCY_MAGNITUDE {
        return Err(FieldError::AmountOutOfRange(value.to_string()));
    }
    Ok(if negative { -parsed } else { parsed })
}

/// Parses a currency cell that must not be negative.
pub fn parse_amount(value: &str) -> Result<Decimal, FieldError> {
    let parsed = parse_currency(value)?;
    if parsed.is_sign_negative() && !parsed.is_zero() {
        return Err(FieldError::NegativeAmount(value.to_string()));
    }
    Ok(if parsed.is_zero() { Decimal::ZERO } else { parsed })
}

/// Parses a quantity; spreadsheet exports sometimes write `3.0`.
pub fn parse_quantity(value: &str) -> Result<i64, FieldError> {
    let trimmed = value.trim();
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Ok(parsed);
    }
    match Decimal::from_str(trimmed) {
        Ok(decimal) if decimal.fract().is_zero() => decimal
            .trunc()
            .to_string()
            .parse()
            .map_err(|_| FieldError::InvalidInteger(value.to_string())),
        _ => Err(FieldError::InvalidInteger(value.to_string())),
    }
}

/// Fixed two-decimal rendering used in CSV and JSON outputs.
pub fn format_amount(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

/// Whole-dollar display with thousands separators, e.g. `$12,346`.
pub fn format_dollars(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .join(",");
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Shortens `value` to `max` characters, appending `...` when cut.
pub fn truncate_label(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        let head: String = value.chars().take(max).collect();
        format!("{head}...")
    } else {
        value.to_string()
    }
}
