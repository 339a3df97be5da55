use std::fmt;

use serde::{Deserialize, Deserializer};

/// Money is represented as integer cents to avoid floating-point precision issues.
/// $50.00 = 5000 cents.
pub type Cents = i64;

/// Cents in one whole currency unit.
pub const CENTS_PER_UNIT: Cents = 100;

/// Format cents as a human-readable currency string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    format!(
        "{}{}.{:02}",
        sign,
        abs_cents / CENTS_PER_UNIT,
        abs_cents % CENTS_PER_UNIT
    )
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000, "$3" -> 300
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, input) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    let input = input.strip_prefix('$').unwrap_or(input);

    let (units_str, decimal_str) = input.split_once('.').unwrap_or((input, ""));
    if (units_str.is_empty() && decimal_str.is_empty())
        || !decimal_str.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        parse_digits(units_str)?
    };

    // Pad a single digit ("5" -> 50 cents), truncate anything past two digits
    let decimal_cents = match decimal_str.len() {
        0 => 0,
        1 => parse_digits(decimal_str)? * 10,
        _ => parse_digits(&decimal_str[..2])?,
    };

    let cents = units
        .checked_mul(CENTS_PER_UNIT)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseCentsError::Overflow)?;

    Ok(if negative { -cents } else { cents })
}

/// Parse a unit price. Same format as [`parse_cents`], but negative amounts are rejected.
pub fn parse_price(input: &str) -> Result<Cents, ParseCentsError> {
    let cents = parse_cents(input)?;
    if cents < 0 {
        return Err(ParseCentsError::Negative);
    }
    Ok(cents)
}

fn parse_digits(s: &str) -> Result<i64, ParseCentsError> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseCentsError::InvalidFormat);
    }
    s.parse().map_err(|_| ParseCentsError::Overflow)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    Negative,
    Overflow,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::Negative => write!(f, "amount must not be negative"),
            ParseCentsError::Overflow => write!(f, "amount is too large"),
        }
    }
}

impl std::error::Error for ParseCentsError {}

/// Amounts in JSON and TOML may be written either as integer cents (`5000`)
/// or as a decimal string (`"50.00"`).
#[derive(Deserialize)]
#[serde(untagged)]
enum AmountRepr {
    Cents(i64),
    Text(String),
}

/// Serde helper accepting either amount representation. Negative values are rejected.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<Cents, D::Error>
where
    D: Deserializer<'de>,
{
    let cents = match AmountRepr::deserialize(deserializer)? {
        AmountRepr::Cents(cents) => cents,
        AmountRepr::Text(text) => parse_cents(&text).map_err(serde::de::Error::custom)?,
    };
    if cents < 0 {
        return Err(serde::de::Error::custom(ParseCentsError::Negative));
    }
    Ok(cents)
}
