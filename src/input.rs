//! Operand validation
//!
//! Raw operands arrive as text. They are trimmed, parsed into exact
//! decimals (plain or scientific notation), checked against the configured
//! magnitude limit and normalized before any operation sees them.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use crate::config::CalculatorConfig;
use crate::error::{CalcError, Result};

/// Outcome of parsing decimal text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDecimal {
    /// A representable value
    Value(Decimal),
    /// Well-formed numeric text whose magnitude the decimal type cannot hold
    OutOfRange,
    /// Not a number at all
    Invalid,
}

/// Optional sign, digits with an optional fraction, optional exponent.
static DECIMAL_SYNTAX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$")
        .expect("decimal literal pattern is valid")
});

/// Parse decimal text without losing precision
///
/// Accepts an optional sign, digits with an optional fractional part, and an
/// optional exponent (`1.5`, `-.25`, `3e4`, `2.5E-3`). Digits beyond the
/// smallest representable place are rounded away, whichever notation is
/// used, so `1e-30` and its plain spelling both parse as zero.
pub fn parse_decimal(text: &str) -> ParsedDecimal {
    let text = text.trim();
    if !DECIMAL_SYNTAX.is_match(text) {
        return ParsedDecimal::Invalid;
    }

    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(text)
    } else {
        Decimal::from_str(text)
    };

    match parsed {
        Ok(value) => ParsedDecimal::Value(value),
        Err(e) => {
            log::debug!("Numeric text '{text}' not representable as written: {e}");
            if is_zero_literal(text) {
                ParsedDecimal::Value(Decimal::ZERO)
            } else if let Some(value) = shift_negative_exponent(text) {
                ParsedDecimal::Value(value)
            } else {
                ParsedDecimal::OutOfRange
            }
        }
    }
}

/// `0e-999` and friends are zero even when the exponent is out of range.
fn is_zero_literal(text: &str) -> bool {
    text.split(['e', 'E'])
        .next()
        .map(|mantissa| mantissa.chars().all(|c| matches!(c, '0' | '.' | '+' | '-')))
        .unwrap_or(false)
}

/// Apply a negative exponent by repeated division, rounding at the
/// decimal's maximum scale like the plain notation path does.
///
/// Returns `None` for positive exponents or an unrepresentable mantissa.
fn shift_negative_exponent(text: &str) -> Option<Decimal> {
    let (mantissa, exponent) = text.split_once(['e', 'E'])?;
    let digits = exponent.strip_prefix('-')?;
    let mut value = Decimal::from_str(mantissa).ok()?;

    // An exponent too long for u64 underflows all the same.
    let shift = digits.parse::<u64>().unwrap_or(u64::MAX);
    for _ in 0..shift {
        if value.is_zero() {
            break;
        }
        value /= Decimal::TEN;
    }
    Some(value)
}

/// Validate a raw operand and convert it to a normalized decimal
///
/// # Errors
/// Returns [`CalcError::Validation`] if the text is not a number
/// (`Invalid number format: ...`) or its magnitude exceeds
/// `config.max_input_value` (`Value exceeds maximum allowed: ...`).
///
/// # Example
/// ```
/// use memento_calc::config::CalculatorConfig;
/// use memento_calc::input::validate_number;
///
/// let config = CalculatorConfig::default();
/// assert_eq!(validate_number(" 5.00 ", &config).unwrap().to_string(), "5");
/// assert!(validate_number("five", &config).is_err());
/// ```
pub fn validate_number(raw: &str, config: &CalculatorConfig) -> Result<Decimal> {
    let exceeds = || {
        CalcError::validation(format!(
            "Value exceeds maximum allowed: {}",
            config.max_input_value
        ))
    };

    match parse_decimal(raw) {
        ParsedDecimal::Value(value) if value.abs() > config.max_input_value => Err(exceeds()),
        ParsedDecimal::Value(value) => Ok(value.normalize()),
        ParsedDecimal::OutOfRange => Err(exceeds()),
        ParsedDecimal::Invalid => Err(CalcError::validation(format!(
            "Invalid number format: {}",
            raw.trim()
        ))),
    }
}
