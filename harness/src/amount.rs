//! Conversion between display amounts ("0.01") and integer stroops.
//!
//! Parsing is done on the decimal string so that any amount with at most
//! seven fractional digits converts exactly; there is no float rounding.

use thiserror::Error;

/// Fractional digits of the bond token.
pub const DECIMALS: usize = 7;
pub const STROOPS_PER_UNIT: i128 = 10_000_000;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("negative amount {0:?}")]
    Negative(String),

    #[error("invalid amount {0:?}")]
    Invalid(String),

    #[error("amount {0:?} has more than 7 decimal places")]
    TooPrecise(String),

    #[error("amount {0:?} does not fit in i128 stroops")]
    Overflow(String),
}

/// Parse a display amount into stroops.
pub fn to_stroops(display: &str) -> Result<i128, AmountError> {
    let s = display.trim();
    if s.is_empty() {
        return Err(AmountError::Empty);
    }
    if s.starts_with('-') {
        return Err(AmountError::Negative(s.to_string()));
    }
    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(AmountError::Invalid(s.to_string()));
    }
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) {
        return Err(AmountError::Invalid(s.to_string()));
    }
    if frac.len() > DECIMALS {
        return Err(AmountError::TooPrecise(s.to_string()));
    }

    let overflow = || AmountError::Overflow(s.to_string());
    let whole_units: i128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let frac_stroops: i128 = if frac.is_empty() {
        0
    } else {
        format!("{frac:0<width$}", width = DECIMALS)
            .parse()
            .map_err(|_| AmountError::Invalid(s.to_string()))?
    };
    whole_units
        .checked_mul(STROOPS_PER_UNIT)
        .and_then(|v| v.checked_add(frac_stroops))
        .ok_or_else(overflow)
}

/// Render stroops as a display amount with trailing zeros trimmed.
#[must_use]
pub fn to_display(stroops: i128) -> String {
    let sign = if stroops < 0 { "-" } else { "" };
    let abs = stroops.unsigned_abs();
    let unit = STROOPS_PER_UNIT.unsigned_abs();
    let whole = abs / unit;
    let frac = abs % unit;
    if frac == 0 {
        return format!("{sign}{whole}");
    }
    let digits = format!("{frac:0width$}", width = DECIMALS);
    format!("{sign}{whole}.{}", digits.trim_end_matches('0'))
}
