//! Odds arithmetic.
//!
//! Conversions between moneyline prices, decimal odds and implied
//! probability. These fail loudly: an out-of-range price is an upstream data
//! defect and is never clamped into a plausible-looking number.

pub mod stats;

use crate::types::EngineError;

/// Whether `x` can represent a real moneyline price: finite, non-zero and
/// at least 100 in magnitude.
pub fn is_valid_moneyline(x: f64) -> bool {
    x.is_finite() && x != 0.0 && x.abs() >= 100.0
}

/// Moneyline → decimal odds (total return per unit staked).
pub fn to_decimal(moneyline: f64) -> Result<f64, EngineError> {
    if !is_valid_moneyline(moneyline) {
        return Err(EngineError::InvalidMoneyline(moneyline));
    }
    Ok(decimal_from_valid(moneyline))
}

/// Conversion for prices already known to be valid.
pub(crate) fn decimal_from_valid(moneyline: f64) -> f64 {
    if moneyline > 0.0 {
        1.0 + moneyline / 100.0
    } else {
        1.0 + 100.0 / moneyline.abs()
    }
}

/// Moneyline → implied probability (vig included).
pub fn to_probability(moneyline: f64) -> Result<f64, EngineError> {
    Ok(1.0 / to_decimal(moneyline)?)
}

/// Probability → moneyline. Favourites (p ≥ 0.5) come back negative.
pub fn from_probability(p: f64) -> Result<f64, EngineError> {
    if !(p > 0.0 && p < 1.0) {
        return Err(EngineError::InvalidProbability(p));
    }
    if p >= 0.5 {
        Ok(-(p / (1.0 - p)) * 100.0)
    } else {
        Ok(((1.0 - p) / p) * 100.0)
    }
}

/// Render a moneyline the way books print it: `+150`, `-110`.
pub fn format_moneyline(moneyline: f64) -> String {
    if !moneyline.is_finite() {
        return "n/a".to_string();
    }
    if moneyline > 0.0 {
        format!("+{moneyline:.0}")
    } else {
        format!("{moneyline:.0}")
    }
}
