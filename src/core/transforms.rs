//! Value transforms applied between source and destination cells.

use regex::Regex;

use crate::error::{ModelError, ModelResult};
use crate::types::{CellValue, Transform};

/// Street-suffix expansions applied in order.
const ADDRESS_RULES: &[(&str, &str)] = &[("Dr", "Drive"), ("Blvd", "Boulevard")];

/// Expand abbreviated street suffixes in an address.
///
/// Matches whole words only, so "5 Drew Ln" is left alone while
/// "123 Main Dr" becomes "123 Main Drive".
pub fn normalize_address(raw: &str) -> ModelResult<String> {
    let mut address = raw.trim().to_string();
    for (abbrev, replacement) in ADDRESS_RULES {
        let pattern = Regex::new(&format!(r"\b{}\b", abbrev))
            .map_err(|e| ModelError::Input(format!("Bad address rule '{}': {}", abbrev, e)))?;
        address = pattern.replace_all(&address, *replacement).into_owned();
    }
    Ok(address)
}

/// Map a market-rent figure onto the template's dropdown ranges.
///
/// Exactly 15 and 20 select the canned range strings; anything else,
/// including unparseable text, passes through unchanged.
pub fn market_rent_range(value: CellValue) -> CellValue {
    match value.as_f64() {
        Some(n) if n == 15.0 => CellValue::Text("15 - 20".to_string()),
        Some(n) if n == 20.0 => CellValue::Text("20 - 25".to_string()),
        _ => value,
    }
}

/// Apply a transform to an extracted value.
pub fn apply(transform: Transform, value: CellValue) -> ModelResult<CellValue> {
    match transform {
        Transform::None => Ok(value),
        Transform::NormalizeAddress => {
            Ok(CellValue::Text(normalize_address(&value.to_string())?))
        }
        Transform::MarketRentRange => Ok(market_rent_range(value)),
        Transform::TrimText => Ok(CellValue::Text(value.to_string().trim().to_string())),
    }
}
