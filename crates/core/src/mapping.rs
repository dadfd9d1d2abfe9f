//! Caller-facing symbols to provider wire values
//!
//! Providers encode enumerations their own way (integer severities, upper-case
//! strings, ...). A table maps the symbols callers use to the wire value a
//! provider expects. Lookups are one-directional and never fail: an unknown
//! symbol passes through unchanged so values read back from a provider can be
//! sent again as-is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Static symbol -> wire value table.
pub type EnumTable = &'static [(&'static str, i64)];

/// A literal value as a provider expects it on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Int(i64),
    Text(String),
}

impl WireValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            WireValue::Int(value) => Some(*value),
            WireValue::Text(_) => None,
        }
    }
}

impl fmt::Display for WireValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireValue::Int(value) => write!(f, "{value}"),
            WireValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for WireValue {
    fn from(value: i64) -> Self {
        WireValue::Int(value)
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        WireValue::Text(value.to_string())
    }
}

/// Look up `symbol` in `table`.
///
/// Unrecognized symbols pass through: an integer literal becomes
/// [`WireValue::Int`] (a wire value the caller already holds), anything else is
/// returned as [`WireValue::Text`]. Pass-through values are not validated; the
/// provider rejects invalid ones at write time.
pub fn resolve(table: EnumTable, symbol: &str) -> WireValue {
    if let Some((_, wire)) = table.iter().find(|(key, _)| *key == symbol) {
        return WireValue::Int(*wire);
    }

    match symbol.trim().parse::<i64>() {
        Ok(raw) => WireValue::Int(raw),
        Err(_) => WireValue::Text(symbol.to_string()),
    }
}

/// Symbols a table recognizes, in table order.
pub fn symbols(table: EnumTable) -> Vec<&'static str> {
    table.iter().map(|(key, _)| *key).collect()
}

/// Reverse lookup used when rendering provider data back to the caller.
pub fn symbol_for(table: EnumTable, wire: i64) -> Option<&'static str> {
    table
        .iter()
        .find(|(_, value)| *value == wire)
        .map(|(key, _)| *key)
}
