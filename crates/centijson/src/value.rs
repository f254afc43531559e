//! The in-memory JSON value tree (C4).
//!
//! `Value` is a tagged variant per spec.md §3/§4.4. Unlike the teacher
//! crate's `Value` (which stores all numbers as `f64` and all strings as a
//! validated `alloc::string::String`), this tree keeps the four fixed-width
//! integer tags the numeric classifier (`crate::number`) produces, and
//! stores string payloads as `bstr::BString` so the `Ignore` UTF-8 policy
//! (spec.md §4.2) can preserve bytes that are not valid UTF-8, and so an
//! embedded `NUL` byte (spec.md §3) is representable at all.

use alloc::vec::Vec;

use bstr::BString;

use crate::dict::Dict;

/// A JSON value as defined by RFC 8259, widened with the fixed-width integer
/// tags spec.md §3 requires (`NULL, BOOL, INT32, UINT32, INT64, UINT64,
/// FLOAT, DOUBLE, STRING, ARRAY, DICT`).
///
/// `Float(f32)` exists only for API parity with the C `VALUE_FLOAT` tag —
/// the classifier in `crate::number` never produces it; `json-dom.c`'s
/// `init_number` only ever narrows to `double`, never to a 32-bit float, so
/// the parser's DOM builder does the same.
// Mirrors the teacher's `value.rs`: serde support is gated behind `cfg(test)`
// (so the test suite can compare against `serde_json` oracles without a
// default dependency) or the optional `serde` feature for downstream users.
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `null`.
    Null,
    /// `true`/`false`.
    Bool(bool),
    /// A signed 32-bit integer literal.
    Int32(i32),
    /// An unsigned 32-bit integer literal too large for `i32`.
    UInt32(u32),
    /// A signed 64-bit integer literal too large for `u32`.
    Int64(i64),
    /// An unsigned 64-bit integer literal too large for `i64`.
    UInt64(u64),
    /// A 32-bit float. Never produced by the parser; available for callers
    /// constructing a tree by hand.
    Float(f32),
    /// A fractional or exponent-bearing literal, or an integer literal too
    /// large for every fixed width.
    Double(f64),
    /// A string. Holds raw bytes rather than a validated `str` so `Ignore`-mode
    /// ill-formed UTF-8 and embedded `NUL` both round-trip.
    String(BString),
    /// A JSON array.
    Array(Vec<Value>),
    /// A JSON object.
    Dict(Dict),
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::UInt32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UInt64(v)
    }
}

impl From<BString> for Value {
    fn from(v: BString) -> Self {
        Self::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl From<Dict> for Value {
    fn from(v: Dict) -> Self {
        Self::Dict(v)
    }
}

impl Value {
    /// Returns `true` if the value is [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` if the value is any of the six numeric tags.
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Self::Int32(_) | Self::UInt32(_) | Self::Int64(_) | Self::UInt64(_) | Self::Float(_) | Self::Double(_)
        )
    }

    /// Returns `true` if the value is [`Value::String`].
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Returns `true` if the value is [`Value::Array`].
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Returns `true` if the value is [`Value::Dict`].
    #[must_use]
    pub fn is_dict(&self) -> bool {
        matches!(self, Self::Dict(_))
    }

    /// Borrows the array payload, if this is [`Value::Array`].
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Mutably borrows the array payload, if this is [`Value::Array`].
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Borrows the dict payload, if this is [`Value::Dict`].
    #[must_use]
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Mutably borrows the dict payload, if this is [`Value::Dict`].
    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Borrows the string payload, if this is [`Value::String`].
    #[must_use]
    pub fn as_str_bytes(&self) -> Option<&BString> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_null() {
        assert_eq!(Value::default(), Value::Null);
    }

    #[test]
    fn numeric_predicate_covers_every_numeric_tag() {
        assert!(Value::Int32(1).is_number());
        assert!(Value::UInt32(1).is_number());
        assert!(Value::Int64(1).is_number());
        assert!(Value::UInt64(1).is_number());
        assert!(Value::Float(1.0).is_number());
        assert!(Value::Double(1.0).is_number());
        assert!(!Value::Null.is_number());
    }
}
