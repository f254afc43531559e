//! Numeric literal classification (C1): decide the narrowest fixed-width
//! container that represents a JSON number literal exactly.
//!
//! Grounded on `original_source/src/json-dom.c`'s `init_number`, which probes
//! `int32 -> uint32 -> int64 -> uint64 -> double` in that order and only
//! falls through to `double` once every fixed-width container has rejected
//! the literal.

/// Which of the four fixed-width integer containers a number literal fits.
///
/// A literal containing `.`, `e`, or `E` never fits any integer width, per
/// spec.md §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NumberClass {
    /// Fits in a signed 32-bit integer.
    pub fits_i32: bool,
    /// Fits in an unsigned 32-bit integer (always `false` for negatives).
    pub fits_u32: bool,
    /// Fits in a signed 64-bit integer.
    pub fits_i64: bool,
    /// Fits in an unsigned 64-bit integer (always `false` for negatives).
    pub fits_u64: bool,
}

/// The narrowest tag a number literal should be stored as, per the
/// narrowing order `INT32 ⊂ UINT32 ⊂ INT64 ⊂ UINT64 ⊂ DOUBLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrowestWidth {
    /// Narrowest fit is a signed 32-bit integer.
    I32,
    /// Narrowest fit is an unsigned 32-bit integer.
    U32,
    /// Narrowest fit is a signed 64-bit integer.
    I64,
    /// Narrowest fit is an unsigned 64-bit integer.
    U64,
    /// No integer width fits (fractional, exponent-bearing, or too large).
    Double,
}

/// The magnitude (absolute value) of an integer literal, plus its sign,
/// decoded once so every width check reuses the same parse.
struct Magnitude {
    negative: bool,
    /// `None` if the digit run overflows `u128` (always too big for every
    /// fixed width; the literal must become a `double`).
    abs: Option<u128>,
}

fn decode_magnitude(digits: &[u8]) -> Magnitude {
    let (negative, digits) = match digits.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, digits),
    };

    let mut abs: Option<u128> = Some(0);
    for &b in digits {
        debug_assert!(b.is_ascii_digit());
        abs = abs.and_then(|acc| {
            acc.checked_mul(10)
                .and_then(|acc| acc.checked_add(u128::from(b - b'0')))
        });
    }

    Magnitude { negative, abs }
}

/// Returns `true` if `digits` contains a decimal point or exponent marker,
/// which unconditionally disqualifies every integer width.
#[must_use]
pub fn has_fraction_or_exponent(digits: &[u8]) -> bool {
    digits
        .iter()
        .any(|&b| matches!(b, b'.' | b'e' | b'E'))
}

/// Classifies a syntactically valid JSON number literal (as accepted by the
/// parser's number grammar) into the widths it fits.
#[must_use]
pub fn classify(digits: &[u8]) -> NumberClass {
    if has_fraction_or_exponent(digits) {
        return NumberClass::default();
    }

    let Magnitude { negative, abs } = decode_magnitude(digits);
    let Some(abs) = abs else {
        return NumberClass::default();
    };

    if negative {
        NumberClass {
            fits_i32: abs <= i32_neg_bound(),
            fits_u32: false,
            fits_i64: abs <= i64_neg_bound(),
            fits_u64: false,
        }
    } else {
        NumberClass {
            fits_i32: abs <= u128::from(i32::MAX as u32),
            fits_u32: abs <= u128::from(u32::MAX),
            fits_i64: abs <= i64::MAX as u128,
            fits_u64: abs <= u128::from(u64::MAX),
        }
    }
}

const fn i32_neg_bound() -> u128 {
    // |i32::MIN| = 2^31
    1u128 << 31
}

const fn i64_neg_bound() -> u128 {
    // |i64::MIN| = 2^63
    1u128 << 63
}

impl NumberClass {
    /// The narrowest width this classification recommends, per the
    /// `INT32 -> UINT32 -> INT64 -> UINT64 -> DOUBLE` order.
    #[must_use]
    pub fn narrowest(self) -> NarrowestWidth {
        if self.fits_i32 {
            NarrowestWidth::I32
        } else if self.fits_u32 {
            NarrowestWidth::U32
        } else if self.fits_i64 {
            NarrowestWidth::I64
        } else if self.fits_u64 {
            NarrowestWidth::U64
        } else {
            NarrowestWidth::Double
        }
    }
}

/// Converts a literal known to fit (caller checked `fits_i32`) to `i32`.
#[must_use]
pub fn to_i32(digits: &[u8]) -> i32 {
    let Magnitude { negative, abs } = decode_magnitude(digits);
    let abs = abs.expect("caller verified this literal fits i32");
    if negative {
        if abs == i32_neg_bound() {
            i32::MIN
        } else {
            -(i32::try_from(abs).expect("caller verified this literal fits i32"))
        }
    } else {
        i32::try_from(abs).expect("caller verified this literal fits i32")
    }
}

/// Converts a literal known to fit (caller checked `fits_u32`) to `u32`.
#[must_use]
pub fn to_u32(digits: &[u8]) -> u32 {
    let Magnitude { abs, .. } = decode_magnitude(digits);
    u32::try_from(abs.expect("caller verified this literal fits u32"))
        .expect("caller verified this literal fits u32")
}

/// Converts a literal known to fit (caller checked `fits_i64`) to `i64`.
#[must_use]
pub fn to_i64(digits: &[u8]) -> i64 {
    let Magnitude { negative, abs } = decode_magnitude(digits);
    let abs = abs.expect("caller verified this literal fits i64");
    if negative {
        if abs == i64_neg_bound() {
            i64::MIN
        } else {
            -(i64::try_from(abs).expect("caller verified this literal fits i64"))
        }
    } else {
        i64::try_from(abs).expect("caller verified this literal fits i64")
    }
}

/// Converts a literal known to fit (caller checked `fits_u64`) to `u64`.
#[must_use]
pub fn to_u64(digits: &[u8]) -> u64 {
    let Magnitude { abs, .. } = decode_magnitude(digits);
    u64::try_from(abs.expect("caller verified this literal fits u64"))
        .expect("caller verified this literal fits u64")
}

/// Converts any syntactically valid JSON number literal to the nearest
/// `f64`, correctly rounded. Digits beyond double precision are discarded by
/// the standard-library decimal-to-float conversion after normalization.
#[must_use]
pub fn to_f64(digits: &[u8]) -> f64 {
    let s = core::str::from_utf8(digits).expect("number literals are ASCII");
    s.parse::<f64>().expect("caller verified a valid JSON number grammar")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrows_to_i32() {
        let c = classify(b"42");
        assert_eq!(c.narrowest(), NarrowestWidth::I32);
        assert_eq!(to_i32(b"42"), 42);
    }

    #[test]
    fn narrows_negative_skips_unsigned() {
        let c = classify(b"-42");
        assert!(!c.fits_u32);
        assert!(!c.fits_u64);
        assert!(c.fits_i32);
        assert_eq!(to_i32(b"-42"), -42);
    }

    #[test]
    fn i32_min_boundary() {
        let c = classify(b"-2147483648");
        assert!(c.fits_i32);
        assert_eq!(to_i32(b"-2147483648"), i32::MIN);
        let c = classify(b"-2147483649");
        assert!(!c.fits_i32);
        assert!(c.fits_i64);
    }

    #[test]
    fn uint32_above_i32_max() {
        let c = classify(b"2147483648");
        assert!(!c.fits_i32);
        assert!(c.fits_u32);
        assert_eq!(to_u32(b"2147483648"), 2_147_483_648);
    }

    #[test]
    fn u64_max_fits_only_u64() {
        let c = classify(b"18446744073709551615");
        assert_eq!(c.narrowest(), NarrowestWidth::U64);
        assert_eq!(to_u64(b"18446744073709551615"), u64::MAX);
    }

    #[test]
    fn u64_max_plus_one_overflows_to_double() {
        let c = classify(b"18446744073709551616");
        assert_eq!(c.narrowest(), NarrowestWidth::Double);
        let d = to_f64(b"18446744073709551616");
        assert!((d - 18_446_744_073_709_551_616.0f64).abs() / d < 0.0001);
    }

    #[test]
    fn fraction_forces_double() {
        let c = classify(b"1.0");
        assert_eq!(c.narrowest(), NarrowestWidth::Double);
        let c = classify(b"1e3");
        assert_eq!(c.narrowest(), NarrowestWidth::Double);
    }

    #[test]
    fn huge_literal_overflows_u128_to_double() {
        let big = "9".repeat(60);
        let c = classify(big.as_bytes());
        assert_eq!(c.narrowest(), NarrowestWidth::Double);
    }
}
