//! UTF-8 validation and repair (C2).
//!
//! Implements the three modes from spec.md §4.2 over raw byte sequences that
//! may be split across [`feed`](crate::parser::StreamingParser::feed) calls
//! at any boundary, including mid-sequence. [`Scanner`] carries the partial
//! multi-byte sequence across such splits.
//!
//! `Fix` mode substitutes one `U+FFFD` per *maximal subpart* of an
//! ill-formed sequence, the same granularity `alloc::string::String::
//! from_utf8_lossy` uses — this module reimplements that table-driven
//! algorithm over a byte-at-a-time scanner so it can run incrementally and
//! so it can also validate the synthetic bytes produced when decoding a
//! lone (unpaired) UTF-16 surrogate half from a `\uXXXX` escape.

use alloc::vec::Vec;

/// How the parser handles ill-formed UTF-8 byte sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Utf8Mode {
    /// Reject ill-formed sequences with [`crate::error::ErrorCode::InvalidUtf8`].
    #[default]
    Strict,
    /// Pass ill-formed bytes through unchanged.
    Ignore,
    /// Replace each maximal ill-formed subsequence with `U+FFFD` (`EF BF BD`).
    Fix,
}

const REPLACEMENT: [u8; 3] = [0xEF, 0xBF, 0xBD];

/// For a lead byte, the number of continuation bytes expected and the valid
/// `[lo, hi]` range of the *first* continuation byte (narrower than `80..=BF`
/// for the lead bytes that would otherwise admit overlong, surrogate, or
/// out-of-range encodings).
///
/// Returns `None` for bytes that can never be a valid lead (ASCII, stray
/// continuation bytes, `C0`/`C1`, and `F5..=FF`).
fn lead_info(byte: u8) -> Option<(u8, u8, u8)> {
    match byte {
        0x00..=0x7F => None,
        0xC2..=0xDF => Some((1, 0x80, 0xBF)),
        0xE0 => Some((2, 0xA0, 0xBF)),
        0xE1..=0xEC => Some((2, 0x80, 0xBF)),
        0xED => Some((2, 0x80, 0x9F)),
        0xEE..=0xEF => Some((2, 0x80, 0xBF)),
        0xF0 => Some((3, 0x90, 0xBF)),
        0xF1..=0xF3 => Some((3, 0x80, 0xBF)),
        0xF4 => Some((3, 0x80, 0x8F)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    /// Remaining continuation bytes still needed.
    remaining: u8,
    /// Valid range for the *next* continuation byte (narrow only for the
    /// first one; `0x80..=0xBF` afterwards).
    lo: u8,
    hi: u8,
    /// Bytes of the in-progress sequence, including the lead.
    bytes: [u8; 4],
    len: u8,
}

/// A streaming, byte-at-a-time UTF-8 validator/repairer that carries partial
/// multi-byte sequences across `push` calls.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    pending: Option<Pending>,
}

/// Outcome of a single [`Scanner::push`] call in [`Utf8Mode::Strict`] mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalid;

impl Scanner {
    /// Creates a new scanner with no pending partial sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a multi-byte sequence is mid-flight.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Feeds one byte. Valid bytes (including ASCII) are appended to `out`
    /// once their sequence completes; ill-formed sequences are handled per
    /// `mode`.
    ///
    /// Returns `Err(Invalid)` in [`Utf8Mode::Strict`] mode as soon as an
    /// ill-formed sequence is detected; the byte that triggered the error has
    /// already been consumed from the scanner's perspective (the caller
    /// reports the error at the *current* input position).
    pub fn push(&mut self, byte: u8, mode: Utf8Mode, out: &mut Vec<u8>) -> Result<(), Invalid> {
        if let Utf8Mode::Ignore = mode {
            out.push(byte);
            return Ok(());
        }

        if let Some(mut pend) = self.pending.take() {
            if (pend.lo..=pend.hi).contains(&byte) {
                pend.bytes[pend.len as usize] = byte;
                pend.len += 1;
                pend.remaining -= 1;
                pend.lo = 0x80;
                pend.hi = 0xBF;
                if pend.remaining == 0 {
                    out.extend_from_slice(&pend.bytes[..pend.len as usize]);
                } else {
                    self.pending = Some(pend);
                }
                return Ok(());
            }

            // Ill-formed: the accumulated prefix is one maximal subpart.
            match mode {
                Utf8Mode::Strict => return Err(Invalid),
                Utf8Mode::Fix => out.extend_from_slice(&REPLACEMENT),
                Utf8Mode::Ignore => unreachable!("handled above"),
            }
            // Reprocess `byte` as a fresh start (it was not consumed by the
            // broken sequence).
            return self.push(byte, mode, out);
        }

        match lead_info(byte) {
            None if byte < 0x80 => {
                out.push(byte);
                Ok(())
            }
            None => {
                // Orphan continuation byte or an always-invalid lead
                // (C0/C1/F5..FF).
                match mode {
                    Utf8Mode::Strict => Err(Invalid),
                    Utf8Mode::Fix => {
                        out.extend_from_slice(&REPLACEMENT);
                        Ok(())
                    }
                    Utf8Mode::Ignore => unreachable!("handled above"),
                }
            }
            Some((remaining, lo, hi)) => {
                self.pending = Some(Pending {
                    remaining,
                    lo,
                    hi,
                    bytes: [byte, 0, 0, 0],
                    len: 1,
                });
                Ok(())
            }
        }
    }

    /// Flushes a truncated sequence at the end of a string (the closing
    /// quote arrived, or the parser hit end-of-input, before a multi-byte
    /// sequence completed).
    pub fn finish(&mut self, mode: Utf8Mode, out: &mut Vec<u8>) -> Result<(), Invalid> {
        if let Utf8Mode::Ignore = mode {
            self.pending = None;
            return Ok(());
        }
        if let Some(pend) = self.pending.take() {
            match mode {
                Utf8Mode::Strict => return Err(Invalid),
                Utf8Mode::Fix => out.extend_from_slice(&REPLACEMENT),
                Utf8Mode::Ignore => unreachable!("handled above"),
            }
        }
        Ok(())
    }
}

/// Encodes a Unicode scalar value to UTF-8 and feeds the result through
/// `scanner`. Used for the octets produced by combining a `\uXXXX` surrogate
/// pair (always a valid scalar; this just appends its UTF-8 encoding).
pub fn push_scalar(
    scanner: &mut Scanner,
    scalar: char,
    mode: Utf8Mode,
    out: &mut Vec<u8>,
) -> Result<(), Invalid> {
    let mut buf = [0u8; 4];
    let encoded = scalar.encode_utf8(&mut buf);
    for &b in encoded.as_bytes() {
        scanner.push(b, mode, out)?;
    }
    Ok(())
}

/// Encodes a lone (unpaired) UTF-16 surrogate half using the naive 3-byte
/// form (as if surrogates were valid scalars) and feeds those bytes through
/// `scanner`. This is what makes a single unpaired `\uD83D` surface as three
/// `U+FFFD` replacements in `Fix` mode (spec.md §8 scenario 3): each of the
/// three synthetic bytes fails validation independently once fed through the
/// same ill-formed-subsequence scan real UTF-8 bytes go through.
pub fn push_lone_surrogate(
    scanner: &mut Scanner,
    surrogate: u16,
    mode: Utf8Mode,
    out: &mut Vec<u8>,
) -> Result<(), Invalid> {
    debug_assert!((0xD800..=0xDFFF).contains(&surrogate));
    let cp = u32::from(surrogate);
    let bytes = [
        0xE0 | ((cp >> 12) & 0x0F) as u8,
        0x80 | ((cp >> 6) & 0x3F) as u8,
        0x80 | (cp & 0x3F) as u8,
    ];
    for b in bytes {
        scanner.push(b, mode, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(mode: Utf8Mode, bytes: &[u8]) -> Result<Vec<u8>, Invalid> {
        let mut scanner = Scanner::new();
        let mut out = Vec::new();
        for &b in bytes {
            scanner.push(b, mode, &mut out)?;
        }
        scanner.finish(mode, &mut out)?;
        Ok(out)
    }

    #[test]
    fn ascii_passthrough() {
        assert_eq!(run(Utf8Mode::Strict, b"hello").unwrap(), b"hello");
    }

    #[test]
    fn valid_multibyte_passthrough() {
        let bytes = "héllo→".as_bytes();
        assert_eq!(run(Utf8Mode::Strict, bytes).unwrap(), bytes);
    }

    #[test]
    fn overlong_rejected_strict() {
        assert!(run(Utf8Mode::Strict, &[0xC0, 0x80]).is_err());
    }

    #[test]
    fn orphan_continuation_fix_mode() {
        let out = run(Utf8Mode::Fix, &[0x80]).unwrap();
        assert_eq!(out, REPLACEMENT);
    }

    #[test]
    fn truncated_sequence_fix_mode() {
        // E2 82 is the start of a 3-byte sequence (e.g. "€" = E2 82 AC) with
        // the final byte missing.
        let out = run(Utf8Mode::Fix, &[0xE2, 0x82]).unwrap();
        assert_eq!(out, REPLACEMENT);
    }

    #[test]
    fn ignore_mode_passes_bad_bytes_through() {
        let out = run(Utf8Mode::Ignore, &[0xFF, 0xFE]).unwrap();
        assert_eq!(out, vec![0xFF, 0xFE]);
    }

    #[test]
    fn split_sequence_across_pushes() {
        let mut scanner = Scanner::new();
        let mut out = Vec::new();
        // "→" = E2 86 92
        scanner.push(0xE2, Utf8Mode::Strict, &mut out).unwrap();
        assert!(scanner.has_pending());
        scanner.push(0x86, Utf8Mode::Strict, &mut out).unwrap();
        scanner.push(0x92, Utf8Mode::Strict, &mut out).unwrap();
        assert!(!scanner.has_pending());
        assert_eq!(out, vec![0xE2, 0x86, 0x92]);
    }

    #[test]
    fn lone_surrogate_yields_three_replacements_in_fix_mode() {
        let mut scanner = Scanner::new();
        let mut out = Vec::new();
        push_lone_surrogate(&mut scanner, 0xD83D, Utf8Mode::Fix, &mut out).unwrap();
        scanner.finish(Utf8Mode::Fix, &mut out).unwrap();
        assert_eq!(out, [REPLACEMENT, REPLACEMENT, REPLACEMENT].concat());
    }

    #[test]
    fn lone_surrogate_rejected_in_strict_mode() {
        let mut scanner = Scanner::new();
        let mut out = Vec::new();
        assert!(push_lone_surrogate(&mut scanner, 0xD83D, Utf8Mode::Strict, &mut out).is_err());
    }

    #[test]
    fn surrogate_pair_combination_yields_valid_emoji() {
        let scalar = char::from_u32(0x1F600).unwrap();
        let mut scanner = Scanner::new();
        let mut out = Vec::new();
        push_scalar(&mut scanner, scalar, Utf8Mode::Strict, &mut out).unwrap();
        assert_eq!(out, [0xF0, 0x9F, 0x98, 0x80]);
    }
}
