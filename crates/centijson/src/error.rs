//! Error codes produced by the parser, DOM builder, and pointer resolver.

use thiserror::Error;

use crate::pos::JsonInputPos;

/// Every fallible outcome the parser, DOM builder, or resource limits can
/// produce, per spec.md §4.3 and §7 (plus [`ErrorCode::DupKey`], which is
/// injected by the DOM builder rather than the parser itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ErrorCode {
    /// Allocation failure. centijson never allocates speculatively, so this
    /// is reserved for callers building their own fallible `Callbacks`.
    #[error("out of memory")]
    OutOfMemory,
    /// The parser reached a state it should be unable to reach.
    #[error("internal error")]
    Internal,
    /// A malformed token: a bad number, a leading zero, an empty exponent.
    #[error("syntax error")]
    Syntax,
    /// `]` closed an object frame, or `}` closed an array frame.
    #[error("mismatched closing bracket")]
    BadCloser,
    /// The root value's type is forbidden by a `NO*ASROOT` flag.
    #[error("value type forbidden at document root")]
    BadRootType,
    /// A value was expected but something else (or EOF) was found.
    #[error("expected a value")]
    ExpectedValue,
    /// An object key was expected but something else was found.
    #[error("expected an object key")]
    ExpectedKey,
    /// After `,` in an array, expected a value or (disallowed) a closer.
    #[error("expected a value or ']'")]
    ExpectedValueOrCloser,
    /// After `{`, expected a key or `}`.
    #[error("expected an object key or '}'")]
    ExpectedKeyOrCloser,
    /// An object key was not followed by `:`.
    #[error("expected ':'")]
    ExpectedColon,
    /// A value was not followed by `,` or the enclosing closer.
    #[error("expected ',' or a closing bracket")]
    ExpectedCommaOrCloser,
    /// Trailing non-whitespace bytes after the root value completed.
    #[error("expected end of input")]
    ExpectedEof,
    /// `max_total_len` was exceeded.
    #[error("total input length limit exceeded")]
    MaxTotalLen,
    /// `max_total_values` was exceeded.
    #[error("total value count limit exceeded")]
    MaxTotalValues,
    /// `max_nesting_level` was exceeded.
    #[error("nesting depth limit exceeded")]
    MaxNestingLevel,
    /// `max_number_len` was exceeded.
    #[error("number literal length limit exceeded")]
    MaxNumberLen,
    /// `max_string_len` was exceeded.
    #[error("string literal length limit exceeded")]
    MaxStringLen,
    /// `max_key_len` was exceeded.
    #[error("object key length limit exceeded")]
    MaxKeyLen,
    /// A raw `\n` or `\r` appeared inside a string, or input ended mid-string.
    #[error("unterminated string")]
    UnclosedString,
    /// A `U+0000..U+001F` control character appeared in a string unescaped.
    #[error("unescaped control character in string")]
    UnescapedControl,
    /// An unrecognized `\X` escape, or a malformed `\uXXXX`.
    #[error("invalid escape sequence")]
    InvalidEscape,
    /// Ill-formed UTF-8 under [`crate::utf8::Utf8Mode::Strict`].
    #[error("invalid UTF-8")]
    InvalidUtf8,
    /// A duplicate object key under [`crate::config::DupKeyPolicy::Abort`].
    #[error("duplicate object key")]
    DupKey,
    /// A [`crate::parser::Callbacks`] implementation returned non-zero; the
    /// value it returned is carried here and reported unchanged by `finish`.
    #[error("callback aborted parsing (code {0})")]
    Aborted(u32),
}

/// An [`ErrorCode`] located at the byte/line/column where it was detected.
///
/// Per spec.md §7: the position is the byte where the fault was first
/// detected, except [`ErrorCode::UnclosedString`] (reported at the string's
/// opening quote) and [`ErrorCode::MaxTotalLen`]/[`ErrorCode::MaxTotalValues`]
/// (reported at the threshold crossing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{code} at {pos:?}")]
pub struct ParserError {
    /// The kind of failure.
    pub code: ErrorCode,
    /// Where it was detected.
    pub pos: JsonInputPos,
}

impl ParserError {
    pub(crate) fn new(code: ErrorCode, pos: JsonInputPos) -> Self {
        Self { code, pos }
    }
}
