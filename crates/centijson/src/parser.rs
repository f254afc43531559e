//! The streaming parser (C3): a byte-oriented incremental lexer plus
//! pushdown state machine emitting a strictly ordered callback sequence.
//!
//! Grounded on spec.md §4.3's vocabulary (`EXPECT_VALUE_OR_CLOSER` and
//! friends) and on `original_source/utils/json-parse.c` for the
//! feed/finish/error-latching shape. The teacher's `parser/mod.rs` shows the
//! general idea of one struct owning lexer state, pushdown state, and
//! scratch buffers with `feed`/`finish` entry points, but its machinery is
//! built around zero-copy `&str` batches and an iterator of events; this
//! module is simpler by necessity, since spec.md is explicit that input is
//! arbitrary byte chunks (down to a single byte) delivered to a callback
//! trait (spec.md §9: "a capability trait... one method, ten event kinds").

use alloc::vec::Vec;

use crate::config::JsonConfig;
use crate::error::{ErrorCode, ParserError};
use crate::pos::JsonInputPos;
use crate::utf8::{self, Scanner as Utf8Scanner, Utf8Mode};

/// One parser event, passed to [`Callbacks::event`] in document order
/// (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    /// `null`.
    Null,
    /// `false`.
    False,
    /// `true`.
    True,
    /// The raw byte run of a number literal, already validated against the
    /// JSON number grammar
    /// (`-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?`).
    Number(&'a [u8]),
    /// A string value's decoded bytes (subject to the configured
    /// [`Utf8Mode`]).
    String(&'a [u8]),
    /// An object key's decoded bytes.
    Key(&'a [u8]),
    /// `[`.
    ArrayBeg,
    /// `]`.
    ArrayEnd,
    /// `{`.
    ObjectBeg,
    /// `}`.
    ObjectEnd,
}

/// The parser-to-consumer boundary (spec.md §9): one method, the event kind
/// distinguished by `event`'s argument. A non-zero return aborts parsing;
/// the first non-zero value wins and is reported unchanged via
/// [`ErrorCode::Aborted`].
pub trait Callbacks {
    /// Handles one parser event. Return `0` to continue; any other value
    /// aborts parsing and becomes the final error code.
    fn event(&mut self, event: Event<'_>) -> u32;
}

/// A frame of the parser's pushdown stack (spec.md §4.3/§9), one per array
/// or object currently open. The sub-state doubles as the error code chosen
/// if the next byte violates the grammar at this position — see the
/// `unexpected_*` helpers below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    /// Just opened `[`; a value or `]` are both legal here.
    ArrayFirstOrCloser,
    /// Just consumed `,` in an array; a value is required. Seeing `]` here
    /// is a trailing-comma error, reported with the same "or closer" code
    /// as the legal case above (spec.md §4.3: "a `,` immediately followed
    /// by closer is EXPECTEDVALUEORCLOSER... at the closer's position").
    ArrayNext,
    /// Just finished an array element; `,` or `]` are legal.
    ArrayAfterValue,
    /// Just opened `{`; a key or `}` are both legal here.
    ObjectFirstOrCloser,
    /// Just consumed `,` in an object; a key is required.
    ObjectNext,
    /// Just finished a key; `:` is required.
    ObjectAfterKey,
    /// Just consumed `:`; a value is required.
    ObjectAfterColon,
    /// Just finished an object member's value; `,` or `}` are legal.
    ObjectAfterValue,
}

impl FrameState {
    fn is_array(self) -> bool {
        matches!(
            self,
            Self::ArrayFirstOrCloser | Self::ArrayNext | Self::ArrayAfterValue
        )
    }

    /// The error reported when this state's required byte is absent at
    /// end-of-input, or when some other invalid byte arrives instead.
    fn unexpected(self) -> ErrorCode {
        match self {
            Self::ArrayFirstOrCloser | Self::ArrayNext => ErrorCode::ExpectedValueOrCloser,
            Self::ArrayAfterValue | Self::ObjectAfterValue => ErrorCode::ExpectedCommaOrCloser,
            Self::ObjectFirstOrCloser | Self::ObjectNext => ErrorCode::ExpectedKeyOrCloser,
            Self::ObjectAfterKey => ErrorCode::ExpectedColon,
            Self::ObjectAfterColon => ErrorCode::ExpectedValue,
        }
    }
}

/// Root-level pushdown state (spec.md §4.3: "the root frame begins in
/// `EXPECT_VALUE` and transitions to `EXPECT_EOF` after one value").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RootState {
    ExpectValue,
    ExpectEof,
}

/// Which kind of string token is being lexed, since keys and values use
/// different UTF-8 policy flags, length limits, and terminal events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringKind {
    Key,
    Value,
}

/// Progress through the JSON number grammar
/// (`-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?`), tracked one byte at a
/// time so a terminator byte can be judged as accepting or erroring without
/// re-scanning the accumulated digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumPhase {
    /// Just consumed `-`; a digit must follow.
    Sign,
    /// The literal is exactly `0` so far (no more digits may follow it
    /// directly — spec.md §4.3: "a leading-zero integer (013) is SYNTAX").
    Zero,
    /// Consuming digits after a non-zero leading digit.
    IntDigits,
    /// Just consumed `.`; a digit must follow.
    Point,
    /// Consuming fraction digits.
    FracDigits,
    /// Just consumed `e`/`E`; a sign or digit must follow.
    ExpSign,
    /// Just consumed the exponent's sign; a digit must follow.
    ExpDigits0,
    /// Consuming exponent digits.
    ExpDigits,
}

impl NumPhase {
    /// Whether a terminator byte arriving in this phase completes a valid
    /// number, vs. signals a truncated grammar (`SYNTAX`).
    fn is_accepting(self) -> bool {
        matches!(
            self,
            Self::Zero | Self::IntDigits | Self::FracDigits | Self::ExpDigits
        )
    }
}

/// The four targets a `LITERAL` token can match against (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Literal {
    Null,
    True,
    False,
}

impl Literal {
    fn bytes(self) -> &'static [u8] {
        match self {
            Self::Null => b"null",
            Self::True => b"true",
            Self::False => b"false",
        }
    }

    fn event(self) -> Event<'static> {
        match self {
            Self::Null => Event::Null,
            Self::True => Event::True,
            Self::False => Event::False,
        }
    }
}

/// What a `\uXXXX` escape decoded to, classified for surrogate pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Esc {
    High(u16),
    Low(u16),
    Scalar(char),
}

fn classify_escape_unit(value: u16) -> Esc {
    match value {
        0xD800..=0xDBFF => Esc::High(value),
        0xDC00..=0xDFFF => Esc::Low(value),
        _ => Esc::Scalar(char::from_u32(u32::from(value)).expect("not a surrogate")),
    }
}

/// What the lexer is in the middle of producing. `Idle` means the next byte
/// starts fresh at whatever the pushdown state currently expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Literal {
        target: Literal,
        matched: usize,
    },
    Number(NumPhase),
    /// Inside a string body (after the opening quote, before an escape or
    /// the closing quote).
    StringBody(StringKind),
    /// Just consumed the `\` that starts an escape.
    StringEscape(StringKind),
    /// Accumulating the 4 hex digits of a `\uXXXX` escape.
    StringUesc {
        kind: StringKind,
        digits: u8,
        value: u16,
    },
    /// A high surrogate was decoded; the next byte must be the `\` that
    /// begins its paired low-surrogate escape.
    StringExpectLowBackslash {
        kind: StringKind,
        high: u16,
    },
    /// The `\` of the expected low-surrogate escape was consumed; the next
    /// byte must be `u`.
    StringExpectLowU {
        kind: StringKind,
        high: u16,
    },
    /// Accumulating the 4 hex digits of the low half of a surrogate pair.
    StringUescLow {
        kind: StringKind,
        high: u16,
        digits: u8,
        value: u16,
    },
}

/// What to do with the byte just examined.
enum Step {
    /// The byte was consumed as part of the current token; advance to the
    /// next input byte.
    Consumed,
    /// The current token ended without consuming this byte; re-dispatch the
    /// same byte against the (now updated) parser state.
    Reprocess,
}

/// Resource-limit and total-value bookkeeping, factored out of
/// [`StreamingParser`] so `feed`'s main loop reads as the grammar it
/// implements rather than a wall of counters.
#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    total_values: usize,
}

/// The incremental, byte-oriented JSON parser (spec.md §4.3).
///
/// `feed` may be called with any partition of the input, down to a single
/// byte at a time, and the parser's behavior (including reported error
/// positions) is identical regardless of how the bytes are chunked
/// (spec.md §8: "chunking independence"). Once an error occurs it latches:
/// every subsequent `feed` is a no-op returning the same error, and
/// `finish` returns it.
pub struct StreamingParser {
    config: JsonConfig,
    pos: JsonInputPos,
    error: Option<ParserError>,

    stack: Vec<FrameState>,
    root: RootState,

    mode: Mode,
    token_start: JsonInputPos,
    scratch: Vec<u8>,
    utf8: Utf8Scanner,
    last_byte: Option<u8>,

    counters: Counters,
}

impl StreamingParser {
    /// Creates a parser with the given resource limits and behavior flags.
    #[must_use]
    pub fn new(config: JsonConfig) -> Self {
        Self {
            config,
            pos: JsonInputPos::start(),
            error: None,
            stack: Vec::new(),
            root: RootState::ExpectValue,
            mode: Mode::Idle,
            token_start: JsonInputPos::start(),
            scratch: Vec::new(),
            utf8: Utf8Scanner::new(),
            last_byte: None,
            counters: Counters::default(),
        }
    }

    /// The parser's current position (byte/line/column of the next
    /// unconsumed byte).
    #[must_use]
    pub fn pos(&self) -> JsonInputPos {
        self.pos
    }

    /// Feeds a run of bytes to the parser, invoking `callbacks.event` for
    /// every completed token in order.
    ///
    /// Returns the latched error, if any (from this call or a prior one).
    /// Once an error has been latched, this is a no-op.
    pub fn feed<C: Callbacks>(&mut self, bytes: &[u8], callbacks: &mut C) -> Result<(), ParserError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        for &byte in bytes {
            if let Err(err) = self.step_byte(byte, callbacks) {
                self.error = Some(err);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Flushes any pending token and returns the final position, or the
    /// latched error.
    pub fn finish<C: Callbacks>(mut self, callbacks: &mut C) -> Result<JsonInputPos, ParserError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if let Err(err) = self.finish_inner(callbacks) {
            return Err(err);
        }
        Ok(self.pos)
    }

    fn finish_inner<C: Callbacks>(&mut self, callbacks: &mut C) -> Result<(), ParserError> {
        match self.mode {
            Mode::Idle => {}
            Mode::Literal { .. } => return Err(self.err_at(ErrorCode::Syntax, self.token_start)),
            Mode::Number(phase) => {
                if phase.is_accepting() {
                    self.finalize_number(callbacks)?;
                } else {
                    return Err(self.err_at(ErrorCode::Syntax, self.token_start));
                }
            }
            Mode::StringBody(_)
            | Mode::StringEscape(_)
            | Mode::StringUesc { .. }
            | Mode::StringExpectLowBackslash { .. }
            | Mode::StringExpectLowU { .. }
            | Mode::StringUescLow { .. } => {
                return Err(self.err_at(ErrorCode::UnclosedString, self.token_start));
            }
        }

        match self.stack.last().copied() {
            Some(top) => Err(self.err_here(top.unexpected())),
            None => match self.root {
                RootState::ExpectValue => Err(self.err_here(ErrorCode::ExpectedValue)),
                RootState::ExpectEof => Ok(()),
            },
        }
    }

    fn err_here(&self, code: ErrorCode) -> ParserError {
        ParserError::new(code, self.pos)
    }

    fn err_at(&self, code: ErrorCode, pos: JsonInputPos) -> ParserError {
        ParserError::new(code, pos)
    }

    fn step_byte<C: Callbacks>(&mut self, byte: u8, callbacks: &mut C) -> Result<(), ParserError> {
        if self.config.max_total_len != 0 && self.pos.offset >= self.config.max_total_len {
            return Err(self.err_here(ErrorCode::MaxTotalLen));
        }

        let err_pos = self.pos;
        loop {
            match self.dispatch(byte, err_pos, callbacks)? {
                Step::Consumed => break,
                Step::Reprocess => continue,
            }
        }
        self.pos.advance(byte, self.last_byte);
        self.last_byte = Some(byte);
        Ok(())
    }

    fn dispatch<C: Callbacks>(
        &mut self,
        byte: u8,
        pos: JsonInputPos,
        callbacks: &mut C,
    ) -> Result<Step, ParserError> {
        match self.mode {
            Mode::Idle => self.dispatch_idle(byte, pos, callbacks),
            Mode::Literal { target, matched } => self.dispatch_literal(byte, pos, target, matched, callbacks),
            Mode::Number(phase) => self.dispatch_number(byte, pos, phase, callbacks),
            Mode::StringBody(kind) => self.dispatch_string_body(byte, pos, kind, callbacks),
            Mode::StringEscape(kind) => self.dispatch_string_escape(byte, pos, kind),
            Mode::StringUesc { kind, digits, value } => {
                self.dispatch_string_uesc(byte, pos, kind, digits, value)
            }
            Mode::StringExpectLowBackslash { kind, high } => {
                self.dispatch_expect_low_backslash(byte, pos, kind, high)
            }
            Mode::StringExpectLowU { kind, high } => self.dispatch_expect_low_u(byte, pos, kind, high),
            Mode::StringUescLow {
                kind,
                high,
                digits,
                value,
            } => self.dispatch_string_uesc_low(byte, pos, kind, high, digits, value),
        }
    }

    // ---------------------------------------------------------------
    // Idle dispatch: whitespace, structural bytes, and value/key starts.
    // ---------------------------------------------------------------

    fn dispatch_idle<C: Callbacks>(
        &mut self,
        byte: u8,
        pos: JsonInputPos,
        callbacks: &mut C,
    ) -> Result<Step, ParserError> {
        if matches!(byte, b' ' | b'\t' | b'\n' | b'\r') {
            return Ok(Step::Consumed);
        }

        match self.stack.last().copied() {
            None => self.dispatch_idle_root(byte, pos, callbacks),
            Some(top) => self.dispatch_idle_frame(byte, pos, top, callbacks),
        }
    }

    fn dispatch_idle_root<C: Callbacks>(
        &mut self,
        byte: u8,
        pos: JsonInputPos,
        callbacks: &mut C,
    ) -> Result<Step, ParserError> {
        match self.root {
            // Any non-whitespace byte after the root value completed is
            // trailing garbage; whitespace was already consumed above.
            RootState::ExpectEof => Err(self.err_at(ErrorCode::ExpectedEof, pos)),
            RootState::ExpectValue => {
                if byte == b']' || byte == b'}' {
                    return Err(self.err_at(ErrorCode::BadCloser, pos));
                }
                if let Some(root_err) = self.check_root_type(byte) {
                    return Err(root_err);
                }
                self.start_value(byte, pos, callbacks)
            }
        }
    }

    /// spec.md §4.3: root-type rejection is always reported at offset 0,
    /// regardless of how much leading whitespace preceded the value.
    fn check_root_type(&self, byte: u8) -> Option<ParserError> {
        let flags = self.config.flags;
        let forbidden = match byte {
            b'n' => flags.no_null_as_root,
            b't' | b'f' => flags.no_bool_as_root,
            b'-' | b'0'..=b'9' => flags.no_number_as_root,
            b'"' => flags.no_string_as_root,
            b'[' => flags.no_array_as_root,
            b'{' => flags.no_object_as_root,
            _ => false,
        };
        forbidden.then(|| ParserError::new(ErrorCode::BadRootType, JsonInputPos::start()))
    }

    fn dispatch_idle_frame<C: Callbacks>(
        &mut self,
        byte: u8,
        pos: JsonInputPos,
        top: FrameState,
        callbacks: &mut C,
    ) -> Result<Step, ParserError> {
        // A closer whose bracket shape doesn't match the open frame is
        // always BADCLOSER, regardless of sub-state (spec.md §4.3).
        if byte == b']' && !top.is_array() {
            return Err(self.err_at(ErrorCode::BadCloser, pos));
        }
        if byte == b'}' && top.is_array() {
            return Err(self.err_at(ErrorCode::BadCloser, pos));
        }

        match top {
            FrameState::ArrayFirstOrCloser => {
                if byte == b']' {
                    self.close_frame(callbacks)
                } else if self.looks_like_value_start(byte) {
                    self.start_value(byte, pos, callbacks)
                } else {
                    Err(self.err_at(ErrorCode::ExpectedValueOrCloser, pos))
                }
            }
            FrameState::ArrayNext => {
                if byte == b']' || !self.looks_like_value_start(byte) {
                    Err(self.err_at(ErrorCode::ExpectedValueOrCloser, pos))
                } else {
                    self.start_value(byte, pos, callbacks)
                }
            }
            FrameState::ArrayAfterValue => {
                if byte == b',' {
                    *self.stack.last_mut().expect("frame present") = FrameState::ArrayNext;
                    Ok(Step::Consumed)
                } else if byte == b']' {
                    self.close_frame(callbacks)
                } else {
                    Err(self.err_at(ErrorCode::ExpectedCommaOrCloser, pos))
                }
            }
            FrameState::ObjectFirstOrCloser => {
                if byte == b'}' {
                    self.close_frame(callbacks)
                } else if byte == b'"' {
                    self.start_string(StringKind::Key, pos)
                } else {
                    Err(self.err_at(ErrorCode::ExpectedKeyOrCloser, pos))
                }
            }
            FrameState::ObjectNext => {
                if byte == b'"' {
                    self.start_string(StringKind::Key, pos)
                } else {
                    Err(self.err_at(ErrorCode::ExpectedKeyOrCloser, pos))
                }
            }
            FrameState::ObjectAfterKey => {
                if byte == b':' {
                    *self.stack.last_mut().expect("frame present") = FrameState::ObjectAfterColon;
                    Ok(Step::Consumed)
                } else {
                    Err(self.err_at(ErrorCode::ExpectedColon, pos))
                }
            }
            FrameState::ObjectAfterColon => {
                if self.looks_like_value_start(byte) {
                    self.start_value(byte, pos, callbacks)
                } else {
                    Err(self.err_at(ErrorCode::ExpectedValue, pos))
                }
            }
            FrameState::ObjectAfterValue => {
                if byte == b',' {
                    *self.stack.last_mut().expect("frame present") = FrameState::ObjectNext;
                    Ok(Step::Consumed)
                } else if byte == b'}' {
                    self.close_frame(callbacks)
                } else {
                    Err(self.err_at(ErrorCode::ExpectedCommaOrCloser, pos))
                }
            }
        }
    }

    fn looks_like_value_start(&self, byte: u8) -> bool {
        matches!(byte, b'n' | b't' | b'f' | b'"' | b'-' | b'0'..=b'9' | b'[' | b'{')
    }

    fn close_frame<C: Callbacks>(&mut self, callbacks: &mut C) -> Result<Step, ParserError> {
        let top = self.stack.pop().expect("frame present");
        let event = if top.is_array() { Event::ArrayEnd } else { Event::ObjectEnd };
        self.emit(callbacks, event)?;
        self.value_completed();
        Ok(Step::Consumed)
    }

    /// Records that a value (scalar or just-closed container) has been
    /// fully produced, advancing the enclosing frame (or the root) past it.
    fn value_completed(&mut self) {
        match self.stack.last_mut() {
            None => self.root = RootState::ExpectEof,
            Some(top @ (FrameState::ArrayFirstOrCloser | FrameState::ArrayNext)) => {
                *top = FrameState::ArrayAfterValue;
            }
            Some(top @ FrameState::ObjectAfterColon) => {
                *top = FrameState::ObjectAfterValue;
            }
            Some(_) => unreachable!("value_completed called outside a value position"),
        }
    }

    fn start_value<C: Callbacks>(
        &mut self,
        byte: u8,
        pos: JsonInputPos,
        callbacks: &mut C,
    ) -> Result<Step, ParserError> {
        self.check_total_values(pos)?;
        match byte {
            b'n' => self.start_literal(Literal::Null),
            b't' => self.start_literal(Literal::True),
            b'f' => self.start_literal(Literal::False),
            b'"' => self.start_string(StringKind::Value, pos),
            b'-' => {
                self.token_start = pos;
                self.scratch.clear();
                self.check_number_len(pos)?;
                self.scratch.push(byte);
                self.mode = Mode::Number(NumPhase::Sign);
                Ok(Step::Consumed)
            }
            b'0' => {
                self.token_start = pos;
                self.scratch.clear();
                self.check_number_len(pos)?;
                self.scratch.push(byte);
                self.mode = Mode::Number(NumPhase::Zero);
                Ok(Step::Consumed)
            }
            b'1'..=b'9' => {
                self.token_start = pos;
                self.scratch.clear();
                self.check_number_len(pos)?;
                self.scratch.push(byte);
                self.mode = Mode::Number(NumPhase::IntDigits);
                Ok(Step::Consumed)
            }
            b'[' => {
                self.push_frame(FrameState::ArrayFirstOrCloser, pos)?;
                self.emit(callbacks, Event::ArrayBeg)?;
                Ok(Step::Consumed)
            }
            b'{' => {
                self.push_frame(FrameState::ObjectFirstOrCloser, pos)?;
                self.emit(callbacks, Event::ObjectBeg)?;
                Ok(Step::Consumed)
            }
            _ => unreachable!("caller checked looks_like_value_start"),
        }
    }

    fn check_total_values(&mut self, pos: JsonInputPos) -> Result<(), ParserError> {
        if self.config.max_total_values != 0 && self.counters.total_values + 1 > self.config.max_total_values {
            return Err(self.err_at(ErrorCode::MaxTotalValues, pos));
        }
        self.counters.total_values += 1;
        Ok(())
    }

    fn push_frame(&mut self, frame: FrameState, pos: JsonInputPos) -> Result<(), ParserError> {
        if self.config.max_nesting_level != 0 && self.stack.len() + 1 > self.config.max_nesting_level {
            return Err(self.err_at(ErrorCode::MaxNestingLevel, pos));
        }
        self.stack.push(frame);
        Ok(())
    }

    fn start_literal(&mut self, target: Literal) -> Result<Step, ParserError> {
        self.mode = Mode::Literal { target, matched: 1 };
        Ok(Step::Consumed)
    }

    // ---------------------------------------------------------------
    // Literal matching.
    // ---------------------------------------------------------------

    fn dispatch_literal<C: Callbacks>(
        &mut self,
        byte: u8,
        pos: JsonInputPos,
        target: Literal,
        matched: usize,
        callbacks: &mut C,
    ) -> Result<Step, ParserError> {
        let bytes = target.bytes();
        if byte != bytes[matched] {
            return Err(self.err_at(ErrorCode::Syntax, pos));
        }
        let matched = matched + 1;
        if matched == bytes.len() {
            self.mode = Mode::Idle;
            self.emit(callbacks, target.event())?;
            self.value_completed();
        } else {
            self.mode = Mode::Literal { target, matched };
        }
        Ok(Step::Consumed)
    }

    // ---------------------------------------------------------------
    // Number lexing.
    // ---------------------------------------------------------------

    fn dispatch_number<C: Callbacks>(
        &mut self,
        byte: u8,
        pos: JsonInputPos,
        phase: NumPhase,
        callbacks: &mut C,
    ) -> Result<Step, ParserError> {
        let digit = byte.is_ascii_digit();
        let next_phase = match (phase, byte) {
            (NumPhase::Sign, _) if digit => Some(if byte == b'0' { NumPhase::Zero } else { NumPhase::IntDigits }),
            (NumPhase::Zero, b'.') => Some(NumPhase::Point),
            (NumPhase::Zero, b'e' | b'E') => Some(NumPhase::ExpSign),
            (NumPhase::Zero, _) if digit => {
                // Leading zero followed directly by another digit: "013".
                return Err(self.err_at(ErrorCode::Syntax, pos));
            }
            (NumPhase::IntDigits, _) if digit => Some(NumPhase::IntDigits),
            (NumPhase::IntDigits, b'.') => Some(NumPhase::Point),
            (NumPhase::IntDigits, b'e' | b'E') => Some(NumPhase::ExpSign),
            (NumPhase::Point, _) if digit => Some(NumPhase::FracDigits),
            (NumPhase::FracDigits, _) if digit => Some(NumPhase::FracDigits),
            (NumPhase::FracDigits, b'e' | b'E') => Some(NumPhase::ExpSign),
            (NumPhase::ExpSign, b'+' | b'-') => Some(NumPhase::ExpDigits0),
            (NumPhase::ExpSign, _) if digit => Some(NumPhase::ExpDigits),
            (NumPhase::ExpDigits0, _) if digit => Some(NumPhase::ExpDigits),
            (NumPhase::ExpDigits, _) if digit => Some(NumPhase::ExpDigits),
            _ => None,
        };

        if let Some(next_phase) = next_phase {
            self.check_number_len(pos)?;
            self.scratch.push(byte);
            self.mode = Mode::Number(next_phase);
            return Ok(Step::Consumed);
        }

        // This byte doesn't continue the number. Either the number is
        // complete (phase accepting) or the grammar was left incomplete.
        if phase.is_accepting() {
            self.finalize_number(callbacks)?;
            Ok(Step::Reprocess)
        } else {
            Err(self.err_at(ErrorCode::Syntax, pos))
        }
    }

    fn check_number_len(&self, pos: JsonInputPos) -> Result<(), ParserError> {
        if self.config.max_number_len != 0 && self.scratch.len() >= self.config.max_number_len {
            return Err(self.err_at(ErrorCode::MaxNumberLen, pos));
        }
        Ok(())
    }

    fn finalize_number<C: Callbacks>(&mut self, callbacks: &mut C) -> Result<(), ParserError> {
        self.mode = Mode::Idle;
        let digits = core::mem::take(&mut self.scratch);
        let code = callbacks.event(Event::Number(&digits));
        self.scratch = digits;
        self.scratch.clear();
        if code != 0 {
            return Err(self.err_here(ErrorCode::Aborted(code)));
        }
        self.value_completed();
        Ok(())
    }

    // ---------------------------------------------------------------
    // String lexing.
    // ---------------------------------------------------------------

    fn start_string(&mut self, kind: StringKind, pos: JsonInputPos) -> Result<Step, ParserError> {
        self.token_start = pos;
        self.scratch.clear();
        self.utf8 = Utf8Scanner::new();
        self.mode = Mode::StringBody(kind);
        Ok(Step::Consumed)
    }

    fn utf8_mode(&self, kind: StringKind) -> Utf8Mode {
        match kind {
            StringKind::Key => self.config.flags.key_utf8_mode(),
            StringKind::Value => self.config.flags.value_utf8_mode(),
        }
    }

    fn max_len(&self, kind: StringKind) -> usize {
        match kind {
            StringKind::Key => self.config.max_key_len,
            StringKind::Value => self.config.max_string_len,
        }
    }

    fn len_error(&self, kind: StringKind) -> ErrorCode {
        match kind {
            StringKind::Key => ErrorCode::MaxKeyLen,
            StringKind::Value => ErrorCode::MaxStringLen,
        }
    }

    fn check_string_len(&self, kind: StringKind, pos: JsonInputPos) -> Result<(), ParserError> {
        let limit = self.max_len(kind);
        if limit != 0 && self.scratch.len() >= limit {
            return Err(self.err_at(self.len_error(kind), pos));
        }
        Ok(())
    }

    fn dispatch_string_body<C: Callbacks>(
        &mut self,
        byte: u8,
        pos: JsonInputPos,
        kind: StringKind,
        callbacks: &mut C,
    ) -> Result<Step, ParserError> {
        match byte {
            b'"' => self.finalize_string(kind, callbacks),
            b'\\' => {
                self.mode = Mode::StringEscape(kind);
                Ok(Step::Consumed)
            }
            b'\n' | b'\r' => Err(self.err_at(ErrorCode::UnclosedString, self.token_start)),
            0x00..=0x1F => Err(self.err_at(ErrorCode::UnescapedControl, pos)),
            _ => {
                self.check_string_len(kind, pos)?;
                let mode = self.utf8_mode(kind);
                self.utf8
                    .push(byte, mode, &mut self.scratch)
                    .map_err(|_| self.err_at(ErrorCode::InvalidUtf8, pos))?;
                Ok(Step::Consumed)
            }
        }
    }

    fn finalize_string<C: Callbacks>(
        &mut self,
        kind: StringKind,
        callbacks: &mut C,
    ) -> Result<Step, ParserError> {
        let mode = self.utf8_mode(kind);
        self.utf8
            .finish(mode, &mut self.scratch)
            .map_err(|_| self.err_at(ErrorCode::InvalidUtf8, self.token_start))?;

        self.mode = Mode::Idle;
        let bytes = core::mem::take(&mut self.scratch);
        let event = match kind {
            StringKind::Key => Event::Key(&bytes),
            StringKind::Value => Event::String(&bytes),
        };
        let code = callbacks.event(event);
        self.scratch = bytes;
        self.scratch.clear();
        if code != 0 {
            return Err(self.err_here(ErrorCode::Aborted(code)));
        }

        match kind {
            StringKind::Key => {
                *self.stack.last_mut().expect("key only inside an object frame") = FrameState::ObjectAfterKey;
            }
            StringKind::Value => self.value_completed(),
        }
        Ok(Step::Consumed)
    }

    fn dispatch_string_escape(
        &mut self,
        byte: u8,
        pos: JsonInputPos,
        kind: StringKind,
    ) -> Result<Step, ParserError> {
        let simple: Option<u8> = match byte {
            b'"' => Some(b'"'),
            b'\\' => Some(b'\\'),
            b'/' => Some(b'/'),
            b'b' => Some(0x08),
            b'f' => Some(0x0C),
            b'n' => Some(b'\n'),
            b'r' => Some(b'\r'),
            b't' => Some(b'\t'),
            _ => None,
        };
        if let Some(decoded) = simple {
            self.check_string_len(kind, pos)?;
            self.scratch.push(decoded);
            self.mode = Mode::StringBody(kind);
            return Ok(Step::Consumed);
        }
        if byte == b'u' {
            self.mode = Mode::StringUesc {
                kind,
                digits: 0,
                value: 0,
            };
            return Ok(Step::Consumed);
        }
        Err(self.err_at(ErrorCode::InvalidEscape, pos))
    }

    fn dispatch_string_uesc(
        &mut self,
        byte: u8,
        pos: JsonInputPos,
        kind: StringKind,
        digits: u8,
        value: u16,
    ) -> Result<Step, ParserError> {
        let Some(nibble) = hex_digit(byte) else {
            return Err(self.err_at(ErrorCode::InvalidEscape, pos));
        };
        let value = (value << 4) | u16::from(nibble);
        let digits = digits + 1;
        if digits < 4 {
            self.mode = Mode::StringUesc { kind, digits, value };
            return Ok(Step::Consumed);
        }

        match classify_escape_unit(value) {
            Esc::High(high) => {
                self.mode = Mode::StringExpectLowBackslash { kind, high };
            }
            Esc::Low(low) => {
                self.push_lone_surrogate(kind, low, pos)?;
                self.mode = Mode::StringBody(kind);
            }
            Esc::Scalar(scalar) => {
                self.push_scalar(kind, scalar, pos)?;
                self.mode = Mode::StringBody(kind);
            }
        }
        Ok(Step::Consumed)
    }

    fn dispatch_expect_low_backslash(
        &mut self,
        byte: u8,
        pos: JsonInputPos,
        kind: StringKind,
        high: u16,
    ) -> Result<Step, ParserError> {
        if byte == b'\\' {
            self.mode = Mode::StringExpectLowU { kind, high };
            Ok(Step::Consumed)
        } else {
            // The high surrogate is unpaired; resolve it on its own and
            // reprocess this byte as ordinary string-body content.
            self.push_lone_surrogate(kind, high, pos)?;
            self.mode = Mode::StringBody(kind);
            Ok(Step::Reprocess)
        }
    }

    fn dispatch_expect_low_u(
        &mut self,
        byte: u8,
        pos: JsonInputPos,
        kind: StringKind,
        high: u16,
    ) -> Result<Step, ParserError> {
        if byte == b'u' {
            self.mode = Mode::StringUescLow {
                kind,
                high,
                digits: 0,
                value: 0,
            };
            Ok(Step::Consumed)
        } else {
            // The backslash we consumed starts a different escape (e.g.
            // "\uD800\n"), not a low-surrogate pairing. Resolve the high
            // surrogate alone, then reprocess this byte as the start of a
            // fresh escape.
            self.push_lone_surrogate(kind, high, pos)?;
            self.mode = Mode::StringEscape(kind);
            Ok(Step::Reprocess)
        }
    }

    fn dispatch_string_uesc_low(
        &mut self,
        byte: u8,
        pos: JsonInputPos,
        kind: StringKind,
        high: u16,
        digits: u8,
        value: u16,
    ) -> Result<Step, ParserError> {
        let Some(nibble) = hex_digit(byte) else {
            return Err(self.err_at(ErrorCode::InvalidEscape, pos));
        };
        let value = (value << 4) | u16::from(nibble);
        let digits = digits + 1;
        if digits < 4 {
            self.mode = Mode::StringUescLow {
                kind,
                high,
                digits,
                value,
            };
            return Ok(Step::Consumed);
        }

        if (0xDC00..=0xDFFF).contains(&value) {
            let scalar = combine_surrogates(high, value);
            self.push_scalar(kind, scalar, pos)?;
        } else {
            // Not a valid low surrogate: the high is unpaired, and this
            // second unit stands on its own.
            self.push_lone_surrogate(kind, high, pos)?;
            match classify_escape_unit(value) {
                Esc::High(second_high) => {
                    self.mode = Mode::StringExpectLowBackslash { kind, high: second_high };
                    return Ok(Step::Consumed);
                }
                Esc::Low(low) => self.push_lone_surrogate(kind, low, pos)?,
                Esc::Scalar(scalar) => self.push_scalar(kind, scalar, pos)?,
            }
        }
        self.mode = Mode::StringBody(kind);
        Ok(Step::Consumed)
    }

    fn push_scalar(&mut self, kind: StringKind, scalar: char, pos: JsonInputPos) -> Result<(), ParserError> {
        self.check_string_len(kind, pos)?;
        let mode = self.utf8_mode(kind);
        utf8::push_scalar(&mut self.utf8, scalar, mode, &mut self.scratch)
            .map_err(|_| self.err_at(ErrorCode::InvalidUtf8, pos))
    }

    fn push_lone_surrogate(&mut self, kind: StringKind, surrogate: u16, pos: JsonInputPos) -> Result<(), ParserError> {
        self.check_string_len(kind, pos)?;
        let mode = self.utf8_mode(kind);
        utf8::push_lone_surrogate(&mut self.utf8, surrogate, mode, &mut self.scratch)
            .map_err(|_| self.err_at(ErrorCode::InvalidUtf8, pos))
    }

    fn emit<C: Callbacks>(&mut self, callbacks: &mut C, event: Event<'_>) -> Result<(), ParserError> {
        let code = callbacks.event(event);
        if code != 0 {
            return Err(self.err_here(ErrorCode::Aborted(code)));
        }
        Ok(())
    }
}

fn hex_digit(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn combine_surrogates(high: u16, low: u16) -> char {
    let c = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
    char::from_u32(c).expect("valid surrogate pair always combines to a scalar value")
}
