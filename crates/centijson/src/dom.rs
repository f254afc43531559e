//! The DOM builder (C6): a fixed [`Callbacks`](crate::parser::Callbacks)
//! implementation that assembles a [`Value`] tree from parser events.
//!
//! Grounded on `original_source/src/json-dom.c`'s `json_dom_process`: a key
//! event is stashed until the value it names arrives; every other event
//! either writes the root (nothing open yet), appends to the currently open
//! array, or installs into the currently open dict honoring
//! [`DupKeyPolicy`]; container `*_BEG` events descend into the new
//! container, and `*_END` pops back out to its parent.
//!
//! Rather than the C version's `VALUE*` back-references (invalidated by
//! array growth, per spec.md §9), [`Dom`] tracks *how to reach* the
//! currently open container from the root — a [`PathComponent`] per nesting
//! level — and re-walks that path on every access. This is the
//! "hand out indexed handles rather than references" strategy spec.md §9
//! prescribes for ownership-strict targets.
//!
//! One deliberate deviation from `json_dom_process`: under
//! [`DupKeyPolicy::UseFirst`], the C source returns before pushing the
//! discarded value's path frame, which would pop an empty stack once that
//! value's matching `*_END` arrives if it is itself a container — the
//! parser's own frame stack doesn't know the DOM discarded the value, so it
//! still emits a balanced `*_BEG`/`*_END` pair. [`Dom`] instead always pushes
//! a frame (real or [`Frame::Dead`]) so every `*_END` has something to pop;
//! see `DESIGN.md`.

use alloc::vec::Vec;

use bstr::BString;

use crate::config::{DomFlags, DupKeyPolicy};
use crate::dict::Dict;
use crate::error::ErrorCode;
use crate::number::{self, NarrowestWidth};
use crate::parser::{Callbacks, Event};
use crate::value::Value;

/// One step from a container towards one of its children: either "the
/// element just appended to the array" or "the dict entry at this key".
#[derive(Debug, Clone)]
enum PathComponent {
    /// An index into an array, fixed at the moment the element was appended
    /// (arrays are only ever appended to here, never inserted into).
    Index(usize),
    /// A dict key.
    Key(BString),
}

/// One level of [`Dom`]'s path stack, mirroring the parser's own frame
/// stack one-for-one.
#[derive(Debug, Clone)]
enum Frame {
    /// A real step into the tree under construction.
    Real(PathComponent),
    /// A container whose value was discarded (a duplicate dict key under
    /// [`DupKeyPolicy::UseFirst`]); everything nested inside it is also
    /// discarded, and this frame exists only so the matching `*_END` has a
    /// stack entry to pop.
    Dead,
}

/// Non-zero callback return used to signal a [`DupKeyPolicy::Abort`] hit up
/// through [`crate::parser::StreamingParser`], which reports it as
/// [`ErrorCode::Aborted`] (spec.md §4.3: "a non-zero return from any
/// callback aborts parsing... is reported unchanged by finish()").
/// [`Dom::take_dup_key_error`] maps it back to [`ErrorCode::DupKey`].
const DUP_KEY_ABORT_CODE: u32 = 1;

/// Consumes a [`crate::parser::StreamingParser`]'s event stream and builds a
/// [`Value`] tree, per spec.md §4.6.
pub struct Dom {
    root: Value,
    /// `true` once the document's single root value has started (so a
    /// second top-level scalar is recognized as "inside the root
    /// container" rather than "nothing built yet" — the parser's own
    /// grammar already guarantees there is at most one root value, so this
    /// only ever distinguishes those two cases).
    have_root: bool,
    /// One frame per currently open array/object, mirroring the parser's
    /// pushdown stack. Empty means either nothing has been built yet, or
    /// the root value itself is the (still open) current container.
    path: Vec<Frame>,
    /// The key stashed by the most recent `Key` event, not yet consumed by
    /// the value event that follows it.
    pending_key: Option<BString>,
    flags: DomFlags,
    dup_key_hit: bool,
}

impl Dom {
    /// Creates an empty builder. `flags` controls whether every dict this
    /// builder creates maintains insertion order, and how duplicate keys
    /// within one object literal are resolved.
    #[must_use]
    pub fn new(flags: DomFlags) -> Self {
        Self {
            root: Value::Null,
            have_root: false,
            path: Vec::new(),
            pending_key: None,
            flags,
            dup_key_hit: false,
        }
    }

    /// Consumes the builder, returning the completed tree. Callers normally
    /// call this only after the driving parser's `finish()` returned `Ok`;
    /// on an aborted or failed parse the caller should discard this and
    /// treat the root as `Value::Null`, per spec.md §7 ("on error finish()
    /// still initializes the out-parameter root to NULL").
    #[must_use]
    pub fn into_value(self) -> Value {
        self.root
    }

    /// If `code` is the [`ErrorCode::Aborted`] this builder raised for a
    /// [`DupKeyPolicy::Abort`] hit, remaps it to [`ErrorCode::DupKey`];
    /// otherwise returns it unchanged. Pair with the
    /// [`crate::error::ParserError`] returned by
    /// [`crate::parser::StreamingParser::feed`]/`finish`.
    #[must_use]
    pub fn take_dup_key_error(&self, code: ErrorCode) -> ErrorCode {
        if self.dup_key_hit && code == ErrorCode::Aborted(DUP_KEY_ABORT_CODE) {
            ErrorCode::DupKey
        } else {
            code
        }
    }

    fn in_dead_region(&self) -> bool {
        matches!(self.path.last(), Some(Frame::Dead))
    }

    /// Walks from the root through every frame's [`PathComponent`] to reach
    /// the currently open container. Only valid when [`Self::in_dead_region`]
    /// is `false`: every frame is then [`Frame::Real`].
    fn current_mut(&mut self) -> &mut Value {
        let mut v = &mut self.root;
        for frame in &self.path {
            let Frame::Real(component) = frame else {
                unreachable!("current_mut called while in a dead region")
            };
            v = match component {
                PathComponent::Index(i) => {
                    &mut v.as_array_mut().expect("frame says array")[*i]
                }
                PathComponent::Key(k) => v
                    .as_dict_mut()
                    .expect("frame says dict")
                    .get_mut(k)
                    .expect("key was just installed"),
            };
        }
        v
    }

    /// Places a freshly produced child `value` into whatever the current
    /// container/pending key names, honoring the duplicate-key policy.
    /// Returns the frame this child should push if it is itself a container
    /// (`Some`), or `None` if it is a scalar (nothing to push) — except on
    /// a [`DupKeyPolicy::Abort`] hit, which is signalled via the return's
    /// `u32` callback code instead.
    fn place(&mut self, value: Value) -> Result<Option<Frame>, u32> {
        if !self.have_root {
            self.have_root = true;
            self.root = value;
            return Ok(None);
        }
        if self.in_dead_region() {
            return Ok(Some(Frame::Dead));
        }

        match self.pending_key.take() {
            None => {
                let arr = self
                    .current_mut()
                    .as_array_mut()
                    .expect("unkeyed child outside an array frame");
                let idx = arr.len();
                arr.push(value);
                Ok(Some(Frame::Real(PathComponent::Index(idx))))
            }
            Some(key) => {
                let dict = self
                    .current_mut()
                    .as_dict_mut()
                    .expect("keyed child outside a dict frame");
                let (slot, is_new) = dict.get_or_add(&key);
                if is_new {
                    *slot = value;
                    return Ok(Some(Frame::Real(PathComponent::Key(key))));
                }
                match self.flags.dup_key_policy {
                    DupKeyPolicy::UseFirst => Ok(Some(Frame::Dead)),
                    DupKeyPolicy::UseLast => {
                        *slot = value;
                        Ok(Some(Frame::Real(PathComponent::Key(key))))
                    }
                    DupKeyPolicy::Abort => {
                        self.dup_key_hit = true;
                        Err(DUP_KEY_ABORT_CODE)
                    }
                }
            }
        }
    }

    fn scalar(&mut self, value: Value) -> u32 {
        match self.place(value) {
            Ok(_) => 0,
            Err(code) => code,
        }
    }

    fn open_container(&mut self, value: Value) -> u32 {
        match self.place(value) {
            Ok(frame) => {
                if let Some(frame) = frame {
                    self.path.push(frame);
                }
                0
            }
            Err(code) => code,
        }
    }
}

impl Callbacks for Dom {
    fn event(&mut self, event: Event<'_>) -> u32 {
        match event {
            Event::Key(bytes) => {
                self.pending_key = Some(BString::from(bytes.to_vec()));
                0
            }
            Event::ArrayEnd | Event::ObjectEnd => {
                self.path.pop();
                0
            }
            Event::ArrayBeg => self.open_container(Value::Array(Vec::new())),
            Event::ObjectBeg => {
                let maintain_order = self.flags.maintain_dict_order;
                self.open_container(Value::Dict(Dict::new(maintain_order)))
            }
            Event::Null => self.scalar(Value::Null),
            Event::True => self.scalar(Value::Bool(true)),
            Event::False => self.scalar(Value::Bool(false)),
            Event::String(bytes) => self.scalar(Value::String(BString::from(bytes.to_vec()))),
            Event::Number(digits) => self.scalar(classify_number(digits)),
        }
    }
}

fn classify_number(digits: &[u8]) -> Value {
    let class = number::classify(digits);
    match class.narrowest() {
        NarrowestWidth::I32 => Value::Int32(number::to_i32(digits)),
        NarrowestWidth::U32 => Value::UInt32(number::to_u32(digits)),
        NarrowestWidth::I64 => Value::Int64(number::to_i64(digits)),
        NarrowestWidth::U64 => Value::UInt64(number::to_u64(digits)),
        NarrowestWidth::Double => Value::Double(number::to_f64(digits)),
    }
}

/// Parses `input` with default resource limits, building a [`Value`] tree.
/// Convenience wrapper combining [`crate::parser::StreamingParser`] and
/// [`Dom`] for the common case; see `centijson-cli` for a streaming,
/// incremental-feed usage example.
pub fn parse(input: &[u8], config: crate::config::JsonConfig, flags: DomFlags) -> Result<Value, crate::error::ParserError> {
    let mut parser = crate::parser::StreamingParser::new(config);
    let mut dom = Dom::new(flags);
    if let Err(err) = parser.feed(input, &mut dom) {
        return Err(crate::error::ParserError::new(dom.take_dup_key_error(err.code), err.pos));
    }
    match parser.finish(&mut dom) {
        Ok(_) => Ok(dom.into_value()),
        Err(err) => Err(crate::error::ParserError::new(dom.take_dup_key_error(err.code), err.pos)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JsonConfig;
    use alloc::vec;

    fn build(input: &[u8], flags: DomFlags) -> Result<Value, ErrorCode> {
        parse(input, JsonConfig::default(), flags).map_err(|e| e.code)
    }

    #[test]
    fn builds_nested_array_and_object() {
        let v = build(br#"{"a": [1, 2, {"b": true}]}"#, DomFlags::default()).unwrap();
        let dict = v.as_dict().unwrap();
        let arr = dict.get(b"a").unwrap().as_array().unwrap();
        assert_eq!(arr[0], Value::Int32(1));
        assert_eq!(arr[1], Value::Int32(2));
        assert_eq!(arr[2].as_dict().unwrap().get(b"b").unwrap(), &Value::Bool(true));
    }

    #[test]
    fn root_scalar_builds_directly() {
        assert_eq!(build(b"42", DomFlags::default()).unwrap(), Value::Int32(42));
    }

    #[test]
    fn root_array_builds_directly() {
        let v = build(b"[1,2,3]", DomFlags::default()).unwrap();
        assert_eq!(
            v,
            Value::Array(vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)])
        );
    }

    #[test]
    fn duplicate_key_use_first_keeps_first_value() {
        let flags = DomFlags {
            dup_key_policy: DupKeyPolicy::UseFirst,
            ..DomFlags::default()
        };
        let v = build(br#"{"a": 1, "a": 2}"#, flags).unwrap();
        assert_eq!(v.as_dict().unwrap().get(b"a").unwrap(), &Value::Int32(1));
    }

    #[test]
    fn duplicate_key_use_first_discards_a_whole_container_value() {
        // The C source this is grounded on would underflow its path stack
        // here (it never pushes a frame for the discarded container's
        // ARRAY_BEG); Dom pushes Frame::Dead instead so the nested
        // ARRAY_END still has a frame to pop. See the module doc comment.
        let flags = DomFlags {
            dup_key_policy: DupKeyPolicy::UseFirst,
            ..DomFlags::default()
        };
        let v = build(br#"{"a": 1, "a": [1, [2, 3], {"x": 4}]}"#, flags).unwrap();
        assert_eq!(v.as_dict().unwrap().get(b"a").unwrap(), &Value::Int32(1));
        assert_eq!(v.as_dict().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_key_use_last_keeps_last_value() {
        let flags = DomFlags {
            dup_key_policy: DupKeyPolicy::UseLast,
            ..DomFlags::default()
        };
        let v = build(br#"{"a": 1, "a": 2}"#, flags).unwrap();
        assert_eq!(v.as_dict().unwrap().get(b"a").unwrap(), &Value::Int32(2));
    }

    #[test]
    fn duplicate_key_abort_reports_dup_key() {
        let flags = DomFlags {
            dup_key_policy: DupKeyPolicy::Abort,
            ..DomFlags::default()
        };
        let err = build(br#"{"a": 1, "a": 2}"#, flags).unwrap_err();
        assert_eq!(err, ErrorCode::DupKey);
    }

    #[test]
    fn maintain_dict_order_propagates_to_nested_dicts() {
        let flags = DomFlags {
            maintain_dict_order: true,
            ..DomFlags::default()
        };
        let v = build(br#"{"b": 1, "a": {"z": 1, "y": 2}}"#, flags).unwrap();
        let outer = v.as_dict().unwrap();
        assert!(outer.maintains_order());
        let inner = outer.get(b"a").unwrap().as_dict().unwrap();
        assert!(inner.maintains_order());
        let keys: Vec<_> = inner
            .keys(crate::dict::KeyOrder::Insertion)
            .map(|k| k.as_slice())
            .collect();
        assert_eq!(keys, vec![b"z".as_slice(), b"y"]);
    }

    #[test]
    fn numbers_narrow_to_expected_tags() {
        let v = build(
            b"[42, 4294967295, 9223372036854775807, 18446744073709551615, 1.5]",
            DomFlags::default(),
        )
        .unwrap();
        let arr = v.as_array().unwrap();
        assert_eq!(arr[0], Value::Int32(42));
        assert_eq!(arr[1], Value::UInt32(4_294_967_295));
        assert_eq!(arr[2], Value::Int64(i64::MAX));
        assert_eq!(arr[3], Value::UInt64(u64::MAX));
        assert_eq!(arr[4], Value::Double(1.5));
    }

    #[test]
    fn empty_array_and_object_round_trip() {
        let v = build(b"[[], {}]", DomFlags::default()).unwrap();
        let arr = v.as_array().unwrap();
        assert_eq!(arr[0], Value::Array(vec![]));
        assert_eq!(arr[1], Value::Dict(Dict::new(false)));
    }

    #[test]
    fn deeply_nested_containers_build_correctly() {
        let v = build(b"[[[[[1]]]]]", DomFlags::default()).unwrap();
        let mut cur = &v;
        for _ in 0..4 {
            cur = &cur.as_array().unwrap()[0];
        }
        assert_eq!(cur.as_array().unwrap()[0], Value::Int32(1));
    }
}
