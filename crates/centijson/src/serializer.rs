//! The serializer (C8): writes a [`Value`] tree out as JSON bytes.
//!
//! spec.md §4.8/§6 specify the contract at the level of a sink callback
//! rather than a concrete writer type (mirroring the parser's own
//! `Callbacks` trait), with two concrete output shapes (pretty, one member
//! per line with tab indentation, and `MINIMIZE`, no whitespace at all) and
//! a dict-ordering choice independent of either. Number formatting goes
//! through `crate::number`'s classifier in reverse: every integer tag is
//! printed with plain decimal digits, and `f64`/`f32` go through Rust's
//! `ryu`-free `Display`, which already produces the shortest decimal that
//! round-trips (the same guarantee spec.md §4.8 asks for).

use alloc::format;
use alloc::vec::Vec;

use bstr::ByteSlice;

use crate::dict::KeyOrder;
use crate::value::Value;

/// How a [`Dict`](crate::dict::Dict)'s members are ordered in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DictOrder {
    /// Byte-lexicographic by key.
    #[default]
    Sorted,
    /// Insertion order, for dicts that maintain one; falls back to
    /// [`DictOrder::Sorted`] otherwise.
    PreferInsertion,
}

/// Output shape: pretty (one member per line, tab-indented) or minimized
/// (no whitespace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// One member per line, a single tab per nesting level, `": "` between
    /// key and value.
    #[default]
    Pretty,
    /// No whitespace whatsoever.
    Minimize,
}

/// Serializer options (spec.md §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SerializeOptions {
    /// Pretty vs. minimized output.
    pub layout: Layout,
    /// Dict member ordering.
    pub dict_order: DictOrder,
}

/// A write sink. Returning `Err` aborts serialization immediately — the
/// same "non-zero aborts" contract spec.md §4.8 specifies for the C
/// callback, expressed as a fallible closure.
pub trait Sink {
    /// The error type propagated out of [`write`] on abort.
    type Error;

    /// Writes a chunk of output bytes.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

impl<F, E> Sink for F
where
    F: FnMut(&[u8]) -> Result<(), E>,
{
    type Error = E;

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), E> {
        self(bytes)
    }
}

/// Serializes `value` to `sink` per `opts`.
pub fn write<S: Sink>(value: &Value, opts: SerializeOptions, sink: &mut S) -> Result<(), S::Error> {
    let mut w = Writer { sink, opts, depth: 0 };
    w.write_value(value)
}

/// Convenience: serializes to an owned byte buffer.
#[must_use]
pub fn to_vec(value: &Value, opts: SerializeOptions) -> Vec<u8> {
    let mut buf = Vec::new();
    let _: Result<(), core::convert::Infallible> = write(value, opts, &mut |bytes: &[u8]| {
        buf.extend_from_slice(bytes);
        Ok(())
    });
    buf
}

struct Writer<'s, S: Sink> {
    sink: &'s mut S,
    opts: SerializeOptions,
    depth: usize,
}

impl<'s, S: Sink> Writer<'s, S> {
    fn raw(&mut self, bytes: &[u8]) -> Result<(), S::Error> {
        self.sink.write_bytes(bytes)
    }

    fn indent(&mut self) -> Result<(), S::Error> {
        if self.opts.layout == Layout::Pretty {
            for _ in 0..self.depth {
                self.raw(b"\t")?;
            }
        }
        Ok(())
    }

    fn newline(&mut self) -> Result<(), S::Error> {
        if self.opts.layout == Layout::Pretty {
            self.raw(b"\n")?;
        }
        Ok(())
    }

    fn write_value(&mut self, value: &Value) -> Result<(), S::Error> {
        match value {
            Value::Null => self.raw(b"null"),
            Value::Bool(true) => self.raw(b"true"),
            Value::Bool(false) => self.raw(b"false"),
            Value::Int32(n) => self.raw(format!("{n}").as_bytes()),
            Value::UInt32(n) => self.raw(format!("{n}").as_bytes()),
            Value::Int64(n) => self.raw(format!("{n}").as_bytes()),
            Value::UInt64(n) => self.raw(format!("{n}").as_bytes()),
            Value::Float(n) => self.write_float(f64::from(*n)),
            Value::Double(n) => self.write_float(*n),
            Value::String(s) => self.write_string(s.as_bytes()),
            Value::Array(items) => self.write_array(items),
            Value::Dict(dict) => self.write_dict(dict),
        }
    }

    fn write_float(&mut self, n: f64) -> Result<(), S::Error> {
        if n.is_nan() || n.is_infinite() {
            // Not representable in JSON; spec.md leaves this case to the
            // caller (the parser itself never produces NaN/Infinity), but
            // `null` is the least-surprising fallback rather than emitting
            // invalid JSON.
            return self.raw(b"null");
        }
        // `{:?}` on f64 always prints a decimal point or exponent, so the
        // result is never misread as an integer tag on re-parse, and Rust's
        // float formatter already produces the shortest string that
        // round-trips exactly — the guarantee spec.md §4.8 asks for.
        let formatted = format!("{n:?}");
        self.raw(formatted.as_bytes())
    }

    fn write_string(&mut self, bytes: &[u8]) -> Result<(), S::Error> {
        self.raw(b"\"")?;
        let mut start = 0;
        for (i, &b) in bytes.iter().enumerate() {
            let escape: Option<&[u8]> = match b {
                b'"' => Some(b"\\\""),
                b'\\' => Some(b"\\\\"),
                0x08 => Some(b"\\b"),
                0x0C => Some(b"\\f"),
                b'\n' => Some(b"\\n"),
                b'\r' => Some(b"\\r"),
                b'\t' => Some(b"\\t"),
                0x00..=0x1F => None, // handled below via \u00XX
                _ => continue,
            };
            if i > start {
                self.raw(&bytes[start..i])?;
            }
            if let Some(escape) = escape {
                self.raw(escape)?;
            } else {
                self.raw(format!("\\u{b:04x}").as_bytes())?;
            }
            start = i + 1;
        }
        if start < bytes.len() {
            self.raw(&bytes[start..])?;
        }
        self.raw(b"\"")
    }

    fn write_array(&mut self, items: &[Value]) -> Result<(), S::Error> {
        if items.is_empty() {
            return self.raw(b"[]");
        }
        self.raw(b"[")?;
        self.newline()?;
        self.depth += 1;
        for (i, item) in items.iter().enumerate() {
            self.indent()?;
            self.write_value(item)?;
            if i + 1 < items.len() {
                self.raw(b",")?;
            }
            self.newline()?;
        }
        self.depth -= 1;
        self.indent()?;
        self.raw(b"]")
    }

    fn write_dict(&mut self, dict: &crate::dict::Dict) -> Result<(), S::Error> {
        if dict.is_empty() {
            return self.raw(b"{}");
        }
        let order = match self.opts.dict_order {
            DictOrder::Sorted => KeyOrder::Sorted,
            DictOrder::PreferInsertion if dict.maintains_order() => KeyOrder::Insertion,
            DictOrder::PreferInsertion => KeyOrder::Sorted,
        };
        self.raw(b"{")?;
        self.newline()?;
        self.depth += 1;
        let len = dict.len();
        for (i, (key, value)) in dict.iter(order).enumerate() {
            self.indent()?;
            self.write_string(key.as_bytes())?;
            self.raw(b":")?;
            if self.opts.layout == Layout::Pretty {
                self.raw(b" ")?;
            }
            self.write_value(value)?;
            if i + 1 < len {
                self.raw(b",")?;
            }
            self.newline()?;
        }
        self.depth -= 1;
        self.indent()?;
        self.raw(b"}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::Dict;
    use alloc::vec;
    use bstr::BString;

    #[test]
    fn minimize_has_no_whitespace() {
        let v = Value::Array(vec![Value::Int32(1), Value::Int32(2)]);
        let out = to_vec(
            &v,
            SerializeOptions {
                layout: Layout::Minimize,
                dict_order: DictOrder::Sorted,
            },
        );
        assert_eq!(out, b"[1,2]");
    }

    #[test]
    fn pretty_indents_with_tabs() {
        let v = Value::Array(vec![Value::Int32(1)]);
        let out = to_vec(&v, SerializeOptions::default());
        assert_eq!(out, b"[\n\t1\n]");
    }

    #[test]
    fn empty_containers_have_no_interior_whitespace() {
        assert_eq!(to_vec(&Value::Array(vec![]), SerializeOptions::default()), b"[]");
        assert_eq!(
            to_vec(&Value::Dict(Dict::new(false)), SerializeOptions::default()),
            b"{}"
        );
    }

    #[test]
    fn string_escapes_control_and_quote_and_backslash() {
        let v = Value::String(BString::from(b"a\"b\\c\x01d".to_vec()));
        let out = to_vec(&v, SerializeOptions::default());
        assert_eq!(out, b"\"a\\\"b\\\\c\\u0001d\"");
    }

    #[test]
    fn dict_sorted_order_by_default() {
        let mut d = Dict::new(false);
        *d.get_or_add(b"b").0 = Value::Int32(2);
        *d.get_or_add(b"a").0 = Value::Int32(1);
        let out = to_vec(
            &Value::Dict(d),
            SerializeOptions {
                layout: Layout::Minimize,
                dict_order: DictOrder::Sorted,
            },
        );
        assert_eq!(out, b"{\"a\":1,\"b\":2}");
    }

    #[test]
    fn dict_prefers_insertion_order_when_available() {
        let mut d = Dict::new(true);
        *d.get_or_add(b"b").0 = Value::Int32(2);
        *d.get_or_add(b"a").0 = Value::Int32(1);
        let out = to_vec(
            &Value::Dict(d),
            SerializeOptions {
                layout: Layout::Minimize,
                dict_order: DictOrder::PreferInsertion,
            },
        );
        assert_eq!(out, b"{\"b\":2,\"a\":1}");
    }

    #[test]
    fn double_round_trips_with_enough_digits() {
        let v = Value::Double(0.1 + 0.2);
        let out = to_vec(&v, SerializeOptions::default());
        let s = core::str::from_utf8(&out).unwrap();
        let parsed: f64 = s.parse().unwrap();
        assert_eq!(parsed, 0.1 + 0.2);
    }
}
