//! Snapshot tests for the serializer's two output layouts (spec.md §4.8).
//!
//! Kept deliberately small and flat: `insta`'s inline-snapshot dedent logic
//! interacts awkwardly with tab-indented multi-line output, so these stick
//! to single-line (minimized) or single-level (pretty) trees where the
//! expected text is unambiguous.

use bstr::BString;
use centijson::{Dict, Layout, SerializeOptions, Value};

fn sample_dict() -> Value {
    let mut d = Dict::new(false);
    *d.get_or_add(b"a").0 = Value::Int32(1);
    *d.get_or_add(b"b").0 = Value::Array(vec![Value::Bool(true), Value::Null]);
    Value::Dict(d)
}

#[test]
fn minimized_object_snapshot() {
    let out = centijson::serializer::to_vec(
        &sample_dict(),
        SerializeOptions {
            layout: Layout::Minimize,
            ..SerializeOptions::default()
        },
    );
    let text = core::str::from_utf8(&out).unwrap();
    insta::assert_snapshot!(text, @r#"{"a":1,"b":[true,null]}"#);
}

#[test]
fn pretty_single_level_array_snapshot() {
    let v = Value::Array(vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)]);
    let out = centijson::serializer::to_vec(&v, SerializeOptions::default());
    let text = core::str::from_utf8(&out).unwrap();
    insta::assert_snapshot!(text, @"[
\t1,
\t2,
\t3
]");
}

#[test]
fn pretty_string_with_escapes_snapshot() {
    let v = Value::String(BString::from(b"line1\nline2\t\"quoted\"".to_vec()));
    let out = centijson::serializer::to_vec(&v, SerializeOptions::default());
    let text = core::str::from_utf8(&out).unwrap();
    insta::assert_snapshot!(text, @r#""line1\nline2\t\"quoted\"""#);
}
