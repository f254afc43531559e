//! Generative tests for the invariants spec.md §8 calls out by name:
//! chunking independence, the parse/serialize round-trip, and numeric
//! narrowing.

use centijson::{DomFlags, ErrorCode, JsonConfig, NarrowestWidth, Value};
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

/// A syntactically valid JSON text, generated recursively with a bounded
/// depth so `quickcheck` never builds an unbounded tree.
#[derive(Clone, Debug)]
struct JsonText(Vec<u8>);

impl Arbitrary for JsonText {
    fn arbitrary(g: &mut Gen) -> Self {
        JsonText(gen_value(g, 3))
    }
}

fn gen_value(g: &mut Gen, depth: u32) -> Vec<u8> {
    let ceiling: u8 = if depth == 0 { 4 } else { 6 };
    match u8::arbitrary(g) % ceiling {
        0 => b"null".to_vec(),
        1 => b"true".to_vec(),
        2 => b"false".to_vec(),
        3 => i32::arbitrary(g).to_string().into_bytes(),
        4 => {
            let mut out = b"\"".to_vec();
            let len = usize::arbitrary(g) % 6;
            for _ in 0..len {
                out.push(b'a' + (u8::arbitrary(g) % 26));
            }
            out.push(b'"');
            out
        }
        5 => {
            let len = usize::arbitrary(g) % 4;
            let mut out = b"[".to_vec();
            for i in 0..len {
                if i > 0 {
                    out.push(b',');
                }
                out.extend(gen_value(g, depth - 1));
            }
            out.push(b']');
            out
        }
        _ => {
            let len = usize::arbitrary(g) % 4;
            let mut out = b"{".to_vec();
            for i in 0..len {
                if i > 0 {
                    out.push(b',');
                }
                out.push(b'"');
                out.push(b'a' + (i as u8 % 26));
                out.push(b'"');
                out.push(b':');
                out.extend(gen_value(g, depth - 1));
            }
            out.push(b'}');
            out
        }
    }
}

fn parse(input: &[u8]) -> Result<Value, ErrorCode> {
    centijson::dom::parse(input, JsonConfig::default(), DomFlags::default()).map_err(|e| e.code)
}

/// spec.md §8: "for every input I and every partition P of I into
/// sub-chunks, `parse(I) == foreach chunk in P: feed(chunk); finish()`".
/// Every generated `JsonText` is fed one byte at a time here — the
/// strictest possible partition.
#[quickcheck]
fn chunking_independence_holds_byte_at_a_time(text: JsonText) -> bool {
    let whole = parse(&text.0);

    struct NoOp;
    impl centijson::Callbacks for NoOp {
        fn event(&mut self, _event: centijson::Event<'_>) -> u32 {
            0
        }
    }
    let mut parser = centijson::StreamingParser::new(JsonConfig::default());
    let mut cb = NoOp;
    let mut chunked_err = None;
    for &byte in &text.0 {
        if let Err(err) = parser.feed(&[byte], &mut cb) {
            chunked_err = Some(err.code);
            break;
        }
    }
    let chunked = match chunked_err {
        Some(code) => Err(code),
        None => match parser.finish(&mut cb) {
            Ok(_) => Ok(()),
            Err(err) => Err(err.code),
        },
    };

    match (&whole, &chunked) {
        (Ok(_), Ok(())) => true,
        (Err(a), Err(b)) => a == b,
        _ => false,
    }
}

/// spec.md §8: "`parse(serialize(V)) ≡ V` for any V produced by the
/// parser".
#[quickcheck]
fn round_trip_through_serializer(text: JsonText) -> bool {
    let Ok(original) = parse(&text.0) else {
        return true; // generator occasionally emits something the parser rejects (e.g. leading-zero numbers); not this property's concern.
    };
    let bytes = centijson::serializer::to_vec(&original, centijson::SerializeOptions::default());
    let reparsed = parse(&bytes).expect("serializer output must itself be valid JSON");
    reparsed == original
}

/// spec.md §8: "any literal L satisfies
/// `tag(parse(L)) = min{T ∈ [I32,U32,I64,U64,F64] : L ∈ T}`".
#[quickcheck]
fn integer_literals_narrow_to_the_minimal_fitting_width(n: i64) -> bool {
    let digits = n.to_string();
    let class = centijson::number::classify(digits.as_bytes());
    let expected = if n >= i64::from(i32::MIN) && n <= i64::from(i32::MAX) {
        NarrowestWidth::I32
    } else if n >= 0 && n <= i64::from(u32::MAX) {
        NarrowestWidth::U32
    } else {
        NarrowestWidth::I64
    };
    class.narrowest() == expected
}

#[quickcheck]
fn unsigned_literals_at_or_above_i64_max_skip_to_u64_or_double(n: u64) -> bool {
    let digits = n.to_string();
    let class = centijson::number::classify(digits.as_bytes());
    if n <= i64::MAX as u64 {
        return true; // covered by the signed property above via a different code path
    }
    class.narrowest() == NarrowestWidth::U64
}

/// Every `JsonText` the generator above produces is, by construction,
/// well-formed RFC 8259 JSON; `serde_json` serves as an independent oracle
/// that confirms the generator isn't quietly producing something only
/// `centijson` happens to accept.
#[quickcheck]
fn generated_text_is_well_formed_per_an_independent_parser(text: JsonText) -> bool {
    serde_json::from_slice::<serde_json::Value>(&text.0).is_ok() == parse(&text.0).is_ok()
}
