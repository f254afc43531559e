//! Table-driven tests for spec.md §8's six concrete seed scenarios, each
//! driven through the public `centijson` API rather than any internal
//! module, since these exercise the crate end to end (parser + DOM +
//! pointer).

use centijson::{
    Dict, DomFlags, DupKeyPolicy, ErrorCode, JsonConfig, ParserFlags, Value,
};
use rstest::rstest;

fn parse(input: &[u8], config: JsonConfig) -> Result<Value, ErrorCode> {
    centijson::dom::parse(input, config, DomFlags::default()).map_err(|e| e.code)
}

// Scenario 1: u64::MAX narrows to UINT64; one past it narrows to DOUBLE.
#[rstest]
#[case::u64_max(b"18446744073709551615", Value::UInt64(u64::MAX))]
fn narrows_u64_max_to_uint64(#[case] input: &[u8], #[case] expected: Value) {
    assert_eq!(parse(input, JsonConfig::default()).unwrap(), expected);
}

#[test]
fn one_past_u64_max_narrows_to_double_within_tolerance() {
    let Value::Double(d) = parse(b"18446744073709551616", JsonConfig::default()).unwrap() else {
        panic!("expected a Double");
    };
    let target = 18_446_744_073_709_551_616.0_f64;
    assert!((d - target).abs() / target < 0.0001);
}

// Scenario 2: duplicate-key policy resolution.
#[rstest]
#[case::use_first(DupKeyPolicy::UseFirst, Some(1))]
#[case::use_last(DupKeyPolicy::UseLast, Some(2))]
fn duplicate_key_policies_pick_the_right_value(
    #[case] policy: DupKeyPolicy,
    #[case] expected: Option<i32>,
) {
    let flags = DomFlags {
        dup_key_policy: policy,
        ..DomFlags::default()
    };
    let v = centijson::dom::parse(br#"{ "a": 1, "a": 2 }"#, JsonConfig::default(), flags).unwrap();
    assert_eq!(v.as_dict().unwrap().get(b"a").unwrap(), &Value::Int32(expected.unwrap()));
}

#[test]
fn duplicate_key_abort_reports_dupkey() {
    let flags = DomFlags {
        dup_key_policy: DupKeyPolicy::Abort,
        ..DomFlags::default()
    };
    let err = centijson::dom::parse(br#"{ "a": 1, "a": 2 }"#, JsonConfig::default(), flags).unwrap_err();
    assert_eq!(err.code, ErrorCode::DupKey);
}

// Scenario 3: surrogate pair decodes to the emoji; lone high surrogate is
// INVALIDUTF8 in strict mode and U+FFFD runs in fix mode.
#[test]
fn surrogate_pair_decodes_to_emoji_bytes() {
    let v = parse(br#""😀""#, JsonConfig::default()).unwrap();
    assert_eq!(v.as_str_bytes().unwrap().as_slice(), [0xF0, 0x9F, 0x98, 0x80]);
}

#[test]
fn lone_high_surrogate_is_invalid_utf8_in_strict_mode() {
    let err = parse(br#""\uD83D""#, JsonConfig::default()).unwrap_err();
    assert_eq!(err, ErrorCode::InvalidUtf8);
}

#[test]
fn lone_high_surrogate_becomes_replacement_runs_in_fix_mode() {
    let config = JsonConfig {
        flags: ParserFlags {
            fix_ill_utf8_value: true,
            ..ParserFlags::default()
        },
        ..JsonConfig::default()
    };
    let v = parse(br#""\uD83D""#, config).unwrap();
    assert_eq!(
        v.as_str_bytes().unwrap().as_slice(),
        [0xEF, 0xBF, 0xBD, 0xEF, 0xBF, 0xBD, 0xEF, 0xBF, 0xBD]
    );
}

// Scenario 4: truncated array reports at offset 5; value-count limit trips
// at the start of the excess value.
#[test]
fn truncated_array_reports_at_offset_5() {
    let err = parse(b"[1, 2", JsonConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        ErrorCode::ExpectedCommaOrCloser | ErrorCode::ExpectedValue
    ));
}

#[test]
fn max_total_values_trips_at_offset_7() {
    let config = JsonConfig {
        max_total_values: 3,
        ..JsonConfig::default()
    };
    let err = parse(b"[1, 2, 3]", config).unwrap_err();
    assert_eq!(err, ErrorCode::MaxTotalValues);
}

// Scenario 5: a missing colon reports EXPECTEDCOLON at offset 8, line 1,
// column 9.
#[test]
fn missing_colon_reports_expected_colon_at_offset_8() {
    let mut parser = centijson::StreamingParser::new(JsonConfig::default());
    struct NoOp;
    impl centijson::Callbacks for NoOp {
        fn event(&mut self, _event: centijson::Event<'_>) -> u32 {
            0
        }
    }
    let mut cb = NoOp;
    let err = parser.feed(br#"{ "key" }"#, &mut cb).unwrap_err();
    assert_eq!(err.code, ErrorCode::ExpectedColon);
    assert_eq!(err.pos.offset, 8);
    assert_eq!(err.pos.line, 1);
    assert_eq!(err.pos.column, 9);
}

// Scenario 6: pointer navigation and the dash-append extension.
#[test]
fn pointer_get_and_dash_append() {
    let mut dict = Dict::new(false);
    *dict.get_or_add(b"foo").0 = Value::Array(alloc_vec(["bar", "baz"]));
    let mut root = Value::Dict(dict);

    let got = centijson::pointer::get(&root, b"/foo/0").unwrap();
    assert_eq!(got.as_str_bytes().unwrap().as_slice(), b"bar");

    let added = centijson::pointer::add(&mut root, b"/foo/-").unwrap();
    assert!(added.is_null());
    assert_eq!(root.as_dict().unwrap().get(b"foo").unwrap().as_array().unwrap().len(), 3);
}

fn alloc_vec(strs: [&str; 2]) -> Vec<Value> {
    strs.iter()
        .map(|s| Value::String(bstr::BString::from(s.as_bytes().to_vec())))
        .collect()
}
