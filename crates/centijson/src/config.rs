//! Parser configuration: resource limits and behavior flags (spec.md §6).
//!
//! Mirrors the teacher's `ParserOptions` (plain `bool`/`usize` fields with a
//! `Default` impl) rather than reaching for a `bitflags` crate — nothing in
//! this workspace's dependency stack pulls one in, and the flag set is small
//! and fixed.

#![allow(clippy::struct_excessive_bools)]

/// Resource limits and root-type/UTF-8 policy flags for [`crate::parser::StreamingParser`].
///
/// All limits default to `0`, meaning unlimited, per spec.md §4.3/§6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsonConfig {
    /// Maximum total input length in bytes. `0` = unlimited.
    pub max_total_len: usize,
    /// Maximum total number of VALUE events (scalars plus container opens).
    /// `0` = unlimited.
    pub max_total_values: usize,
    /// Maximum nesting depth of arrays/objects. `0` = unlimited.
    pub max_nesting_level: usize,
    /// Maximum byte length of a single number literal. `0` = unlimited.
    pub max_number_len: usize,
    /// Maximum byte length of a single string value. `0` = unlimited.
    pub max_string_len: usize,
    /// Maximum byte length of a single object key. `0` = unlimited.
    pub max_key_len: usize,
    /// Root-type and UTF-8 repair policy flags.
    pub flags: ParserFlags,
}

/// Behavior flags from spec.md §6: which value types are forbidden at the
/// document root, and how ill-formed UTF-8 is handled in keys vs. values.
///
/// `fix_*` and `ignore_*` are mutually exclusive per field (key, value); if
/// both are set for the same field, `fix` wins, matching "repair before
/// discard" being the more conservative reading of an ambiguous combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParserFlags {
    /// `NONULLASROOT`: reject `null` as the document root.
    pub no_null_as_root: bool,
    /// `NOBOOLASROOT`: reject `true`/`false` as the document root.
    pub no_bool_as_root: bool,
    /// `NONUMBERASROOT`: reject a bare number as the document root.
    pub no_number_as_root: bool,
    /// `NOSTRINGASROOT`: reject a bare string as the document root.
    pub no_string_as_root: bool,
    /// `NOARRAYASROOT`: reject an array as the document root.
    pub no_array_as_root: bool,
    /// `NOOBJECTASROOT`: reject an object as the document root.
    pub no_object_as_root: bool,
    /// `IGNOREILLUTF8KEY`: pass ill-formed UTF-8 through unchanged in keys.
    pub ignore_ill_utf8_key: bool,
    /// `IGNOREILLUTF8VALUE`: pass ill-formed UTF-8 through unchanged in string values.
    pub ignore_ill_utf8_value: bool,
    /// `FIXILLUTF8KEY`: substitute U+FFFD for ill-formed UTF-8 in keys.
    pub fix_ill_utf8_key: bool,
    /// `FIXILLUTF8VALUE`: substitute U+FFFD for ill-formed UTF-8 in string values.
    pub fix_ill_utf8_value: bool,
}

impl ParserFlags {
    pub(crate) fn key_utf8_mode(self) -> crate::utf8::Utf8Mode {
        if self.fix_ill_utf8_key {
            crate::utf8::Utf8Mode::Fix
        } else if self.ignore_ill_utf8_key {
            crate::utf8::Utf8Mode::Ignore
        } else {
            crate::utf8::Utf8Mode::Strict
        }
    }

    pub(crate) fn value_utf8_mode(self) -> crate::utf8::Utf8Mode {
        if self.fix_ill_utf8_value {
            crate::utf8::Utf8Mode::Fix
        } else if self.ignore_ill_utf8_value {
            crate::utf8::Utf8Mode::Ignore
        } else {
            crate::utf8::Utf8Mode::Strict
        }
    }
}

/// Duplicate-key resolution policy for the DOM builder (spec.md §4.5/§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DupKeyPolicy {
    /// Keep the first value written for a key; later duplicates are dropped.
    #[default]
    UseFirst,
    /// Keep the last value written for a key; earlier duplicates are overwritten.
    UseLast,
    /// Treat a duplicate key as a fatal error ([`crate::error::ErrorCode::DupKey`]).
    Abort,
}

/// DOM-builder-level flags (spec.md §6), distinct from [`ParserFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DomFlags {
    /// `MAINTAINDICTORDER`: every [`crate::dict::Dict`] created by the DOM
    /// builder preserves insertion order in addition to its BST index.
    pub maintain_dict_order: bool,
    /// How to resolve a repeated key within one object literal.
    pub dup_key_policy: DupKeyPolicy,
}
