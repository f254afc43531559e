//! JSON Pointer (C7): RFC 6901 navigation and creation over a [`Value`] tree,
//! with the negative-index extension from spec.md §4.7.
//!
//! Grounded on `original_source/src/json-ptr.c`'s `json_ptr_impl`, which this
//! module follows token-for-token: a pointer is split on `/`, each token is
//! classified once as "array index" or "object key", and is-new state only
//! survives from one freshly-created parent to the next — so a failed
//! `add` can leave some intermediate containers behind, exactly as the C
//! version documents.

use alloc::vec::Vec;

use bstr::BString;

use crate::dict::Dict;
use crate::value::Value;

/// Which operation [`resolve`] performs. `Get` is handled separately by
/// [`get_impl`], which never needs a `&mut` walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    GetOrAdd,
}

/// A single decoded pointer token: either an array index or an object key.
enum Token<'a> {
    Index(usize),
    Key(BString),
    /// Borrowed form of `Key`, used when the token needs no `~0`/`~1`
    /// unescaping (the common case, avoiding an allocation).
    KeyBorrowed(&'a [u8]),
}

fn decode_key(tok: &[u8]) -> Option<BString> {
    let mut out = Vec::with_capacity(tok.len());
    let mut i = 0;
    while i < tok.len() {
        if tok[i] == b'~' {
            match tok.get(i + 1) {
                Some(b'0') => out.push(b'~'),
                Some(b'1') => out.push(b'/'),
                _ => return None,
            }
            i += 2;
        } else {
            out.push(tok[i]);
            i += 1;
        }
    }
    Some(BString::from(out))
}

fn classify_token(tok: &[u8], array_size: usize) -> Option<Token<'_>> {
    if tok == b"-" {
        return Some(Token::Index(array_size));
    }

    let (neg, digits) = match tok.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, tok),
    };
    let numeric = !digits.is_empty()
        && digits.iter().all(u8::is_ascii_digit)
        && !(digits[0] == b'0' && digits.len() > 1);

    if numeric {
        let mut n: usize = 0;
        for &b in digits {
            n = n.checked_mul(10)?.checked_add(usize::from(b - b'0'))?;
        }
        if neg {
            // spec.md §4.7 rule 2: "-0 is the last element, -1 is the one
            // before, and so on" — offset-from-end, zero-based. (§8's
            // shorthand "index = size-n" is off by one against this prose;
            // the rule text is the defining statement, see DESIGN.md.)
            let index = array_size.checked_sub(1)?.checked_sub(n)?;
            return Some(Token::Index(index));
        }
        return Some(Token::Index(n));
    }

    if tok.contains(&b'~') {
        decode_key(tok).map(Token::Key)
    } else {
        Some(Token::KeyBorrowed(tok))
    }
}

/// Splits a pointer (without its leading `/`, already stripped) into its
/// `/`-separated raw token byte slices.
fn split_tokens(pointer: &[u8]) -> impl Iterator<Item = &[u8]> {
    pointer.split(|&b| b == b'/')
}

fn resolve<'v>(root: &'v mut Value, pointer: &[u8], op: Op) -> Option<&'v mut Value> {
    if pointer.is_empty() {
        return match op {
            Op::Add => None,
            Op::GetOrAdd => Some(root),
        };
    }

    let pointer = pointer.strip_prefix(b"/").unwrap_or(pointer);

    let mut v = root;
    let mut is_new = false;

    for tok in split_tokens(pointer) {
        let array_size = v.as_array().map_or(0, Vec::len);
        let token = classify_token(tok, array_size)?;

        v = match token {
            Token::Index(index) => {
                if is_new {
                    *v = Value::Array(Vec::new());
                }
                let arr = v.as_array_mut()?;
                if index < arr.len() {
                    is_new = false;
                    &mut arr[index]
                } else if index == arr.len() {
                    arr.push(Value::Null);
                    is_new = true;
                    arr.last_mut().expect("just pushed")
                } else {
                    return None;
                }
            }
            Token::Key(key) => {
                if is_new {
                    *v = Value::Dict(Dict::new(false));
                }
                let dict = v.as_dict_mut()?;
                let (slot, fresh) = dict.get_or_add(&key);
                is_new = fresh;
                slot
            }
            Token::KeyBorrowed(key) => {
                if is_new {
                    *v = Value::Dict(Dict::new(false));
                }
                let dict = v.as_dict_mut()?;
                let (slot, fresh) = dict.get_or_add(key);
                is_new = fresh;
                slot
            }
        };
    }

    if op == Op::Add && !is_new {
        return None;
    }

    Some(v)
}

/// Resolves `pointer` against `root`, never modifying the tree.
///
/// Returns `None` if the pointer does not refer to an existing value — a
/// missing key, an out-of-range index, or a container-shape mismatch
/// (spec.md §4.7 rule 1: a digit-string token is always an array index,
/// even against an object whose literal key happens to match).
#[must_use]
pub fn get<'v>(root: &'v Value, pointer: &[u8]) -> Option<&'v Value> {
    get_impl(root, pointer)
}

fn get_impl<'v>(root: &'v Value, pointer: &[u8]) -> Option<&'v Value> {
    if pointer.is_empty() {
        return Some(root);
    }
    let pointer = pointer.strip_prefix(b"/").unwrap_or(pointer);
    let mut v = root;
    for tok in split_tokens(pointer) {
        let array_size = v.as_array().map_or(0, Vec::len);
        match classify_token(tok, array_size)? {
            Token::Index(index) => {
                v = v.as_array()?.get(index)?;
            }
            Token::Key(key) => {
                v = v.as_dict()?.get(&key)?;
            }
            Token::KeyBorrowed(key) => {
                v = v.as_dict()?.get(key)?;
            }
        }
    }
    Some(v)
}

/// Adds a new `Value::Null` at `pointer`, auto-creating intermediate arrays
/// and objects as the pointer's tokens demand.
///
/// Returns `None` if the value already exists, the pointer is empty (the
/// root cannot be added), or any token contradicts the shape of an existing
/// container along the path. Some intermediate containers may have been
/// created even on failure, matching `original_source`'s documented
/// behavior.
pub fn add<'v>(root: &'v mut Value, pointer: &[u8]) -> Option<&'v mut Value> {
    resolve(root, pointer, Op::Add)
}

/// Resolves `pointer`, creating a new `Value::Null` (and any missing
/// intermediate containers) if it does not already exist.
///
/// Unlike [`add`], this never fails merely because the value already
/// existed — it returns the existing value in that case.
pub fn get_or_add<'v>(root: &'v mut Value, pointer: &[u8]) -> Option<&'v mut Value> {
    resolve(root, pointer, Op::GetOrAdd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn sample() -> Value {
        let mut dict = Dict::new(false);
        *dict.get_or_add(b"foo").0 = Value::Array(vec![
            Value::String(BString::from("bar")),
            Value::String(BString::from("baz")),
        ]);
        Value::Dict(dict)
    }

    #[test]
    fn get_array_element_by_index() {
        let root = sample();
        let v = get(&root, b"/foo/0").unwrap();
        assert_eq!(v.as_str_bytes().unwrap().as_slice(), b"bar");
    }

    #[test]
    fn get_negative_zero_is_last_element() {
        // spec.md §4.7 rule 2: "-0 is the last element".
        let root = sample();
        let v = get(&root, b"/foo/-0").unwrap();
        assert_eq!(v.as_str_bytes().unwrap().as_slice(), b"baz");
    }

    #[test]
    fn get_negative_one_is_one_before_last() {
        // spec.md §4.7 rule 2: "-1 is the one before" -0.
        let root = sample();
        let v = get(&root, b"/foo/-1").unwrap();
        assert_eq!(v.as_str_bytes().unwrap().as_slice(), b"bar");
    }

    #[test]
    fn negative_index_past_first_element_is_out_of_range() {
        let root = sample();
        assert!(get(&root, b"/foo/-2").is_none());
    }

    #[test]
    fn add_dash_appends_new_null_slot() {
        let mut root = sample();
        let v = add(&mut root, b"/foo/-").unwrap();
        assert!(v.is_null());
        assert_eq!(get(&root, b"/foo").unwrap().as_array().unwrap().len(), 3);
    }

    #[test]
    fn add_fails_if_value_already_exists() {
        let mut root = sample();
        assert!(add(&mut root, b"/foo/0").is_none());
    }

    #[test]
    fn get_or_add_creates_missing_intermediate_containers() {
        let mut root = Value::Dict(Dict::new(false));
        let v = get_or_add(&mut root, b"/a/b/0").unwrap();
        assert!(v.is_null());
        *v = Value::Int32(7);
        assert_eq!(
            get(&root, b"/a/b/0").unwrap(),
            &Value::Int32(7)
        );
    }

    #[test]
    fn digit_string_key_against_object_never_matches() {
        // spec.md §4.7 rule 1: digit tokens are always array indices.
        let mut dict = Dict::new(false);
        *dict.get_or_add(b"0").0 = Value::Int32(99);
        let root = Value::Dict(dict);
        assert!(get(&root, b"/0").is_none());
    }

    #[test]
    fn empty_pointer_refers_to_root() {
        let root = sample();
        assert!(get(&root, b"").unwrap().is_dict());
    }

    #[test]
    fn add_empty_pointer_always_fails() {
        let mut root = sample();
        assert!(add(&mut root, b"").is_none());
    }

    #[test]
    fn tilde_escapes_are_decoded() {
        let mut dict = Dict::new(false);
        *dict.get_or_add(b"a/b").0 = Value::Int32(1);
        *dict.get_or_add(b"c~d").0 = Value::Int32(2);
        let root = Value::Dict(dict);
        assert_eq!(get(&root, b"/a~1b").unwrap(), &Value::Int32(1));
        assert_eq!(get(&root, b"/c~0d").unwrap(), &Value::Int32(2));
    }
}
