//! A streaming, byte-oriented JSON parser, in-memory value tree, JSON
//! Pointer resolver, and serializer — an idiomatic Rust rendition of the
//! `centijson` C library's object model and callback-driven parsing
//! strategy.
//!
//! The entry points are [`StreamingParser`] (feed it bytes, implement
//! [`Callbacks`] to receive [`Event`]s) and [`dom::parse`] (build a
//! [`Value`] tree directly). Everything downstream of parsing —
//! [`pointer`] navigation and [`serializer`] output — operates on
//! [`Value`].

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod config;
pub mod dict;
pub mod dom;
pub mod error;
pub mod number;
pub mod parser;
pub mod pointer;
pub mod pos;
pub mod serializer;
pub mod utf8;
pub mod value;

pub use config::{DomFlags, DupKeyPolicy, JsonConfig, ParserFlags};
pub use dict::{Dict, KeyOrder};
pub use dom::Dom;
pub use error::{ErrorCode, ParserError};
pub use number::{NarrowestWidth, NumberClass};
pub use parser::{Callbacks, Event, StreamingParser};
pub use pos::JsonInputPos;
pub use serializer::{DictOrder, Layout, SerializeOptions, Sink};
pub use utf8::Utf8Mode;
pub use value::Value;
