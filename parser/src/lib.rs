// Copyright 2015, Yuheng Chen.
// Copyright 2023, Ethiraric.
// See the LICENSE file at the top-level directory of this distribution.

//! Streaming YAML 1.2 event parser in pure Rust.
//!
//! This crate turns a stream of characters into a stream of YAML events (scalars, collection
//! boundaries, aliases, document boundaries). It does not build a tree; see the `yamlstream`
//! crate for that, and for emitting YAML back.
//!
//! # Usage
//! Events can be pulled:
//! ```
//! use yamlstream_parser::{Event, Parser};
//!
//! let mut scalars = vec![];
//! for event in Parser::new_from_str("[a, b]") {
//!     if let (Event::Scalar { value, .. }, _) = event.unwrap() {
//!         scalars.push(value);
//!     }
//! }
//! assert_eq!(scalars, ["a", "b"]);
//! ```
//!
//! Or pushed to an [`EventReceiver`], which steers the parse with a [`Control`]:
//! ```
//! use yamlstream_parser::{Control, Event, Outcome, Parser, Path, Span};
//!
//! let mut seen = 0;
//! let outcome = Parser::new_from_str("big: [1, 2, 3]\nsmall: 4")
//!     .load(&mut |ev: &Event, _: Span, _: &Path| {
//!         seen += 1;
//!         if matches!(ev, Event::SequenceStart { .. }) {
//!             Control::SkipSubtree
//!         } else {
//!             Control::Continue
//!         }
//!     })
//!     .unwrap();
//! assert_eq!(outcome, Outcome::Completed);
//! // Stream, document and mapping starts and ends, "big", `[`, "small" and "4".
//! assert_eq!(seen, 10);
//! ```
//!
//! # Logging
//! Document boundaries and failures are logged at the `debug` level through the [`log`] crate.
//! Every token and event is logged at the `trace` level.

#![warn(missing_docs, clippy::pedantic)]

mod char_traits;
mod error;
mod event;
pub mod input;
mod parser;
pub mod path;
mod scanner;

pub use crate::error::{Error, ParseError, ParseErrorKind};
pub use crate::event::{
    make_alias, make_collection_start, make_document_end, make_document_start, make_scalar,
    make_simple, CollectionKind, CollectionStyle, Event, EventKind, SimpleKind, Tag, TagDirective,
    CORE_SCHEMA_PREFIX,
};
pub use crate::input::{str::StrInput, BufferedInput, Input, InputError, ReadInput};
pub use crate::parser::{Control, EventReceiver, Outcome, Parser, SpannedEvent};
pub use crate::path::{Key, Path, PathEntry};
pub use crate::scanner::{
    Marker, ScalarStyle, ScanError, ScanErrorKind, Scanner, Span, Token, TokenType,
};
