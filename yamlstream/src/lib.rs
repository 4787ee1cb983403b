// Copyright 2015, Yuheng Chen.
// Copyright 2023, Ethiraric.
// See the LICENSE file at the top-level directory of this distribution.

//! Streaming YAML 1.2 events, trees and emitters in pure Rust.
//!
//! This crate builds upon [`yamlstream_parser`], whose API it re-exports. It adds:
//!   - [`Node`]: the tree of a YAML document, with aliases sharing the node they refer to.
//!   - [`Composer`]: an [`EventReceiver`] building [`Node`]s out of events.
//!   - [`EventEmitter`]: a serializer fed with events, choosing scalar styles on its own.
//!   - [`NodeEmitter`]: a serializer for [`Node`] trees.
//!   - [`Schema`]: the rules giving a type (null, boolean, integer, float) to scalars.
//!
//! # Examples
//! Load a document, then serialize it back.
//!
//! ```
//! use yamlstream::{to_string, Node};
//!
//! let doc = Node::load_from_str("base: &b {x: 1}\nderived: *b").unwrap();
//! assert_eq!(doc.get("derived").and_then(|d| d.get("x")).and_then(Node::as_str), Some("1"));
//!
//! let output = to_string(&doc).unwrap();
//! assert_eq!(output, "---\nbase: &b {x: 1}\nderived: *b\n");
//! assert_eq!(Node::load_from_str(&output).unwrap(), doc);
//! ```
//!
//! Events can also be written directly, for instance from a [`Parser`]:
//!
//! ```
//! use yamlstream::{EventEmitter, Parser};
//!
//! let mut emitter = EventEmitter::new(vec![]);
//! for event in Parser::new_from_str("- 'null'\n- !!str 12") {
//!     emitter.emit(&event.unwrap().0).unwrap();
//! }
//! assert_eq!(emitter.into_inner(), b"- 'null'\n- !!str 12\n");
//! ```
//!
//! # Logging
//! Emitted events are logged at the `trace` level through the [`log`] crate, document starts and
//! failures at the `debug` level.

#![warn(missing_docs, clippy::pedantic)]

pub(crate) mod char_traits;
pub mod composer;
pub mod emitter;
pub mod node;
pub mod schema;

pub use yamlstream_parser::{
    make_alias, make_collection_start, make_document_end, make_document_start, make_scalar,
    make_simple, BufferedInput, CollectionKind, CollectionStyle, Control, Error, Event,
    EventKind, EventReceiver, Input, InputError, Key, Marker, Outcome, ParseError,
    ParseErrorKind, Parser, Path, PathEntry, ReadInput, ScalarStyle, ScanError, ScanErrorKind,
    SimpleKind, Span, SpannedEvent, StrInput, Tag, TagDirective, CORE_SCHEMA_PREFIX,
};

pub use crate::composer::{compose, compose_all, ComposeError, Composer};
pub use crate::emitter::{
    to_string, to_string_all, EmitError, EmitMode, EmitResult, EmitterConfig, EventEmitter,
    NodeEmitter,
};
pub use crate::node::{Alias, Mapping, Node, Scalar, Sequence};
pub use crate::schema::{ResolvedScalar, Schema};
