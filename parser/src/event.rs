//! The structural events of a YAML stream.
//!
//! Events are what the [`Parser`] produces and what an emitter consumes. This module also holds
//! the fixed-arity constructors ([`make_scalar`], [`make_collection_start`], ...) that build a
//! complete event from explicit arguments.
//!
//! [`Parser`]: crate::Parser

use std::fmt;

use crate::scanner::ScalarStyle;

/// The handle `!!` resolves to when no `%TAG` directive overrides it.
pub const CORE_SCHEMA_PREFIX: &str = "tag:yaml.org,2002:";

/// The layout of a collection.
#[derive(Clone, Copy, PartialEq, Debug, Eq, Hash, Default)]
pub enum CollectionStyle {
    /// No layout was requested. The emitter decides (block, unless within a flow collection).
    #[default]
    Any,
    /// Indentation-delimited collection.
    Block,
    /// Bracket-delimited collection (`[...]` or `{...}`).
    Flow,
}

/// A YAML tag.
///
/// The handle is stored resolved: a tag written `!!str` has the handle `tag:yaml.org,2002:` and
/// the suffix `str`. Concatenating both yields the full tag.
#[derive(Clone, PartialEq, Debug, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    /// Handle of the tag (`!` included).
    pub handle: String,
    /// The suffix of the tag.
    pub suffix: String,
}

impl Tag {
    /// Create a tag from its resolved handle and its suffix.
    #[must_use]
    pub fn new(handle: impl Into<String>, suffix: impl Into<String>) -> Tag {
        Tag {
            handle: handle.into(),
            suffix: suffix.into(),
        }
    }

    /// Build a tag from the way it would be written in a document.
    ///
    /// `!!str` is resolved against the core schema, `!<...>` is taken verbatim, `!name!suffix`
    /// keeps its named handle and `!suffix` is a local tag. Text that does not start with `!` is
    /// taken as a full tag.
    ///
    /// ```
    /// # use yamlstream_parser::Tag;
    /// assert_eq!(Tag::parse("!!int"), Tag::new("tag:yaml.org,2002:", "int"));
    /// assert_eq!(Tag::parse("!local"), Tag::new("!", "local"));
    /// assert_eq!(Tag::parse("!<tag:x.org:y>"), Tag::new("", "tag:x.org:y"));
    /// ```
    #[must_use]
    pub fn parse(text: &str) -> Tag {
        if let Some(verbatim) = text.strip_prefix("!<").and_then(|s| s.strip_suffix('>')) {
            Tag::new("", verbatim)
        } else if let Some(suffix) = text.strip_prefix("!!") {
            Tag::new(CORE_SCHEMA_PREFIX, suffix)
        } else if text == "!" {
            Tag::new("", "!")
        } else if let Some(rest) = text.strip_prefix('!') {
            match rest.split_once('!') {
                Some((name, suffix))
                    if !name.is_empty()
                        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') =>
                {
                    Tag::new(format!("!{name}!"), suffix)
                }
                _ => Tag::new("!", rest),
            }
        } else {
            Tag::new("", text)
        }
    }

    /// Returns whether the tag is a YAML tag from the core schema (`!!str`, `!!int`, ...).
    #[must_use]
    pub fn is_yaml_core_schema(&self) -> bool {
        self.handle == CORE_SCHEMA_PREFIX
    }

    /// Returns whether the tag is the non-specific `!` tag.
    #[must_use]
    pub fn is_non_specific(&self) -> bool {
        self.handle.is_empty() && self.suffix == "!"
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.handle, self.suffix)
    }
}

/// A `%TAG` directive.
#[derive(Clone, PartialEq, Debug, Eq, Hash)]
pub struct TagDirective {
    /// The handle being declared (`!`, `!!` or `!name!`).
    pub handle: String,
    /// The prefix the handle expands to.
    pub prefix: String,
}

impl TagDirective {
    /// Create a directive declaring `handle` as a shorthand for `prefix`.
    #[must_use]
    pub fn new(handle: impl Into<String>, prefix: impl Into<String>) -> TagDirective {
        TagDirective {
            handle: handle.into(),
            prefix: prefix.into(),
        }
    }
}

/// An event in a YAML stream.
#[derive(Clone, PartialEq, Debug, Eq)]
pub enum Event {
    /// Event generated at the very beginning of parsing.
    StreamStart,
    /// Last event that will be generated by the parser. Signals EOF.
    StreamEnd,
    /// The start of a YAML document.
    DocumentStart {
        /// Whether the document has no `---` marker.
        implicit: bool,
        /// The `%YAML` directive of the document, if any.
        version: Option<(u32, u32)>,
        /// The `%TAG` directives written before the document, in order.
        tags: Vec<TagDirective>,
    },
    /// The end of a YAML document.
    DocumentEnd {
        /// Whether the document has no `...` marker.
        implicit: bool,
    },
    /// The start of a sequence.
    SequenceStart {
        /// Layout of the sequence.
        style: CollectionStyle,
        /// The anchor of the sequence, if any.
        anchor: Option<String>,
        /// The tag of the sequence, if any.
        tag: Option<Tag>,
    },
    /// The end of a sequence.
    SequenceEnd,
    /// The start of a mapping.
    MappingStart {
        /// Layout of the mapping.
        style: CollectionStyle,
        /// The anchor of the mapping, if any.
        anchor: Option<String>,
        /// The tag of the mapping, if any.
        tag: Option<Tag>,
    },
    /// The end of a mapping.
    MappingEnd,
    /// A value.
    Scalar {
        /// How the value is (to be) written.
        style: ScalarStyle,
        /// The value, with escapes resolved and lines folded.
        value: String,
        /// The anchor of the value, if any.
        anchor: Option<String>,
        /// The tag of the value, if any.
        tag: Option<Tag>,
    },
    /// Reference to an anchor.
    Alias {
        /// The name of the anchor referred to.
        anchor: String,
    },
}

/// The kind of an [`Event`], without its payload.
#[derive(Clone, Copy, PartialEq, Debug, Eq, Hash)]
pub enum EventKind {
    /// [`Event::StreamStart`].
    StreamStart,
    /// [`Event::StreamEnd`].
    StreamEnd,
    /// [`Event::DocumentStart`].
    DocumentStart,
    /// [`Event::DocumentEnd`].
    DocumentEnd,
    /// [`Event::SequenceStart`].
    SequenceStart,
    /// [`Event::SequenceEnd`].
    SequenceEnd,
    /// [`Event::MappingStart`].
    MappingStart,
    /// [`Event::MappingEnd`].
    MappingEnd,
    /// [`Event::Scalar`].
    Scalar,
    /// [`Event::Alias`].
    Alias,
}

/// The events that carry no payload.
#[derive(Clone, Copy, PartialEq, Debug, Eq, Hash)]
pub enum SimpleKind {
    /// [`Event::StreamStart`].
    StreamStart,
    /// [`Event::StreamEnd`].
    StreamEnd,
    /// [`Event::SequenceEnd`].
    SequenceEnd,
    /// [`Event::MappingEnd`].
    MappingEnd,
}

/// The two kinds of collections.
#[derive(Clone, Copy, PartialEq, Debug, Eq, Hash)]
pub enum CollectionKind {
    /// A sequence (`[a, b]`, `- a`).
    Sequence,
    /// A mapping (`{a: b}`, `a: b`).
    Mapping,
}

impl Event {
    /// Return the kind of the event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Event::StreamStart => EventKind::StreamStart,
            Event::StreamEnd => EventKind::StreamEnd,
            Event::DocumentStart { .. } => EventKind::DocumentStart,
            Event::DocumentEnd { .. } => EventKind::DocumentEnd,
            Event::SequenceStart { .. } => EventKind::SequenceStart,
            Event::SequenceEnd => EventKind::SequenceEnd,
            Event::MappingStart { .. } => EventKind::MappingStart,
            Event::MappingEnd => EventKind::MappingEnd,
            Event::Scalar { .. } => EventKind::Scalar,
            Event::Alias { .. } => EventKind::Alias,
        }
    }

    /// Return the anchor the event defines, if any.
    ///
    /// The target of an [`Event::Alias`] is not a definition and is not returned.
    #[must_use]
    pub fn anchor(&self) -> Option<&str> {
        match self {
            Event::SequenceStart { anchor, .. }
            | Event::MappingStart { anchor, .. }
            | Event::Scalar { anchor, .. } => anchor.as_deref(),
            _ => None,
        }
    }

    /// Return the tag of the node the event starts, if any.
    #[must_use]
    pub fn tag(&self) -> Option<&Tag> {
        match self {
            Event::SequenceStart { tag, .. }
            | Event::MappingStart { tag, .. }
            | Event::Scalar { tag, .. } => tag.as_ref(),
            _ => None,
        }
    }

    /// Return whether the event opens a sequence or a mapping.
    #[must_use]
    pub fn is_collection_start(&self) -> bool {
        matches!(self, Event::SequenceStart { .. } | Event::MappingStart { .. })
    }

    /// Return whether the event closes a sequence or a mapping.
    #[must_use]
    pub fn is_collection_end(&self) -> bool {
        matches!(self, Event::SequenceEnd | Event::MappingEnd)
    }

    /// Return whether the event is a complete node on its own (a scalar or an alias).
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Event::Scalar { .. } | Event::Alias { .. })
    }
}

/// Build a scalar event.
#[must_use]
pub fn make_scalar(
    style: ScalarStyle,
    value: impl Into<String>,
    anchor: Option<&str>,
    tag: Option<Tag>,
) -> Event {
    Event::Scalar {
        style,
        value: value.into(),
        anchor: anchor.map(ToOwned::to_owned),
        tag,
    }
}

/// Build a document start event.
#[must_use]
pub fn make_document_start(
    implicit: bool,
    version: Option<(u32, u32)>,
    tags: Vec<TagDirective>,
) -> Event {
    Event::DocumentStart {
        implicit,
        version,
        tags,
    }
}

/// Build a document end event.
#[must_use]
pub fn make_document_end(implicit: bool) -> Event {
    Event::DocumentEnd { implicit }
}

/// Build the start event of a sequence or a mapping.
#[must_use]
pub fn make_collection_start(
    kind: CollectionKind,
    style: CollectionStyle,
    anchor: Option<&str>,
    tag: Option<Tag>,
) -> Event {
    let anchor = anchor.map(ToOwned::to_owned);
    match kind {
        CollectionKind::Sequence => Event::SequenceStart { style, anchor, tag },
        CollectionKind::Mapping => Event::MappingStart { style, anchor, tag },
    }
}

/// Build an alias event referring to the anchor `target`.
#[must_use]
pub fn make_alias(target: &str) -> Event {
    Event::Alias {
        anchor: target.to_owned(),
    }
}

/// Build one of the events that carry no payload.
#[must_use]
pub fn make_simple(kind: SimpleKind) -> Event {
    match kind {
        SimpleKind::StreamStart => Event::StreamStart,
        SimpleKind::StreamEnd => Event::StreamEnd,
        SimpleKind::SequenceEnd => Event::SequenceEnd,
        SimpleKind::MappingEnd => Event::MappingEnd,
    }
}
