//! Folding of an event stream into [`Node`] trees.

use std::{collections::HashMap, rc::Rc};

use thiserror::Error;
use yamlstream_parser::{
    Control, Error, Event, EventReceiver, Marker, ParseError, ParseErrorKind, Path, Span,
};

use crate::node::{Alias, Mapping, Node, Scalar, Sequence};

/// An error when composing documents.
#[derive(Clone, PartialEq, Debug, Error)]
pub enum ComposeError {
    /// The parser failed to read the input.
    #[error(transparent)]
    Parse(#[from] Error),
    /// The events do not describe a well-formed tree: unbalanced collections, an alias to an
    /// unknown anchor or no document at all.
    #[error(transparent)]
    Structure(ParseError),
}

impl ComposeError {
    fn structure(kind: ParseErrorKind, mark: Marker, info: impl Into<String>) -> ComposeError {
        ComposeError::Structure(ParseError::new(kind, mark, info))
    }

    pub(crate) fn no_document() -> ComposeError {
        Self::structure(
            ParseErrorKind::UnexpectedToken,
            Marker::default(),
            "the input holds no document",
        )
    }
}

/// A collection whose end event has not been received yet.
#[derive(Debug)]
enum Partial {
    Sequence(Sequence),
    /// A mapping and the key waiting for its value.
    Mapping(Mapping, Option<Node>),
}

/// Builds [`Node`] trees out of events.
///
/// Open collections are kept on an explicit stack rather than on the call stack. The composer can be fed events directly with [`Composer::feed`], or be handed to
/// [`Parser::load`]: it then terminates the load at its first error.
///
/// ```
/// use yamlstream::{Composer, Node, Parser};
///
/// let mut composer = Composer::new();
/// Parser::new_from_str("a: &x [1]\nb: *x").load(&mut composer).unwrap();
/// let docs = composer.into_documents().unwrap();
/// assert_eq!(docs[0].get("b").and_then(|b| b.get_index(0)).and_then(Node::as_str), Some("1"));
/// ```
///
/// [`Parser::load`]: yamlstream_parser::Parser::load
#[derive(Debug, Default)]
pub struct Composer {
    /// The documents composed so far.
    documents: Vec<Node>,
    /// Open collections, innermost last.
    stack: Vec<Partial>,
    /// The root of the current document, once it is complete.
    root: Option<Node>,
    /// Anchored nodes of the current document.
    anchors: HashMap<String, Rc<Node>>,
    /// The first error met. Further events are refused.
    error: Option<ComposeError>,
}

impl Composer {
    /// Create a composer with no document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event to the documents being built.
    ///
    /// Events outside of a document start one implicitly, so that a bare node event sequence
    /// composes to a single document.
    ///
    /// # Errors
    /// Returns [`ComposeError::Structure`] if the event cannot follow the previous ones. The error
    /// is sticky: every following call returns it again.
    pub fn feed(&mut self, event: &Event, span: Span) -> Result<(), ComposeError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        let result = self.feed_impl(event, span.start);
        if let Err(error) = &result {
            log::debug!("composer failed: {error}");
            self.error = Some(error.clone());
        }
        result
    }

    /// Return the composed documents.
    ///
    /// A document whose end event was not received is returned if its root node is complete.
    ///
    /// # Errors
    /// Returns the error met while composing, or a structure error if a collection is left open.
    pub fn into_documents(mut self) -> Result<Vec<Node>, ComposeError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if !self.stack.is_empty() {
            return Err(ComposeError::structure(
                ParseErrorKind::UnexpectedToken,
                Marker::default(),
                "the events end inside a collection",
            ));
        }
        if let Some(root) = self.root.take() {
            self.documents.push(root);
        }
        Ok(self.documents)
    }

    fn feed_impl(&mut self, event: &Event, mark: Marker) -> Result<(), ComposeError> {
        match event {
            Event::StreamStart | Event::StreamEnd | Event::DocumentStart { .. } => {
                self.check_balanced(mark)?;
                if let Some(root) = self.root.take() {
                    self.documents.push(root);
                }
                self.anchors.clear();
            }
            Event::DocumentEnd { .. } => {
                self.check_balanced(mark)?;
                let Some(root) = self.root.take() else {
                    return Err(ComposeError::structure(
                        ParseErrorKind::UnexpectedToken,
                        mark,
                        "document ended without a root node",
                    ));
                };
                log::debug!("composed document #{}", self.documents.len());
                self.documents.push(root);
                self.anchors.clear();
            }
            Event::SequenceStart { style, anchor, tag } => {
                self.check_node_allowed(mark)?;
                self.stack.push(Partial::Sequence(Sequence {
                    items: vec![],
                    style: *style,
                    anchor: anchor.clone(),
                    tag: tag.clone(),
                }));
            }
            Event::MappingStart { style, anchor, tag } => {
                self.check_node_allowed(mark)?;
                self.stack.push(Partial::Mapping(
                    Mapping {
                        entries: vec![],
                        style: *style,
                        anchor: anchor.clone(),
                        tag: tag.clone(),
                    },
                    None,
                ));
            }
            Event::SequenceEnd => match self.stack.pop() {
                Some(Partial::Sequence(sequence)) => self.insert_new_node(Node::Sequence(sequence)),
                _ => return Err(unbalanced(mark, "sequence")),
            },
            Event::MappingEnd => match self.stack.pop() {
                Some(Partial::Mapping(mapping, None)) => {
                    self.insert_new_node(Node::Mapping(mapping));
                }
                _ => return Err(unbalanced(mark, "mapping")),
            },
            Event::Scalar {
                style,
                value,
                anchor,
                tag,
            } => {
                self.check_node_allowed(mark)?;
                self.insert_new_node(Node::Scalar(Scalar {
                    value: value.clone(),
                    style: *style,
                    anchor: anchor.clone(),
                    tag: tag.clone(),
                }));
            }
            Event::Alias { anchor } => {
                self.check_node_allowed(mark)?;
                let Some(target) = self.anchors.get(anchor) else {
                    return Err(ComposeError::structure(
                        ParseErrorKind::UndefinedAlias,
                        mark,
                        format!("unknown anchor `{anchor}'"),
                    ));
                };
                let target = Rc::clone(target);
                self.insert_new_node(Node::Alias(Alias {
                    anchor: anchor.clone(),
                    target,
                }));
            }
        }
        Ok(())
    }

    /// Check that no collection is open.
    fn check_balanced(&self, mark: Marker) -> Result<(), ComposeError> {
        if self.stack.is_empty() {
            Ok(())
        } else {
            Err(unbalanced(mark, "document"))
        }
    }

    /// Check that a node may start here, i.e. that the document has no complete root yet.
    fn check_node_allowed(&self, mark: Marker) -> Result<(), ComposeError> {
        if self.stack.is_empty() && self.root.is_some() {
            Err(ComposeError::structure(
                ParseErrorKind::UnexpectedToken,
                mark,
                "a document has a single root node",
            ))
        } else {
            Ok(())
        }
    }

    /// Register the anchor of a complete node and attach the node to its parent.
    fn insert_new_node(&mut self, node: Node) {
        if let Some(anchor) = node.anchor() {
            self.anchors
                .insert(anchor.to_owned(), Rc::new(node.clone()));
        }
        match self.stack.last_mut() {
            Some(Partial::Sequence(sequence)) => sequence.items.push(node),
            Some(Partial::Mapping(mapping, key)) => match key.take() {
                Some(key) => mapping.entries.push((key, node)),
                None => *key = Some(node),
            },
            None => self.root = Some(node),
        }
    }
}

impl EventReceiver for Composer {
    fn on_event(&mut self, event: &Event, span: Span, _path: &Path) -> Control {
        match self.feed(event, span) {
            Ok(()) => Control::Continue,
            Err(_) => Control::Terminate,
        }
    }
}

fn unbalanced(mark: Marker, what: &str) -> ComposeError {
    ComposeError::structure(
        ParseErrorKind::UnexpectedToken,
        mark,
        format!("unbalanced {what} events"),
    )
}

/// Compose the first document of an event sequence.
///
/// The sequence may or may not carry stream and document events.
///
/// ```
/// use yamlstream::{compose, make_scalar, Node, ScalarStyle};
///
/// let node = compose([make_scalar(ScalarStyle::Plain, "a", None, None)]).unwrap();
/// assert_eq!(node, Node::from("a"));
/// ```
///
/// # Errors
/// Returns a [`ComposeError`] if the events are not well-formed or hold no node.
pub fn compose(events: impl IntoIterator<Item = Event>) -> Result<Node, ComposeError> {
    compose_all(events)?
        .into_iter()
        .next()
        .ok_or_else(ComposeError::no_document)
}

/// Compose every document of an event sequence.
///
/// # Errors
/// Returns a [`ComposeError`] if the events are not well-formed.
pub fn compose_all(events: impl IntoIterator<Item = Event>) -> Result<Vec<Node>, ComposeError> {
    let mut composer = Composer::new();
    for event in events {
        composer.feed(&event, Span::default())?;
    }
    composer.into_documents()
}
