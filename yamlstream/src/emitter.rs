//! YAML serialization helpers.

use std::{cmp::Ordering, io};

use thiserror::Error;
use yamlstream_parser::{CollectionKind, Event};

use crate::node::{Mapping, Node, Scalar, Sequence};

pub(crate) mod config;
pub(crate) mod event;

pub use config::{EmitMode, EmitterConfig};
pub use event::EventEmitter;

/// An error when emitting YAML.
///
/// Whatever was written before the error is left in the writer.
#[allow(clippy::module_name_repetitions)]
#[derive(Error, Debug)]
pub enum EmitError {
    /// A collection end did not match the last open collection, or a document or the stream
    /// ended with collections still open.
    #[error("unbalanced collection: {0}")]
    UnbalancedCollection(&'static str),
    /// An event was given in a place where it cannot appear.
    #[error("event out of order: {0}")]
    EventOutOfOrder(&'static str),
    /// An alias referred to an anchor that was not defined by a complete node of the document.
    #[error("alias to undefined anchor `{0}'")]
    UndefinedAnchorReferencedByAlias(String),
    /// Writing to the output failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The result of an emitting operation.
pub type EmitResult = Result<(), EmitError>;

/// The YAML serializer for [`Node`] trees.
///
/// Every dumped node is written as a document of a single stream, starting with `---` unless
/// [`EmitterConfig::strip_doc_indicators`] is set.
///
/// ```
/// # use yamlstream::{Node, NodeEmitter};
/// let node = Node::load_from_str("a: b\nc: [1, 2]").unwrap();
///
/// let mut emitter = NodeEmitter::new(vec![]);
/// emitter.dump(&node).unwrap();
/// let output = emitter.finish().unwrap();
///
/// assert_eq!(String::from_utf8(output).unwrap(), "---\na: b\nc: [1, 2]\n");
/// ```
#[allow(clippy::module_name_repetitions)]
#[derive(Debug)]
pub struct NodeEmitter<W: io::Write> {
    /// The inner emitter, using the lower-level event API.
    event_emitter: EventEmitter<W>,
}

impl<W: io::Write> NodeEmitter<W> {
    /// Create a new emitter serializing into `writer` with the default settings.
    pub fn new(writer: W) -> Self {
        Self::with_config(writer, EmitterConfig::default())
    }

    /// Create a new emitter serializing into `writer`.
    pub fn with_config(writer: W, config: EmitterConfig) -> Self {
        NodeEmitter {
            event_emitter: EventEmitter::with_config(writer, config),
        }
    }

    /// Return the settings of the emitter.
    #[must_use]
    pub fn config(&self) -> &EmitterConfig {
        self.event_emitter.config()
    }

    /// Write `node` as a new document.
    ///
    /// # Errors
    /// Returns an error if writing fails, or if `node` holds an alias to an anchor that was not
    /// defined earlier in it.
    pub fn dump(&mut self, node: &Node) -> EmitResult {
        if !self.event_emitter.stream_started() {
            self.event_emitter.emit(&Event::StreamStart)?;
        }
        self.event_emitter.emit(&Event::DocumentStart {
            implicit: false,
            version: None,
            tags: vec![],
        })?;
        self.emit_node(node)?;
        self.event_emitter
            .emit(&Event::DocumentEnd { implicit: true })
    }

    /// Write each of `nodes` as a document.
    ///
    /// # Errors
    /// See [`Self::dump`].
    pub fn dump_all(&mut self, nodes: &[Node]) -> EmitResult {
        nodes.iter().try_for_each(|node| self.dump(node))
    }

    /// End the stream and return the writer.
    ///
    /// # Errors
    /// Returns an error if writing fails or if an earlier dump failed.
    pub fn finish(mut self) -> Result<W, EmitError> {
        if !self.event_emitter.stream_started() {
            self.event_emitter.emit(&Event::StreamStart)?;
        }
        self.event_emitter.emit(&Event::StreamEnd)?;
        Ok(self.event_emitter.into_inner())
    }

    /// Walk `root` with an explicit stack, so that deep trees do not exhaust the call stack.
    fn emit_node(&mut self, root: &Node) -> EmitResult {
        let EmitterConfig {
            strip_anchors,
            sort_keys,
            ..
        } = *self.config();
        let mut steps = vec![Step::Node(root, strip_anchors)];
        while let Some(step) = steps.pop() {
            let (node, strip) = match step {
                Step::Node(node, strip) => (node, strip),
                Step::End(kind) => {
                    self.event_emitter.emit_collection_end(kind)?;
                    continue;
                }
            };
            let anchor = node.anchor().filter(|_| !strip);
            match node {
                Node::Scalar(Scalar {
                    value, style, tag, ..
                }) => self
                    .event_emitter
                    .emit_scalar(value, *style, anchor, tag.as_ref())?,
                Node::Sequence(Sequence {
                    items, style, tag, ..
                }) => {
                    self.event_emitter.emit_collection_start(
                        CollectionKind::Sequence,
                        *style,
                        anchor,
                        tag.as_ref(),
                    )?;
                    steps.push(Step::End(CollectionKind::Sequence));
                    steps.extend(items.iter().rev().map(|item| Step::Node(item, strip)));
                }
                Node::Mapping(Mapping {
                    entries, style, tag, ..
                }) => {
                    self.event_emitter.emit_collection_start(
                        CollectionKind::Mapping,
                        *style,
                        anchor,
                        tag.as_ref(),
                    )?;
                    steps.push(Step::End(CollectionKind::Mapping));
                    let mut entries = entries.iter().collect::<Vec<_>>();
                    if sort_keys {
                        entries.sort_by(|(a, _), (b, _)| compare_keys(a, b));
                    }
                    for (key, value) in entries.into_iter().rev() {
                        steps.push(Step::Node(value, strip));
                        steps.push(Step::Node(key, strip));
                    }
                }
                // Sorting may move an alias before its anchor. It is then written as a copy.
                Node::Alias(alias)
                    if strip
                        || (sort_keys && !self.event_emitter.is_anchor_defined(&alias.anchor)) =>
                {
                    steps.push(Step::Node(&alias.target, true));
                }
                Node::Alias(alias) => self.event_emitter.emit_alias(&alias.anchor)?,
            }
        }
        Ok(())
    }
}

/// What is left to do when walking a node tree.
enum Step<'a> {
    /// Emit a node, with or without its anchors.
    Node(&'a Node, bool),
    /// Close a collection whose entries were all emitted.
    End(CollectionKind),
}

/// The order of mapping keys with [`EmitterConfig::sort_keys`]: scalars by value, then the other
/// keys in their original order.
fn compare_keys(a: &Node, b: &Node) -> Ordering {
    match (a.as_str(), b.as_str()) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Serialize `node` as a single-document YAML stream.
///
/// ```
/// # use yamlstream::{to_string, Node};
/// let node = Node::from(vec![Node::from("a"), Node::from("12")]);
/// assert_eq!(to_string(&node).unwrap(), "---\n- a\n- \"12\"\n");
/// ```
///
/// # Errors
/// Returns an error if `node` holds an alias to an anchor it does not define earlier.
pub fn to_string(node: &Node) -> Result<String, EmitError> {
    to_string_all(std::slice::from_ref(node))
}

/// Serialize `nodes` as a YAML stream of one document per node.
///
/// # Errors
/// See [`to_string`].
pub fn to_string_all(nodes: &[Node]) -> Result<String, EmitError> {
    let mut emitter = NodeEmitter::new(vec![]);
    emitter.dump_all(nodes)?;
    let output = emitter.finish()?;
    String::from_utf8(output).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}
