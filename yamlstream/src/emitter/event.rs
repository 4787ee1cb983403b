//! Home to the [`EventEmitter`] and its associated types.

use std::{
    collections::{HashMap, HashSet},
    fmt::Write as _,
    io,
    rc::Rc,
};

use yamlstream_parser::{
    CollectionKind, CollectionStyle, Event, ScalarStyle, Tag, TagDirective, CORE_SCHEMA_PREFIX,
};

use crate::{
    char_traits,
    emitter::{
        config::{EmitMode, EmitterConfig},
        EmitError, EmitResult,
    },
};

/// Scalar keys longer than this are written as explicit (`? `) keys.
///
/// Readers only look that far for the `:` of an implicit key.
const MAX_IMPLICIT_KEY_LEN: usize = 128;

/// A lower-level YAML serializer that is fed [`Event`]s instead of a fully constructed tree.
///
/// This serializer is a building block for [`NodeEmitter`]. It takes events and writes the output
/// on the go, so that a stream of events never needs to be held in memory.
///
/// Events must follow the order a parser would produce them in: a single stream, documents
/// within it, a single root node per document and balanced collections. Any deviation is
/// reported as an [`EmitError`], after which the emitter refuses every further event. What was
/// written before the error is left in the writer.
///
/// # Example
/// ```
/// use yamlstream::{
///     make_collection_start, make_document_start, make_scalar, make_simple, CollectionKind,
///     CollectionStyle, Event, EventEmitter, ScalarStyle, SimpleKind,
/// };
///
/// let mut emitter = EventEmitter::new(vec![]);
/// for event in [
///     make_simple(SimpleKind::StreamStart),
///     make_document_start(true, None, vec![]),
///     make_collection_start(CollectionKind::Mapping, CollectionStyle::Block, None, None),
///     make_scalar(ScalarStyle::Any, "a", None, None),
///     make_collection_start(CollectionKind::Sequence, CollectionStyle::Any, None, None),
///     make_scalar(ScalarStyle::Any, "b", None, None),
///     make_scalar(ScalarStyle::Any, "null", None, None),
///     make_simple(SimpleKind::SequenceEnd),
///     make_simple(SimpleKind::MappingEnd),
///     Event::DocumentEnd { implicit: true },
///     make_simple(SimpleKind::StreamEnd),
/// ] {
///     emitter.emit(&event).unwrap();
/// }
/// assert_eq!(emitter.into_inner(), b"a:\n  - b\n  - \"null\"\n");
/// ```
///
/// [`NodeEmitter`]: crate::NodeEmitter
#[allow(clippy::module_name_repetitions, clippy::struct_excessive_bools)]
#[derive(Debug)]
pub struct EventEmitter<W: io::Write> {
    /// The output stream in which we output YAML.
    writer: W,
    /// The settings of the emitter.
    config: EmitterConfig,
    /// Where in the stream we are.
    state: EmitterState,
    /// The collections we are in, innermost last.
    frames: Vec<Frame>,
    /// Anchors of the current document whose node is complete.
    anchors: HashSet<String>,
    /// The `%TAG` directives of the current document.
    tag_directives: Vec<TagDirective>,
    /// Whether nothing was written on the current line yet.
    at_line_start: bool,
    /// The indentation written before the first character of the current line.
    pending_indent: usize,
    /// Whether the next token must be separated from the previous one by a space.
    needs_space: bool,
    /// Whether the `---` marker of the current document was written.
    document_marker_written: bool,
    /// Whether the last document ended without a `...` marker.
    open_ended: bool,
    /// Whether the last thing written was a block scalar.
    after_block_scalar: bool,
    /// How many documents were started.
    documents: usize,
    /// With [`EmitterConfig::strip_anchors`], the events of the anchored nodes of the current
    /// document, replayed in place of their aliases.
    anchored_events: HashMap<String, Rc<[Event]>>,
    /// With [`EmitterConfig::strip_anchors`], the anchored collections being recorded, innermost
    /// last.
    recordings: Vec<Recording>,
}

/// The events of an anchored collection, up to its end.
#[derive(Debug)]
struct Recording {
    anchor: String,
    /// How many collections of the recording are open.
    open: usize,
    events: Vec<Event>,
}

/// Where in the stream the emitter is.
#[derive(Clone, Copy, PartialEq, Debug, Eq)]
enum EmitterState {
    /// We have just built an emitter.
    Init,
    /// The stream is started and no document is open.
    StreamStarted,
    /// A document is started and its root node is not complete.
    InDocument,
    /// The root node of the document is complete, but we have not yet received a
    /// [`DocumentEnd`](Event::DocumentEnd).
    DocumentEmitted,
    /// The stream was ended.
    StreamEnded,
    /// An error was returned. Further events are refused.
    Failed,
}

/// A collection that was started and not ended yet.
#[derive(Debug)]
struct Frame {
    kind: CollectionKind,
    flow: bool,
    /// The column of the entries of a block collection.
    indent: usize,
    /// The number of complete nodes in the collection. Keys and values count separately.
    count: usize,
    /// Whether the first entry continues the line of the indicator introducing the collection.
    compact: bool,
    /// Whether the current key was introduced with `?`.
    complex_key: bool,
    /// Whether the current key is an alias, which needs a space before the `:`.
    alias_key: bool,
    /// The anchor of the collection, registered when the collection ends.
    anchor: Option<String>,
}

impl Frame {
    fn expects_key(&self) -> bool {
        self.kind == CollectionKind::Mapping && self.count % 2 == 0
    }

    fn expects_value(&self) -> bool {
        self.kind == CollectionKind::Mapping && self.count % 2 == 1
    }
}

/// How a node is written, as far as its placement is concerned.
#[derive(Clone, Copy, PartialEq, Debug, Eq)]
enum Shape {
    /// A scalar written on a single line.
    Scalar {
        /// Whether the scalar is too long to be an implicit key.
        long: bool,
    },
    /// A literal or folded scalar.
    BlockScalar,
    /// An alias.
    Alias,
    /// A block collection.
    BlockCollection,
    /// A flow collection.
    FlowCollection,
}

/// Where [`EventEmitter::begin_node`] placed a node.
#[derive(Clone, Copy, Debug)]
struct Placement {
    /// The indentation of the enclosing block collection, `None` for the root node.
    parent_indent: Option<usize>,
    /// Whether a block collection starts on the current line.
    compact: bool,
}

impl<W: io::Write> EventEmitter<W> {
    /// Create a new emitter serializing into `writer` with the default settings.
    pub fn new(writer: W) -> Self {
        Self::with_config(writer, EmitterConfig::default())
    }

    /// Create a new emitter serializing into `writer`.
    pub fn with_config(writer: W, config: EmitterConfig) -> Self {
        Self {
            writer,
            config,
            state: EmitterState::Init,
            frames: vec![],
            anchors: HashSet::new(),
            tag_directives: vec![],
            at_line_start: true,
            pending_indent: 0,
            needs_space: false,
            document_marker_written: false,
            open_ended: false,
            after_block_scalar: false,
            documents: 0,
            anchored_events: HashMap::new(),
            recordings: vec![],
        }
    }

    /// Return the settings of the emitter.
    #[must_use]
    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Return a reference to the writer.
    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Return the writer, consuming the emitter.
    ///
    /// The output is only complete if a [`StreamEnd`](Event::StreamEnd) was emitted.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Whether the [`StreamStart`](Event::StreamStart) event was emitted.
    #[must_use]
    pub fn stream_started(&self) -> bool {
        self.state != EmitterState::Init
    }

    /// Whether the [`StreamEnd`](Event::StreamEnd) event was emitted.
    #[must_use]
    pub fn stream_ended(&self) -> bool {
        self.state == EmitterState::StreamEnded
    }

    /// Feed a new event into the emitter.
    ///
    /// # Errors
    /// Returns an error if the given event is incoherent with the preceding sequence of events or
    /// if writing to the output writer failed. Once an error is returned, every further call
    /// fails.
    pub fn emit(&mut self, event: &Event) -> EmitResult {
        log::trace!("emit {event:?}");
        if self.config.strip_anchors {
            self.emit_without_anchors(event)
        } else {
            self.dispatch(event)
        }
    }

    /// Return whether `anchor` is bound to a complete node of the current document.
    pub(crate) fn is_anchor_defined(&self, anchor: &str) -> bool {
        self.anchors.contains(anchor)
    }

    fn dispatch(&mut self, event: &Event) -> EmitResult {
        match event {
            Event::Scalar {
                style,
                value,
                anchor,
                tag,
            } => self.emit_scalar(value, *style, anchor.as_deref(), tag.as_ref()),
            Event::SequenceStart { style, anchor, tag } => self.emit_collection_start(
                CollectionKind::Sequence,
                *style,
                anchor.as_deref(),
                tag.as_ref(),
            ),
            Event::MappingStart { style, anchor, tag } => self.emit_collection_start(
                CollectionKind::Mapping,
                *style,
                anchor.as_deref(),
                tag.as_ref(),
            ),
            Event::SequenceEnd => self.emit_collection_end(CollectionKind::Sequence),
            Event::MappingEnd => self.emit_collection_end(CollectionKind::Mapping),
            Event::Alias { anchor } => self.emit_alias(anchor),
            _ => {
                self.check_not_failed()?;
                let result = self.on_structure_event(event);
                self.track(result)
            }
        }
    }

    /// Emit `event` with its anchor left out. An alias is replaced by the events of the node it
    /// refers to.
    fn emit_without_anchors(&mut self, event: &Event) -> EmitResult {
        match event {
            Event::Alias { anchor } => {
                self.check_not_failed()?;
                let Some(events) = self.anchored_events.get(anchor).map(Rc::clone) else {
                    let error = EmitError::UndefinedAnchorReferencedByAlias(anchor.clone());
                    return self.track(Err(error));
                };
                events
                    .iter()
                    .try_for_each(|event| self.dispatch_and_record(event, None))
            }
            Event::DocumentStart { .. } => {
                self.anchored_events.clear();
                self.recordings.clear();
                self.dispatch(event)
            }
            _ => {
                let mut event = event.clone();
                let anchor = match &mut event {
                    Event::Scalar { anchor, .. }
                    | Event::SequenceStart { anchor, .. }
                    | Event::MappingStart { anchor, .. } => anchor.take(),
                    _ => None,
                };
                self.dispatch_and_record(&event, anchor)
            }
        }
    }

    /// Emit an anchor-free `event` and add it to the anchored nodes being recorded.
    ///
    /// `anchor` is the anchor `event` was stripped of. It starts a new recording.
    fn dispatch_and_record(&mut self, event: &Event, anchor: Option<String>) -> EmitResult {
        self.dispatch(event)?;
        let opens = event.is_collection_start();
        let closes = event.is_collection_end();
        for recording in &mut self.recordings {
            recording.events.push(event.clone());
            if opens {
                recording.open += 1;
            } else if closes {
                recording.open -= 1;
            }
        }
        match anchor {
            Some(anchor) if opens => self.recordings.push(Recording {
                anchor,
                open: 1,
                events: vec![event.clone()],
            }),
            Some(anchor) => {
                self.anchored_events
                    .insert(anchor, Rc::from(vec![event.clone()]));
            }
            None => {}
        }
        while self.recordings.last().is_some_and(|recording| recording.open == 0) {
            if let Some(Recording { anchor, events, .. }) = self.recordings.pop() {
                self.anchored_events.insert(anchor, events.into());
            }
        }
        Ok(())
    }

    /// Emit a scalar without building an [`Event`].
    pub(crate) fn emit_scalar(
        &mut self,
        value: &str,
        style: ScalarStyle,
        anchor: Option<&str>,
        tag: Option<&Tag>,
    ) -> EmitResult {
        self.check_not_failed()?;
        let result = self.on_scalar(value, style, anchor, tag);
        self.track(result)
    }

    /// Emit the start of a collection without building an [`Event`].
    pub(crate) fn emit_collection_start(
        &mut self,
        kind: CollectionKind,
        style: CollectionStyle,
        anchor: Option<&str>,
        tag: Option<&Tag>,
    ) -> EmitResult {
        self.check_not_failed()?;
        let result = self.on_collection_start(kind, style, anchor, tag);
        self.track(result)
    }

    /// Emit the end of a collection.
    pub(crate) fn emit_collection_end(&mut self, kind: CollectionKind) -> EmitResult {
        self.check_not_failed()?;
        let result = self.on_collection_end(kind);
        self.track(result)
    }

    /// Emit an alias without building an [`Event`].
    pub(crate) fn emit_alias(&mut self, anchor: &str) -> EmitResult {
        self.check_not_failed()?;
        let result = self.on_alias(anchor);
        self.track(result)
    }

    fn check_not_failed(&self) -> EmitResult {
        if self.state == EmitterState::Failed {
            Err(EmitError::EventOutOfOrder("the emitter already failed"))
        } else {
            Ok(())
        }
    }

    /// Make the emitter refuse further events if `result` is an error.
    fn track(&mut self, result: EmitResult) -> EmitResult {
        if let Err(e) = &result {
            log::debug!("emitter failed: {e}");
            self.state = EmitterState::Failed;
        }
        result
    }

    /// Handle stream and document boundaries.
    fn on_structure_event(&mut self, event: &Event) -> EmitResult {
        match (event, self.state) {
            (Event::StreamStart, EmitterState::Init) => {
                self.state = EmitterState::StreamStarted;
                Ok(())
            }
            (Event::StreamEnd, EmitterState::StreamStarted) => self.on_stream_end(),
            (
                Event::DocumentStart {
                    implicit,
                    version,
                    tags,
                },
                EmitterState::StreamStarted,
            ) => self.on_document_start(*implicit, *version, tags),
            (Event::DocumentEnd { implicit }, EmitterState::DocumentEmitted) => {
                self.on_document_end(*implicit)
            }
            (Event::DocumentEnd { .. } | Event::StreamEnd, EmitterState::InDocument)
                if !self.frames.is_empty() =>
            {
                Err(EmitError::UnbalancedCollection(
                    "the document ended inside a collection",
                ))
            }
            (Event::DocumentEnd { .. }, _) => Err(EmitError::EventOutOfOrder(
                "document end without a complete document",
            )),
            (Event::DocumentStart { .. }, _) => Err(EmitError::EventOutOfOrder(
                "document start outside of a stream or inside a document",
            )),
            (Event::StreamStart, _) => Err(EmitError::EventOutOfOrder(
                "stream start after the stream started",
            )),
            _ => Err(EmitError::EventOutOfOrder(
                "stream end outside of a stream or inside a document",
            )),
        }
    }

    fn on_document_start(
        &mut self,
        implicit: bool,
        version: Option<(u32, u32)>,
        tags: &[TagDirective],
    ) -> EmitResult {
        let has_directives = version.is_some() || !tags.is_empty();
        // Directives would otherwise be read as the content of the previous document.
        if self.open_ended && has_directives {
            self.new_line(0)?;
            self.raw("...")?;
        }
        if let Some((major, minor)) = version {
            self.new_line(0)?;
            self.raw(&format!("%YAML {major}.{minor}"))?;
        }
        for TagDirective { handle, prefix } in tags {
            self.new_line(0)?;
            self.raw(&format!("%TAG {handle} {prefix}"))?;
        }

        self.document_marker_written = false;
        let explicit = !implicit && !self.config.strip_doc_indicators;
        if explicit || has_directives || self.documents > 0 {
            self.write_document_marker()?;
        }
        log::debug!("emitting document #{}", self.documents);
        self.documents += 1;
        self.tag_directives = tags.to_vec();
        self.anchors.clear();
        self.open_ended = false;
        self.state = EmitterState::InDocument;
        Ok(())
    }

    fn on_document_end(&mut self, implicit: bool) -> EmitResult {
        let implicit = implicit || self.config.strip_doc_indicators;
        if !implicit {
            self.new_line(0)?;
            self.raw("...")?;
        }
        self.open_ended = implicit;
        self.state = EmitterState::StreamStarted;
        Ok(())
    }

    fn on_stream_end(&mut self) -> EmitResult {
        // The line break closes the last line of a block scalar and is part of its value.
        if (self.config.ending_newline || self.after_block_scalar) && !self.at_line_start {
            self.line_break()?;
        }
        self.writer.flush()?;
        self.state = EmitterState::StreamEnded;
        Ok(())
    }

    fn on_scalar(
        &mut self,
        value: &str,
        style: ScalarStyle,
        anchor: Option<&str>,
        tag: Option<&Tag>,
    ) -> EmitResult {
        self.check_node_allowed()?;
        let (in_flow, is_key) = self.slot();
        let style = self.choose_scalar_style(value, style, in_flow, is_key);
        let shape = match style {
            ScalarStyle::Literal | ScalarStyle::Folded => Shape::BlockScalar,
            _ => Shape::Scalar {
                long: value.len() > MAX_IMPLICIT_KEY_LEN,
            },
        };
        let placement = self.begin_node(shape, self.has_properties(anchor, tag))?;

        // An empty document would not be read back.
        if placement.parent_indent.is_none()
            && value.is_empty()
            && style == ScalarStyle::Plain
            && !self.document_marker_written
        {
            self.write_document_marker()?;
        }
        self.write_properties(anchor, tag)?;
        match style {
            ScalarStyle::Plain => {
                if !value.is_empty() {
                    self.token(value)?;
                }
            }
            ScalarStyle::SingleQuoted => self.token(&single_quoted(value))?,
            ScalarStyle::Literal | ScalarStyle::Folded => {
                self.write_block_scalar(value, style, placement)?;
            }
            ScalarStyle::DoubleQuoted | ScalarStyle::Any => self.token(&double_quoted(value))?,
        }

        if let Some(anchor) = anchor {
            self.anchors.insert(anchor.to_owned());
        }
        self.complete_node();
        Ok(())
    }

    fn on_alias(&mut self, anchor: &str) -> EmitResult {
        self.check_node_allowed()?;
        if !self.anchors.contains(anchor) {
            return Err(EmitError::UndefinedAnchorReferencedByAlias(anchor.to_owned()));
        }
        self.begin_node(Shape::Alias, false)?;
        self.token(&format!("*{anchor}"))?;
        self.complete_node();
        Ok(())
    }

    fn on_collection_start(
        &mut self,
        kind: CollectionKind,
        style: CollectionStyle,
        anchor: Option<&str>,
        tag: Option<&Tag>,
    ) -> EmitResult {
        self.check_node_allowed()?;
        let (in_flow, _) = self.slot();
        let flow = in_flow
            || match self.config.mode {
                EmitMode::Original => style == CollectionStyle::Flow,
                EmitMode::Block => false,
                EmitMode::Flow => true,
            };
        let has_properties = self.has_properties(anchor, tag);
        let shape = if flow {
            Shape::FlowCollection
        } else {
            Shape::BlockCollection
        };
        let placement = self.begin_node(shape, has_properties)?;

        // Properties alone on the first line of a stream do not read well.
        if !flow
            && has_properties
            && placement.parent_indent.is_none()
            && !self.document_marker_written
        {
            self.write_document_marker()?;
        }
        self.write_properties(anchor, tag)?;
        if flow {
            self.token(match kind {
                CollectionKind::Sequence => "[",
                CollectionKind::Mapping => "{",
            })?;
            self.needs_space = false;
        }

        let step = self.config.indent_step();
        self.frames.push(Frame {
            kind,
            flow,
            indent: placement.parent_indent.map_or(0, |indent| indent + step),
            count: 0,
            compact: placement.compact,
            complex_key: false,
            alias_key: false,
            anchor: anchor.map(ToOwned::to_owned),
        });
        Ok(())
    }

    fn on_collection_end(&mut self, kind: CollectionKind) -> EmitResult {
        let Some(frame) = self.frames.pop() else {
            return Err(EmitError::UnbalancedCollection(
                "collection end with no matching collection start",
            ));
        };
        if frame.kind != kind {
            return Err(EmitError::UnbalancedCollection(
                "mismatch in collection start/end",
            ));
        }
        if frame.expects_value() {
            return Err(EmitError::UnbalancedCollection(
                "last mapping pair is missing its value",
            ));
        }

        if frame.flow {
            self.raw(match kind {
                CollectionKind::Sequence => "]",
                CollectionKind::Mapping => "}",
            })?;
            self.needs_space = true;
        } else if frame.count == 0 {
            // If the collection is empty, we still need to emit it.
            self.token(match kind {
                CollectionKind::Sequence => "[]",
                CollectionKind::Mapping => "{}",
            })?;
        }

        if let Some(anchor) = frame.anchor {
            self.anchors.insert(anchor);
        }
        self.complete_node();
        Ok(())
    }

    /// Check that a node may be emitted.
    fn check_node_allowed(&self) -> EmitResult {
        match self.state {
            EmitterState::InDocument => Ok(()),
            EmitterState::DocumentEmitted => Err(EmitError::EventOutOfOrder(
                "a document has a single root node",
            )),
            _ => Err(EmitError::EventOutOfOrder("a node must be within a document")),
        }
    }

    /// Return whether the next node goes in a flow collection, and whether it is a mapping key.
    fn slot(&self) -> (bool, bool) {
        self.frames
            .last()
            .map_or((false, false), |frame| (frame.flow, frame.expects_key()))
    }

    fn has_properties(&self, anchor: Option<&str>, tag: Option<&Tag>) -> bool {
        anchor.is_some() || (tag.is_some() && !self.config.strip_tags)
    }

    /// Pick the style a scalar is written in.
    ///
    /// The requested style is kept when the value can be written in it at this place. Otherwise,
    /// and when no style is requested, the value is written plain if it reads back as the same
    /// string, in double quotes if not.
    fn choose_scalar_style(
        &self,
        value: &str,
        requested: ScalarStyle,
        in_flow: bool,
        is_key: bool,
    ) -> ScalarStyle {
        let block_allowed = !in_flow && !is_key && is_valid_block_scalar(value);
        match requested {
            ScalarStyle::Plain if value.is_empty() && !in_flow && !is_key => ScalarStyle::Plain,
            ScalarStyle::Plain if char_traits::is_valid_plain_scalar(value, in_flow) => {
                ScalarStyle::Plain
            }
            ScalarStyle::SingleQuoted if value.chars().all(char_traits::is_printable) => {
                ScalarStyle::SingleQuoted
            }
            ScalarStyle::Literal if block_allowed => ScalarStyle::Literal,
            ScalarStyle::Folded if block_allowed && can_fold(value) => ScalarStyle::Folded,
            ScalarStyle::Folded if block_allowed => ScalarStyle::Literal,
            ScalarStyle::Any => {
                if self.config.multiline_strings && value.contains('\n') && block_allowed {
                    ScalarStyle::Literal
                } else if char_traits::needs_quotes(value, in_flow) {
                    ScalarStyle::DoubleQuoted
                } else {
                    ScalarStyle::Plain
                }
            }
            _ => ScalarStyle::DoubleQuoted,
        }
    }

    /// Write what separates the node from what precedes it in its parent collection.
    ///
    /// This is the `- ` of a block sequence entry, the `: ` of a mapping value, the `, ` between
    /// flow entries, ... along with the line breaks and indentation that go with them.
    fn begin_node(&mut self, shape: Shape, has_properties: bool) -> Result<Placement, EmitError> {
        let compact = self.config.compact && !has_properties && shape == Shape::BlockCollection;
        let complex = matches!(
            shape,
            Shape::BlockCollection | Shape::FlowCollection | Shape::Scalar { long: true }
        );
        let Some(frame) = self.frames.last_mut() else {
            // The root node goes right after the `---`, if any.
            return Ok(Placement {
                parent_indent: None,
                compact: false,
            });
        };
        let (kind, flow, indent, count) = (frame.kind, frame.flow, frame.indent, frame.count);
        let first_inline = frame.compact && count == 0;
        let placement = Placement {
            parent_indent: Some(indent),
            compact: false,
        };

        if frame.expects_value() {
            let (complex_key, alias_key) = (frame.complex_key, frame.alias_key);
            if complex_key && !flow {
                self.new_line(indent)?;
                self.indicator(":", compact)?;
                return Ok(Placement {
                    compact,
                    ..placement
                });
            }
            if alias_key {
                self.token(":")?;
            } else {
                self.raw(":")?;
                self.needs_space = true;
            }
            return Ok(placement);
        }
        if frame.expects_key() {
            frame.complex_key = complex;
            frame.alias_key = shape == Shape::Alias;
        }
        let is_key = kind == CollectionKind::Mapping;

        if flow {
            if count > 0 {
                self.raw(",")?;
                self.needs_space = true;
            }
            if is_key && complex {
                self.token("?")?;
            }
            return Ok(placement);
        }

        if !first_inline {
            self.new_line(indent)?;
        }
        if !is_key {
            self.indicator("-", compact)?;
        } else if complex {
            self.indicator("?", compact)?;
        } else {
            return Ok(placement);
        }
        Ok(Placement {
            compact,
            ..placement
        })
    }

    /// Account for a complete node in its parent.
    fn complete_node(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.count += 1;
        } else {
            self.state = EmitterState::DocumentEmitted;
        }
    }

    /// Write the anchor and the tag of a node.
    fn write_properties(&mut self, anchor: Option<&str>, tag: Option<&Tag>) -> EmitResult {
        if let Some(anchor) = anchor {
            self.token(&format!("&{anchor}"))?;
        }
        if let Some(tag) = tag.filter(|_| !self.config.strip_tags) {
            let tag = self.render_tag(tag);
            self.token(&tag)?;
        }
        Ok(())
    }

    /// Render a tag in its shortest form for the current document.
    fn render_tag(&self, tag: &Tag) -> String {
        if tag.is_non_specific() {
            return "!".to_owned();
        }
        if !tag.handle.is_empty() && !tag.suffix.is_empty() {
            let declares = |handle: &str| self.tag_directives.iter().any(|d| d.handle == handle);
            let shorthand = self
                .tag_directives
                .iter()
                .find(|d| d.prefix == tag.handle)
                .map(|d| d.handle.as_str())
                .or_else(|| (tag.handle == "!" && !declares("!")).then_some("!"))
                .or_else(|| {
                    (tag.handle == CORE_SCHEMA_PREFIX && !declares("!!")).then_some("!!")
                });
            if let Some(handle) = shorthand {
                return format!("{handle}{}", escape_uri(&tag.suffix, char_traits::is_tag_char));
            }
        }
        format!(
            "!<{}>",
            escape_uri(&tag.to_string(), char_traits::is_uri_char)
        )
    }

    /// Write `value` as a literal or folded block scalar.
    fn write_block_scalar(
        &mut self,
        value: &str,
        style: ScalarStyle,
        placement: Placement,
    ) -> EmitResult {
        let step = self.config.indent_step();
        let indent = placement.parent_indent.unwrap_or(0) + step;
        let body = value.trim_end_matches('\n');
        let trailing_breaks = value.len() - body.len();

        let mut header = String::from(if style == ScalarStyle::Folded { ">" } else { "|" });
        // The indentation of the content is otherwise detected from its first non-empty line.
        if body
            .split('\n')
            .find(|line| !line.is_empty())
            .is_some_and(|line| line.starts_with([' ', '\t']))
        {
            let _ = write!(header, "{step}");
        }
        match trailing_breaks {
            0 => header.push('-'),
            1 => {}
            _ => header.push('+'),
        }
        self.token(&header)?;

        if style == ScalarStyle::Folded {
            // A single line break between two lines is read as a space: every line break of the
            // value takes an empty line.
            self.line_break()?;
            let mut empty_lines = 0;
            let mut first = true;
            for line in body.split('\n') {
                if line.is_empty() {
                    empty_lines += 1;
                    continue;
                }
                if !first {
                    for _ in 0..empty_lines + 2 {
                        self.line_break()?;
                    }
                }
                first = false;
                empty_lines = 0;
                self.pending_indent = indent;
                self.raw(line)?;
            }
        } else {
            for line in body.split('\n') {
                self.line_break()?;
                if !line.is_empty() {
                    self.pending_indent = indent;
                    self.raw(line)?;
                }
            }
        }

        // Kept line breaks must be written now; the last one closes the last line.
        if trailing_breaks > 1 {
            for _ in 0..trailing_breaks {
                self.line_break()?;
            }
        }
        self.after_block_scalar = true;
        Ok(())
    }

    /// Write `---` on a line of its own.
    fn write_document_marker(&mut self) -> EmitResult {
        self.new_line(0)?;
        self.raw("---")?;
        self.needs_space = true;
        self.document_marker_written = true;
        Ok(())
    }

    /// Write a block indicator (`-`, `?` or `:`).
    ///
    /// If a compact collection follows, pad the line to the indentation of its entries.
    fn indicator(&mut self, indicator: &str, compact: bool) -> EmitResult {
        self.token(indicator)?;
        if compact {
            let step = self.config.indent_step();
            self.write_spaces(step - indicator.len())?;
            self.needs_space = false;
        }
        Ok(())
    }

    /// Write a token, separated from the previous one by a space if needed.
    fn token(&mut self, text: &str) -> EmitResult {
        if self.needs_space {
            self.raw(" ")?;
        }
        self.raw(text)?;
        self.needs_space = true;
        Ok(())
    }

    /// Write `text` as-is, indenting it if it starts a line.
    fn raw(&mut self, text: &str) -> EmitResult {
        if text.is_empty() {
            return Ok(());
        }
        if self.at_line_start {
            self.at_line_start = false;
            self.write_spaces(self.pending_indent)?;
        }
        self.writer.write_all(text.as_bytes())?;
        self.after_block_scalar = false;
        Ok(())
    }

    /// End the current line, if anything was written on it, and indent the next one.
    ///
    /// The indentation itself is written lazily, so that empty lines have no trailing spaces.
    fn new_line(&mut self, indent: usize) -> EmitResult {
        if !self.at_line_start {
            self.line_break()?;
        }
        self.pending_indent = indent;
        self.needs_space = false;
        Ok(())
    }

    /// Write a line break.
    fn line_break(&mut self) -> EmitResult {
        self.writer.write_all(b"\n")?;
        self.at_line_start = true;
        self.needs_space = false;
        Ok(())
    }

    /// Write `n` spaces.
    fn write_spaces(&mut self, n: usize) -> io::Result<()> {
        const SPACES: &str = "                                                                ";

        let mut spaces_left = n;
        while spaces_left > 0 {
            // Write at most 64 or `spaces_left` spaces.
            let n_spaces = spaces_left.min(SPACES.len());
            self.writer.write_all(&SPACES.as_bytes()[..n_spaces])?;
            spaces_left -= n_spaces;
        }
        Ok(())
    }
}

/// Check whether `value` can be written as a literal block scalar.
///
/// Lines holding only whitespace are refused, since readers may take them for indentation.
fn is_valid_block_scalar(value: &str) -> bool {
    !value.trim_end_matches('\n').is_empty()
        && char_traits::is_valid_literal_block_scalar(value)
        && value
            .split('\n')
            .all(|line| line.is_empty() || !line.chars().all(|c| c == ' ' || c == '\t'))
}

/// Check whether `value` can be written as a folded block scalar.
///
/// Lines starting with whitespace are not folded by readers, which our folding does not handle.
fn can_fold(value: &str) -> bool {
    !value.starts_with('\n')
        && value
            .split('\n')
            .all(|line| !line.starts_with([' ', '\t']))
}

/// Quote `value` in single quotes.
fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Quote `value` in double quotes, escaping what cannot be written as-is.
fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\x0b' => out.push_str("\\v"),
            '\x0c' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            '\x1b' => out.push_str("\\e"),
            '\u{85}' => out.push_str("\\N"),
            '\u{2028}' => out.push_str("\\L"),
            '\u{2029}' => out.push_str("\\P"),
            c if char_traits::is_printable(c) => out.push(c),
            c if u32::from(c) <= 0xff => {
                let _ = write!(out, "\\x{:02X}", u32::from(c));
            }
            c if u32::from(c) <= 0xffff => {
                let _ = write!(out, "\\u{:04X}", u32::from(c));
            }
            c => {
                let _ = write!(out, "\\U{:08X}", u32::from(c));
            }
        }
    }
    out.push('"');
    out
}

/// Percent-encode the characters of `text` that `allowed` refuses.
fn escape_uri(text: &str, allowed: fn(char) -> bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if allowed(c) {
            out.push(c);
        } else {
            let mut buf = [0; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_double_quoted() {
        assert_eq!(double_quoted("a\"b\\c"), r#""a\"b\\c""#);
        assert_eq!(double_quoted("\t\n\u{1}"), r#""\t\n\x01""#);
        assert_eq!(double_quoted("\u{feff}é"), "\"\\uFEFFé\"");
        assert_eq!(double_quoted("\u{2028}"), r#""\L""#);
    }

    #[test]
    fn test_single_quoted() {
        assert_eq!(single_quoted("it's"), "'it''s'");
    }

    #[test]
    fn test_escape_uri() {
        assert_eq!(escape_uri("a b!", char_traits::is_tag_char), "a%20b%21");
        assert_eq!(escape_uri("é", char_traits::is_uri_char), "%C3%A9");
    }

    #[test]
    fn test_block_scalar_checks() {
        assert!(is_valid_block_scalar("a\nb\n"));
        assert!(!is_valid_block_scalar("\n\n"));
        assert!(!is_valid_block_scalar("a\n  \nb"));
        assert!(can_fold("a\n\nb"));
        assert!(!can_fold("a\n b"));
        assert!(!can_fold("\na"));
    }
}
