//! Home to the YAML Parser.
//!
//! The parser takes input from the [`crate::scanner::Scanner`], performs final checks for YAML
//! compliance, and emits a stream of structural [`Event`]s. Events can be pulled one at a time
//! with [`Parser::next_event`] or pushed to an [`EventReceiver`] with [`Parser::load`].

use std::collections::HashMap;

use hashlink::LinkedHashMap;

use crate::{
    error::{Error, ParseError, ParseErrorKind},
    event::{CollectionStyle, Event, Tag, TagDirective, CORE_SCHEMA_PREFIX},
    input::{str::StrInput, BufferedInput, Input, ReadInput},
    path::{Key, Path},
    scanner::{Marker, ScalarStyle, Scanner, Span, Token, TokenType},
};

/// The states of the parser's state machine.
#[derive(Clone, Copy, PartialEq, Debug, Eq)]
enum State {
    /// We await the start of the stream.
    StreamStart,
    /// We await the start of a document that may omit its `---`.
    ImplicitDocumentStart,
    /// We await the start of a document, which needs a `---`.
    DocumentStart,
    /// We await the root node of a document.
    DocumentContent,
    /// We await the end of a document.
    DocumentEnd,
    /// We await a node in block context.
    BlockNode,
    /// We await an entry of a block sequence, or its end.
    BlockSequenceEntry,
    /// We await an entry of a sequence written at the same indentation as its parent key.
    IndentlessSequenceEntry,
    /// We await a key of a block mapping, or its end.
    BlockMappingKey,
    /// We await the value of a block mapping.
    BlockMappingValue,
    /// We await the first entry of a flow sequence.
    FlowSequenceFirstEntry,
    /// We await a `,` and the next entry of a flow sequence, or its end.
    FlowSequenceEntry,
    /// We await the key of a single-pair mapping written inside a flow sequence.
    FlowSequenceEntryMappingKey,
    /// We await the value of a single-pair mapping written inside a flow sequence.
    FlowSequenceEntryMappingValue,
    /// We await the end of a single-pair mapping written inside a flow sequence.
    FlowSequenceEntryMappingEnd,
    /// We await the first key of a flow mapping.
    FlowMappingFirstKey,
    /// We await a `,` and the next key of a flow mapping, or its end.
    FlowMappingKey,
    /// We await the value of a flow mapping.
    FlowMappingValue,
    /// We emit the empty value of a key that has none.
    FlowMappingEmptyValue,
    /// The stream has ended.
    End,
}

/// What an [`EventReceiver`] wants the parser to do after an event.
#[derive(Clone, Copy, PartialEq, Debug, Eq, Default)]
pub enum Control {
    /// Keep parsing.
    #[default]
    Continue,
    /// If the event starts a collection, do not hand out its contents nor its end event.
    ///
    /// Anywhere else, this is the same as [`Control::Continue`].
    SkipSubtree,
    /// Stop parsing now. [`Parser::load`] returns [`Outcome::Terminated`].
    Terminate,
}

/// How a call to [`Parser::load`] ended.
#[derive(Clone, Copy, PartialEq, Debug, Eq)]
pub enum Outcome {
    /// The whole stream was handed out.
    Completed,
    /// The receiver returned [`Control::Terminate`].
    Terminated,
}

/// Trait to be implemented in order to use the push-style API of the parser.
///
/// Events are handed out synchronously, in stream order. Along with each event comes its
/// location in the source and the [`Path`] of the node it belongs to in the current document.
///
/// The trait is implemented for closures:
/// ```
/// # use yamlstream_parser::{Control, Event, Parser, Path, Span};
/// let mut keys = vec![];
/// Parser::new_from_str("a: 1\nb: [2, 3]")
///     .load(&mut |ev: &Event, _: Span, path: &Path| {
///         if path.in_mapping_key() {
///             if let Event::Scalar { value, .. } = ev {
///                 keys.push(value.clone());
///             }
///         }
///         Control::Continue
///     })
///     .unwrap();
/// assert_eq!(keys, ["a", "b"]);
/// ```
pub trait EventReceiver {
    /// Handler called for each YAML event that is emitted by the parser.
    fn on_event(&mut self, event: &Event, span: Span, path: &Path) -> Control;
}

impl<F> EventReceiver for F
where
    F: FnMut(&Event, Span, &Path) -> Control,
{
    fn on_event(&mut self, event: &Event, span: Span, path: &Path) -> Control {
        self(event, span, path)
    }
}

/// An event along with its location in the source.
pub type SpannedEvent = (Event, Span);

type ParseResult = Result<SpannedEvent, Error>;

/// A YAML parser.
#[derive(Debug)]
pub struct Parser<T: Input> {
    /// The underlying scanner from which we pull tokens.
    scanner: Scanner<T>,
    /// The stack of _previous_ states we were in.
    ///
    /// States are pushed in the context of subobjects to this stack. The top-most element is the
    /// state in which to come back to when exiting the current state.
    states: Vec<State>,
    /// The state in which we currently are.
    state: State,
    /// The next token from the scanner, when it has been peeked or put back.
    token: Option<Token>,
    /// The next event, when it has been peeked.
    current: Option<SpannedEvent>,
    /// The tag directives (`%TAG`) in force, from handle to prefix.
    tags: HashMap<String, String>,
    /// Whether `%TAG` directives are kept from one document to the next.
    keep_tags: bool,
    /// The anchors of the current document whose node is complete, in definition order.
    ///
    /// Each anchor maps to the event that opened its node.
    anchors: LinkedHashMap<String, Event>,
    /// One frame per open collection, holding the anchor it defines and its start event.
    anchor_frames: Vec<Option<(String, Event)>>,
    /// The location of the last event handed out.
    path: Path,
    /// The first error that happened, returned again on every later call.
    error: Option<Error>,
}

impl<'a> Parser<StrInput<'a>> {
    /// Create a new instance of a parser from a &str.
    #[must_use]
    pub fn new_from_str(value: &'a str) -> Self {
        Parser::new(StrInput::new(value))
    }
}

impl<I: Iterator<Item = char>> Parser<BufferedInput<I>> {
    /// Create a new instance of a parser from an iterator of `char`s.
    #[must_use]
    pub fn new_from_iter(iter: I) -> Self {
        Parser::new(BufferedInput::new(iter))
    }
}

impl<R: std::io::Read> Parser<ReadInput<R>> {
    /// Create a new instance of a parser reading UTF-8 bytes from `reader`.
    ///
    /// Failures of the reader are reported as [`Error::Io`].
    #[must_use]
    pub fn new_from_reader(reader: R) -> Self {
        Parser::new(ReadInput::new(reader))
    }
}

impl<T: Input> Parser<T> {
    /// Create a new instance of a parser from the given input.
    pub fn new(src: T) -> Parser<T> {
        Parser {
            scanner: Scanner::new(src),
            states: Vec::new(),
            state: State::StreamStart,
            token: None,
            current: None,
            tags: HashMap::new(),
            keep_tags: false,
            anchors: LinkedHashMap::new(),
            anchor_frames: Vec::new(),
            path: Path::new(),
            error: None,
        }
    }

    /// Whether to keep tags across multiple documents when parsing.
    ///
    /// This behavior is non-standard as per the YAML specification but can be encountered in the
    /// wild. This boolean allows enabling this non-standard extension. This would result in the
    /// parser accepting input from [test
    /// QLJ7](https://github.com/yaml/yaml-test-suite/blob/ccfa74e56afb53da960847ff6e6976c0a0825709/src/QLJ7.yaml)
    /// of the yaml-test-suite:
    ///
    /// ```yaml
    /// %TAG !prefix! tag:example.com,2011:
    /// --- !prefix!A
    /// a: b
    /// --- !prefix!B
    /// c: d
    /// --- !prefix!C
    /// e: f
    /// ```
    ///
    /// With `keep_tags` set to `false`, the above YAML is rejected. As per the specification, tags
    /// only apply to the document immediately following them. This would error on `!prefix!B`.
    ///
    /// With `keep_tags` set to `true`, the above YAML is accepted by the parser.
    #[must_use]
    pub fn keep_tags(mut self, value: bool) -> Self {
        self.keep_tags = value;
        self
    }

    /// Return the location of the last event returned by [`Self::next_event`].
    ///
    /// The path is updated as described in the [`crate::path`] module: after a collection start,
    /// it points inside the collection.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the event that opened the node bound to `name` in the current document.
    ///
    /// Only anchors whose node has been completely parsed are known. For a scalar, this is the
    /// scalar event itself. The table is emptied when a document starts or ends.
    #[must_use]
    pub fn anchor(&self, name: &str) -> Option<&Event> {
        self.anchors.get(name)
    }

    /// Iterate over the completed anchors of the current document, in definition order.
    pub fn anchors(&self) -> impl Iterator<Item = (&str, &Event)> {
        self.anchors.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Try to load the next event and return it, but do not consume it from `self`.
    ///
    /// Any subsequent call to [`Parser::peek`] will return the same value, until a call to
    /// [`Iterator::next`], [`Parser::next_event`] or [`Parser::load`].
    ///
    /// # Errors
    /// Returns the error that stopped the parse. Errors are terminal: every later call returns
    /// the same error.
    pub fn peek(&mut self) -> Result<Option<&SpannedEvent>, Error> {
        if self.current.is_none() {
            self.current = self.next_raw()?;
        }
        Ok(self.current.as_ref())
    }

    /// Try to load the next event and return it, consuming it from `self`.
    ///
    /// # Return
    /// Returns `Ok(None)` once the [`Event::StreamEnd`] event has been returned.
    ///
    /// # Errors
    /// Returns the error that stopped the parse. Errors are terminal: every later call returns
    /// the same error.
    pub fn next_event(&mut self) -> Result<Option<SpannedEvent>, Error> {
        let next = self.next_raw()?;
        if let Some((ev, _)) = &next {
            self.path.before(ev);
            self.path.after(ev);
        }
        Ok(next)
    }

    /// Hand out all remaining events of the stream to `recv`.
    ///
    /// The receiver controls the parse through the [`Control`] it returns for each event.
    /// A collection skipped with [`Control::SkipSubtree`] is still parsed, and its anchors
    /// defined, but none of its events after the start reach the receiver.
    ///
    /// A parse that was terminated may be resumed with another call to [`Parser::load`].
    ///
    /// # Errors
    /// Returns the first scanning or parsing error. Events before the error have been handed
    /// out to `recv`.
    pub fn load<R: EventReceiver + ?Sized>(&mut self, recv: &mut R) -> Result<Outcome, Error> {
        while let Some((ev, span)) = self.next_raw()? {
            self.path.before(&ev);
            match recv.on_event(&ev, span, &self.path) {
                Control::Terminate => {
                    self.path.after(&ev);
                    log::debug!("parse terminated by the receiver at {}", span.start);
                    return Ok(Outcome::Terminated);
                }
                Control::SkipSubtree if ev.is_collection_start() => {
                    self.skip_subtree()?;
                    self.path.complete(Key::Complex);
                }
                Control::SkipSubtree | Control::Continue => self.path.after(&ev),
            }
        }
        Ok(Outcome::Completed)
    }

    /// Consume events up to and including the end of the collection that was just started.
    fn skip_subtree(&mut self) -> Result<(), Error> {
        let mut depth = 1usize;
        while depth > 0 {
            let Some((ev, _)) = self.next_raw()? else {
                break;
            };
            if ev.is_collection_start() {
                depth += 1;
            } else if ev.is_collection_end() {
                depth -= 1;
            }
        }
        Ok(())
    }

    /// Produce the next event, with anchors checked and recorded but the path left untouched.
    fn next_raw(&mut self) -> Result<Option<SpannedEvent>, Error> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        if let Some(ev) = self.current.take() {
            return Ok(Some(ev));
        }
        if self.state == State::End {
            return Ok(None);
        }

        let produced = self
            .state_machine()
            .and_then(|(ev, span)| self.track_anchors(&ev, span).map(|()| (ev, span)));
        match produced {
            Ok((ev, span)) => {
                match &ev {
                    Event::DocumentStart { implicit, .. } => {
                        log::debug!("document start at {} (implicit: {implicit})", span.start);
                    }
                    Event::DocumentEnd { implicit } => {
                        log::debug!("document end at {} (implicit: {implicit})", span.start);
                    }
                    _ => log::trace!("event {ev:?} at {}", span.start),
                }
                Ok(Some((ev, span)))
            }
            Err(e) => {
                log::debug!("parser failed: {e}");
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Keep the anchor table of the current document up to date with `ev`.
    fn track_anchors(&mut self, ev: &Event, span: Span) -> Result<(), Error> {
        match ev {
            Event::DocumentStart { .. } | Event::DocumentEnd { .. } => {
                self.anchors.clear();
                self.anchor_frames.clear();
            }
            Event::Scalar {
                anchor: Some(name), ..
            } => {
                self.check_anchor_is_new(name, span)?;
                self.anchors.insert(name.clone(), ev.clone());
            }
            Event::SequenceStart { anchor, .. } | Event::MappingStart { anchor, .. } => {
                if let Some(name) = anchor {
                    self.check_anchor_is_new(name, span)?;
                }
                self.anchor_frames
                    .push(anchor.clone().map(|name| (name, ev.clone())));
            }
            Event::SequenceEnd | Event::MappingEnd => {
                if let Some(Some((name, start))) = self.anchor_frames.pop() {
                    self.anchors.insert(name, start);
                }
            }
            Event::Alias { anchor } => {
                if !self.anchors.contains_key(anchor) {
                    return Err(ParseError::new(
                        ParseErrorKind::UndefinedAlias,
                        span.start,
                        format!("found undefined alias `{anchor}'"),
                    )
                    .into());
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Ensure `name` is neither a complete anchor nor the anchor of an open collection.
    fn check_anchor_is_new(&self, name: &str, span: Span) -> Result<(), Error> {
        let open = self
            .anchor_frames
            .iter()
            .flatten()
            .any(|(open, _)| open == name);
        if open || self.anchors.contains_key(name) {
            Err(ParseError::new(
                ParseErrorKind::DuplicateAnchor,
                span.start,
                format!("found duplicate anchor `{name}'"),
            )
            .into())
        } else {
            Ok(())
        }
    }

    fn state_machine(&mut self) -> ParseResult {
        match self.state {
            State::StreamStart => self.stream_start(),

            State::ImplicitDocumentStart => self.document_start(true),
            State::DocumentStart => self.document_start(false),
            State::DocumentContent => self.document_content(),
            State::DocumentEnd => self.document_end(),

            State::BlockNode => self.parse_node(true, false),

            State::BlockSequenceEntry => self.block_sequence_entry(),
            State::IndentlessSequenceEntry => self.indentless_sequence_entry(),
            State::BlockMappingKey => self.block_mapping_key(),
            State::BlockMappingValue => self.block_mapping_value(),

            State::FlowSequenceFirstEntry => self.flow_sequence_entry(true),
            State::FlowSequenceEntry => self.flow_sequence_entry(false),
            State::FlowSequenceEntryMappingKey => self.flow_sequence_entry_mapping_key(),
            State::FlowSequenceEntryMappingValue => self.flow_sequence_entry_mapping_value(),
            State::FlowSequenceEntryMappingEnd => self.flow_sequence_entry_mapping_end(),

            State::FlowMappingFirstKey => self.flow_mapping_key(true),
            State::FlowMappingKey => self.flow_mapping_key(false),
            State::FlowMappingValue => self.flow_mapping_value(false),
            State::FlowMappingEmptyValue => self.flow_mapping_value(true),

            State::End => Err(self.unexpected(
                Span::empty(self.scanner.mark()),
                "no event after the end of the stream",
            )),
        }
    }

    /// Return a reference to the next token, pulling it from the scanner if needed.
    fn peek_token(&mut self) -> Result<&Token, Error> {
        if self.token.is_none() {
            self.token = Some(self.scan_next_token()?);
        }
        self.token.as_ref().ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::UnexpectedToken,
                self.scanner.mark(),
                "unexpected end of stream",
            )
            .into()
        })
    }

    /// Take the next token out of the parser.
    fn take_token(&mut self) -> Result<Token, Error> {
        match self.token.take() {
            Some(tok) => Ok(tok),
            None => self.scan_next_token(),
        }
    }

    /// Put a token back, to be returned by the next [`Self::peek_token`] or [`Self::take_token`].
    fn put_back(&mut self, tok: Token) {
        self.token = Some(tok);
    }

    /// Drop the peeked token.
    fn skip_token(&mut self) {
        self.token = None;
    }

    /// Return the position at which the next token starts.
    fn next_mark(&mut self) -> Result<Marker, Error> {
        Ok(self.peek_token()?.0.start)
    }

    /// Return whether the next token is one of those `pred` accepts.
    fn next_is(&mut self, pred: impl FnOnce(&TokenType) -> bool) -> Result<bool, Error> {
        Ok(pred(&self.peek_token()?.1))
    }

    fn scan_next_token(&mut self) -> Result<Token, Error> {
        match self.scanner.next_token() {
            Ok(Some(tok)) => Ok(tok),
            Ok(None) => Err(self.unexpected(
                Span::empty(self.scanner.mark()),
                "unexpected end of stream",
            )),
            Err(e) => Err(e.promote_key_errors()),
        }
    }

    fn unexpected(&self, span: Span, info: &str) -> Error {
        ParseError::new(ParseErrorKind::UnexpectedToken, span.start, info).into()
    }

    fn push_state(&mut self, state: State) {
        self.states.push(state);
    }

    fn pop_state(&mut self) {
        self.state = self.states.pop().unwrap_or(State::End);
    }

    fn stream_start(&mut self) -> ParseResult {
        match self.take_token()? {
            Token(span, TokenType::StreamStart) => {
                self.state = State::ImplicitDocumentStart;
                Ok((Event::StreamStart, span))
            }
            Token(span, _) => Err(self.unexpected(span, "did not find expected <stream-start>")),
        }
    }

    fn document_start(&mut self, implicit: bool) -> ParseResult {
        while self.next_is(|t| matches!(t, TokenType::DocumentEnd))? {
            self.skip_token();
        }

        let Token(span, tok) = self.take_token()?;
        match tok {
            TokenType::StreamEnd => {
                self.state = State::End;
                Ok((Event::StreamEnd, span))
            }
            TokenType::VersionDirective(..)
            | TokenType::TagDirective(..)
            | TokenType::DocumentStart => {
                // explicit document
                self.put_back(Token(span, tok));
                self.explicit_document_start()
            }
            _ if implicit => {
                self.put_back(Token(span, tok));
                self.process_directives()?;
                self.push_state(State::DocumentEnd);
                self.state = State::BlockNode;
                Ok((
                    Event::DocumentStart {
                        implicit: true,
                        version: None,
                        tags: vec![],
                    },
                    Span::empty(span.start),
                ))
            }
            _ => Err(self.unexpected(span, "did not find expected <document start>")),
        }
    }

    /// Read the directives of a document and bring its tag handles into force.
    fn process_directives(&mut self) -> Result<(Option<(u32, u32)>, Vec<TagDirective>), Error> {
        let mut version = None;
        let mut directives: Vec<TagDirective> = vec![];
        if !self.keep_tags {
            self.tags.clear();
        }
        loop {
            let Token(span, tok) = self.take_token()?;
            match tok {
                TokenType::VersionDirective(major, minor) => {
                    if version.is_some() {
                        return Err(self.unexpected(span, "duplicate version directive"));
                    }
                    if major != 1 {
                        return Err(self.unexpected(span, "found incompatible YAML document"));
                    }
                    version = Some((major, minor));
                }
                TokenType::TagDirective(handle, prefix) => {
                    if directives.iter().any(|d| d.handle == handle) {
                        return Err(self.unexpected(
                            span,
                            "the TAG directive must only be given at most once per handle in the same document",
                        ));
                    }
                    self.tags.insert(handle.clone(), prefix.clone());
                    directives.push(TagDirective { handle, prefix });
                }
                tok => {
                    self.put_back(Token(span, tok));
                    break;
                }
            }
        }
        Ok((version, directives))
    }

    fn explicit_document_start(&mut self) -> ParseResult {
        let (version, tags) = self.process_directives()?;
        match self.take_token()? {
            Token(span, TokenType::DocumentStart) => {
                self.push_state(State::DocumentEnd);
                self.state = State::DocumentContent;
                Ok((
                    Event::DocumentStart {
                        implicit: false,
                        version,
                        tags,
                    },
                    span,
                ))
            }
            Token(span, _) => Err(self.unexpected(span, "did not find expected <document start>")),
        }
    }

    fn document_content(&mut self) -> ParseResult {
        let empty = self.next_is(|t| {
            matches!(
                t,
                TokenType::VersionDirective(..)
                    | TokenType::TagDirective(..)
                    | TokenType::DocumentStart
                    | TokenType::DocumentEnd
                    | TokenType::StreamEnd
            )
        })?;
        if empty {
            let mark = self.next_mark()?;
            self.pop_state();
            Ok(empty_scalar(None, None, mark))
        } else {
            self.parse_node(true, false)
        }
    }

    fn document_end(&mut self) -> ParseResult {
        let Token(span, tok) = self.take_token()?;
        let (implicit, span) = if tok == TokenType::DocumentEnd {
            (false, span)
        } else {
            self.put_back(Token(span, tok));
            (true, Span::empty(span.start))
        };

        if !self.keep_tags {
            self.tags.clear();
        }
        if implicit {
            if self.next_is(|t| {
                matches!(t, TokenType::VersionDirective(..) | TokenType::TagDirective(..))
            })? {
                return Err(self.unexpected(
                    span,
                    "missing explicit document end marker before directive",
                ));
            }
            self.state = State::DocumentStart;
        } else {
            self.state = State::ImplicitDocumentStart;
        }

        Ok((Event::DocumentEnd { implicit }, span))
    }

    /// Parse a node, along with its properties (anchor and tag).
    ///
    /// `block` tells whether block collections may start here. `indentless_sequence` tells
    /// whether a `-` at the current indentation starts a sequence (values of block mappings).
    fn parse_node(&mut self, block: bool, indentless_sequence: bool) -> ParseResult {
        let mut anchor = None;
        let mut tag = None;
        let mut start = None;

        loop {
            let Token(span, tok) = self.take_token()?;
            match tok {
                TokenType::Alias(name) if start.is_none() => {
                    self.pop_state();
                    return Ok((Event::Alias { anchor: name }, span));
                }
                TokenType::Anchor(name) if anchor.is_none() => {
                    start.get_or_insert(span.start);
                    anchor = Some(name);
                }
                TokenType::Tag(handle, suffix) if tag.is_none() => {
                    start.get_or_insert(span.start);
                    tag = Some(self.resolve_tag(span, &handle, suffix)?);
                }
                tok => {
                    self.put_back(Token(span, tok));
                    break;
                }
            }
        }

        let Token(span, tok) = self.take_token()?;
        let node_span = Span::new(start.unwrap_or(span.start), span.end);
        match tok {
            TokenType::BlockEntry if indentless_sequence => {
                self.put_back(Token(span, tok));
                self.state = State::IndentlessSequenceEntry;
                Ok((
                    Event::SequenceStart {
                        style: CollectionStyle::Block,
                        anchor,
                        tag,
                    },
                    Span::new(node_span.start, span.start),
                ))
            }
            TokenType::Scalar(style, value) => {
                self.pop_state();
                Ok((
                    Event::Scalar {
                        style,
                        value,
                        anchor,
                        tag,
                    },
                    node_span,
                ))
            }
            TokenType::FlowSequenceStart => {
                self.state = State::FlowSequenceFirstEntry;
                Ok((
                    Event::SequenceStart {
                        style: CollectionStyle::Flow,
                        anchor,
                        tag,
                    },
                    node_span,
                ))
            }
            TokenType::FlowMappingStart => {
                self.state = State::FlowMappingFirstKey;
                Ok((
                    Event::MappingStart {
                        style: CollectionStyle::Flow,
                        anchor,
                        tag,
                    },
                    node_span,
                ))
            }
            TokenType::BlockSequenceStart if block => {
                self.state = State::BlockSequenceEntry;
                Ok((
                    Event::SequenceStart {
                        style: CollectionStyle::Block,
                        anchor,
                        tag,
                    },
                    node_span,
                ))
            }
            TokenType::BlockMappingStart if block => {
                self.state = State::BlockMappingKey;
                Ok((
                    Event::MappingStart {
                        style: CollectionStyle::Block,
                        anchor,
                        tag,
                    },
                    node_span,
                ))
            }
            // Properties alone make an empty scalar.
            tok if anchor.is_some() || tag.is_some() => {
                self.put_back(Token(span, tok));
                self.pop_state();
                let mark = node_span.start;
                Ok(empty_scalar(anchor, tag, mark))
            }
            TokenType::Key | TokenType::BlockSequenceStart | TokenType::BlockMappingStart => {
                Err(ParseError::new(
                    ParseErrorKind::MappingKeyNotScalarOrFlow,
                    span.start,
                    "while parsing a flow node, block collections are not allowed",
                )
                .into())
            }
            _ => Err(self.unexpected(
                span,
                "while parsing a node, did not find expected node content",
            )),
        }
    }

    /// Resolve the handle of a tag against the `%TAG` directives in force.
    fn resolve_tag(&self, span: Span, handle: &str, suffix: String) -> Result<Tag, Error> {
        if handle == "!!" {
            // "!!" is a shorthand for "tag:yaml.org,2002:". However, that default can be
            // overridden.
            let prefix = self
                .tags
                .get("!!")
                .map_or(CORE_SCHEMA_PREFIX, String::as_str);
            Ok(Tag::new(prefix, suffix))
        } else if handle.is_empty() {
            // Verbatim tags and the non-specific `!` tag.
            Ok(Tag::new("", suffix))
        } else if let Some(prefix) = self.tags.get(handle) {
            Ok(Tag::new(prefix.as_str(), suffix))
        } else if handle == "!" {
            // A local tag with no `%TAG !` directive keeps its `!` handle.
            Ok(Tag::new("!", suffix))
        } else {
            Err(self.unexpected(span, &format!("the handle `{handle}' wasn't declared")))
        }
    }

    fn block_sequence_entry(&mut self) -> ParseResult {
        match self.take_token()? {
            Token(span, TokenType::BlockEnd) => {
                self.pop_state();
                Ok((Event::SequenceEnd, span))
            }
            Token(_, TokenType::BlockEntry) => {
                if self.next_is(|t| matches!(t, TokenType::BlockEntry | TokenType::BlockEnd))? {
                    let mark = self.next_mark()?;
                    self.state = State::BlockSequenceEntry;
                    Ok(empty_scalar(None, None, mark))
                } else {
                    self.push_state(State::BlockSequenceEntry);
                    self.parse_node(true, false)
                }
            }
            Token(span, _) => Err(self.unexpected(
                span,
                "while parsing a block collection, did not find expected '-' indicator",
            )),
        }
    }

    fn indentless_sequence_entry(&mut self) -> ParseResult {
        let Token(span, tok) = self.take_token()?;
        if tok != TokenType::BlockEntry {
            self.put_back(Token(span, tok));
            self.pop_state();
            return Ok((Event::SequenceEnd, Span::empty(span.start)));
        }

        if self.next_is(|t| {
            matches!(
                t,
                TokenType::BlockEntry | TokenType::Key | TokenType::Value | TokenType::BlockEnd
            )
        })? {
            let mark = self.next_mark()?;
            self.state = State::IndentlessSequenceEntry;
            Ok(empty_scalar(None, None, mark))
        } else {
            self.push_state(State::IndentlessSequenceEntry);
            self.parse_node(true, false)
        }
    }

    fn block_mapping_key(&mut self) -> ParseResult {
        match self.take_token()? {
            Token(_, TokenType::Key) => {
                if self.next_is(|t| {
                    matches!(t, TokenType::Key | TokenType::Value | TokenType::BlockEnd)
                })? {
                    let mark = self.next_mark()?;
                    self.state = State::BlockMappingValue;
                    Ok(empty_scalar(None, None, mark))
                } else {
                    self.push_state(State::BlockMappingValue);
                    self.parse_node(true, true)
                }
            }
            // A value with no key (`: value`).
            Token(span, TokenType::Value) => {
                self.put_back(Token(span, TokenType::Value));
                self.state = State::BlockMappingValue;
                Ok(empty_scalar(None, None, span.start))
            }
            Token(span, TokenType::BlockEnd) => {
                self.pop_state();
                Ok((Event::MappingEnd, span))
            }
            Token(span, _) => Err(self.unexpected(
                span,
                "while parsing a block mapping, did not find expected key",
            )),
        }
    }

    fn block_mapping_value(&mut self) -> ParseResult {
        let Token(span, tok) = self.take_token()?;
        if tok != TokenType::Value {
            self.put_back(Token(span, tok));
            self.state = State::BlockMappingKey;
            return Ok(empty_scalar(None, None, span.start));
        }

        if self.next_is(|t| matches!(t, TokenType::Key | TokenType::Value | TokenType::BlockEnd))? {
            let mark = self.next_mark()?;
            self.state = State::BlockMappingKey;
            Ok(empty_scalar(None, None, mark))
        } else {
            self.push_state(State::BlockMappingKey);
            self.parse_node(true, true)
        }
    }

    fn flow_sequence_entry(&mut self, first: bool) -> ParseResult {
        if !first {
            let Token(span, tok) = self.take_token()?;
            match tok {
                TokenType::FlowEntry => {}
                TokenType::FlowSequenceEnd => {
                    self.pop_state();
                    return Ok((Event::SequenceEnd, span));
                }
                _ => {
                    return Err(self.unexpected(
                        span,
                        "while parsing a flow sequence, expected ',' or ']'",
                    ))
                }
            }
        }

        let Token(span, tok) = self.take_token()?;
        match tok {
            TokenType::FlowSequenceEnd => {
                self.pop_state();
                Ok((Event::SequenceEnd, span))
            }
            TokenType::Key => {
                self.state = State::FlowSequenceEntryMappingKey;
                Ok((
                    Event::MappingStart {
                        style: CollectionStyle::Flow,
                        anchor: None,
                        tag: None,
                    },
                    Span::empty(span.start),
                ))
            }
            tok => {
                self.put_back(Token(span, tok));
                self.push_state(State::FlowSequenceEntry);
                self.parse_node(false, false)
            }
        }
    }

    fn flow_sequence_entry_mapping_key(&mut self) -> ParseResult {
        if self.next_is(|t| {
            matches!(
                t,
                TokenType::Value | TokenType::FlowEntry | TokenType::FlowSequenceEnd
            )
        })? {
            let mark = self.next_mark()?;
            self.state = State::FlowSequenceEntryMappingValue;
            Ok(empty_scalar(None, None, mark))
        } else {
            self.push_state(State::FlowSequenceEntryMappingValue);
            self.parse_node(false, false)
        }
    }

    fn flow_sequence_entry_mapping_value(&mut self) -> ParseResult {
        let Token(span, tok) = self.take_token()?;
        if tok != TokenType::Value {
            self.put_back(Token(span, tok));
            self.state = State::FlowSequenceEntryMappingEnd;
            return Ok(empty_scalar(None, None, span.start));
        }

        if self.next_is(|t| matches!(t, TokenType::FlowEntry | TokenType::FlowSequenceEnd))? {
            let mark = self.next_mark()?;
            self.state = State::FlowSequenceEntryMappingEnd;
            Ok(empty_scalar(None, None, mark))
        } else {
            self.push_state(State::FlowSequenceEntryMappingEnd);
            self.parse_node(false, false)
        }
    }

    fn flow_sequence_entry_mapping_end(&mut self) -> ParseResult {
        self.state = State::FlowSequenceEntry;
        let mark = self.next_mark()?;
        Ok((Event::MappingEnd, Span::empty(mark)))
    }

    fn flow_mapping_key(&mut self, first: bool) -> ParseResult {
        if !first {
            let Token(span, tok) = self.take_token()?;
            match tok {
                TokenType::FlowEntry => {}
                TokenType::FlowMappingEnd => {
                    self.pop_state();
                    return Ok((Event::MappingEnd, span));
                }
                _ => {
                    return Err(self.unexpected(
                        span,
                        "while parsing a flow mapping, did not find expected ',' or '}'",
                    ))
                }
            }
        }

        let Token(span, tok) = self.take_token()?;
        match tok {
            TokenType::FlowMappingEnd => {
                self.pop_state();
                Ok((Event::MappingEnd, span))
            }
            TokenType::Key => {
                if self.next_is(|t| {
                    matches!(
                        t,
                        TokenType::Value | TokenType::FlowEntry | TokenType::FlowMappingEnd
                    )
                })? {
                    let mark = self.next_mark()?;
                    self.state = State::FlowMappingValue;
                    Ok(empty_scalar(None, None, mark))
                } else {
                    self.push_state(State::FlowMappingValue);
                    self.parse_node(false, false)
                }
            }
            TokenType::Value => {
                self.put_back(Token(span, TokenType::Value));
                self.state = State::FlowMappingValue;
                Ok(empty_scalar(None, None, span.start))
            }
            tok => {
                self.put_back(Token(span, tok));
                self.push_state(State::FlowMappingEmptyValue);
                self.parse_node(false, false)
            }
        }
    }

    fn flow_mapping_value(&mut self, empty: bool) -> ParseResult {
        if empty {
            let mark = self.next_mark()?;
            self.state = State::FlowMappingKey;
            return Ok(empty_scalar(None, None, mark));
        }

        let Token(span, tok) = self.take_token()?;
        if tok != TokenType::Value {
            self.put_back(Token(span, tok));
            self.state = State::FlowMappingKey;
            return Ok(empty_scalar(None, None, span.start));
        }

        if self.next_is(|t| matches!(t, TokenType::FlowEntry | TokenType::FlowMappingEnd))? {
            let mark = self.next_mark()?;
            self.state = State::FlowMappingKey;
            Ok(empty_scalar(None, None, mark))
        } else {
            self.push_state(State::FlowMappingKey);
            self.parse_node(false, false)
        }
    }
}

/// The event of a node with no content: an empty plain scalar.
fn empty_scalar(anchor: Option<String>, tag: Option<Tag>, mark: Marker) -> SpannedEvent {
    (
        Event::Scalar {
            style: ScalarStyle::Plain,
            value: String::new(),
            anchor,
            tag,
        },
        Span::empty(mark),
    )
}

impl<T: Input> Iterator for Parser<T> {
    type Item = Result<SpannedEvent, Error>;

    /// Yield events until the end of the stream, or a single error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.error.is_some() {
            return None;
        }
        self.next_event().transpose()
    }
}
