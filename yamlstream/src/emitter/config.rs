//! Settings of the emitters.

/// How collections are laid out.
#[derive(Clone, Copy, PartialEq, Debug, Eq, Default)]
pub enum EmitMode {
    /// Honour the style of each collection event. Collections with no style are written in block
    /// style.
    #[default]
    Original,
    /// Write every collection in block style, except within flow collections.
    Block,
    /// Write every collection in flow style.
    Flow,
}

/// Settings of an [`EventEmitter`].
///
/// ```
/// use yamlstream::{EmitMode, EmitterConfig};
///
/// let config = EmitterConfig::default().indent(4).mode(EmitMode::Flow);
/// assert_eq!(config.indent, 4);
/// assert_eq!(EmitterConfig::default().indent(12).indent, 9);
/// ```
///
/// [`EventEmitter`]: crate::EventEmitter
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Copy, PartialEq, Debug, Eq)]
pub struct EmitterConfig {
    /// How many spaces are added to a nested indentation level, in `2..=9`.
    pub indent: usize,
    /// Whether to use compact in-line notation, as described for block
    /// [sequences](http://www.yaml.org/spec/1.2/spec.html#id2797382)
    /// and
    /// [mappings](http://www.yaml.org/spec/1.2/spec.html#id2798057).
    ///
    /// In this form, the first entry of a block collection nested in a sequence is written on the
    /// line of the parent's `- ` indicator. Collections with properties (anchor or tag) are never
    /// written compactly.
    pub compact: bool,
    /// Whether scalars whose style is left to the emitter are written in [literal style] when
    /// they span multiple lines.
    ///
    /// [literal style]: https://yaml.org/spec/1.2/spec.html#id2795688
    pub multiline_strings: bool,
    /// How collections are laid out.
    pub mode: EmitMode,
    /// Whether tags are left out of the output.
    pub strip_tags: bool,
    /// Whether the stream ends with a line break.
    pub ending_newline: bool,
    /// Whether the entries of mappings are written ordered by key.
    ///
    /// Scalar keys come first, by value. Other keys follow in their original order. Only
    /// [`NodeEmitter`] sorts keys: an [`EventEmitter`] writes entries as they come.
    ///
    /// [`NodeEmitter`]: crate::NodeEmitter
    pub sort_keys: bool,
    /// Whether anchors are left out of the output. Aliases are then replaced by a copy of the
    /// node they refer to.
    pub strip_anchors: bool,
    /// Whether `---` and `...` markers are left out of the output wherever the documents can be
    /// read back without them.
    pub strip_doc_indicators: bool,
}

impl EmitterConfig {
    /// The smallest indentation step.
    pub const MIN_INDENT: usize = 2;
    /// The largest indentation step.
    pub const MAX_INDENT: usize = 9;

    /// Set the indentation step, clamped to [`Self::MIN_INDENT`]`..=`[`Self::MAX_INDENT`].
    #[must_use]
    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent.clamp(Self::MIN_INDENT, Self::MAX_INDENT);
        self
    }

    /// Turn compact in-line notation on or off.
    #[must_use]
    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Turn literal style for multiline strings on or off.
    #[must_use]
    pub fn multiline_strings(mut self, multiline_strings: bool) -> Self {
        self.multiline_strings = multiline_strings;
        self
    }

    /// Set how collections are laid out.
    #[must_use]
    pub fn mode(mut self, mode: EmitMode) -> Self {
        self.mode = mode;
        self
    }

    /// Leave tags out of the output, or not.
    #[must_use]
    pub fn strip_tags(mut self, strip_tags: bool) -> Self {
        self.strip_tags = strip_tags;
        self
    }

    /// End the stream with a line break, or not.
    #[must_use]
    pub fn ending_newline(mut self, ending_newline: bool) -> Self {
        self.ending_newline = ending_newline;
        self
    }

    /// Sort the entries of mappings by key, or not.
    #[must_use]
    pub fn sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }

    /// Leave anchors out of the output, or not.
    #[must_use]
    pub fn strip_anchors(mut self, strip_anchors: bool) -> Self {
        self.strip_anchors = strip_anchors;
        self
    }

    /// Leave out the document markers that are not needed, or not.
    #[must_use]
    pub fn strip_doc_indicators(mut self, strip_doc_indicators: bool) -> Self {
        self.strip_doc_indicators = strip_doc_indicators;
        self
    }

    /// Return the indentation step, clamped in case the field was set directly.
    pub(crate) fn indent_step(&self) -> usize {
        self.indent.clamp(Self::MIN_INDENT, Self::MAX_INDENT)
    }
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            indent: 2,
            compact: true,
            multiline_strings: false,
            mode: EmitMode::Original,
            strip_tags: false,
            ending_newline: true,
            sort_keys: false,
            strip_anchors: false,
            strip_doc_indicators: false,
        }
    }
}
