//! Character sources the scanner can read from.
//!
//! Three sources are provided:
//!   - [`StrInput`]: an in-memory `&str`, read without copying.
//!   - [`BufferedInput`]: any iterator of `char`s, with a small lookahead ring buffer.
//!   - [`ReadInput`]: any [`std::io::Read`] byte source, decoded as UTF-8 on the fly.
//!
//! [`StrInput`]: str::StrInput
//! [`BufferedInput`]: buffered::BufferedInput
//! [`ReadInput`]: read::ReadInput

pub mod buffered;
pub mod read;
pub mod str;

#[allow(clippy::module_name_repetitions)]
pub use buffered::BufferedInput;
#[allow(clippy::module_name_repetitions)]
pub use read::ReadInput;

use crate::char_traits::{is_blank_or_breakz, is_breakz, is_flow};

/// Interface for a source of characters.
///
/// The scanner never reads characters directly. It first announces how many characters it needs
/// to see through [`Input::lookahead`], then inspects them with [`Input::peek`] and
/// [`Input::peek_nth`] and finally consumes them with [`Input::skip`] or [`Input::skip_n`].
pub trait Input {
    /// A hint to the input source that we will need to read `count` characters.
    ///
    /// If the input is exhausted, `\0` is used to pad the last characters.
    /// The characters must not be consumed, but may be placed in an internal buffer.
    fn lookahead(&mut self, count: usize);

    /// Return the number of buffered characters in `self`.
    #[must_use]
    fn buflen(&self) -> usize;

    /// Return the capacity of the buffer in `self`.
    #[must_use]
    fn bufmaxlen(&self) -> usize;

    /// Return whether the buffer (!= stream) is empty.
    #[inline]
    #[must_use]
    fn buf_is_empty(&self) -> bool {
        self.buflen() == 0
    }

    /// Consume the next character.
    fn skip(&mut self);

    /// Consume the next `count` characters.
    fn skip_n(&mut self, count: usize);

    /// Return the next character, without consuming it.
    ///
    /// The character must have been loaded through a prior call to [`Input::lookahead`].
    ///
    /// # Return
    /// If the input source is not exhausted, returns the next character to be fed into the
    /// scanner. Otherwise, returns `\0`.
    #[must_use]
    fn peek(&self) -> char;

    /// Return the `n`-th character in the buffer, without consuming it.
    ///
    /// The character must have been loaded through a prior call to [`Input::lookahead`].
    #[must_use]
    fn peek_nth(&self, n: usize) -> char;

    /// Load the next character and return it without consuming it.
    #[inline]
    #[must_use]
    fn look_ch(&mut self) -> char {
        self.lookahead(1);
        self.peek()
    }

    /// Return whether the next character in the input source is equal to `c`.
    #[inline]
    #[must_use]
    fn next_char_is(&self, c: char) -> bool {
        self.peek() == c
    }

    /// Return whether the `n`-th character in the input source is equal to `c`.
    #[inline]
    #[must_use]
    fn nth_char_is(&self, n: usize, c: char) -> bool {
        self.peek_nth(n) == c
    }

    /// Return whether the next 2 characters in the input source match the given characters.
    #[inline]
    #[must_use]
    fn next_2_are(&self, c1: char, c2: char) -> bool {
        self.peek() == c1 && self.peek_nth(1) == c2
    }

    /// Return whether the next 3 characters in the input source match the given characters.
    #[inline]
    #[must_use]
    fn next_3_are(&self, c1: char, c2: char, c3: char) -> bool {
        self.peek() == c1 && self.peek_nth(1) == c2 && self.peek_nth(2) == c3
    }

    /// Check whether the next characters are a document indicator (`---` or `...`).
    ///
    /// The next 4 characters must have been loaded through [`Input::lookahead`].
    #[inline]
    #[must_use]
    fn next_is_document_indicator(&self) -> bool {
        is_blank_or_breakz(self.peek_nth(3))
            && (self.next_3_are('.', '.', '.') || self.next_3_are('-', '-', '-'))
    }

    /// Check whether the next characters are a document start marker (`---`).
    ///
    /// The next 4 characters must have been loaded through [`Input::lookahead`].
    #[inline]
    #[must_use]
    fn next_is_document_start(&self) -> bool {
        self.next_3_are('-', '-', '-') && is_blank_or_breakz(self.peek_nth(3))
    }

    /// Check whether the next characters are a document end marker (`...`).
    ///
    /// The next 4 characters must have been loaded through [`Input::lookahead`].
    #[inline]
    #[must_use]
    fn next_is_document_end(&self) -> bool {
        self.next_3_are('.', '.', '.') && is_blank_or_breakz(self.peek_nth(3))
    }

    /// Skip yaml whitespace at most up to eol. Also skips comments. Advances the input.
    ///
    /// # Return
    /// Return what was consumed and the result of skipping whitespace. No end-of-line character
    /// is ever consumed, so the column can be advanced by [`Consumed::chars`].
    ///
    /// # Errors
    /// Errors if a comment is encountered but it was not preceded by a whitespace. In that event,
    /// [`Consumed`] accounts for what was consumed prior to reaching the `#`.
    fn skip_ws_to_eol(&mut self, skip_tabs: SkipTabs) -> (Consumed, Result<SkipTabs, &'static str>) {
        let mut encountered_tab = false;
        let mut has_yaml_ws = false;
        let mut consumed = Consumed::default();
        loop {
            match self.look_ch() {
                ' ' => {
                    has_yaml_ws = true;
                    self.skip();
                    consumed.add(' ');
                }
                '\t' if skip_tabs != SkipTabs::No => {
                    encountered_tab = true;
                    self.skip();
                    consumed.add('\t');
                }
                // YAML comments must be preceded by whitespace.
                '#' if !encountered_tab && !has_yaml_ws => {
                    return (
                        consumed,
                        Err("comments must be separated from other tokens by whitespace"),
                    );
                }
                '#' => loop {
                    let c = self.look_ch();
                    if is_breakz(c) {
                        break;
                    }
                    self.skip();
                    consumed.add(c);
                },
                _ => break,
            }
        }

        (consumed, Ok(SkipTabs::Result(encountered_tab, has_yaml_ws)))
    }

    /// Check whether the next characters may be part of a plain scalar.
    ///
    /// This function assumes we are not given a blankz character.
    #[allow(clippy::inline_always)]
    #[inline(always)]
    fn next_can_be_plain_scalar(&self, in_flow: bool) -> bool {
        let nc = self.peek_nth(1);
        match self.peek() {
            // indicators can end a plain scalar, see 7.3.3. Plain Style
            ':' if is_blank_or_breakz(nc) || (in_flow && is_flow(nc)) => false,
            c if in_flow && is_flow(c) => false,
            _ => true,
        }
    }

    /// Take the failure that ended the stream early, if any.
    ///
    /// Sources that cannot fail (in-memory strings, iterators) keep the default implementation.
    /// Sources backed by I/O report here why they started returning `\0`.
    fn take_error(&mut self) -> Option<InputError> {
        None
    }
}

/// How much input was consumed by a bulk skipping operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Consumed {
    /// Number of characters consumed.
    pub chars: usize,
    /// Number of UTF-8 bytes consumed.
    pub bytes: usize,
}

impl Consumed {
    fn add(&mut self, c: char) {
        self.chars += 1;
        self.bytes += c.len_utf8();
    }
}

/// Behavior to adopt regarding treating tabs as whitespace.
///
/// Although tab is a valid yaml whitespace, it doesn't always behave the same as a space.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SkipTabs {
    /// Skip all tabs as whitespace.
    Yes,
    /// Don't skip any tab. Return from the function when encountering one.
    No,
    /// Return value from the function.
    Result(
        /// Whether tabs were encountered.
        bool,
        /// Whether at least 1 valid yaml whitespace has been encountered.
        bool,
    ),
}

impl SkipTabs {
    /// Whether tabs were found while skipping whitespace.
    ///
    /// This function must be called after a call to `skip_ws_to_eol`.
    #[must_use]
    pub fn found_tabs(self) -> bool {
        matches!(self, SkipTabs::Result(true, _))
    }

    /// Whether a valid YAML whitespace has been found in skipped-over content.
    ///
    /// This function must be called after a call to `skip_ws_to_eol`.
    #[must_use]
    pub fn has_valid_yaml_ws(self) -> bool {
        matches!(self, SkipTabs::Result(_, true))
    }
}

/// Why an input source stopped producing characters before its end.
#[derive(Debug)]
pub enum InputError {
    /// The underlying byte source failed.
    Io(std::io::Error),
    /// The byte source does not contain valid UTF-8.
    InvalidUtf8 {
        /// Offset, in bytes from the start of the source, of the first invalid byte.
        offset: usize,
    },
}
