//! A zero-copy character source over a `&str`.

use crate::{char_traits::is_blank_or_breakz, input::Input};

/// A character source over an in-memory string slice.
///
/// No buffering is involved: lookahead only records how far the scanner asked to look, and
/// characters are read straight from the slice.
#[allow(clippy::module_name_repetitions)]
pub struct StrInput<'a> {
    /// The part of the input that has not been consumed yet.
    buffer: &'a str,
    /// The number of characters the scanner asked us to look ahead for.
    ///
    /// [`Input::buflen`] must return the value last given to [`Input::lookahead`].
    lookahead: usize,
}

impl<'a> StrInput<'a> {
    /// Create a new [`StrInput`] with the given str.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            buffer: input,
            lookahead: 0,
        }
    }

    /// Return whether the remaining input starts with `marker` followed by a blank, a break or
    /// the end of the input.
    fn next_is_marker(&self, marker: &str) -> bool {
        // Markers are ascii, so the byte API of str is enough here.
        self.buffer.starts_with(marker)
            && self
                .buffer
                .as_bytes()
                .get(marker.len())
                .map_or(true, |&b| is_blank_or_breakz(b as char))
    }
}

impl Input for StrInput<'_> {
    #[inline]
    fn lookahead(&mut self, x: usize) {
        // Reading past the end of the slice returns '\0' in the peeking functions, so there is
        // nothing to load.
        self.lookahead = self.lookahead.max(x);
    }

    #[inline]
    fn buflen(&self) -> usize {
        self.lookahead
    }

    #[inline]
    fn bufmaxlen(&self) -> usize {
        BUFFER_LEN
    }

    #[inline]
    fn skip(&mut self) {
        let mut chars = self.buffer.chars();
        if chars.next().is_some() {
            self.buffer = chars.as_str();
        }
        self.lookahead = self.lookahead.saturating_sub(1);
    }

    #[inline]
    fn skip_n(&mut self, count: usize) {
        let mut chars = self.buffer.chars();
        for _ in 0..count {
            if chars.next().is_none() {
                break;
            }
        }
        self.buffer = chars.as_str();
        self.lookahead = self.lookahead.saturating_sub(count);
    }

    #[inline]
    fn peek(&self) -> char {
        self.buffer.chars().next().unwrap_or('\0')
    }

    #[inline]
    fn peek_nth(&self, n: usize) -> char {
        self.buffer.chars().nth(n).unwrap_or('\0')
    }

    #[inline]
    fn next_2_are(&self, c1: char, c2: char) -> bool {
        let mut chars = self.buffer.chars();
        chars.next() == Some(c1) && chars.next() == Some(c2)
    }

    #[inline]
    fn next_3_are(&self, c1: char, c2: char, c3: char) -> bool {
        let mut chars = self.buffer.chars();
        chars.next() == Some(c1) && chars.next() == Some(c2) && chars.next() == Some(c3)
    }

    #[inline]
    fn next_is_document_indicator(&self) -> bool {
        self.next_is_marker("---") || self.next_is_marker("...")
    }

    #[inline]
    fn next_is_document_start(&self) -> bool {
        self.next_is_marker("---")
    }

    #[inline]
    fn next_is_document_end(&self) -> bool {
        self.next_is_marker("...")
    }
}

/// The buffer size we return to the scanner.
///
/// No buffer of this size is allocated. The scanner sizes some of its loops after
/// [`Input::bufmaxlen`], so we return a value that fits what we expect a typical line to be.
const BUFFER_LEN: usize = 128;

#[cfg(test)]
mod test {
    use crate::input::Input;

    use super::StrInput;

    #[test]
    pub fn is_document_start() {
        let input = StrInput::new("---\n");
        assert!(input.next_is_document_start());
        assert!(input.next_is_document_indicator());
        let input = StrInput::new("---");
        assert!(input.next_is_document_start());
        assert!(input.next_is_document_indicator());
        let input = StrInput::new("...\n");
        assert!(!input.next_is_document_start());
        assert!(input.next_is_document_indicator());
        let input = StrInput::new("----");
        assert!(!input.next_is_document_start());
        assert!(!input.next_is_document_indicator());
    }

    #[test]
    pub fn is_document_end() {
        let input = StrInput::new("...\n");
        assert!(input.next_is_document_end());
        let input = StrInput::new("... ");
        assert!(input.next_is_document_end());
        let input = StrInput::new("---\n");
        assert!(!input.next_is_document_end());
        let input = StrInput::new("..");
        assert!(!input.next_is_document_end());
    }

    #[test]
    pub fn peeking_past_the_end_pads_with_nul() {
        let mut input = StrInput::new("né");
        input.lookahead(4);
        assert_eq!(input.peek(), 'n');
        assert_eq!(input.peek_nth(1), 'é');
        assert_eq!(input.peek_nth(2), '\0');
        input.skip_n(2);
        assert_eq!(input.peek(), '\0');
    }
}
