//! A character source over any `char` iterator, backed by a fixed-size ring buffer.

use crate::input::Input;

use arraydeque::ArrayDeque;

/// The size of the [`BufferedInput`] buffer.
///
/// The buffer is statically allocated. Lookaheads are 4 characters at most, except for escape
/// sequences in double-quoted scalars which need up to 10 (`\U` and 8 hexadecimal digits).
const BUFFER_LEN: usize = 16;

/// A wrapper around an [`Iterator`] of [`char`]s with a lookahead buffer.
///
/// Streams cannot be peeked arbitrarily far. The scanner needs a few characters of lookahead, which
/// this structure keeps in a fixed-size ring buffer.
pub struct BufferedInput<T: Iterator<Item = char>> {
    /// The iterator source.
    input: T,
    /// Buffer for the next characters to consume.
    buffer: ArrayDeque<char, BUFFER_LEN>,
}

impl<T: Iterator<Item = char>> BufferedInput<T> {
    /// Create a new [`BufferedInput`] with the given input.
    pub fn new(input: T) -> Self {
        Self {
            input,
            buffer: ArrayDeque::default(),
        }
    }

    /// Mutable access to the wrapped iterator.
    pub(crate) fn source_mut(&mut self) -> &mut T {
        &mut self.input
    }
}

impl<T: Iterator<Item = char>> Input for BufferedInput<T> {
    #[inline]
    fn lookahead(&mut self, count: usize) {
        let count = count.min(BUFFER_LEN);
        while self.buffer.len() < count {
            // The loop condition guarantees there is room left in the buffer.
            if self
                .buffer
                .push_back(self.input.next().unwrap_or('\0'))
                .is_err()
            {
                break;
            }
        }
    }

    #[inline]
    fn buflen(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    fn bufmaxlen(&self) -> usize {
        BUFFER_LEN
    }

    #[inline]
    fn skip(&mut self) {
        if self.buffer.pop_front().is_none() {
            // The scanner skipped a character it did not look at.
            self.input.next();
        }
    }

    #[inline]
    fn skip_n(&mut self, count: usize) {
        for _ in 0..count {
            self.skip();
        }
    }

    #[inline]
    fn peek(&self) -> char {
        self.buffer.front().copied().unwrap_or('\0')
    }

    #[inline]
    fn peek_nth(&self, n: usize) -> char {
        self.buffer.get(n).copied().unwrap_or('\0')
    }
}

#[cfg(test)]
mod test {
    use crate::input::Input;

    use super::BufferedInput;

    #[test]
    fn lookahead_pads_exhausted_iterators() {
        let mut input = BufferedInput::new("ab".chars());
        input.lookahead(4);
        assert_eq!(input.buflen(), 4);
        assert!(input.next_2_are('a', 'b'));
        assert_eq!(input.peek_nth(2), '\0');
        input.skip_n(2);
        assert_eq!(input.look_ch(), '\0');
    }

    #[test]
    fn document_markers() {
        let mut input = BufferedInput::new("--- a".chars());
        input.lookahead(4);
        assert!(input.next_is_document_start());
        assert!(!input.next_is_document_end());
    }
}
