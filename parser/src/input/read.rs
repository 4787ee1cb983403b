//! A character source over any byte reader, decoded as UTF-8 with `encoding_rs`.

use std::io::{self, Read};

use encoding_rs::{Decoder, DecoderResult, UTF_8};

use crate::input::{BufferedInput, Input, InputError};

/// Size of the chunks requested from the byte source.
const CHUNK_LEN: usize = 8192;

/// A character source decoding UTF-8 from any [`Read`] implementation.
///
/// Bytes are pulled from the reader in chunks as the scanner needs them. Multi-byte sequences
/// may straddle two reads, and a leading byte-order mark is dropped. When the reader fails or
/// produces invalid UTF-8, the input behaves as if the stream ended and keeps the failure for
/// [`Input::take_error`].
pub struct ReadInput<R: Read> {
    inner: BufferedInput<DecodedChars<R>>,
}

impl<R: Read> ReadInput<R> {
    /// Create a new [`ReadInput`] reading from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufferedInput::new(DecodedChars::new(reader)),
        }
    }
}

impl<R: Read> Input for ReadInput<R> {
    #[inline]
    fn lookahead(&mut self, count: usize) {
        self.inner.lookahead(count);
    }

    #[inline]
    fn buflen(&self) -> usize {
        self.inner.buflen()
    }

    #[inline]
    fn bufmaxlen(&self) -> usize {
        self.inner.bufmaxlen()
    }

    #[inline]
    fn skip(&mut self) {
        self.inner.skip();
    }

    #[inline]
    fn skip_n(&mut self, count: usize) {
        self.inner.skip_n(count);
    }

    #[inline]
    fn peek(&self) -> char {
        self.inner.peek()
    }

    #[inline]
    fn peek_nth(&self, n: usize) -> char {
        self.inner.peek_nth(n)
    }

    fn take_error(&mut self) -> Option<InputError> {
        self.inner.source_mut().error.take()
    }
}

/// An iterator over the `char`s of a UTF-8 byte stream, decoded one chunk at a time.
struct DecodedChars<R: Read> {
    reader: R,
    decoder: Decoder,
    /// The last chunk of bytes read from `reader`.
    chunk: Box<[u8]>,
    /// The characters decoded from the last chunk. Those not handed out yet are
    /// `decoded[pos..]`.
    decoded: String,
    pos: usize,
    /// Number of bytes fed to the decoder so far.
    consumed: usize,
    /// Whether the decoder was given the end of the stream.
    eof: bool,
    /// A decoding error, reported once the characters decoded before it are handed out.
    malformed: Option<InputError>,
    /// Whether we stopped because of an error. Once set, no more characters are produced.
    failed: bool,
    /// The error that stopped decoding, until it is taken.
    error: Option<InputError>,
}

impl<R: Read> DecodedChars<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            decoder: UTF_8.new_decoder_with_bom_removal(),
            chunk: vec![0; CHUNK_LEN].into_boxed_slice(),
            decoded: String::new(),
            pos: 0,
            consumed: 0,
            eof: false,
            malformed: None,
            failed: false,
            error: None,
        }
    }

    fn fail(&mut self, error: InputError) {
        log::debug!("input stopped: {error:?}");
        self.failed = true;
        self.error = Some(error);
    }

    /// Read the next chunk from `reader` and decode it in place of the previous one.
    fn decode_chunk(&mut self) -> io::Result<()> {
        let len = loop {
            match self.reader.read(&mut self.chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        };
        let last = len == 0;
        self.decoded.clear();
        self.pos = 0;

        let mut input = &self.chunk[..len];
        if let Some(needed) = self
            .decoder
            .max_utf8_buffer_length_without_replacement(input.len())
        {
            self.decoded.reserve(needed);
        }
        loop {
            let (result, read) =
                self.decoder
                    .decode_to_string_without_replacement(input, &mut self.decoded, last);
            self.consumed += read;
            input = &input[read..];
            match result {
                DecoderResult::InputEmpty => break,
                DecoderResult::OutputFull => self.decoded.reserve(input.len().max(4)),
                DecoderResult::Malformed(malformed_len, bytes_after_malformed) => {
                    let offset = self.consumed.saturating_sub(
                        usize::from(malformed_len) + usize::from(bytes_after_malformed),
                    );
                    self.malformed = Some(InputError::InvalidUtf8 { offset });
                    break;
                }
            }
        }
        self.eof = last;
        Ok(())
    }
}

impl<R: Read> Iterator for DecodedChars<R> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        loop {
            if self.failed {
                return None;
            }
            if let Some(c) = self.decoded[self.pos..].chars().next() {
                self.pos += c.len_utf8();
                return Some(c);
            }
            if let Some(error) = self.malformed.take() {
                self.fail(error);
                return None;
            }
            if self.eof {
                return None;
            }
            if let Err(e) = self.decode_chunk() {
                self.fail(InputError::Io(e));
                return None;
            }
        }
    }
}
