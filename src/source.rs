//! Pull-based chunk sources
//!
//! The parser only needs something that can hand out the next piece of text
//! or say the input is over. [`ChunkSource`] is that capability; adapters
//! here cover iterators of strings and any [`std::io::Read`].

use crate::error::{CsvError, Result};
use std::io::{ErrorKind, Read};

/// Default number of bytes requested per read from a byte source
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A source of text chunks
pub trait ChunkSource {
    /// Return the next chunk, or `None` once the input is exhausted
    fn next_chunk(&mut self) -> Result<Option<String>>;
}

impl<T: ChunkSource + ?Sized> ChunkSource for Box<T> {
    fn next_chunk(&mut self) -> Result<Option<String>> {
        (**self).next_chunk()
    }
}

/// Chunk source over an iterator of strings
///
/// # Examples
///
/// ```
/// use csvstream::source::{ChunkSource, IterSource};
///
/// let mut source = IterSource::new(vec!["a,", "b\n"]);
/// assert_eq!(source.next_chunk().unwrap().as_deref(), Some("a,"));
/// ```
#[derive(Debug, Clone)]
pub struct IterSource<I> {
    inner: I,
}

impl<I> IterSource<I> {
    /// Wrap anything that iterates over chunks
    pub fn new<T>(chunks: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            inner: chunks.into_iter(),
        }
    }
}

impl<I, S> ChunkSource for IterSource<I>
where
    I: Iterator<Item = S>,
    S: Into<String>,
{
    fn next_chunk(&mut self) -> Result<Option<String>> {
        Ok(self.inner.next().map(Into::into))
    }
}

/// Incremental UTF-8 decoder for byte chunks
///
/// A character split across two reads is held back until its remaining
/// bytes arrive.
#[derive(Debug, Default)]
pub(crate) struct Utf8Decoder {
    pending: Vec<u8>,
    offset: usize,
}

impl Utf8Decoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `pending + bytes` as forms complete characters
    pub(crate) fn decode(&mut self, bytes: &[u8]) -> Result<String> {
        self.pending.extend_from_slice(bytes);

        let valid = match std::str::from_utf8(&self.pending) {
            Ok(_) => self.pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                return Err(CsvError::Encoding(format!(
                    "invalid byte sequence at offset {}",
                    self.offset + e.valid_up_to()
                )))
            }
        };

        let tail = self.pending.split_off(valid);
        let head = std::mem::replace(&mut self.pending, tail);
        self.offset += head.len();
        String::from_utf8(head).map_err(|e| CsvError::Encoding(e.to_string()))
    }

    /// Check nothing is left over at end of input
    pub(crate) fn finish(&self) -> Result<()> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(CsvError::Encoding(format!(
                "input ends inside a UTF-8 sequence at offset {}",
                self.offset
            )))
        }
    }
}

/// Chunk source over a byte reader
///
/// Reads up to `chunk_size` bytes at a time and decodes them as UTF-8.
pub struct ReaderSource<R> {
    reader: R,
    buffer: Vec<u8>,
    decoder: Utf8Decoder,
    done: bool,
}

impl<R: Read> ReaderSource<R> {
    /// Create a source with the default chunk size
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// Create a source reading `chunk_size` bytes per chunk
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buffer: vec![0; chunk_size.max(1)],
            decoder: Utf8Decoder::new(),
            done: false,
        }
    }
}

impl<R: Read> ChunkSource for ReaderSource<R> {
    fn next_chunk(&mut self) -> Result<Option<String>> {
        while !self.done {
            let n = match self.reader.read(&mut self.buffer) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(CsvError::ReadError(format!("Failed to read chunk: {}", e))),
            };

            if n == 0 {
                self.done = true;
                self.decoder.finish()?;
                break;
            }

            let text = self.decoder.decode(&self.buffer[..n])?;
            if !text.is_empty() {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn drain<S: ChunkSource>(mut source: S) -> Result<Vec<String>> {
        let mut chunks = Vec::new();
        while let Some(chunk) = source.next_chunk()? {
            chunks.push(chunk);
        }
        Ok(chunks)
    }

    #[test]
    fn test_iter_source() -> Result<()> {
        let chunks = drain(IterSource::new(vec!["a", "b"]))?;
        assert_eq!(chunks, vec!["a", "b"]);
        Ok(())
    }

    #[test]
    fn test_reader_source_chunking() -> Result<()> {
        let source = ReaderSource::with_chunk_size(Cursor::new("abcdefg"), 3);
        assert_eq!(drain(source)?, vec!["abc", "def", "g"]);
        Ok(())
    }

    #[test]
    fn test_split_multibyte_char() -> Result<()> {
        // "é" is two bytes, so every chunk boundary lands inside one.
        let source = ReaderSource::with_chunk_size(Cursor::new("éééé".as_bytes()), 3);
        assert_eq!(drain(source)?.concat(), "éééé");
        Ok(())
    }

    #[test]
    fn test_one_byte_chunks() -> Result<()> {
        let source = ReaderSource::with_chunk_size(Cursor::new("a€b".as_bytes()), 1);
        assert_eq!(drain(source)?, vec!["a", "€", "b"]);
        Ok(())
    }

    #[test]
    fn test_invalid_utf8() {
        let source = ReaderSource::new(Cursor::new(vec![b'a', 0xff, b'b']));
        assert!(matches!(drain(source), Err(CsvError::Encoding(_))));
    }

    #[test]
    fn test_truncated_utf8() {
        let source = ReaderSource::new(Cursor::new(vec![b'a', 0xc3]));
        assert!(matches!(drain(source), Err(CsvError::Encoding(_))));
    }
}
