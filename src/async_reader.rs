//! Asynchronous parse drivers
//!
//! Same chunk-by-chunk parsing as [`crate::csv_reader`], but chunks are
//! awaited from a [`Stream`] or a tokio [`AsyncRead`]. The parser suspends
//! only between chunks and always resumes with the state the previous chunk
//! left behind; chunks of one input are never processed concurrently.
//!
//! With [`AsyncCsvReader::offload`] the parse itself runs on tokio's blocking
//! pool. The offloaded task owns its dialect and parser outright and only
//! receives chunks over a channel, handing back the finished table.

use crate::csv::ChunkParser;
use crate::csv_reader::{finish_parser, parse_chunks};
use crate::dialect::Dialect;
use crate::error::{CsvError, Result};
use crate::source::{Utf8Decoder, DEFAULT_CHUNK_SIZE};
use crate::types::Table;
use futures::{Stream, StreamExt};
use log::debug;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

/// Chunks buffered between the reading task and an offloaded parser
const OFFLOAD_QUEUE_DEPTH: usize = 16;

/// Parse every chunk a stream yields
///
/// # Examples
///
/// ```
/// use csvstream::async_reader::parse_stream;
/// use csvstream::Dialect;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let chunks = futures::stream::iter(vec!["a,\"hello ", "world\",b\n"]);
/// let table = parse_stream(chunks, &Dialect::default()).await;
/// assert_eq!(table, vec![vec!["a", "hello world", "b"]]);
/// # }
/// ```
pub async fn parse_stream<St, S>(stream: St, dialect: &Dialect) -> Table
where
    St: Stream<Item = S>,
    S: AsRef<str>,
{
    let mut stream = std::pin::pin!(stream);
    let mut parser = ChunkParser::new(dialect.clone());
    while let Some(chunk) = stream.next().await {
        parser.feed(chunk.as_ref());
    }
    finish_parser(parser)
}

/// Parse a stream of fallible chunks, stopping at the first error
pub async fn try_parse_stream<St, S, E>(stream: St, dialect: &Dialect) -> Result<Table>
where
    St: Stream<Item = std::result::Result<S, E>>,
    S: AsRef<str>,
    E: Into<CsvError>,
{
    let mut stream = std::pin::pin!(stream);
    let mut parser = ChunkParser::new(dialect.clone());
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::into)?;
        parser.feed(chunk.as_ref());
    }
    Ok(finish_parser(parser))
}

/// Parse already-available chunks on tokio's blocking pool
///
/// # Errors
///
/// [`CsvError::Offload`] if the blocking task panics or is cancelled.
pub async fn parse_offloaded<I, S>(chunks: I, dialect: Dialect) -> Result<Table>
where
    I: IntoIterator<Item = S> + Send + 'static,
    S: AsRef<str>,
{
    debug!("offloading parse to blocking pool");
    tokio::task::spawn_blocking(move || parse_chunks(chunks, &dialect))
        .await
        .map_err(|e| CsvError::Offload(e.to_string()))
}

/// CSV reader over a tokio byte source
///
/// # Examples
///
/// ```no_run
/// use csvstream::async_reader::AsyncCsvReader;
///
/// # async fn run() -> csvstream::Result<()> {
/// let table = AsyncCsvReader::open("data.csv")
///     .await?
///     .chunk_size(16 * 1024)
///     .offload(true)
///     .read()
///     .await?;
/// println!("{} rows", table.len());
/// # Ok(())
/// # }
/// ```
pub struct AsyncCsvReader<R> {
    reader: R,
    dialect: Dialect,
    chunk_size: usize,
    offload: bool,
}

impl AsyncCsvReader<tokio::fs::File> {
    /// Open a plain CSV file (`.csv`, `.tsv`, `.txt`)
    ///
    /// # Errors
    ///
    /// [`CsvError::UnsupportedInput`] for any other extension, including
    /// compressed files, which are read with [`crate::CsvReader`].
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let path_str = path_ref
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        if !(path_str.ends_with(".csv") || path_str.ends_with(".tsv") || path_str.ends_with(".txt"))
        {
            return Err(CsvError::UnsupportedInput(format!(
                "unrecognized file type for async reading: {}",
                path_ref.display()
            )));
        }

        let file = tokio::fs::File::open(path_ref)
            .await
            .map_err(|e| CsvError::ReadError(format!("Failed to open CSV file: {}", e)))?;
        Ok(Self::new(file))
    }
}

impl<R: AsyncRead + Unpin> AsyncCsvReader<R> {
    /// Wrap an async byte source
    pub fn new(reader: R) -> Self {
        AsyncCsvReader {
            reader,
            dialect: Dialect::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            offload: false,
        }
    }

    /// Set the dialect (builder pattern)
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set how many bytes are read per chunk (builder pattern)
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Run the parse on the blocking pool instead of the calling task
    pub fn offload(mut self, enabled: bool) -> Self {
        self.offload = enabled;
        self
    }

    /// Read and parse the whole input
    pub async fn read(mut self) -> Result<Table> {
        let mut chunks = ByteChunks::new(self.chunk_size);

        if !self.offload {
            let mut parser = ChunkParser::new(self.dialect);
            while let Some(chunk) = chunks.next(&mut self.reader).await? {
                parser.feed(&chunk);
            }
            return Ok(finish_parser(parser));
        }

        debug!("offloading parse to blocking pool");
        let (tx, mut rx) = mpsc::channel::<String>(OFFLOAD_QUEUE_DEPTH);
        let dialect = self.dialect;
        let worker = tokio::task::spawn_blocking(move || {
            let mut parser = ChunkParser::new(dialect);
            while let Some(chunk) = rx.blocking_recv() {
                parser.feed(&chunk);
            }
            finish_parser(parser)
        });

        let mut read_result = Ok(());
        loop {
            match chunks.next(&mut self.reader).await {
                Ok(Some(chunk)) => {
                    // A closed channel means the worker is gone; its join
                    // error is reported below.
                    if tx.send(chunk).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    read_result = Err(e);
                    break;
                }
            }
        }
        drop(tx);

        let table = worker
            .await
            .map_err(|e| CsvError::Offload(e.to_string()))?;
        read_result?;
        Ok(table)
    }
}

/// Turns reads from an [`AsyncRead`] into decoded text chunks
struct ByteChunks {
    buffer: Vec<u8>,
    decoder: Utf8Decoder,
}

impl ByteChunks {
    fn new(chunk_size: usize) -> Self {
        Self {
            buffer: vec![0; chunk_size],
            decoder: Utf8Decoder::new(),
        }
    }

    async fn next<R: AsyncRead + Unpin>(&mut self, reader: &mut R) -> Result<Option<String>> {
        loop {
            let n = reader
                .read(&mut self.buffer)
                .await
                .map_err(|e| CsvError::ReadError(format!("Failed to read chunk: {}", e)))?;

            if n == 0 {
                self.decoder.finish()?;
                return Ok(None);
            }

            let text = self.decoder.decode(&self.buffer[..n])?;
            if !text.is_empty() {
                return Ok(Some(text));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn expected() -> Table {
        vec![
            vec!["id".to_string(), "note".to_string()],
            vec!["1".to_string(), "multi\nline, \"quoted\"".to_string()],
        ]
    }

    const INPUT: &str = "id,note\n# comment\n1,\"multi\nline, \"\"quoted\"\"\"\n";

    #[tokio::test]
    async fn test_parse_stream() {
        let chunks: Vec<String> = INPUT.chars().map(String::from).collect();
        let table = parse_stream(stream::iter(chunks), &Dialect::default()).await;
        assert_eq!(table, expected());
    }

    #[tokio::test]
    async fn test_try_parse_stream_error() {
        let chunks = vec![
            Ok("a,b\n".to_string()),
            Err(CsvError::ReadError("connection reset".to_string())),
        ];
        let result = try_parse_stream(stream::iter(chunks), &Dialect::default()).await;
        assert!(matches!(result, Err(CsvError::ReadError(_))));
    }

    #[tokio::test]
    async fn test_try_parse_stream_io_errors() -> Result<()> {
        let chunks = vec![Ok::<_, std::io::Error>("x;y\r"), Ok("\nz;w")];
        let dialect = Dialect::builder()
            .delimiter(";")
            .line_terminator("\r\n")
            .build()?;
        let table = try_parse_stream(stream::iter(chunks), &dialect).await?;
        assert_eq!(table, vec![vec!["x", "y"], vec!["z", "w"]]);
        Ok(())
    }

    #[tokio::test]
    async fn test_async_reader_small_chunks() -> Result<()> {
        let table = AsyncCsvReader::new(INPUT.as_bytes())
            .chunk_size(3)
            .read()
            .await?;
        assert_eq!(table, expected());
        Ok(())
    }

    #[tokio::test]
    async fn test_async_reader_offload() -> Result<()> {
        let table = AsyncCsvReader::new(INPUT.as_bytes())
            .chunk_size(5)
            .offload(true)
            .read()
            .await?;
        assert_eq!(table, expected());
        Ok(())
    }

    #[tokio::test]
    async fn test_offload_reports_read_error() {
        let bytes: &[u8] = &[b'a', b',', 0xff, b'\n'];
        let result = AsyncCsvReader::new(bytes).offload(true).read().await;
        assert!(matches!(result, Err(CsvError::Encoding(_))));
    }

    #[tokio::test]
    async fn test_parse_offloaded() -> Result<()> {
        let chunks = vec!["a,\"hello ".to_string(), "world\",b\n".to_string()];
        let table = parse_offloaded(chunks, Dialect::default()).await?;
        assert_eq!(table, vec![vec!["a", "hello world", "b"]]);
        Ok(())
    }

    #[tokio::test]
    async fn test_open_rejects_unsupported() {
        let result = AsyncCsvReader::open("data.csv.zst").await;
        assert!(matches!(result, Err(CsvError::UnsupportedInput(_))));
    }
}
