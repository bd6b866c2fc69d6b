//! Synchronous parse drivers
//!
//! Feed chunks to the parser one after another, carrying the parse state
//! between them, then finalize and hand back the whole [`Table`].

use crate::csv::ChunkParser;
use crate::dialect::Dialect;
use crate::error::{CsvError, Result};
use crate::source::{ChunkSource, ReaderSource, DEFAULT_CHUNK_SIZE};
use crate::types::Table;
use log::debug;
use s_zip::StreamingZipReader;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Parse text that is already fully in memory
///
/// # Examples
///
/// ```
/// use csvstream::{parse_str, Dialect};
///
/// let table = parse_str("a,b\nc,d", &Dialect::default());
/// assert_eq!(table, vec![vec!["a", "b"], vec!["c", "d"]]);
/// ```
pub fn parse_str(text: &str, dialect: &Dialect) -> Table {
    let mut parser = ChunkParser::new(dialect.clone());
    parser.feed(text);
    finish_parser(parser)
}

/// Parse a sequence of chunks
///
/// The result does not depend on where the chunk boundaries fall.
///
/// # Examples
///
/// ```
/// use csvstream::{parse_chunks, Dialect};
///
/// let table = parse_chunks(["a,\"hello ", "world\",b\n"], &Dialect::default());
/// assert_eq!(table, vec![vec!["a", "hello world", "b"]]);
/// ```
pub fn parse_chunks<I, S>(chunks: I, dialect: &Dialect) -> Table
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = ChunkParser::new(dialect.clone());
    for chunk in chunks {
        parser.feed(chunk.as_ref());
    }
    finish_parser(parser)
}

/// Parse everything a [`ChunkSource`] produces
pub fn parse_source<S>(source: &mut S, dialect: &Dialect) -> Result<Table>
where
    S: ChunkSource + ?Sized,
{
    let mut parser = ChunkParser::new(dialect.clone());
    while let Some(chunk) = source.next_chunk()? {
        parser.feed(&chunk);
    }
    Ok(finish_parser(parser))
}

/// Parse UTF-8 text from a byte reader, `DEFAULT_CHUNK_SIZE` bytes at a time
pub fn parse_reader<R: Read>(reader: R, dialect: &Dialect) -> Result<Table> {
    parse_source(&mut ReaderSource::new(reader), dialect)
}

/// Finalize a parser, logging how much input it consumed
pub(crate) fn finish_parser(parser: ChunkParser) -> Table {
    let chunks = parser.chunk_count();
    let table = parser.finish();
    debug!("loaded {} chunks into {} rows", chunks, table.len());
    table
}

/// Where a [`CsvReader`] gets its bytes from
enum Input {
    Text(String),
    File(File),
    Archive {
        zip: StreamingZipReader,
        entry: String,
    },
}

/// CSV reader that drives the chunk parser over a text, file or archive
///
/// Automatically handles compressed files (.csv.zst, .csv.gz, .csv.zip).
/// Files and archive entries are read `chunk_size` bytes at a time, so a row
/// or quoted field may straddle any number of reads. Archive entries are
/// decompressed as they are read.
///
/// # Examples
///
/// ```no_run
/// use csvstream::{CsvReader, Dialect};
///
/// let dialect = Dialect::builder().delimiter(";").build()?;
/// let table = CsvReader::open("data.csv")?
///     .dialect(dialect)
///     .read()?;
///
/// for row in &table {
///     println!("{:?}", row);
/// }
/// # Ok::<(), csvstream::CsvError>(())
/// ```
pub struct CsvReader {
    input: Input,
    dialect: Dialect,
    chunk_size: usize,
}

impl CsvReader {
    /// Open CSV file - auto-detects compression from file extension
    ///
    /// # File Extensions
    /// - `.csv`, `.tsv`, `.txt` → Uncompressed, direct read
    /// - `.csv.zst`, `.csv.zip` → Zstd decompression
    /// - `.csv.gz` → Deflate/Gzip decompression
    ///
    /// # Errors
    ///
    /// [`CsvError::UnsupportedInput`] for any other extension, or when an
    /// archive has no entries. Nothing is parsed in that case.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let path_str = path_ref
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let input = if path_str.ends_with(".csv.zst")
            || path_str.ends_with(".csv.zip")
            || path_str.ends_with(".csv.gz")
        {
            open_archive(path_ref)?
        } else if path_str.ends_with(".csv")
            || path_str.ends_with(".tsv")
            || path_str.ends_with(".txt")
        {
            let file = File::open(path_ref)
                .map_err(|e| CsvError::ReadError(format!("Failed to open CSV file: {}", e)))?;
            Input::File(file)
        } else {
            return Err(CsvError::UnsupportedInput(format!(
                "unrecognized file type: {}",
                path_ref.display()
            )));
        };

        Ok(Self::with_input(input))
    }

    /// Read from text that is already in memory
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::with_input(Input::Text(text.into()))
    }

    fn with_input(input: Input) -> Self {
        CsvReader {
            input,
            dialect: Dialect::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the dialect (builder pattern)
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set how many bytes are read per chunk (builder pattern)
    ///
    /// Only affects file and archive input; text input is one chunk.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    /// Parse the whole input and return the table
    pub fn read(self) -> Result<Table> {
        match self.input {
            Input::Text(text) => Ok(parse_str(&text, &self.dialect)),
            Input::File(file) => parse_source(
                &mut ReaderSource::with_chunk_size(file, self.chunk_size),
                &self.dialect,
            ),
            Input::Archive { mut zip, entry } => {
                let stream = zip.read_entry_streaming_by_name(&entry).map_err(|e| {
                    CsvError::ReadError(format!("Failed to read ZIP entry: {}", e))
                })?;
                let mut source = ReaderSource::with_chunk_size(stream, self.chunk_size);
                let table = parse_source(&mut source, &self.dialect)?;
                Ok(table)
            }
        }
    }
}

/// Open a compressed archive and pick its CSV entry
fn open_archive(path: &Path) -> Result<Input> {
    let zip = StreamingZipReader::open(path)
        .map_err(|e| CsvError::ReadError(format!("Failed to open ZIP: {}", e)))?;

    // Find first .csv entry
    let entry = zip
        .entries()
        .iter()
        .find(|e| e.name.ends_with(".csv"))
        .or_else(|| zip.entries().first())
        .ok_or_else(|| CsvError::UnsupportedInput("No CSV entry found in archive".to_string()))?
        .name
        .clone();

    Ok(Input::Archive { zip, entry })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv::CompressionMethod;
    use crate::csv_writer::CsvWriter;
    use crate::source::IterSource;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn test_parse_str_scenarios() {
        let dialect = Dialect::default();
        assert!(parse_str("", &dialect).is_empty());
        assert!(parse_str("#hello", &dialect).is_empty());
        assert_eq!(
            parse_str("a,b\nc,d\n", &dialect),
            vec![vec!["a", "b"], vec!["c", "d"]]
        );
    }

    #[test]
    fn test_parse_chunks_with_empty_chunks() {
        let table = parse_chunks(["", "a,", "", "b\nc", ""], &Dialect::default());
        assert_eq!(table, vec![vec!["a", "b"], vec!["c"]]);
    }

    #[test]
    fn test_parse_source() -> Result<()> {
        let mut source = IterSource::new(vec!["x;y\r", "\nz;w"]);
        let dialect = Dialect::builder()
            .delimiter(";")
            .line_terminator("\r\n")
            .build()?;
        assert_eq!(
            parse_source(&mut source, &dialect)?,
            vec![vec!["x", "y"], vec!["z", "w"]]
        );
        Ok(())
    }

    #[test]
    fn test_parse_reader() -> Result<()> {
        let table = parse_reader(Cursor::new("a,\"b\nc\"\n"), &Dialect::default())?;
        assert_eq!(table, vec![vec!["a", "b\nc"]]);
        Ok(())
    }

    #[test]
    fn test_from_text_with_dialect() -> Result<()> {
        let dialect = Dialect::builder().delimiter("\t").no_comments().build()?;
        let table = CsvReader::from_text("#id\tname\n1\tAlice\n")
            .dialect(dialect)
            .read()?;
        assert_eq!(table, vec![vec!["#id", "name"], vec!["1", "Alice"]]);
        Ok(())
    }

    #[test]
    fn test_archive_streamed_in_small_chunks() -> Result<()> {
        let dir = tempdir()?;
        let rows: Vec<Vec<String>> = (0..200)
            .map(|i| vec![format!("row {}", i), format!("multi\nline {}", i)])
            .collect();

        for (name, method, level) in [
            ("stream.csv.zst", CompressionMethod::Zstd, 3),
            ("stream.csv.gz", CompressionMethod::Deflate, 6),
        ] {
            let path = dir.path().join(name);
            let mut writer = CsvWriter::with_compression(&path, method, level)?;
            writer.write_rows_batch(&rows)?;
            writer.save()?;

            let table = CsvReader::open(&path)?.chunk_size(7).read()?;
            assert_eq!(table, rows);
        }
        Ok(())
    }

    #[test]
    fn test_unsupported_extension() {
        let err = CsvReader::open("report.xlsx").err();
        assert!(matches!(err, Some(CsvError::UnsupportedInput(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = CsvReader::open("definitely_missing_file.csv").err();
        assert!(matches!(err, Some(CsvError::ReadError(_))));
    }
}
