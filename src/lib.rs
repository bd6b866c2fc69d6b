//! # csvstream
//!
//! Incremental CSV parsing for input that arrives in pieces.
//!
//! Chunks can be split anywhere, even in the middle of a `\r\n` terminator,
//! and the resulting table is the same as if the whole input had been parsed
//! at once. The parser records what it was doing when a chunk ended and
//! resumes from there; only a partial separator at the end of a chunk is
//! held back and looked at again.
//!
//! ## Features
//!
//! - Configurable [`Dialect`]: delimiter, line terminator, quote character,
//!   `""` escaping, initial-space skipping, comment lines
//! - Synchronous drivers for strings, iterators, [`std::io::Read`] and files
//!   (including `.csv.zst` / `.csv.gz` / `.csv.zip` archives)
//! - Async drivers for streams and tokio readers, with optional offloading
//!   of the parse to the blocking pool (feature `async`, on by default)
//! - [`stringify`] and [`CsvWriter`] to write tables back out
//!
//! ## Quick Start
//!
//! ```
//! use csvstream::{parse_chunks, stringify, Dialect};
//!
//! let dialect = Dialect::builder()
//!     .delimiter(";")
//!     .line_terminator("\r\n")
//!     .build()?;
//!
//! // A terminator split across two chunks.
//! let table = parse_chunks(["x;y\r", "\nz;w"], &dialect);
//! assert_eq!(table, vec![vec!["x", "y"], vec!["z", "w"]]);
//!
//! assert_eq!(stringify(&table, &dialect), "x;y\r\nz;w\r\n");
//! # Ok::<(), csvstream::CsvError>(())
//! ```
//!
//! ## Leniency
//!
//! Parsing never fails. Errors come only from dialect validation, unsupported
//! inputs and I/O. Malformed CSV is resolved best-effort: an unterminated
//! quoted field at end of input keeps its accumulated text, and text after a
//! closing quote is appended to the field.

pub mod csv;
pub mod csv_reader;
pub mod csv_writer;
pub mod dialect;
pub mod error;
pub mod source;
pub mod types;

#[cfg(feature = "async")]
pub mod async_reader;

pub use csv::{stringify, ChunkParser, CsvEncoder, ParseCursor};
pub use csv_reader::{parse_chunks, parse_reader, parse_source, parse_str, CsvReader};
pub use csv_writer::CsvWriter;
pub use dialect::{Dialect, DialectBuilder};
pub use error::{CsvError, Result};
pub use source::{ChunkSource, IterSource, ReaderSource};
pub use types::{Field, ParseState, Row, Table};

#[cfg(feature = "async")]
pub use async_reader::{parse_offloaded, parse_stream, try_parse_stream, AsyncCsvReader};

#[cfg(feature = "serde")]
pub use dialect::DialectConfig;
