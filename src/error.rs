//! Error types for csvstream

use thiserror::Error;

/// Errors raised by dialect construction, input setup and I/O.
///
/// Chunk processing itself never fails: malformed CSV is resolved
/// leniently by the parser instead of being rejected.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Dialect option violates a construction rule (e.g. quote character
    /// that is not exactly one character).
    #[error("invalid dialect: {0}")]
    Configuration(String),

    /// Input is not something the reader knows how to turn into chunks.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// Byte source produced text that is not valid UTF-8.
    #[error("invalid UTF-8 in input: {0}")]
    Encoding(String),

    /// Reading from a source failed.
    #[error("read error: {0}")]
    ReadError(String),

    /// Writing output failed.
    #[error("write error: {0}")]
    WriteError(String),

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Offloaded parse did not complete.
    #[error("offloaded parse failed: {0}")]
    Offload(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CsvError>;

