//! CSV utilities for chunked parsing and encoding

mod encoder;
mod parser;

pub use encoder::{stringify, CsvEncoder};
pub use parser::{parse_chunk, ChunkParser, ParseCursor};

// Re-export CompressionMethod from s-zip for convenience
pub use s_zip::CompressionMethod;
