//! CSV file writing with streaming support and compression

use crate::csv::{CompressionMethod, CsvEncoder};
use crate::dialect::Dialect;
use crate::error::{CsvError, Result};
use s_zip::StreamingZipWriter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// CSV file writer with streaming capabilities and compression support
///
/// Writes rows one at a time using the quoting rules of its [`Dialect`],
/// streaming data directly to disk or into a compressed archive. Output
/// written with a `double_quote` dialect reads back to the same rows.
///
/// # Examples
///
/// ```no_run
/// use csvstream::CsvWriter;
///
/// let mut writer = CsvWriter::new("output.csv")?;
/// writer.write_row(["Name", "Age", "City"])?;
/// writer.write_row(["Alice", "30", "NYC"])?;
/// writer.save()?;
/// # Ok::<(), csvstream::CsvError>(())
/// ```
///
/// # Compression
///
/// Auto-detects compression from file extension:
/// - `.csv` → Uncompressed
/// - `.csv.zst` or `.csv.zip` → Zstd compression (level 3)
/// - `.csv.gz` → Deflate/Gzip compression (level 6)
pub struct CsvWriter {
    // Dual-mode output
    zip_writer: Option<StreamingZipWriter<File>>,
    direct_writer: Option<BufWriter<File>>,

    // State
    row_count: u64,
    buffer: String,

    encoder: CsvEncoder,
}

impl CsvWriter {
    /// Create a new CSV writer - auto-detects compression from file extension
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let path_str = path_ref
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        if path_str.ends_with(".csv.zst") || path_str.ends_with(".csv.zip") {
            Self::with_compression(path_ref, CompressionMethod::Zstd, 3)
        } else if path_str.ends_with(".csv.gz") {
            Self::with_compression(path_ref, CompressionMethod::Deflate, 6)
        } else {
            // Plain CSV - direct file write
            let file = File::create(path_ref)
                .map_err(|e| CsvError::WriteError(format!("Failed to create CSV file: {}", e)))?;

            Ok(CsvWriter {
                zip_writer: None,
                direct_writer: Some(BufWriter::new(file)),
                row_count: 0,
                buffer: String::with_capacity(4096),
                encoder: CsvEncoder::new(Dialect::default()),
            })
        }
    }

    /// Create a writer with explicit compression method and level
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `method` - Compression method (Zstd or Deflate)
    /// * `level` - Compression level:
    ///   - Zstd: 1-21 (recommend 3 for balanced)
    ///   - Deflate: 0-9 (recommend 6 for balanced)
    pub fn with_compression<P: AsRef<Path>>(
        path: P,
        method: CompressionMethod,
        level: u32,
    ) -> Result<Self> {
        let path_ref = path.as_ref();

        // Create ZIP with single CSV entry
        let mut zip = StreamingZipWriter::with_method(path_ref, method, level)
            .map_err(|e| CsvError::WriteError(format!("Failed to create ZIP writer: {}", e)))?;

        // Entry name: extract from path or use "data.csv"
        let entry_name = path_ref
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| {
                let clean = s
                    .trim_end_matches(".csv")
                    .trim_end_matches(".zst")
                    .trim_end_matches(".gz");
                format!("{}.csv", clean)
            })
            .unwrap_or_else(|| "data.csv".to_string());

        zip.start_entry(&entry_name)
            .map_err(|e| CsvError::WriteError(format!("Failed to start ZIP entry: {}", e)))?;

        Ok(CsvWriter {
            zip_writer: Some(zip),
            direct_writer: None,
            row_count: 0,
            buffer: String::with_capacity(4096),
            encoder: CsvEncoder::new(Dialect::default()),
        })
    }

    /// Set the output dialect (builder pattern)
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.encoder = CsvEncoder::new(dialect);
        self
    }

    /// Write a row of strings
    pub fn write_row<I, S>(&mut self, data: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        // Reuse buffer
        self.buffer.clear();

        let fields: Vec<S> = data.into_iter().collect();
        self.encoder.encode_line(&fields, &mut self.buffer);

        // Write to output
        if let Some(ref mut zip) = self.zip_writer {
            zip.write_data(self.buffer.as_bytes())
                .map_err(|e| CsvError::WriteError(format!("Failed to write to ZIP: {}", e)))?;
        } else if let Some(ref mut writer) = self.direct_writer {
            writer
                .write_all(self.buffer.as_bytes())
                .map_err(|e| CsvError::WriteError(format!("Failed to write to file: {}", e)))?;
        }

        self.row_count += 1;
        Ok(())
    }

    /// Write multiple rows at once
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use csvstream::{parse_str, CsvWriter, Dialect};
    ///
    /// let table = parse_str("a,b\nc,d\n", &Dialect::default());
    /// let mut writer = CsvWriter::new("copy.csv")?;
    /// writer.write_rows_batch(&table)?;
    /// writer.save()?;
    /// # Ok::<(), csvstream::CsvError>(())
    /// ```
    pub fn write_rows_batch<I, R, S>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for row_data in rows {
            self.write_row(row_data)?;
        }
        Ok(())
    }

    /// Get the number of rows written
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Finalize and save the CSV file
    ///
    /// This must be called to properly close the file.
    /// Consumes the writer.
    pub fn save(mut self) -> Result<()> {
        if let Some(zip) = self.zip_writer.take() {
            zip.finish()
                .map_err(|e| CsvError::WriteError(format!("Failed to finish ZIP: {}", e)))?;
        } else if let Some(mut writer) = self.direct_writer.take() {
            writer
                .flush()
                .map_err(|e| CsvError::WriteError(format!("Failed to flush file: {}", e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_reader::CsvReader;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn test_plain_csv() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("test_output.csv");
        {
            let mut writer = CsvWriter::new(&path)?;
            writer.write_row(["Name", "Age", "City"])?;
            writer.write_row(["Alice", "30", "NYC"])?;
            assert_eq!(writer.row_count(), 2);
            writer.save()?;
        }

        let mut content = String::new();
        File::open(&path)?.read_to_string(&mut content)?;
        assert_eq!(content, "Name,Age,City\nAlice,30,NYC\n");
        Ok(())
    }

    #[test]
    fn test_edge_cases_read_back() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("test_edge.csv");
        let rows = vec![
            vec!["a,b", r#"Say "Hi""#, "Line1\nLine2"],
            vec!["#not a comment", "", "x"],
        ];
        {
            let mut writer = CsvWriter::new(&path)?;
            writer.write_rows_batch(&rows)?;
            writer.save()?;
        }

        let table = CsvReader::open(&path)?.chunk_size(4).read()?;
        assert_eq!(table, rows);
        Ok(())
    }

    #[test]
    fn test_uppercase_extension_compressed() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("DATA.CSV.ZST");
        {
            let mut writer = CsvWriter::new(&path)?;
            writer.write_row(["a", "b"])?;
            writer.save()?;
        }

        let mut magic = [0u8; 4];
        File::open(&path)?.read_exact(&mut magic)?;
        assert_eq!(magic, [b'P', b'K', 3, 4]);

        let table = CsvReader::open(&path)?.read()?;
        assert_eq!(table, vec![vec!["a", "b"]]);
        Ok(())
    }

    #[test]
    fn test_custom_dialect() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("test_dialect.csv");
        let dialect = Dialect::builder()
            .delimiter(";")
            .line_terminator("\r\n")
            .build()?;
        {
            let mut writer = CsvWriter::new(&path)?.dialect(dialect.clone());
            writer.write_row(["a;b", "c"])?;
            writer.save()?;
        }

        let mut content = String::new();
        File::open(&path)?.read_to_string(&mut content)?;
        assert_eq!(content, "\"a;b\";c\r\n");

        let table = CsvReader::open(&path)?.dialect(dialect).read()?;
        assert_eq!(table, vec![vec!["a;b", "c"]]);
        Ok(())
    }
}
