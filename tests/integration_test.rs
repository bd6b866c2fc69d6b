//! Integration tests for csvstream

use csvstream::{
    parse_chunks, parse_str, stringify, ChunkParser, CsvError, CsvReader, CsvWriter, Dialect,
    ParseState,
};
use tempfile::tempdir;

#[test_log::test]
fn test_stringify_then_parse() {
    let dialect = Dialect::default();
    let table = vec![vec!["a", "b,c"], vec!["d\"e", "f"]];

    let text = stringify(&table, &dialect);
    assert_eq!(text, "a,\"b,c\"\n\"d\"\"e\",f\n");
    assert_eq!(parse_str(&text, &dialect), table);
}

#[test]
fn test_empty_input() {
    assert!(parse_str("", &Dialect::default()).is_empty());
    assert!(parse_chunks(Vec::<String>::new(), &Dialect::default()).is_empty());
}

#[test]
fn test_comment_only_without_terminator() {
    assert!(parse_str("#hello", &Dialect::default()).is_empty());
    assert!(parse_chunks(["#he", "llo"], &Dialect::default()).is_empty());
}

#[test]
fn test_semicolon_crlf_dialect() -> csvstream::Result<()> {
    let dialect = Dialect::builder()
        .delimiter(";")
        .line_terminator("\r\n")
        .build()?;
    let expected = vec![vec!["x", "y"], vec!["z", "w"]];

    assert_eq!(parse_str("x;y\r\nz;w", &dialect), expected);
    assert_eq!(parse_chunks(["x;y\r", "\nz;w"], &dialect), expected);
    Ok(())
}

#[test_log::test]
fn test_quoted_field_spanning_chunks() {
    let mut parser = ChunkParser::new(Dialect::default());
    parser.feed("a,\"hello ");
    assert_eq!(parser.state(), ParseState::InQuotedField);
    parser.feed("world\",b\n");
    assert_eq!(parser.state(), ParseState::None);

    assert_eq!(parser.finish(), vec![vec!["a", "hello world", "b"]]);
}

#[test]
fn test_configuration_errors() {
    for builder in [
        Dialect::builder().quote_char("\"\""),
        Dialect::builder().quote_char(""),
        Dialect::builder().comment_char("##"),
    ] {
        assert!(matches!(builder.build(), Err(CsvError::Configuration(_))));
    }
}

#[test]
fn test_unsupported_input() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.parquet");
    std::fs::write(&path, b"a,b\n").unwrap();

    assert!(matches!(
        CsvReader::open(&path),
        Err(CsvError::UnsupportedInput(_))
    ));
}

#[test]
fn test_write_and_read_roundtrip() -> csvstream::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("people.csv");
    let rows = vec![
        vec!["Name", "Age", "Bio"],
        vec!["Alice", "30", "likes \"quotes\", commas"],
        vec!["#Bob", "25", "two\nlines"],
        vec!["", "", ""],
    ];

    {
        let mut writer = CsvWriter::new(&path)?;
        writer.write_rows_batch(&rows)?;
        writer.save()?;
    }

    for chunk_size in [1, 2, 7, 64 * 1024] {
        let table = CsvReader::open(&path)?.chunk_size(chunk_size).read()?;
        assert_eq!(table, rows, "chunk size {}", chunk_size);
    }
    Ok(())
}

#[test]
fn test_compressed_roundtrip() -> csvstream::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("numbers.csv.zst");
    let dialect = Dialect::builder().delimiter("\t").build()?;

    {
        let mut writer = CsvWriter::new(&path)?.dialect(dialect.clone());
        for i in 0..1000 {
            writer.write_row([i.to_string(), format!("row {}", i)])?;
        }
        assert_eq!(writer.row_count(), 1000);
        writer.save()?;
    }

    let table = CsvReader::open(&path)?
        .dialect(dialect)
        .chunk_size(333)
        .read()?;
    assert_eq!(table.len(), 1000);
    assert_eq!(table[0], vec!["0", "row 0"]);
    assert_eq!(table[999], vec!["999", "row 999"]);
    Ok(())
}
