//! Type definitions for parsed CSV data

use std::fmt;

/// A single field value
pub type Field = String;

/// An ordered sequence of fields
pub type Row = Vec<Field>;

/// An ordered sequence of rows: the result of a parse
pub type Table = Vec<Row>;

/// What the parser was in the middle of when the previous chunk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseState {
    /// Clean boundary: at the start of a field, outside quotes and comments
    #[default]
    None,
    /// Inside a quoted field, waiting for the closing quote
    InQuotedField,
    /// A quote character inside a quoted field was the last thing in the
    /// chunk; whether it closes the field or starts an escaped quote depends
    /// on the next chunk
    AfterQuoteInField,
    /// Inside an unquoted value (or the tail of a closed quoted field),
    /// waiting for a delimiter or line terminator
    InUnquotedField,
    /// Inside a comment line, waiting for the line terminator
    InCommentLine,
}

impl ParseState {
    /// Whether the parser is at a clean boundary
    pub fn is_clean(&self) -> bool {
        matches!(self, ParseState::None)
    }
}

impl fmt::Display for ParseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseState::None => "clean boundary",
            ParseState::InQuotedField => "in quoted field",
            ParseState::AfterQuoteInField => "after quote in field",
            ParseState::InUnquotedField => "in unquoted field",
            ParseState::InCommentLine => "in comment line",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_clean() {
        assert!(ParseState::default().is_clean());
        assert!(!ParseState::AfterQuoteInField.is_clean());
    }

    #[test]
    fn test_display() {
        assert_eq!(ParseState::InCommentLine.to_string(), "in comment line");
    }
}
