//! CSV encoding driven by a [`Dialect`]

use crate::dialect::Dialect;

/// CSV encoder for writing rows in a given dialect
///
/// A field is quoted when it contains the quote character, the delimiter or
/// the line terminator. Inside a quoted field, quote characters are doubled
/// when the dialect uses `double_quote`; otherwise they are written as-is,
/// which the parser reads back verbatim only when they come in pairs.
#[derive(Debug, Clone)]
pub struct CsvEncoder {
    dialect: Dialect,
}

impl CsvEncoder {
    /// Create a new encoder for a dialect
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Dialect in use
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Encode entire row into buffer, without the line terminator
    pub fn encode_row<S: AsRef<str>>(&self, fields: &[S], buffer: &mut String) {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                buffer.push_str(self.dialect.delimiter());
            }
            self.encode_field(field.as_ref(), buffer);
        }
    }

    /// Encode a row followed by the line terminator
    pub fn encode_line<S: AsRef<str>>(&self, fields: &[S], buffer: &mut String) {
        self.encode_row(fields, buffer);
        buffer.push_str(self.dialect.line_terminator());
    }

    /// Encode single field with proper quoting/escaping
    fn encode_field(&self, field: &str, buffer: &mut String) {
        if !self.needs_quoting(field) {
            buffer.push_str(field);
            return;
        }

        let quote = self.dialect.quote_char();
        buffer.push(quote);
        if self.dialect.double_quote() {
            for ch in field.chars() {
                if ch == quote {
                    buffer.push(quote);
                }
                buffer.push(ch);
            }
        } else {
            buffer.push_str(field);
        }
        buffer.push(quote);
    }

    /// Check if field requires quoting
    ///
    /// A field starting with the comment character is also quoted, since
    /// the parser would otherwise read it as a comment.
    fn needs_quoting(&self, field: &str) -> bool {
        let starts_comment = self
            .dialect
            .comment_char()
            .is_some_and(|c| field.starts_with(c));

        starts_comment
            || field.contains(self.dialect.quote_char())
            || field.contains(self.dialect.delimiter())
            || field.contains(self.dialect.line_terminator())
    }
}

/// Serialize a table to CSV text
///
/// Rows are joined with the line terminator and the output ends with one.
/// An empty table deliberately produces an empty string rather than a lone
/// terminator, so that it parses back to an empty table.
///
/// # Examples
///
/// ```
/// use csvstream::{stringify, Dialect};
///
/// let table = vec![vec!["a", "b,c"], vec!["d\"e", "f"]];
/// assert_eq!(stringify(&table, &Dialect::default()), "a,\"b,c\"\n\"d\"\"e\",f\n");
/// ```
pub fn stringify<R, S>(table: &[R], dialect: &Dialect) -> String
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let encoder = CsvEncoder::new(dialect.clone());
    let mut out = String::new();
    for row in table {
        encoder.encode_line(row.as_ref(), &mut out);
    }
    out
}
