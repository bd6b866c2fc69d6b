//! Chunk-at-a-time CSV parsing
//!
//! Input arrives in chunks whose boundaries can fall anywhere: inside a
//! quoted field, right after a quote, inside a comment, even in the middle of
//! a multi-character line terminator. [`parse_chunk`] consumes one chunk and
//! records in a [`ParseCursor`] everything needed to pick up exactly where it
//! stopped, so no text is ever scanned twice (apart from a few held-back
//! bytes that might start a split delimiter or terminator).
//!
//! # Leniency
//!
//! The parser never rejects input. Text after a closing quote is appended
//! to the field, and a quoted field that is still open when the input ends
//! keeps whatever was accumulated (see [`ParseCursor::finish`]).

use crate::dialect::Dialect;
use crate::types::{Field, ParseState, Row, Table};
use log::{trace, warn};

/// Parse state carried between chunks
///
/// Owns the table, row and field being built. Created empty at the start of
/// an input, threaded through every [`parse_chunk`] call and consumed by
/// [`finish`](ParseCursor::finish).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseCursor {
    state: ParseState,
    table: Table,
    row: Row,
    field: Field,
    // Chunk tail that may be the first part of a split delimiter or
    // terminator. Rescanned in front of the next chunk.
    carry: String,
}

impl ParseCursor {
    /// Create an empty cursor for a new input
    pub fn new() -> Self {
        Self::default()
    }

    /// State the last chunk ended in
    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Rows completed so far
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Fields of the row in progress
    pub fn row(&self) -> &Row {
        &self.row
    }

    /// Text of the field in progress
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Finalize after the last chunk and return the table
    ///
    /// A pending non-empty field is pushed onto the row, and a pending
    /// non-empty row onto the table, so input without a trailing line
    /// terminator still yields its last row. An empty trailing field is
    /// dropped (`a,` at end of input gives `["a"]`).
    ///
    /// A quoted field still open at this point is kept as-is rather than
    /// treated as an error.
    pub fn finish(mut self) -> Table {
        match self.state {
            ParseState::InUnquotedField => {
                let carry = std::mem::take(&mut self.carry);
                self.field.push_str(&carry);
            }
            ParseState::InQuotedField => {
                warn!(
                    "input ended inside a quoted field, keeping {} buffered bytes",
                    self.field.len()
                );
            }
            _ => {}
        }

        if !self.field.is_empty() {
            self.end_field();
        }
        if !self.row.is_empty() {
            self.end_row();
        }
        self.table
    }

    fn end_field(&mut self) {
        self.row.push(std::mem::take(&mut self.field));
    }

    fn end_row(&mut self) {
        self.table.push(std::mem::take(&mut self.row));
    }
}

/// Parse one chunk, resuming from and updating `cursor`
///
/// Never fails. An empty chunk leaves the cursor untouched.
///
/// # Examples
///
/// ```
/// use csvstream::csv::{parse_chunk, ParseCursor};
/// use csvstream::{Dialect, ParseState};
///
/// let dialect = Dialect::default();
/// let mut cursor = ParseCursor::new();
///
/// parse_chunk("a,\"hello ", &dialect, &mut cursor);
/// assert_eq!(cursor.state(), ParseState::InQuotedField);
///
/// parse_chunk("world\",b\n", &dialect, &mut cursor);
/// assert_eq!(cursor.finish(), vec![vec!["a", "hello world", "b"]]);
/// ```
pub fn parse_chunk(chunk: &str, dialect: &Dialect, cursor: &mut ParseCursor) {
    if chunk.is_empty() {
        return;
    }

    let joined;
    let text = if cursor.carry.is_empty() {
        chunk
    } else {
        let mut pending = std::mem::take(&mut cursor.carry);
        pending.push_str(chunk);
        joined = pending;
        joined.as_str()
    };

    let mut scan = Scan {
        chunk: text,
        dialect,
        cursor: &mut *cursor,
        delimiter: NextMatch::new(dialect.delimiter()),
        terminator: NextMatch::new(dialect.line_terminator()),
    };
    scan.run();

    trace!(
        "parsed chunk of {} bytes, {} rows complete, {}",
        chunk.len(),
        cursor.table.len(),
        cursor.state
    );
}

/// Incremental parser owning its dialect and cursor
///
/// # Examples
///
/// ```
/// use csvstream::csv::ChunkParser;
/// use csvstream::Dialect;
///
/// let mut parser = ChunkParser::new(Dialect::default());
/// parser.feed("name,ci");
/// parser.feed("ty\nAlice,NYC");
///
/// let table = parser.finish();
/// assert_eq!(table, vec![vec!["name", "city"], vec!["Alice", "NYC"]]);
/// ```
#[derive(Debug, Clone)]
pub struct ChunkParser {
    dialect: Dialect,
    cursor: ParseCursor,
    chunk_count: u64,
}

impl ChunkParser {
    /// Create a parser for one input
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            cursor: ParseCursor::new(),
            chunk_count: 0,
        }
    }

    /// Feed the next chunk
    pub fn feed(&mut self, chunk: &str) {
        parse_chunk(chunk, &self.dialect, &mut self.cursor);
        self.chunk_count += 1;
    }

    /// State the last chunk ended in
    pub fn state(&self) -> ParseState {
        self.cursor.state()
    }

    /// Number of chunks fed so far
    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    /// Number of rows completed so far
    pub fn row_count(&self) -> usize {
        self.cursor.table().len()
    }

    /// Dialect in use
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Finalize and return the table
    pub fn finish(self) -> Table {
        self.cursor.finish()
    }
}

/// Position of the next occurrence of a needle, cached across lookups
///
/// Lookups only move forward within a chunk, so a cached hit at or after the
/// current position is still the nearest one, and a miss stays a miss.
struct NextMatch<'a> {
    needle: &'a str,
    next: Option<usize>,
    exhausted: bool,
}

impl<'a> NextMatch<'a> {
    fn new(needle: &'a str) -> Self {
        Self {
            needle,
            next: None,
            exhausted: false,
        }
    }

    fn find_from(&mut self, haystack: &str, pos: usize) -> Option<usize> {
        if self.exhausted {
            return None;
        }
        if let Some(at) = self.next {
            if at >= pos {
                return Some(at);
            }
        }
        match haystack[pos..].find(self.needle) {
            Some(offset) => {
                self.next = Some(pos + offset);
                self.next
            }
            None => {
                self.exhausted = true;
                None
            }
        }
    }
}

/// Length of the longest proper prefix of `needle` that `text` ends with
fn partial_suffix_len(text: &str, needle: &str) -> usize {
    (1..needle.len())
        .rev()
        .filter(|&n| needle.is_char_boundary(n))
        .find(|&n| text.ends_with(&needle[..n]))
        .unwrap_or(0)
}

/// One pass over one chunk
///
/// The `scan_*` helpers return `Some(pos)` when they consumed a complete
/// construct and scanning continues at `pos`, or `None` when the chunk ran
/// out, in which case the unresolved state is already stored in the cursor.
struct Scan<'a> {
    chunk: &'a str,
    dialect: &'a Dialect,
    cursor: &'a mut ParseCursor,
    delimiter: NextMatch<'a>,
    terminator: NextMatch<'a>,
}

impl Scan<'_> {
    fn run(&mut self) {
        let chunk = self.chunk;
        let quote = self.dialect.quote_char();
        let mut pos = 0;

        match self.cursor.state {
            ParseState::InCommentLine => match self.skip_comment(pos) {
                Some(next) => pos = next,
                None => return,
            },
            ParseState::AfterQuoteInField => {
                if chunk.starts_with(quote) {
                    self.cursor.field.push_str(self.dialect.escaped_quote());
                    pos = quote.len_utf8();
                    self.cursor.state = ParseState::InQuotedField;
                } else {
                    self.cursor.state = ParseState::InUnquotedField;
                }
            }
            _ => {}
        }

        if self.cursor.state == ParseState::InQuotedField {
            match self.scan_quoted(pos) {
                Some(next) => pos = next,
                None => return,
            }
        }

        if self.cursor.state == ParseState::InUnquotedField {
            match self.scan_unquoted(pos) {
                Some(next) => pos = next,
                None => return,
            }
        }

        // Every iteration starts at a clean boundary.
        while pos < chunk.len() {
            if self.dialect.skip_initial_space() {
                let rest = &chunk[pos..];
                pos += rest.len() - rest.trim_start_matches(' ').len();
                if pos == chunk.len() {
                    break;
                }
            }

            let rest = &chunk[pos..];

            if let Some(comment) = self.dialect.comment_char() {
                if rest.starts_with(comment) {
                    match self.skip_comment(pos) {
                        Some(next) => {
                            pos = next;
                            continue;
                        }
                        None => return,
                    }
                }
            }

            if rest.starts_with(quote) {
                match self.scan_quoted(pos + quote.len_utf8()) {
                    Some(next) => pos = next,
                    None => return,
                }
            }

            match self.scan_unquoted(pos) {
                Some(next) => pos = next,
                None => return,
            }
        }

        self.cursor.state = ParseState::None;
    }

    /// Skip to just past the line terminator ending a comment line
    fn skip_comment(&mut self, pos: usize) -> Option<usize> {
        let chunk = self.chunk;
        let terminator = self.dialect.line_terminator();
        match self.terminator.find_from(chunk, pos) {
            Some(at) => {
                self.cursor.state = ParseState::None;
                Some(at + terminator.len())
            }
            None => {
                // Comment text is dropped, except a possible terminator start.
                let rest = &chunk[pos..];
                let held = partial_suffix_len(rest, terminator);
                self.cursor.carry.push_str(&rest[rest.len() - held..]);
                self.cursor.state = ParseState::InCommentLine;
                None
            }
        }
    }

    /// Scan quoted field content starting just past the opening quote
    ///
    /// Returns the position after the closing quote.
    fn scan_quoted(&mut self, mut pos: usize) -> Option<usize> {
        let chunk = self.chunk;
        let quote = self.dialect.quote_char();
        let quote_len = quote.len_utf8();

        loop {
            let Some(offset) = chunk[pos..].find(quote) else {
                self.cursor.field.push_str(&chunk[pos..]);
                self.cursor.state = ParseState::InQuotedField;
                return None;
            };

            let at = pos + offset;
            self.cursor.field.push_str(&chunk[pos..at]);
            pos = at + quote_len;

            if pos >= chunk.len() {
                self.cursor.state = ParseState::AfterQuoteInField;
                return None;
            }
            if !chunk[pos..].starts_with(quote) {
                break;
            }

            self.cursor.field.push_str(self.dialect.escaped_quote());
            pos += quote_len;
        }

        self.cursor.state = ParseState::InUnquotedField;
        Some(pos)
    }

    /// Scan unquoted text up to the nearer of delimiter and line terminator
    ///
    /// On equal positions (overlapping separators) the terminator wins.
    fn scan_unquoted(&mut self, pos: usize) -> Option<usize> {
        let chunk = self.chunk;
        let delimiter = self.delimiter.find_from(chunk, pos);
        let terminator = self.terminator.find_from(chunk, pos);

        match (delimiter, terminator) {
            (Some(d), t) if t.map_or(true, |t| d < t) => {
                self.cursor.field.push_str(&chunk[pos..d]);
                self.cursor.end_field();
                self.cursor.state = ParseState::None;
                Some(d + self.dialect.delimiter().len())
            }
            (_, Some(t)) => {
                self.cursor.field.push_str(&chunk[pos..t]);
                self.cursor.end_field();
                self.cursor.end_row();
                self.cursor.state = ParseState::None;
                Some(t + self.dialect.line_terminator().len())
            }
            _ => {
                let rest = &chunk[pos..];
                let held = partial_suffix_len(rest, self.dialect.delimiter())
                    .max(partial_suffix_len(rest, self.dialect.line_terminator()));
                let keep = rest.len() - held;
                self.cursor.field.push_str(&rest[..keep]);
                self.cursor.carry.push_str(&rest[keep..]);
                self.cursor.state = ParseState::InUnquotedField;
                None
            }
        }
    }
}
