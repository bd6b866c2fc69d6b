//! CSV dialect configuration
//!
//! A [`Dialect`] is the immutable set of syntax rules the parser and the
//! encoder share. It can only be obtained through [`DialectBuilder::build`]
//! (or [`Dialect::default`]), which validates every option up front so that
//! parsing itself never has to fail.

use crate::error::{CsvError, Result};

/// Validated CSV syntax rules
///
/// # Examples
///
/// ```
/// use csvstream::Dialect;
///
/// let dialect = Dialect::builder()
///     .delimiter(";")
///     .line_terminator("\r\n")
///     .build()
///     .unwrap();
///
/// assert_eq!(dialect.delimiter(), ";");
/// assert_eq!(dialect.quote_char(), '"');
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    delimiter: String,
    line_terminator: String,
    quote_char: char,
    double_quote: bool,
    skip_initial_space: bool,
    comment_char: Option<char>,
    // What an escaped quote pair inside a quoted field turns into.
    escaped_quote: String,
}

impl Dialect {
    /// Start building a dialect from the defaults
    pub fn builder() -> DialectBuilder {
        DialectBuilder::default()
    }

    /// Field delimiter
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Row terminator
    pub fn line_terminator(&self) -> &str {
        &self.line_terminator
    }

    /// Quote character
    pub fn quote_char(&self) -> char {
        self.quote_char
    }

    /// Whether `""` inside a quoted field stands for a single quote
    pub fn double_quote(&self) -> bool {
        self.double_quote
    }

    /// Whether spaces at the start of a field are dropped
    pub fn skip_initial_space(&self) -> bool {
        self.skip_initial_space
    }

    /// Comment character, if comment lines are enabled
    pub fn comment_char(&self) -> Option<char> {
        self.comment_char
    }

    /// Text appended to a field for a pair of quote characters inside a
    /// quoted field.
    ///
    /// With `double_quote` the pair collapses to one quote character;
    /// without it the pair is kept verbatim.
    pub fn escaped_quote(&self) -> &str {
        &self.escaped_quote
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect {
            delimiter: ",".to_string(),
            line_terminator: "\n".to_string(),
            quote_char: '"',
            double_quote: true,
            skip_initial_space: false,
            comment_char: Some('#'),
            escaped_quote: "\"".to_string(),
        }
    }
}

/// Builder for [`Dialect`]
///
/// Single-character options are taken as strings so that the
/// one-character rule is checked in [`build`](DialectBuilder::build)
/// rather than silently truncated.
#[derive(Debug, Clone)]
pub struct DialectBuilder {
    delimiter: String,
    line_terminator: String,
    quote_char: String,
    double_quote: bool,
    skip_initial_space: bool,
    comment_char: Option<String>,
}

impl Default for DialectBuilder {
    fn default() -> Self {
        DialectBuilder {
            delimiter: ",".to_string(),
            line_terminator: "\n".to_string(),
            quote_char: "\"".to_string(),
            double_quote: true,
            skip_initial_space: false,
            comment_char: Some("#".to_string()),
        }
    }
}

impl DialectBuilder {
    /// Set the field delimiter (may be several characters)
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Set the row terminator (may be several characters, e.g. `"\r\n"`)
    pub fn line_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.line_terminator = terminator.into();
        self
    }

    /// Set the quote character; must be exactly one character
    pub fn quote_char(mut self, quote: impl Into<String>) -> Self {
        self.quote_char = quote.into();
        self
    }

    /// Enable or disable `""` escaping
    pub fn double_quote(mut self, enabled: bool) -> Self {
        self.double_quote = enabled;
        self
    }

    /// Drop spaces at the start of each field
    pub fn skip_initial_space(mut self, enabled: bool) -> Self {
        self.skip_initial_space = enabled;
        self
    }

    /// Set the comment character; must be exactly one character
    pub fn comment_char(mut self, comment: impl Into<String>) -> Self {
        self.comment_char = Some(comment.into());
        self
    }

    /// Disable comment lines
    pub fn no_comments(mut self) -> Self {
        self.comment_char = None;
        self
    }

    /// Validate the options and produce a [`Dialect`]
    ///
    /// # Errors
    ///
    /// Returns [`CsvError::Configuration`] if the quote or comment character
    /// is not exactly one character, or if the delimiter or line terminator
    /// is empty.
    pub fn build(self) -> Result<Dialect> {
        let quote_char = single_char("quote_char", &self.quote_char)?;
        let comment_char = self
            .comment_char
            .as_deref()
            .map(|c| single_char("comment_char", c))
            .transpose()?;

        if self.delimiter.is_empty() {
            return Err(CsvError::Configuration(
                "delimiter must not be empty".to_string(),
            ));
        }
        if self.line_terminator.is_empty() {
            return Err(CsvError::Configuration(
                "line_terminator must not be empty".to_string(),
            ));
        }

        let escaped_quote = if self.double_quote {
            quote_char.to_string()
        } else {
            [quote_char, quote_char].iter().collect()
        };

        Ok(Dialect {
            delimiter: self.delimiter,
            line_terminator: self.line_terminator,
            quote_char,
            double_quote: self.double_quote,
            skip_initial_space: self.skip_initial_space,
            comment_char,
            escaped_quote,
        })
    }
}

fn single_char(name: &str, value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(CsvError::Configuration(format!(
            "{} must be one character, got {:?}",
            name, value
        ))),
    }
}

/// Serializable dialect description
///
/// Field names follow the frictionless-data csv-dialect vocabulary, so a
/// dialect can be loaded from JSON/TOML configuration and validated with
/// `Dialect::try_from`. An explicit `null` `commentChar` disables comments.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DialectConfig {
    pub delimiter: String,
    pub line_terminator: String,
    pub quote_char: String,
    pub double_quote: bool,
    pub skip_initial_space: bool,
    pub comment_char: Option<String>,
}

#[cfg(feature = "serde")]
impl Default for DialectConfig {
    fn default() -> Self {
        Dialect::default().into()
    }
}

#[cfg(feature = "serde")]
impl TryFrom<DialectConfig> for Dialect {
    type Error = CsvError;

    fn try_from(config: DialectConfig) -> Result<Self> {
        let builder = Dialect::builder()
            .delimiter(config.delimiter)
            .line_terminator(config.line_terminator)
            .quote_char(config.quote_char)
            .double_quote(config.double_quote)
            .skip_initial_space(config.skip_initial_space);
        match config.comment_char {
            Some(c) => builder.comment_char(c).build(),
            None => builder.no_comments().build(),
        }
    }
}

#[cfg(feature = "serde")]
impl From<Dialect> for DialectConfig {
    fn from(dialect: Dialect) -> Self {
        DialectConfig {
            delimiter: dialect.delimiter,
            line_terminator: dialect.line_terminator,
            quote_char: dialect.quote_char.to_string(),
            double_quote: dialect.double_quote,
            skip_initial_space: dialect.skip_initial_space,
            comment_char: dialect.comment_char.map(|c| c.to_string()),
        }
    }
}
