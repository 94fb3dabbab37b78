//! Tokens, input normalization and the tokenizer interface.
//!
//! The grammar machine pulls tokens one at a time through the
//! [`Tokenizer`] trait. Two backends implement it:
//!
//! - [`PortableTokenizer`](crate::portable::PortableTokenizer): a hand-written
//!   byte cursor that counts lines on demand
//! - [`AcceleratedTokenizer`](crate::accelerated::AcceleratedTokenizer): a
//!   generated DFA that tracks lines as it consumes newlines
//!
//! Both backends share the quoted-value and semicolon-block scanners in this
//! module and yield identical token streams for identical input. The backend
//! is picked once per parse through [`tokenizer`].
//!
//! ## Token rules
//!
//! - Blanks separate tokens. A `#` where a token would start comments out the
//!   rest of the line.
//! - `;` followed by a newline opens a semicolon block that ends at the next
//!   line starting with `;`.
//! - `'` or `"` opens a quoted value that ends at the first matching quote
//!   on the same line that is followed by whitespace.
//! - Anything else runs to the next blank. `$name` is a framecode reference.
//!
//! ## Examples
//!
//! ```rust
//! use nmrstar::tokenizer::{normalize, tokenize, Delimiter};
//! use nmrstar::TokenizerBackend;
//!
//! let text = normalize("_Entry.Title 'a \"quoted\" title' $frame\n");
//! let tokens = tokenize(TokenizerBackend::Portable, &text).unwrap();
//!
//! assert_eq!(tokens[1].text, "a \"quoted\" title");
//! assert_eq!(tokens[1].delimiter, Delimiter::SingleQuote);
//! assert_eq!(tokens[2].delimiter, Delimiter::Framecode);
//! ```

use crate::accelerated::AcceleratedTokenizer;
use crate::options::{TokenizerBackend, WarningCategory};
use crate::portable::PortableTokenizer;
use crate::syntax::is_star_whitespace;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

/// Semicolon-opened lines that carry text after the `;`.
static INLINE_BLOCK_OPENER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n;([^\n]+)\n").unwrap());

/// Lexical quoting style of a token.
///
/// # Examples
///
/// ```rust
/// use nmrstar::tokenizer::Delimiter;
///
/// assert_eq!(Delimiter::SingleQuote.as_str(), "'");
/// assert!(Delimiter::Unquoted.is_unquoted());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Delimiter {
    Unquoted,
    SingleQuote,
    DoubleQuote,
    SemicolonBlock,
    /// `$name` reference to another saveframe
    Framecode,
}

impl Delimiter {
    /// Returns the character that introduces this delimiter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Delimiter::Unquoted => " ",
            Delimiter::SingleQuote => "'",
            Delimiter::DoubleQuote => "\"",
            Delimiter::SemicolonBlock => ";",
            Delimiter::Framecode => "$",
        }
    }

    /// Returns true for bare tokens. Framecode references are not bare.
    #[must_use]
    pub const fn is_unquoted(&self) -> bool {
        matches!(self, Delimiter::Unquoted)
    }
}

/// A lexical unit produced by a [`Tokenizer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token text with any quotes or block markers removed
    pub text: Cow<'a, str>,
    pub delimiter: Delimiter,
    /// 1-based line of the token's first character in the normalized text
    pub line: usize,
    /// Warning raised while scanning, resolved later against policy
    pub warning: Option<WarningCategory>,
}

impl<'a> Token<'a> {
    /// Creates a token without a warning.
    #[must_use]
    pub fn new(text: impl Into<Cow<'a, str>>, delimiter: Delimiter, line: usize) -> Self {
        Token {
            text: text.into(),
            delimiter,
            line,
            warning: None,
        }
    }

    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns true if this token is the bare word `word`.
    #[must_use]
    pub fn is_bare(&self, word: &str) -> bool {
        self.delimiter.is_unquoted() && self.text == word
    }

    /// Creates a bare-word token, recognizing framecode references.
    pub(crate) fn word(text: &'a str, line: usize) -> Self {
        let delimiter = if text.len() > 1 && text.starts_with('$') {
            Delimiter::Framecode
        } else {
            Delimiter::Unquoted
        };
        Token::new(text, delimiter, line)
    }

    /// Creates a semicolon-block token, normalizing indented content.
    pub(crate) fn block(text: &'a str, line: usize, lenient: bool) -> Self {
        let text = match unindent(text) {
            Some(owned) => Cow::Owned(owned),
            None => Cow::Borrowed(text),
        };
        Token {
            text,
            delimiter: Delimiter::SemicolonBlock,
            line,
            warning: lenient.then_some(WarningCategory::BadMultiline),
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.delimiter.as_str(), self.text)
    }
}

/// Source of tokens for the grammar machine.
///
/// Implementations own a cursor into a normalized buffer. The cursor never
/// moves backwards and equals the buffer length once `next_token` has
/// returned `Ok(None)`.
pub trait Tokenizer<'a> {
    /// Produces the next token, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns a lexical error for unterminated quoted values and
    /// unterminated or malformed semicolon blocks.
    fn next_token(&mut self) -> Result<Option<Token<'a>>>;

    /// Returns the byte offset of the cursor.
    fn position(&self) -> usize;
}

/// Creates a tokenizer over normalized `input` using `backend`.
#[must_use]
pub fn tokenizer<'a>(backend: TokenizerBackend, input: &'a str) -> Box<dyn Tokenizer<'a> + 'a> {
    match backend {
        TokenizerBackend::Portable => Box::new(PortableTokenizer::new(input)),
        TokenizerBackend::Accelerated => Box::new(AcceleratedTokenizer::new(input)),
    }
}

/// Collects every token of normalized `input`.
///
/// # Errors
///
/// Returns the first lexical error encountered.
pub fn tokenize(backend: TokenizerBackend, input: &str) -> Result<Vec<Token<'_>>> {
    let mut source = tokenizer(backend, input);
    let mut tokens = Vec::new();
    while let Some(token) = source.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

/// Prepares raw text for tokenizing.
///
/// Line endings become `\n`, a semicolon that opens a block with text on
/// the same line is moved onto its own line, and a final newline is
/// appended.
///
/// # Examples
///
/// ```rust
/// use nmrstar::tokenizer::normalize;
///
/// assert_eq!(normalize("a\r\n;text\r\n;\r"), "a\n;\ntext\n;\n\n");
/// ```
#[must_use]
pub fn normalize(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut normalized = INLINE_BLOCK_OPENER
        .replace_all(&unified, "\n;\n${1}\n")
        .into_owned();
    normalized.push('\n');
    normalized
}

/// Strips the three-space indentation of an embedded rendered document.
///
/// Applies when the value starts with an indented line, every interior line
/// is indented by three spaces and an indented `;` terminator is present.
/// The final newline is dropped and each `\n   ` becomes `\n`. Returns
/// `None` when the value does not have that shape.
///
/// # Examples
///
/// ```rust
/// use nmrstar::tokenizer::unindent;
///
/// let indented = "\n   data_x\n   ;\n   text\n   ;\n";
/// assert_eq!(unindent(indented).as_deref(), Some("\ndata_x\n;\ntext\n;"));
/// assert_eq!(unindent("plain\n"), None);
/// ```
#[must_use]
pub fn unindent(text: &str) -> Option<String> {
    if !text.starts_with("\n   ") || !text.contains("\n   ;") {
        return None;
    }
    let bytes = text.as_bytes();
    let every_line_indented = (1..bytes.len().saturating_sub(4))
        .filter(|&pos| bytes[pos] == b'\n')
        .all(|pos| &bytes[pos + 1..pos + 4] == b"   ");
    if !every_line_indented {
        return None;
    }
    Some(text[..text.len() - 1].replace("\n   ", "\n"))
}

/// Failures shared by both tokenizer backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Error)]
pub enum ScanError {
    #[default]
    #[error("unrecognized input")]
    Unrecognized,

    #[error("single quoted value was never terminated")]
    UnterminatedSingleQuote,

    #[error("double quoted value was never terminated")]
    UnterminatedDoubleQuote,

    #[error("multi-line value never ends; it must be closed by a line holding only ';'")]
    UnterminatedBlock,

    #[error("multi-line value ended with '\\n;' followed by a non-whitespace value")]
    MalformedTerminator,
}

impl ScanError {
    pub(crate) fn at(self, line: usize) -> Error {
        Error::lexical(line, self)
    }
}

/// Locates the closing quote of a quoted value.
///
/// `rest` starts at the opening quote. The closing quote is the first
/// matching quote on the same line that is followed by whitespace or the
/// end of input; quotes followed by anything else are data. Returns the
/// byte offset of the closing quote.
pub(crate) fn scan_quoted(rest: &str) -> std::result::Result<usize, ScanError> {
    let bytes = rest.as_bytes();
    let quote = bytes[0];
    let unterminated = if quote == b'\'' {
        ScanError::UnterminatedSingleQuote
    } else {
        ScanError::UnterminatedDoubleQuote
    };
    for pos in 1..bytes.len() {
        match bytes[pos] {
            b'\n' => return Err(unterminated),
            b if b == quote => {
                if bytes.get(pos + 1).map_or(true, |&next| is_star_whitespace(next)) {
                    return Ok(pos);
                }
            }
            _ => {}
        }
    }
    Err(unterminated)
}

/// Outcome of scanning a semicolon block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Block<'a> {
    /// Raw content between the opening newline and the closing `;`
    pub text: &'a str,
    /// Bytes from the opening `;` through the closing `;`
    pub consumed: usize,
    /// Newlines inside the consumed span
    pub newlines: usize,
    /// The closing `;` was followed by blanks rather than a newline
    pub lenient: bool,
}

/// Scans a semicolon block.
///
/// `rest` starts at the opening `;`, which must be followed by a newline.
pub(crate) fn scan_block(rest: &str) -> std::result::Result<Block<'_>, ScanError> {
    let body = &rest[1..];
    let until = body.find("\n;").ok_or(ScanError::UnterminatedBlock)?;
    let lenient = match body.as_bytes().get(until + 2) {
        Some(b'\n') => false,
        Some(&b) if is_star_whitespace(b) => true,
        None => true,
        Some(_) => return Err(ScanError::MalformedTerminator),
    };
    let consumed = until + 3;
    Ok(Block {
        text: &body[1..until + 1],
        consumed,
        newlines: rest[..consumed].bytes().filter(|&b| b == b'\n').count(),
        lenient,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize("a\r\nb\rc"), "a\nb\nc\n");
        assert_eq!(normalize(""), "\n");
    }

    #[test]
    fn test_normalize_inline_block_opener() {
        assert_eq!(
            normalize("_Tag.x\n; first line\nsecond\n;\n"),
            "_Tag.x\n;\n first line\nsecond\n;\n\n"
        );
        // A lone terminator is untouched
        assert_eq!(normalize("x\n;\n"), "x\n;\n\n");
    }

    #[test]
    fn test_scan_quoted() {
        assert_eq!(scan_quoted("'abc' "), Ok(4));
        assert_eq!(scan_quoted("'it's ok'\n"), Ok(8));
        assert_eq!(scan_quoted("''"), Ok(1));
        assert_eq!(scan_quoted("\"a\"b\""), Ok(4));
        assert_eq!(
            scan_quoted("'never\n'"),
            Err(ScanError::UnterminatedSingleQuote)
        );
        assert_eq!(
            scan_quoted("\"x\"y"),
            Err(ScanError::UnterminatedDoubleQuote)
        );
    }

    #[test]
    fn test_scan_block() {
        let block = scan_block(";\nline one\nline two\n;\nrest").unwrap();
        assert_eq!(block.text, "line one\nline two\n");
        assert_eq!(block.consumed, 21);
        assert_eq!(block.newlines, 3);
        assert!(!block.lenient);

        let block = scan_block(";\nvalue\n;  \n").unwrap();
        assert_eq!(block.text, "value\n");
        assert!(block.lenient);

        let block = scan_block(";\n;\n").unwrap();
        assert_eq!(block.text, "");
        assert_eq!(block.consumed, 3);
    }

    #[test]
    fn test_scan_block_failures() {
        assert_eq!(
            scan_block(";\nnever closed\n"),
            Err(ScanError::UnterminatedBlock)
        );
        assert_eq!(
            scan_block(";\nvalue\n;oops\n"),
            Err(ScanError::MalformedTerminator)
        );
    }

    #[test]
    fn test_unindent_requires_every_line() {
        assert_eq!(unindent("\n   a\nb\n   ;\n"), None);
        assert_eq!(unindent("\n   a\n   b\n"), None);
        assert_eq!(unindent("\n   ;\n").as_deref(), Some("\n;"));
    }

    #[test]
    fn test_word_token_framecode() {
        assert_eq!(Token::word("$", 1).delimiter, Delimiter::Unquoted);
        assert_eq!(Token::word("$it", 1).delimiter, Delimiter::Framecode);
        assert!(Token::word("stop_", 1).is_bare("stop_"));
        assert!(!Token::word("$stop_", 1).is_bare("$stop_"));
    }
}
