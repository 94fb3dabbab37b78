//! Portable tokenizer backend.
//!
//! Walks the normalized buffer with a byte cursor. Line numbers are not
//! tracked while scanning; they are counted from the last known position
//! when a token is emitted.

use crate::syntax::is_star_whitespace;
use crate::tokenizer::{scan_block, scan_quoted, Delimiter, Token, Tokenizer};
use crate::Result;

/// Hand-written tokenizer over a normalized buffer.
pub struct PortableTokenizer<'a> {
    input: &'a str,
    position: usize,
    // Line number at `counted`
    line: usize,
    counted: usize,
}

impl<'a> PortableTokenizer<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        PortableTokenizer {
            input,
            position: 0,
            line: 1,
            counted: 0,
        }
    }

    /// Returns the 1-based line of byte offset `pos`, which must not be
    /// behind any offset asked for before.
    fn line_at(&mut self, pos: usize) -> usize {
        let input = self.input;
        self.line += input.as_bytes()[self.counted..pos]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        self.counted = pos;
        self.line
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.input.as_bytes();
        while self.position < bytes.len() && is_star_whitespace(bytes[self.position]) {
            self.position += 1;
        }
    }

    fn skip_comment(&mut self) {
        let input = self.input;
        self.position = match input[self.position..].find('\n') {
            Some(offset) => self.position + offset,
            None => input.len(),
        };
    }

    fn bare_word(&mut self, start: usize, line: usize) -> Token<'a> {
        let input = self.input;
        let rest = &input.as_bytes()[start..];
        let len = rest
            .iter()
            .position(|&b| is_star_whitespace(b))
            .unwrap_or(rest.len());
        self.position = start + len;
        Token::word(&input[start..start + len], line)
    }
}

impl<'a> Tokenizer<'a> for PortableTokenizer<'a> {
    fn next_token(&mut self) -> Result<Option<Token<'a>>> {
        let input = self.input;
        let bytes = input.as_bytes();
        loop {
            self.skip_whitespace();
            let start = self.position;
            if start == bytes.len() {
                return Ok(None);
            }
            let line = self.line_at(start);
            let rest = &input[start..];

            let token = match bytes[start] {
                b'#' => {
                    self.skip_comment();
                    continue;
                }
                b';' if bytes.get(start + 1) == Some(&b'\n') => {
                    let block = scan_block(rest).map_err(|e| e.at(line))?;
                    self.position = start + block.consumed;
                    Token::block(block.text, line, block.lenient)
                }
                quote @ (b'\'' | b'"') => {
                    let close = scan_quoted(rest).map_err(|e| e.at(line))?;
                    self.position = start + close + 1;
                    let delimiter = if quote == b'\'' {
                        Delimiter::SingleQuote
                    } else {
                        Delimiter::DoubleQuote
                    };
                    Token::new(&rest[1..close], delimiter, line)
                }
                _ => self.bare_word(start, line),
            };
            return Ok(Some(token));
        }
    }

    fn position(&self) -> usize {
        self.position
    }
}
