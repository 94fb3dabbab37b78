//! Accelerated tokenizer backend.
//!
//! A `logos` DFA dispatches on the first byte of each token and skips
//! blanks and comments without returning to the caller. Quoted values and
//! semicolon blocks are finished by the shared scanners in callbacks.
//! The current line lives in the lexer extras and is bumped as newlines
//! are consumed, so every token knows its line without recounting.

use crate::tokenizer::{scan_block, scan_quoted, Block, Delimiter, ScanError, Token, Tokenizer};
use crate::Result;
use logos::{Lexer, Logos, Skip};

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(extras = usize)]
#[logos(error = ScanError)]
#[logos(skip r"[ \t\r\x0B\x0C]+")]
#[logos(skip r"#[^\n]*")]
enum Lexeme<'s> {
    #[token("\n", newline)]
    Newline,

    #[token(";\n", block)]
    Block((Block<'s>, usize)),

    #[token("'", quoted)]
    SingleQuoted(&'s str),

    #[token("\"", quoted)]
    DoubleQuoted(&'s str),

    #[regex(r##"[^ \t\n\r\x0B\x0C'"#][^ \t\n\r\x0B\x0C]*"##, |lex| lex.slice())]
    Word(&'s str),
}

fn newline<'s>(lex: &mut Lexer<'s, Lexeme<'s>>) -> Skip {
    lex.extras += 1;
    Skip
}

fn remainder_from_start<'s>(lex: &Lexer<'s, Lexeme<'s>>) -> &'s str {
    &lex.source()[lex.span().start..]
}

fn quoted<'s>(lex: &mut Lexer<'s, Lexeme<'s>>) -> std::result::Result<&'s str, ScanError> {
    let rest = remainder_from_start(lex);
    let close = scan_quoted(rest)?;
    lex.bump(close);
    Ok(&rest[1..close])
}

fn block<'s>(lex: &mut Lexer<'s, Lexeme<'s>>) -> std::result::Result<(Block<'s>, usize), ScanError> {
    let line = lex.extras;
    let scanned = scan_block(remainder_from_start(lex))?;
    lex.bump(scanned.consumed - lex.slice().len());
    lex.extras += scanned.newlines;
    Ok((scanned, line))
}

/// DFA-driven tokenizer over a normalized buffer.
pub struct AcceleratedTokenizer<'a> {
    lexer: Lexer<'a, Lexeme<'a>>,
    position: usize,
}

impl<'a> AcceleratedTokenizer<'a> {
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        AcceleratedTokenizer {
            lexer: Lexeme::lexer_with_extras(input, 1),
            position: 0,
        }
    }
}

impl<'a> Tokenizer<'a> for AcceleratedTokenizer<'a> {
    fn next_token(&mut self) -> Result<Option<Token<'a>>> {
        let Some(lexeme) = self.lexer.next() else {
            self.position = self.lexer.source().len();
            return Ok(None);
        };
        self.position = self.lexer.span().end;
        let line = self.lexer.extras;
        let token = match lexeme.map_err(|e| e.at(line))? {
            Lexeme::Word(text) => Token::word(text, line),
            Lexeme::SingleQuoted(text) => Token::new(text, Delimiter::SingleQuote, line),
            Lexeme::DoubleQuoted(text) => Token::new(text, Delimiter::DoubleQuote, line),
            Lexeme::Block((block, start_line)) => {
                Token::block(block.text, start_line, block.lenient)
            }
            // Newlines are skipped by their callback
            Lexeme::Newline => return self.next_token(),
        };
        Ok(Some(token))
    }

    fn position(&self) -> usize {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &str) -> Vec<(String, Delimiter, usize)> {
        let mut tokenizer = AcceleratedTokenizer::new(input);
        let mut tokens = Vec::new();
        let mut last = 0;
        while let Some(token) = tokenizer.next_token().unwrap() {
            assert!(tokenizer.position() >= last);
            last = tokenizer.position();
            tokens.push((token.text.into_owned(), token.delimiter, token.line));
        }
        assert_eq!(tokenizer.position(), input.len());
        tokens
    }

    #[test]
    fn test_lines_follow_blocks() {
        let tokens = collect("_A.b\n;\nx\ny\n;\n_A.c 'v'\n");
        assert_eq!(tokens[1], ("x\ny\n".to_string(), Delimiter::SemicolonBlock, 2));
        assert_eq!(tokens[2], ("_A.c".to_string(), Delimiter::Unquoted, 6));
        assert_eq!(tokens[3], ("v".to_string(), Delimiter::SingleQuote, 6));
    }

    #[test]
    fn test_comment_and_framecode() {
        let tokens = collect("#c\n$ $ref a#b\n");
        assert_eq!(
            tokens,
            vec![
                ("$".to_string(), Delimiter::Unquoted, 2),
                ("$ref".to_string(), Delimiter::Framecode, 2),
                ("a#b".to_string(), Delimiter::Unquoted, 2),
            ]
        );
    }

    #[test]
    fn test_bad_multiline_is_flagged() {
        let mut tokenizer = AcceleratedTokenizer::new(";\nvalue\n; \nnext\n");
        let token = tokenizer.next_token().unwrap().unwrap();
        assert_eq!(
            token.warning,
            Some(crate::options::WarningCategory::BadMultiline)
        );
        assert_eq!(tokenizer.next_token().unwrap().unwrap().line, 4);
    }

    #[test]
    fn test_scan_errors_carry_line() {
        let mut tokenizer = AcceleratedTokenizer::new("a\nb\n\"open\n");
        tokenizer.next_token().unwrap();
        tokenizer.next_token().unwrap();
        let err = tokenizer.next_token().unwrap_err();
        assert!(matches!(err, crate::Error::Lexical { line: 3, .. }));
    }
}
