//! NMR-STAR serialization.
//!
//! This module provides the [`Serializer`] that renders entries, saveframes
//! and loops back to NMR-STAR text.
//!
//! ## Overview
//!
//! - **Quote minimization**: values are written bare when that reads back
//!   unchanged, otherwise single quoted, then double quoted
//! - **Semicolon blocks**: values spanning lines are written as `;` blocks;
//!   values that themselves hold `;` blocks are indented by three spaces,
//!   which the reader strips again
//! - **Lossless or nothing**: a value that cannot be written so that it
//!   reads back identically is an [`Error::Unrepresentable`], and so is a
//!   saveframe with no tag prefix
//!
//! ## Usage
//!
//! ```rust
//! use nmrstar::{to_string, Entry};
//!
//! let mut entry = Entry::new("demo");
//! let frame = entry.append_saveframe("info").unwrap();
//! frame.add_tag("_Entry.ID", "demo").unwrap();
//! frame.add_tag("_Entry.Title", "a title").unwrap();
//!
//! let text = to_string(&entry).unwrap();
//! assert!(text.contains("   _Entry.Title  'a title'\n"));
//! ```
//!
//! ## Direct Serializer Usage
//!
//! ```rust
//! use nmrstar::{Loop, Serializer, WriteOptions};
//!
//! let mut lp = Loop::new();
//! lp.append_tag("_Atom.ID").unwrap();
//! lp.add_row(["1"]).unwrap();
//!
//! let mut serializer = Serializer::new(WriteOptions::default());
//! serializer.serialize(&lp).unwrap();
//! assert_eq!(serializer.into_inner(), "\n   loop_\n      _Atom.ID\n\n     1\n\n   stop_\n");
//! ```

use crate::syntax::{contains_whitespace, starts_with_reserved};
use crate::tokenizer::unindent;
use crate::{Entry, Error, Loop, Result, Saveframe, WriteOptions};
use std::borrow::Cow;

const ROW_INDENT: &str = "     ";

/// How a single value is written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Quoted<'a> {
    /// Bare or quoted text for use on a tag or row line
    Inline(Cow<'a, str>),
    /// Content of a semicolon block, ending with a newline
    Block(String),
}

/// Chooses the representation of `value` that reads back unchanged.
///
/// # Examples
///
/// ```rust
/// use nmrstar::ser::{quote_value, Quoted};
///
/// assert_eq!(quote_value("plain").unwrap(), Quoted::Inline("plain".into()));
/// assert_eq!(quote_value("two words").unwrap(), Quoted::Inline("'two words'".into()));
/// assert_eq!(quote_value("it's here").unwrap(), Quoted::Inline("'it's here'".into()));
/// assert_eq!(quote_value("it' s").unwrap(), Quoted::Inline("\"it' s\"".into()));
/// assert_eq!(quote_value("stop_").unwrap(), Quoted::Inline("'stop_'".into()));
/// assert_eq!(quote_value("line\n").unwrap(), Quoted::Block("line\n".into()));
/// assert!(quote_value("no final newline\nhere").is_err());
/// ```
///
/// # Errors
///
/// Returns [`Error::Unrepresentable`] for values holding a carriage return,
/// multi-line values the block syntax cannot carry, and single-line values
/// in which both quote characters are followed by whitespace.
pub fn quote_value(value: &str) -> Result<Quoted<'_>> {
    if value.contains('\r') {
        return Err(Error::unrepresentable(format!(
            "value contains a carriage return: {:?}",
            value
        )));
    }
    if value.contains('\n') {
        return block_content(value).map(Quoted::Block);
    }
    if value.is_empty() {
        return Ok(Quoted::Inline(Cow::Borrowed("''")));
    }

    let needs_quotes = contains_whitespace(value)
        || value.starts_with(&['_', '#', '\'', '"', ';'][..])
        || starts_with_reserved(value);
    if !needs_quotes {
        return Ok(Quoted::Inline(Cow::Borrowed(value)));
    }
    for quote in ['\'', '"'] {
        if !closes_early(value, quote) {
            return Ok(Quoted::Inline(Cow::Owned(format!(
                "{}{}{}",
                quote, value, quote
            ))));
        }
    }
    Err(Error::unrepresentable(format!(
        "value contains both quote characters followed by whitespace: {:?}",
        value
    )))
}

/// Returns true if a `quote` inside `value` would end a quoted token.
fn closes_early(value: &str, quote: char) -> bool {
    let bytes = value.as_bytes();
    value
        .match_indices(quote)
        .any(|(pos, _)| {
            bytes
                .get(pos + 1)
                .map_or(false, |&next| crate::syntax::is_star_whitespace(next))
        })
}

fn block_content(value: &str) -> Result<String> {
    if value.starts_with('\n') && value.contains("\n;") {
        let mut content = value.replace('\n', "\n   ");
        content.push('\n');
        return Ok(content);
    }
    if value.ends_with('\n')
        && !value.contains("\n;")
        && !value.starts_with(';')
        && unindent(value).is_none()
    {
        return Ok(value.to_string());
    }
    Err(Error::unrepresentable(format!(
        "multi-line value cannot be written as a semicolon block without altering it: {:?}",
        value
    )))
}

fn check_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() || contains_whitespace(name) {
        return Err(Error::unrepresentable(format!(
            "{} name {:?} is empty or contains whitespace",
            kind, name
        )));
    }
    Ok(())
}

/// Things that can be written as NMR-STAR text.
pub trait Render {
    /// Appends the text form of `self` to the serializer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unrepresentable`] if any part cannot be written.
    fn render(&self, serializer: &mut Serializer) -> Result<()>;
}

/// The NMR-STAR serializer.
///
/// Accumulates text in memory. Created via [`Serializer::new`].
pub struct Serializer {
    output: String,
    options: WriteOptions,
}

impl Serializer {
    pub fn new(options: WriteOptions) -> Self {
        Serializer {
            output: String::new(),
            options,
        }
    }

    /// Renders `value` onto the end of the output.
    ///
    /// # Errors
    ///
    /// See [`Render::render`].
    pub fn serialize<R: Render + ?Sized>(&mut self, value: &R) -> Result<()> {
        value.render(self)
    }

    /// Returns the text written so far.
    pub fn into_inner(self) -> String {
        self.output
    }

    fn write_block(&mut self, content: &str) {
        self.output.push_str(";\n");
        self.output.push_str(content);
        self.output.push_str(";\n");
    }
}

impl Render for Entry {
    fn render(&self, serializer: &mut Serializer) -> Result<()> {
        check_name("entry", self.id())?;
        serializer.output.push_str("data_");
        serializer.output.push_str(self.id());
        serializer.output.push_str("\n\n");
        for frame in self.saveframes() {
            frame.render(serializer)?;
            serializer.output.push('\n');
        }
        Ok(())
    }
}

impl Render for Saveframe {
    fn render(&self, serializer: &mut Serializer) -> Result<()> {
        check_name("saveframe", self.name())?;
        if self.tag_prefix().is_none() {
            return Err(Error::unrepresentable(format!(
                "saveframe '{}' has no dotted tag, so it has no tag prefix and \
                 would only read back in legacy mode",
                self.name()
            )));
        }
        serializer.output.push_str("save_");
        serializer.output.push_str(self.name());
        serializer.output.push('\n');

        let width = self.tags().map(|tag| tag.name.chars().count()).max().unwrap_or(0);
        for tag in self.tags() {
            match quote_value(&tag.value)? {
                Quoted::Inline(text) => {
                    serializer.output.push_str(&format!(
                        "   {:<width$}  {}\n",
                        tag.name,
                        text,
                        width = width
                    ));
                }
                Quoted::Block(content) => {
                    serializer.output.push_str(&format!("   {}\n", tag.name));
                    serializer.write_block(&content);
                }
            }
        }

        for lp in self.loops() {
            if serializer.options.skip_empty_loops && lp.is_empty() {
                continue;
            }
            lp.render(serializer)?;
        }
        serializer.output.push_str("\nsave_\n");
        Ok(())
    }
}

impl Render for Loop {
    fn render(&self, serializer: &mut Serializer) -> Result<()> {
        if self.tags().is_empty() {
            return Err(Error::unrepresentable("loop has no tags"));
        }
        serializer.output.push_str("\n   loop_\n");
        for tag in self.tags() {
            serializer.output.push_str("      ");
            serializer.output.push_str(tag);
            serializer.output.push('\n');
        }
        serializer.output.push('\n');

        let rows = self
            .rows()
            .iter()
            .map(|row| row.iter().map(|v| quote_value(v)).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;

        let mut widths = vec![0; self.tags().len()];
        for row in &rows {
            for (width, value) in widths.iter_mut().zip(row) {
                if let Quoted::Inline(text) = value {
                    *width = (*width).max(text.chars().count());
                }
            }
        }

        for row in &rows {
            let mut line = String::from(ROW_INDENT);
            for (value, width) in row.iter().zip(&widths) {
                match value {
                    Quoted::Inline(text) => {
                        line.push_str(&format!("{:<width$}   ", text, width = *width));
                    }
                    Quoted::Block(content) => {
                        flush_row_line(&mut serializer.output, &mut line);
                        serializer.write_block(content);
                    }
                }
            }
            flush_row_line(&mut serializer.output, &mut line);
        }
        serializer.output.push_str("\n   stop_\n");
        Ok(())
    }
}

fn flush_row_line(output: &mut String, line: &mut String) {
    let trimmed = line.trim_end();
    if !trimmed.is_empty() {
        output.push_str(trimmed);
        output.push('\n');
    }
    line.clear();
    line.push_str(ROW_INDENT);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<R: Render>(value: &R) -> Result<String> {
        let mut serializer = Serializer::new(WriteOptions::default());
        serializer.serialize(value)?;
        Ok(serializer.into_inner())
    }

    #[test]
    fn test_quote_rules() {
        let inline = |v: &str| match quote_value(v).unwrap() {
            Quoted::Inline(text) => text.into_owned(),
            Quoted::Block(_) => panic!("unexpected block for {:?}", v),
        };
        assert_eq!(inline(""), "''");
        assert_eq!(inline("$frame"), "$frame");
        assert_eq!(inline("_x"), "'_x'");
        assert_eq!(inline("#x"), "'#x'");
        assert_eq!(inline(";x"), "';x'");
        assert_eq!(inline("Data_1"), "'Data_1'");
        assert_eq!(inline("don't"), "don't");
        assert_eq!(inline("'q"), "''q'");
        assert_eq!(inline("a' b"), "\"a' b\"");
        assert!(quote_value("a' \" b").is_err());
        assert!(quote_value("cr\r").is_err());
    }

    #[test]
    fn test_block_rules() {
        assert_eq!(
            quote_value("\nnested\n;\ntext\n;\n").unwrap(),
            Quoted::Block("\n   nested\n   ;\n   text\n   ;\n   \n".to_string())
        );
        assert!(quote_value(";leading\n").is_err());
        assert!(quote_value("inner\n;\n").is_err());
        assert!(quote_value("\n   a\n   ;\n").is_err());
    }

    #[test]
    fn test_saveframe_layout() {
        let mut frame = Saveframe::new("info");
        frame.add_tag("_Entry.ID", "1").unwrap();
        frame.add_tag("_Entry.Details", "first\nsecond\n").unwrap();
        assert_eq!(
            render(&frame).unwrap(),
            "save_info\n   _Entry.ID       1\n   _Entry.Details\n;\nfirst\nsecond\n;\n\nsave_\n"
        );
    }

    #[test]
    fn test_loop_layout_with_block() {
        let mut lp = Loop::new();
        lp.append_tag("_A.x").unwrap();
        lp.append_tag("_A.y").unwrap();
        lp.add_row(["1", "long value"]).unwrap();
        lp.add_row(["22", "text\n"]).unwrap();
        assert_eq!(
            render(&lp).unwrap(),
            "\n   loop_\n      _A.x\n      _A.y\n\n     1    'long value'\n     22\n;\ntext\n;\n\n   stop_\n"
        );
    }

    #[test]
    fn test_skip_empty_loops() {
        let mut frame = Saveframe::new("f");
        frame.add_tag("_F.a", "1").unwrap();
        let mut lp = Loop::new();
        lp.append_tag("_L.a").unwrap();
        frame.append_loop(lp).unwrap();

        assert!(render(&frame).unwrap().contains("loop_"));
        let mut serializer = Serializer::new(WriteOptions::new().with_skip_empty_loops(true));
        serializer.serialize(&frame).unwrap();
        assert!(!serializer.into_inner().contains("loop_"));
    }

    #[test]
    fn test_unwritable_names() {
        assert!(render(&Entry::new("")).is_err());
        assert!(render(&Saveframe::new("a b")).is_err());
        assert!(render(&Loop::new()).is_err());
    }

    #[test]
    fn test_saveframe_without_prefix() {
        let mut frame = Saveframe::new("legacy");
        frame.add_tag("_Legacy_tag", "1").unwrap();
        let err = render(&frame).unwrap_err();
        assert!(matches!(err, Error::Unrepresentable(_)));

        let mut lp = Loop::new();
        lp.append_tag("_L.a").unwrap();
        let mut loops_only = Saveframe::new("only_loop");
        loops_only.append_loop(lp).unwrap();
        assert!(matches!(render(&loops_only), Err(Error::Unrepresentable(_))));
    }
}
