//! NMR-STAR parsing.
//!
//! Parsing is split in two layers:
//!
//! - [`step`] is the grammar: a pure function from the current
//!   [`ParseContext`] and one token to the next context and an [`Action`].
//!   It holds every structural, lexical and keyword rule and resolves
//!   warnings against [`ParseOptions`].
//! - [`Parser`] pulls tokens from the configured backend, feeds them through
//!   [`step`] and applies each action to the document model. Errors raised
//!   by the model are reported at the line of the token that caused them.
//!
//! ## Usage
//!
//! Most users should use the high-level functions in the crate root:
//!
//! ```rust
//! use nmrstar::from_str;
//!
//! let text = "data_demo\n\nsave_info\n   _Entry.ID  demo\nsave_\n";
//! let entry = from_str(text).unwrap();
//! assert_eq!(entry.id(), "demo");
//! assert_eq!(entry.saveframe("info").and_then(|f| f.tag("ID")), Some("demo"));
//! ```
//!
//! ## Driving the grammar by hand
//!
//! ```rust
//! use nmrstar::de::{step, Action, ParseContext};
//! use nmrstar::tokenizer::{Delimiter, Token};
//! use nmrstar::ParseOptions;
//!
//! let options = ParseOptions::default();
//! let header = Token::new("data_1", Delimiter::Unquoted, 1);
//! let (context, action) = step(ParseContext::ExpectEntryHeader, &header, &options).unwrap();
//!
//! assert_eq!(context, ParseContext::ExpectSaveframeHeaderOrEnd);
//! assert_eq!(action, Action::BeginEntry { id: "1".to_string() });
//! ```

use crate::entry::Entry;
use crate::loops::Loop;
use crate::options::{ParseOptions, WarningCategory};
use crate::saveframe::Saveframe;
use crate::syntax::is_reserved;
use crate::tokenizer::{normalize, tokenizer, Token, Tokenizer};
use crate::{Error, Result};
use tracing::{debug, trace};

/// Grammar state between two tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseContext {
    /// Nothing read yet; a `data_` header must follow
    ExpectEntryHeader,
    /// Between saveframes; the only state where input may end
    ExpectSaveframeHeaderOrEnd,
    /// Inside a saveframe body
    ExpectTagOrLoopOrEnd,
    /// A tag name was read; its value must follow
    ExpectTagValue { tag: String },
    /// After `loop_`, gathering column names with their lines
    CollectingLoopTags { tags: Vec<(String, usize)> },
    /// The loop is registered and its tags are fixed; gathering values
    CollectingLoopData { values: Vec<String> },
}

/// Side effect of a grammar transition on the document model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    None,
    BeginEntry { id: String },
    BeginSaveframe { name: String },
    AddTag { name: String, value: String },
    /// Attach a new loop with these tags to the open saveframe
    RegisterLoop { tags: Vec<(String, usize)> },
    /// Reshape values into rows of the most recent loop
    FillLoop { values: Vec<String> },
    CloseSaveframe,
}

/// Advances the grammar by one token.
///
/// # Errors
///
/// Returns a structural error for tokens of the wrong shape, a semantic
/// error for bare keywords or `_` values where data is expected, and the
/// escalated form of any warning that policy does not tolerate.
pub fn step(
    context: ParseContext,
    token: &Token<'_>,
    options: &ParseOptions,
) -> Result<(ParseContext, Action)> {
    if let Some(category) = token.warning {
        options.resolve(category, token.line)?;
    }
    let text = token.as_str();
    let line = token.line;
    let bare = token.delimiter.is_unquoted();

    match context {
        ParseContext::ExpectEntryHeader => {
            let id = header(token, "data_", "an NMR-STAR document must start with 'data_'")?;
            Ok((
                ParseContext::ExpectSaveframeHeaderOrEnd,
                Action::BeginEntry { id },
            ))
        }

        ParseContext::ExpectSaveframeHeaderOrEnd => {
            let name = header(token, "save_", "only 'save_NAME' is valid in the body of an entry")?;
            Ok((
                ParseContext::ExpectTagOrLoopOrEnd,
                Action::BeginSaveframe { name },
            ))
        }

        ParseContext::ExpectTagOrLoopOrEnd => match text {
            "loop_" | "save_" if !bare => Err(Error::structural(
                line,
                format!("the {} keyword may not be quoted or semicolon-delimited", text),
            )),
            "loop_" => Ok((
                ParseContext::CollectingLoopTags { tags: Vec::new() },
                Action::None,
            )),
            "save_" => Ok((
                ParseContext::ExpectSaveframeHeaderOrEnd,
                Action::CloseSaveframe,
            )),
            _ if text.starts_with('_') => {
                if !bare {
                    return Err(Error::structural(
                        line,
                        "saveframe tags may not be quoted or semicolon-delimited",
                    ));
                }
                Ok((
                    ParseContext::ExpectTagValue {
                        tag: text.to_string(),
                    },
                    Action::None,
                ))
            }
            _ => Err(Error::structural(
                line,
                format!("invalid token found in saveframe: '{}'", text),
            )),
        },

        ParseContext::ExpectTagValue { tag } => {
            if bare {
                check_bare_value(token)?;
                if text.starts_with('_') {
                    return Err(Error::semantic(
                        line,
                        format!(
                            "a tag value may not start with an underscore unless quoted; \
                             the previous tag may be missing its value. Illegal value: {}",
                            text
                        ),
                    ));
                }
            }
            Ok((
                ParseContext::ExpectTagOrLoopOrEnd,
                Action::AddTag {
                    name: tag,
                    value: text.to_string(),
                },
            ))
        }

        ParseContext::CollectingLoopTags { mut tags } => {
            if bare && text.starts_with('_') {
                tags.push((text.to_string(), line));
                return Ok((ParseContext::CollectingLoopTags { tags }, Action::None));
            }
            if token.is_bare("stop_") {
                if tags.is_empty() {
                    options.resolve(WarningCategory::TagOnlyLoop, line)?;
                    return Ok((ParseContext::ExpectTagOrLoopOrEnd, Action::None));
                }
                options.resolve(WarningCategory::EmptyLoop, line)?;
                return Ok((
                    ParseContext::ExpectTagOrLoopOrEnd,
                    Action::RegisterLoop { tags },
                ));
            }
            if tags.is_empty() {
                return Err(Error::structural(line, "data found in loop before loop tags"));
            }
            check_bare_value(token)?;
            Ok((
                ParseContext::CollectingLoopData {
                    values: vec![text.to_string()],
                },
                Action::RegisterLoop { tags },
            ))
        }

        ParseContext::CollectingLoopData { mut values } => {
            if token.is_bare("stop_") {
                return Ok((
                    ParseContext::ExpectTagOrLoopOrEnd,
                    Action::FillLoop { values },
                ));
            }
            check_bare_value(token)?;
            if bare && text.starts_with('_') {
                return Err(Error::structural(
                    line,
                    format!("loop tags must precede loop data, found tag '{}'", text),
                ));
            }
            values.push(text.to_string());
            Ok((ParseContext::CollectingLoopData { values }, Action::None))
        }
    }
}

/// Checks that input may end in `context`.
///
/// `line` is the line of the last token read.
///
/// # Errors
///
/// Returns a structural error unless the context is between saveframes.
pub fn finish(context: &ParseContext, line: usize) -> Result<()> {
    match context {
        ParseContext::ExpectSaveframeHeaderOrEnd => Ok(()),
        ParseContext::ExpectEntryHeader => Err(Error::structural(
            line,
            "empty document: no 'data_' header found",
        )),
        ParseContext::ExpectTagOrLoopOrEnd | ParseContext::ExpectTagValue { .. } => Err(
            Error::structural(line, "saveframe improperly terminated at end of input"),
        ),
        ParseContext::CollectingLoopTags { .. } | ParseContext::CollectingLoopData { .. } => Err(
            Error::structural(line, "loop improperly terminated at end of input"),
        ),
    }
}

/// Validates a `data_`/`save_` header and returns the name that follows.
fn header(token: &Token<'_>, keyword: &str, misplaced: &str) -> Result<String> {
    let text = token.as_str();
    if !text.starts_with(keyword) {
        return Err(Error::structural(
            token.line,
            format!("{}, found '{}'", misplaced, text),
        ));
    }
    if text.len() == keyword.len() {
        return Err(Error::structural(
            token.line,
            format!("'{}' must be followed by a name", keyword),
        ));
    }
    if !token.delimiter.is_unquoted() {
        return Err(Error::structural(
            token.line,
            format!("the {} keyword may not be quoted or semicolon-delimited", keyword),
        ));
    }
    Ok(text[keyword.len()..].to_string())
}

fn check_bare_value(token: &Token<'_>) -> Result<()> {
    if token.delimiter.is_unquoted() && is_reserved(token.as_str()) {
        return Err(Error::semantic(
            token.line,
            format!(
                "keywords may not be used as data values unless quoted or semicolon-delimited; \
                 perhaps a loop was not terminated? Illegal value: {}",
                token.as_str()
            ),
        ));
    }
    Ok(())
}

/// Block a parse is rooted at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Root {
    Entry,
    Saveframe,
    Loop,
}

/// Applies grammar actions from a token stream to a document.
pub struct Parser<'a> {
    tokens: Box<dyn Tokenizer<'a> + 'a>,
    options: &'a ParseOptions,
    root: Root,
    context: ParseContext,
    entry: Entry,
    last_line: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser for an entry over `input`.
    ///
    /// The text is tokenized as given. Pass it through
    /// [`normalize`](crate::tokenizer::normalize) first, as [`parse_entry`]
    /// does, unless the raw layout must be kept.
    #[must_use]
    pub fn new(input: &'a str, options: &'a ParseOptions) -> Self {
        Self::rooted(input, options, Root::Entry)
    }

    fn rooted(input: &'a str, options: &'a ParseOptions, root: Root) -> Self {
        let context = match root {
            Root::Entry => ParseContext::ExpectEntryHeader,
            Root::Saveframe => ParseContext::ExpectSaveframeHeaderOrEnd,
            Root::Loop => ParseContext::ExpectTagOrLoopOrEnd,
        };
        Parser {
            tokens: tokenizer(options.backend, input),
            options,
            root,
            context,
            entry: Entry::new(""),
            last_line: 1,
        }
    }

    /// Returns the current grammar state.
    #[must_use]
    pub fn context(&self) -> &ParseContext {
        &self.context
    }

    /// Consumes every token, then checks that input ended cleanly.
    ///
    /// # Errors
    ///
    /// Returns the first lexical, structural or semantic error.
    pub fn run(&mut self) -> Result<()> {
        while let Some(token) = self.tokens.next_token()? {
            trace!(
                line = token.line,
                delimiter = token.delimiter.as_str(),
                text = %token.text,
                "token"
            );
            self.last_line = token.line;
            if self.root == Root::Loop
                && self.context == ParseContext::ExpectTagOrLoopOrEnd
                && !token.is_bare("loop_")
            {
                return Err(Error::structural(
                    token.line,
                    format!("only a single loop is allowed here, found '{}'", token.text),
                ));
            }
            let context = std::mem::replace(&mut self.context, ParseContext::ExpectEntryHeader);
            let (context, action) = step(context, &token, self.options)?;
            self.context = context;
            self.apply(action, token.line)?;
        }

        if self.root == Root::Loop && self.context == ParseContext::ExpectTagOrLoopOrEnd {
            return Ok(());
        }
        finish(&self.context, self.last_line)
    }

    /// Returns the document built so far.
    #[must_use]
    pub fn into_entry(self) -> Entry {
        self.entry
    }

    fn open_saveframe(&mut self) -> Result<&mut Saveframe> {
        self.entry
            .last_saveframe_mut()
            .ok_or_else(|| Error::custom("no saveframe is open"))
    }

    fn apply(&mut self, action: Action, line: usize) -> Result<()> {
        match action {
            Action::None => {}
            Action::BeginEntry { id } => {
                debug!(id = %id, line, "entry");
                self.entry = Entry::new(id);
            }
            Action::BeginSaveframe { name } => {
                debug!(name = %name, line, "saveframe");
                self.entry
                    .append_saveframe(&name)
                    .map_err(|e| e.at_line(line))?;
            }
            Action::AddTag { name, value } => {
                self.open_saveframe()?
                    .append_tag(&name, value, Some(line))
                    .map_err(|e| e.at_line(line))?;
            }
            Action::RegisterLoop { tags } => {
                let mut lp = Loop::new();
                for (tag, tag_line) in &tags {
                    lp.append_tag(tag).map_err(|e| e.at_line(*tag_line))?;
                }
                debug!(category = lp.category(), columns = tags.len(), line, "loop");
                self.open_saveframe()?
                    .append_loop(lp)
                    .map_err(|e| e.at_line(line))?;
            }
            Action::FillLoop { values } => {
                self.open_saveframe()?
                    .last_loop_mut()
                    .ok_or_else(|| Error::custom("no loop is open"))?
                    .set_rows(values)
                    .map_err(|e| e.at_line(line))?;
            }
            Action::CloseSaveframe => {
                let legacy = self.options.allow_legacy_format;
                let frame = self.open_saveframe()?;
                if !legacy && frame.tag_prefix().is_none() {
                    return Err(Error::semantic(
                        line,
                        format!(
                            "the tag prefix of saveframe '{}' was never set; either it has no \
                             tags or it uses the legacy format, which is not allowed",
                            frame.name()
                        ),
                    ));
                }
                debug!(name = frame.name(), line, "saveframe closed");
            }
        }
        Ok(())
    }
}

/// Parses a complete `data_` entry.
///
/// # Errors
///
/// Returns the first lexical, structural or semantic error.
pub fn parse_entry(text: &str, options: &ParseOptions) -> Result<Entry> {
    let normalized = normalize(text);
    let mut parser = Parser::new(&normalized, options);
    parser.run()?;
    Ok(parser.into_entry())
}

/// Parses a single `save_` … `save_` block without an entry header.
///
/// # Errors
///
/// Fails like [`parse_entry`], and also when the text holds no saveframe
/// or more than one.
pub fn parse_saveframe(text: &str, options: &ParseOptions) -> Result<Saveframe> {
    let normalized = normalize(text);
    let mut parser = Parser::rooted(&normalized, options, Root::Saveframe);
    parser.run()?;
    let line = parser.last_line;
    let mut frames = parser.into_entry().into_saveframes();
    match frames.len() {
        1 => Ok(frames.remove(0)),
        0 => Err(Error::structural(line, "no saveframe found")),
        n => Err(Error::structural(
            line,
            format!("expected a single saveframe, found {}", n),
        )),
    }
}

/// Parses a single `loop_` … `stop_` block.
///
/// # Errors
///
/// Fails like [`parse_entry`], and also when the text holds anything other
/// than exactly one loop.
pub fn parse_loop(text: &str, options: &ParseOptions) -> Result<Loop> {
    let normalized = normalize(text);
    let mut parser = Parser::rooted(&normalized, options, Root::Loop);
    parser.entry.add_saveframe(Saveframe::new("loop"))?;
    parser.run()?;
    let line = parser.last_line;
    let mut loops = parser
        .into_entry()
        .into_saveframes()
        .into_iter()
        .flat_map(Saveframe::into_loops)
        .collect::<Vec<_>>();
    match loops.len() {
        1 => Ok(loops.remove(0)),
        0 => Err(Error::structural(line, "no loop found")),
        n => Err(Error::structural(
            line,
            format!("expected a single loop, found {}", n),
        )),
    }
}
