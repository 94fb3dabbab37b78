//! # nmrstar
//!
//! A reader and writer for NMR-STAR, the self-describing tag/value text
//! format used to exchange biomolecular NMR records.
//!
//! ## The format
//!
//! A document is one entry holding ordered, uniquely named saveframes. Each
//! saveframe holds ordered tag/value pairs and ordered loops, and each loop
//! is a table of tag columns and value rows:
//!
//! ```text
//! data_15000
//!
//! save_entry_information
//!    _Entry.Sf_category  entry_information
//!    _Entry.Title        'A multi word title'
//!
//!    loop_
//!       _Author.Given_name
//!       _Author.Family_name
//!
//!      Ada    Lovelace
//!      Alan   Turing
//!
//!    stop_
//!
//! save_
//! ```
//!
//! ## Key Features
//!
//! - **Two tokenizer backends**: a portable byte cursor and a DFA-driven
//!   lexer, selected per parse and guaranteed to agree token for token
//! - **Explicit grammar**: a pure state machine ([`de::step`]) that can be
//!   tested one transition at a time
//! - **Policy per parse**: strict or lenient warnings, suppressed
//!   categories and legacy compatibility travel in [`ParseOptions`], never in
//!   global state
//! - **Line-accurate errors**: every parse error carries the line of the
//!   token that triggered it
//! - **Lossless output**: the writer never alters a value; if a value
//!   cannot be written exactly it reports [`Error::Unrepresentable`]
//!
//! ## Quick Start
//!
//! ```rust
//! use nmrstar::{from_str, to_string};
//!
//! let text = "data_demo\nsave_info\n_Entry.ID demo\n_Entry.Title 'two words'\nsave_\n";
//! let entry = from_str(text).unwrap();
//!
//! let frame = entry.saveframe("info").unwrap();
//! assert_eq!(frame.tag("Title"), Some("two words"));
//!
//! // Writing and reading back yields the same document
//! let rendered = to_string(&entry).unwrap();
//! assert_eq!(from_str(&rendered).unwrap(), entry);
//! ```
//!
//! ### Parsing with a policy
//!
//! ```rust
//! use nmrstar::{from_str_with_options, Error, ParseOptions, TokenizerBackend, WarningCategory};
//!
//! let text = "data_1\nsave_a\n_A.b c\nloop_\n_L.x\nstop_\nsave_\n";
//!
//! let strict = ParseOptions::strict().with_backend(TokenizerBackend::Portable);
//! assert!(matches!(from_str_with_options(text, &strict), Err(Error::Semantic { line: 6, .. })));
//!
//! let tolerant = strict.suppress(WarningCategory::EmptyLoop);
//! assert!(from_str_with_options(text, &tolerant).is_ok());
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events and never installs a subscriber: tokens
//! at `TRACE`, block boundaries at `DEBUG` and tolerated warnings at `WARN`.
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Proper error propagation with `Result` types
//! - No panics in the public API

pub mod accelerated;
pub mod de;
pub mod entry;
pub mod error;
pub mod loops;
pub mod options;
pub mod portable;
pub mod saveframe;
pub mod ser;
pub mod syntax;
pub mod tokenizer;

pub use de::{parse_entry, parse_loop, parse_saveframe, Parser};
pub use entry::Entry;
pub use error::{Error, Result};
pub use loops::Loop;
pub use options::{ParseOptions, TokenizerBackend, WarningCategory, WriteOptions};
pub use saveframe::{Saveframe, Tag};
pub use ser::{Render, Serializer};

use std::io;

/// Render an entry, saveframe or loop as NMR-STAR text.
///
/// # Examples
///
/// ```rust
/// use nmrstar::{to_string, Entry};
///
/// let entry = Entry::new("empty");
/// assert_eq!(to_string(&entry).unwrap(), "data_empty\n\n");
/// ```
///
/// # Errors
///
/// Returns [`Error::Unrepresentable`] if a name or value cannot be written
/// so that it reads back unchanged. This includes saveframes without a dotted
/// tag, which only read back with
/// [`ParseOptions::with_legacy_format`](crate::ParseOptions::with_legacy_format).
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<R>(value: &R) -> Result<String>
where
    R: ?Sized + Render,
{
    to_string_with_options(value, WriteOptions::default())
}

/// Render an entry, saveframe or loop as NMR-STAR text with custom options.
///
/// # Examples
///
/// ```rust
/// use nmrstar::{to_string_with_options, Loop, Saveframe, WriteOptions};
///
/// let mut frame = Saveframe::new("f");
/// frame.add_tag("_F.ID", "1").unwrap();
/// let mut lp = Loop::new();
/// lp.append_tag("_Empty.ID").unwrap();
/// frame.append_loop(lp).unwrap();
///
/// let options = WriteOptions::new().with_skip_empty_loops(true);
/// let text = to_string_with_options(&frame, options).unwrap();
/// assert!(!text.contains("loop_"));
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be written.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<R>(value: &R, options: WriteOptions) -> Result<String>
where
    R: ?Sized + Render,
{
    let mut serializer = Serializer::new(options);
    serializer.serialize(value)?;
    Ok(serializer.into_inner())
}

/// Write an entry, saveframe or loop to a writer as NMR-STAR text.
///
/// # Examples
///
/// ```rust
/// use nmrstar::{to_writer, Entry};
///
/// let mut buffer = Vec::new();
/// to_writer(&mut buffer, &Entry::new("x")).unwrap();
/// assert_eq!(buffer, b"data_x\n\n");
/// ```
///
/// # Errors
///
/// Returns an error if rendering fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, R>(writer: W, value: &R) -> Result<()>
where
    W: io::Write,
    R: ?Sized + Render,
{
    to_writer_with_options(writer, value, WriteOptions::default())
}

/// Write an entry, saveframe or loop to a writer with custom options.
///
/// # Errors
///
/// Returns an error if rendering fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, R>(mut writer: W, value: &R, options: WriteOptions) -> Result<()>
where
    W: io::Write,
    R: ?Sized + Render,
{
    let text = to_string_with_options(value, options)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

/// Parse an entry from NMR-STAR text with default options.
///
/// # Examples
///
/// ```rust
/// use nmrstar::from_str;
///
/// let entry = from_str("data_X\n").unwrap();
/// assert_eq!(entry.id(), "X");
/// assert!(entry.is_empty());
/// ```
///
/// # Errors
///
/// Returns a structural, lexical or semantic error carrying the line of
/// the offending token.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str(s: &str) -> Result<Entry> {
    from_str_with_options(s, &ParseOptions::default())
}

/// Parse an entry from NMR-STAR text under the given policy.
///
/// # Errors
///
/// Returns a structural, lexical or semantic error carrying the line of
/// the offending token, including warnings escalated by `options`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str_with_options(s: &str, options: &ParseOptions) -> Result<Entry> {
    parse_entry(s, options)
}

/// Parse an entry from an I/O stream of NMR-STAR text.
///
/// The whole stream is read before tokenizing.
///
/// # Examples
///
/// ```rust
/// use nmrstar::from_reader;
/// use std::io::Cursor;
///
/// let entry = from_reader(Cursor::new(b"data_X\n")).unwrap();
/// assert_eq!(entry.id(), "X");
/// ```
///
/// # Errors
///
/// Returns an error if reading from the reader fails or the text is not a
/// valid entry.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R>(mut reader: R) -> Result<Entry>
where
    R: io::Read,
{
    let mut string = String::new();
    reader
        .read_to_string(&mut string)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_str(&string)
}

/// Parse an entry from bytes of NMR-STAR text.
///
/// # Errors
///
/// Returns an error if the bytes are not valid UTF-8 or not a valid entry.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice(v: &[u8]) -> Result<Entry> {
    let s = std::str::from_utf8(v).map_err(|e| Error::custom(e.to_string()))?;
    from_str(s)
}
