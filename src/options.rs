//! Configuration options for NMR-STAR reading and writing.
//!
//! This module provides types to customize parsing policy and output:
//!
//! - [`ParseOptions`]: warning policy, legacy compatibility and tokenizer backend
//! - [`WarningCategory`]: the warnings that policy can suppress or escalate
//! - [`TokenizerBackend`]: choice between the portable and accelerated tokenizers
//! - [`WriteOptions`]: writer configuration
//!
//! Options are plain values. Each parse receives its own snapshot, so
//! concurrent parses with different settings never interfere.
//!
//! ## Examples
//!
//! ```rust
//! use nmrstar::{from_str_with_options, ParseOptions, WarningCategory};
//!
//! let text = "data_1\nsave_1\n_A.b c\nloop_\n_a.b\nstop_\nsave_\n";
//!
//! // Strict mode escalates the empty loop
//! assert!(from_str_with_options(text, &ParseOptions::strict()).is_err());
//!
//! // Unless that category is suppressed
//! let options = ParseOptions::strict().suppress(WarningCategory::EmptyLoop);
//! assert!(from_str_with_options(text, &options).is_ok());
//! ```

use crate::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Warning categories that policy can suppress or escalate.
///
/// # Examples
///
/// ```rust
/// use nmrstar::WarningCategory;
///
/// assert_eq!(WarningCategory::TagOnlyLoop.as_str(), "tag-only-loop");
/// assert_eq!("bad-multiline".parse(), Ok(WarningCategory::BadMultiline));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WarningCategory {
    /// `stop_` closing a loop that declared no tags
    TagOnlyLoop,
    /// `stop_` closing a loop that declared tags but holds no values
    EmptyLoop,
    /// Semicolon terminator followed by blanks instead of a newline
    BadMultiline,
}

impl WarningCategory {
    /// Every category, in declaration order.
    pub const ALL: [WarningCategory; 3] = [
        WarningCategory::TagOnlyLoop,
        WarningCategory::EmptyLoop,
        WarningCategory::BadMultiline,
    ];

    /// Returns the kebab-case name of this category.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            WarningCategory::TagOnlyLoop => "tag-only-loop",
            WarningCategory::EmptyLoop => "empty-loop",
            WarningCategory::BadMultiline => "bad-multiline",
        }
    }

    /// Builds the hard error this warning becomes when escalated.
    pub(crate) fn escalate(self, line: usize) -> Error {
        let msg = match self {
            WarningCategory::TagOnlyLoop => "loop declares no tags",
            WarningCategory::EmptyLoop => "loop declares tags but holds no data",
            WarningCategory::BadMultiline => {
                "semicolon terminator followed by whitespace instead of a newline"
            }
        };
        let msg = format!("{} [{}]", msg, self.as_str());
        match self {
            WarningCategory::BadMultiline => Error::lexical(line, msg),
            WarningCategory::TagOnlyLoop | WarningCategory::EmptyLoop => {
                Error::semantic(line, msg)
            }
        }
    }
}

impl fmt::Display for WarningCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WarningCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        WarningCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| Error::custom(format!("unknown warning category '{}'", s)))
    }
}

/// Tokenizer implementation used for a parse.
///
/// Both backends produce identical token streams; they differ only in how
/// token starts are dispatched and how line numbers are tracked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
pub enum TokenizerBackend {
    /// Hand-written byte cursor; line numbers are counted on demand
    Portable,
    /// Generated DFA; line numbers are tracked as newlines are consumed
    #[default]
    Accelerated,
}

impl TokenizerBackend {
    /// Returns the lowercase name of this backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TokenizerBackend::Portable => "portable",
            TokenizerBackend::Accelerated => "accelerated",
        }
    }
}

impl fmt::Display for TokenizerBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenizerBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "portable" => Ok(TokenizerBackend::Portable),
            "accelerated" => Ok(TokenizerBackend::Accelerated),
            other => Err(Error::custom(format!(
                "unknown tokenizer backend '{}'",
                other
            ))),
        }
    }
}

/// Policy snapshot consulted by a single parse.
///
/// # Examples
///
/// ```rust
/// use nmrstar::{ParseOptions, TokenizerBackend, WarningCategory};
///
/// // Lenient defaults
/// let options = ParseOptions::new();
/// assert!(!options.strict_warnings);
///
/// // Custom configuration
/// let options = ParseOptions::strict()
///     .suppress(WarningCategory::TagOnlyLoop)
///     .with_legacy_format(true)
///     .with_backend(TokenizerBackend::Portable);
/// assert!(options.is_suppressed(WarningCategory::TagOnlyLoop));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseOptions {
    /// Escalate non-suppressed warnings to hard errors
    pub strict_warnings: bool,
    /// Categories that are ignored entirely
    pub suppressed: BTreeSet<WarningCategory>,
    /// Accept saveframes without a tag prefix
    pub allow_legacy_format: bool,
    pub backend: TokenizerBackend,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            strict_warnings: false,
            suppressed: BTreeSet::new(),
            allow_legacy_format: false,
            backend: TokenizerBackend::default(),
        }
    }
}

impl ParseOptions {
    /// Creates lenient options: warnings are logged, never escalated.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options that escalate every warning to a hard error.
    #[must_use]
    pub fn strict() -> Self {
        ParseOptions {
            strict_warnings: true,
            ..Default::default()
        }
    }

    /// Enables or disables warning escalation.
    #[must_use]
    pub fn with_strict_warnings(mut self, strict: bool) -> Self {
        self.strict_warnings = strict;
        self
    }

    /// Suppresses a warning category.
    #[must_use]
    pub fn suppress(mut self, category: WarningCategory) -> Self {
        self.suppressed.insert(category);
        self
    }

    /// Allows saveframes that carry no tag prefix.
    #[must_use]
    pub fn with_legacy_format(mut self, allow: bool) -> Self {
        self.allow_legacy_format = allow;
        self
    }

    /// Selects the tokenizer backend.
    #[must_use]
    pub fn with_backend(mut self, backend: TokenizerBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Returns true if the category is ignored.
    #[must_use]
    pub fn is_suppressed(&self, category: WarningCategory) -> bool {
        self.suppressed.contains(&category)
    }

    /// Resolves a warning raised at `line`.
    ///
    /// Suppressed categories pass silently. Otherwise the warning is either
    /// logged (lenient mode) or escalated to a hard error (strict mode).
    ///
    /// # Errors
    ///
    /// Returns the escalated error when strict warnings are enabled and the
    /// category is not suppressed.
    pub fn resolve(&self, category: WarningCategory, line: usize) -> Result<()> {
        if self.is_suppressed(category) {
            return Ok(());
        }
        if self.strict_warnings {
            return Err(category.escalate(line));
        }
        tracing::warn!(category = category.as_str(), line, "tolerating warning");
        Ok(())
    }
}

/// Configuration options for NMR-STAR output.
///
/// # Examples
///
/// ```rust
/// use nmrstar::WriteOptions;
///
/// let options = WriteOptions::new().with_skip_empty_loops(true);
/// assert!(options.skip_empty_loops);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Omit loops that have no rows
    pub skip_empty_loops: bool,
}

impl WriteOptions {
    /// Creates default options (every loop is written).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether loops without rows are omitted.
    #[must_use]
    pub fn with_skip_empty_loops(mut self, skip: bool) -> Self {
        self.skip_empty_loops = skip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names_roundtrip() {
        for category in WarningCategory::ALL {
            assert_eq!(category.as_str().parse::<WarningCategory>(), Ok(category));
        }
        assert!("nonsense".parse::<WarningCategory>().is_err());
    }

    #[test]
    fn test_backend_names() {
        assert_eq!("portable".parse(), Ok(TokenizerBackend::Portable));
        assert_eq!(TokenizerBackend::default(), TokenizerBackend::Accelerated);
        assert!("native".parse::<TokenizerBackend>().is_err());
    }

    #[test]
    fn test_resolve_policy() {
        let lenient = ParseOptions::new();
        assert!(lenient.resolve(WarningCategory::EmptyLoop, 3).is_ok());

        let strict = ParseOptions::strict();
        assert!(matches!(
            strict.resolve(WarningCategory::EmptyLoop, 3),
            Err(Error::Semantic { line: 3, .. })
        ));
        assert!(matches!(
            strict.resolve(WarningCategory::BadMultiline, 5),
            Err(Error::Lexical { line: 5, .. })
        ));

        let suppressed = ParseOptions::strict().suppress(WarningCategory::EmptyLoop);
        assert!(suppressed.resolve(WarningCategory::EmptyLoop, 3).is_ok());
        assert!(suppressed.resolve(WarningCategory::TagOnlyLoop, 3).is_err());
    }
}
