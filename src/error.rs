//! Error types for NMR-STAR parsing and serialization.
//!
//! Every failure aborts the operation that raised it; there is no partial
//! document and no collect-and-continue mode.
//!
//! ## Error Categories
//!
//! - **Structural**: a keyword in the wrong position, a keyword missing its
//!   name, a quoted keyword where a bare one is required, or a saveframe or
//!   loop left open at end of input
//! - **Lexical**: an unterminated quoted value or semicolon block, or a
//!   malformed semicolon terminator
//! - **Semantic**: duplicate names, ragged loop data, reserved keywords used
//!   as bare values, and escalated warnings
//! - **Invalid document**: a construction call on the document model was
//!   rejected outside of a parse
//! - **Unrepresentable**: the writer cannot express a value without altering it
//!
//! ## Examples
//!
//! ```rust
//! use nmrstar::{from_str, Error};
//!
//! let err = from_str("data_1\nsave_1\n_Tag.example loop_\nsave_\n").unwrap_err();
//! assert!(matches!(err, Error::Semantic { line: 3, .. }));
//! assert!(err.to_string().contains("line 3"));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised while reading or writing NMR-STAR.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Token of the wrong shape for the current grammar position
    #[error("Structural error at line {line}: {msg}")]
    Structural { line: usize, msg: String },

    /// Quoted value or semicolon block that cannot be scanned
    #[error("Lexical error at line {line}: {msg}")]
    Lexical { line: usize, msg: String },

    /// Well-formed tokens that describe an invalid document
    #[error("Semantic error at line {line}: {msg}")]
    Semantic { line: usize, msg: String },

    /// Rejected document model construction call
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Value or name the writer cannot express
    #[error("Unrepresentable value: {0}")]
    Unrepresentable(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a structural error at the given line.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nmrstar::Error;
    ///
    /// let err = Error::structural(4, "loop improperly terminated");
    /// assert_eq!(err.line(), Some(4));
    /// ```
    pub fn structural<T: fmt::Display>(line: usize, msg: T) -> Self {
        Error::Structural {
            line,
            msg: msg.to_string(),
        }
    }

    /// Creates a lexical error at the given line.
    pub fn lexical<T: fmt::Display>(line: usize, msg: T) -> Self {
        Error::Lexical {
            line,
            msg: msg.to_string(),
        }
    }

    /// Creates a semantic error at the given line.
    pub fn semantic<T: fmt::Display>(line: usize, msg: T) -> Self {
        Error::Semantic {
            line,
            msg: msg.to_string(),
        }
    }

    /// Creates an error for a rejected document model call.
    pub fn invalid_document<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidDocument(msg.to_string())
    }

    /// Creates an error for a value the writer cannot express.
    pub fn unrepresentable<T: fmt::Display>(msg: T) -> Self {
        Error::Unrepresentable(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nmrstar::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for file reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Returns the source line this error points at, if any.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Structural { line, .. }
            | Error::Lexical { line, .. }
            | Error::Semantic { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// Attaches a source line to a rejected model call.
    ///
    /// Document model failures surfacing during a parse become semantic
    /// errors at the line of the token that triggered them. Errors that
    /// already carry a line are returned unchanged.
    #[must_use]
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Error::InvalidDocument(msg) => Error::Semantic { line, msg },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_is_reported_for_parse_errors() {
        assert_eq!(Error::lexical(7, "x").line(), Some(7));
        assert_eq!(Error::semantic(2, "x").line(), Some(2));
        assert_eq!(Error::invalid_document("x").line(), None);
    }

    #[test]
    fn test_at_line_only_rewrites_model_errors() {
        let err = Error::invalid_document("duplicate tag").at_line(9);
        assert_eq!(err, Error::semantic(9, "duplicate tag"));

        let err = Error::structural(1, "bad").at_line(9);
        assert_eq!(err.line(), Some(1));
    }
}
