//! Saveframes: named blocks of tags and loops.
//!
//! Tags keep their insertion order and are unique ignoring case. The first
//! dotted tag sets the saveframe's tag prefix (`_Entry` in `_Entry.ID`),
//! and every later dotted tag must carry the same prefix.
//!
//! ## Examples
//!
//! ```rust
//! use nmrstar::Saveframe;
//!
//! let mut frame = Saveframe::new("entry_information");
//! frame.add_tag("_Entry.Sf_category", "entry_information").unwrap();
//! frame.add_tag("ID", "15000").unwrap();
//!
//! assert_eq!(frame.tag_prefix(), Some("_Entry"));
//! assert_eq!(frame.tag("_entry.id"), Some("15000"));
//! assert!(frame.add_tag("_Citation.ID", "1").is_err());
//! ```

use crate::loops::Loop;
use crate::syntax::{contains_whitespace, qualify, split_tag};
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::str::FromStr;

/// A single saveframe tag.
#[derive(Clone, Debug, Serialize)]
pub struct Tag {
    /// Full tag name, such as `_Entry.ID`
    pub name: String,
    pub value: String,
    /// Source line the value was read from
    #[serde(skip)]
    pub line: Option<usize>,
}

// Where a tag came from does not change what it says.
impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

impl Eq for Tag {}

/// A named block of tags and loops.
#[derive(Clone, Debug, Serialize)]
pub struct Saveframe {
    name: String,
    tag_prefix: Option<String>,
    // Keyed by lowercased full name
    #[serde(serialize_with = "serialize_values")]
    tags: IndexMap<String, Tag>,
    loops: Vec<Loop>,
}

fn serialize_values<S, V>(map: &IndexMap<String, V>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    V: Serialize,
{
    serializer.collect_seq(map.values())
}

// IndexMap equality ignores order; tag order is part of the document.
impl PartialEq for Saveframe {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.tag_prefix == other.tag_prefix
            && self.tags.values().eq(other.tags.values())
            && self.loops == other.loops
    }
}

impl Eq for Saveframe {}

impl Saveframe {
    /// Creates an empty saveframe.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Saveframe {
            name: name.into(),
            tag_prefix: None,
            tags: IndexMap::new(),
            loops: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the category shared by the saveframe's dotted tags.
    #[must_use]
    pub fn tag_prefix(&self) -> Option<&str> {
        self.tag_prefix.as_deref()
    }

    /// Iterates over the tags in insertion order.
    pub fn tags(&self) -> impl Iterator<Item = &Tag> + '_ {
        self.tags.values()
    }

    /// Returns the value of a tag, ignoring case.
    ///
    /// Short names are resolved against the tag prefix.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.get_tag(name).map(|tag| tag.value.as_str())
    }

    #[must_use]
    pub fn get_tag(&self, name: &str) -> Option<&Tag> {
        let full = self.full_name(name).ok()?;
        self.tags.get(&full.to_ascii_lowercase())
    }

    #[must_use]
    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    /// Returns the loop with the given category, ignoring case.
    #[must_use]
    pub fn get_loop(&self, category: &str) -> Option<&Loop> {
        self.loops.iter().find(|lp| {
            lp.category()
                .map_or(false, |c| c.eq_ignore_ascii_case(category))
        })
    }

    /// Consumes the saveframe, returning its loops in order.
    #[must_use]
    pub fn into_loops(self) -> Vec<Loop> {
        self.loops
    }

    pub(crate) fn last_loop_mut(&mut self) -> Option<&mut Loop> {
        self.loops.last_mut()
    }

    fn full_name(&self, name: &str) -> Result<String> {
        if name.starts_with('_') {
            return Ok(name.to_string());
        }
        match &self.tag_prefix {
            Some(prefix) => Ok(qualify(Some(prefix), name)),
            None => Err(Error::invalid_document(format!(
                "tag '{}' needs a prefix, but saveframe '{}' has none yet",
                name, self.name
            ))),
        }
    }

    /// Appends a tag, recording the source line it was read from.
    ///
    /// # Errors
    ///
    /// Fails for empty names, names containing whitespace or more than one
    /// `.`, a prefix that differs from the saveframe's, or a tag that is
    /// already present (ignoring case).
    pub fn append_tag(
        &mut self,
        name: &str,
        value: impl Into<String>,
        line: Option<usize>,
    ) -> Result<()> {
        if name.is_empty() || contains_whitespace(name) {
            return Err(Error::invalid_document(format!(
                "invalid tag name '{}'",
                name
            )));
        }
        let full = self.full_name(name)?;
        if full.matches('.').count() > 1 {
            return Err(Error::invalid_document(format!(
                "tag '{}' contains more than one '.'",
                full
            )));
        }

        if let Some(category) = split_tag(&full).0 {
            if let Some(prefix) = &self.tag_prefix {
                if !prefix.eq_ignore_ascii_case(category) {
                    return Err(Error::invalid_document(format!(
                        "tag '{}' does not match the prefix '{}' of saveframe '{}'",
                        full, prefix, self.name
                    )));
                }
            } else {
                self.tag_prefix = Some(category.to_string());
            }
        }

        let key = full.to_ascii_lowercase();
        if self.tags.contains_key(&key) {
            return Err(Error::invalid_document(format!(
                "duplicate tag '{}' in saveframe '{}'",
                full, self.name
            )));
        }
        self.tags.insert(
            key,
            Tag {
                name: full,
                value: value.into(),
                line,
            },
        );
        Ok(())
    }

    /// Appends a tag that was not read from a file.
    ///
    /// # Errors
    ///
    /// See [`Saveframe::append_tag`].
    pub fn add_tag(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        self.append_tag(name, value, None)
    }

    /// Appends a loop.
    ///
    /// # Errors
    ///
    /// Fails if a loop with the same category is already present.
    pub fn append_loop(&mut self, lp: Loop) -> Result<()> {
        if let Some(category) = lp.category() {
            if self.get_loop(category).is_some() {
                return Err(Error::invalid_document(format!(
                    "duplicate loop category '{}' in saveframe '{}'",
                    category, self.name
                )));
            }
        }
        self.loops.push(lp);
        Ok(())
    }
}

impl FromStr for Saveframe {
    type Err = Error;

    /// Parses a bare `save_` … `save_` block with default options.
    fn from_str(s: &str) -> Result<Self> {
        crate::de::parse_saveframe(s, &crate::ParseOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_dotted_tag_sets_prefix() {
        let mut frame = Saveframe::new("x");
        frame.add_tag("_Legacy_tag", "1").unwrap();
        assert_eq!(frame.tag_prefix(), None);
        frame.append_tag("_Entry.ID", "1", Some(3)).unwrap();
        assert_eq!(frame.tag_prefix(), Some("_Entry"));
        assert!(frame.add_tag("_ENTRY.Title", "t").is_ok());
        assert!(frame.add_tag("_Other.Title", "t").is_err());
    }

    #[test]
    fn test_duplicate_tags_ignore_case() {
        let mut frame = Saveframe::new("x");
        frame.add_tag("_Entry.ID", "1").unwrap();
        let err = frame.add_tag("_entry.id", "2").unwrap_err();
        assert!(err.to_string().contains("duplicate tag"));
        assert!(frame.add_tag("id", "3").is_err());
    }

    #[test]
    fn test_invalid_tag_names() {
        let mut frame = Saveframe::new("x");
        assert!(frame.add_tag("ID", "1").is_err());
        assert!(frame.add_tag("_A.b.c", "1").is_err());
        assert!(frame.add_tag("_A b", "1").is_err());
        assert!(frame.add_tag("", "1").is_err());
    }

    #[test]
    fn test_tag_equality_ignores_line() {
        let mut a = Saveframe::new("x");
        let mut b = Saveframe::new("x");
        a.append_tag("_A.b", "v", Some(10)).unwrap();
        b.add_tag("_A.b", "v").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.get_tag("b").and_then(|t| t.line), Some(10));
    }

    #[test]
    fn test_tag_order_matters() {
        let mut a = Saveframe::new("x");
        let mut b = Saveframe::new("x");
        a.add_tag("_A.b", "1").unwrap();
        a.add_tag("_A.c", "2").unwrap();
        b.add_tag("_A.c", "2").unwrap();
        b.add_tag("_A.b", "1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_duplicate_loop_category() {
        let mut frame = Saveframe::new("x");
        let mut lp = Loop::new();
        lp.append_tag("_Atom.ID").unwrap();
        frame.append_loop(lp.clone()).unwrap();

        let mut other = Loop::new();
        other.append_tag("_atom.Name").unwrap();
        assert!(frame.append_loop(other).is_err());
        assert!(frame.get_loop("_ATOM").is_some());
    }
}
