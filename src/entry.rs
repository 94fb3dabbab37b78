//! Entries: the top-level `data_` block.
//!
//! ## Examples
//!
//! ```rust
//! use nmrstar::Entry;
//!
//! let mut entry = Entry::new("15000");
//! let frame = entry.append_saveframe("entry_information").unwrap();
//! frame.add_tag("_Entry.ID", "15000").unwrap();
//!
//! assert!(entry.append_saveframe("entry_information").is_err());
//! assert_eq!(entry.len(), 1);
//! ```

use crate::saveframe::Saveframe;
use crate::syntax::contains_whitespace;
use crate::{Error, Result};
use indexmap::map::Entry as Slot;
use indexmap::IndexMap;
use serde::Serialize;
use std::str::FromStr;

/// A parsed or constructed NMR-STAR document.
#[derive(Clone, Debug, Serialize)]
pub struct Entry {
    id: String,
    #[serde(serialize_with = "serialize_frames")]
    saveframes: IndexMap<String, Saveframe>,
}

fn serialize_frames<S>(
    map: &IndexMap<String, Saveframe>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(map.values())
}

// Saveframe order is significant.
impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.saveframes.values().eq(other.saveframes.values())
    }
}

impl Eq for Entry {}

impl Entry {
    /// Creates an empty entry.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Entry {
            id: id.into(),
            saveframes: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of saveframes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.saveframes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.saveframes.is_empty()
    }

    /// Iterates over the saveframes in insertion order.
    pub fn saveframes(&self) -> impl Iterator<Item = &Saveframe> + '_ {
        self.saveframes.values()
    }

    #[must_use]
    pub fn saveframe(&self, name: &str) -> Option<&Saveframe> {
        self.saveframes.get(name)
    }

    pub fn saveframe_mut(&mut self, name: &str) -> Option<&mut Saveframe> {
        self.saveframes.get_mut(name)
    }

    /// Returns every saveframe whose tag prefix matches, ignoring case.
    pub fn saveframes_by_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a Saveframe> + 'a {
        self.saveframes().filter(move |frame| {
            frame
                .tag_prefix()
                .map_or(false, |p| p.eq_ignore_ascii_case(prefix))
        })
    }

    /// Consumes the entry, returning its saveframes in order.
    #[must_use]
    pub fn into_saveframes(self) -> Vec<Saveframe> {
        self.saveframes.into_values().collect()
    }

    pub(crate) fn last_saveframe_mut(&mut self) -> Option<&mut Saveframe> {
        self.saveframes.last_mut().map(|(_, frame)| frame)
    }

    /// Opens a new, empty saveframe at the end of the entry.
    ///
    /// # Errors
    ///
    /// Fails if the name is empty, contains whitespace, or is already used.
    pub fn append_saveframe(&mut self, name: &str) -> Result<&mut Saveframe> {
        validate_name(name)?;
        match self.saveframes.entry(name.to_string()) {
            Slot::Occupied(_) => Err(duplicate(name)),
            Slot::Vacant(slot) => Ok(slot.insert(Saveframe::new(name))),
        }
    }

    /// Appends a complete saveframe.
    ///
    /// # Errors
    ///
    /// See [`Entry::append_saveframe`].
    pub fn add_saveframe(&mut self, frame: Saveframe) -> Result<()> {
        validate_name(frame.name())?;
        match self.saveframes.entry(frame.name().to_string()) {
            Slot::Occupied(_) => Err(duplicate(frame.name())),
            Slot::Vacant(slot) => {
                slot.insert(frame);
                Ok(())
            }
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || contains_whitespace(name) {
        return Err(Error::invalid_document(format!(
            "invalid saveframe name '{}'",
            name
        )));
    }
    Ok(())
}

fn duplicate(name: &str) -> Error {
    Error::invalid_document(format!("duplicate saveframe name '{}'", name))
}

impl FromStr for Entry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        crate::from_str(s)
    }
}
