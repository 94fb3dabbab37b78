//! Loops: tabular tag/row blocks inside a saveframe.
//!
//! A loop has an ordered list of tag names, which are its columns, and
//! rectangular data. All dotted tags share one category, and every row
//! holds exactly one value per tag.
//!
//! ## Examples
//!
//! ```rust
//! use nmrstar::Loop;
//!
//! let mut atoms = Loop::new();
//! atoms.append_tag("_Atom.ID").unwrap();
//! atoms.append_tag("Name").unwrap();
//! atoms.set_rows(["1", "CA", "2", "CB"]).unwrap();
//!
//! assert_eq!(atoms.category(), Some("_Atom"));
//! assert_eq!(atoms.tags(), ["_Atom.ID", "_Atom.Name"]);
//! assert_eq!(atoms.rows()[1], ["2", "CB"]);
//! ```

use crate::syntax::{contains_whitespace, qualify, split_tag};
use crate::{Error, Result};
use serde::Serialize;
use std::str::FromStr;

/// A tabular block of tag columns and value rows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Loop {
    category: Option<String>,
    tags: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Loop {
    /// Creates a loop with no tags and no data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared tag category, such as `_Atom`.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Returns the full tag names in column order.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the column index of a tag, ignoring case.
    ///
    /// Accepts a full name or, when the loop has a category, a short one.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        let full = self.full_name(name).ok()?;
        self.tags.iter().position(|tag| tag.eq_ignore_ascii_case(&full))
    }

    /// Returns every value of one column.
    #[must_use]
    pub fn column_values(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column(name)?;
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    fn full_name(&self, name: &str) -> Result<String> {
        if name.starts_with('_') {
            return Ok(name.to_string());
        }
        match &self.category {
            Some(category) => Ok(qualify(Some(category), name)),
            None => Err(Error::invalid_document(format!(
                "loop tag '{}' has no category and the loop has none to inherit",
                name
            ))),
        }
    }

    /// Appends a column.
    ///
    /// The first dotted tag fixes the loop category; later tags must share
    /// it. Tags can only be added while the loop holds no data.
    ///
    /// # Errors
    ///
    /// Fails for empty names, names containing whitespace or more than one
    /// `.`, a category mismatch, a duplicate tag, or a loop that already
    /// holds data.
    pub fn append_tag(&mut self, name: &str) -> Result<()> {
        if !self.rows.is_empty() {
            return Err(Error::invalid_document(format!(
                "cannot add tag '{}' to a loop that already holds data",
                name
            )));
        }
        if name.is_empty() || contains_whitespace(name) {
            return Err(Error::invalid_document(format!(
                "invalid loop tag name '{}'",
                name
            )));
        }
        let full = self.full_name(name)?;
        if full.matches('.').count() > 1 {
            return Err(Error::invalid_document(format!(
                "loop tag '{}' contains more than one '.'",
                full
            )));
        }

        let category = split_tag(&full).0.map(str::to_string);
        match (&self.category, &category) {
            (Some(existing), Some(new)) if !existing.eq_ignore_ascii_case(new) => {
                return Err(Error::invalid_document(format!(
                    "loop tag '{}' does not match the loop category '{}'",
                    full, existing
                )));
            }
            (None, Some(new)) if !self.tags.is_empty() => {
                return Err(Error::invalid_document(format!(
                    "loop tag '{}' has category '{}' but earlier tags have none",
                    full, new
                )));
            }
            (Some(existing), None) => {
                return Err(Error::invalid_document(format!(
                    "loop tag '{}' is missing the loop category '{}'",
                    full, existing
                )));
            }
            _ => {}
        }
        if self.tags.is_empty() {
            self.category = category;
        }

        if self.tags.iter().any(|tag| tag.eq_ignore_ascii_case(&full)) {
            return Err(Error::invalid_document(format!(
                "duplicate loop tag '{}'",
                full
            )));
        }
        self.tags.push(full);
        Ok(())
    }

    /// Replaces the data with a flat, row-major list of values.
    ///
    /// # Errors
    ///
    /// Fails if the loop has no tags but values are given, or if the number
    /// of values is not a multiple of the tag count.
    pub fn set_rows<I, S>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let width = self.tags.len();
        if width == 0 {
            if values.is_empty() {
                self.rows.clear();
                return Ok(());
            }
            return Err(Error::invalid_document("loop data found before loop tags"));
        }
        if values.len() % width != 0 {
            return Err(Error::invalid_document(format!(
                "ragged loop data: {} values do not fill rows of {} tags",
                values.len(),
                width
            )));
        }
        let mut values = values.into_iter();
        self.rows = (0..values.len() / width)
            .map(|_| values.by_ref().take(width).collect())
            .collect();
        Ok(())
    }

    /// Appends one row.
    ///
    /// # Errors
    ///
    /// Fails if the row width differs from the tag count.
    pub fn add_row<I, S>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row: Vec<String> = row.into_iter().map(Into::into).collect();
        if self.tags.is_empty() || row.len() != self.tags.len() {
            return Err(Error::invalid_document(format!(
                "row of {} values does not match {} loop tags",
                row.len(),
                self.tags.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Overwrites a single cell.
    ///
    /// # Errors
    ///
    /// Fails if the cell is out of range.
    pub fn set_value(&mut self, row: usize, column: usize, value: impl Into<String>) -> Result<()> {
        let cell = self
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(column))
            .ok_or_else(|| {
                Error::invalid_document(format!("no loop cell at row {}, column {}", row, column))
            })?;
        *cell = value.into();
        Ok(())
    }
}

impl FromStr for Loop {
    type Err = Error;

    /// Parses a bare `loop_` … `stop_` block with default options.
    fn from_str(s: &str) -> Result<Self> {
        crate::de::parse_loop(s, &crate::ParseOptions::default())
    }
}
