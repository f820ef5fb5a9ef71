//! The columnar frame container.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{FrameError, Result};

use super::column::Column;
use super::value::Value;

/// An ordered collection of named columns of uniform length.
///
/// Row index is the identity of a record for the duration of one validation
/// pass; all columns share the same length, enforced at insertion time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Frame {
    columns: IndexMap<String, Column>,
}

impl Frame {
    /// Create an empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from `(name, column)` pairs, checking length uniformity.
    pub fn from_columns<N, C>(columns: impl IntoIterator<Item = (N, C)>) -> Result<Self>
    where
        N: Into<String>,
        C: Into<Column>,
    {
        let mut frame = Frame::new();
        for (name, column) in columns {
            frame.insert(name, column)?;
        }
        Ok(frame)
    }

    /// Insert a column. Fails if its length differs from the existing
    /// columns' row count.
    pub fn insert(&mut self, name: impl Into<String>, column: impl Into<Column>) -> Result<()> {
        let name = name.into();
        let column = column.into();
        if !self.columns.is_empty() && column.len() != self.row_count() {
            return Err(FrameError::ColumnLength {
                column: name,
                expected: self.row_count(),
                actual: column.len(),
            });
        }
        self.columns.insert(name, column);
        Ok(())
    }

    /// Replace an existing column with one of identical length.
    pub(crate) fn replace(&mut self, name: &str, column: Column) -> Result<()> {
        if column.len() != self.row_count() {
            return Err(FrameError::ColumnLength {
                column: name.to_string(),
                expected: self.row_count(),
                actual: column.len(),
            });
        }
        match self.columns.get_mut(name) {
            Some(slot) => {
                *slot = column;
                Ok(())
            }
            None => Err(FrameError::Schema(format!("unknown column '{name}'"))),
        }
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Whether a column with this name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Iterate `(name, column)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(name, col)| (name.as_str(), col))
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows. A frame with no columns has zero rows.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |(_, col)| col.len())
    }

    /// Whether the frame holds no rows.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// The cells of one row across the given columns, in the given order.
    ///
    /// Returns `None` if any named column is absent or `row` is out of
    /// bounds.
    pub fn row_values<'a>(&'a self, names: &[String], row: usize) -> Option<Vec<&'a Value>> {
        names
            .iter()
            .map(|name| self.columns.get(name).and_then(|col| col.get(row)))
            .collect()
    }
}
