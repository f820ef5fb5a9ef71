//! Structured accumulation of validation failures.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;

/// A structured record of everything that failed in one validation pass.
///
/// Row-level failures map row index → field name → message; table-level
/// failures (e.g. uniqueness violations) are a flat message list. An empty
/// report is equivalent to "valid". Serializes to a plain nested mapping:
///
/// ```json
/// {
///   "rows": { "0": { "category_id": "category_id is required" } },
///   "table": ["duplicate values for (product_id) at rows [1, 3]"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorReport {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    rows: BTreeMap<usize, IndexMap<String, String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    table: Vec<String>,
}

impl ErrorReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no failure of any kind was recorded.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.table.is_empty()
    }

    /// Record a failure for one cell.
    pub fn insert_cell(&mut self, row: usize, field: impl Into<String>, message: impl Into<String>) {
        self.rows
            .entry(row)
            .or_default()
            .insert(field.into(), message.into());
    }

    /// Record a table-level failure.
    pub fn insert_table(&mut self, message: impl Into<String>) {
        self.table.push(message.into());
    }

    /// Merge one field's row-indexed errors.
    pub(crate) fn merge_field(&mut self, field: &str, errors: BTreeMap<usize, String>) {
        for (row, message) in errors {
            self.insert_cell(row, field, message);
        }
    }

    /// The failures recorded for one row.
    pub fn row(&self, row: usize) -> Option<&IndexMap<String, String>> {
        self.rows.get(&row)
    }

    /// All row-level failures, ordered by row index.
    pub fn rows(&self) -> &BTreeMap<usize, IndexMap<String, String>> {
        &self.rows
    }

    /// All table-level failures, in registration order.
    pub fn table_errors(&self) -> &[String] {
        &self.table
    }

    /// Total number of recorded cell failures.
    pub fn cell_error_count(&self) -> usize {
        self.rows.values().map(IndexMap::len).sum()
    }
}
