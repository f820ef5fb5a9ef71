//! Logical field types.

use serde::{Deserialize, Serialize};

/// Declared logical type for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Text values.
    Char,
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Float,
    /// Boolean values.
    Boolean,
    /// Date without a time component.
    Date,
    /// Date and time.
    DateTime,
    /// Per-cell lists of values.
    List,
}

impl FieldKind {
    /// Label used in error messages ("<field> is not a valid <label>").
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Char => "string",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::DateTime => "datetime",
            FieldKind::List => "list",
        }
    }

    /// Returns true for integer and float fields.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::Float)
    }

    /// Returns true for date and datetime fields.
    pub fn is_temporal(&self) -> bool {
        matches!(self, FieldKind::Date | FieldKind::DateTime)
    }
}
