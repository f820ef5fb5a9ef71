//! Table-level validators, run after every field has validated cleanly.

use indexmap::IndexMap;

use crate::frame::Frame;

/// A stateless check spanning multiple rows or columns of the coerced
/// frame.
///
/// Validators run in registration order and must not mutate the frame; each
/// returned message becomes one table-level entry in the
/// [`ErrorReport`](super::ErrorReport).
pub trait TableValidator: Send + Sync {
    /// Run the check and return zero or more table-level error messages.
    fn validate(&self, frame: &Frame) -> Vec<String>;

    /// Field names this validator reads. Checked against the schema at
    /// build time so a validator can never reference an undeclared field.
    fn referenced_fields(&self) -> &[String] {
        &[]
    }
}

/// Rejects batches in which two or more rows share the same tuple of values
/// across a set of fields.
///
/// Uniqueness is checked within the submitted frame only; enforcing it
/// against previously persisted rows is the storage layer's constraint and
/// an independent line of defense.
pub struct UniqueTogetherValidator {
    fields: Vec<String>,
}

impl UniqueTogetherValidator {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl TableValidator for UniqueTogetherValidator {
    fn validate(&self, frame: &Frame) -> Vec<String> {
        // first-occurrence order keeps messages deterministic
        let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
        for row in 0..frame.row_count() {
            let Some(values) = frame.row_values(&self.fields, row) else {
                continue;
            };
            let key = values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join("\u{1f}");
            groups.entry(key).or_default().push(row);
        }

        groups
            .into_iter()
            .filter(|(_, rows)| rows.len() > 1)
            .map(|(_, rows)| {
                format!(
                    "duplicate values for ({}) at rows {:?}",
                    self.fields.join(", "),
                    rows
                )
            })
            .collect()
    }

    fn referenced_fields(&self) -> &[String] {
        &self.fields
    }
}
