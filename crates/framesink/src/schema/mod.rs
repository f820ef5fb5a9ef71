//! Schema declaration: ordered field descriptors, table validators,
//! override hooks and the persistence target.

mod field;
mod types;

use std::collections::{HashMap, HashSet};

use crate::error::{FrameError, Result};
use crate::frame::Column;
use crate::persist::ConflictPolicy;
use crate::validation::columns::coerce_cell;
use crate::validation::TableValidator;

pub use field::FieldDescriptor;
pub use types::FieldKind;

/// Failure signaled by an override hook.
///
/// The message lands in the error report under the hook's field: per-row
/// when row indices are given, as a field-prefixed table-level message
/// otherwise.
#[derive(Debug, Clone)]
pub struct OverrideError {
    message: String,
    rows: Vec<usize>,
}

impl OverrideError {
    /// A failure covering the whole column.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            rows: Vec::new(),
        }
    }

    /// Restrict the failure to specific rows.
    pub fn with_rows(mut self, rows: impl IntoIterator<Item = usize>) -> Self {
        self.rows = rows.into_iter().collect();
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn rows(&self) -> &[usize] {
        &self.rows
    }
}

/// A per-field override hook: receives the full coerced column, returns a
/// column of the same length or signals a validation failure.
pub type OverrideFn = dyn Fn(Column) -> std::result::Result<Column, OverrideError> + Send + Sync;

/// An immutable, shareable schema declaration.
///
/// Built once through [`Schema::builder`]; read-only afterwards and safe to
/// share across serializer instances (wrap in `Arc`).
pub struct Schema {
    target: String,
    fields: Vec<FieldDescriptor>,
    unique_key: Vec<String>,
    validators: Vec<Box<dyn TableValidator>>,
    overrides: HashMap<String, Box<OverrideFn>>,
    policy: ConflictPolicy,
}

impl Schema {
    /// Start declaring a schema that persists into `target`.
    pub fn builder(target: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            target: target.into(),
            fields: Vec::new(),
            unique_key: Vec::new(),
            validators: Vec::new(),
            overrides: HashMap::new(),
            policy: ConflictPolicy::InsertOnly,
        }
    }

    /// The persistence target identifier (e.g. a table name).
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field by output name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// The declared unique key, empty when none was declared.
    pub fn unique_key(&self) -> &[String] {
        &self.unique_key
    }

    /// The conflict policy handed to the persistence adapter.
    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.policy
    }

    pub(crate) fn validators(&self) -> &[Box<dyn TableValidator>] {
        &self.validators
    }

    pub(crate) fn override_for(&self, field: &str) -> Option<&OverrideFn> {
        self.overrides.get(field).map(Box::as_ref)
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("target", &self.target)
            .field("fields", &self.fields)
            .field("unique_key", &self.unique_key)
            .field("validators", &self.validators.len())
            .field("overrides", &self.overrides.len())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Builder for [`Schema`]. Declaration mistakes surface from
/// [`build`](SchemaBuilder::build) as schema errors, before any data is
/// seen.
pub struct SchemaBuilder {
    target: String,
    fields: Vec<FieldDescriptor>,
    unique_key: Vec<String>,
    validators: Vec<Box<dyn TableValidator>>,
    overrides: HashMap<String, Box<OverrideFn>>,
    policy: ConflictPolicy,
}

impl SchemaBuilder {
    /// Declare the next field. Declaration order is validation and output
    /// order.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare the unique key used for conflict resolution at the store.
    pub fn unique_key<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique_key = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Register a table-level validator. Registration order is execution
    /// order.
    pub fn table_validator(mut self, validator: impl TableValidator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Attach an override hook to a declared field. The hook runs only
    /// after every field validated cleanly and receives the full coerced
    /// column.
    pub fn validate_with<F>(mut self, field: impl Into<String>, hook: F) -> Self
    where
        F: Fn(Column) -> std::result::Result<Column, OverrideError> + Send + Sync + 'static,
    {
        self.overrides.insert(field.into(), Box::new(hook));
        self
    }

    /// Choose what the adapter should do when a row's key already exists.
    pub fn on_conflict(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Check the declaration and produce the immutable schema.
    pub fn build(self) -> Result<Schema> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name().to_string()) {
                return Err(FrameError::Schema(format!(
                    "field '{}' is declared twice",
                    field.name()
                )));
            }
            check_field(field)?;
        }

        for key_field in &self.unique_key {
            require_declared_and_required(&self.fields, key_field, "unique key")?;
        }

        for validator in &self.validators {
            for referenced in validator.referenced_fields() {
                require_declared_and_required(&self.fields, referenced, "table validator")?;
            }
        }

        for name in self.overrides.keys() {
            if !self.fields.iter().any(|f| f.name() == name) {
                return Err(FrameError::Schema(format!(
                    "override hook references undeclared field '{name}'"
                )));
            }
        }

        Ok(Schema {
            target: self.target,
            fields: self.fields,
            unique_key: self.unique_key,
            validators: self.validators,
            overrides: self.overrides,
            policy: self.policy,
        })
    }
}

fn check_field(field: &FieldDescriptor) -> Result<()> {
    let kind = field.kind();

    if let Some(default) = field.default() {
        if coerce_cell(field, default).is_none() {
            return Err(FrameError::Schema(format!(
                "default for '{}' is not a valid {}",
                field.name(),
                kind.label()
            )));
        }
    }

    let has_bounds = field.min_value_limit().is_some() || field.max_value_limit().is_some();
    if has_bounds && !kind.is_numeric() {
        return Err(FrameError::Schema(format!(
            "numeric bounds on non-numeric field '{}'",
            field.name()
        )));
    }

    let has_length = field.min_length_limit().is_some() || field.max_length_limit().is_some();
    if has_length && !matches!(kind, FieldKind::Char | FieldKind::List) {
        return Err(FrameError::Schema(format!(
            "length constraints on field '{}' require a char or list type",
            field.name()
        )));
    }

    if field.pattern_regex().is_some() && kind != FieldKind::Char {
        return Err(FrameError::Schema(format!(
            "pattern constraint on non-char field '{}'",
            field.name()
        )));
    }

    Ok(())
}

fn require_declared_and_required(
    fields: &[FieldDescriptor],
    name: &str,
    context: &str,
) -> Result<()> {
    match fields.iter().find(|f| f.name() == name) {
        None => Err(FrameError::Schema(format!(
            "{context} references undeclared field '{name}'"
        ))),
        Some(field) if !field.is_required() => Err(FrameError::Schema(format!(
            "{context} references optional field '{name}'; cross-row checks need the column present in every batch"
        ))),
        Some(_) => Ok(()),
    }
}
