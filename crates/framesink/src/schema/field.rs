//! Declarative field descriptors.

use regex::Regex;

use crate::frame::Value;

use super::types::FieldKind;

/// Declares the expected logical type, constraints and nullability policy
/// for one column.
///
/// Descriptors are built once at schema-declaration time and are immutable
/// afterwards. Each constructor fixes the logical type; the remaining
/// methods refine the contract:
///
/// ```
/// use framesink::FieldDescriptor;
///
/// let field = FieldDescriptor::integer("category_id")
///     .required(false)
///     .allow_null(true)
///     .min_value(1.0);
/// assert_eq!(field.name(), "category_id");
/// ```
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    name: String,
    kind: FieldKind,
    source: Option<String>,
    required: bool,
    allow_null: bool,
    default: Option<Value>,
    max_length: Option<usize>,
    min_length: Option<usize>,
    min_value: Option<f64>,
    max_value: Option<f64>,
    allow_blank: bool,
    trim_whitespace: bool,
    format: Option<String>,
    pattern: Option<Regex>,
    element: Option<FieldKind>,
}

impl FieldDescriptor {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            source: None,
            required: true,
            allow_null: false,
            default: None,
            max_length: None,
            min_length: None,
            min_value: None,
            max_value: None,
            allow_blank: false,
            trim_whitespace: true,
            format: None,
            pattern: None,
            element: None,
        }
    }

    /// A text field. Whitespace is trimmed and blank cells rejected unless
    /// configured otherwise.
    pub fn char(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Char)
    }

    /// A whole-number field.
    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    /// A floating-point field.
    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    /// A boolean field.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    /// A date field. `format` uses chrono's strftime syntax and is
    /// mandatory: dates are never guessed.
    pub fn date(name: impl Into<String>, format: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldKind::Date);
        field.format = Some(format.into());
        field
    }

    /// A datetime field with a mandatory chrono format.
    pub fn datetime(name: impl Into<String>, format: impl Into<String>) -> Self {
        let mut field = Self::new(name, FieldKind::DateTime);
        field.format = Some(format.into());
        field
    }

    /// A list field whose elements are coerced to `element`.
    pub fn list(name: impl Into<String>, element: FieldKind) -> Self {
        let mut field = Self::new(name, FieldKind::List);
        field.element = Some(element);
        field
    }

    /// Read the column under a different name in the input frame.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Whether the source column must be present (default `true`).
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Whether null cells are acceptable (default `false`).
    pub fn allow_null(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }

    /// Value applied to null or missing cells. Takes precedence over
    /// `allow_null`. Must coerce to the field's logical type; checked when
    /// the schema is built.
    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Maximum number of characters (char) or elements (list).
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Minimum number of characters (char) or elements (list).
    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    /// Lower bound for numeric fields, inclusive.
    pub fn min_value(mut self, min_value: f64) -> Self {
        self.min_value = Some(min_value);
        self
    }

    /// Upper bound for numeric fields, inclusive.
    pub fn max_value(mut self, max_value: f64) -> Self {
        self.max_value = Some(max_value);
        self
    }

    /// Accept empty strings in char fields (default `false`).
    pub fn allow_blank(mut self, allow_blank: bool) -> Self {
        self.allow_blank = allow_blank;
        self
    }

    /// Trim surrounding whitespace in char fields (default `true`).
    pub fn trim_whitespace(mut self, trim_whitespace: bool) -> Self {
        self.trim_whitespace = trim_whitespace;
        self
    }

    /// Require char values to match a pattern.
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Declared output name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Logical type.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Column name looked up in the input frame; defaults to the declared
    /// name.
    pub fn source_name(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn nulls_allowed(&self) -> bool {
        self.allow_null
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub(crate) fn max_length_limit(&self) -> Option<usize> {
        self.max_length
    }

    pub(crate) fn min_length_limit(&self) -> Option<usize> {
        self.min_length
    }

    pub(crate) fn min_value_limit(&self) -> Option<f64> {
        self.min_value
    }

    pub(crate) fn max_value_limit(&self) -> Option<f64> {
        self.max_value
    }

    pub(crate) fn blanks_allowed(&self) -> bool {
        self.allow_blank
    }

    pub(crate) fn trims_whitespace(&self) -> bool {
        self.trim_whitespace
    }

    pub(crate) fn format_str(&self) -> Option<&str> {
        self.format.as_deref()
    }

    pub(crate) fn pattern_regex(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    pub(crate) fn element_kind(&self) -> Option<FieldKind> {
        self.element
    }
}
