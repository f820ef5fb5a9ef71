//! The validation-and-persistence orchestrator.

use std::sync::Arc;

use crate::error::{FrameError, Result};
use crate::frame::{Column, Frame};
use crate::persist::{PersistOutcome, PersistRequest, PersistenceAdapter};
use crate::schema::Schema;
use crate::validation::columns::validate_column;
use crate::validation::ErrorReport;

/// Lifecycle state of one serializer.
///
/// A fresh serializer is `Unvalidated`; `is_valid` moves it to `Valid` or
/// `Invalid`; assigning new data resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializerState {
    Unvalidated,
    Valid,
    Invalid,
}

/// Validates one frame against a shared schema and hands the coerced result
/// to a persistence adapter.
///
/// ```
/// use std::sync::Arc;
/// use framesink::{
///     FieldDescriptor, Frame, FrameSerializer, MemoryAdapter, Schema,
///     UniqueTogetherValidator,
/// };
///
/// # fn main() -> framesink::Result<()> {
/// let schema = Arc::new(
///     Schema::builder("products")
///         .field(FieldDescriptor::char("product_id").max_length(6))
///         .field(FieldDescriptor::char("name"))
///         .field(
///             FieldDescriptor::integer("category_id")
///                 .required(false)
///                 .allow_null(true),
///         )
///         .unique_key(["product_id"])
///         .table_validator(UniqueTogetherValidator::new(["product_id"]))
///         .build()?,
/// );
///
/// let frame = Frame::from_columns([
///     ("product_id", vec!["234556", "456454"]),
///     ("name", vec!["Coca-Cola", "Pepsi"]),
/// ])?;
///
/// let adapter = MemoryAdapter::new();
/// let mut serializer = FrameSerializer::new(schema, frame);
/// if serializer.is_valid()? {
///     let outcome = serializer.save(&adapter)?;
///     assert_eq!(outcome.rows_written, 2);
/// } else {
///     eprintln!("{}", serde_json::to_string(serializer.errors()?).unwrap());
/// }
/// # Ok(())
/// # }
/// ```
pub struct FrameSerializer {
    schema: Arc<Schema>,
    data: Frame,
    state: SerializerState,
    report: Option<ErrorReport>,
    validated: Option<Frame>,
}

impl FrameSerializer {
    /// Create a serializer over one input frame.
    pub fn new(schema: Arc<Schema>, data: Frame) -> Self {
        Self {
            schema,
            data,
            state: SerializerState::Unvalidated,
            report: None,
            validated: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SerializerState {
        self.state
    }

    /// Assign a new input frame, discarding any previous validation result.
    pub fn set_data(&mut self, data: Frame) {
        self.data = data;
        self.state = SerializerState::Unvalidated;
        self.report = None;
        self.validated = None;
    }

    /// Validate the frame against the schema.
    ///
    /// Every declared field validates in declaration order and all field
    /// errors are collected: a failure in one field never suppresses the
    /// others. Override hooks and table validators run only once every
    /// field has passed. Returns `true` iff the resulting report is empty.
    ///
    /// Repeated calls are idempotent: the report is rebuilt from scratch
    /// each time. Errors are raised only for schema misuse (missing
    /// required source column, malformed declarations), never for data
    /// quality.
    pub fn is_valid(&mut self) -> Result<bool> {
        tracing::debug!(
            "validating frame: {} rows, {} fields against '{}'",
            self.data.row_count(),
            self.schema.fields().len(),
            self.schema.target()
        );

        // discard any previous pass up front so a fatal schema error cannot
        // leave a stale report behind
        self.state = SerializerState::Unvalidated;
        self.report = None;
        self.validated = None;

        let mut report = ErrorReport::new();
        let mut coerced = Frame::new();

        for field in self.schema.fields() {
            match self.data.column(field.source_name()) {
                Some(column) => {
                    let outcome = validate_column(field, column);
                    report.merge_field(field.name(), outcome.errors);
                    if let Some(column) = outcome.column {
                        coerced.insert(field.name(), column)?;
                    }
                }
                None if field.is_required() => {
                    return Err(FrameError::Schema(format!(
                        "required column '{}' is missing from the input frame",
                        field.source_name()
                    )));
                }
                None => {
                    // optional and absent: materialize the default if one
                    // was declared, otherwise leave the field out entirely
                    if let Some(default) = field.default() {
                        coerced.insert(
                            field.name(),
                            Column::filled(default.clone(), self.data.row_count()),
                        )?;
                    }
                }
            }
        }

        if report.is_empty() {
            self.run_overrides(&mut coerced, &mut report)?;
        }

        if report.is_empty() {
            for validator in self.schema.validators() {
                for message in validator.validate(&coerced) {
                    report.insert_table(message);
                }
            }
        }

        let valid = report.is_empty();
        if !valid {
            tracing::debug!(
                "validation failed: {} cell errors, {} table errors",
                report.cell_error_count(),
                report.table_errors().len()
            );
        }

        self.report = Some(report);
        self.validated = valid.then_some(coerced);
        self.state = if valid {
            SerializerState::Valid
        } else {
            SerializerState::Invalid
        };
        Ok(valid)
    }

    fn run_overrides(&self, coerced: &mut Frame, report: &mut ErrorReport) -> Result<()> {
        for field in self.schema.fields() {
            let Some(hook) = self.schema.override_for(field.name()) else {
                continue;
            };
            let Some(column) = coerced.column(field.name()) else {
                continue;
            };
            match hook(column.clone()) {
                Ok(transformed) => {
                    if transformed.len() != coerced.row_count() {
                        return Err(FrameError::Schema(format!(
                            "override for '{}' returned {} rows, expected {}",
                            field.name(),
                            transformed.len(),
                            coerced.row_count()
                        )));
                    }
                    coerced.replace(field.name(), transformed)?;
                }
                Err(violation) => {
                    if violation.rows().is_empty() {
                        report.insert_table(format!(
                            "{}: {}",
                            field.name(),
                            violation.message()
                        ));
                    } else {
                        for &row in violation.rows() {
                            report.insert_cell(row, field.name(), violation.message());
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// The error report from the last validation.
    ///
    /// Calling this before `is_valid` is programmer misuse and fails with a
    /// state error.
    pub fn errors(&self) -> Result<&ErrorReport> {
        self.report.as_ref().ok_or_else(|| {
            FrameError::State(
                "you must call `is_valid()` before accessing `errors()`".to_string(),
            )
        })
    }

    /// The coerced frame from a successful validation.
    pub fn validated_frame(&self) -> Result<&Frame> {
        match self.state {
            SerializerState::Unvalidated => Err(FrameError::State(
                "you must call `is_valid()` before accessing `validated_frame()`".to_string(),
            )),
            SerializerState::Invalid => Err(FrameError::State(
                "cannot access `validated_frame()` on an invalid serializer".to_string(),
            )),
            SerializerState::Valid => self.validated.as_ref().ok_or_else(|| {
                FrameError::State(
                    "validated frame unavailable; serializer state is inconsistent".to_string(),
                )
            }),
        }
    }

    /// Persist the coerced frame through the adapter.
    ///
    /// Fails with a state error (performing no persistence call) unless
    /// the serializer is `Valid`. Exactly one persist call is issued; the
    /// adapter owns atomicity and its failures surface unchanged.
    pub fn save(&self, adapter: &dyn PersistenceAdapter) -> Result<PersistOutcome> {
        if self.state != SerializerState::Valid {
            return Err(FrameError::State(
                "you must call `is_valid()` and validation must succeed before `save()`"
                    .to_string(),
            ));
        }
        let frame = self.validated_frame()?;

        let outcome = adapter.persist(PersistRequest {
            frame,
            target: self.schema.target(),
            unique_key: self.schema.unique_key(),
            policy: self.schema.conflict_policy(),
        })?;
        tracing::debug!(
            "persisted {} rows into '{}'",
            outcome.rows_written,
            self.schema.target()
        );
        Ok(outcome)
    }
}
