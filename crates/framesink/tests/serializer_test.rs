//! Integration tests for the validate-then-save pipeline.

use std::fs::File;
use std::io::Write;
use std::sync::Arc;

use framesink::{
    ConflictPolicy, CsvOptions, FieldDescriptor, Frame, FrameError, FrameSerializer,
    MemoryAdapter, OverrideError, Schema, SerializerState, UniqueTogetherValidator, Value,
};
use tempfile::NamedTempFile;

/// The product schema used by most tests: a required id and name, an
/// optional nullable category.
fn product_schema() -> Arc<Schema> {
    Arc::new(
        Schema::builder("products")
            .field(FieldDescriptor::char("product_id"))
            .field(FieldDescriptor::char("name"))
            .field(
                FieldDescriptor::integer("category_id")
                    .required(false)
                    .allow_null(true),
            )
            .unique_key(["product_id"])
            .build()
            .expect("schema builds"),
    )
}

fn product_frame() -> Frame {
    Frame::from_columns([
        ("product_id", vec![Some("234556"), Some("456454")]),
        ("name", vec![Some("Coca-Cola"), Some("Pepsi")]),
        ("category_id", vec![None, Some("7")]),
    ])
    .expect("frame builds")
}

// =============================================================================
// Happy path
// =============================================================================

#[test]
fn test_valid_frame_has_empty_report() {
    let mut serializer = FrameSerializer::new(product_schema(), product_frame());
    assert!(serializer.is_valid().unwrap());
    assert!(serializer.errors().unwrap().is_empty());
    assert_eq!(serializer.state(), SerializerState::Valid);
}

#[test]
fn test_end_to_end_with_override_filling_nulls() {
    let schema = Arc::new(
        Schema::builder("products")
            .field(FieldDescriptor::char("product_id"))
            .field(FieldDescriptor::char("name"))
            .field(
                FieldDescriptor::integer("category_id")
                    .required(false)
                    .allow_null(true),
            )
            .unique_key(["product_id"])
            // nulls get the root category
            .validate_with("category_id", |column| Ok(column.fill_nulls(1i64)))
            .build()
            .unwrap(),
    );

    let mut serializer = FrameSerializer::new(schema, product_frame());
    assert!(serializer.is_valid().unwrap());

    let coerced = serializer.validated_frame().unwrap();
    assert_eq!(
        coerced.column("category_id").unwrap().cells(),
        &[Value::Int(1), Value::Int(7)]
    );

    let adapter = MemoryAdapter::new();
    let outcome = serializer.save(&adapter).unwrap();
    assert_eq!(outcome.rows_written, 2);
    assert_eq!(adapter.row_count("products"), 2);
}

// =============================================================================
// Error accumulation
// =============================================================================

#[test]
fn test_nulls_reported_per_row_only_where_null() {
    let schema = Arc::new(
        Schema::builder("t")
            .field(FieldDescriptor::char("name"))
            .build()
            .unwrap(),
    );
    let frame = Frame::from_columns([("name", vec![Some("a"), None, Some("b"), None])]).unwrap();

    let mut serializer = FrameSerializer::new(schema, frame);
    assert!(!serializer.is_valid().unwrap());

    let report = serializer.errors().unwrap();
    assert_eq!(report.row(1).unwrap()["name"], "name is required");
    assert_eq!(report.row(3).unwrap()["name"], "name is required");
    assert!(report.row(0).is_none());
    assert!(report.row(2).is_none());
}

#[test]
fn test_failures_in_different_columns_both_reported() {
    let schema = Arc::new(
        Schema::builder("t")
            .field(FieldDescriptor::integer("a"))
            .field(FieldDescriptor::boolean("b"))
            .build()
            .unwrap(),
    );
    // row 0 fails field a, row 1 fails field b
    let frame = Frame::from_columns([
        ("a", vec!["oops", "2"]),
        ("b", vec!["true", "oops"]),
    ])
    .unwrap();

    let mut serializer = FrameSerializer::new(schema, frame);
    assert!(!serializer.is_valid().unwrap());

    let report = serializer.errors().unwrap();
    assert_eq!(report.row(0).unwrap()["a"], "a is not a valid integer");
    assert_eq!(report.row(1).unwrap()["b"], "b is not a valid boolean");
}

#[test]
fn test_is_valid_is_idempotent() {
    let schema = Arc::new(
        Schema::builder("t")
            .field(FieldDescriptor::integer("a"))
            .build()
            .unwrap(),
    );
    let frame = Frame::from_columns([("a", vec!["1", "x"])]).unwrap();

    let mut serializer = FrameSerializer::new(schema, frame);
    assert!(!serializer.is_valid().unwrap());
    let first = serializer.errors().unwrap().clone();
    assert!(!serializer.is_valid().unwrap());
    let second = serializer.errors().unwrap().clone();
    assert_eq!(first, second);
}

#[test]
fn test_set_data_resets_state() {
    let schema = Arc::new(
        Schema::builder("t")
            .field(FieldDescriptor::integer("a"))
            .build()
            .unwrap(),
    );
    let mut serializer = FrameSerializer::new(
        schema,
        Frame::from_columns([("a", vec!["x"])]).unwrap(),
    );
    assert!(!serializer.is_valid().unwrap());

    serializer.set_data(Frame::from_columns([("a", vec!["1"])]).unwrap());
    assert_eq!(serializer.state(), SerializerState::Unvalidated);
    assert!(serializer.errors().is_err());
    assert!(serializer.is_valid().unwrap());
}

// =============================================================================
// Table validators
// =============================================================================

#[test]
fn test_unique_together_duplicate_rows() {
    let schema = Arc::new(
        Schema::builder("t")
            .field(FieldDescriptor::char("k"))
            .field(FieldDescriptor::char("v"))
            .table_validator(UniqueTogetherValidator::new(["k"]))
            .build()
            .unwrap(),
    );
    let frame = Frame::from_columns([
        ("k", vec!["dup", "dup"]),
        ("v", vec!["a", "b"]),
    ])
    .unwrap();

    let mut serializer = FrameSerializer::new(schema.clone(), frame);
    assert!(!serializer.is_valid().unwrap());

    let report = serializer.errors().unwrap();
    assert_eq!(report.table_errors().len(), 1);
    assert_eq!(report.table_errors()[0], "duplicate values for (k) at rows [0, 1]");
    assert!(report.rows().is_empty());

    // all-distinct keys pass
    let frame = Frame::from_columns([
        ("k", vec!["a", "b"]),
        ("v", vec!["a", "b"]),
    ])
    .unwrap();
    let mut serializer = FrameSerializer::new(schema, frame);
    assert!(serializer.is_valid().unwrap());
}

#[test]
fn test_table_validators_skipped_when_field_errors_exist() {
    let schema = Arc::new(
        Schema::builder("t")
            .field(FieldDescriptor::integer("k"))
            .table_validator(UniqueTogetherValidator::new(["k"]))
            .build()
            .unwrap(),
    );
    // duplicate keys AND a coercion failure: only the field error reports,
    // since coerced values would be unreliable
    let frame = Frame::from_columns([("k", vec!["1", "1", "x"])]).unwrap();

    let mut serializer = FrameSerializer::new(schema, frame);
    assert!(!serializer.is_valid().unwrap());

    let report = serializer.errors().unwrap();
    assert!(report.table_errors().is_empty());
    assert_eq!(report.row(2).unwrap()["k"], "k is not a valid integer");
}

// =============================================================================
// Override hooks
// =============================================================================

#[test]
fn test_override_failure_marks_rows_invalid() {
    let schema = Arc::new(
        Schema::builder("t")
            .field(FieldDescriptor::integer("n").allow_null(true))
            .validate_with("n", |column| {
                let negative: Vec<usize> = column
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| matches!(v, Value::Int(i) if *i < 0))
                    .map(|(row, _)| row)
                    .collect();
                if negative.is_empty() {
                    Ok(column)
                } else {
                    Err(OverrideError::new("n must not be negative").with_rows(negative))
                }
            })
            .build()
            .unwrap(),
    );
    let frame = Frame::from_columns([("n", vec!["1", "-2", "3"])]).unwrap();

    let mut serializer = FrameSerializer::new(schema, frame);
    assert!(!serializer.is_valid().unwrap());

    let report = serializer.errors().unwrap();
    assert_eq!(report.row(1).unwrap()["n"], "n must not be negative");
    assert!(report.row(0).is_none());
    assert!(serializer.validated_frame().is_err());
}

#[test]
fn test_override_skipped_when_field_already_failed() {
    let schema = Arc::new(
        Schema::builder("t")
            .field(FieldDescriptor::integer("n"))
            .validate_with("n", |_| {
                panic!("override must not run when field validation failed")
            })
            .build()
            .unwrap(),
    );
    let frame = Frame::from_columns([("n", vec!["nope"])]).unwrap();

    let mut serializer = FrameSerializer::new(schema, frame);
    assert!(!serializer.is_valid().unwrap());
}

// =============================================================================
// State discipline
// =============================================================================

#[test]
fn test_errors_before_validation_is_state_misuse() {
    let serializer = FrameSerializer::new(product_schema(), product_frame());
    assert!(matches!(serializer.errors(), Err(FrameError::State(_))));
    assert!(matches!(
        serializer.validated_frame(),
        Err(FrameError::State(_))
    ));
}

#[test]
fn test_save_unvalidated_performs_no_persistence() {
    let adapter = MemoryAdapter::new();
    let serializer = FrameSerializer::new(product_schema(), product_frame());
    assert!(matches!(
        serializer.save(&adapter),
        Err(FrameError::State(_))
    ));
    assert_eq!(adapter.row_count("products"), 0);
}

#[test]
fn test_save_invalid_performs_no_persistence() {
    let adapter = MemoryAdapter::new();
    let schema = Arc::new(
        Schema::builder("t")
            .field(FieldDescriptor::integer("a"))
            .build()
            .unwrap(),
    );
    let mut serializer =
        FrameSerializer::new(schema, Frame::from_columns([("a", vec!["x"])]).unwrap());
    assert!(!serializer.is_valid().unwrap());
    assert!(matches!(
        serializer.save(&adapter),
        Err(FrameError::State(_))
    ));
    assert_eq!(adapter.row_count("t"), 0);
}

// =============================================================================
// Schema errors
// =============================================================================

#[test]
fn test_missing_required_column_is_fatal() {
    let schema = Arc::new(
        Schema::builder("t")
            .field(FieldDescriptor::char("present"))
            .field(FieldDescriptor::char("absent"))
            .build()
            .unwrap(),
    );
    let frame = Frame::from_columns([("present", vec!["x"])]).unwrap();

    let mut serializer = FrameSerializer::new(schema, frame);
    let err = serializer.is_valid().unwrap_err();
    assert!(matches!(err, FrameError::Schema(_)));
    // fatal path produces no partial report
    assert!(serializer.errors().is_err());
}

#[test]
fn test_source_rename() {
    let schema = Arc::new(
        Schema::builder("t")
            .field(FieldDescriptor::char("name").source("product_name"))
            .build()
            .unwrap(),
    );
    let frame = Frame::from_columns([("product_name", vec!["Coca-Cola"])]).unwrap();

    let mut serializer = FrameSerializer::new(schema, frame);
    assert!(serializer.is_valid().unwrap());
    let coerced = serializer.validated_frame().unwrap();
    assert!(coerced.has_column("name"));
    assert!(!coerced.has_column("product_name"));
}

// =============================================================================
// Conflict policies through the serializer
// =============================================================================

#[test]
fn test_insert_only_conflict_surfaces_as_persistence_error() {
    let adapter = MemoryAdapter::new();

    let mut serializer = FrameSerializer::new(product_schema(), product_frame());
    assert!(serializer.is_valid().unwrap());
    serializer.save(&adapter).unwrap();

    // same keys again: the store's conflict is not a validation error
    let mut serializer = FrameSerializer::new(product_schema(), product_frame());
    assert!(serializer.is_valid().unwrap());
    assert!(matches!(
        serializer.save(&adapter),
        Err(FrameError::Persistence(_))
    ));
    assert_eq!(adapter.row_count("products"), 2);
}

// =============================================================================
// CSV ingestion end to end
// =============================================================================

#[test]
fn test_csv_file_through_pipeline() {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(b"product_id,name,category_id\n234556,Coca-Cola,\n456454,Pepsi,7\n")
        .expect("write csv");

    let reader = File::open(file.path()).expect("reopen");
    let frame = Frame::from_csv(reader, CsvOptions::default()).unwrap();

    let mut serializer = FrameSerializer::new(product_schema(), frame);
    assert!(serializer.is_valid().unwrap());

    let coerced = serializer.validated_frame().unwrap();
    assert_eq!(
        coerced.column("category_id").unwrap().cells(),
        &[Value::Null, Value::Int(7)]
    );
}

#[test]
fn test_upsert_replaces_matched_rows() {
    let adapter = MemoryAdapter::new();
    let upsert_schema = Arc::new(
        Schema::builder("products")
            .field(FieldDescriptor::char("product_id"))
            .field(FieldDescriptor::char("name"))
            .unique_key(["product_id"])
            .on_conflict(ConflictPolicy::Upsert)
            .build()
            .unwrap(),
    );

    let first = Frame::from_columns([
        ("product_id", vec!["1", "2"]),
        ("name", vec!["old", "kept"]),
    ])
    .unwrap();
    let mut serializer = FrameSerializer::new(upsert_schema.clone(), first);
    assert!(serializer.is_valid().unwrap());
    serializer.save(&adapter).unwrap();

    let second = Frame::from_columns([
        ("product_id", vec!["1"]),
        ("name", vec!["updated"]),
    ])
    .unwrap();
    let mut serializer = FrameSerializer::new(upsert_schema, second);
    assert!(serializer.is_valid().unwrap());
    serializer.save(&adapter).unwrap();

    assert_eq!(adapter.row_count("products"), 2);
    let rows = adapter.rows("products");
    assert_eq!(rows[0]["name"], Value::Str("updated".to_string()));
}
