//! Postgres statement rendering for bulk writes.
//!
//! Statement building only: connection management and execution stay with
//! the caller, so the storage backend itself remains an external
//! collaborator. Two paths are offered, matching the two ways Postgres
//! ingests bulk data: a single multi-row `INSERT` (with an `ON CONFLICT`
//! clause under upsert) and a `COPY ... FROM STDIN` pair of statement and
//! CSV payload.

use crate::error::{FrameError, Result};
use crate::frame::{Frame, Value};

use super::ConflictPolicy;

/// Render a multi-row `INSERT` statement for the frame.
///
/// Under [`ConflictPolicy::Upsert`] an `ON CONFLICT (key) DO UPDATE`
/// clause updates every non-key column from `EXCLUDED`; with no non-key
/// columns it degrades to `DO NOTHING`. Under
/// [`ConflictPolicy::InsertOnly`] no conflict clause is emitted; the
/// store's own unique constraint raises, and the caller surfaces that as a
/// persistence error.
pub fn insert_statement(
    frame: &Frame,
    target: &str,
    unique_key: &[String],
    policy: ConflictPolicy,
) -> Result<String> {
    if frame.column_count() == 0 {
        return Err(FrameError::Persistence(
            "cannot render an insert for a frame with no columns".to_string(),
        ));
    }

    let columns: Vec<&str> = frame.column_names().collect();
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");

    let mut tuples = Vec::with_capacity(frame.row_count());
    for row in 0..frame.row_count() {
        let rendered = frame
            .iter()
            .map(|(_, column)| literal(column.get(row).unwrap_or(&Value::Null)))
            .collect::<Vec<_>>()
            .join(", ");
        tuples.push(format!("({rendered})"));
    }

    let mut statement = format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(target),
        column_list,
        tuples.join(", ")
    );

    if policy == ConflictPolicy::Upsert && !unique_key.is_empty() {
        let key_list = unique_key
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let updates = columns
            .iter()
            .filter(|c| !unique_key.iter().any(|k| k == *c))
            .map(|c| format!("{0} = EXCLUDED.{0}", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        if updates.is_empty() {
            statement.push_str(&format!(" ON CONFLICT ({key_list}) DO NOTHING"));
        } else {
            statement.push_str(&format!(" ON CONFLICT ({key_list}) DO UPDATE SET {updates}"));
        }
    }

    Ok(statement)
}

/// Render the `COPY` statement matching [`copy_payload`].
pub fn copy_statement(frame: &Frame, target: &str) -> String {
    let columns = frame
        .column_names()
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "COPY {} ({}) FROM STDIN CSV NULL '\\N'",
        quote_ident(target),
        columns
    )
}

/// Render the frame as the CSV payload for `COPY ... FROM STDIN`, with
/// nulls spelled `\N`.
pub fn copy_payload(frame: &Frame) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    for row in 0..frame.row_count() {
        let record: Vec<String> = frame
            .iter()
            .map(|(_, column)| match column.get(row) {
                Some(Value::Null) | None => "\\N".to_string(),
                Some(value) => value.to_string(),
            })
            .collect();
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| FrameError::Persistence(format!("CSV payload write failed: {e}")))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render one cell as a SQL literal. Lists render as quoted JSON text, for
/// json/jsonb columns.
fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(x) => x.to_string(),
        Value::Str(s) => quote_text(s),
        Value::Date(d) => quote_text(&d.to_string()),
        Value::DateTime(dt) => quote_text(&dt.to_string()),
        Value::List(_) => quote_text(&value.to_string()),
    }
}

fn quote_text(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
