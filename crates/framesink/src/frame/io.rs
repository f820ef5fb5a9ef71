//! Frame input builders for delimited text and JSON record payloads.

use std::io::Read;

use indexmap::IndexMap;

use crate::error::{FrameError, Result};

use super::column::Column;
use super::table::Frame;
use super::value::Value;

/// Options for reading delimited text into a frame.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter.
    pub delimiter: u8,
    /// Whether the first record is a header row.
    pub has_headers: bool,
    /// Quote character.
    pub quote: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
            quote: b'"',
        }
    }
}

impl Frame {
    /// Read delimited text into a frame.
    ///
    /// Cells arrive as strings; conventional missing-value tokens (empty,
    /// na, n/a, null, none, nil, `.`, `-`) become nulls. Typing is the
    /// schema's job at validation time, not the reader's.
    pub fn from_csv(reader: impl Read, options: CsvOptions) -> Result<Frame> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(options.has_headers)
            .quote(options.quote)
            .flexible(false)
            .from_reader(reader);

        let headers: Vec<String> = if options.has_headers {
            csv_reader.headers()?.iter().map(str::to_string).collect()
        } else {
            Vec::new()
        };

        let mut columns: Vec<Vec<Value>> = headers.iter().map(|_| Vec::new()).collect();
        for record in csv_reader.records() {
            let record = record?;
            if columns.is_empty() {
                // headerless input: synthesize column names on first record
                columns = (0..record.len()).map(|_| Vec::new()).collect();
            }
            for (i, cell) in record.iter().enumerate() {
                columns[i].push(Value::from_token(cell));
            }
        }

        let names: Vec<String> = if options.has_headers {
            headers
        } else {
            (0..columns.len())
                .map(|i| format!("column_{}", i + 1))
                .collect()
        };

        Frame::from_columns(names.into_iter().zip(columns))
    }

    /// Build a frame from JSON records, one object per row.
    ///
    /// Column order follows first appearance across the records; keys absent
    /// from a record become nulls in that row. JSON strings are kept
    /// verbatim; only explicit JSON `null` maps to the null sentinel.
    pub fn from_records(records: &[serde_json::Value]) -> Result<Frame> {
        let mut columns: IndexMap<String, Vec<Value>> = IndexMap::new();

        for (row, record) in records.iter().enumerate() {
            let object = record.as_object().ok_or_else(|| {
                FrameError::Schema(format!("record {row} is not a JSON object"))
            })?;
            for key in object.keys() {
                columns
                    .entry(key.clone())
                    .or_insert_with(|| vec![Value::Null; row]);
            }
            for (name, cells) in columns.iter_mut() {
                let cell = match object.get(name) {
                    Some(json) => from_json(json, name)?,
                    None => Value::Null,
                };
                cells.push(cell);
            }
        }

        Frame::from_columns(
            columns
                .into_iter()
                .map(|(name, cells)| (name, Column::from_iter(cells))),
        )
    }
}

fn from_json(json: &serde_json::Value, column: &str) -> Result<Value> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(FrameError::Schema(format!(
                    "number out of range in column '{column}'"
                )))
            }
        }
        serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
        serde_json::Value::Array(items) => Ok(Value::List(
            items
                .iter()
                .map(|item| from_json(item, column))
                .collect::<Result<Vec<_>>>()?,
        )),
        serde_json::Value::Object(_) => Err(FrameError::Schema(format!(
            "nested objects are not supported in column '{column}'"
        ))),
    }
}
