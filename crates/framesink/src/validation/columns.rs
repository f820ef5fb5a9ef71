//! Per-field column validation and type coercion.
//!
//! A field validates its whole column in one pass: nulls are resolved
//! against the defaulting policy, every non-null cell is coerced to the
//! declared logical type, and constraints run on the coerced values. A
//! failing cell records a row error and never blocks the remaining cells.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::frame::{Column, Value};
use crate::schema::{FieldDescriptor, FieldKind};

/// The result of validating one column against one field descriptor.
pub(crate) struct ColumnOutcome {
    /// The coerced column; `None` when any cell failed, since a partially
    /// coerced column must not reach overrides or table validators.
    pub column: Option<Column>,
    /// Row index → error message for this field.
    pub errors: BTreeMap<usize, String>,
}

/// Validate a column against its descriptor.
pub(crate) fn validate_column(field: &FieldDescriptor, column: &Column) -> ColumnOutcome {
    let mut cells = Vec::with_capacity(column.len());
    let mut errors = BTreeMap::new();

    for (row, cell) in column.iter().enumerate() {
        let resolved = if cell.is_null() {
            match field.default() {
                Some(default) => default.clone(),
                None if field.nulls_allowed() => {
                    cells.push(Value::Null);
                    continue;
                }
                None => {
                    errors.insert(row, format!("{} is required", field.name()));
                    cells.push(Value::Null);
                    continue;
                }
            }
        } else {
            cell.clone()
        };

        match coerce_cell(field, &resolved) {
            Some(coerced) => {
                if let Some(message) = constraint_error(field, &coerced) {
                    errors.insert(row, message);
                }
                cells.push(coerced);
            }
            None => {
                errors.insert(row, invalid_message(field, &resolved));
                cells.push(Value::Null);
            }
        }
    }

    ColumnOutcome {
        column: if errors.is_empty() {
            Some(cells.into_iter().collect())
        } else {
            None
        },
        errors,
    }
}

fn invalid_message(field: &FieldDescriptor, cell: &Value) -> String {
    match (field.kind(), field.element_kind(), cell) {
        // a list arrived but an element failed element-type coercion
        (FieldKind::List, Some(element), Value::List(_)) => {
            format!("{} is not a valid {} list", field.name(), element.label())
        }
        _ => format!("{} is not a valid {}", field.name(), field.kind().label()),
    }
}

/// Coerce one non-null cell to the field's logical type.
///
/// Returns `None` on failure; the caller records the row error and keeps
/// going.
pub(crate) fn coerce_cell(field: &FieldDescriptor, cell: &Value) -> Option<Value> {
    match field.kind() {
        FieldKind::List => coerce_list(field, cell),
        kind => coerce_scalar(kind, cell, field.format_str(), field.trims_whitespace()),
    }
}

fn coerce_list(field: &FieldDescriptor, cell: &Value) -> Option<Value> {
    let Value::List(items) = cell else {
        return None;
    };
    let Some(element) = field.element_kind() else {
        return Some(cell.clone());
    };
    let coerced = items
        .iter()
        .map(|item| {
            if item.is_null() {
                Some(Value::Null)
            } else {
                coerce_scalar(element, item, None, true)
            }
        })
        .collect::<Option<Vec<_>>>()?;
    Some(Value::List(coerced))
}

fn coerce_scalar(kind: FieldKind, cell: &Value, format: Option<&str>, trim: bool) -> Option<Value> {
    match kind {
        FieldKind::Char => coerce_char(cell, trim),
        FieldKind::Integer => coerce_integer(cell),
        FieldKind::Float => coerce_float(cell),
        FieldKind::Boolean => coerce_boolean(cell),
        FieldKind::Date => coerce_date(cell, format),
        FieldKind::DateTime => coerce_datetime(cell, format),
        FieldKind::List => None,
    }
}

fn coerce_char(cell: &Value, trim: bool) -> Option<Value> {
    let rendered = match cell {
        Value::Str(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::Bool(b) => b.to_string(),
        // integral floats render without the fractional part, so an id
        // column that arrived as 234556.0 round-trips as "234556"
        Value::Float(x) if x.fract() == 0.0 && x.is_finite() => (*x as i64).to_string(),
        Value::Float(x) => x.to_string(),
        Value::Date(d) => d.to_string(),
        Value::DateTime(dt) => dt.to_string(),
        Value::Null | Value::List(_) => return None,
    };
    Some(Value::Str(if trim {
        rendered.trim().to_string()
    } else {
        rendered
    }))
}

fn coerce_integer(cell: &Value) -> Option<Value> {
    match cell {
        Value::Int(i) => Some(Value::Int(*i)),
        Value::Bool(b) => Some(Value::Int(i64::from(*b))),
        // integral floats only; fractional values are rejected rather than
        // silently truncated
        Value::Float(x) if x.fract() == 0.0 && x.is_finite() => Some(Value::Int(*x as i64)),
        Value::Str(s) => s.trim().parse::<i64>().ok().map(Value::Int),
        _ => None,
    }
}

fn coerce_float(cell: &Value) -> Option<Value> {
    match cell {
        Value::Float(x) => Some(Value::Float(*x)),
        Value::Int(i) => Some(Value::Float(*i as f64)),
        Value::Bool(b) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s.trim().parse::<f64>().ok().map(Value::Float),
        _ => None,
    }
}

fn coerce_boolean(cell: &Value) -> Option<Value> {
    match cell {
        Value::Bool(b) => Some(Value::Bool(*b)),
        Value::Int(0) => Some(Value::Bool(false)),
        Value::Int(1) => Some(Value::Bool(true)),
        Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Some(Value::Bool(true)),
            "false" | "f" | "no" | "n" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn coerce_date(cell: &Value, format: Option<&str>) -> Option<Value> {
    match cell {
        Value::Date(d) => Some(Value::Date(*d)),
        Value::DateTime(dt) => Some(Value::Date(dt.date())),
        Value::Str(s) => {
            let format = format?;
            NaiveDate::parse_from_str(s.trim(), format)
                .ok()
                .map(Value::Date)
        }
        _ => None,
    }
}

fn coerce_datetime(cell: &Value, format: Option<&str>) -> Option<Value> {
    match cell {
        Value::DateTime(dt) => Some(Value::DateTime(*dt)),
        Value::Date(d) => Some(Value::DateTime(d.and_time(NaiveTime::MIN))),
        Value::Str(s) => {
            let format = format?;
            NaiveDateTime::parse_from_str(s.trim(), format)
                .ok()
                .map(Value::DateTime)
        }
        _ => None,
    }
}

/// Check length, bound, blank and pattern constraints on one coerced cell.
fn constraint_error(field: &FieldDescriptor, value: &Value) -> Option<String> {
    match value {
        Value::Str(s) => {
            if s.is_empty() && !field.blanks_allowed() {
                return Some(format!("{} may not be blank", field.name()));
            }
            let chars = s.chars().count();
            if let Some(max) = field.max_length_limit() {
                if chars > max {
                    return Some(format!(
                        "{} must have no more than {max} characters",
                        field.name()
                    ));
                }
            }
            if let Some(min) = field.min_length_limit() {
                if chars < min {
                    return Some(format!(
                        "{} must have at least {min} characters",
                        field.name()
                    ));
                }
            }
            if let Some(pattern) = field.pattern_regex() {
                if !pattern.is_match(s) {
                    return Some(format!(
                        "{} does not match the required pattern",
                        field.name()
                    ));
                }
            }
            None
        }
        Value::Int(_) | Value::Float(_) => {
            let numeric = match value {
                Value::Int(i) => *i as f64,
                Value::Float(x) => *x,
                _ => unreachable!(),
            };
            if let Some(max) = field.max_value_limit() {
                if numeric > max {
                    return Some(format!(
                        "{} must be less than or equal to {max}",
                        field.name()
                    ));
                }
            }
            if let Some(min) = field.min_value_limit() {
                if numeric < min {
                    return Some(format!(
                        "{} must be greater than or equal to {min}",
                        field.name()
                    ));
                }
            }
            None
        }
        Value::List(items) => {
            if let Some(max) = field.max_length_limit() {
                if items.len() > max {
                    return Some(format!(
                        "{} must have no more than {max} elements",
                        field.name()
                    ));
                }
            }
            if let Some(min) = field.min_length_limit() {
                if items.len() < min {
                    return Some(format!(
                        "{} must have at least {min} elements",
                        field.name()
                    ));
                }
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDescriptor;

    #[test]
    fn test_integer_coercion_from_strings() {
        let field = FieldDescriptor::integer("n");
        let outcome = validate_column(&field, &Column::from(["1", " 2 ", "3"]));
        assert!(outcome.errors.is_empty());
        assert_eq!(
            outcome.column.unwrap().cells(),
            &[Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn test_integer_rejects_fractional_floats() {
        let field = FieldDescriptor::integer("n");
        let outcome = validate_column(&field, &Column::from([Value::Float(2.0), Value::Float(2.7)]));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[&1], "n is not a valid integer");
        assert!(outcome.column.is_none());
    }

    #[test]
    fn test_required_null_per_row() {
        let field = FieldDescriptor::char("name");
        let outcome = validate_column(&field, &Column::from(vec![Some("a"), None, Some("b")]));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[&1], "name is required");
    }

    #[test]
    fn test_default_fills_nulls() {
        let field = FieldDescriptor::integer("n").required(false).default_value(1i64);
        let outcome = validate_column(&field, &Column::from(vec![None, Some(7i64)]));
        assert!(outcome.errors.is_empty());
        assert_eq!(
            outcome.column.unwrap().cells(),
            &[Value::Int(1), Value::Int(7)]
        );
    }

    #[test]
    fn test_allow_null_passes_nulls_through() {
        let field = FieldDescriptor::integer("n").allow_null(true);
        let outcome = validate_column(&field, &Column::from(vec![None, Some(7i64)]));
        assert!(outcome.errors.is_empty());
        assert_eq!(
            outcome.column.unwrap().cells(),
            &[Value::Null, Value::Int(7)]
        );
    }

    #[test]
    fn test_one_bad_cell_does_not_block_the_rest() {
        let field = FieldDescriptor::integer("n");
        let outcome = validate_column(&field, &Column::from(["1", "x", "3"]));
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors.contains_key(&1));
        // the other cells were still coerced and checked
        assert!(!outcome.errors.contains_key(&0));
        assert!(!outcome.errors.contains_key(&2));
    }

    #[test]
    fn test_char_trims_and_rejects_blank() {
        let field = FieldDescriptor::char("name");
        let outcome = validate_column(&field, &Column::from(["  ok  ", "   "]));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[&1], "name may not be blank");
    }

    #[test]
    fn test_char_renders_integral_floats() {
        let field = FieldDescriptor::char("id");
        let outcome = validate_column(&field, &Column::from([Value::Float(234556.0)]));
        assert!(outcome.errors.is_empty());
        assert_eq!(
            outcome.column.unwrap().cells(),
            &[Value::Str("234556".to_string())]
        );
    }

    #[test]
    fn test_max_length() {
        let field = FieldDescriptor::char("code").max_length(3);
        let outcome = validate_column(&field, &Column::from(["abc", "abcd"]));
        assert_eq!(
            outcome.errors[&1],
            "code must have no more than 3 characters"
        );
    }

    #[test]
    fn test_numeric_bounds() {
        let field = FieldDescriptor::integer("age").min_value(0.0).max_value(150.0);
        let outcome = validate_column(&field, &Column::from([-1i64, 30, 200]));
        assert_eq!(outcome.errors.len(), 2);
        assert_eq!(outcome.errors[&0], "age must be greater than or equal to 0");
        assert_eq!(outcome.errors[&2], "age must be less than or equal to 150");
    }

    #[test]
    fn test_boolean_tokens() {
        let field = FieldDescriptor::boolean("active");
        let outcome = validate_column(&field, &Column::from(["yes", "F", "1", "maybe"]));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[&3], "active is not a valid boolean");
    }

    #[test]
    fn test_date_with_format() {
        let field = FieldDescriptor::date("day", "%Y-%m-%d");
        let outcome = validate_column(&field, &Column::from(["2024-01-31", "31/01/2024"]));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[&1], "day is not a valid date");
        let field = FieldDescriptor::date("day", "%d/%m/%Y");
        let outcome = validate_column(&field, &Column::from(["31/01/2024"]));
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_pattern_constraint() {
        let field =
            FieldDescriptor::char("sku").pattern(regex::Regex::new(r"^[A-Z]{2}\d{4}$").unwrap());
        let outcome = validate_column(&field, &Column::from(["AB1234", "nope"]));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[&1], "sku does not match the required pattern");
    }

    #[test]
    fn test_list_elements_coerced() {
        let field = FieldDescriptor::list("tags", FieldKind::Integer);
        let good = Value::List(vec![Value::Str("1".into()), Value::Int(2)]);
        let bad = Value::List(vec![Value::Str("x".into())]);
        let outcome = validate_column(&field, &Column::from(vec![good, bad]));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[&1], "tags is not a valid integer list");
    }

    #[test]
    fn test_list_length_bounds() {
        let field = FieldDescriptor::list("tags", FieldKind::Char).min_length(1);
        let outcome = validate_column(&field, &Column::from(vec![Value::List(vec![])]));
        assert_eq!(outcome.errors[&0], "tags must have at least 1 elements");
    }
}
