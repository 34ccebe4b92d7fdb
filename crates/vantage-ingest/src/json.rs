//! JSON parsing.
//!
//! Accepts either a top-level array of objects or a top-level object whose
//! first array-valued property holds the records. Nested objects are
//! flattened with dotted paths; arrays are serialised back to JSON text.
//! The first record's insertion order is the authoritative column order.

use std::fs;
use std::path::Path;

use serde_json::Value;

use vantage_model::{CellValue, PipelineError, Record, Result, SourceTable};

pub fn read_json(path: &Path) -> Result<SourceTable> {
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)
        .map_err(|err| PipelineError::MalformedInput(format!("invalid JSON: {err}")))?;

    let records = select_records(value)?;
    let mut columns: Vec<String> = Vec::new();
    let mut table_rows = Vec::with_capacity(records.len());

    for (idx, record_value) in records.into_iter().enumerate() {
        let Value::Object(map) = record_value else {
            return Err(PipelineError::MalformedInput(format!(
                "record {} is not an object",
                idx + 1
            )));
        };
        let mut row = Record::new((idx as u64) + 1);
        for (key, value) in map {
            flatten_into(&key, value, &mut row, &mut columns);
        }
        table_rows.push(row);
    }

    let mut table = SourceTable::new(columns);
    table.rows = table_rows;
    Ok(table)
}

/// Picks the record array: the document itself, or the first array-valued
/// property of a top-level object.
fn select_records(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(map) => {
            for (_, candidate) in map {
                if let Value::Array(items) = candidate {
                    return Ok(items);
                }
            }
            Err(PipelineError::MalformedInput(
                "object document has no array-valued property".to_string(),
            ))
        }
        _ => Err(PipelineError::MalformedInput(
            "document is neither an array nor an object".to_string(),
        )),
    }
}

/// Flattens one property into the record, registering any new column names
/// in order of first appearance.
fn flatten_into(path: &str, value: Value, row: &mut Record, columns: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(&format!("{path}.{key}"), nested, row, columns);
            }
        }
        other => {
            let cell = scalar_cell(other);
            if !columns.iter().any(|existing| existing == path) {
                columns.push(path.to_string());
            }
            row.set(path, cell);
        }
    }
}

fn scalar_cell(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Bool(b) => CellValue::Bool(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Int(i)
            } else {
                CellValue::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => CellValue::from_raw(&s),
        // Arrays keep their JSON rendering as text.
        Value::Array(_) => CellValue::Text(value.to_string()),
        Value::Object(_) => unreachable!("objects are flattened before this point"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_top_level_array() {
        let file = write_temp(r#"[{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]"#);
        let table = read_json(file.path()).unwrap();
        assert_eq!(table.columns, vec!["id", "name"]);
        assert_eq!(table.height(), 2);
        assert_eq!(table.rows[0].cell("id"), &CellValue::Int(1));
    }

    #[test]
    fn takes_first_array_property_of_object() {
        let file = write_temp(r#"{"meta": "x", "items": [{"v": 1.5}], "other": [1]}"#);
        let table = read_json(file.path()).unwrap();
        assert_eq!(table.columns, vec!["v"]);
        assert_eq!(table.rows[0].cell("v"), &CellValue::Float(1.5));
    }

    #[test]
    fn nested_objects_flatten_with_dotted_paths() {
        let file = write_temp(r#"[{"user": {"id": 3, "name": "ann"}, "tags": ["a", "b"]}]"#);
        let table = read_json(file.path()).unwrap();
        assert_eq!(table.columns, vec!["user.id", "user.name", "tags"]);
        assert_eq!(
            table.rows[0].cell("tags"),
            &CellValue::Text("[\"a\",\"b\"]".to_string())
        );
    }

    #[test]
    fn first_record_order_is_authoritative() {
        let file = write_temp(r#"[{"b": 1, "a": 2}, {"a": 3, "b": 4, "c": 5}]"#);
        let table = read_json(file.path()).unwrap();
        assert_eq!(table.columns, vec!["b", "a", "c"]);
    }

    #[test]
    fn scalar_document_is_malformed() {
        let file = write_temp("42");
        let err = read_json(file.path()).unwrap_err();
        assert_eq!(err.tag(), "MalformedInput");
    }
}
