//! XML parsing.
//!
//! Each repeated first-level child of the root element becomes one record.
//! Attributes become fields, child element text becomes a field named after
//! the element, and deeper nesting joins names with dots.

use std::fs;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use vantage_model::{CellValue, PipelineError, Record, Result, SourceTable};

pub fn read_xml(path: &Path) -> Result<SourceTable> {
    let content = fs::read_to_string(path)?;
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    let mut columns: Vec<String> = Vec::new();
    let mut rows: Vec<Record> = Vec::new();

    // Depth 1 is the document root; its direct children are the records.
    let mut depth = 0usize;
    let mut current: Option<Record> = None;
    let mut field_stack: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                depth += 1;
                if depth == 2 {
                    let mut record = Record::new((rows.len() as u64) + 1);
                    collect_attributes(&element, &mut record, &mut columns)?;
                    current = Some(record);
                    field_stack.clear();
                } else if depth > 2 {
                    field_stack.push(local_name(&element));
                    if let Some(record) = current.as_mut() {
                        collect_prefixed_attributes(
                            &element,
                            &field_stack.join("."),
                            record,
                            &mut columns,
                        )?;
                    }
                }
            }
            Ok(Event::Empty(element)) => {
                if depth == 1 {
                    let mut record = Record::new((rows.len() as u64) + 1);
                    collect_attributes(&element, &mut record, &mut columns)?;
                    rows.push(record);
                } else if depth >= 2
                    && let Some(record) = current.as_mut()
                {
                    let mut path = field_stack.clone();
                    path.push(local_name(&element));
                    collect_prefixed_attributes(&element, &path.join("."), record, &mut columns)?;
                }
            }
            Ok(Event::Text(text)) => {
                if depth > 2
                    && let Some(record) = current.as_mut()
                    && !field_stack.is_empty()
                {
                    let field = field_stack.join(".");
                    let value = String::from_utf8_lossy(text.as_ref()).trim().to_string();
                    if !value.is_empty() {
                        register_column(&field, &mut columns);
                        record.set(field, CellValue::Text(value));
                    }
                }
            }
            Ok(Event::End(_)) => {
                if depth == 2
                    && let Some(record) = current.take()
                {
                    rows.push(record);
                }
                if depth > 2 {
                    field_stack.pop();
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                return Err(PipelineError::MalformedInput(format!("invalid XML: {err}")));
            }
        }
    }

    if rows.is_empty() && columns.is_empty() {
        return Err(PipelineError::MalformedInput(
            "document has no repeated child elements".to_string(),
        ));
    }

    let mut table = SourceTable::new(columns);
    table.rows = rows;
    Ok(table)
}

fn local_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.local_name().as_ref()).to_string()
}

fn register_column(name: &str, columns: &mut Vec<String>) {
    if !columns.iter().any(|existing| existing == name) {
        columns.push(name.to_string());
    }
}

fn collect_attributes(
    element: &BytesStart<'_>,
    record: &mut Record,
    columns: &mut Vec<String>,
) -> Result<()> {
    collect_prefixed_attributes(element, "", record, columns)
}

fn collect_prefixed_attributes(
    element: &BytesStart<'_>,
    prefix: &str,
    record: &mut Record,
    columns: &mut Vec<String>,
) -> Result<()> {
    for attribute in element.attributes() {
        let attribute = attribute
            .map_err(|err| PipelineError::MalformedInput(format!("invalid attribute: {err}")))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).to_string();
        let name = if prefix.is_empty() {
            key
        } else {
            format!("{prefix}.{key}")
        };
        let value = String::from_utf8_lossy(&attribute.value).to_string();
        register_column(&name, columns);
        record.set(name, CellValue::from_raw(&value));
    }
    Ok(())
}
