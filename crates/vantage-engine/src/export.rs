//! Cleaned dataset export.
//!
//! Exports carry the dynamic table schema: the cleaned columns plus the
//! surrogate `id` key and a `created_at` timestamp.

use chrono::Utc;
use serde_json::json;

use vantage_model::{PipelineError, Result, SourceTable};

/// Supported download formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(PipelineError::PreconditionFailed(format!(
                "unsupported export format {other}"
            ))),
        }
    }
}

/// Renders a cleaned table in the requested format.
pub fn export_table(table: &SourceTable, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Csv => export_csv(table),
        ExportFormat::Json => export_json(table),
    }
}

fn export_csv(table: &SourceTable) -> Result<String> {
    let created_at = Utc::now().to_rfc3339();
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header: Vec<String> = vec!["id".to_string()];
    header.extend(table.columns.iter().cloned());
    header.push("created_at".to_string());
    writer
        .write_record(&header)
        .map_err(|err| PipelineError::MalformedInput(format!("csv export: {err}")))?;

    for row in &table.rows {
        let mut fields: Vec<String> = vec![row.row_number.to_string()];
        for column in &table.columns {
            fields.push(row.cell(column).display());
        }
        fields.push(created_at.clone());
        writer
            .write_record(&fields)
            .map_err(|err| PipelineError::MalformedInput(format!("csv export: {err}")))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| PipelineError::MalformedInput(format!("csv export: {err}")))?;
    String::from_utf8(bytes)
        .map_err(|err| PipelineError::MalformedInput(format!("csv export: {err}")))
}

fn export_json(table: &SourceTable) -> Result<String> {
    let created_at = Utc::now().to_rfc3339();
    let rows: Vec<serde_json::Value> = table
        .rows
        .iter()
        .map(|row| {
            let mut object = serde_json::Map::new();
            object.insert("id".to_string(), json!(row.row_number));
            for column in &table.columns {
                object.insert(column.clone(), json!(row.cell(column).display()));
            }
            object.insert("created_at".to_string(), json!(created_at));
            serde_json::Value::Object(object)
        })
        .collect();
    serde_json::to_string_pretty(&rows)
        .map_err(|err| PipelineError::MalformedInput(format!("json export: {err}")))
}
