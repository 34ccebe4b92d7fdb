//! File-kind detection.

use std::fmt;

use vantage_model::{PipelineError, Result};

/// Supported file kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Csv,
    Tsv,
    Excel,
    Json,
    Xml,
    Pdf,
    Docx,
    Text,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Csv => "csv",
            FileKind::Tsv => "tsv",
            FileKind::Excel => "excel",
            FileKind::Json => "json",
            FileKind::Xml => "xml",
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Text => "text",
        }
    }

    /// True when the format carries a tabular schema of its own.
    pub fn is_tabular(&self) -> bool {
        !matches!(self, FileKind::Pdf | FileKind::Docx | FileKind::Text)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn kind_from_extension(name: &str) -> Option<FileKind> {
    let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_lowercase())?;
    match extension.as_str() {
        "csv" => Some(FileKind::Csv),
        "tsv" | "tab" => Some(FileKind::Tsv),
        "xls" | "xlsx" => Some(FileKind::Excel),
        "json" => Some(FileKind::Json),
        "xml" => Some(FileKind::Xml),
        "pdf" => Some(FileKind::Pdf),
        "docx" => Some(FileKind::Docx),
        "txt" | "text" => Some(FileKind::Text),
        _ => None,
    }
}

fn kind_from_content_type(content_type: &str) -> Option<FileKind> {
    // Parameters like "; charset=utf-8" are not significant here.
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    match essence.as_str() {
        "text/csv" | "application/csv" => Some(FileKind::Csv),
        "text/tab-separated-values" => Some(FileKind::Tsv),
        "application/vnd.ms-excel"
        | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
            Some(FileKind::Excel)
        }
        "application/json" => Some(FileKind::Json),
        "application/xml" | "text/xml" => Some(FileKind::Xml),
        "application/pdf" => Some(FileKind::Pdf),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
            Some(FileKind::Docx)
        }
        "text/plain" => Some(FileKind::Text),
        _ => None,
    }
}

/// Detects the file kind from the original filename's extension, falling
/// back to the declared content type.
pub fn detect_kind(original_name: &str, content_type: &str) -> Result<FileKind> {
    kind_from_extension(original_name)
        .or_else(|| kind_from_content_type(content_type))
        .ok_or_else(|| {
            PipelineError::UnsupportedFormat(format!(
                "no parser for {original_name} (content type {content_type})"
            ))
        })
}
