//! File ingestion.
//!
//! This crate turns a stored upload into a [`SourceTable`]: an ordered set
//! of loosely typed records plus the file's own column order. Tabular
//! formats (CSV, TSV, Excel, JSON, XML) keep their schema; document formats
//! (PDF, DOCX, plain text) yield one record per paragraph block with a
//! single `content` column and flow through cleaning unchanged.
//!
//! It also hosts the column profiler, which infers a canonical type and the
//! summary statistics the cleaning pipeline needs.

pub mod delimited;
pub mod document;
pub mod excel;
pub mod format;
pub mod headers;
pub mod json;
pub mod profile;
pub mod xml;

use std::path::Path;

use vantage_model::{PipelineError, Result, SourceTable};

pub use format::FileKind;
pub use headers::dedupe_headers;
pub use profile::{profile_table, ProfileOptions};

/// Result of parsing one uploaded file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub kind: FileKind,
    pub table: SourceTable,
    /// Worksheet names beyond the first, for spreadsheet files.
    pub extra_sheets: Vec<String>,
}

/// Parses a stored file, selecting the parser from the original filename's
/// extension first and the declared content type as a fallback.
pub fn parse_file(path: &Path, original_name: &str, content_type: &str) -> Result<ParsedFile> {
    let kind = format::detect_kind(original_name, content_type)?;
    tracing::debug!(kind = %kind, file = %original_name, "parsing upload");
    let (table, extra_sheets) = match kind {
        FileKind::Csv => (delimited::read_delimited(path, b',')?, Vec::new()),
        FileKind::Tsv => (delimited::read_delimited(path, b'\t')?, Vec::new()),
        FileKind::Excel => {
            let parsed = excel::read_workbook(path)?;
            (parsed.table, parsed.extra_sheets)
        }
        FileKind::Json => (json::read_json(path)?, Vec::new()),
        FileKind::Xml => (xml::read_xml(path)?, Vec::new()),
        FileKind::Pdf | FileKind::Docx | FileKind::Text => {
            (document::read_document(path, kind)?, Vec::new())
        }
    };
    if table.columns.is_empty() {
        return Err(PipelineError::MalformedInput(format!(
            "{original_name} contains no columns"
        )));
    }
    Ok(ParsedFile {
        kind,
        table,
        extra_sheets,
    })
}
