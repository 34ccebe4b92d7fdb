//! Document-format ingestion.
//!
//! PDF, DOCX and plain text carry no tabular schema. They are accepted and
//! yield one record per paragraph block with a single `content` column; the
//! cleaning pipeline passes such tables through unchanged. For the binary
//! formats the extraction is a best effort over the printable text runs.

use std::fs;
use std::path::Path;

use vantage_model::{CellValue, PipelineError, Record, Result, SourceTable};

use crate::format::FileKind;

/// Minimum run length for extracted text from binary formats; shorter runs
/// are almost always structural noise.
const MIN_RUN_LEN: usize = 4;

pub fn read_document(path: &Path, kind: FileKind) -> Result<SourceTable> {
    let text = match kind {
        FileKind::Text => fs::read_to_string(path)?,
        FileKind::Pdf | FileKind::Docx => {
            let bytes = fs::read(path)?;
            extract_text_runs(&bytes)
        }
        _ => {
            return Err(PipelineError::MalformedInput(format!(
                "{kind} is not a document format"
            )));
        }
    };

    let blocks = split_blocks(&text);
    if blocks.is_empty() {
        return Err(PipelineError::MalformedInput(
            "document contains no readable text".to_string(),
        ));
    }

    let mut table = SourceTable::new(vec!["content".to_string()]);
    for (idx, block) in blocks.into_iter().enumerate() {
        let mut record = Record::new((idx as u64) + 1);
        record.set("content", CellValue::Text(block));
        table.push_row(record);
    }
    Ok(table)
}

/// Splits text into paragraph blocks on blank lines.
fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.trim().is_empty() {
                blocks.push(current.trim().to_string());
            }
            current.clear();
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(line.trim());
        }
    }
    if !current.trim().is_empty() {
        blocks.push(current.trim().to_string());
    }
    blocks
}

/// Pulls printable text runs out of a binary buffer.
fn extract_text_runs(bytes: &[u8]) -> String {
    let mut output = String::new();
    let mut run = String::new();
    for byte in bytes {
        let ch = *byte as char;
        if ch.is_ascii_graphic() || ch == ' ' {
            run.push(ch);
        } else {
            if run.trim().len() >= MIN_RUN_LEN {
                output.push_str(run.trim());
                output.push('\n');
            }
            run.clear();
            if ch == '\n' {
                output.push('\n');
            }
        }
    }
    if run.trim().len() >= MIN_RUN_LEN {
        output.push_str(run.trim());
        output.push('\n');
    }
    output
}
