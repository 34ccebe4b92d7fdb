//! Excel parsing via calamine.
//!
//! Only the first worksheet is parsed; the remaining worksheet names are
//! surfaced so they can be recorded in the upload metadata.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};

use vantage_model::{CellValue, PipelineError, Record, Result, SourceTable};

use crate::headers::dedupe_headers;

/// First worksheet as a table, plus the names of the sheets left behind.
#[derive(Debug, Clone)]
pub struct ParsedWorkbook {
    pub table: SourceTable,
    pub extra_sheets: Vec<String>,
}

pub fn read_workbook(path: &Path) -> Result<ParsedWorkbook> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|err| PipelineError::MalformedInput(format!("open workbook: {err}")))?;
    let sheet_names = workbook.sheet_names().to_owned();
    let Some(first_sheet) = sheet_names.first().cloned() else {
        return Err(PipelineError::MalformedInput(
            "workbook has no worksheets".to_string(),
        ));
    };
    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|err| PipelineError::MalformedInput(format!("read worksheet: {err}")))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Err(PipelineError::MalformedInput(
            "worksheet is empty".to_string(),
        ));
    };
    let raw_headers: Vec<String> = header_row.iter().map(cell_display).collect();
    let headers = dedupe_headers(&raw_headers);

    let mut table = SourceTable::new(headers.clone());
    for (idx, data_row) in rows.enumerate() {
        let mut record = Record::new((idx as u64) + 1);
        for (pos, header) in headers.iter().enumerate() {
            let cell = data_row.get(pos).map_or(CellValue::Null, convert_cell);
            record.set(header.clone(), cell);
        }
        table.push_row(record);
    }

    Ok(ParsedWorkbook {
        table,
        extra_sheets: sheet_names.into_iter().skip(1).collect(),
    })
}

fn cell_display(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// Maps a spreadsheet cell onto the loose cell model.
pub fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::Int(v) => CellValue::Int(*v),
        Data::Float(v) => CellValue::Float(*v),
        Data::Bool(v) => CellValue::Bool(*v),
        Data::String(s) => CellValue::from_raw(s),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => CellValue::Date(naive.date()),
            None => CellValue::Null,
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from_raw(s),
        Data::Error(_) => CellValue::Null,
    }
}
