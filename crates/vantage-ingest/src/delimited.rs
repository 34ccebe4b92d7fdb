//! CSV and TSV parsing.

use std::path::Path;

use vantage_model::{CellValue, PipelineError, Record, Result, SourceTable};

use crate::headers::dedupe_headers;

/// Reads a delimited file into a [`SourceTable`]. The emitted column order
/// is the file's own header order; empty fields become nulls.
pub fn read_delimited(path: &Path, delimiter: u8) -> Result<SourceTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(|err| PipelineError::MalformedInput(format!("open delimited file: {err}")))?;

    let raw_headers: Vec<String> = reader
        .headers()
        .map_err(|err| PipelineError::MalformedInput(format!("read header row: {err}")))?
        .iter()
        .map(str::to_string)
        .collect();
    let headers = dedupe_headers(&raw_headers);

    let mut table = SourceTable::new(headers.clone());
    for (idx, record) in reader.records().enumerate() {
        let record =
            record.map_err(|err| PipelineError::MalformedInput(format!("row {}: {err}", idx + 1)))?;
        let mut row = Record::new((idx as u64) + 1);
        for (pos, header) in headers.iter().enumerate() {
            let value = record.get(pos).unwrap_or("");
            row.set(header.clone(), CellValue::from_raw(value));
        }
        table.push_row(row);
    }
    Ok(table)
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
    fn reads_rows_in_file_order() {
        let file = write_temp("b,a\n2,1\n4,3\n");
        let table = read_delimited(file.path(), b',').unwrap();
        assert_eq!(table.columns, vec!["b", "a"]);
        assert_eq!(table.height(), 2);
        assert_eq!(table.rows[0].cell("b"), &CellValue::Text("2".to_string()));
        assert_eq!(table.rows[1].row_number, 2);
    }

    #[test]
    fn empty_fields_become_null() {
        let file = write_temp("a,b\n1,\n,2\n");
        let table = read_delimited(file.path(), b',').unwrap();
        assert!(table.rows[0].cell("b").is_null());
        assert!(table.rows[1].cell("a").is_null());
    }

    #[test]
    fn duplicated_headers_are_suffixed() {
        let file = write_temp("id,id,id\n1,2,3\n");
        let table = read_delimited(file.path(), b',').unwrap();
        assert_eq!(table.columns, vec!["id", "id_2", "id_3"]);
        assert_eq!(
            table.rows[0].cell("id_3"),
            &CellValue::Text("3".to_string())
        );
    }

    #[test]
    fn short_rows_pad_with_nulls() {
        let file = write_temp("a,b,c\n1,2\n");
        let table = read_delimited(file.path(), b',').unwrap();
        assert!(table.rows[0].cell("c").is_null());
    }

    #[test]
    fn tsv_uses_tab_delimiter() {
        let file = write_temp("x\ty\n1\t2\n");
        let table = read_delimited(file.path(), b'\t').unwrap();
        assert_eq!(table.columns, vec!["x", "y"]);
        assert_eq!(table.rows[0].cell("y"), &CellValue::Text("2".to_string()));
    }
}
