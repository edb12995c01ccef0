use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::{debug, warn};

use super::csv::{infer_cell, parse_rows};
use super::repo_types::{Table, Value};
use crate::error::DataAccessError;

enum Format {
    Json,
    Delimited(char),
    Workbook,
}

/// Loads the materials table from an Excel workbook (first sheet), a JSON
/// array of objects, or a CSV/TSV file, picked by extension.
pub async fn load_table(path: &Path) -> Result<Table, DataAccessError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let format = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => Format::Workbook,
        "json" => Format::Json,
        "csv" => Format::Delimited(','),
        "tsv" | "txt" => Format::Delimited('\t'),
        _ => {
            warn!(path = %path.display(), "unsupported data file extension");
            return Err(DataAccessError::Unsupported(path.to_path_buf()));
        }
    };

    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "data file not found");
            return Err(DataAccessError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            warn!(path = %path.display(), error = %source, "data file unreadable");
            return Err(DataAccessError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let malformed = |reason: String| DataAccessError::Malformed {
        path: path.to_path_buf(),
        reason,
    };
    let table = match format {
        Format::Workbook => table_from_workbook(bytes).map_err(malformed)?,
        Format::Json => {
            let text = String::from_utf8(bytes).map_err(|e| malformed(e.to_string()))?;
            table_from_json(&text).map_err(malformed)?
        }
        Format::Delimited(sep) => {
            let text = String::from_utf8(bytes).map_err(|e| malformed(e.to_string()))?;
            table_from_delimited(&text, sep)
        }
    };
    if table.is_empty() {
        warn!(path = %path.display(), "materials table has no rows");
    }
    debug!(
        path = %path.display(),
        columns = table.columns.len(),
        rows = table.nrows(),
        "materials table loaded"
    );
    Ok(table)
}

/// First worksheet of the workbook; its first row is the header.
pub fn table_from_workbook(bytes: Vec<u8>) -> Result<Table, String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "workbook has no sheets".to_string())?
        .map_err(|e| e.to_string())?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Table::default());
    };
    let columns = header
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();
    let rows = rows
        .map(|r| r.iter().map(cell_value).collect())
        .collect();
    Ok(Table::new(columns, rows))
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Float(f) => Value::Number(*f),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

/// Array of flat objects. Columns appear in first-seen key order; keys
/// missing from a row become nulls.
pub fn table_from_json(text: &str) -> Result<Table, String> {
    let records: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_str(text).map_err(|e| e.to_string())?;

    let mut columns: Vec<String> = Vec::new();
    for rec in &records {
        for key in rec.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .into_iter()
        .map(|mut rec| {
            columns
                .iter()
                .map(|c| rec.remove(c).map(Value::from).unwrap_or(Value::Null))
                .collect()
        })
        .collect();
    Ok(Table::new(columns, rows))
}

/// First row is the header.
pub fn table_from_delimited(text: &str, sep: char) -> Table {
    let mut rows = parse_rows(text, sep).into_iter();
    let Some(header) = rows.next() else {
        return Table::default();
    };
    let columns = header.into_iter().map(|h| h.trim().to_string()).collect();
    let rows = rows
        .map(|r| r.iter().map(|cell| infer_cell(cell)).collect())
        .collect();
    Table::new(columns, rows)
}
