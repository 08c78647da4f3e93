use crate::error::{AnalyticsError, Result};
use crate::types::{Cell, RawTable};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;

/// Load an uploaded export, dispatching on its extension.
pub fn load_path(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path).map_err(|source| AnalyticsError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
            load_reader(file)
        }
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_spreadsheet(path),
        _ => Err(AnalyticsError::UnsupportedFile(path.display().to_string())),
    }
}

/// Read the first worksheet of a workbook; its first row is the header.
pub fn load_spreadsheet(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AnalyticsError::Structure("workbook has no worksheets".into()))??;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(first) => first.iter().map(header_text).collect(),
        None => return Err(AnalyticsError::Structure("missing header row".into())),
    };
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AnalyticsError::Structure("missing header row".into()));
    }

    let body: Vec<Vec<Cell>> = rows
        .filter(|row| !row.iter().all(|d| matches!(d, Data::Empty)))
        .map(|row| row.iter().map(spreadsheet_cell).collect())
        .collect();
    tracing::debug!(columns = headers.len(), rows = body.len(), "loaded worksheet");
    RawTable::new(headers, body)
}

fn header_text(data: &Data) -> String {
    match spreadsheet_cell(data).as_text() {
        Some(text) => text.into_owned(),
        None => String::new(),
    }
}

fn spreadsheet_cell(data: &Data) -> Cell {
    match data {
        Data::String(s) | Data::DateTimeIso(s) => Cell::from_text(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(d) => Cell::Date(d.date()),
            None => Cell::Number(dt.as_f64()),
        },
        _ => Cell::Missing,
    }
}

/// Parse delimited text into a table. Every cell is read as text.
pub fn load_reader<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AnalyticsError::Structure("missing header row".into()));
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        // A blank line between records is not a post.
        if record.iter().all(|c| c.trim().is_empty()) && record.len() <= 1 {
            continue;
        }
        rows.push(record.iter().map(Cell::from_text).collect());
    }
    tracing::debug!(columns = headers.len(), rows = rows.len(), "loaded csv");
    RawTable::new(headers, rows)
}
