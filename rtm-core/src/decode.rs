//! File decoder
//!
//! Turns an uploaded workbook or delimited-text file into ordered header
//! names and one [`RawRow`] per non-blank data row.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::Timelike;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Cursor;

use crate::error::ImportError;

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Comma-delimited text
    Delimited,
    /// Any workbook calamine can read (first sheet only)
    Workbook,
}

impl FileKind {
    /// Infer the kind from a declared extension (with or without leading dot)
    pub fn from_extension(ext: &str) -> Result<Self, ImportError> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "csv" | "txt" => Ok(FileKind::Delimited),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(FileKind::Workbook),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// One decoded data row: header name -> raw cell value, in header order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    cells: Vec<(String, String)>,
}

impl RawRow {
    /// Build a row from header/value pairs
    pub fn new<H, V>(cells: impl IntoIterator<Item = (H, V)>) -> Self
    where
        H: Into<String>,
        V: Into<String>,
    {
        Self {
            cells: cells
                .into_iter()
                .map(|(h, v)| (h.into(), v.into()))
                .collect(),
        }
    }

    /// Value at `header`, or None if the row has no such column
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_empty())
    }
}

/// Result of decoding one uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedFile {
    pub file_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Decode an uploaded file, choosing the reader from its extension
///
/// The whole file either decodes or is rejected; there is no partial result.
pub fn decode_file(file_name: &str, bytes: &[u8]) -> Result<DecodedFile, ImportError> {
    let ext = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let kind = FileKind::from_extension(ext)?;
    let (headers, rows) = decode(bytes, kind)?;

    debug!(
        "Decoded {}: {} columns, {} rows",
        file_name,
        headers.len(),
        rows.len()
    );

    Ok(DecodedFile {
        file_name: file_name.to_string(),
        headers,
        rows,
    })
}

/// Decode raw bytes of a known kind into headers and rows
pub fn decode(bytes: &[u8], kind: FileKind) -> Result<(Vec<String>, Vec<RawRow>), ImportError> {
    let grid = match kind {
        FileKind::Delimited => read_delimited(bytes)?,
        FileKind::Workbook => read_workbook(bytes)?,
    };
    build_rows(grid)
}

fn read_delimited(bytes: &[u8]) -> Result<Vec<Vec<String>>, ImportError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ImportError::Parse(e.to_string()))?;
        grid.push(record.iter().map(|c| c.to_string()).collect());
    }
    Ok(grid)
}

fn read_workbook(bytes: &[u8]) -> Result<Vec<Vec<String>>, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::Parse(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::Parse("Workbook contains no sheets".to_string()))?
        .map_err(|e| ImportError::Parse(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(dt) if !dt.is_duration() => match dt.as_datetime() {
            Some(ts) if ts.num_seconds_from_midnight() == 0 => ts.format("%Y-%m-%d").to_string(),
            Some(ts) => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => cell.to_string(),
        },
        Data::DateTimeIso(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Turn a grid of cells into headers and rows, enforcing the header row plus
/// at least one data row
fn build_rows(grid: Vec<Vec<String>>) -> Result<(Vec<String>, Vec<RawRow>), ImportError> {
    let mut lines = grid
        .into_iter()
        .map(|cells| cells.into_iter().map(|c| c.trim().to_string()).collect::<Vec<_>>())
        .filter(|cells| cells.iter().any(|c| !c.is_empty()));

    let header_cells = lines.next().ok_or_else(|| {
        ImportError::Parse("File must contain a header row and at least one data row".to_string())
    })?;
    let headers = unique_headers(header_cells);

    let rows: Vec<RawRow> = lines
        .map(|cells| {
            RawRow::new(
                headers
                    .iter()
                    .enumerate()
                    .map(|(i, h)| (h.clone(), cells.get(i).cloned().unwrap_or_default())),
            )
        })
        .collect();

    if rows.is_empty() {
        return Err(ImportError::Parse(
            "File must contain a header row and at least one data row".to_string(),
        ));
    }

    Ok((headers, rows))
}

/// Name blank headers by position and suffix duplicates so every header is
/// a distinct key
fn unique_headers(cells: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut headers = Vec::with_capacity(cells.len());

    for (i, cell) in cells.into_iter().enumerate() {
        let base = if cell.is_empty() {
            format!("Column {}", i + 1)
        } else {
            cell
        };

        let mut name = base.clone();
        let mut n = 2;
        while !seen.insert(name.clone()) {
            name = format!("{} ({})", base, n);
            n += 1;
        }
        headers.push(name);
    }

    headers
}
