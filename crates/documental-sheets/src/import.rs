//! Generic spreadsheet → entity batch engine.
//!
//! The engine reads, builds, and checks rows; it never writes to the store.
//! Structural problems (unreadable file, missing sheet, no data rows,
//! missing required headers) yield a single row-0 error and nothing else.
//! Every other problem is an error for that row only.

use crate::codec::{self, Grid};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Row number used for errors about the whole file.
pub const FILE_ROW: u32 = 0;

pub(crate) const DUPLICATE: &str = "duplicate: record already exists";

/// A problem with one spreadsheet row. `row` is the 1-based sheet row
/// (the header is row 1), or 0 for the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: u32,
    pub message: String,
}

impl RowError {
    pub fn new(row: u32, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.row == FILE_ROW {
            f.write_str(&self.message)
        } else {
            write!(f, "row {}: {}", self.row, self.message)
        }
    }
}

/// Trimmed cell text of one data row, keyed by header (case-insensitive).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowData {
    pub row: u32,
    values: BTreeMap<String, String>,
}

impl RowData {
    pub fn new(row: u32) -> Self {
        Self {
            row,
            values: BTreeMap::new(),
        }
    }

    /// Set a value unless the header already has one.
    pub fn insert(&mut self, header: &str, value: impl Into<String>) {
        self.values
            .entry(header.trim().to_lowercase())
            .or_insert_with(|| value.into());
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.values
            .get(&header.trim().to_lowercase())
            .map(String::as_str)
    }

    /// Value for `header`, `None` when absent or blank.
    pub fn non_empty(&self, header: &str) -> Option<&str> {
        self.get(header).filter(|v| !v.is_empty())
    }

    /// `(lowercased header, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_blank(&self) -> bool {
        self.values.values().all(String::is_empty)
    }
}

/// Result of reading a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportOutcome<T> {
    /// Rows that built a non-duplicate entity.
    pub detected: usize,
    pub errors: Vec<RowError>,
    /// Rows skipped because the entity is already stored.
    pub duplicates: Vec<RowError>,
    pub entities: Vec<T>,
    /// Raw row data for each entity, same order.
    pub rows: Vec<RowData>,
}

impl<T> ImportOutcome<T> {
    fn failed(error: RowError) -> Self {
        Self {
            detected: 0,
            errors: vec![error],
            duplicates: Vec::new(),
            entities: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Pairs each entity with its row data.
    pub fn into_pairs(self) -> impl Iterator<Item = (T, RowData)> {
        self.entities.into_iter().zip(self.rows)
    }
}

/// What to read and which headers must be present.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportRequest<'a> {
    pub required_headers: &'a [&'a str],
    /// Sheet to read; the first sheet when `None`.
    pub sheet: Option<&'a str>,
}

/// Read `path` and build one entity per data row.
///
/// `build` turns a row into an entity (its `Err` text becomes the row's
/// error). `exists` reports whether the entity is already stored; such rows
/// are reported in `duplicates` and skipped.
pub fn import_rows<T, B, E>(
    path: &Path,
    request: &ImportRequest<'_>,
    build: B,
    exists: E,
) -> ImportOutcome<T>
where
    B: FnMut(&RowData) -> Result<T, String>,
    E: FnMut(&T, &RowData) -> Result<bool, String>,
{
    let grid = match codec::read_sheet(path, request.sheet) {
        Ok(grid) => grid,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "import aborted");
            return ImportOutcome::failed(RowError::new(FILE_ROW, err.to_string()));
        }
    };
    import_grid(&grid, request.required_headers, build, exists)
}

/// [`import_rows`] over an already-read sheet.
pub fn import_grid<T, B, E>(
    grid: &Grid,
    required_headers: &[&str],
    mut build: B,
    mut exists: E,
) -> ImportOutcome<T>
where
    B: FnMut(&RowData) -> Result<T, String>,
    E: FnMut(&T, &RowData) -> Result<bool, String>,
{
    let Some(header) = grid.header().filter(|_| grid.rows.len() >= 2) else {
        return ImportOutcome::failed(RowError::new(
            FILE_ROW,
            format!(
                "sheet '{}' needs a header row and at least one data row",
                grid.sheet
            ),
        ));
    };

    // First occurrence wins on duplicate header text.
    let mut columns: Vec<(usize, String)> = Vec::new();
    for (idx, text) in header.iter().enumerate() {
        let key = text.trim().to_lowercase();
        if !key.is_empty() && !columns.iter().any(|(_, k)| *k == key) {
            columns.push((idx, key));
        }
    }

    let missing: Vec<&str> = required_headers
        .iter()
        .filter(|h| !columns.iter().any(|(_, k)| k.eq_ignore_ascii_case(h.trim())))
        .copied()
        .collect();
    if !missing.is_empty() {
        return ImportOutcome::failed(RowError::new(
            FILE_ROW,
            format!("missing required header(s): {}", missing.join(", ")),
        ));
    }

    let mut outcome = ImportOutcome {
        detected: 0,
        errors: Vec::new(),
        duplicates: Vec::new(),
        entities: Vec::new(),
        rows: Vec::new(),
    };

    for (row_number, cells) in grid.data() {
        let mut data = RowData::new(*row_number);
        for (idx, key) in &columns {
            let value = cells.get(*idx).map_or("", |s| s.trim());
            data.insert(key, value);
        }
        if data.is_blank() {
            debug!(row = row_number, "skipping blank row");
            continue;
        }

        let entity = match build(&data) {
            Ok(entity) => entity,
            Err(message) => {
                warn!(row = row_number, %message, "row rejected");
                outcome.errors.push(RowError::new(*row_number, message));
                continue;
            }
        };
        match exists(&entity, &data) {
            Ok(false) => {
                outcome.detected += 1;
                outcome.entities.push(entity);
                outcome.rows.push(data);
            }
            Ok(true) => {
                debug!(row = row_number, "duplicate row skipped");
                outcome
                    .duplicates
                    .push(RowError::new(*row_number, DUPLICATE));
            }
            Err(message) => outcome.errors.push(RowError::new(*row_number, message)),
        }
    }

    outcome
}
