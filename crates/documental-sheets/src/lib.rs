//! Spreadsheet surface for the classification hierarchy.
//!
//! - [`codec`]: reading with calamine, writing with rust_xlsxwriter
//! - [`import`]: generic row engine with per-row error collection
//! - [`tables`]: per-level import with parent resolution and duplicate checks
//! - [`export`]: single-table and cascaded multi-sheet export

pub mod codec;
pub mod export;
pub mod import;
pub mod tables;

use std::path::PathBuf;

/// Errors raised by the spreadsheet surface as a whole call.
///
/// Row-level problems are never errors; they are reported as [`import::RowError`].
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("failed to open workbook {}: {message}", .path.display())]
    Open { path: PathBuf, message: String },
    #[error("sheet '{name}' not found (available: {})", .available.join(", "))]
    MissingSheet { name: String, available: Vec<String> },
    #[error("workbook has no worksheet")]
    NoSheets,
    #[error("invalid timestamp format '{0}'")]
    TimestampFormat(String),
    #[error("failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error(transparent)]
    Store(#[from] documental_core::storage::StoreError),
}
