//! Records → spreadsheet.
//!
//! Export never filters or transforms: each row is the named fields of one
//! record in header order, with an empty cell for any header the record does
//! not have.

use crate::SheetError;
use crate::codec::{self, SheetData};
use chrono::NaiveDateTime;
use documental_core::config::{ExportConfig, is_valid_timestamp_format};
use documental_core::kind::EntityKind;
use documental_core::model::{AnyRecord, RecordView, fields_of};
use documental_core::storage::{Store, StoreError};
use std::fmt::Write;
use std::path::Path;
use tracing::info;

/// Timestamp format used in generated file names.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Sheet name for single-table exports.
    pub sheet_name: String,
    pub autofit: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            sheet_name: "Datos".to_string(),
            autofit: true,
        }
    }
}

impl From<&ExportConfig> for ExportOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            sheet_name: config.sheet_name.clone(),
            autofit: config.autofit,
        }
    }
}

/// A named sheet of records for [`export_multiple`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub records: Vec<AnyRecord>,
}

/// The field list of a level: Id, Codigo, Nombre, Observacion, parent key, extras.
pub fn default_headers(kind: EntityKind) -> Vec<String> {
    fields_of(kind).iter().map(|f| f.name.to_string()).collect()
}

fn sheet_data<R: RecordView>(name: &str, headers: &[String], records: &[R]) -> SheetData {
    SheetData {
        name: name.to_string(),
        headers: headers.to_vec(),
        rows: records
            .iter()
            .map(|r| headers.iter().map(|h| r.get(h)).collect())
            .collect(),
    }
}

/// Write `records` to one sheet at `path`, row 1 = `headers` verbatim.
pub fn export<R: RecordView>(
    records: &[R],
    path: &Path,
    headers: &[String],
    options: &ExportOptions,
) -> Result<(), SheetError> {
    let data = sheet_data(&options.sheet_name, headers, records);
    codec::write_workbook(path, &[data], options.autofit)?;
    info!(path = %path.display(), rows = records.len(), "exported sheet");
    Ok(())
}

/// Write one sheet per entry into a single workbook.
pub fn export_multiple(
    sheets: &[NamedSheet],
    path: &Path,
    options: &ExportOptions,
) -> Result<(), SheetError> {
    let data: Vec<SheetData> = sheets
        .iter()
        .map(|s| sheet_data(&s.name, &s.headers, &s.records))
        .collect();
    codec::write_workbook(path, &data, options.autofit)?;
    info!(
        path = %path.display(),
        sheets = sheets.len(),
        rows = sheets.iter().map(|s| s.records.len()).sum::<usize>(),
        "exported workbook"
    );
    Ok(())
}

/// One sheet per level from `kind` down to the leaf, named by plural tag.
///
/// With `root_id`, the first sheet holds that record and each following sheet
/// the children of the previous one. Without it, whole tables are exported.
/// Levels with no records still get a sheet with headers only.
pub fn cascade_sheets(
    store: &Store,
    kind: EntityKind,
    root_id: Option<&str>,
) -> Result<Vec<NamedSheet>, StoreError> {
    let mut levels = vec![kind];
    levels.extend(kind.descendants());

    let mut sheets = Vec::with_capacity(levels.len());
    let mut previous: Option<Vec<AnyRecord>> = None;
    for level in levels {
        let records = match (root_id, &previous) {
            (None, _) => store.get_all_kind(level)?,
            (Some(id), None) => store.get_any(level, id)?.into_iter().collect(),
            (Some(_), Some(parents)) => {
                let mut out = Vec::new();
                for parent in parents {
                    out.extend(store.children_of(level, parent.id())?);
                }
                out
            }
        };
        sheets.push(NamedSheet {
            name: level.plural().to_string(),
            headers: default_headers(level),
            records: records.clone(),
        });
        previous = Some(records);
    }
    Ok(sheets)
}

/// `<Plural>_<yyyyMMddHHmmss>.xlsx`.
pub fn export_file_name(
    kind: EntityKind,
    timestamp: &NaiveDateTime,
) -> Result<String, SheetError> {
    export_file_name_with(kind, timestamp, DEFAULT_TIMESTAMP_FORMAT)
}

/// [`export_file_name`] with a custom chrono format. A format chrono cannot
/// render is a [`SheetError::TimestampFormat`].
pub fn export_file_name_with(
    kind: EntityKind,
    timestamp: &NaiveDateTime,
    format: &str,
) -> Result<String, SheetError> {
    let bad_format = || SheetError::TimestampFormat(format.to_string());
    if !is_valid_timestamp_format(format) {
        return Err(bad_format());
    }
    let mut name = format!("{}_", kind.plural());
    write!(name, "{}", timestamp.format(format)).map_err(|_| bad_format())?;
    name.push_str(".xlsx");
    Ok(name)
}
