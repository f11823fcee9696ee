//! Per-level import: parent resolution, duplicate detection, and insertion.
//!
//! A non-root row names its parent by the `<Parent>Id` column, or failing that
//! by the `<Parent>Codigo` column. Duplicates are detected by `Id` when the row
//! has one, otherwise by Codigo among the same parent's children (among all
//! roots for Fondo).

use crate::SheetError;
use crate::codec;
use crate::import::{DUPLICATE, FILE_ROW, ImportRequest, RowData, RowError, import_rows};
use documental_core::kind::EntityKind;
use documental_core::model::{AnyRecord, FieldValue, RecordView, field_spec, fields_of, set_field};
use documental_core::storage::Store;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Headers every level's sheet must carry.
pub const REQUIRED_HEADERS: [&str; 2] = ["Codigo", "Nombre"];

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Sheet to read; the first sheet when `None`.
    pub sheet: Option<String>,
}

/// Summary of importing one level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableImportReport {
    pub kind: EntityKind,
    /// Rows that parsed and were not already stored.
    pub detected: usize,
    pub inserted: usize,
    pub errors: Vec<RowError>,
    /// Rows skipped because the record is already stored.
    pub duplicates: Vec<RowError>,
}

impl TableImportReport {
    fn aborted(kind: EntityKind, message: String) -> Self {
        Self {
            kind,
            detected: 0,
            inserted: 0,
            errors: vec![RowError::new(FILE_ROW, message)],
            duplicates: Vec::new(),
        }
    }

    /// True when the whole file was rejected.
    pub fn is_aborted(&self) -> bool {
        self.detected == 0 && self.errors.iter().any(|e| e.row == FILE_ROW)
    }
}

/// Build a record of `kind` from row text. Unknown headers are ignored.
fn build_record(kind: EntityKind, row: &RowData) -> Result<AnyRecord, String> {
    let mut record = AnyRecord::empty(kind);
    for (header, raw) in row.iter() {
        let Some(spec) = field_spec(fields_of(kind), header) else {
            continue;
        };
        let value = FieldValue::parse(spec.ty, raw)
            .ok_or_else(|| format!("invalid value '{raw}' for {}", spec.name))?;
        set_field(&mut record, spec.name, value).map_err(|e| e.to_string())?;
    }
    for field in REQUIRED_HEADERS {
        if record.text(field).trim().is_empty() {
            return Err(format!("{field} is required"));
        }
    }
    Ok(record)
}

/// Resolve the parent id of a row. `Ok(None)` for the root level.
fn resolve_parent(
    store: &Store,
    kind: EntityKind,
    record: &AnyRecord,
    row: &RowData,
) -> Result<Option<String>, String> {
    let Some(parent) = kind.parent() else {
        return Ok(None);
    };
    let id_column = parent.id_column();
    let codigo_column = parent.codigo_column();

    if let Some(id) = record.parent_id().filter(|id| !id.trim().is_empty()) {
        if store.exists_by_id(parent, id).map_err(|e| e.to_string())? {
            return Ok(Some(id.to_string()));
        }
        if row.non_empty(&codigo_column).is_none() {
            return Err(format!("{parent} '{id}' not found"));
        }
    }

    let Some(codigo) = row.non_empty(&codigo_column) else {
        return Err(format!(
            "missing parent reference: provide {id_column} or {codigo_column}"
        ));
    };
    let matches = store
        .find_by_codigo(parent, codigo)
        .map_err(|e| e.to_string())?;
    match matches.as_slice() {
        [one] => Ok(Some(one.id().to_string())),
        [] => Err(format!("{parent} with Codigo '{codigo}' not found")),
        _ => Err(format!(
            "{parent} Codigo '{codigo}' is ambiguous ({} matches); use {id_column}",
            matches.len()
        )),
    }
}

/// Duplicate rule: by Id when present, else by Codigo among siblings.
fn is_duplicate(
    store: &Store,
    kind: EntityKind,
    record: &AnyRecord,
    parent_id: Option<&str>,
) -> Result<bool, String> {
    let id = record.id().trim();
    if !id.is_empty() {
        return store.exists_by_id(kind, id).map_err(|e| e.to_string());
    }
    let codigo = record.codigo().trim();
    let siblings = match parent_id {
        Some(parent_id) => store.children_of(kind, parent_id),
        None => store.get_all_kind(kind),
    }
    .map_err(|e| e.to_string())?;
    Ok(siblings.iter().any(|s| s.codigo().trim() == codigo))
}

/// Import one level's sheet into the store.
///
/// Never fails as a call: structural problems come back as a row-0 error.
pub fn import_table(
    store: &Store,
    kind: EntityKind,
    path: &Path,
    options: &ImportOptions,
) -> TableImportReport {
    if let Some(parent) = kind.parent() {
        match store.count(parent) {
            Ok(0) => {
                return TableImportReport::aborted(
                    kind,
                    format!(
                        "no {} exist yet; import them before {}",
                        parent.plural(),
                        kind.plural()
                    ),
                );
            }
            Ok(_) => {}
            Err(err) => return TableImportReport::aborted(kind, err.to_string()),
        }
    }

    let request = ImportRequest {
        required_headers: &REQUIRED_HEADERS,
        sheet: options.sheet.as_deref(),
    };
    let mut outcome = import_rows(
        path,
        &request,
        |row| build_record(kind, row),
        |record: &AnyRecord, row: &RowData| match resolve_parent(store, kind, record, row) {
            Ok(parent_id) => is_duplicate(store, kind, record, parent_id.as_deref()),
            // Unresolvable parents are reported at insert time.
            Err(_) => Ok(false),
        },
    );

    let detected = outcome.detected;
    let mut errors = std::mem::take(&mut outcome.errors);
    let mut duplicates = std::mem::take(&mut outcome.duplicates);
    let mut inserted = 0;

    for (mut record, row) in outcome.into_pairs() {
        let parent_id = match resolve_parent(store, kind, &record, &row) {
            Ok(parent_id) => parent_id,
            Err(message) => {
                errors.push(RowError::new(row.row, message));
                continue;
            }
        };
        if let (Some(key), Some(parent_id)) = (kind.parent_key(), parent_id.as_deref())
            && let Err(err) = set_field(&mut record, key, FieldValue::Text(parent_id.to_string()))
        {
            errors.push(RowError::new(row.row, err.to_string()));
            continue;
        }
        // Earlier rows of this batch may already hold the same Codigo.
        match is_duplicate(store, kind, &record, parent_id.as_deref()) {
            Ok(true) => {
                duplicates.push(RowError::new(row.row, DUPLICATE));
                continue;
            }
            Ok(false) => {}
            Err(message) => {
                errors.push(RowError::new(row.row, message));
                continue;
            }
        }
        match store.insert_any(&mut record) {
            Ok(()) => inserted += 1,
            Err(err) => {
                warn!(row = row.row, error = %err, "insert failed");
                errors.push(RowError::new(row.row, err.to_string()));
            }
        }
    }

    errors.sort_by_key(|e| e.row);
    duplicates.sort_by_key(|e| e.row);
    info!(
        %kind,
        detected,
        inserted,
        errors = errors.len(),
        duplicates = duplicates.len(),
        "table import complete"
    );
    TableImportReport {
        kind,
        detected,
        inserted,
        errors,
        duplicates,
    }
}

/// Sheet of `names` holding `kind`: its plural tag or singular name.
fn sheet_for(kind: EntityKind, names: &[String]) -> Option<String> {
    names
        .iter()
        .find(|n| {
            let n = n.trim();
            n.eq_ignore_ascii_case(kind.plural()) || n.eq_ignore_ascii_case(kind.name())
        })
        .cloned()
}

/// Import a multi-sheet workbook whose sheets are named after the levels,
/// root first, so a cascaded export can be read back.
///
/// Level sheets holding only a header row are skipped.
pub fn import_hierarchy(store: &Store, path: &Path) -> Result<Vec<TableImportReport>, SheetError> {
    let names = codec::sheet_names(path)?;
    let mut reports = Vec::new();
    let mut found = false;
    for kind in EntityKind::ALL {
        let Some(sheet) = sheet_for(kind, &names) else {
            continue;
        };
        found = true;
        if codec::read_sheet(path, Some(&sheet))?.data().is_empty() {
            debug!(%kind, sheet = %sheet, "skipping empty level sheet");
            continue;
        }
        let options = ImportOptions { sheet: Some(sheet) };
        reports.push(import_table(store, kind, path, &options));
    }
    if !found {
        return Err(SheetError::MissingSheet {
            name: EntityKind::ALL
                .iter()
                .map(|k| k.plural())
                .collect::<Vec<_>>()
                .join(" | "),
            available: names,
        });
    }
    Ok(reports)
}
