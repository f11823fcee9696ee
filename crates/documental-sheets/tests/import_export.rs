use documental_core::kind::EntityKind;
use documental_core::model::{AnyRecord, FieldValue, Fondo, Record, RecordView, Subserie};
use documental_core::storage::Store;
use documental_sheets::codec::{SheetData, write_workbook};
use documental_sheets::export::{self, ExportOptions, cascade_sheets, default_headers};
use documental_sheets::import::{FILE_ROW, ImportRequest, import_rows};
use documental_sheets::tables::{ImportOptions, import_hierarchy, import_table};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn text_sheet(path: &Path, name: &str, headers: &[&str], rows: &[&[&str]]) {
    let data = SheetData {
        name: name.to_string(),
        headers: headers.iter().map(|h| (*h).to_string()).collect(),
        rows: rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|c| Some(FieldValue::Text((*c).to_string())))
                    .collect()
            })
            .collect(),
    };
    write_workbook(path, &[data], false).unwrap();
}

fn add(store: &Store, kind: EntityKind, codigo: &str, parent: Option<&str>) -> String {
    let mut rec = AnyRecord::empty(kind);
    rec.set("Codigo", FieldValue::Text(codigo.into())).unwrap();
    rec.set("Nombre", FieldValue::Text(format!("{kind} {codigo}")))
        .unwrap();
    if let (Some(key), Some(parent)) = (kind.parent_key(), parent) {
        rec.set(key, FieldValue::Text(parent.into())).unwrap();
    }
    store.insert_any(&mut rec).unwrap();
    rec.id().to_string()
}

fn scratch(tmp: &TempDir, name: &str) -> PathBuf {
    tmp.path().join(name)
}

#[test]
fn test_missing_header_rejects_whole_file() {
    let tmp = TempDir::new().unwrap();
    let path = scratch(&tmp, "fondos.xlsx");
    text_sheet(&path, "Datos", &["Codigo", "Observacion"], &[&["F1", ""], &["F2", ""]]);

    let request = ImportRequest {
        required_headers: &["Codigo", "Nombre"],
        sheet: None,
    };
    let outcome = import_rows(
        &path,
        &request,
        |row| Ok(row.get("codigo").unwrap_or_default().to_string()),
        |_: &String, _| Ok(false),
    );
    assert_eq!(outcome.detected, 0);
    assert!(outcome.entities.is_empty());
    assert!(outcome.rows.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].row, FILE_ROW);
    assert!(outcome.errors[0].message.contains("Nombre"));
}

#[test]
fn test_bad_row_is_isolated() {
    let tmp = TempDir::new().unwrap();
    let path = scratch(&tmp, "fondos.xlsx");
    text_sheet(
        &path,
        "Datos",
        &["Codigo", "Nombre"],
        &[
            &["F1", "Uno"],
            &["F2", "Dos"],
            &["", "Sin código"],
            &["F4", "Cuatro"],
            &["F5", "Cinco"],
        ],
    );

    let store = Store::open_in_memory().unwrap();
    let report = import_table(&store, EntityKind::Fondo, &path, &ImportOptions::default());
    assert_eq!(report.detected, 4);
    assert_eq!(report.inserted, 4);
    assert_eq!(report.errors.len(), 1);
    // Third data row sits on sheet row 4, under the header.
    assert_eq!(report.errors[0].row, 4);
    assert_eq!(store.count(EntityKind::Fondo).unwrap(), 4);
}

#[test]
fn test_export_then_reimport_finds_only_duplicates() {
    let tmp = TempDir::new().unwrap();
    let path = scratch(&tmp, "roundtrip.xlsx");
    let store = Store::open_in_memory().unwrap();
    for codigo in ["F1", "F2", "F3"] {
        add(&store, EntityKind::Fondo, codigo, None);
    }

    let headers: Vec<String> = ["Id", "Codigo", "Nombre", "Observacion"]
        .iter()
        .map(|h| (*h).to_string())
        .collect();
    let fondos: Vec<Fondo> = store.get_all().unwrap();
    export::export(&fondos, &path, &headers, &ExportOptions::default()).unwrap();

    let request = ImportRequest {
        required_headers: &["Id", "Codigo", "Nombre", "Observacion"],
        sheet: Some("Datos"),
    };
    let outcome = import_rows(
        &path,
        &request,
        |row| Fondo::from_text_fields(row.iter()).map_err(|e| e.to_string()),
        |f: &Fondo, _| store.exists_by_id(EntityKind::Fondo, &f.id).map_err(|e| e.to_string()),
    );
    assert_eq!(outcome.detected, 0);
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.duplicates.len(), 3);

    let report = import_table(&store, EntityKind::Fondo, &path, &ImportOptions::default());
    assert_eq!(report.inserted, 0);
    assert!(report.errors.is_empty());
    assert_eq!(report.duplicates.len(), 3);
    assert_eq!(store.count(EntityKind::Fondo).unwrap(), 3);
}

#[test]
fn test_child_import_requires_parent_table() {
    let tmp = TempDir::new().unwrap();
    let path = scratch(&tmp, "subfondos.xlsx");
    text_sheet(&path, "Datos", &["Codigo", "Nombre", "FondoCodigo"], &[&["SF1", "Uno", "F1"]]);

    let store = Store::open_in_memory().unwrap();
    let report = import_table(&store, EntityKind::Subfondo, &path, &ImportOptions::default());
    assert!(report.is_aborted());
    assert_eq!(report.errors[0].row, FILE_ROW);
    assert!(report.errors[0].message.contains("Fondos"));
}

#[test]
fn test_parent_resolved_by_id_then_codigo() {
    let tmp = TempDir::new().unwrap();
    let path = scratch(&tmp, "subfondos.xlsx");
    let store = Store::open_in_memory().unwrap();
    let f1 = add(&store, EntityKind::Fondo, "F1", None);
    let f2 = add(&store, EntityKind::Fondo, "F2", None);
    add(&store, EntityKind::Fondo, "F9", None);
    add(&store, EntityKind::Fondo, "F9", None);

    text_sheet(
        &path,
        "Datos",
        &["Codigo", "Nombre", "FondoId", "FondoCodigo"],
        &[
            &["SF1", "Por id", &f1, ""],
            &["SF2", "Por código", "", "F2"],
            &["SF3", "Id roto, código válido", "zzz", "F2"],
            &["SF4", "Sin padre", "", ""],
            &["SF5", "Código inexistente", "", "F7"],
            &["SF6", "Código ambiguo", "", "F9"],
        ],
    );

    let report = import_table(&store, EntityKind::Subfondo, &path, &ImportOptions::default());
    assert_eq!(report.inserted, 3);
    let rows: Vec<u32> = report.errors.iter().map(|e| e.row).collect();
    assert_eq!(rows, vec![5, 6, 7]);
    assert!(report.errors[2].message.contains("ambiguous"));

    let under_f2 = store.children_of(EntityKind::Subfondo, &f2).unwrap();
    let codes: Vec<&str> = under_f2.iter().map(|r| r.codigo()).collect();
    assert_eq!(codes, vec!["SF2", "SF3"]);
    assert_eq!(store.children_of(EntityKind::Subfondo, &f1).unwrap().len(), 1);
}

#[test]
fn test_codigo_duplicates_scoped_to_parent() {
    let tmp = TempDir::new().unwrap();
    let path = scratch(&tmp, "subfondos.xlsx");
    let store = Store::open_in_memory().unwrap();
    let f1 = add(&store, EntityKind::Fondo, "F1", None);
    add(&store, EntityKind::Fondo, "F2", None);
    add(&store, EntityKind::Subfondo, "SF1", Some(&f1));

    text_sheet(
        &path,
        "Datos",
        &["Codigo", "Nombre", "FondoCodigo"],
        &[
            &["SF1", "Ya existe", "F1"],
            &["SF1", "Mismo código, otro fondo", "F2"],
            &["SF2", "Nuevo", "F1"],
            &["SF2", "Repetido en el archivo", "F1"],
        ],
    );

    let report = import_table(&store, EntityKind::Subfondo, &path, &ImportOptions::default());
    assert_eq!(report.inserted, 2);
    assert!(report.errors.is_empty());
    let dup_rows: Vec<u32> = report.duplicates.iter().map(|e| e.row).collect();
    assert_eq!(dup_rows, vec![2, 5]);
}

#[test]
fn test_subserie_attributes_parsed_from_text() {
    let tmp = TempDir::new().unwrap();
    let path = scratch(&tmp, "subseries.xlsx");
    let store = Store::open_in_memory().unwrap();
    let mut parent = None;
    for (kind, codigo) in EntityKind::ALL.into_iter().zip(["F1", "SF1", "UA1", "OP1", "S1"]) {
        parent = Some(add(&store, kind, codigo, parent.as_deref()));
    }
    let serie_id = parent.unwrap();

    text_sheet(
        &path,
        "Datos",
        &["Codigo", "Nombre", "SerieId", "AG", "AC", "Papel", "Eliminacion", "FormatoDigital"],
        &[
            &["SS1", "Contratos", &serie_id, "2", "8", "Sí", "x", "PDF"],
            &["SS2", "Convenios", &serie_id, "dos", "8", "no", "", ""],
        ],
    );

    let report = import_table(&store, EntityKind::Subserie, &path, &ImportOptions::default());
    assert_eq!(report.inserted, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 3);
    assert!(report.errors[0].message.contains("AG"));

    let stored: Vec<Subserie> = store.get_all().unwrap();
    assert_eq!(stored[0].ag, 2);
    assert_eq!(stored[0].ac, 8);
    assert!(stored[0].papel);
    assert!(stored[0].eliminacion);
    assert_eq!(stored[0].formato_digital, "PDF");
}

#[test]
fn test_cascaded_export_reimports_into_empty_store() {
    let tmp = TempDir::new().unwrap();
    let path = scratch(&tmp, "cascade.xlsx");
    let source = Store::open_in_memory().unwrap();
    let codes = ["F1", "SF1", "UA1", "OP1", "S1", "SS1", "TD1"];
    let mut ids: Vec<String> = Vec::new();
    for (kind, codigo) in EntityKind::ALL.into_iter().zip(codes) {
        ids.push(add(&source, kind, codigo, ids.last().map(String::as_str)));
    }
    add(&source, EntityKind::TipoDocumental, "TD2", Some(&ids[5]));
    // A second tree that must not be exported.
    add(&source, EntityKind::Fondo, "F2", None);

    let sheets = cascade_sheets(&source, EntityKind::Fondo, Some(&ids[0])).unwrap();
    assert_eq!(sheets.len(), 7);
    assert_eq!(sheets[0].name, "Fondos");
    assert_eq!(sheets[0].records.len(), 1);
    assert_eq!(sheets[6].name, "TiposDocumentales");
    assert_eq!(sheets[6].records.len(), 2);
    assert_eq!(sheets[6].headers, default_headers(EntityKind::TipoDocumental));
    export::export_multiple(&sheets, &path, &ExportOptions::default()).unwrap();

    let target = Store::open_in_memory().unwrap();
    let reports = import_hierarchy(&target, &path).unwrap();
    assert_eq!(reports.len(), 7);
    assert!(reports.iter().all(|r| r.errors.is_empty()));
    assert_eq!(target.count(EntityKind::Fondo).unwrap(), 1);
    assert_eq!(target.count(EntityKind::TipoDocumental).unwrap(), 2);
    // Identifiers survive the trip.
    assert!(target.exists_by_id(EntityKind::Subserie, &ids[5]).unwrap());

    // Re-importing the same workbook inserts nothing.
    let again = import_hierarchy(&target, &path).unwrap();
    assert!(again.iter().all(|r| r.inserted == 0 && r.errors.is_empty()));
}

#[test]
fn test_hierarchy_import_needs_level_sheets() {
    let tmp = TempDir::new().unwrap();
    let path = scratch(&tmp, "other.xlsx");
    text_sheet(&path, "Hoja1", &["Codigo", "Nombre"], &[&["X", "Y"]]);
    let store = Store::open_in_memory().unwrap();
    assert!(import_hierarchy(&store, &path).is_err());
}

#[test]
fn test_unreadable_file_is_row_zero_error() {
    let tmp = TempDir::new().unwrap();
    let path = scratch(&tmp, "missing.xlsx");
    let store = Store::open_in_memory().unwrap();
    let report = import_table(&store, EntityKind::Fondo, &path, &ImportOptions::default());
    assert!(report.is_aborted());
    assert_eq!(report.errors.len(), 1);
}

#[test]
fn test_hierarchy_import_skips_empty_levels() {
    let tmp = TempDir::new().unwrap();
    let path = scratch(&tmp, "solo_fondo.xlsx");
    let source = Store::open_in_memory().unwrap();
    let fondo = add(&source, EntityKind::Fondo, "F1", None);

    let sheets = cascade_sheets(&source, EntityKind::Fondo, Some(&fondo)).unwrap();
    assert!(sheets[1..].iter().all(|s| s.records.is_empty()));
    export::export_multiple(&sheets, &path, &ExportOptions::default()).unwrap();

    let target = Store::open_in_memory().unwrap();
    let reports = import_hierarchy(&target, &path).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].kind, EntityKind::Fondo);
    assert_eq!(reports[0].inserted, 1);
}
