use documental_core::kind::EntityKind;
use documental_core::model::{AnyRecord, FieldValue, RecordView};
use documental_core::storage::Store;
use documental_nav::lineage::Lineage;
use documental_nav::search::{SearchOptions, search, search_with_options};
use tempfile::TempDir;

const PREFIXES: [&str; 7] = ["F", "SF", "UA", "OP", "S", "SS", "TD"];

fn add(
    store: &Store,
    kind: EntityKind,
    codigo: &str,
    nombre: &str,
    parent: Option<&str>,
) -> String {
    let mut rec = AnyRecord::empty(kind);
    rec.set("Codigo", FieldValue::Text(codigo.into())).unwrap();
    rec.set("Nombre", FieldValue::Text(nombre.into())).unwrap();
    if let (Some(key), Some(parent)) = (kind.parent_key(), parent) {
        rec.set(key, FieldValue::Text(parent.into())).unwrap();
    }
    store.insert_any(&mut rec).unwrap();
    rec.id().to_string()
}

/// Chain F{n}.SF{n}…TD{n}; names are "<Kind> <n>" except where overridden.
fn chain(store: &Store, n: usize, names: &[(EntityKind, &str)]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for (kind, prefix) in EntityKind::ALL.into_iter().zip(PREFIXES) {
        let default_name = format!("{kind} {n}");
        let nombre = names
            .iter()
            .find(|(k, _)| *k == kind)
            .map_or(default_name.as_str(), |(_, name)| *name);
        let id = add(
            store,
            kind,
            &format!("{prefix}{n}"),
            nombre,
            ids.last().map(String::as_str),
        );
        ids.push(id);
    }
    ids
}

#[test]
fn test_full_code_composition() {
    let store = Store::open_in_memory().unwrap();
    chain(&store, 1, &[]);

    let results = search(&store, "TD1").unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].codigo_completo, "F1.SF1.UA1.OP1.S1.SS1.TD1");
    assert_eq!(results[0].matched, Some(EntityKind::TipoDocumental));
    assert_eq!(results[0].fondo, "Fondo 1");
    assert_eq!(results[0].tipo_documental, "TipoDocumental 1");
}

#[test]
fn test_subserie_and_leaf_match_yield_one_row() {
    let store = Store::open_in_memory().unwrap();
    chain(
        &store,
        1,
        &[
            (EntityKind::Subserie, "Contratos de obra"),
            (EntityKind::TipoDocumental, "Contratos firmados"),
        ],
    );

    let results = search(&store, "contratos").unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].matched, Some(EntityKind::TipoDocumental));
    assert_eq!(results[0].subserie, "Contratos de obra");
    assert_eq!(results[0].tipo_documental, "Contratos firmados");
}

#[test]
fn test_rows_ordered_leaf_first() {
    let store = Store::open_in_memory().unwrap();
    // Branch 1 matches at the Serie only, branch 2 at the Subserie only,
    // branch 3 at the leaf.
    chain(&store, 1, &[(EntityKind::Serie, "Actas")]);
    chain(&store, 2, &[(EntityKind::Subserie, "Actas de comité")]);
    chain(&store, 3, &[(EntityKind::TipoDocumental, "Acta de posesión")]);

    let results = search(&store, "ACTA").unwrap();
    let matched: Vec<_> = results.iter().map(|r| r.matched).collect();
    assert_eq!(
        matched,
        vec![
            Some(EntityKind::TipoDocumental),
            Some(EntityKind::Subserie),
            Some(EntityKind::Serie)
        ]
    );
    assert_eq!(results[1].tipo_documental, "");
    assert_eq!(results[1].codigo_completo, "F2.SF2.UA2.OP2.S2.SS2");
    assert_eq!(results[2].subserie, "");
    assert_eq!(results[2].codigo_completo, "F1.SF1.UA1.OP1.S1");
    assert_eq!(results[2].disposition, Default::default());
}

#[test]
fn test_disposition_copied_from_subserie() {
    let store = Store::open_in_memory().unwrap();
    let ids = chain(&store, 1, &[]);
    let mut ss = store.get_any(EntityKind::Subserie, &ids[5]).unwrap().unwrap();
    ss.set("AG", FieldValue::Int(3)).unwrap();
    ss.set("Eliminacion", FieldValue::Bool(true)).unwrap();
    ss.set("Procedimiento", FieldValue::Text("Eliminar".into())).unwrap();
    store.update_any(&ss).unwrap();

    let results = search(&store, "TD1").unwrap();
    assert_eq!(results[0].disposition.ag, 3);
    assert!(results[0].disposition.eliminacion);
    assert_eq!(results[0].disposition.procedimiento, "Eliminar");
}

#[test]
fn test_blank_query_returns_nothing() {
    let store = Store::open_in_memory().unwrap();
    chain(&store, 1, &[]);
    assert!(search(&store, "").unwrap().is_empty());
    assert!(search(&store, "   ").unwrap().is_empty());
}

#[test]
fn test_top_level_and_limit() {
    let store = Store::open_in_memory().unwrap();
    chain(&store, 1, &[(EntityKind::Fondo, "Archivo Central")]);
    chain(&store, 2, &[(EntityKind::Subfondo, "Archivo de gestión")]);

    assert!(search(&store, "archivo").unwrap().is_empty());

    let options = SearchOptions {
        top_level: EntityKind::Fondo,
        limit: 0,
    };
    let results = search_with_options(&store, "archivo", &options).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].matched, Some(EntityKind::Subfondo));
    assert_eq!(results[1].codigo_completo, "F1");

    let limited = SearchOptions {
        top_level: EntityKind::Fondo,
        limit: 1,
    };
    assert_eq!(search_with_options(&store, "archivo", &limited).unwrap().len(), 1);
}

#[test]
fn test_missing_links_leave_empty_segments() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("db.db3");
    let ids = {
        let store = Store::open(&path).unwrap();
        chain(&store, 1, &[])
    };
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute("DELETE FROM \"Subserie\" WHERE \"Id\" = ?1", [&ids[5]])
        .unwrap();
    drop(conn);

    let store = Store::open(&path).unwrap();
    let results = search(&store, "TD1").unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].codigo_completo, "......TD1");
    assert_eq!(results[0].fondo, "");
    assert_eq!(results[0].disposition, Default::default());

    let leaf = store.get_any(EntityKind::TipoDocumental, &ids[6]).unwrap().unwrap();
    let lineage = Lineage::resolve(&store, &leaf).unwrap();
    assert!(!lineage.is_complete());
}

#[test]
fn test_lineage_resolves_full_chain() {
    let store = Store::open_in_memory().unwrap();
    let ids = chain(&store, 4, &[]);
    let serie = store.get_any(EntityKind::Serie, &ids[4]).unwrap().unwrap();
    let lineage = Lineage::resolve(&store, &serie).unwrap();
    assert!(lineage.is_complete());
    assert_eq!(lineage.leaf(), EntityKind::Serie);
    assert_eq!(lineage.full_code(), "F4.SF4.UA4.OP4.S4");
    assert_eq!(lineage.name(EntityKind::UnidadAdministrativa), "UnidadAdministrativa 4");
    assert!(lineage.subserie().is_none());
}

#[test]
fn test_result_serializes_with_pascal_case_keys() {
    let store = Store::open_in_memory().unwrap();
    chain(&store, 1, &[]);
    let results = search(&store, "TD1").unwrap();
    let json = serde_json::to_value(&results[0]).unwrap();
    assert_eq!(json["CodigoCompleto"], "F1.SF1.UA1.OP1.S1.SS1.TD1");
    assert_eq!(json["TipoDocumental"], "TipoDocumental 1");
    assert_eq!(json["AG"], 0);
    assert_eq!(json["ConservacionTotal"], false);
}
