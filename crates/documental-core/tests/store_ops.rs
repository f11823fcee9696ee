use documental_core::kind::EntityKind;
use documental_core::model::{
    AnyRecord, FieldValue, Fondo, ModelError, Record, RecordView, Serie, Subfondo, Subserie,
    TipoDocumental,
};
use documental_core::route::TableRoute;
use documental_core::storage::{self, Store, StoreError};
use std::path::PathBuf;
use tempfile::TempDir;

fn fondo(codigo: &str, nombre: &str) -> Fondo {
    Fondo {
        codigo: codigo.to_string(),
        nombre: nombre.to_string(),
        ..Fondo::default()
    }
}

fn subfondo(codigo: &str, fondo_id: &str) -> Subfondo {
    Subfondo {
        codigo: codigo.to_string(),
        nombre: format!("Subfondo {codigo}"),
        fondo_id: fondo_id.to_string(),
        ..Subfondo::default()
    }
}

#[test]
fn test_insert_assigns_id_and_reads_back() {
    let store = Store::open_in_memory().unwrap();
    let mut f = fondo("F1", "Alcaldía");
    store.insert(&mut f).unwrap();
    assert!(!f.id.is_empty());

    let loaded: Fondo = store.get_by_id(&f.id).unwrap().unwrap();
    assert_eq!(loaded, f);
    assert_eq!(store.get_all::<Fondo>().unwrap().len(), 1);
    assert!(store.get_by_id::<Fondo>("missing").unwrap().is_none());
}

#[test]
fn test_insert_keeps_supplied_id_and_rejects_duplicate() {
    let store = Store::open_in_memory().unwrap();
    let mut f = fondo("F1", "Alcaldía");
    f.id = "fondo-1".to_string();
    store.insert(&mut f).unwrap();
    assert_eq!(f.id, "fondo-1");

    let err = store.insert(&mut f.clone()).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { .. }));
}

#[test]
fn test_insert_requires_codigo_and_nombre() {
    let store = Store::open_in_memory().unwrap();
    let err = store.insert(&mut fondo("F1", " ")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Model(ModelError::Required { field: "Nombre", .. })
    ));
    assert_eq!(store.count(EntityKind::Fondo).unwrap(), 0);
}

#[test]
fn test_insert_rejects_missing_parent() {
    let store = Store::open_in_memory().unwrap();
    let err = store.insert(&mut subfondo("SF1", "nope")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::MissingParent {
            kind: EntityKind::Subfondo,
            parent: EntityKind::Fondo,
            ..
        }
    ));
}

#[test]
fn test_update_replaces_fields() {
    let store = Store::open_in_memory().unwrap();
    let mut f = fondo("F1", "Alcaldía");
    store.insert(&mut f).unwrap();

    f.nombre = "Gobernación".to_string();
    f.observacion = "renombrado".to_string();
    store.update(&f).unwrap();

    let loaded: Fondo = store.get_by_id(&f.id).unwrap().unwrap();
    assert_eq!(loaded.nombre, "Gobernación");
    assert_eq!(loaded.observacion, "renombrado");
}

#[test]
fn test_update_absent_record_fails() {
    let store = Store::open_in_memory().unwrap();
    let mut f = fondo("F1", "Alcaldía");
    f.id = "ghost".to_string();
    assert!(matches!(
        store.update(&f).unwrap_err(),
        StoreError::NotFound { .. }
    ));
}

#[test]
fn test_subserie_attributes_roundtrip() {
    let store = Store::open_in_memory().unwrap();
    let mut serie = AnyRecord::empty(EntityKind::Serie);
    serie.set("Codigo", FieldValue::Text("S1".into())).unwrap();
    serie.set("Nombre", FieldValue::Text("Contratos".into())).unwrap();
    serie
        .set("OficinaProductoraId", FieldValue::Text("op".into()))
        .unwrap();
    // Parent is missing, so build the chain properly first.
    assert!(store.insert_any(&mut serie).is_err());

    let mut f = fondo("F1", "Alcaldía");
    store.insert(&mut f).unwrap();
    let mut parent_id = f.id.clone();
    for kind in [
        EntityKind::Subfondo,
        EntityKind::UnidadAdministrativa,
        EntityKind::OficinaProductora,
        EntityKind::Serie,
    ] {
        let mut rec = AnyRecord::empty(kind);
        rec.set("Codigo", FieldValue::Text(format!("{kind}1"))).unwrap();
        rec.set("Nombre", FieldValue::Text(kind.name().into())).unwrap();
        rec.set(kind.parent_key().unwrap(), FieldValue::Text(parent_id))
            .unwrap();
        store.insert_any(&mut rec).unwrap();
        parent_id = rec.id().to_string();
    }

    let mut ss = Subserie {
        codigo: "SS1".into(),
        nombre: "Contratos de obra".into(),
        serie_id: parent_id,
        ag: 2,
        ac: 18,
        papel: true,
        formato_digital: "PDF".into(),
        conservacion_total: true,
        procedimiento: "Digitalizar".into(),
        ..Subserie::default()
    };
    store.insert(&mut ss).unwrap();

    let loaded: Subserie = store.get_by_id(&ss.id).unwrap().unwrap();
    assert_eq!(loaded, ss);
    assert_eq!(loaded.get("AC"), Some(FieldValue::Int(18)));
}

#[test]
fn test_has_related_records_is_one_level() {
    let store = Store::open_in_memory().unwrap();
    let mut f = fondo("F1", "Alcaldía");
    store.insert(&mut f).unwrap();
    assert!(!store.has_related_records(EntityKind::Fondo, &f.id).unwrap());

    let mut sf = subfondo("SF1", &f.id);
    store.insert(&mut sf).unwrap();
    assert!(store.has_related_records(EntityKind::Fondo, &f.id).unwrap());
    assert!(store.has_related_records_by_name("Fondos", &f.id).unwrap());
    assert!(!store.has_related_records(EntityKind::Subfondo, &sf.id).unwrap());
    assert!(!store.has_related_records(EntityKind::TipoDocumental, &sf.id).unwrap());
    assert!(matches!(
        store.has_related_records_by_name("Expedientes", &f.id),
        Err(StoreError::UnknownKind(_))
    ));
}

#[test]
fn test_delete_refuses_records_with_children() {
    let store = Store::open_in_memory().unwrap();
    let mut f = fondo("F1", "Alcaldía");
    store.insert(&mut f).unwrap();
    let mut sf = subfondo("SF1", &f.id);
    store.insert(&mut sf).unwrap();

    assert!(matches!(
        store.delete(&f).unwrap_err(),
        StoreError::HasChildren { .. }
    ));
    assert!(store.delete(&sf).unwrap());
    assert!(!store.delete(&sf).unwrap());
    assert!(store.delete(&f).unwrap());
    assert_eq!(store.count(EntityKind::Fondo).unwrap(), 0);
}

#[test]
fn test_codigo_queries_trim_input() {
    let store = Store::open_in_memory().unwrap();
    let mut f = fondo("F1", "Alcaldía");
    store.insert(&mut f).unwrap();

    assert!(store.exists_by_codigo::<Fondo>("  F1 ").unwrap());
    assert!(!store.exists_by_codigo::<Fondo>("F").unwrap());
    assert!(!store.exists_by_codigo::<Serie>("F1").unwrap());
    assert_eq!(store.find_by_codigo(EntityKind::Fondo, "F1 ").unwrap().len(), 1);
}

#[test]
fn test_children_of_and_route_listing() {
    let store = Store::open_in_memory().unwrap();
    let mut a = fondo("F1", "Uno");
    let mut b = fondo("F2", "Dos");
    store.insert(&mut a).unwrap();
    store.insert(&mut b).unwrap();
    for codigo in ["SF1", "SF2"] {
        store.insert(&mut subfondo(codigo, &a.id)).unwrap();
    }
    store.insert(&mut subfondo("SF3", &b.id)).unwrap();

    let under_a = store.children_of(EntityKind::Subfondo, &a.id).unwrap();
    let codes: Vec<&str> = under_a.iter().map(|r| r.codigo()).collect();
    assert_eq!(codes, vec!["SF1", "SF2"]);
    assert!(store.children_of(EntityKind::Fondo, &a.id).unwrap().is_empty());

    let scoped = TableRoute::parse(&format!("tableName=Subfondos&parentId={}", b.id)).unwrap();
    assert_eq!(store.list_for_route(&scoped).unwrap().len(), 1);
    let all = TableRoute::parse("tableName=Subfondos").unwrap();
    assert_eq!(store.list_for_route(&all).unwrap().len(), 3);
}

#[test]
fn test_tagged_union_preserves_kind() {
    let store = Store::open_in_memory().unwrap();
    let mut f = fondo("F1", "Alcaldía");
    store.insert(&mut f).unwrap();

    let any = store.get_any(EntityKind::Fondo, &f.id).unwrap().unwrap();
    assert_eq!(any.kind(), EntityKind::Fondo);
    assert_eq!(Fondo::from_any(any.clone()), Some(f));
    assert_eq!(TipoDocumental::from_any(any), None);
}

#[test]
fn test_store_persists_across_reopen() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    assert!(!storage::db_exists(root, "documental.db3"));

    let id = {
        let store = Store::open_project(root, "documental.db3").unwrap();
        let mut f = fondo("F1", "Alcaldía");
        store.insert(&mut f).unwrap();
        f.id
    };

    assert!(storage::db_exists(root, "documental.db3"));
    let store = Store::open_project(root, "documental.db3").unwrap();
    assert!(store.exists_by_id(EntityKind::Fondo, &id).unwrap());
}

#[test]
fn test_open_rejects_other_schema_version() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("old.db3");
    drop(Store::open(&path).unwrap());

    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute("UPDATE schema_version SET version = 99", [])
        .unwrap();
    drop(conn);

    assert!(matches!(
        Store::open(&path).unwrap_err(),
        StoreError::SchemaVersion { found: 99, .. }
    ));
}

#[test]
fn test_data_dir_and_file_paths() {
    let root = PathBuf::from("/project");
    assert_eq!(storage::data_dir(&root), PathBuf::from("/project/.documental"));
    assert_eq!(
        storage::db_file(&root, "documental.db3"),
        PathBuf::from("/project/.documental/documental.db3")
    );
}

#[test]
fn test_ensure_gitignore_appends_once() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join(".gitignore"), "target/").unwrap();
    assert!(!storage::ensure_gitignore(tmp.path()).unwrap());
    assert!(storage::ensure_gitignore(tmp.path()).unwrap());
    let content = std::fs::read_to_string(tmp.path().join(".gitignore")).unwrap();
    assert_eq!(content.matches(".documental/").count(), 1);
}
