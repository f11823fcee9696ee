//! Record store facade over the embedded SQLite database.
//!
//! One table per level, columns taken from the level's field list. Every call
//! round-trips to the database; there is no cache and no transaction spanning
//! more than one statement.

use crate::kind::{EntityKind, UnknownKind};
use crate::model::{
    AnyRecord, FieldType, FieldValue, ModelError, Record, RecordView, Slot, fields_of, set_field,
    validate,
};
use crate::schema;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const DATA_DIR: &str = ".documental";

/// Errors raised by the record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("failed to prepare store directory: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    UnknownKind(#[from] UnknownKind),
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },
    #[error("{kind} '{id}' already exists")]
    AlreadyExists { kind: EntityKind, id: String },
    #[error("{kind} references missing {parent} '{parent_id}'")]
    MissingParent {
        kind: EntityKind,
        parent: EntityKind,
        parent_id: String,
    },
    #[error("{kind} '{id}' has related records; delete them first or confirm a cascade")]
    HasChildren { kind: EntityKind, id: String },
    #[error("store schema version {found} is not supported (expected {expected})")]
    SchemaVersion { found: i64, expected: i64 },
}

/// Directory holding the database and configuration for a project root.
pub fn data_dir(project_root: &Path) -> PathBuf {
    project_root.join(DATA_DIR)
}

/// Path of the database file for a project root.
pub fn db_file(project_root: &Path, file_name: &str) -> PathBuf {
    data_dir(project_root).join(file_name)
}

/// Check if a store has been created under the project root.
pub fn db_exists(project_root: &Path, file_name: &str) -> bool {
    db_file(project_root, file_name).exists()
}

/// Ensure `.documental/` is in .gitignore. Returns true if it was already there.
pub fn ensure_gitignore(project_root: &Path) -> std::io::Result<bool> {
    let gitignore = project_root.join(".gitignore");

    if gitignore.exists() {
        let content = fs::read_to_string(&gitignore)?;
        if content
            .lines()
            .any(|line| line.trim() == DATA_DIR || line.trim() == ".documental/")
        {
            return Ok(true);
        }
        let mut new_content = content;
        if !new_content.ends_with('\n') {
            new_content.push('\n');
        }
        new_content.push_str("\n# documental record store\n.documental/\n");
        fs::write(&gitignore, new_content)?;
    } else {
        fs::write(&gitignore, "# documental record store\n.documental/\n")?;
    }

    Ok(false)
}

/// Typed CRUD and relation queries for the seven levels.
pub struct Store {
    conn: Connection,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl Store {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.create_tables()?;
        debug!(path = %path.display(), "opened record store");
        Ok(store)
    }

    /// Open the project's database under `.documental/`.
    pub fn open_project(project_root: &Path, file_name: &str) -> Result<Self, StoreError> {
        Self::open(&db_file(project_root, file_name))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.create_tables()?;
        Ok(store)
    }

    /// Create every level table if missing and verify the schema version.
    pub fn create_tables(&self) -> Result<(), StoreError> {
        if let Some(found) = schema::stored_version(&self.conn)?
            && found != schema::CURRENT_VERSION
        {
            return Err(StoreError::SchemaVersion {
                found,
                expected: schema::CURRENT_VERSION,
            });
        }
        self.conn.execute_batch(&schema::create_all_sql())?;
        schema::stamp_version(&self.conn)?;
        Ok(())
    }

    // ---- typed facade ----

    pub fn get_all<T: Record>(&self) -> Result<Vec<T>, StoreError> {
        Ok(self
            .get_all_kind(T::KIND)?
            .into_iter()
            .filter_map(T::from_any)
            .collect())
    }

    pub fn get_by_id<T: Record>(&self, id: &str) -> Result<Option<T>, StoreError> {
        Ok(self.get_any(T::KIND, id)?.and_then(T::from_any))
    }

    /// Persist a new record, assigning a fresh identifier when it has none.
    pub fn insert<T: Record>(&self, record: &mut T) -> Result<(), StoreError> {
        if record.id().trim().is_empty() {
            record.set_id(uuid::Uuid::new_v4().to_string());
        }
        self.insert_view(record)
    }

    /// Replace every mutable field of an existing record.
    pub fn update<T: Record>(&self, record: &T) -> Result<(), StoreError> {
        self.update_view(record)
    }

    /// Remove a record by its id. Returns false when it was already gone.
    pub fn delete<T: Record>(&self, record: &T) -> Result<bool, StoreError> {
        self.delete_by_id(T::KIND, record.id())
    }

    /// Trimmed, exact-match existence check on Codigo.
    pub fn exists_by_codigo<T: Record>(&self, codigo: &str) -> Result<bool, StoreError> {
        let sql = format!(
            "SELECT COUNT(*) FROM \"{}\" WHERE TRIM(\"Codigo\") = ?1",
            T::KIND.table()
        );
        let n: i64 = self
            .conn
            .query_row(&sql, params![codigo.trim()], |row| row.get(0))?;
        Ok(n > 0)
    }

    // ---- kind-dispatched facade ----

    pub fn insert_any(&self, record: &mut AnyRecord) -> Result<(), StoreError> {
        if record.id().trim().is_empty() {
            set_field(
                record,
                "Id",
                FieldValue::Text(uuid::Uuid::new_v4().to_string()),
            )?;
        }
        self.insert_view(record)
    }

    pub fn update_any(&self, record: &AnyRecord) -> Result<(), StoreError> {
        self.update_view(record)
    }

    /// Remove a record that has no direct children. Returns false when absent.
    pub fn delete_by_id(&self, kind: EntityKind, id: &str) -> Result<bool, StoreError> {
        if self.has_related_records(kind, id)? {
            return Err(StoreError::HasChildren {
                kind,
                id: id.to_string(),
            });
        }
        let removed = self.remove_row(kind, id)?;
        if removed {
            debug!(%kind, id, "deleted record");
        }
        Ok(removed)
    }

    /// Unchecked row removal used once the subtree below is known to be empty.
    pub(crate) fn remove_row(&self, kind: EntityKind, id: &str) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM \"{}\" WHERE \"Id\" = ?1", kind.table());
        Ok(self.conn.execute(&sql, params![id])? > 0)
    }

    pub fn get_all_kind(&self, kind: EntityKind) -> Result<Vec<AnyRecord>, StoreError> {
        self.select(kind, None, &[])
    }

    pub fn get_any(&self, kind: EntityKind, id: &str) -> Result<Option<AnyRecord>, StoreError> {
        Ok(self
            .select(kind, Some("\"Id\" = ?1"), &[Value::Text(id.to_string())])?
            .into_iter()
            .next())
    }

    pub fn exists_by_id(&self, kind: EntityKind, id: &str) -> Result<bool, StoreError> {
        let sql = format!("SELECT 1 FROM \"{}\" WHERE \"Id\" = ?1", kind.table());
        Ok(self
            .conn
            .query_row(&sql, params![id], |_| Ok(()))
            .optional()?
            .is_some())
    }

    /// Records of `kind` whose parent key equals `parent_id`. Empty for the root level.
    pub fn children_of(
        &self,
        kind: EntityKind,
        parent_id: &str,
    ) -> Result<Vec<AnyRecord>, StoreError> {
        let Some(key) = kind.parent_key() else {
            return Ok(Vec::new());
        };
        let filter = format!("\"{key}\" = ?1");
        self.select(kind, Some(&filter), &[Value::Text(parent_id.to_string())])
    }

    /// Records of `kind` whose trimmed Codigo equals `codigo`.
    pub fn find_by_codigo(
        &self,
        kind: EntityKind,
        codigo: &str,
    ) -> Result<Vec<AnyRecord>, StoreError> {
        self.select(
            kind,
            Some("TRIM(\"Codigo\") = ?1"),
            &[Value::Text(codigo.trim().to_string())],
        )
    }

    pub fn count(&self, kind: EntityKind) -> Result<usize, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", kind.table());
        let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or_default())
    }

    /// True iff at least one direct child references `parent_id`.
    /// Always false for the leaf level. Checks one level only.
    pub fn has_related_records(
        &self,
        kind: EntityKind,
        parent_id: &str,
    ) -> Result<bool, StoreError> {
        let Some(child) = kind.child() else {
            return Ok(false);
        };
        let Some(key) = child.parent_key() else {
            return Ok(false);
        };
        let sql = format!(
            "SELECT COUNT(*) FROM \"{}\" WHERE \"{key}\" = ?1",
            child.table()
        );
        let n: i64 = self
            .conn
            .query_row(&sql, params![parent_id], |row| row.get(0))?;
        Ok(n > 0)
    }

    /// [`Store::has_related_records`] keyed by a kind name or plural list tag.
    pub fn has_related_records_by_name(
        &self,
        kind_name: &str,
        parent_id: &str,
    ) -> Result<bool, StoreError> {
        let kind: EntityKind = kind_name.parse()?;
        self.has_related_records(kind, parent_id)
    }

    // ---- internals ----

    fn check_parent<R: RecordView + ?Sized>(&self, record: &R) -> Result<(), StoreError> {
        let kind = record.kind();
        let (Some(parent), Some(parent_id)) = (kind.parent(), record.parent_id()) else {
            return Ok(());
        };
        if parent_id.trim().is_empty() || !self.exists_by_id(parent, parent_id)? {
            return Err(StoreError::MissingParent {
                kind,
                parent,
                parent_id: parent_id.to_string(),
            });
        }
        Ok(())
    }

    fn insert_view<R: RecordView + ?Sized>(&self, record: &R) -> Result<(), StoreError> {
        let kind = record.kind();
        validate(record)?;
        self.check_parent(record)?;
        if self.exists_by_id(kind, record.id())? {
            return Err(StoreError::AlreadyExists {
                kind,
                id: record.id().to_string(),
            });
        }
        let fields = fields_of(kind);
        let columns: Vec<String> = fields.iter().map(|f| format!("\"{}\"", f.name)).collect();
        let placeholders: Vec<String> = (1..=fields.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            kind.table(),
            columns.join(", "),
            placeholders.join(", ")
        );
        self.conn.execute(&sql, params_from_iter(bind_values(record)))?;
        debug!(%kind, id = record.id(), "inserted record");
        Ok(())
    }

    fn update_view<R: RecordView + ?Sized>(&self, record: &R) -> Result<(), StoreError> {
        let kind = record.kind();
        if !self.exists_by_id(kind, record.id())? {
            return Err(StoreError::NotFound {
                kind,
                id: record.id().to_string(),
            });
        }
        validate(record)?;
        self.check_parent(record)?;
        let fields = fields_of(kind);
        let assignments: Vec<String> = fields
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, f)| format!("\"{}\" = ?{}", f.name, i + 1))
            .collect();
        let sql = format!(
            "UPDATE \"{}\" SET {} WHERE \"Id\" = ?1",
            kind.table(),
            assignments.join(", ")
        );
        self.conn.execute(&sql, params_from_iter(bind_values(record)))?;
        debug!(%kind, id = record.id(), "updated record");
        Ok(())
    }

    fn select(
        &self,
        kind: EntityKind,
        filter: Option<&str>,
        args: &[Value],
    ) -> Result<Vec<AnyRecord>, StoreError> {
        let columns: Vec<String> = fields_of(kind)
            .iter()
            .map(|f| format!("\"{}\"", f.name))
            .collect();
        let mut sql = format!("SELECT {} FROM \"{}\"", columns.join(", "), kind.table());
        if let Some(filter) = filter {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        sql.push_str(" ORDER BY rowid");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| read_values(kind, row))?;
        let mut out = Vec::new();
        for values in rows {
            let mut record = AnyRecord::empty(kind);
            for (spec, value) in fields_of(kind).iter().zip(values?) {
                set_field(&mut record, spec.name, value)?;
            }
            out.push(record);
        }
        Ok(out)
    }
}

fn read_values(kind: EntityKind, row: &Row<'_>) -> rusqlite::Result<Vec<FieldValue>> {
    fields_of(kind)
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            Ok(match spec.ty {
                FieldType::Text => {
                    FieldValue::Text(row.get::<_, Option<String>>(i)?.unwrap_or_default())
                }
                FieldType::Int => {
                    FieldValue::Int(row.get::<_, Option<i64>>(i)?.unwrap_or_default())
                }
                FieldType::Bool => {
                    FieldValue::Bool(row.get::<_, Option<i64>>(i)?.unwrap_or_default() != 0)
                }
            })
        })
        .collect()
}

fn bind_values<R: RecordView + ?Sized>(record: &R) -> Vec<Value> {
    record
        .field_specs()
        .iter()
        .map(|spec| match record.slot(spec.name) {
            Some(Slot::Text(s)) => Value::Text(s.to_string()),
            Some(Slot::Int(n)) => Value::Integer(n),
            Some(Slot::Bool(b)) => Value::Integer(i64::from(b)),
            None => Value::Null,
        })
        .collect()
}
