//! SQL schema generated from the level table and field lists, plus version handling.

use crate::kind::EntityKind;
use crate::model::{FieldType, fields_of};
use rusqlite::{Connection, OptionalExtension, params};

/// Store schema version written to `schema_version` on creation.
pub const CURRENT_VERSION: i64 = 1;

fn sql_type(ty: FieldType) -> &'static str {
    match ty {
        FieldType::Text => "TEXT NOT NULL DEFAULT ''",
        FieldType::Int | FieldType::Bool => "INTEGER NOT NULL DEFAULT 0",
    }
}

/// `CREATE TABLE` statement for one level, columns in field-list order.
pub fn create_table_sql(kind: EntityKind) -> String {
    let columns: Vec<String> = fields_of(kind)
        .iter()
        .map(|f| {
            if f.name == "Id" {
                "\"Id\" TEXT PRIMARY KEY NOT NULL".to_string()
            } else {
                format!("\"{}\" {}", f.name, sql_type(f.ty))
            }
        })
        .collect();
    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS \"{}\" ({});",
        kind.table(),
        columns.join(", ")
    );
    if let Some(key) = kind.parent_key() {
        sql.push_str(&format!(
            "\nCREATE INDEX IF NOT EXISTS \"idx_{table}_{key}\" ON \"{table}\"(\"{key}\");",
            table = kind.table(),
        ));
    }
    sql
}

/// Full DDL for every level, root first.
pub fn create_all_sql() -> String {
    let mut sql =
        String::from("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);\n");
    for kind in EntityKind::ALL {
        sql.push_str(&create_table_sql(kind));
        sql.push('\n');
    }
    sql
}

/// Read the stored version, `None` for a database that was never initialized.
pub fn stored_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
        [],
        |row| row.get(0),
    )?;
    if !has_table {
        return Ok(None);
    }
    conn.query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
        row.get(0)
    })
    .optional()
}

/// Record the current version if none is stored yet.
pub fn stamp_version(conn: &Connection) -> rusqlite::Result<()> {
    let existing: Option<i64> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()?;
    if existing.is_none() {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            params![CURRENT_VERSION],
        )?;
    }
    Ok(())
}
