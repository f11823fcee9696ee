//! Navigation parameters exchanged with a UI shell:
//! `tableName=Subfondos&id=new&parentId=…&parentKey=FondoId`.

use crate::kind::{EntityKind, UnknownKind};
use crate::model::AnyRecord;
use crate::storage::{Store, StoreError};
use serde::Serialize;
use std::fmt;

/// The record a route points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RecordRef {
    /// Sentinel for a record that is about to be created.
    New,
    Existing(String),
}

impl RecordRef {
    /// `new`, empty and `0` all mean a new record.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "0" || raw.eq_ignore_ascii_case("new") {
            Self::New
        } else {
            Self::Existing(raw.to_string())
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::New => None,
            Self::Existing(id) => Some(id),
        }
    }
}

/// Restricts a child-table listing to the descendants of one parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentScope {
    pub parent_id: String,
    pub parent_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRoute {
    pub kind: EntityKind,
    pub record: Option<RecordRef>,
    pub parent: Option<ParentScope>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("route is missing tableName")]
    MissingTable,
    #[error(transparent)]
    UnknownKind(#[from] UnknownKind),
    #[error("{kind} is not scoped by '{found}'")]
    ParentKeyMismatch { kind: EntityKind, found: String },
    #[error("parentKey given without parentId")]
    MissingParentId,
    #[error("{0} is a root level and has no parent")]
    RootHasNoParent(EntityKind),
    #[error("malformed route segment '{0}'")]
    Malformed(String),
}

impl TableRoute {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            record: None,
            parent: None,
        }
    }

    /// Scope the route to children of `parent_id`, using the kind's parent-key column.
    pub fn scoped(kind: EntityKind, parent_id: impl Into<String>) -> Result<Self, RouteError> {
        let key = kind.parent_key().ok_or(RouteError::RootHasNoParent(kind))?;
        Ok(Self {
            kind,
            record: None,
            parent: Some(ParentScope {
                parent_id: parent_id.into(),
                parent_key: key.to_string(),
            }),
        })
    }

    /// Parse a `key=value&…` route. Keys are case-insensitive; unknown keys are ignored.
    pub fn parse(query: &str) -> Result<Self, RouteError> {
        let query = query.trim().trim_start_matches('?');
        let mut table = None;
        let mut record = None;
        let mut parent_id = None;
        let mut parent_key = None;

        for segment in query.split('&').filter(|s| !s.trim().is_empty()) {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| RouteError::Malformed(segment.to_string()))?;
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "tablename" => table = Some(value.parse::<EntityKind>()?),
                "id" => record = Some(RecordRef::parse(value)),
                "parentid" if !value.is_empty() => parent_id = Some(value.to_string()),
                "parentkey" if !value.is_empty() => parent_key = Some(value.to_string()),
                _ => {}
            }
        }

        let kind = table.ok_or(RouteError::MissingTable)?;
        let parent = match (parent_id, parent_key) {
            (None, None) => None,
            (None, Some(_)) => return Err(RouteError::MissingParentId),
            (Some(parent_id), key) => {
                let expected = kind.parent_key();
                let parent_key = match (key, expected) {
                    (Some(found), Some(expected)) if found.eq_ignore_ascii_case(expected) => {
                        expected.to_string()
                    }
                    (None, Some(expected)) => expected.to_string(),
                    (_, None) => return Err(RouteError::RootHasNoParent(kind)),
                    (found, _) => {
                        return Err(RouteError::ParentKeyMismatch {
                            kind,
                            found: found.unwrap_or_default(),
                        });
                    }
                };
                Some(ParentScope {
                    parent_id,
                    parent_key,
                })
            }
        };

        Ok(Self {
            kind,
            record,
            parent,
        })
    }

    pub fn to_query(&self) -> String {
        let mut out = format!("tableName={}", self.kind.plural());
        match &self.record {
            Some(RecordRef::New) => out.push_str("&id=new"),
            Some(RecordRef::Existing(id)) => out.push_str(&format!("&id={id}")),
            None => {}
        }
        if let Some(scope) = &self.parent {
            out.push_str(&format!(
                "&parentId={}&parentKey={}",
                scope.parent_id, scope.parent_key
            ));
        }
        out
    }
}

impl fmt::Display for TableRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query())
    }
}

impl Store {
    /// Records listed by a route: parent-scoped when the route has a scope,
    /// the whole table otherwise.
    pub fn list_for_route(&self, route: &TableRoute) -> Result<Vec<AnyRecord>, StoreError> {
        match &route.parent {
            Some(scope) => self.children_of(route.kind, &scope.parent_id),
            None => self.get_all_kind(route.kind),
        }
    }
}
