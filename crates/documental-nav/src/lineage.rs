//! Ancestor chain of a record, resolved through parent links.

use documental_core::kind::EntityKind;
use documental_core::model::{AnyRecord, RecordView, Subserie};
use documental_core::storage::{Store, StoreError};
use std::collections::BTreeMap;

/// A record together with whichever ancestors could be found.
///
/// Resolution stops at the first missing link; levels above it stay empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineage {
    leaf: EntityKind,
    records: BTreeMap<EntityKind, AnyRecord>,
}

impl Lineage {
    /// Walk parent links upward from `record`.
    pub fn resolve(store: &Store, record: &AnyRecord) -> Result<Self, StoreError> {
        let leaf = record.kind();
        let mut records = BTreeMap::new();
        let mut current = record.clone();
        loop {
            let next = match (current.kind().parent(), current.parent_id()) {
                (Some(parent), Some(parent_id)) if !parent_id.is_empty() => {
                    store.get_any(parent, parent_id)?
                }
                _ => None,
            };
            records.insert(current.kind(), current);
            match next {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Ok(Self { leaf, records })
    }

    /// Level of the record the lineage was resolved from.
    pub fn leaf(&self) -> EntityKind {
        self.leaf
    }

    pub fn get(&self, kind: EntityKind) -> Option<&AnyRecord> {
        self.records.get(&kind)
    }

    /// Nombre at `kind`, empty when that link is missing.
    pub fn name(&self, kind: EntityKind) -> &str {
        self.get(kind).map_or("", |r| r.nombre())
    }

    pub fn codigo(&self, kind: EntityKind) -> &str {
        self.get(kind).map_or("", |r| r.codigo())
    }

    pub fn subserie(&self) -> Option<&Subserie> {
        self.get(EntityKind::Subserie).and_then(AnyRecord::as_subserie)
    }

    /// Dot-joined Codigo from the root down to the leaf. Missing links keep
    /// their position as empty segments.
    pub fn full_code(&self) -> String {
        EntityKind::ALL
            .iter()
            .take(self.leaf.depth() + 1)
            .map(|kind| self.codigo(*kind))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// True when every level from the root to the leaf was found.
    pub fn is_complete(&self) -> bool {
        self.records.len() == self.leaf.depth() + 1
    }
}
