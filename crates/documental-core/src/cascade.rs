//! Recursive subtree deletion.
//!
//! Depth-first, children before parent. Every step re-queries the current
//! children, so re-running a cascade after a partial failure resumes where it
//! stopped. The store is not transactional: nothing is rolled back.

use crate::kind::EntityKind;
use crate::model::RecordView;
use crate::storage::{Store, StoreError};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Records removed by a cascade, in deletion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub deleted: Vec<(EntityKind, String)>,
}

impl CascadeReport {
    pub fn len(&self) -> usize {
        self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty()
    }

    pub fn count_of(&self, kind: EntityKind) -> usize {
        self.deleted.iter().filter(|(k, _)| *k == kind).count()
    }
}

/// A cascade that hit a store failure. Siblings of the failing branch were
/// still processed; its ancestors were kept.
#[derive(Debug, thiserror::Error)]
#[error("cascade stopped after deleting {} record(s): {first}", .report.len())]
pub struct CascadeError {
    pub first: StoreError,
    pub report: CascadeReport,
}

/// How many records per level a cascade from `(kind, id)` would remove,
/// the root included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadePreview {
    pub counts: BTreeMap<EntityKind, usize>,
}

impl CascadePreview {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Descendants only, excluding the root record.
    pub fn descendants(&self, root: EntityKind) -> usize {
        self.total() - self.counts.get(&root).copied().unwrap_or(0)
    }
}

/// Delete `(kind, id)` and every transitive descendant.
///
/// A record that no longer exists is already satisfied and yields an empty report.
pub fn delete_cascade(
    store: &Store,
    kind: EntityKind,
    id: &str,
) -> Result<CascadeReport, CascadeError> {
    let mut report = CascadeReport::default();
    let mut first = None;
    walk(store, kind, id, &mut report, &mut first);
    match first {
        None => {
            info!(%kind, id, deleted = report.len(), "cascade delete complete");
            Ok(report)
        }
        Some(err) => Err(CascadeError { first: err, report }),
    }
}

/// [`delete_cascade`] keyed by a kind name or plural list tag.
pub fn delete_cascade_by_name(
    store: &Store,
    kind_name: &str,
    id: &str,
) -> Result<CascadeReport, CascadeError> {
    let kind: EntityKind = kind_name.parse().map_err(|e| CascadeError {
        first: StoreError::UnknownKind(e),
        report: CascadeReport::default(),
    })?;
    delete_cascade(store, kind, id)
}

/// Returns true when `(kind, id)` is gone afterwards.
fn walk(
    store: &Store,
    kind: EntityKind,
    id: &str,
    report: &mut CascadeReport,
    first: &mut Option<StoreError>,
) -> bool {
    let mut clean = true;
    if let Some(child) = kind.child() {
        match store.children_of(child, id) {
            Ok(children) => {
                for record in children {
                    if !walk(store, child, record.id(), report, first) {
                        clean = false;
                    }
                }
            }
            Err(err) => {
                record_failure(first, kind, id, err);
                return false;
            }
        }
    }
    if !clean {
        return false;
    }
    match store.remove_row(kind, id) {
        Ok(true) => {
            report.deleted.push((kind, id.to_string()));
            true
        }
        Ok(false) => true,
        Err(err) => {
            record_failure(first, kind, id, err);
            false
        }
    }
}

fn record_failure(first: &mut Option<StoreError>, kind: EntityKind, id: &str, err: StoreError) {
    warn!(%kind, id, error = %err, "cascade step failed");
    if first.is_none() {
        *first = Some(err);
    }
}

/// Count what a cascade from `(kind, id)` would remove. Empty when the record is absent.
pub fn preview_cascade(
    store: &Store,
    kind: EntityKind,
    id: &str,
) -> Result<CascadePreview, StoreError> {
    let mut preview = CascadePreview::default();
    if !store.exists_by_id(kind, id)? {
        return Ok(preview);
    }
    preview.counts.insert(kind, 1);
    let mut frontier = vec![id.to_string()];
    let mut level = kind;
    while let Some(child) = level.child() {
        let mut next = Vec::new();
        for parent_id in &frontier {
            next.extend(
                store
                    .children_of(child, parent_id)?
                    .into_iter()
                    .map(|r| r.id().to_string()),
            );
        }
        if next.is_empty() {
            break;
        }
        preview.counts.insert(child, next.len());
        frontier = next;
        level = child;
    }
    Ok(preview)
}

/// Outcome of a confirmed or unconfirmed delete request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DeleteOutcome {
    /// The record had no children and was removed directly.
    Deleted,
    /// The record was already gone.
    NotFound,
    /// The record and its subtree were removed.
    Cascaded(CascadeReport),
}

impl Store {
    /// Delete a record, cascading only when the caller has confirmed it.
    ///
    /// Without confirmation a record with direct children is refused with
    /// [`StoreError::HasChildren`].
    pub fn delete_record(
        &self,
        kind: EntityKind,
        id: &str,
        confirm_cascade: bool,
    ) -> Result<DeleteOutcome, CascadeError> {
        let fail = |first: StoreError| CascadeError {
            first,
            report: CascadeReport::default(),
        };
        if self.has_related_records(kind, id).map_err(fail)? {
            if !confirm_cascade {
                return Err(fail(StoreError::HasChildren {
                    kind,
                    id: id.to_string(),
                }));
            }
            return delete_cascade(self, kind, id).map(DeleteOutcome::Cascaded);
        }
        if self.delete_by_id(kind, id).map_err(fail)? {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }
}
