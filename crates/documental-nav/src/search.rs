//! Free-text search across the hierarchy.
//!
//! Levels are scanned one at a time from the leaf upward. Every hit resolves
//! its ancestor chain by point lookups and becomes one [`SearchResult`]
//! carrying the names per level and the fully-qualified code. A hit on a
//! higher level is dropped when a row from a lower level already carries the
//! same name at that level, so a branch matching at several levels yields one
//! row.

use crate::filter;
use crate::lineage::Lineage;
use documental_core::kind::EntityKind;
use documental_core::model::{RecordView, Subserie};
use documental_core::storage::{Store, StoreError};
use serde::Serialize;
use tracing::debug;

/// Search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Highest level scanned. Levels above it never produce rows of their own.
    pub top_level: EntityKind,
    /// Maximum number of rows, 0 for no limit.
    pub limit: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_level: EntityKind::Serie,
            limit: 0,
        }
    }
}

/// Retention and disposition attributes of the Subserie on a result row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Disposition {
    #[serde(rename = "AG")]
    pub ag: i64,
    #[serde(rename = "AC")]
    pub ac: i64,
    pub papel: bool,
    pub electronico: bool,
    pub formato_digital: String,
    pub conservacion_total: bool,
    pub eliminacion: bool,
    pub medios_tecnologicos: bool,
    pub seleccion: bool,
    pub procedimiento: String,
}

impl From<&Subserie> for Disposition {
    fn from(s: &Subserie) -> Self {
        Self {
            ag: s.ag,
            ac: s.ac,
            papel: s.papel,
            electronico: s.electronico,
            formato_digital: s.formato_digital.clone(),
            conservacion_total: s.conservacion_total,
            eliminacion: s.eliminacion,
            medios_tecnologicos: s.medios_tecnologicos,
            seleccion: s.seleccion,
            procedimiento: s.procedimiento.clone(),
        }
    }
}

/// One search hit projected over the whole chain. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchResult {
    /// Level the query matched at.
    pub matched: Option<EntityKind>,
    pub matched_id: String,
    pub fondo: String,
    pub subfondo: String,
    pub unidad_administrativa: String,
    pub oficina_productora: String,
    pub serie: String,
    pub subserie: String,
    pub tipo_documental: String,
    pub codigo_completo: String,
    #[serde(flatten)]
    pub disposition: Disposition,
}

impl SearchResult {
    fn from_lineage(lineage: &Lineage) -> Self {
        Self {
            matched: Some(lineage.leaf()),
            matched_id: lineage
                .get(lineage.leaf())
                .map(|r| r.id().to_string())
                .unwrap_or_default(),
            fondo: lineage.name(EntityKind::Fondo).to_string(),
            subfondo: lineage.name(EntityKind::Subfondo).to_string(),
            unidad_administrativa: lineage.name(EntityKind::UnidadAdministrativa).to_string(),
            oficina_productora: lineage.name(EntityKind::OficinaProductora).to_string(),
            serie: lineage.name(EntityKind::Serie).to_string(),
            subserie: lineage.name(EntityKind::Subserie).to_string(),
            tipo_documental: lineage.name(EntityKind::TipoDocumental).to_string(),
            codigo_completo: lineage.full_code(),
            disposition: lineage.subserie().map(Disposition::from).unwrap_or_default(),
        }
    }

    /// Name carried at `kind`.
    pub fn name_at(&self, kind: EntityKind) -> &str {
        match kind {
            EntityKind::Fondo => &self.fondo,
            EntityKind::Subfondo => &self.subfondo,
            EntityKind::UnidadAdministrativa => &self.unidad_administrativa,
            EntityKind::OficinaProductora => &self.oficina_productora,
            EntityKind::Serie => &self.serie,
            EntityKind::Subserie => &self.subserie,
            EntityKind::TipoDocumental => &self.tipo_documental,
        }
    }
}

/// Search with default options.
pub fn search(store: &Store, query: &str) -> Result<Vec<SearchResult>, StoreError> {
    search_with_options(store, query, &SearchOptions::default())
}

/// Search every level from the leaf up to `options.top_level`.
///
/// Rows come out leaf matches first, then each higher level's new matches in
/// turn; there is no further sorting. A blank query returns nothing.
pub fn search_with_options(
    store: &Store,
    query: &str,
    options: &SearchOptions,
) -> Result<Vec<SearchResult>, StoreError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let mut results: Vec<SearchResult> = Vec::new();
    let mut level = EntityKind::TipoDocumental;
    loop {
        let before = results.len();
        for record in store.get_all_kind(level)? {
            if !filter::matches(&record, query) {
                continue;
            }
            if results[..before]
                .iter()
                .any(|row| row.name_at(level) == record.nombre())
            {
                continue;
            }
            let lineage = Lineage::resolve(store, &record)?;
            results.push(SearchResult::from_lineage(&lineage));
            if options.limit > 0 && results.len() >= options.limit {
                debug!(query, rows = results.len(), "search hit limit");
                return Ok(results);
            }
        }
        debug!(query, %level, rows = results.len() - before, "searched level");

        if level == options.top_level {
            break;
        }
        match level.parent() {
            Some(parent) => level = parent,
            None => break,
        }
    }
    Ok(results)
}
