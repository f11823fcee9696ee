//! The seven hierarchy levels and the static dispatch table shared by every engine.
//!
//! Fondo → Subfondo → UnidadAdministrativa → OficinaProductora → Serie → Subserie →
//! TipoDocumental.
//! Adding a level means adding one variant and one [`LevelSpec`] row.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A level of the archival classification hierarchy, root first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Fondo,
    Subfondo,
    UnidadAdministrativa,
    OficinaProductora,
    Serie,
    Subserie,
    TipoDocumental,
}

/// One row of the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSpec {
    pub kind: EntityKind,
    /// Singular kind name, also the SQL table name.
    pub name: &'static str,
    /// Plural list tag used by the UI boundary and as sheet name on export.
    pub plural: &'static str,
    pub parent: Option<EntityKind>,
    /// Column on this level that references the parent's `Id`.
    pub parent_key: Option<&'static str>,
    pub child: Option<EntityKind>,
}

const LEVELS: [LevelSpec; 7] = [
    LevelSpec {
        kind: EntityKind::Fondo,
        name: "Fondo",
        plural: "Fondos",
        parent: None,
        parent_key: None,
        child: Some(EntityKind::Subfondo),
    },
    LevelSpec {
        kind: EntityKind::Subfondo,
        name: "Subfondo",
        plural: "Subfondos",
        parent: Some(EntityKind::Fondo),
        parent_key: Some("FondoId"),
        child: Some(EntityKind::UnidadAdministrativa),
    },
    LevelSpec {
        kind: EntityKind::UnidadAdministrativa,
        name: "UnidadAdministrativa",
        plural: "UnidadesAdministrativas",
        parent: Some(EntityKind::Subfondo),
        parent_key: Some("SubfondoId"),
        child: Some(EntityKind::OficinaProductora),
    },
    LevelSpec {
        kind: EntityKind::OficinaProductora,
        name: "OficinaProductora",
        plural: "OficinasProductoras",
        parent: Some(EntityKind::UnidadAdministrativa),
        parent_key: Some("UnidadAdministrativaId"),
        child: Some(EntityKind::Serie),
    },
    LevelSpec {
        kind: EntityKind::Serie,
        name: "Serie",
        plural: "Series",
        parent: Some(EntityKind::OficinaProductora),
        parent_key: Some("OficinaProductoraId"),
        child: Some(EntityKind::Subserie),
    },
    LevelSpec {
        kind: EntityKind::Subserie,
        name: "Subserie",
        plural: "Subseries",
        parent: Some(EntityKind::Serie),
        parent_key: Some("SerieId"),
        child: Some(EntityKind::TipoDocumental),
    },
    LevelSpec {
        kind: EntityKind::TipoDocumental,
        name: "TipoDocumental",
        plural: "TiposDocumentales",
        parent: Some(EntityKind::Subserie),
        parent_key: Some("SubserieId"),
        child: None,
    },
];

/// Error returned when a table tag names no hierarchy level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity kind: {0}")]
pub struct UnknownKind(pub String);

impl EntityKind {
    /// All levels, root first.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Fondo,
        EntityKind::Subfondo,
        EntityKind::UnidadAdministrativa,
        EntityKind::OficinaProductora,
        EntityKind::Serie,
        EntityKind::Subserie,
        EntityKind::TipoDocumental,
    ];

    pub fn spec(self) -> &'static LevelSpec {
        &LEVELS[self.depth()]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn plural(self) -> &'static str {
        self.spec().plural
    }

    pub fn table(self) -> &'static str {
        self.spec().name
    }

    pub fn parent(self) -> Option<EntityKind> {
        self.spec().parent
    }

    pub fn parent_key(self) -> Option<&'static str> {
        self.spec().parent_key
    }

    pub fn child(self) -> Option<EntityKind> {
        self.spec().child
    }

    /// Zero-based level: 0 for Fondo, 6 for TipoDocumental.
    pub fn depth(self) -> usize {
        self as usize
    }

    pub fn is_root(self) -> bool {
        self.parent().is_none()
    }

    pub fn is_leaf(self) -> bool {
        self.child().is_none()
    }

    /// Ancestor levels, nearest first.
    pub fn ancestors(self) -> Vec<EntityKind> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(kind) = current {
            out.push(kind);
            current = kind.parent();
        }
        out
    }

    /// Descendant levels, nearest first.
    pub fn descendants(self) -> Vec<EntityKind> {
        let mut out = Vec::new();
        let mut current = self.child();
        while let Some(kind) = current {
            out.push(kind);
            current = kind.child();
        }
        out
    }

    /// Column holding the `Id` of this level's parent, as referenced from
    /// a child row (e.g. `Fondo` → `FondoId`).
    pub fn id_column(self) -> String {
        format!("{}Id", self.name())
    }

    /// Natural-key column naming a parent by Codigo (e.g. `Fondo` → `FondoCodigo`).
    pub fn codigo_column(self) -> String {
        format!("{}Codigo", self.name())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownKind;

    /// Accepts singular names and plural list tags, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LEVELS
            .iter()
            .find(|level| {
                level.name.eq_ignore_ascii_case(wanted) || level.plural.eq_ignore_ascii_case(wanted)
            })
            .map(|level| level.kind)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_indexed_by_depth() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.spec().kind, kind);
        }
    }

    #[test]
    fn test_parent_and_child_are_inverse() {
        for kind in EntityKind::ALL {
            if let Some(child) = kind.child() {
                assert_eq!(child.parent(), Some(kind));
            }
            if let Some(parent) = kind.parent() {
                assert_eq!(parent.child(), Some(kind));
            }
        }
    }

    #[test]
    fn test_parent_key_names_parent_id_column() {
        for kind in EntityKind::ALL {
            match kind.parent() {
                Some(parent) => assert_eq!(kind.parent_key(), Some(parent.id_column().as_str())),
                None => assert!(kind.parent_key().is_none()),
            }
        }
    }

    #[test]
    fn test_from_str_accepts_singular_and_plural() {
        assert_eq!("Fondo".parse::<EntityKind>().unwrap(), EntityKind::Fondo);
        assert_eq!(
            "UnidadesAdministrativas".parse::<EntityKind>().unwrap(),
            EntityKind::UnidadAdministrativa
        );
        assert_eq!(
            "tiposdocumentales".parse::<EntityKind>().unwrap(),
            EntityKind::TipoDocumental
        );
        assert!("Expediente".parse::<EntityKind>().is_err());
    }

    #[test]
    fn test_ancestors_and_descendants() {
        assert!(EntityKind::Fondo.ancestors().is_empty());
        assert_eq!(
            EntityKind::Serie.ancestors(),
            vec![
                EntityKind::OficinaProductora,
                EntityKind::UnidadAdministrativa,
                EntityKind::Subfondo,
                EntityKind::Fondo
            ]
        );
        assert_eq!(
            EntityKind::Serie.descendants(),
            vec![EntityKind::Subserie, EntityKind::TipoDocumental]
        );
        assert!(EntityKind::TipoDocumental.is_leaf());
    }
}
