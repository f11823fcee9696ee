//! Navigation over the classification hierarchy.
//!
//! Provides free-text search producing fully-qualified codes ([`search`]),
//! ancestor chain resolution ([`lineage`]), and list filtering ([`filter`]).

pub mod filter;
pub mod lineage;
pub mod search;
