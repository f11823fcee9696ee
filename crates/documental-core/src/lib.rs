//! Core types and storage for the archival classification hierarchy.
//!
//! Provides the seven-level entity model ([`kind::EntityKind`], [`model::AnyRecord`]),
//! the SQLite-backed record store ([`storage::Store`]), recursive cascade deletion,
//! navigation routes, and configuration loading.

pub mod cascade;
pub mod config;
pub mod kind;
pub mod model;
pub mod route;
pub mod schema;
pub mod storage;
