//! Domain model for notes, transfer documents and preferences.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep JSON transfer shapes separate from the persisted record.
//!
//! # Invariants
//! - Every persisted note is identified by a stable, namespaced id.
//! - Deletion is represented by soft-delete tombstones, not hard delete.

pub mod config;
pub mod note;
pub mod transfer;
