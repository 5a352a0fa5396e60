//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep presentation layers (CLI, desktop shell) decoupled from storage
//!   details.

pub mod note_service;
pub mod preference_service;
pub mod transfer_service;
