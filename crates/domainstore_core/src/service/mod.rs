//! Store-level services.
//!
//! # Responsibility
//! - Own the database handle and transaction boundaries.
//! - Keep collaborators (HTTP handlers, CLI) decoupled from storage details.

pub mod domain_store;
