//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define store contracts for pages and the four typed entry tables.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Entry writes enforce `Entry::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in addition
//!   to DB transport errors.

pub mod entry_repo;
pub mod page_repo;
