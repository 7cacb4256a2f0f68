//! Domain model for scanned journal pages and the entries derived from them.
//!
//! # Responsibility
//! - Define the page container and the four typed entry kinds.
//! - Expose the public kind enumeration (including the `habit` pseudo-kind).
//!
//! # Invariants
//! - An entry's store kind is fixed by its `EntryDetails` variant.
//! - `habit` is derived from an internal emotion tag and never stored as a kind.

pub mod entry;
pub mod page;

/// Owner reference for pages and entries.
pub type UserId = uuid::Uuid;

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
