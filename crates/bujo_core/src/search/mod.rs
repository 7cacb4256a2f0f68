//! Entry search entry points.
//!
//! # Responsibility
//! - Expose owner-scoped query APIs over the typed entry stores.
//! - Keep search result shaping inside core.

pub mod entry_search;

pub use entry_search::{search_entries, SearchError, SearchHit, SearchQuery, SearchResults};
