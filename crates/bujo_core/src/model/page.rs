//! Journal page model.
//!
//! # Invariants
//! - `extracted_text` is written once at creation; re-extraction reads it back
//!   instead of mutating it.
//! - `is_manual` is set at creation and never changes.

use super::{now_epoch_ms, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a journal page.
pub type PageId = Uuid;

/// Thread id tagging the per-user container for manually created entries.
pub const MANUAL_ENTRY_THREAD: &str = "MANUAL_ENTRY";

/// One scanned page, or the synthetic container holding manual entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub owner_id: UserId,
    /// Raw OCR text. Empty for manual pages and failed OCR runs.
    pub extracted_text: String,
    /// Position of the page in the journal. Manual pages use `0`.
    pub page_number: i64,
    pub thread_id: Option<String>,
    pub is_manual: bool,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

impl Page {
    /// Creates a page for one scanned image.
    pub fn scanned(
        owner_id: UserId,
        extracted_text: impl Into<String>,
        page_number: i64,
        thread_id: Option<String>,
    ) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            extracted_text: extracted_text.into(),
            page_number,
            thread_id,
            is_manual: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates the manual-entry container for `owner_id`.
    pub fn manual(owner_id: UserId) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            extracted_text: String::new(),
            page_number: 0,
            thread_id: Some(MANUAL_ENTRY_THREAD.to_string()),
            is_manual: true,
            created_at: now,
            updated_at: now,
        }
    }
}
