//! Entry kind migration between typed stores.
//!
//! # Responsibility
//! - Extract the portable fields of a stored entry.
//! - Merge request overrides and re-create the entry in its destination store.
//!
//! # Invariants
//! - The caller runs this inside one transaction; a failure after the delete
//!   must roll back with it.
//! - Migrated entries land on the owner's manual page with no symbol and no
//!   scan position.
//! - Requesting `habit` yields an Emotion-store record reported as `habit`.

use super::page_service::ensure_manual_page;
use super::request::{compose_content, validate_title, EntryRequest};
use super::ServiceResult;
use crate::model::entry::{Entry, EntryDetails, EntryType};
use crate::repo::entry_repo::EntryRepository;
use crate::repo::page_repo::PageRepository;
use chrono::NaiveDate;
use log::info;

/// Title used when neither the request nor the source carries any text.
pub const UNTITLED_ENTRY: &str = "Untitled Entry";

/// Fields that survive a change of kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortableFields {
    pub content: String,
    pub completed: bool,
    pub event_date: Option<NaiveDate>,
}

impl PortableFields {
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            content: entry.content.clone(),
            completed: entry.is_completed(),
            event_date: entry.event_date(),
        }
    }

    /// Applies request overrides; request fields win when present.
    pub fn merge(self, request: &EntryRequest) -> ServiceResult<Self> {
        let title = match request.title.as_deref() {
            Some(title) => validate_title(title)?,
            None if self.content.trim().is_empty() => UNTITLED_ENTRY.to_string(),
            None => self.content.trim().to_string(),
        };

        Ok(Self {
            content: compose_content(&title, request.notes.as_deref()),
            completed: request.completed.unwrap_or(self.completed),
            event_date: request.event_date().or(self.event_date),
        })
    }
}

/// Moves `source` into the store of `target`.
///
/// The source row is deleted and a fresh entry with a new id is inserted on
/// the owner's manual page. Ownership must already be checked.
pub fn migrate_entry<E, P>(
    entries: &E,
    pages: &P,
    source: &Entry,
    target: EntryType,
    request: &EntryRequest,
) -> ServiceResult<Entry>
where
    E: EntryRepository,
    P: PageRepository,
{
    let merged = PortableFields::from_entry(source).merge(request)?;
    let tag = request.emotion_tag()?;

    entries.delete_entry(source.kind(), source.id)?;

    let manual = ensure_manual_page(pages, source.owner_id)?;
    let details = EntryDetails::for_type(
        target,
        merged.completed,
        merged.event_date,
        tag,
    );
    let migrated = Entry::new(source.owner_id, manual.id, merged.content, details);
    entries.insert_entry(&migrated)?;

    info!(
        "event=entry_migrate module=migration status=ok from={} to={} source_id={} entry_id={}",
        source.entry_type(),
        target,
        source.id,
        migrated.id
    );
    Ok(migrated)
}
