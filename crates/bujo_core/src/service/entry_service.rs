//! Manual entry use-cases and entry read models.
//!
//! # Responsibility
//! - Create, edit, toggle and delete entries addressed by id.
//! - Route kind changes through the migrator.
//! - Build the all-entries and extracted-data listings.
//!
//! # Invariants
//! - Every mutation runs in one IMMEDIATE transaction.
//! - A missing id is `NotFound`; an id owned by someone else is `Forbidden`.
//! - Lookup by id probes stores in `EntryKind::LOOKUP_ORDER`.

use super::migration::migrate_entry;
use super::page_service::{ensure_manual_page, owned_page};
use super::request::{compose_content, validate_title, EntryRequest};
use super::view::{entry_view, extracted_item_view, EntryView, ExtractedItemView};
use super::{ServiceError, ServiceResult};
use crate::model::entry::{
    Entry, EntryDetails, EntryId, EntryKind, EntryType, ScheduleStatus, TaskStatus,
    UnknownEntryType,
};
use crate::model::page::PageId;
use crate::model::UserId;
use crate::repo::entry_repo::{
    EntryListQuery, EntryRepository, RepoResult, SqliteEntryRepository,
};
use crate::repo::page_repo::{PageRepository, SqlitePageRepository};
use chrono::{Local, NaiveDate};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

/// Entry use-cases over one connection.
pub struct EntryService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> EntryService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Creates a manual entry on the owner's manual page.
    ///
    /// # Contract
    /// - `kind` and `title` are required; `habit` lands in the Emotion store.
    /// - The first tag becomes the emotion tag of emotion entries.
    pub fn create_entry(&mut self, owner_id: UserId, request: &EntryRequest) -> ServiceResult<EntryView> {
        let entry_type = request
            .entry_type()?
            .ok_or_else(|| UnknownEntryType(String::new()))?;
        let title = validate_title(request.title.as_deref().unwrap_or_default())?;
        let details = EntryDetails::for_type(
            entry_type,
            request.completed.unwrap_or(false),
            request.event_date(),
            request.emotion_tag()?,
        );

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let page = ensure_manual_page(&SqlitePageRepository::new(&tx), owner_id)?;
        let entry = Entry::new(
            owner_id,
            page.id,
            compose_content(&title, request.notes.as_deref()),
            details,
        );
        SqliteEntryRepository::new(&tx).insert_entry(&entry)?;
        tx.commit()?;

        info!(
            "event=entry_create module=service status=ok kind={} entry_id={}",
            entry_type, entry.id
        );
        Ok(entry_view(&entry))
    }

    pub fn get_entry(&self, owner_id: UserId, id: EntryId) -> ServiceResult<EntryView> {
        let repo = SqliteEntryRepository::new(self.conn);
        let entry = authorize(locate_entry(&repo, id)?, owner_id, id)?;
        Ok(entry_view(&entry))
    }

    /// Applies `request` to the entry `id`.
    ///
    /// A `kind` different from the stored one migrates the entry; the
    /// returned view then carries a new id.
    pub fn update_entry(
        &mut self,
        owner_id: UserId,
        id: EntryId,
        request: &EntryRequest,
    ) -> ServiceResult<EntryView> {
        let target = request.entry_type()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let repo = SqliteEntryRepository::new(&tx);
        let entry = authorize(locate_entry(&repo, id)?, owner_id, id)?;
        let target = target.unwrap_or_else(|| entry.entry_type());
        let pages = SqlitePageRepository::new(&tx);
        let updated = retype_or_edit(&repo, &pages, entry, target, request)?;
        tx.commit()?;

        info!(
            "event=entry_update module=service status=ok kind={} entry_id={}",
            updated.entry_type(),
            updated.id
        );
        Ok(entry_view(&updated))
    }

    /// Moves the entry `id` held in the `kind` store to `target`.
    ///
    /// A `target` equal to the current kind edits the entry in place and
    /// keeps its id, page and position.
    pub fn change_entry_type(
        &mut self,
        owner_id: UserId,
        kind: EntryKind,
        id: EntryId,
        target: &str,
        request: &EntryRequest,
    ) -> ServiceResult<EntryView> {
        let target = target.parse::<EntryType>()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let repo = SqliteEntryRepository::new(&tx);
        let source = authorize(repo.get_entry(kind, id)?, owner_id, id)?;
        let pages = SqlitePageRepository::new(&tx);
        let changed = retype_or_edit(&repo, &pages, source, target, request)?;
        tx.commit()?;
        Ok(entry_view(&changed))
    }

    pub fn delete_entry(&mut self, owner_id: UserId, id: EntryId) -> ServiceResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let repo = SqliteEntryRepository::new(&tx);
        let entry = authorize(locate_entry(&repo, id)?, owner_id, id)?;
        repo.delete_entry(entry.kind(), entry.id)?;
        tx.commit()?;

        info!(
            "event=entry_delete module=service status=ok kind={} entry_id={}",
            entry.kind(),
            id
        );
        Ok(())
    }

    /// Sets completion to `completed`, or flips it when `None`.
    ///
    /// Emotions and habits have no completion state and are rejected.
    pub fn toggle_complete(
        &mut self,
        owner_id: UserId,
        id: EntryId,
        completed: Option<bool>,
    ) -> ServiceResult<EntryView> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let repo = SqliteEntryRepository::new(&tx);
        let mut entry = authorize(locate_entry(&repo, id)?, owner_id, id)?;

        let done = completed.unwrap_or(!entry.is_completed());
        set_completed(&mut entry.details, done)?;
        entry.touch();
        repo.update_entry(&entry)?;
        tx.commit()?;

        info!(
            "event=entry_toggle module=service status=ok kind={} entry_id={} completed={}",
            entry.kind(),
            id,
            done
        );
        Ok(entry_view(&entry))
    }

    /// All entries of the owner across stores, newest first.
    pub fn list_entries(&self, owner_id: UserId) -> ServiceResult<Vec<EntryView>> {
        let query = EntryListQuery {
            owner_id: Some(owner_id),
            ..EntryListQuery::default()
        };
        let entries = collect_entries(&SqliteEntryRepository::new(self.conn), &query)?;
        Ok(entries.iter().map(entry_view).collect())
    }

    /// Scanned entries of the owner, or every entry of one page.
    pub fn extracted_data(
        &self,
        owner_id: UserId,
        page_id: Option<PageId>,
    ) -> ServiceResult<Vec<ExtractedItemView>> {
        self.extracted_data_on(owner_id, page_id, Local::now().date_naive())
    }

    pub(crate) fn extracted_data_on(
        &self,
        owner_id: UserId,
        page_id: Option<PageId>,
        today: NaiveDate,
    ) -> ServiceResult<Vec<ExtractedItemView>> {
        if let Some(page_id) = page_id {
            owned_page(&SqlitePageRepository::new(self.conn), owner_id, page_id)?;
        }
        let query = EntryListQuery {
            owner_id: Some(owner_id),
            page_id,
            scanned_only: page_id.is_none(),
            content_contains: None,
        };
        let entries = collect_entries(&SqliteEntryRepository::new(self.conn), &query)?;
        Ok(entries
            .iter()
            .map(|entry| extracted_item_view(entry, today))
            .collect())
    }
}

/// Finds `id` in the first store that holds it.
pub(crate) fn locate_entry<R: EntryRepository>(repo: &R, id: EntryId) -> RepoResult<Option<Entry>> {
    for kind in EntryKind::LOOKUP_ORDER {
        if let Some(entry) = repo.get_entry(kind, id)? {
            return Ok(Some(entry));
        }
    }
    Ok(None)
}

fn authorize(entry: Option<Entry>, owner_id: UserId, id: EntryId) -> ServiceResult<Entry> {
    match entry {
        Some(entry) if entry.owner_id == owner_id => Ok(entry),
        Some(_) => Err(ServiceError::Forbidden(id)),
        None => Err(ServiceError::NotFound(id)),
    }
}

fn collect_entries<R: EntryRepository>(repo: &R, query: &EntryListQuery) -> RepoResult<Vec<Entry>> {
    let mut entries = Vec::new();
    for kind in EntryKind::LOOKUP_ORDER {
        entries.extend(repo.list_entries(kind, query)?);
    }
    entries.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| left.id.cmp(&right.id))
    });
    Ok(entries)
}

/// Migrates `entry` when `target` differs from its kind, else edits it in place.
fn retype_or_edit<E, P>(
    entries: &E,
    pages: &P,
    mut entry: Entry,
    target: EntryType,
    request: &EntryRequest,
) -> ServiceResult<Entry>
where
    E: EntryRepository,
    P: PageRepository,
{
    if target != entry.entry_type() {
        return migrate_entry(entries, pages, &entry, target, request);
    }
    apply_request(&mut entry, request)?;
    entry.touch();
    entries.update_entry(&entry)?;
    Ok(entry)
}

/// Same-kind edit: only fields present in `request` change.
fn apply_request(entry: &mut Entry, request: &EntryRequest) -> ServiceResult<()> {
    if let Some(title) = request.title.as_deref() {
        entry.content = compose_content(&validate_title(title)?, request.notes.as_deref());
    }
    if let Some(completed) = request.completed {
        if !matches!(entry.details, EntryDetails::Emotion { .. }) {
            set_completed(&mut entry.details, completed)?;
        }
    }
    let date = request.event_date();
    let tag = request.emotion_tag()?;
    let habit = entry.is_habit();
    match &mut entry.details {
        EntryDetails::Event { event_date, .. } if date.is_some() => *event_date = date,
        EntryDetails::Emotion { emotion_type, .. } if tag.is_some() && !habit => {
            *emotion_type = tag;
        }
        _ => {}
    }
    Ok(())
}

fn set_completed(details: &mut EntryDetails, completed: bool) -> ServiceResult<()> {
    match details {
        EntryDetails::Task { status } => {
            *status = if completed {
                TaskStatus::Completed
            } else {
                TaskStatus::Todo
            };
        }
        EntryDetails::Event { status, .. } | EntryDetails::Note { status } => {
            *status = ScheduleStatus::from_completed(completed);
        }
        EntryDetails::Emotion { .. } => {
            return Err(ServiceError::Validation(
                "emotion and habit entries have no completion state".to_string(),
            ));
        }
    }
    Ok(())
}
