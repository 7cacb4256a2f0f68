//! Reconciliation of extracted candidates against stored entries.
//!
//! # Responsibility
//! - Insert candidates whose `(page_id, position_hash)` is new.
//! - Refresh extraction-owned fields of candidates already stored.
//!
//! # Invariants
//! - Re-running reconciliation on unchanged text never adds rows.
//! - A concurrent insert of the same position degrades to an update.
//! - User-owned fields survive: note and emotion status are never reset.

use crate::extract::{Candidate, ExtractedPage};
use crate::model::entry::{Entry, EntryDetails, EntryKind};
use crate::model::page::Page;
use crate::repo::entry_repo::{EntryRepository, RepoError, RepoResult};
use log::{debug, info};
use serde::Serialize;

/// Per-kind counts of candidates processed for one page.
///
/// Counts inserted and updated rows alike.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    pub tasks: usize,
    pub events: usize,
    pub notes: usize,
    pub emotions: usize,
}

impl ExtractionSummary {
    pub fn total(&self) -> usize {
        self.tasks + self.events + self.notes + self.emotions
    }

    fn record(&mut self, kind: EntryKind) {
        match kind {
            EntryKind::Task => self.tasks += 1,
            EntryKind::Event => self.events += 1,
            EntryKind::Note => self.notes += 1,
            EntryKind::Emotion => self.emotions += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Inserted,
    Updated,
}

/// Reconciles every candidate of `extracted` onto `page`.
///
/// The caller owns the transaction; an error leaves earlier writes for the
/// caller to roll back.
pub fn reconcile_page<R: EntryRepository>(
    repo: &R,
    page: &Page,
    extracted: &ExtractedPage,
) -> RepoResult<ExtractionSummary> {
    let mut summary = ExtractionSummary::default();
    let mut inserted = 0usize;

    for (kind, candidates) in extracted.groups() {
        for candidate in candidates {
            if reconcile_candidate(repo, page, candidate)? == Outcome::Inserted {
                inserted += 1;
            }
            summary.record(kind);
        }
    }

    info!(
        "event=page_reconcile module=reconcile status=ok page_id={} tasks={} events={} notes={} emotions={} inserted={} updated={}",
        page.id,
        summary.tasks,
        summary.events,
        summary.notes,
        summary.emotions,
        inserted,
        summary.total() - inserted
    );
    Ok(summary)
}

fn reconcile_candidate<R: EntryRepository>(
    repo: &R,
    page: &Page,
    candidate: &Candidate,
) -> RepoResult<Outcome> {
    let kind = candidate.kind();
    if let Some(existing) = repo.find_by_position(kind, page.id, &candidate.position_hash)? {
        update_existing(repo, existing, candidate)?;
        return Ok(Outcome::Updated);
    }

    match repo.insert_entry(&candidate.to_entry(page.owner_id, page.id)) {
        Ok(_) => Ok(Outcome::Inserted),
        Err(RepoError::Conflict { .. }) => {
            debug!(
                "event=entry_reconcile module=reconcile status=retry reason=position_conflict kind={} page_id={} line={}",
                kind, page.id, candidate.line_number
            );
            let existing = repo
                .find_by_position(kind, page.id, &candidate.position_hash)?
                .ok_or_else(|| {
                    RepoError::InvalidData(format!(
                        "{kind} at line {} conflicted but is not readable",
                        candidate.line_number
                    ))
                })?;
            update_existing(repo, existing, candidate)?;
            Ok(Outcome::Updated)
        }
        Err(err) => Err(err),
    }
}

fn update_existing<R: EntryRepository>(
    repo: &R,
    mut existing: Entry,
    candidate: &Candidate,
) -> RepoResult<()> {
    apply_candidate(&mut existing, candidate);
    repo.update_entry(&existing)
}

/// Copies extraction-owned fields from `candidate` onto `existing`.
fn apply_candidate(existing: &mut Entry, candidate: &Candidate) {
    existing.content = candidate.fields.content.clone();

    match (&mut existing.details, &candidate.fields.details) {
        (EntryDetails::Task { status }, EntryDetails::Task { status: fresh }) => {
            *status = *fresh;
            existing.symbol = candidate.fields.symbol.clone();
        }
        (
            EntryDetails::Event { status, event_date },
            EntryDetails::Event {
                status: fresh_status,
                event_date: fresh_date,
            },
        ) => {
            *status = *fresh_status;
            *event_date = *fresh_date;
            existing.symbol = candidate.fields.symbol.clone();
        }
        (
            EntryDetails::Emotion { emotion_type, .. },
            EntryDetails::Emotion {
                emotion_type: fresh,
                ..
            },
        ) => {
            *emotion_type = fresh.clone();
        }
        // Notes only follow their text.
        _ => {}
    }

    existing.touch();
}

#[cfg(test)]
mod tests {
    use super::{reconcile_page, ExtractionSummary};
    use crate::config::ExtractionOptions;
    use crate::extract::extract_page;
    use crate::model::entry::{Entry, EntryDetails, EntryId, EntryKind, ScheduleStatus};
    use crate::model::page::{Page, PageId};
    use crate::repo::entry_repo::{EntryListQuery, EntryRepository, RepoError, RepoResult};
    use std::cell::{Cell, RefCell};
    use uuid::Uuid;

    /// In-memory store that can hide rows from the first position lookup,
    /// emulating a writer that raced us between lookup and insert.
    #[derive(Default)]
    struct FakeEntryRepo {
        rows: RefCell<Vec<Entry>>,
        hidden_lookups: Cell<usize>,
    }

    impl EntryRepository for FakeEntryRepo {
        fn insert_entry(&self, entry: &Entry) -> RepoResult<EntryId> {
            let mut rows = self.rows.borrow_mut();
            let duplicate = rows.iter().any(|row| {
                row.kind() == entry.kind()
                    && row.page_id == entry.page_id
                    && row.position_hash == entry.position_hash
            });
            if duplicate {
                return Err(RepoError::Conflict {
                    kind: entry.kind(),
                    page_id: entry.page_id,
                    position_hash: entry.position_hash.clone().unwrap_or_default(),
                });
            }
            rows.push(entry.clone());
            Ok(entry.id)
        }

        fn update_entry(&self, entry: &Entry) -> RepoResult<()> {
            let mut rows = self.rows.borrow_mut();
            let row = rows
                .iter_mut()
                .find(|row| row.id == entry.id)
                .ok_or(RepoError::NotFound(entry.id))?;
            *row = entry.clone();
            Ok(())
        }

        fn delete_entry(&self, _kind: EntryKind, id: EntryId) -> RepoResult<()> {
            self.rows.borrow_mut().retain(|row| row.id != id);
            Ok(())
        }

        fn get_entry(&self, kind: EntryKind, id: EntryId) -> RepoResult<Option<Entry>> {
            Ok(self
                .rows
                .borrow()
                .iter()
                .find(|row| row.kind() == kind && row.id == id)
                .cloned())
        }

        fn find_by_position(
            &self,
            kind: EntryKind,
            page_id: PageId,
            position_hash: &str,
        ) -> RepoResult<Option<Entry>> {
            if self.hidden_lookups.get() > 0 {
                self.hidden_lookups.set(self.hidden_lookups.get() - 1);
                return Ok(None);
            }
            Ok(self
                .rows
                .borrow()
                .iter()
                .find(|row| {
                    row.kind() == kind
                        && row.page_id == page_id
                        && row.position_hash.as_deref() == Some(position_hash)
                })
                .cloned())
        }

        fn list_entries(&self, kind: EntryKind, _query: &EntryListQuery) -> RepoResult<Vec<Entry>> {
            Ok(self
                .rows
                .borrow()
                .iter()
                .filter(|row| row.kind() == kind)
                .cloned()
                .collect())
        }
    }

    fn page(text: &str) -> Page {
        Page::scanned(Uuid::new_v4(), text, 1, None)
    }

    #[test]
    fn second_pass_updates_instead_of_inserting() {
        let repo = FakeEntryRepo::default();
        let page = page("• buy milk\nO 12/25/2024 party\nremember keys");
        let extracted = extract_page(&page.extracted_text, &ExtractionOptions::default());

        let first = reconcile_page(&repo, &page, &extracted).unwrap();
        let before = repo.rows.borrow().clone();
        let second = reconcile_page(&repo, &page, &extracted).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            first,
            ExtractionSummary {
                tasks: 1,
                events: 1,
                notes: 1,
                emotions: 0
            }
        );
        let after = repo.rows.borrow();
        assert_eq!(after.len(), 3);
        for (old, new) in before.iter().zip(after.iter()) {
            assert_eq!(old.id, new.id);
            assert!(new.updated_at > old.updated_at);
        }
    }

    #[test]
    fn conflicting_insert_degrades_to_update() {
        let repo = FakeEntryRepo::default();
        let page = page("• buy milk");
        let extracted = extract_page(&page.extracted_text, &ExtractionOptions::default());
        reconcile_page(&repo, &page, &extracted).unwrap();

        repo.hidden_lookups.set(1);
        let summary = reconcile_page(&repo, &page, &extracted).unwrap();

        assert_eq!(summary.tasks, 1);
        assert_eq!(repo.rows.borrow().len(), 1);
    }

    #[test]
    fn note_status_survives_reconciliation() {
        let repo = FakeEntryRepo::default();
        let page = page("remember the keys");
        let extracted = extract_page(&page.extracted_text, &ExtractionOptions::default());
        reconcile_page(&repo, &page, &extracted).unwrap();

        {
            let mut rows = repo.rows.borrow_mut();
            rows[0].details = EntryDetails::Note {
                status: ScheduleStatus::Completed,
            };
        }
        reconcile_page(&repo, &page, &extracted).unwrap();

        assert_eq!(
            repo.rows.borrow()[0].details,
            EntryDetails::Note {
                status: ScheduleStatus::Completed
            }
        );
    }

    #[test]
    fn empty_page_yields_zero_summary() {
        let repo = FakeEntryRepo::default();
        let page = page("");
        let summary = reconcile_page(&repo, &page, &Default::default()).unwrap();
        assert_eq!(summary, ExtractionSummary::default());
        assert_eq!(summary.total(), 0);
    }
}
