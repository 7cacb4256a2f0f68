//! Page text extraction.
//!
//! # Responsibility
//! - Split raw OCR text into numbered lines.
//! - Classify and parse each line into a candidate entry.
//! - Group candidates by kind for reconciliation.
//!
//! # Invariants
//! - Line numbers are 1-based and count blank lines, so a line keeps its number
//!   when the OCR output around it is unchanged.
//! - Extraction is pure: no store access happens here.

pub mod classifier;
pub mod identity;
pub mod parser;

use crate::config::ExtractionOptions;
use crate::model::entry::{Entry, EntryKind};
use crate::model::page::PageId;
use crate::model::UserId;
use log::debug;
use parser::ParsedFields;

pub use classifier::classify_line;
pub use identity::position_identity;

/// One parsed line awaiting reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub line_number: u32,
    pub position_hash: String,
    pub fields: ParsedFields,
}

impl Candidate {
    pub fn kind(&self) -> EntryKind {
        self.fields.details.kind()
    }

    /// Materializes the candidate as a new entry on `page_id`.
    pub fn to_entry(&self, owner_id: UserId, page_id: PageId) -> Entry {
        let mut entry = Entry::new(
            owner_id,
            page_id,
            self.fields.content.clone(),
            self.fields.details.clone(),
        );
        entry.symbol = self.fields.symbol.clone();
        entry.line_number = Some(self.line_number);
        entry.position_hash = Some(self.position_hash.clone());
        entry
    }
}

/// Candidates of one page, grouped by kind in line order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    pub tasks: Vec<Candidate>,
    pub events: Vec<Candidate>,
    pub notes: Vec<Candidate>,
    pub emotions: Vec<Candidate>,
}

impl ExtractedPage {
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.tasks.len() + self.events.len() + self.notes.len() + self.emotions.len()
    }

    /// Groups in reconciliation order: tasks, events, notes, emotions.
    pub fn groups(&self) -> [(EntryKind, &[Candidate]); 4] {
        [
            (EntryKind::Task, self.tasks.as_slice()),
            (EntryKind::Event, self.events.as_slice()),
            (EntryKind::Note, self.notes.as_slice()),
            (EntryKind::Emotion, self.emotions.as_slice()),
        ]
    }

    fn push(&mut self, candidate: Candidate) {
        match candidate.kind() {
            EntryKind::Task => self.tasks.push(candidate),
            EntryKind::Event => self.events.push(candidate),
            EntryKind::Note => self.notes.push(candidate),
            EntryKind::Emotion => self.emotions.push(candidate),
        }
    }
}

/// Returns whether `text` is real page text worth extracting.
///
/// Blank text and OCR failure reports are not.
pub fn is_extractable(text: &str, options: &ExtractionOptions) -> bool {
    !text.trim().is_empty() && !text.starts_with(options.ocr_failure_marker.as_str())
}

/// Splits, classifies and parses `text` into grouped candidates.
pub fn extract_page(text: &str, options: &ExtractionOptions) -> ExtractedPage {
    let mut page = ExtractedPage::default();
    if !is_extractable(text, options) {
        return page;
    }

    for (index, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let line_number = u32::try_from(index + 1).unwrap_or(u32::MAX);

        let Some(kind) = classify_line(line, options.min_note_chars) else {
            debug!(
                "event=line_classify module=extract status=skip reason=noise line={}",
                line_number
            );
            continue;
        };
        let Some(fields) = parser::parse_line(kind, line) else {
            debug!(
                "event=line_parse module=extract status=skip reason=empty_content kind={} line={}",
                kind, line_number
            );
            continue;
        };

        page.push(Candidate {
            line_number,
            position_hash: position_identity(line, line_number),
            fields,
        });
    }

    page
}

#[cfg(test)]
mod tests {
    use super::{extract_page, is_extractable, position_identity};
    use crate::config::ExtractionOptions;
    use crate::model::entry::{EntryDetails, ScheduleStatus, TaskStatus};
    use chrono::NaiveDate;

    #[test]
    fn groups_scenario_page_by_kind() {
        let text = "• buy milk\nX call mom\nO dentist 10/10/25\nfeeling grateful today";
        let page = extract_page(text, &ExtractionOptions::default());

        assert_eq!(page.tasks.len(), 2);
        assert_eq!(page.events.len(), 1);
        assert_eq!(page.notes.len(), 0);
        assert_eq!(page.emotions.len(), 1);
        assert_eq!(
            page.tasks[1].fields.details,
            EntryDetails::Task {
                status: TaskStatus::Completed
            }
        );
        assert_eq!(
            page.events[0].fields.details,
            EntryDetails::Event {
                status: ScheduleStatus::Scheduled,
                event_date: NaiveDate::from_ymd_opt(2025, 10, 10),
            }
        );
    }

    #[test]
    fn line_numbers_count_blank_lines() {
        let page = extract_page("\n\n• first\n\nsecond line\n", &ExtractionOptions::default());
        assert_eq!(page.tasks[0].line_number, 3);
        assert_eq!(page.notes[0].line_number, 5);
        assert_eq!(page.notes[0].position_hash, position_identity("second line", 5));
    }

    #[test]
    fn hash_covers_the_whole_trimmed_line() {
        let page = extract_page("  • Buy Milk  ", &ExtractionOptions::default());
        assert_eq!(page.tasks[0].position_hash, position_identity("• buy milk", 1));
    }

    #[test]
    fn failure_marker_and_blank_text_short_circuit() {
        let options = ExtractionOptions::default();
        assert!(!is_extractable("   \n ", &options));
        assert!(!is_extractable("OCR extraction failed: tesseract missing", &options));
        assert!(extract_page("OCR extraction failed\n• buy milk", &options).is_empty());
    }

    #[test]
    fn noise_lines_are_dropped() {
        let page = extract_page("a\n.\n• real task", &ExtractionOptions::default());
        assert_eq!(page.len(), 1);
    }
}
