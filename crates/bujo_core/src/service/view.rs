//! Caller-facing read models built from stored entries.
//!
//! # Invariants
//! - The internal habit marker never appears in `tags`.
//! - Titles are never blank: placeholders stand in for empty content.

use super::request::TITLE_NOTES_SEPARATOR;
use crate::model::entry::{Entry, EntryDetails, EntryId, EntryType, ScheduleStatus, TaskStatus};
use crate::model::page::PageId;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;

const DATE_FORMAT: &str = "%Y-%m-%d";
const UPCOMING_LABEL: &str = "Upcoming";

/// Consolidated entry as shown in the all-entries listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    pub id: EntryId,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub title: String,
    pub notes: Option<String>,
    pub completed: bool,
    /// ISO `YYYY-MM-DD` event date.
    pub date: Option<String>,
    pub page_id: PageId,
    pub created_at: String,
    pub updated_at: String,
    pub tags: Vec<String>,
}

/// Scanned entry as shown in the extracted-data listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedItemView {
    pub id: EntryId,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub title: String,
    pub symbol: String,
    pub status: String,
    pub date: Option<String>,
    pub page_id: PageId,
    pub line_number: Option<u32>,
    pub created_at: String,
}

pub fn entry_view(entry: &Entry) -> EntryView {
    let (title, notes) = display_title(entry);
    EntryView {
        id: entry.id,
        entry_type: entry.entry_type(),
        title,
        notes,
        completed: entry.is_completed(),
        date: entry.event_date().map(format_date),
        page_id: entry.page_id,
        created_at: format_timestamp(entry.created_at),
        updated_at: format_timestamp(entry.updated_at),
        tags: entry.emotion_tag().map(str::to_string).into_iter().collect(),
    }
}

/// Builds the extracted-data row; events dated after `today` read `Upcoming`.
pub fn extracted_item_view(entry: &Entry, today: NaiveDate) -> ExtractedItemView {
    let (title, _) = display_title(entry);
    ExtractedItemView {
        id: entry.id,
        entry_type: entry.entry_type(),
        title,
        symbol: display_symbol(entry),
        status: display_status(entry, today),
        date: entry.event_date().map(format_date),
        page_id: entry.page_id,
        line_number: entry.line_number,
        created_at: format_timestamp(entry.created_at),
    }
}

/// Splits stored content on the first ` - ` into title and notes.
pub fn split_title_notes(content: &str) -> (String, Option<String>) {
    match content.split_once(TITLE_NOTES_SEPARATOR) {
        Some((title, notes)) => {
            let notes = notes.trim();
            (
                title.trim().to_string(),
                (!notes.is_empty()).then(|| notes.to_string()),
            )
        }
        None => (content.trim().to_string(), None),
    }
}

fn display_title(entry: &Entry) -> (String, Option<String>) {
    let label = entry.entry_type().label();
    let content = entry.content.trim();
    if content.is_empty() || content == "_" {
        return (format!("Untitled {label}"), None);
    }

    let (title, notes) = split_title_notes(content);
    if title.chars().count() <= 1 {
        return (format!("{label} {}", entry.id), notes);
    }
    (title, notes)
}

fn display_symbol(entry: &Entry) -> String {
    let symbol = match &entry.details {
        EntryDetails::Task { status } => match status {
            TaskStatus::Completed => "X",
            TaskStatus::InProgress => "/",
            TaskStatus::Todo => "•",
        },
        EntryDetails::Event { status, .. } => match status {
            ScheduleStatus::Completed => "⦿",
            ScheduleStatus::Scheduled => "O",
        },
        EntryDetails::Note { status } => match status {
            ScheduleStatus::Completed => "⦿",
            ScheduleStatus::Scheduled => "-",
        },
        EntryDetails::Emotion { .. } if entry.is_habit() => "🔄",
        EntryDetails::Emotion { .. } => emotion_symbol(entry.emotion_tag()),
    };
    symbol.to_string()
}

fn emotion_symbol(tag: Option<&str>) -> &'static str {
    match tag.map(str::to_lowercase).as_deref() {
        Some("sad") => "😢",
        Some("anxious") => "😰",
        Some("grateful") => "🙏",
        _ => "😊",
    }
}

fn display_status(entry: &Entry, today: NaiveDate) -> String {
    match &entry.details {
        EntryDetails::Event {
            event_date: Some(date),
            ..
        } if *date > today => UPCOMING_LABEL.to_string(),
        details => details.status_label().to_string(),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Renders epoch milliseconds as RFC 3339 UTC.
pub fn format_timestamp(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{entry_view, extracted_item_view, format_timestamp, split_title_notes};
    use crate::model::entry::{Entry, EntryDetails, EntryType, ScheduleStatus, TaskStatus};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn entry(content: &str, details: EntryDetails) -> Entry {
        Entry::new(Uuid::new_v4(), Uuid::new_v4(), content, details)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn title_splits_on_first_separator_only() {
        assert_eq!(
            split_title_notes("Pay rent - due friday - online"),
            ("Pay rent".to_string(), Some("due friday - online".to_string()))
        );
        assert_eq!(split_title_notes("Pay rent"), ("Pay rent".to_string(), None));
    }

    #[test]
    fn placeholder_titles_cover_blank_and_short_content() {
        let blank = entry(
            "_",
            EntryDetails::Note {
                status: ScheduleStatus::Scheduled,
            },
        );
        assert_eq!(entry_view(&blank).title, "Untitled Note");

        let short = entry(
            "a",
            EntryDetails::Task {
                status: TaskStatus::Todo,
            },
        );
        assert_eq!(entry_view(&short).title, format!("Task {}", short.id));
    }

    #[test]
    fn habit_view_hides_marker_tag() {
        let habit = entry("Stretch", EntryDetails::habit());
        let view = entry_view(&habit);
        assert_eq!(view.entry_type, EntryType::Habit);
        assert!(view.tags.is_empty());
        assert!(!view.completed);
        assert_eq!(extracted_item_view(&habit, today()).symbol, "🔄");
    }

    #[test]
    fn emotion_view_exposes_single_tag() {
        let emotion = entry(
            "feeling grateful today",
            EntryDetails::Emotion {
                status: ScheduleStatus::Scheduled,
                emotion_type: Some("grateful".to_string()),
            },
        );
        assert_eq!(entry_view(&emotion).tags, vec!["grateful".to_string()]);
        assert_eq!(extracted_item_view(&emotion, today()).symbol, "🙏");
    }

    #[test]
    fn future_events_read_upcoming() {
        let future = entry(
            "dentist",
            EntryDetails::Event {
                status: ScheduleStatus::Scheduled,
                event_date: NaiveDate::from_ymd_opt(2025, 10, 10),
            },
        );
        let past = entry(
            "dentist",
            EntryDetails::Event {
                status: ScheduleStatus::Completed,
                event_date: NaiveDate::from_ymd_opt(2024, 10, 10),
            },
        );

        let future_view = extracted_item_view(&future, today());
        assert_eq!(future_view.status, "Upcoming");
        assert_eq!(future_view.symbol, "O");
        assert_eq!(future_view.date.as_deref(), Some("2025-10-10"));
        assert_eq!(extracted_item_view(&past, today()).status, "COMPLETED");
        assert_eq!(extracted_item_view(&past, today()).symbol, "⦿");
    }

    #[test]
    fn timestamps_render_as_utc() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00.000Z");
    }
}
