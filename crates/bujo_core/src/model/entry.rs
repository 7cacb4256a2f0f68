//! Typed journal entries.
//!
//! # Responsibility
//! - Model the four stored entry kinds as one tagged union (`EntryDetails`).
//! - Map stored kinds to the public kind enumeration, including `habit`.
//!
//! # Invariants
//! - `created_at` never changes after construction.
//! - `touch()` strictly increases `updated_at`.
//! - Scanned entries carry both `line_number` and `position_hash`; manual and
//!   migrated entries carry neither.

use super::page::PageId;
use super::{now_epoch_ms, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Stable identifier of an entry inside its kind's store.
pub type EntryId = Uuid;

/// Internal emotion tag marking an Emotion-store record as a habit.
pub(crate) const HABIT_TAG: &str = "habit";

/// Physical store an entry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Task,
    Event,
    Note,
    Emotion,
}

impl EntryKind {
    /// Lookup order used when an entry is addressed by id only.
    pub const LOOKUP_ORDER: [EntryKind; 4] = [
        EntryKind::Task,
        EntryKind::Note,
        EntryKind::Event,
        EntryKind::Emotion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Event => "event",
            Self::Note => "note",
            Self::Emotion => "emotion",
        }
    }
}

impl Display for EntryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public kind enumeration reported to callers.
///
/// `Habit` shares the Emotion store and is told apart by an internal tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Task,
    Note,
    Event,
    Habit,
    Emotion,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Note => "note",
            Self::Event => "event",
            Self::Habit => "habit",
            Self::Emotion => "emotion",
        }
    }

    /// Store that holds entries of this public kind.
    pub fn store_kind(self) -> EntryKind {
        match self {
            Self::Task => EntryKind::Task,
            Self::Note => EntryKind::Note,
            Self::Event => EntryKind::Event,
            Self::Habit | Self::Emotion => EntryKind::Emotion,
        }
    }

    /// Capitalized label used for placeholder titles.
    pub fn label(self) -> &'static str {
        match self {
            Self::Task => "Task",
            Self::Note => "Note",
            Self::Event => "Event",
            Self::Habit => "Habit",
            Self::Emotion => "Emotion",
        }
    }
}

impl Display for EntryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a kind string is outside `task|note|event|habit|emotion`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid entry type `{0}`; expected task|note|event|habit|emotion")]
pub struct UnknownEntryType(pub String);

impl FromStr for EntryType {
    type Err = UnknownEntryType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "task" => Ok(Self::Task),
            "note" => Ok(Self::Note),
            "event" => Ok(Self::Event),
            "habit" => Ok(Self::Habit),
            "emotion" => Ok(Self::Emotion),
            _ => Err(UnknownEntryType(value.to_string())),
        }
    }
}

/// Task lifecycle, driven by the bullet glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// `•`
    Todo,
    /// `/`
    InProgress,
    /// `X`
    Completed,
}

impl TaskStatus {
    /// Upper-case label used by read models and search filters.
    pub fn label(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TODO" => Some(Self::Todo),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Two-state status shared by events, notes and emotions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    #[default]
    Scheduled,
    Completed,
}

impl ScheduleStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SCHEDULED" => Some(Self::Scheduled),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn from_completed(completed: bool) -> Self {
        if completed {
            Self::Completed
        } else {
            Self::Scheduled
        }
    }
}

/// Kind-specific payload. The variant decides which store holds the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryDetails {
    Task {
        status: TaskStatus,
    },
    Event {
        status: ScheduleStatus,
        event_date: Option<NaiveDate>,
    },
    Note {
        status: ScheduleStatus,
    },
    Emotion {
        status: ScheduleStatus,
        /// Canonical emotion tag, a user tag, or the internal habit marker.
        emotion_type: Option<String>,
    },
}

impl EntryDetails {
    pub fn kind(&self) -> EntryKind {
        match self {
            Self::Task { .. } => EntryKind::Task,
            Self::Event { .. } => EntryKind::Event,
            Self::Note { .. } => EntryKind::Note,
            Self::Emotion { .. } => EntryKind::Emotion,
        }
    }

    /// Emotion-store payload flagged as a habit.
    pub fn habit() -> Self {
        Self::Emotion {
            status: ScheduleStatus::Scheduled,
            emotion_type: Some(HABIT_TAG.to_string()),
        }
    }

    /// Builds the payload for `entry_type` with the given completion state.
    ///
    /// Emotions and habits have no completion state; `completed` is ignored.
    pub fn for_type(
        entry_type: EntryType,
        completed: bool,
        event_date: Option<NaiveDate>,
        emotion_tag: Option<String>,
    ) -> Self {
        match entry_type {
            EntryType::Task => Self::Task {
                status: if completed {
                    TaskStatus::Completed
                } else {
                    TaskStatus::Todo
                },
            },
            EntryType::Event => Self::Event {
                status: ScheduleStatus::from_completed(completed),
                event_date,
            },
            EntryType::Note => Self::Note {
                status: ScheduleStatus::from_completed(completed),
            },
            EntryType::Habit => Self::habit(),
            EntryType::Emotion => Self::Emotion {
                status: ScheduleStatus::Scheduled,
                emotion_type: emotion_tag,
            },
        }
    }

    pub fn is_completed(&self) -> bool {
        match self {
            Self::Task { status } => *status == TaskStatus::Completed,
            Self::Event { status, .. } | Self::Note { status } => {
                *status == ScheduleStatus::Completed
            }
            Self::Emotion { .. } => false,
        }
    }

    /// Upper-case status label.
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Task { status } => status.label(),
            Self::Event { status, .. } | Self::Note { status } | Self::Emotion { status, .. } => {
                status.label()
            }
        }
    }
}

/// A typed journal entry as held by its kind's store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub owner_id: UserId,
    pub page_id: PageId,
    pub content: String,
    /// Literal glyph detected on the scanned line.
    pub symbol: Option<String>,
    /// 1-based line within the page.
    pub line_number: Option<u32>,
    /// De-duplication key, unique together with `page_id` per kind.
    pub position_hash: Option<String>,
    pub details: EntryDetails,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

impl Entry {
    /// Creates an entry with a fresh id and no scan position.
    pub fn new(
        owner_id: UserId,
        page_id: PageId,
        content: impl Into<String>,
        details: EntryDetails,
    ) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            page_id,
            content: content.into(),
            symbol: None,
            line_number: None,
            position_hash: None,
            details,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.details.kind()
    }

    /// Public kind, resolving the habit marker on Emotion-store records.
    pub fn entry_type(&self) -> EntryType {
        match &self.details {
            EntryDetails::Task { .. } => EntryType::Task,
            EntryDetails::Event { .. } => EntryType::Event,
            EntryDetails::Note { .. } => EntryType::Note,
            EntryDetails::Emotion { .. } if self.is_habit() => EntryType::Habit,
            EntryDetails::Emotion { .. } => EntryType::Emotion,
        }
    }

    pub fn is_habit(&self) -> bool {
        matches!(
            &self.details,
            EntryDetails::Emotion { emotion_type: Some(tag), .. } if tag == HABIT_TAG
        )
    }

    pub fn is_completed(&self) -> bool {
        self.details.is_completed()
    }

    pub fn event_date(&self) -> Option<NaiveDate> {
        match &self.details {
            EntryDetails::Event { event_date, .. } => *event_date,
            _ => None,
        }
    }

    /// Emotion tag visible to callers. The habit marker is never returned.
    pub fn emotion_tag(&self) -> Option<&str> {
        match &self.details {
            EntryDetails::Emotion {
                emotion_type: Some(tag),
                ..
            } if tag != HABIT_TAG && !tag.trim().is_empty() => Some(tag.as_str()),
            _ => None,
        }
    }

    /// Advances `updated_at` to now, or by one millisecond when the clock has
    /// not moved since the last mutation.
    pub fn touch(&mut self) {
        self.updated_at = now_epoch_ms().max(self.updated_at + 1);
    }

    /// Checks structural invariants before persistence.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if self.content.trim().is_empty() {
            return Err(EntryValidationError::EmptyContent);
        }

        match (self.line_number, self.position_hash.as_deref()) {
            (None, None) => {}
            (Some(0), _) => return Err(EntryValidationError::InvalidLineNumber),
            (Some(_), Some(hash)) => {
                let well_formed = hash.len() == 64
                    && hash
                        .chars()
                        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
                if !well_formed {
                    return Err(EntryValidationError::InvalidPositionHash(hash.to_string()));
                }
            }
            _ => return Err(EntryValidationError::IncompletePosition),
        }

        if self.updated_at < self.created_at {
            return Err(EntryValidationError::TimestampOrder {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }

        Ok(())
    }
}

/// Structural violations rejected before an entry reaches a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryValidationError {
    #[error("entry content must not be empty")]
    EmptyContent,
    #[error("line numbers are 1-based")]
    InvalidLineNumber,
    #[error("line number and position hash must be set together")]
    IncompletePosition,
    #[error("position hash `{0}` is not a lowercase sha-256 hex digest")]
    InvalidPositionHash(String),
    #[error("updated_at {updated_at} precedes created_at {created_at}")]
    TimestampOrder { created_at: i64, updated_at: i64 },
}

#[cfg(test)]
mod tests {
    use super::{
        Entry, EntryDetails, EntryKind, EntryType, EntryValidationError, ScheduleStatus,
        TaskStatus,
    };
    use uuid::Uuid;

    fn entry(details: EntryDetails) -> Entry {
        Entry::new(Uuid::new_v4(), Uuid::new_v4(), "pay rent", details)
    }

    #[test]
    fn entry_type_parses_case_insensitively() {
        assert_eq!(" Habit ".parse::<EntryType>().unwrap(), EntryType::Habit);
        assert_eq!("TASK".parse::<EntryType>().unwrap(), EntryType::Task);
        let err = "chore".parse::<EntryType>().unwrap_err();
        assert_eq!(err.0, "chore");
    }

    #[test]
    fn habit_lives_in_emotion_store_but_reports_habit() {
        let habit = entry(EntryDetails::habit());
        assert_eq!(habit.kind(), EntryKind::Emotion);
        assert_eq!(habit.entry_type(), EntryType::Habit);
        assert_eq!(habit.emotion_tag(), None);
        assert!(!habit.is_completed());
    }

    #[test]
    fn emotion_tag_is_exposed_for_real_emotions() {
        let emotion = entry(EntryDetails::Emotion {
            status: ScheduleStatus::Scheduled,
            emotion_type: Some("grateful".to_string()),
        });
        assert_eq!(emotion.entry_type(), EntryType::Emotion);
        assert_eq!(emotion.emotion_tag(), Some("grateful"));
    }

    #[test]
    fn for_type_maps_completion_per_kind() {
        assert_eq!(
            EntryDetails::for_type(EntryType::Task, true, None, None),
            EntryDetails::Task {
                status: TaskStatus::Completed
            }
        );
        assert_eq!(
            EntryDetails::for_type(EntryType::Note, false, None, None),
            EntryDetails::Note {
                status: ScheduleStatus::Scheduled
            }
        );
        assert!(!EntryDetails::for_type(EntryType::Emotion, true, None, None).is_completed());
    }

    #[test]
    fn touch_always_moves_updated_at_forward() {
        let mut task = entry(EntryDetails::Task {
            status: TaskStatus::Todo,
        });
        let created = task.created_at;
        let before = task.updated_at;
        task.touch();
        task.touch();
        assert!(task.updated_at >= before + 2);
        assert_eq!(task.created_at, created);
    }

    #[test]
    fn validate_rejects_half_set_position() {
        let mut task = entry(EntryDetails::Task {
            status: TaskStatus::Todo,
        });
        task.line_number = Some(2);
        assert_eq!(
            task.validate().unwrap_err(),
            EntryValidationError::IncompletePosition
        );

        task.position_hash = Some("not-a-digest".to_string());
        assert!(matches!(
            task.validate().unwrap_err(),
            EntryValidationError::InvalidPositionHash(_)
        ));
    }

    #[test]
    fn validate_rejects_blank_content() {
        let mut note = entry(EntryDetails::Note {
            status: ScheduleStatus::Scheduled,
        });
        note.content = "   ".to_string();
        assert_eq!(note.validate().unwrap_err(), EntryValidationError::EmptyContent);
    }
}
