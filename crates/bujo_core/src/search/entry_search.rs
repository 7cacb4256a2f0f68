//! Substring search across the four entry stores.
//!
//! # Responsibility
//! - Match entry content case-insensitively for one owner.
//! - Apply optional kind and status filters.
//!
//! # Invariants
//! - Only the owner's entries are returned.
//! - Ordering is deterministic: `created_at DESC, id ASC`.
//! - `total` counts every match; `hits` is capped by `limit`.

use crate::db::DbError;
use crate::model::entry::{EntryId, EntryKind, EntryType, ScheduleStatus, TaskStatus};
use crate::model::page::PageId;
use crate::model::UserId;
use crate::repo::entry_repo::{escape_like, table_name};
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

const DEFAULT_SEARCH_LIMIT: u32 = 50;
const HABIT_MARKER: &str = "habit";

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("invalid search row: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Search options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Substring matched against content; blank matches everything.
    pub text: String,
    /// Restrict to one store.
    pub kind: Option<EntryKind>,
    /// Status label (`TODO`, `COMPLETED`, ...) applied to tasks and events.
    pub status: Option<String>,
    /// Maximum number of hits to return.
    pub limit: u32,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: None,
            status: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// One matching entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub entry_id: EntryId,
    /// Public kind; habit records report `habit`.
    pub kind: EntryType,
    pub content: String,
    pub status: String,
    pub symbol: Option<String>,
    pub event_date: Option<String>,
    pub emotion_tag: Option<String>,
    pub page_id: PageId,
    pub page_number: i64,
    #[serde(skip)]
    created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    pub total: usize,
}

/// Searches the owner's entries.
pub fn search_entries(
    conn: &Connection,
    owner_id: UserId,
    query: &SearchQuery,
) -> SearchResult<SearchResults> {
    let kinds: Vec<EntryKind> = match query.kind {
        Some(kind) => vec![kind],
        None => EntryKind::LOOKUP_ORDER.to_vec(),
    };
    let needle = query.text.trim();

    let mut hits = Vec::new();
    for kind in kinds {
        let status = query
            .status
            .as_deref()
            .and_then(|label| status_filter(kind, label));
        hits.extend(search_store(conn, kind, owner_id, needle, status)?);
    }
    hits.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| left.entry_id.cmp(&right.entry_id))
    });

    let total = hits.len();
    hits.truncate(usize::try_from(query.limit).unwrap_or(usize::MAX));
    info!(
        "event=entry_search module=search status=ok kind={} total={} returned={}",
        query.kind.map_or("all", EntryKind::as_str),
        total,
        hits.len()
    );
    Ok(SearchResults { hits, total })
}

/// Maps a status label to the stored value for `kind`.
///
/// Notes and emotions are never status-filtered.
fn status_filter(kind: EntryKind, label: &str) -> Option<&'static str> {
    if label.trim().is_empty() {
        return None;
    }
    let stored = match kind {
        EntryKind::Task => TaskStatus::from_label(label).map(|status| match status {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }),
        EntryKind::Event => ScheduleStatus::from_label(label).map(|status| match status {
            ScheduleStatus::Scheduled => "scheduled",
            ScheduleStatus::Completed => "completed",
        }),
        EntryKind::Note | EntryKind::Emotion => return None,
    };
    if stored.is_none() {
        warn!(
            "event=entry_search module=search status=skip reason=unknown_status kind={}",
            kind
        );
    }
    stored
}

fn search_store(
    conn: &Connection,
    kind: EntryKind,
    owner_id: UserId,
    needle: &str,
    status: Option<&str>,
) -> SearchResult<Vec<SearchHit>> {
    let extra = match kind {
        EntryKind::Event => "e.event_date AS event_date, NULL AS emotion_type",
        EntryKind::Emotion => "NULL AS event_date, e.emotion_type AS emotion_type",
        EntryKind::Task | EntryKind::Note => "NULL AS event_date, NULL AS emotion_type",
    };
    let mut sql = format!(
        "SELECT
            e.id AS id,
            e.content AS content,
            e.status AS status,
            e.symbol AS symbol,
            {extra},
            e.page_id AS page_id,
            p.page_number AS page_number,
            e.created_at AS created_at
         FROM {} e
         JOIN pages p ON p.id = e.page_id
         WHERE e.owner_id = ?",
        table_name(kind)
    );
    let mut bind_values = vec![Value::Text(owner_id.to_string())];

    if !needle.is_empty() {
        sql.push_str(" AND e.content LIKE ? ESCAPE '\\'");
        bind_values.push(Value::Text(format!("%{}%", escape_like(needle))));
    }
    if let Some(status) = status {
        sql.push_str(" AND e.status = ?");
        bind_values.push(Value::Text(status.to_string()));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut hits = Vec::new();
    while let Some(row) = rows.next()? {
        hits.push(parse_search_hit(kind, row)?);
    }
    Ok(hits)
}

fn parse_search_hit(kind: EntryKind, row: &Row<'_>) -> SearchResult<SearchHit> {
    let emotion_type: Option<String> = row.get("emotion_type")?;
    let is_habit = emotion_type.as_deref() == Some(HABIT_MARKER);
    let entry_type = match kind {
        EntryKind::Task => EntryType::Task,
        EntryKind::Event => EntryType::Event,
        EntryKind::Note => EntryType::Note,
        EntryKind::Emotion if is_habit => EntryType::Habit,
        EntryKind::Emotion => EntryType::Emotion,
    };
    let status: String = row.get("status")?;

    Ok(SearchHit {
        entry_id: parse_id(row.get::<_, String>("id")?)?,
        kind: entry_type,
        content: row.get("content")?,
        status: status.to_ascii_uppercase(),
        symbol: row.get("symbol")?,
        event_date: row.get("event_date")?,
        emotion_tag: emotion_type.filter(|tag| !is_habit && !tag.trim().is_empty()),
        page_id: parse_id(row.get::<_, String>("page_id")?)?,
        page_number: row.get("page_number")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_id(value: String) -> SearchResult<Uuid> {
    Uuid::parse_str(&value).map_err(|_| SearchError::InvalidData(format!("invalid uuid `{value}`")))
}
