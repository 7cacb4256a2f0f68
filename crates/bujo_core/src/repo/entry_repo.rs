//! Entry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over the four typed entry tables.
//! - Map the `(page_id, position_hash)` unique constraint to `RepoError::Conflict`.
//!
//! # Invariants
//! - Write paths call `Entry::validate()` before SQL mutations.
//! - Updates never rewrite `id`, `owner_id`, `page_id` or `created_at`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::entry::{
    Entry, EntryDetails, EntryId, EntryKind, EntryValidationError, ScheduleStatus, TaskStatus,
};
use crate::model::page::PageId;
use crate::model::UserId;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use thiserror::Error;
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by page and entry persistence.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] EntryValidationError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("record not found: {0}")]
    NotFound(Uuid),
    #[error("{kind} at position {position_hash} already exists on page {page_id}")]
    Conflict {
        kind: EntryKind,
        page_id: PageId,
        position_hash: String,
    },
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Filters for listing entries of one kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryListQuery {
    pub owner_id: Option<UserId>,
    /// Restrict to one parent page.
    pub page_id: Option<PageId>,
    /// Exclude entries whose parent page is a manual-entry container.
    pub scanned_only: bool,
    /// Case-insensitive substring match on content.
    pub content_contains: Option<String>,
}

/// Store interface over the typed entry tables.
pub trait EntryRepository {
    fn insert_entry(&self, entry: &Entry) -> RepoResult<EntryId>;
    fn update_entry(&self, entry: &Entry) -> RepoResult<()>;
    fn delete_entry(&self, kind: EntryKind, id: EntryId) -> RepoResult<()>;
    fn get_entry(&self, kind: EntryKind, id: EntryId) -> RepoResult<Option<Entry>>;
    fn find_by_position(
        &self,
        kind: EntryKind,
        page_id: PageId,
        position_hash: &str,
    ) -> RepoResult<Option<Entry>>;
    fn list_entries(&self, kind: EntryKind, query: &EntryListQuery) -> RepoResult<Vec<Entry>>;
}

/// SQLite-backed entry repository.
///
/// Borrows a `Connection`; pass a `Transaction` to run inside a unit of work.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    fn insert_entry(&self, entry: &Entry) -> RepoResult<EntryId> {
        entry.validate()?;

        let mut columns = vec![
            "id",
            "owner_id",
            "page_id",
            "content",
            "status",
            "symbol",
            "line_number",
            "position_hash",
            "created_at",
            "updated_at",
        ];
        let mut values = vec![
            Value::Text(entry.id.to_string()),
            Value::Text(entry.owner_id.to_string()),
            Value::Text(entry.page_id.to_string()),
            Value::Text(entry.content.clone()),
            Value::Text(status_to_db(&entry.details).to_string()),
            optional_text(entry.symbol.clone()),
            entry
                .line_number
                .map_or(Value::Null, |line| Value::Integer(i64::from(line))),
            optional_text(entry.position_hash.clone()),
            Value::Integer(entry.created_at),
            Value::Integer(entry.updated_at),
        ];
        if let Some((column, value)) = extra_column(&entry.details) {
            columns.push(column);
            values.push(value);
        }

        let placeholders = (1..=columns.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders});",
            table_name(entry.kind()),
            columns.join(", ")
        );

        self.conn
            .execute(&sql, params_from_iter(values))
            .map_err(|err| map_write_error(err, entry))?;
        Ok(entry.id)
    }

    fn update_entry(&self, entry: &Entry) -> RepoResult<()> {
        entry.validate()?;

        let mut assignments = vec![
            "content = ?2",
            "status = ?3",
            "symbol = ?4",
            "line_number = ?5",
            "position_hash = ?6",
            "updated_at = ?7",
        ];
        let mut values = vec![
            Value::Text(entry.id.to_string()),
            Value::Text(entry.content.clone()),
            Value::Text(status_to_db(&entry.details).to_string()),
            optional_text(entry.symbol.clone()),
            entry
                .line_number
                .map_or(Value::Null, |line| Value::Integer(i64::from(line))),
            optional_text(entry.position_hash.clone()),
            Value::Integer(entry.updated_at),
        ];
        if let Some((column, value)) = extra_column(&entry.details) {
            assignments.push(match column {
                "event_date" => "event_date = ?8",
                _ => "emotion_type = ?8",
            });
            values.push(value);
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?1;",
            table_name(entry.kind()),
            assignments.join(", ")
        );
        let changed = self
            .conn
            .execute(&sql, params_from_iter(values))
            .map_err(|err| map_write_error(err, entry))?;

        if changed == 0 {
            return Err(RepoError::NotFound(entry.id));
        }
        Ok(())
    }

    fn delete_entry(&self, kind: EntryKind, id: EntryId) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1;", table_name(kind)),
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn get_entry(&self, kind: EntryKind, id: EntryId) -> RepoResult<Option<Entry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE id = ?1;", select_sql(kind)))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_entry_row(kind, row)?)),
            None => Ok(None),
        }
    }

    fn find_by_position(
        &self,
        kind: EntryKind,
        page_id: PageId,
        position_hash: &str,
    ) -> RepoResult<Option<Entry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE page_id = ?1 AND position_hash = ?2;",
            select_sql(kind)
        ))?;
        let mut rows = stmt.query(params![page_id.to_string(), position_hash])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_entry_row(kind, row)?)),
            None => Ok(None),
        }
    }

    fn list_entries(&self, kind: EntryKind, query: &EntryListQuery) -> RepoResult<Vec<Entry>> {
        let mut sql = format!("{} WHERE 1 = 1", select_sql(kind));
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(owner_id) = query.owner_id {
            sql.push_str(" AND owner_id = ?");
            bind_values.push(Value::Text(owner_id.to_string()));
        }
        if let Some(page_id) = query.page_id {
            sql.push_str(" AND page_id = ?");
            bind_values.push(Value::Text(page_id.to_string()));
        }
        if query.scanned_only {
            sql.push_str(" AND page_id IN (SELECT id FROM pages WHERE is_manual = 0)");
        }
        if let Some(needle) = query
            .content_contains
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            sql.push_str(" AND content LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(format!("%{}%", escape_like(needle))));
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(kind, row)?);
        }
        Ok(entries)
    }
}

pub(crate) fn table_name(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Task => "tasks",
        EntryKind::Event => "events",
        EntryKind::Note => "notes",
        EntryKind::Emotion => "emotions",
    }
}

fn select_sql(kind: EntryKind) -> String {
    let extra = match kind {
        EntryKind::Event => "event_date, NULL AS emotion_type",
        EntryKind::Emotion => "NULL AS event_date, emotion_type",
        EntryKind::Task | EntryKind::Note => "NULL AS event_date, NULL AS emotion_type",
    };
    format!(
        "SELECT
            id,
            owner_id,
            page_id,
            content,
            status,
            symbol,
            line_number,
            position_hash,
            {extra},
            created_at,
            updated_at
         FROM {}",
        table_name(kind)
    )
}

fn extra_column(details: &EntryDetails) -> Option<(&'static str, Value)> {
    match details {
        EntryDetails::Event { event_date, .. } => Some((
            "event_date",
            optional_text(event_date.map(|date| date.format(DATE_FORMAT).to_string())),
        )),
        EntryDetails::Emotion { emotion_type, .. } => {
            Some(("emotion_type", optional_text(emotion_type.clone())))
        }
        EntryDetails::Task { .. } | EntryDetails::Note { .. } => None,
    }
}

fn parse_entry_row(kind: EntryKind, row: &Row<'_>) -> RepoResult<Entry> {
    let table = table_name(kind);
    let status_text: String = row.get("status")?;
    let details = match kind {
        EntryKind::Task => EntryDetails::Task {
            status: parse_task_status(&status_text).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid status `{status_text}` in {table}.status"))
            })?,
        },
        _ => {
            let status = parse_schedule_status(&status_text).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid status `{status_text}` in {table}.status"))
            })?;
            match kind {
                EntryKind::Event => {
                    let event_date = match row.get::<_, Option<String>>("event_date")? {
                        Some(value) => Some(
                            NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|_| {
                                RepoError::InvalidData(format!(
                                    "invalid date `{value}` in events.event_date"
                                ))
                            })?,
                        ),
                        None => None,
                    };
                    EntryDetails::Event { status, event_date }
                }
                EntryKind::Emotion => EntryDetails::Emotion {
                    status,
                    emotion_type: row.get("emotion_type")?,
                },
                _ => EntryDetails::Note { status },
            }
        }
    };

    let line_number = match row.get::<_, Option<i64>>("line_number")? {
        Some(value) => Some(u32::try_from(value).map_err(|_| {
            RepoError::InvalidData(format!("invalid line number `{value}` in {table}.line_number"))
        })?),
        None => None,
    };

    let entry = Entry {
        id: parse_uuid(&row.get::<_, String>("id")?, table, "id")?,
        owner_id: parse_uuid(&row.get::<_, String>("owner_id")?, table, "owner_id")?,
        page_id: parse_uuid(&row.get::<_, String>("page_id")?, table, "page_id")?,
        content: row.get("content")?,
        symbol: row.get("symbol")?,
        line_number,
        position_hash: row.get("position_hash")?,
        details,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    entry.validate()?;
    Ok(entry)
}

fn status_to_db(details: &EntryDetails) -> &'static str {
    match details {
        EntryDetails::Task { status } => match status {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        },
        EntryDetails::Event { status, .. }
        | EntryDetails::Note { status }
        | EntryDetails::Emotion { status, .. } => match status {
            ScheduleStatus::Scheduled => "scheduled",
            ScheduleStatus::Completed => "completed",
        },
    }
}

fn parse_task_status(value: &str) -> Option<TaskStatus> {
    match value {
        "todo" => Some(TaskStatus::Todo),
        "in_progress" => Some(TaskStatus::InProgress),
        "completed" => Some(TaskStatus::Completed),
        _ => None,
    }
}

fn parse_schedule_status(value: &str) -> Option<ScheduleStatus> {
    match value {
        "scheduled" => Some(ScheduleStatus::Scheduled),
        "completed" => Some(ScheduleStatus::Completed),
        _ => None,
    }
}

fn map_write_error(err: rusqlite::Error, entry: &Entry) -> RepoError {
    let unique_violation = matches!(
        &err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    );
    match (&entry.position_hash, unique_violation) {
        (Some(position_hash), true) => RepoError::Conflict {
            kind: entry.kind(),
            page_id: entry.page_id,
            position_hash: position_hash.clone(),
        },
        _ => err.into(),
    }
}

pub(crate) fn parse_uuid(value: &str, table: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{value}` in {table}.{column}"))
    })
}

fn optional_text(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::Text)
}

pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
