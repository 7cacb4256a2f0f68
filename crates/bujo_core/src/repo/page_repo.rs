//! Page repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Each owner has at most one manual page (partial unique index).
//! - Listing is ordered by `page_number ASC, created_at ASC`.

use crate::model::page::{Page, PageId};
use crate::model::UserId;
use crate::repo::entry_repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const PAGE_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    extracted_text,
    page_number,
    thread_id,
    is_manual,
    created_at,
    updated_at
FROM pages";

/// Store interface for journal pages.
pub trait PageRepository {
    fn create_page(&self, page: &Page) -> RepoResult<PageId>;
    fn get_page(&self, id: PageId) -> RepoResult<Option<Page>>;
    fn list_pages(&self, owner_id: UserId) -> RepoResult<Vec<Page>>;
    fn find_manual_page(&self, owner_id: UserId) -> RepoResult<Option<Page>>;
}

/// SQLite-backed page repository.
pub struct SqlitePageRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePageRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PageRepository for SqlitePageRepository<'_> {
    fn create_page(&self, page: &Page) -> RepoResult<PageId> {
        self.conn.execute(
            "INSERT INTO pages (
                id,
                owner_id,
                extracted_text,
                page_number,
                thread_id,
                is_manual,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                page.id.to_string(),
                page.owner_id.to_string(),
                page.extracted_text.as_str(),
                page.page_number,
                page.thread_id.as_deref(),
                i64::from(page.is_manual),
                page.created_at,
                page.updated_at,
            ],
        )?;
        Ok(page.id)
    }

    fn get_page(&self, id: PageId) -> RepoResult<Option<Page>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PAGE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_page_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_pages(&self, owner_id: UserId) -> RepoResult<Vec<Page>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PAGE_SELECT_SQL}
             WHERE owner_id = ?1
             ORDER BY page_number ASC, created_at ASC;"
        ))?;
        let mut rows = stmt.query([owner_id.to_string()])?;
        let mut pages = Vec::new();
        while let Some(row) = rows.next()? {
            pages.push(parse_page_row(row)?);
        }
        Ok(pages)
    }

    fn find_manual_page(&self, owner_id: UserId) -> RepoResult<Option<Page>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PAGE_SELECT_SQL} WHERE owner_id = ?1 AND is_manual = 1;"
        ))?;
        let mut rows = stmt.query([owner_id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_page_row(row)?)),
            None => Ok(None),
        }
    }
}

fn parse_page_row(row: &Row<'_>) -> RepoResult<Page> {
    let is_manual = match row.get::<_, i64>("is_manual")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_manual value `{other}` in pages.is_manual"
            )));
        }
    };

    Ok(Page {
        id: parse_uuid(&row.get::<_, String>("id")?, "pages", "id")?,
        owner_id: parse_uuid(&row.get::<_, String>("owner_id")?, "pages", "owner_id")?,
        extracted_text: row.get("extracted_text")?,
        page_number: row.get("page_number")?,
        thread_id: row.get("thread_id")?,
        is_manual,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
