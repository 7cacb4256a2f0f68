//! Page lookups and the per-owner manual-entry container.
//!
//! # Invariants
//! - `ensure_manual_page` is get-or-create: an owner never gets a second
//!   manual page.
//! - A page owned by someone else is reported as `Forbidden`, never returned.

use super::{ServiceError, ServiceResult};
use crate::model::page::{Page, PageId};
use crate::model::UserId;
use crate::repo::page_repo::{PageRepository, SqlitePageRepository};
use log::info;
use rusqlite::Connection;

/// Returns the owner's manual page, creating it on first use.
pub fn ensure_manual_page<P: PageRepository>(pages: &P, owner_id: UserId) -> ServiceResult<Page> {
    if let Some(page) = pages.find_manual_page(owner_id)? {
        return Ok(page);
    }

    let page = Page::manual(owner_id);
    pages.create_page(&page)?;
    info!(
        "event=manual_page_create module=service status=ok page_id={}",
        page.id
    );
    Ok(page)
}

/// Loads `page_id` and checks it belongs to `owner_id`.
pub fn owned_page<P: PageRepository>(
    pages: &P,
    owner_id: UserId,
    page_id: PageId,
) -> ServiceResult<Page> {
    match pages.get_page(page_id)? {
        Some(page) if page.owner_id == owner_id => Ok(page),
        Some(_) => Err(ServiceError::Forbidden(page_id)),
        None => Err(ServiceError::NotFound(page_id)),
    }
}

/// Read-only page queries.
pub struct PageService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> PageService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn get_page(&self, owner_id: UserId, page_id: PageId) -> ServiceResult<Page> {
        owned_page(&SqlitePageRepository::new(self.conn), owner_id, page_id)
    }

    /// Lists the owner's pages, manual container included.
    pub fn list_pages(&self, owner_id: UserId) -> ServiceResult<Vec<Page>> {
        Ok(SqlitePageRepository::new(self.conn).list_pages(owner_id)?)
    }
}
