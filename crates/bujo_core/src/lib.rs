//! Core domain logic for the bullet journal scanner.
//! Turns OCR page text into typed journal entries and keeps them reconciled
//! across repeated scans.

pub mod config;
pub mod db;
pub mod extract;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{ConfigError, CoreConfig, ExtractionOptions};
pub use db::{open_db, open_db_in_memory, DbError};
pub use extract::{classify_line, extract_page, position_identity, ExtractedPage};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::entry::{
    Entry, EntryDetails, EntryId, EntryKind, EntryType, ScheduleStatus, TaskStatus,
};
pub use model::page::{Page, PageId};
pub use model::UserId;
pub use repo::entry_repo::{RepoError, RepoResult};
pub use search::{search_entries, SearchError, SearchHit, SearchQuery, SearchResults};
pub use service::entry_service::EntryService;
pub use service::page_service::PageService;
pub use service::reconcile::ExtractionSummary;
pub use service::request::EntryRequest;
pub use service::scan_service::{OcrText, ScanOutcome, ScanRequest, ScanService};
pub use service::view::{EntryView, ExtractedItemView};
pub use service::{ServiceError, ServiceResult};
