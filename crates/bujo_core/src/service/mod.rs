//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own transaction boundaries: one unit of work per page scan, per
//!   re-extraction and per entry mutation.
//! - Keep the CLI decoupled from storage details.

pub mod entry_service;
pub mod migration;
pub mod page_service;
pub mod reconcile;
pub mod request;
pub mod scan_service;
pub mod view;

use crate::model::entry::UnknownEntryType;
use crate::repo::entry_repo::RepoError;
use thiserror::Error;
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error shared by scan and entry use-cases.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Target entry or page does not exist.
    #[error("not found: {0}")]
    NotFound(Uuid),
    /// Target exists but belongs to another owner.
    #[error("access denied: {0}")]
    Forbidden(Uuid),
    #[error(transparent)]
    InvalidKind(#[from] UnknownEntryType),
    /// Request fields failed validation.
    #[error("invalid request: {0}")]
    Validation(String),
    /// Persistence-layer failure.
    #[error(transparent)]
    Store(RepoError),
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err.to_string()),
            other => Self::Store(other),
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Store(RepoError::from(value))
    }
}

impl ServiceError {
    /// Stable machine-readable code for logs and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Forbidden(_) => "forbidden",
            Self::InvalidKind(_) => "invalid_kind",
            Self::Validation(_) => "validation",
            Self::Store(_) => "store",
        }
    }
}
