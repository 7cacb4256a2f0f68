//! Page scan pipeline: page insert, extraction and reconciliation.
//!
//! # Responsibility
//! - Persist one page per scanned image together with its reconciled entries.
//! - Re-run extraction on demand against a stored page.
//!
//! # Invariants
//! - Each page is one IMMEDIATE transaction; a failure leaves no page row and
//!   no entries for that page.
//! - Batches run sequentially; a failed page never rolls back earlier pages.
//! - Unavailable OCR, blank text and failure reports store the page but write
//!   no entries.

use super::page_service::owned_page;
use super::reconcile::{reconcile_page, ExtractionSummary};
use super::ServiceResult;
use crate::config::ExtractionOptions;
use crate::extract::{extract_page, is_extractable};
use crate::model::page::{Page, PageId};
use crate::model::UserId;
use crate::repo::entry_repo::SqliteEntryRepository;
use crate::repo::page_repo::{PageRepository, SqlitePageRepository};
use log::{error, info};
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use std::time::Instant;

/// Text result handed over by the OCR collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrText {
    pub text: String,
    /// `false` when no OCR engine could run at all.
    pub available: bool,
}

impl OcrText {
    pub fn recognized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            text: String::new(),
            available: false,
        }
    }
}

/// One page scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub ocr: OcrText,
    pub page_number: i64,
    pub thread_id: Option<String>,
}

/// Stored page plus what was extracted from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    pub page: Page,
    pub summary: ExtractionSummary,
    /// Human-readable status line.
    pub message: String,
}

/// Scan use-cases over one connection.
pub struct ScanService<'conn> {
    conn: &'conn mut Connection,
    options: ExtractionOptions,
}

impl<'conn> ScanService<'conn> {
    pub fn new(conn: &'conn mut Connection, options: ExtractionOptions) -> Self {
        Self { conn, options }
    }

    /// Stores one scanned page and reconciles its entries atomically.
    pub fn scan_page(&mut self, owner_id: UserId, request: ScanRequest) -> ServiceResult<ScanOutcome> {
        let started_at = Instant::now();
        let result = self.scan_page_in_tx(owner_id, request);
        match &result {
            Ok(outcome) => info!(
                "event=page_scan module=scan status=ok page_id={} page_number={} entries={} duration_ms={}",
                outcome.page.id,
                outcome.page.page_number,
                outcome.summary.total(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=page_scan module=scan status=error error_code={} duration_ms={} error={}",
                err.code(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    /// Scans `images` in order as pages `base_page_number`, `+1`, ...
    ///
    /// Returns one result per image; failures do not stop the batch.
    pub fn scan_pages(
        &mut self,
        owner_id: UserId,
        images: Vec<OcrText>,
        base_page_number: i64,
        thread_id: Option<String>,
    ) -> Vec<ServiceResult<ScanOutcome>> {
        let total = images.len();
        let results: Vec<_> = images
            .into_iter()
            .zip(base_page_number..)
            .map(|(ocr, page_number)| {
                self.scan_page(
                    owner_id,
                    ScanRequest {
                        ocr,
                        page_number,
                        thread_id: thread_id.clone(),
                    },
                )
            })
            .collect();

        let failed = results.iter().filter(|result| result.is_err()).count();
        info!(
            "event=page_batch module=scan status={} pages={} failed={}",
            if failed == 0 { "ok" } else { "partial" },
            total,
            failed
        );
        results
    }

    /// Re-runs extraction against the stored text of `page_id`.
    ///
    /// Manual pages have no scanned text and yield a zero summary.
    pub fn reextract_page(
        &mut self,
        owner_id: UserId,
        page_id: PageId,
    ) -> ServiceResult<ExtractionSummary> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let page = owned_page(&SqlitePageRepository::new(&tx), owner_id, page_id)?;
        if page.is_manual {
            info!(
                "event=page_reextract module=scan status=skip reason=manual_page page_id={}",
                page.id
            );
            return Ok(ExtractionSummary::default());
        }

        let extracted = extract_page(&page.extracted_text, &self.options);
        let summary = reconcile_page(&SqliteEntryRepository::new(&tx), &page, &extracted)?;
        tx.commit()?;

        info!(
            "event=page_reextract module=scan status=ok page_id={} entries={}",
            page.id,
            summary.total()
        );
        Ok(summary)
    }

    fn scan_page_in_tx(&mut self, owner_id: UserId, request: ScanRequest) -> ServiceResult<ScanOutcome> {
        let ScanRequest {
            ocr,
            page_number,
            thread_id,
        } = request;
        let text = if ocr.available { ocr.text } else { String::new() };
        let page = Page::scanned(owner_id, text, page_number, thread_id);

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        SqlitePageRepository::new(&tx).create_page(&page)?;

        let extractable = ocr.available && is_extractable(&page.extracted_text, &self.options);
        let summary = if extractable {
            let extracted = extract_page(&page.extracted_text, &self.options);
            reconcile_page(&SqliteEntryRepository::new(&tx), &page, &extracted)?
        } else {
            ExtractionSummary::default()
        };
        tx.commit()?;

        let message = scan_message(&page, ocr.available, extractable, &summary);
        Ok(ScanOutcome {
            page,
            summary,
            message,
        })
    }
}

fn scan_message(
    page: &Page,
    available: bool,
    extractable: bool,
    summary: &ExtractionSummary,
) -> String {
    if !available {
        return "Page scanned and saved. OCR is not available; no text was extracted.".to_string();
    }
    if !extractable {
        return "Page scanned and saved. OCR returned no usable text.".to_string();
    }
    format!(
        "Page scanned and saved. OCR extracted {} characters. Extracted: {} tasks, {} events, {} notes, {} emotions.",
        page.extracted_text.chars().count(),
        summary.tasks,
        summary.events,
        summary.notes,
        summary.emotions
    )
}
