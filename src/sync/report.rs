//! What a sync run did, for logging at the end of each phase.

use crate::store::UpsertSummary;
use crate::types::ListingCode;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of the listings phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingPhaseReport {
    /// Raw items returned by the API
    pub fetched: usize,
    /// Items dropped because they had no code
    pub dropped: usize,
    pub upsert: UpsertSummary,
}

/// A listing whose history could not be synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedListing {
    pub code: ListingCode,
    pub reason: String,
}

/// Outcome of the history phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryPhaseReport {
    /// Listing codes read from the store
    pub enumerated: usize,
    pub with_history: usize,
    pub without_history: usize,
    /// History entries normalized across all listings
    pub entries: usize,
    pub skipped: Vec<SkippedListing>,
    pub upsert: UpsertSummary,
}

/// Summary of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub listings: Option<ListingPhaseReport>,
    pub history: Option<HistoryPhaseReport>,
}

impl Default for SyncReport {
    fn default() -> Self {
        Self::start()
    }
}

impl SyncReport {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            listings: None,
            history: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Whether any batch or listing failed along the way.
    pub fn has_failures(&self) -> bool {
        let listing_failures = self
            .listings
            .as_ref()
            .is_some_and(|l| l.upsert.failed_batches > 0);
        let history_failures = self
            .history
            .as_ref()
            .is_some_and(|h| h.upsert.failed_batches > 0 || !h.skipped.is_empty());
        listing_failures || history_failures
    }

    pub fn log_summary(&self) {
        let elapsed = self
            .finished_at
            .map(|end| end - self.started_at)
            .map(|d| format!("{}.{:03}s", d.num_seconds(), d.num_milliseconds() % 1000))
            .unwrap_or_else(|| "unfinished".to_string());

        log::info!("Sync run started at {} ({})", self.started_at.to_rfc3339(), elapsed);
        if let Some(listings) = &self.listings {
            listings.log_summary();
        }
        if let Some(history) = &self.history {
            history.log_summary();
        }
    }
}

impl ListingPhaseReport {
    pub fn log_summary(&self) {
        log::info!(
            "Listings: {} fetched, {} dropped without code, {} written in {} batch(es), {} batch(es) rejected",
            self.fetched,
            self.dropped,
            self.upsert.written,
            self.upsert.batches,
            self.upsert.failed_batches
        );
    }
}

impl HistoryPhaseReport {
    pub fn log_summary(&self) {
        log::info!(
            "History: {} listing(s) enumerated, {} with history, {} without, {} skipped; {} entries, {} written, {} batch(es) rejected",
            self.enumerated,
            self.with_history,
            self.without_history,
            self.skipped.len(),
            self.entries,
            self.upsert.written,
            self.upsert.failed_batches
        );
        for skipped in &self.skipped {
            log::warn!("  skipped {}: {}", skipped.code, skipped.reason);
        }
    }
}
