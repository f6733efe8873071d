use super::report::{HistoryPhaseReport, SkippedListing};
use super::SyncEngine;
use crate::api::types::detail_request;
use crate::api::{DetailBody, Fetched};
use crate::error::AppError;
use crate::normalize::normalize_history;
use crate::store::UpsertSummary;
use crate::types::ListingCode;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;

/// What happened to one listing during the history phase.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingOutcome {
    Synced {
        code: ListingCode,
        entries: usize,
        upsert: UpsertSummary,
    },
    NoHistory {
        code: ListingCode,
    },
    Skipped {
        code: ListingCode,
        reason: String,
    },
}

impl HistoryPhaseReport {
    fn record(&mut self, outcome: ListingOutcome) {
        match outcome {
            ListingOutcome::Synced {
                entries, upsert, ..
            } => {
                self.with_history += 1;
                self.entries += entries;
                self.upsert.merge(upsert);
            }
            ListingOutcome::NoHistory { .. } => self.without_history += 1,
            ListingOutcome::Skipped { code, reason } => {
                self.skipped.push(SkippedListing { code, reason })
            }
        }
    }
}

impl SyncEngine {
    /// Reads every listing code from the store, page by page.
    ///
    /// Stops at the first page shorter than the page size. Rows with a
    /// missing or blank code are skipped.
    pub async fn enumerate_listing_codes(&self) -> Result<Vec<ListingCode>, AppError> {
        let store = &self.config.store;
        let size = u64::from(store.read_page_size);
        let mut codes = Vec::new();
        let mut page = 0u64;

        loop {
            let from = page * size;
            let to = from + size - 1;
            let rows = self
                .store
                .select_column(&store.listings_table, &store.identity_column, from, to)
                .await?;

            let before = codes.len();
            codes.extend(rows.iter().filter_map(|row| {
                let code = match row.get(store.identity_column.as_str())? {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    _ => return None,
                };
                ListingCode::new(code).ok()
            }));
            log::info!(
                "Store page {}: {} row(s), {} code(s)",
                page + 1,
                rows.len(),
                codes.len() - before
            );

            if (rows.len() as u64) < size {
                break;
            }
            page += 1;
        }

        log::info!("Found {} listing code(s) in {}", codes.len(), store.listings_table);
        Ok(codes)
    }

    /// Fetches, normalizes and upserts the history of one listing.
    ///
    /// Pacing applies after the fetch whatever its outcome. Per-listing
    /// failures become [`ListingOutcome::Skipped`]; anything else aborts.
    pub async fn sync_listing_history(&self, code: ListingCode) -> Result<ListingOutcome, AppError> {
        let request = detail_request(&self.config.api, &code);
        let fetched = self.policy.execute(self.transport.as_ref(), &request).await;
        self.pause.pause(self.config.api.pacing).await;

        let detail = match fetched.and_then(|fetched| match fetched {
            Fetched::Payload(body) => DetailBody::from_value(body).map(Some),
            Fetched::NoData => Ok(None),
        }) {
            Ok(Some(detail)) if !detail.is_empty() => detail,
            Ok(_) => return Ok(ListingOutcome::NoHistory { code }),
            Err(e) if e.is_isolatable() => {
                log::warn!("Skipping history of listing {}: {}", code, e);
                return Ok(ListingOutcome::Skipped {
                    code,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let records = normalize_history(&code, &detail);
        let rows = records
            .iter()
            .map(|record| record.to_row())
            .collect::<Result<Vec<_>, _>>()?;

        let upsert = self
            .sink
            .upsert(&self.config.store.history_table, rows, &self.history_key)
            .await;
        log::debug!(
            "Listing {}: {} entries, {} written",
            code,
            records.len(),
            upsert.written
        );

        Ok(ListingOutcome::Synced {
            code,
            entries: records.len(),
            upsert,
        })
    }

    /// Phase 2: sync the history of every listing known to the store.
    ///
    /// Listings run through an ordered buffer of at most `concurrency`
    /// in flight; outcomes are recorded in enumeration order.
    pub async fn sync_history(&self) -> Result<HistoryPhaseReport, AppError> {
        let codes = self.enumerate_listing_codes().await?;
        let total = codes.len();
        let mut report = HistoryPhaseReport {
            enumerated: total,
            ..Default::default()
        };

        let outcomes = stream::iter(codes.into_iter().enumerate())
            .map(|(index, code)| async move {
                log::info!("[{}/{}] Listing {}", index + 1, total, code);
                self.sync_listing_history(code).await
            })
            .buffered(self.config.concurrency.max(1));
        futures::pin_mut!(outcomes);

        while let Some(outcome) = outcomes.try_next().await? {
            report.record(outcome);
        }

        Ok(report)
    }
}
