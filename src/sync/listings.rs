use super::report::ListingPhaseReport;
use super::SyncEngine;
use crate::api::{ListingFetcher, ListingQuery};
use crate::error::AppError;
use crate::normalize::normalize_listings;
use crate::store::ConflictKey;

impl SyncEngine {
    /// Phase 1: fetch every listing, normalize, upsert on the identity column.
    ///
    /// Fetch errors abort the phase. Rejected batches are counted in the
    /// report and do not stop later batches.
    pub async fn sync_listings(&self) -> Result<ListingPhaseReport, AppError> {
        let api = &self.config.api;
        let store = &self.config.store;

        let fetcher = ListingFetcher::new(
            self.transport.clone(),
            self.policy.clone(),
            api.clone(),
            ListingQuery::for_sync(api.listing_page_size),
        );
        let items = fetcher.fetch_all().await?;
        log::info!("Fetched {} listing(s) from the API", items.len());

        if let Some(first) = items.first() {
            if log::log_enabled!(log::Level::Debug) {
                log::debug!(
                    "First listing received:\n{}",
                    serde_json::to_string_pretty(first).unwrap_or_else(|_| first.to_string())
                );
            }
        }

        let (records, dropped) = normalize_listings(&items);
        let rows = records
            .iter()
            .map(|record| record.to_row(&store.identity_column))
            .collect::<Result<Vec<_>, _>>()?;

        let key = ConflictKey::single(store.identity_column.clone());
        log::info!(
            "Upserting {} listing(s) into {} on {}",
            rows.len(),
            store.listings_table,
            key
        );
        let upsert = self.sink.upsert(&store.listings_table, rows, &key).await;

        Ok(ListingPhaseReport {
            fetched: items.len(),
            dropped,
            upsert,
        })
    }
}
