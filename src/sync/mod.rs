//! The two-phase synchronization engine.
//!
//! Phase 1 walks the listing API and upserts every listing. Phase 2 reads the
//! listing codes back from the store and syncs each listing's history. The
//! phases always run one after the other.

mod history;
mod listings;
pub mod report;

pub use history::ListingOutcome;
pub use report::{HistoryPhaseReport, ListingPhaseReport, SkippedListing, SyncReport};

use crate::api::{ApiTransport, Pause, RetryPolicy, TokioPause, VistaHttpClient};
use crate::config::SyncConfig;
use crate::constants::HISTORY_CONFLICT_COLUMNS;
use crate::error::AppError;
use crate::store::{ConflictKey, PostgrestStore, RecordStore, UpsertSink};
use crate::types::ColumnName;
use std::sync::Arc;

/// Which phases a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phases {
    /// Listings, then history
    All,
    ListingsOnly,
    HistoryOnly,
}

/// Shared clients and settings for one sync run.
pub struct SyncEngine {
    config: SyncConfig,
    transport: Arc<dyn ApiTransport>,
    store: Arc<dyn RecordStore>,
    policy: RetryPolicy,
    pause: Arc<dyn Pause>,
    sink: UpsertSink,
    history_key: ConflictKey,
}

impl SyncEngine {
    /// Wires the engine to explicit collaborators.
    ///
    /// `pause` is used both between retry attempts and for pacing between
    /// listings.
    pub fn new(
        config: SyncConfig,
        transport: Arc<dyn ApiTransport>,
        store: Arc<dyn RecordStore>,
        pause: Arc<dyn Pause>,
    ) -> Result<Self, AppError> {
        let history_key = ConflictKey::new(
            HISTORY_CONFLICT_COLUMNS
                .iter()
                .map(|c| ColumnName::new(*c))
                .collect::<Result<Vec<_>, _>>()?,
        );

        Ok(Self {
            policy: RetryPolicy::new(config.api.max_attempts, pause.clone()),
            sink: UpsertSink::new(store.clone(), config.store.batch_size),
            config,
            transport,
            store,
            pause,
            history_key,
        })
    }

    /// Builds the production engine: HTTP clients and real sleeping.
    pub fn from_config(config: SyncConfig) -> Result<Self, AppError> {
        let transport = Arc::new(VistaHttpClient::new(config.api.timeout)?);
        let store = Arc::new(PostgrestStore::new(&config.store)?);
        Self::new(config, transport, store, Arc::new(TokioPause))
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Runs the requested phases in order.
    ///
    /// A phase-1 error aborts the run before phase 2 starts.
    pub async fn run(&self, phases: Phases) -> Result<SyncReport, AppError> {
        let mut report = SyncReport::start();

        if matches!(phases, Phases::All | Phases::ListingsOnly) {
            log::info!("Phase 1: syncing listings");
            let listings = self.sync_listings().await?;
            report.listings = Some(listings);
        }

        if matches!(phases, Phases::All | Phases::HistoryOnly) {
            log::info!("Phase 2: syncing listing history");
            let history = self.sync_history().await?;
            report.history = Some(history);
        }

        report.finish();
        report.log_summary();
        Ok(report)
    }
}
