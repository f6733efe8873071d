// src/lib.rs
//! vista-sync library: keeps a Supabase store in step with the Vista
//! real-estate API.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ValidationError`
//! - **Configuration**: `SyncConfig`, `ApiConfig`, `StoreConfig`, `CommandLineInput`
//! - **API client**: `VistaHttpClient`, `RetryPolicy`, `ListingFetcher`
//! - **Normalization**: `normalize_listing`, `normalize_history_entry` and the field normalizers
//! - **Store**: `RecordStore`, `PostgrestStore`, `MemoryStore`, `UpsertSink`
//! - **Sync**: `SyncEngine`, `SyncReport`
//! - **Export**: `export_snapshot`

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod model;
pub mod normalize;
pub mod store;
pub mod sync;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, FailureOrigin};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{ApiConfig, Command, CommandLineInput, StoreConfig, SyncConfig};

// --- Domain Types ---
pub use crate::types::{ApiKey, ColumnName, ListingCode, TableName, ValidatedUrl};

// --- Records ---
pub use crate::model::{HistoryRecord, ListingRecord, Row};

// --- API Client ---
pub use crate::api::{
    ApiResponse, ApiTransport, DetailBody, Fetched, ListingFetcher, ListingQuery, Pause,
    RawHistoryEntry, RawListing, RecordingPause, RequestDescriptor, RetryPolicy, TokioPause,
    VistaHttpClient,
};

// --- Normalization ---
pub use crate::normalize::{
    normalize_amount, normalize_bool, normalize_child_key, normalize_date, normalize_history,
    normalize_history_entry, normalize_listing, normalize_listings, normalize_text,
};

// --- Store ---
pub use crate::store::{
    ConflictKey, MemoryStore, PostgrestStore, RecordStore, StoreResponse, UpsertSink,
    UpsertSummary,
};

// --- Sync ---
pub use crate::sync::{
    HistoryPhaseReport, ListingOutcome, ListingPhaseReport, Phases, SkippedListing, SyncEngine,
    SyncReport,
};

// --- Export ---
pub use crate::export::{export_snapshot, write_snapshot, SnapshotRow};
