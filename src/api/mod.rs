// src/api/mod.rs
//! Vista API interaction: the ability to read listings and their history.
//!
//! The module keeps I/O, retry classification, pagination and payload
//! decoding apart. Business logic depends on [`ApiTransport`], never on
//! HTTP details.

pub mod client;
pub mod pagination;
pub mod responses;
pub mod retry;
pub mod types;

use crate::error::AppError;

/// Result of an HTTP operation with response metadata.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: reqwest::StatusCode,
    pub url: String,
}

/// The ability to issue one read-only request against the Vista API.
///
/// Implementations perform exactly one HTTP exchange per call; retries are
/// the caller's business (see [`retry::RetryPolicy`]).
#[async_trait::async_trait]
pub trait ApiTransport: Send + Sync {
    async fn get(&self, request: &types::RequestDescriptor) -> Result<ApiResponse<String>, AppError>;
}

// Re-export the public interface
pub use client::VistaHttpClient;
pub use pagination::{ListingFetcher, ListingPage, PageCursor};
pub use responses::{DetailBody, ListingPageBody, RawHistoryEntry, RawListing};
pub use retry::{Fetched, Pause, RecordingPause, RetryPolicy, TokioPause};
pub use types::{ListingQuery, RequestDescriptor};
