// src/api/client.rs
//! Pure HTTP client wrapper for the Vista API.
//!
//! A thin wrapper around reqwest: one GET per call, body read as text,
//! no classification or parsing.

use super::types::RequestDescriptor;
use super::{ApiResponse, ApiTransport};
use crate::error::{AppError, FailureOrigin};
use reqwest::{header, Client, Response};
use std::time::Duration;

/// A thin wrapper around reqwest Client for Vista API requests.
#[derive(Clone)]
pub struct VistaHttpClient {
    client: Client,
}

impl VistaHttpClient {
    /// Creates a new HTTP client that asks for JSON and gives up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers())
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Creates the default headers for Vista API requests.
    fn create_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers
    }
}

#[async_trait::async_trait]
impl ApiTransport for VistaHttpClient {
    async fn get(&self, request: &RequestDescriptor) -> Result<ApiResponse<String>, AppError> {
        log::debug!("GET {} ({})", request.url, request.label);

        let response = self
            .client
            .get(request.url.as_url().clone())
            .query(&request.query)
            .send()
            .await
            .map_err(|e| transport_error(FailureOrigin::Api, e))?;

        extract_response_text(response, FailureOrigin::Api).await
    }
}

/// Extracts the response body as text with metadata.
///
/// A body that cannot be read counts as a transport failure of `origin`.
pub async fn extract_response_text(
    response: Response,
    origin: FailureOrigin,
) -> Result<ApiResponse<String>, AppError> {
    let status = response.status();
    let url = response.url().to_string();
    let text = response
        .text()
        .await
        .map_err(|e| transport_error(origin, e))?;

    Ok(ApiResponse {
        data: text,
        status,
        url,
    })
}

/// Wraps a reqwest failure, keeping the timeout/connect distinction readable.
pub(crate) fn transport_error(origin: FailureOrigin, err: reqwest::Error) -> AppError {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_body() || err.is_decode() {
        "body could not be read"
    } else {
        "request failed"
    };
    AppError::Transport {
        origin,
        message: format!("{}: {}", kind, err),
    }
}
