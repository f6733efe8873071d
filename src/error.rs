// src/error.rs
//! Application error types with structured error handling.
//!
//! Each variant names a failure mode of the sync run and where it happened,
//! so callers can decide between aborting a phase and skipping one item.

use std::fmt;
use thiserror::Error;

/// Which side of the run a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOrigin {
    /// The Vista listing or detail endpoints
    Api,
    /// The Supabase / PostgREST store
    Store,
}

impl fmt::Display for FailureOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api => write!(f, "api"),
            Self::Store => write!(f, "store"),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Transport error talking to the {origin}: {message}")]
    Transport {
        origin: FailureOrigin,
        message: String,
    },

    #[error("API returned an error (status {status}): {message}")]
    ApiService { status: String, message: String },

    #[error("Malformed API page: {0}")]
    MalformedPage(String),

    #[error("Could not decode response (HTTP {status}): {snippet}")]
    Decode { status: u16, snippet: String },

    #[error("Gave up on {request} after {attempts} attempts (last status: {}): {last_body}", display_status(.last_status))]
    RetryExhausted {
        request: String,
        attempts: u32,
        last_status: Option<u16>,
        last_body: String,
    },

    #[error("Store rejected write to {table}: {payload}")]
    Sink { table: String, payload: String },

    #[error("Malformed store response: {0}")]
    MalformedResponse(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    ValidationError(#[from] crate::types::ValidationError),
}

impl AppError {
    /// Whether this failure aborts a phase or can be isolated to one item.
    ///
    /// Only per-call failures are isolatable; configuration and API envelope
    /// errors mean every later call would fail the same way.
    pub fn is_isolatable(&self) -> bool {
        matches!(
            self,
            Self::RetryExhausted { .. }
                | Self::Decode { .. }
                | Self::Transport { .. }
                | Self::ApiService { .. }
                | Self::MalformedPage(_)
                | Self::Sink { .. }
        )
    }
}

fn display_status(status: &Option<u16>) -> String {
    status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "none".to_string())
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_exhausted_display() {
        let err = AppError::RetryExhausted {
            request: "detail A1".to_string(),
            attempts: 4,
            last_status: Some(503),
            last_body: "unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Gave up on detail A1 after 4 attempts (last status: 503): unavailable"
        );

        let err = AppError::RetryExhausted {
            request: "page 2".to_string(),
            attempts: 1,
            last_status: None,
            last_body: String::new(),
        };
        assert!(err.to_string().contains("last status: none"));
    }

    #[test]
    fn test_isolatable_classification() {
        assert!(AppError::Decode {
            status: 200,
            snippet: "<html>".to_string()
        }
        .is_isolatable());
        assert!(!AppError::MissingConfiguration("SUPABASE_URL".to_string()).is_isolatable());
        assert!(!AppError::MalformedResponse("x".to_string()).is_isolatable());
    }

    #[test]
    fn test_api_service_display() {
        let err = AppError::ApiService {
            status: "401".to_string(),
            message: "Chave invalida".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API returned an error (status 401): Chave invalida"
        );
    }
}
