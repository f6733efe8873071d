// src/api/retry.rs
//! Bounded retry with backoff and failure classification for API calls.
//!
//! A [`RetryPolicy`] is a plain value: a maximum attempt count, a classifier
//! function, a backoff function and a [`Pause`] used for sleeping between
//! attempts. Tests swap the pause for a [`RecordingPause`] and observe the
//! backoff schedule without waiting.

use super::types::RequestDescriptor;
use super::{ApiResponse, ApiTransport};
use crate::constants::{
    DECODE_SNIPPET_LENGTH, DEFAULT_MAX_ATTEMPTS, ERROR_BODY_PREVIEW_LENGTH,
    GENERIC_BACKOFF_BASE_SECS, GENERIC_BACKOFF_STEP_SECS, NO_HISTORY_MARKER,
    RATE_LIMIT_BACKOFF_STEP_SECS, TOO_MANY_CONNECTIONS_MARKER,
};
use crate::error::AppError;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A successful call: either a decoded payload or the API's "no data" answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Payload(Value),
    NoData,
}

/// Which backoff schedule a transient failure uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    /// 429 or "too many connections"
    RateLimited,
    /// Transport failures, 5xx and other unexpected statuses
    Generic,
}

/// What one attempt produced, as seen by the classifier.
#[derive(Debug)]
pub enum AttemptOutcome<'a> {
    TransportFailed(&'a AppError),
    Responded(&'a ApiResponse<String>),
}

/// The classifier's verdict on one attempt.
#[derive(Debug)]
pub enum Classification {
    Payload(Value),
    NoData,
    Fatal(AppError),
    Transient(TransientKind),
}

pub type Classifier = fn(&AttemptOutcome<'_>) -> Classification;

/// Maps a transient kind and the 1-based attempt number to a delay.
pub type Backoff = fn(TransientKind, u32) -> Duration;

/// Per-call retry bookkeeping, discarded once the call resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryState {
    pub attempts_made: u32,
    pub next_backoff: Option<Duration>,
}

/// Something that can wait. Production code sleeps on the tokio timer.
#[async_trait::async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Sleeps with `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait::async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Records requested pauses instead of sleeping.
#[derive(Debug, Clone, Default)]
pub struct RecordingPause {
    recorded: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingPause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every pause requested so far, in order.
    pub fn recorded(&self) -> Vec<Duration> {
        self.recorded.lock().clone()
    }
}

#[async_trait::async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.recorded.lock().push(duration);
    }
}

/// The default classification of Vista responses.
///
/// Checked in order: transport failure, 400 "no history", rate limiting,
/// 5xx, 2xx decode, anything else.
pub fn classify_vista_response(outcome: &AttemptOutcome<'_>) -> Classification {
    let response = match outcome {
        AttemptOutcome::TransportFailed(_) => {
            return Classification::Transient(TransientKind::Generic)
        }
        AttemptOutcome::Responded(response) => response,
    };

    let status = response.status;
    let body = response.data.to_lowercase();

    if status == StatusCode::BAD_REQUEST && body.contains(NO_HISTORY_MARKER) {
        return Classification::NoData;
    }

    if status == StatusCode::TOO_MANY_REQUESTS || body.contains(TOO_MANY_CONNECTIONS_MARKER) {
        return Classification::Transient(TransientKind::RateLimited);
    }

    if status.is_server_error() {
        return Classification::Transient(TransientKind::Generic);
    }

    if status.is_success() {
        return match serde_json::from_str(&response.data) {
            Ok(value) => Classification::Payload(value),
            Err(e) => {
                log::error!("Failed to parse response from {}: {}", response.url, e);
                Classification::Fatal(AppError::Decode {
                    status: status.as_u16(),
                    snippet: snippet(&response.data, DECODE_SNIPPET_LENGTH),
                })
            }
        };
    }

    Classification::Transient(TransientKind::Generic)
}

/// `5 × attempt` seconds when rate limited, `1 + 2 × attempt` otherwise.
pub fn vista_backoff(kind: TransientKind, attempt: u32) -> Duration {
    let attempt = u64::from(attempt);
    match kind {
        TransientKind::RateLimited => Duration::from_secs(RATE_LIMIT_BACKOFF_STEP_SECS * attempt),
        TransientKind::Generic => {
            Duration::from_secs(GENERIC_BACKOFF_BASE_SECS + GENERIC_BACKOFF_STEP_SECS * attempt)
        }
    }
}

/// Truncates `text` to at most `max_chars` characters.
pub(crate) fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Bounded retries around one read-only API request.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    classifier: Classifier,
    backoff: Backoff,
    pause: Arc<dyn Pause>,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Arc::new(TokioPause))
    }
}

impl RetryPolicy {
    /// The Vista classifier and backoff with the given attempt cap and pause.
    pub fn new(max_attempts: u32, pause: Arc<dyn Pause>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            classifier: classify_vista_response,
            backoff: vista_backoff,
            pause,
        }
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Issues `request` until it resolves or the attempts run out.
    ///
    /// Sleeps only between attempts, never after the last one.
    pub async fn execute(
        &self,
        transport: &dyn ApiTransport,
        request: &RequestDescriptor,
    ) -> Result<Fetched, AppError> {
        let mut state = RetryState::default();
        let mut last_status = None;
        let mut last_body = String::new();

        loop {
            state.attempts_made += 1;
            let outcome = transport.get(request).await;
            let view = match &outcome {
                Ok(response) => AttemptOutcome::Responded(response),
                Err(e) => AttemptOutcome::TransportFailed(e),
            };

            let kind = match (self.classifier)(&view) {
                Classification::Payload(value) => return Ok(Fetched::Payload(value)),
                Classification::NoData => {
                    log::debug!("{}: API reported no data", request.label);
                    return Ok(Fetched::NoData);
                }
                Classification::Fatal(e) => return Err(e),
                Classification::Transient(kind) => kind,
            };

            match &outcome {
                Ok(response) => {
                    last_status = Some(response.status.as_u16());
                    last_body = snippet(&response.data, DECODE_SNIPPET_LENGTH);
                }
                Err(e) => {
                    last_status = None;
                    last_body = e.to_string();
                }
            }

            if state.attempts_made >= self.max_attempts {
                break;
            }

            let delay = (self.backoff)(kind, state.attempts_made);
            state.next_backoff = Some(delay);
            log::warn!(
                "{}: attempt {}/{} failed ({}, status {}): {}; retrying after {:?}",
                request.label,
                state.attempts_made,
                self.max_attempts,
                match kind {
                    TransientKind::RateLimited => "rate limited",
                    TransientKind::Generic => "transient",
                },
                last_status.map_or_else(|| "none".to_string(), |s| s.to_string()),
                snippet(&last_body, ERROR_BODY_PREVIEW_LENGTH),
                delay
            );
            self.pause.pause(delay).await;
        }

        Err(AppError::RetryExhausted {
            request: request.label.clone(),
            attempts: state.attempts_made,
            last_status,
            last_body,
        })
    }
}
