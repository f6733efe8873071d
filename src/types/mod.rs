use thiserror::Error;

mod domain_types;

pub use domain_types::*;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Empty required field: {0}")]
    EmptyField(&'static str),

    #[error("Invalid API key format: {reason}")]
    InvalidApiKey { reason: String },

    #[error("Invalid store identifier: {name} - {reason}")]
    InvalidIdentifier { name: String, reason: String },

    #[error("Invalid number for {key}: {value:?}")]
    InvalidNumber { key: String, value: String },

    #[error("Value out of bounds for {key}: {value}, expected {min}..={max}")]
    OutOfBounds {
        key: String,
        value: u64,
        min: u64,
        max: u64,
    },
}
