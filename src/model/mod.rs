//! Store-ready records produced by the normalizers.

mod history;
mod listing;

pub use history::HistoryRecord;
pub use listing::ListingRecord;

use crate::error::AppError;
use serde::Serialize;
use serde_json::{Map, Value};

/// A row as sent to the store: column name → JSON value, in column order.
pub type Row = Map<String, Value>;

/// Serializes a record into a store row.
pub(crate) fn to_row<T: Serialize>(record: &T) -> Result<Row, AppError> {
    match serde_json::to_value(record)? {
        Value::Object(row) => Ok(row),
        other => Err(AppError::InternalError {
            message: format!("record serialized to a non-object value: {}", other),
            source: None,
        }),
    }
}
