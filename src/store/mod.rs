//! The relational store: an idempotent, key-addressable upsert target.
//!
//! Sync logic talks to [`RecordStore`]; [`PostgrestStore`] speaks Supabase's
//! REST dialect and [`MemoryStore`] keeps rows in process for the tests.

mod memory;
mod postgrest;
pub mod sink;

pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;
pub use sink::{ConflictKey, UpsertSink, UpsertSummary};

use crate::error::AppError;
use crate::model::Row;
use crate::types::{ColumnName, TableName};

/// What the store answered to an upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreResponse {
    pub status: u16,
    /// The written rows, when the store returned them as a JSON array.
    pub data: Option<Vec<Row>>,
    /// The raw response body, kept for diagnostics.
    pub raw: String,
}

/// The ability to read and upsert rows of a table.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Reads only `column` of the rows `from..=to` (0-based, inclusive).
    ///
    /// Row order must be the same on every call so that consecutive ranges
    /// neither skip nor repeat rows.
    async fn select_column(
        &self,
        table: &TableName,
        column: &ColumnName,
        from: u64,
        to: u64,
    ) -> Result<Vec<Row>, AppError>;

    /// Inserts `rows`, overwriting existing rows that match on `conflict`.
    async fn upsert(
        &self,
        table: &TableName,
        rows: &[Row],
        conflict: &ConflictKey,
    ) -> Result<StoreResponse, AppError>;
}
