//! Batched, de-duplicated upserts with per-batch error reporting.

use super::RecordStore;
use crate::error::AppError;
use crate::model::Row;
use crate::types::{ColumnName, TableName};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// The column(s) an upsert uses to find the row it overwrites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictKey {
    columns: Vec<ColumnName>,
}

impl ConflictKey {
    pub fn new(columns: Vec<ColumnName>) -> Self {
        Self { columns }
    }

    pub fn single(column: ColumnName) -> Self {
        Self::new(vec![column])
    }

    pub fn columns(&self) -> &[ColumnName] {
        &self.columns
    }

    /// The `on_conflict` query value, e.g. `codigo_imovel,codigo_prontuario`.
    pub fn on_conflict(&self) -> String {
        self.columns
            .iter()
            .map(ColumnName::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether every key column of `row` holds a non-null value.
    ///
    /// Rows that fail this never conflict in the store: a null in a unique
    /// key is distinct from every other value, null included.
    pub fn is_fully_keyed(&self, row: &Row) -> bool {
        self.columns
            .iter()
            .all(|c| row.get(c.as_str()).is_some_and(|v| !v.is_null()))
    }

    /// Identity of `row` under this key. Missing columns count as null.
    pub fn identity_of(&self, row: &Row) -> String {
        let values: Vec<&Value> = self
            .columns
            .iter()
            .map(|c| row.get(c.as_str()).unwrap_or(&Value::Null))
            .collect();
        serde_json::to_string(&values).unwrap_or_default()
    }
}

impl fmt::Display for ConflictKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.on_conflict())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slot {
    Keyed(String),
    Unkeyed(usize),
}

/// Collapses rows sharing a key. The last row wins and keeps the first position.
///
/// Rows with a null key column are never collapsed.
pub fn dedupe_on_key(rows: Vec<Row>, key: &ConflictKey) -> Vec<Row> {
    let mut unique: IndexMap<Slot, Row> = IndexMap::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let slot = if key.is_fully_keyed(&row) {
            Slot::Keyed(key.identity_of(&row))
        } else {
            Slot::Unkeyed(index)
        };
        unique.insert(slot, row);
    }
    unique.into_values().collect()
}

/// Totals of one [`UpsertSink::upsert`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertSummary {
    /// Rows the store reported as written.
    pub written: usize,
    pub batches: usize,
    pub failed_batches: usize,
}

impl UpsertSummary {
    pub fn merge(&mut self, other: UpsertSummary) {
        self.written += other.written;
        self.batches += other.batches;
        self.failed_batches += other.failed_batches;
    }
}

/// Writes rows to the store in batches.
#[derive(Clone)]
pub struct UpsertSink {
    store: Arc<dyn RecordStore>,
    batch_size: usize,
}

impl UpsertSink {
    pub fn new(store: Arc<dyn RecordStore>, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    /// Writes one batch and returns how many rows the store reports written.
    ///
    /// Rejections, data-less responses and store failures all become
    /// [`AppError::Sink`] carrying what the store sent back.
    pub async fn write_batch(
        &self,
        table: &TableName,
        rows: Vec<Row>,
        key: &ConflictKey,
    ) -> Result<usize, AppError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let rows = dedupe_on_key(rows, key);
        let response = self
            .store
            .upsert(table, &rows, key)
            .await
            .map_err(|e| AppError::Sink {
                table: table.to_string(),
                payload: e.to_string(),
            })?;

        match response.data {
            Some(data) => Ok(data.len()),
            None => Err(AppError::Sink {
                table: table.to_string(),
                payload: format!("HTTP {}: {}", response.status, response.raw),
            }),
        }
    }

    /// Writes all rows batch by batch. A failed batch is logged and counted,
    /// and the remaining batches still run.
    pub async fn upsert(&self, table: &TableName, rows: Vec<Row>, key: &ConflictKey) -> UpsertSummary {
        let mut summary = UpsertSummary::default();
        if rows.is_empty() {
            log::debug!("Nothing to upsert into {}", table);
            return summary;
        }

        let total_batches = rows.len().div_ceil(self.batch_size);
        let mut rows = rows.into_iter().peekable();
        while rows.peek().is_some() {
            let batch: Vec<Row> = rows.by_ref().take(self.batch_size).collect();
            summary.batches += 1;
            let size = batch.len();

            match self.write_batch(table, batch, key).await {
                Ok(written) => {
                    summary.written += written;
                    log::debug!(
                        "Upserted batch {}/{} into {} ({} rows sent, {} written)",
                        summary.batches,
                        total_batches,
                        table,
                        size,
                        written
                    );
                }
                Err(e) => {
                    summary.failed_batches += 1;
                    log::error!(
                        "Batch {}/{} of {} rows rejected: {}",
                        summary.batches,
                        total_batches,
                        size,
                        e
                    );
                }
            }
        }

        summary
    }
}
