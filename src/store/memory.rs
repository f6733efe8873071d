use super::{ConflictKey, RecordStore, StoreResponse};
use crate::error::AppError;
use crate::model::Row;
use crate::types::{ColumnName, TableName};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

/// An in-process store used by the test suites.
///
/// Rows are kept in insertion order per table. An upsert whose key matches
/// an existing row overwrites the columns it carries. A row with a null key
/// column matches nothing and is appended, as a unique index in Postgres
/// would treat it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, IndexMap<String, Row>>>,
    rejections: Mutex<VecDeque<String>>,
    upsert_calls: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `table` with rows keyed on `key`.
    pub fn with_rows(self, table: &TableName, rows: Vec<Row>, key: &ConflictKey) -> Self {
        self.merge(table, &rows, key);
        self
    }

    /// Makes the next upsert answer without a `data` payload, carrying `payload`.
    pub fn reject_next_upsert(&self, payload: impl Into<String>) {
        self.rejections.lock().push_back(payload.into());
    }

    /// Current rows of `table`, in insertion order.
    pub fn rows(&self, table: &TableName) -> Vec<Row> {
        self.tables
            .lock()
            .get(table.as_str())
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn upsert_calls(&self) -> usize {
        *self.upsert_calls.lock()
    }

    fn merge(&self, table: &TableName, rows: &[Row], key: &ConflictKey) {
        let mut tables = self.tables.lock();
        let stored = tables.entry(table.as_str().to_string()).or_default();
        for row in rows {
            let identity = if key.is_fully_keyed(row) {
                key.identity_of(row)
            } else {
                format!("#{}", stored.len())
            };
            let existing = stored.entry(identity).or_default();
            for (column, value) in row {
                existing.insert(column.clone(), value.clone());
            }
        }
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryStore {
    async fn select_column(
        &self,
        table: &TableName,
        column: &ColumnName,
        from: u64,
        to: u64,
    ) -> Result<Vec<Row>, AppError> {
        let tables = self.tables.lock();
        let Some(rows) = tables.get(table.as_str()) else {
            return Ok(Vec::new());
        };

        let take = (to.saturating_sub(from) + 1) as usize;
        Ok(rows
            .values()
            .skip(from as usize)
            .take(take)
            .map(|row| {
                let mut projected = Row::new();
                projected.insert(
                    column.as_str().to_string(),
                    row.get(column.as_str()).cloned().unwrap_or(Value::Null),
                );
                projected
            })
            .collect())
    }

    async fn upsert(
        &self,
        table: &TableName,
        rows: &[Row],
        conflict: &ConflictKey,
    ) -> Result<StoreResponse, AppError> {
        *self.upsert_calls.lock() += 1;

        if let Some(payload) = self.rejections.lock().pop_front() {
            return Ok(StoreResponse {
                status: 400,
                data: None,
                raw: payload,
            });
        }

        self.merge(table, rows, conflict);
        Ok(StoreResponse {
            status: 201,
            data: Some(rows.to_vec()),
            raw: String::new(),
        })
    }
}
