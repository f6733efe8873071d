//! Supabase REST (PostgREST) client.

use super::{ConflictKey, RecordStore, StoreResponse};
use crate::api::client::{extract_response_text, transport_error};
use crate::config::StoreConfig;
use crate::error::{AppError, FailureOrigin};
use crate::model::Row;
use crate::types::{ApiKey, ColumnName, TableName, ValidatedUrl};
use reqwest::{header, Client};
use serde_json::Value;

const UPSERT_PREFERENCE: &str = "resolution=merge-duplicates,return=representation";

/// Reads and upserts rows through `{url}/rest/v1/{table}`.
#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    rest_url: ValidatedUrl,
}

impl PostgrestStore {
    pub fn new(config: &StoreConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(&config.api_key)?)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            rest_url: config.url.join_segments(&["rest", "v1"])?,
        })
    }

    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let invalid = |e: header::InvalidHeaderValue| {
            AppError::MissingConfiguration(format!("Invalid store key format: {}", e))
        };

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "apikey",
            header::HeaderValue::from_str(api_key.as_str()).map_err(invalid)?,
        );
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key.as_str()))
                .map_err(invalid)?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }

    fn table_url(&self, table: &TableName) -> Result<ValidatedUrl, AppError> {
        Ok(self.rest_url.join_segments(&[table.as_str()])?)
    }
}

fn parse_rows(body: &str) -> Option<Vec<Row>> {
    match serde_json::from_str(body).ok()? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

#[async_trait::async_trait]
impl RecordStore for PostgrestStore {
    async fn select_column(
        &self,
        table: &TableName,
        column: &ColumnName,
        from: u64,
        to: u64,
    ) -> Result<Vec<Row>, AppError> {
        let url = self.table_url(table)?;
        log::debug!("GET {} select={} order={}.asc range={}-{}", url, column, column, from, to);

        let response = self
            .client
            .get(url.as_url().clone())
            .query(&[
                ("select", column.as_str().to_string()),
                ("order", format!("{}.asc", column)),
            ])
            .header("Range-Unit", "items")
            .header(header::RANGE, format!("{}-{}", from, to))
            .send()
            .await
            .map_err(|e| transport_error(FailureOrigin::Store, e))?;
        let result = extract_response_text(response, FailureOrigin::Store).await?;

        if !result.status.is_success() {
            return Err(AppError::MalformedResponse(format!(
                "reading {} from {} failed with HTTP {}: {}",
                column, table, result.status, result.data
            )));
        }

        parse_rows(&result.data).ok_or_else(|| {
            AppError::MalformedResponse(format!(
                "reading {} from {} returned a non-array body: {}",
                column, table, result.data
            ))
        })
    }

    async fn upsert(
        &self,
        table: &TableName,
        rows: &[Row],
        conflict: &ConflictKey,
    ) -> Result<StoreResponse, AppError> {
        let url = self.table_url(table)?;
        log::debug!("POST {} ({} rows, on_conflict={})", url, rows.len(), conflict.on_conflict());

        let response = self
            .client
            .post(url.as_url().clone())
            .query(&[("on_conflict", conflict.on_conflict())])
            .header("Prefer", UPSERT_PREFERENCE)
            .json(rows)
            .send()
            .await
            .map_err(|e| transport_error(FailureOrigin::Store, e))?;
        let result = extract_response_text(response, FailureOrigin::Store).await?;

        let data = if result.status.is_success() {
            parse_rows(&result.data)
        } else {
            None
        };

        Ok(StoreResponse {
            status: result.status.as_u16(),
            data,
            raw: result.data,
        })
    }
}
