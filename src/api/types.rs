// src/api/types.rs
//! Request descriptors for the Vista listing and detail endpoints.

use crate::config::ApiConfig;
use crate::constants::{
    HISTORY_FIELD, HISTORY_FIELDS, LISTING_EXPORT_FIELDS, LISTING_SYNC_FIELDS,
};
use crate::types::{ListingCode, ValidatedUrl};
use serde_json::json;

/// An idempotent GET request: where to send it and with which query pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub url: ValidatedUrl,
    pub query: Vec<(String, String)>,
    /// Short human-readable name used in logs and retry errors.
    pub label: String,
}

impl RequestDescriptor {
    pub fn new(url: ValidatedUrl, query: Vec<(String, String)>, label: impl Into<String>) -> Self {
        Self {
            url,
            query,
            label: label.into(),
        }
    }

    /// Returns the value of the first query pair named `name`.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Which listing fields to request, and how many listings per page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub fields: Vec<String>,
    pub page_size: u32,
}

impl ListingQuery {
    pub fn new(fields: &[&str], page_size: u32) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            page_size,
        }
    }

    /// Fields written to the listings table.
    pub fn for_sync(page_size: u32) -> Self {
        Self::new(LISTING_SYNC_FIELDS, page_size)
    }

    /// Fields written to the CSV snapshot.
    pub fn for_export(page_size: u32) -> Self {
        Self::new(LISTING_EXPORT_FIELDS, page_size)
    }

    /// Builds the request for one page (1-based) of the listing endpoint.
    pub fn page_request(&self, config: &ApiConfig, page: u32) -> RequestDescriptor {
        let search = json!({
            "fields": self.fields,
            "paginacao": { "pagina": page, "quantidade": self.page_size },
        });

        RequestDescriptor::new(
            config.listing_url.clone(),
            vec![
                ("key".to_string(), config.api_key.as_str().to_string()),
                ("showtotal".to_string(), "1".to_string()),
                ("showInternal".to_string(), "1".to_string()),
                ("pesquisa".to_string(), search.to_string()),
            ],
            format!("listing page {}", page),
        )
    }
}

/// Builds the detail request that asks for one listing's history entries.
pub fn detail_request(config: &ApiConfig, code: &ListingCode) -> RequestDescriptor {
    let search = json!({
        "fields": ["Codigo", { HISTORY_FIELD: HISTORY_FIELDS }],
    });

    RequestDescriptor::new(
        config.detail_url.clone(),
        vec![
            ("key".to_string(), config.api_key.as_str().to_string()),
            ("pesquisa".to_string(), search.to_string()),
            ("imovel".to_string(), code.as_str().to_string()),
        ],
        format!("detail {}", code),
    )
}
