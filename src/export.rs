// src/export.rs
//! CSV snapshot of the listing API.
//!
//! A side artifact for spreadsheets: one row per listing, fixed column
//! order, UTF-8 with a byte-order mark. The store is not involved.

use crate::api::{ApiTransport, ListingFetcher, ListingQuery, RawListing, RetryPolicy};
use crate::config::ApiConfig;
use crate::error::AppError;
use crate::normalize::{normalize_date, normalize_text};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One line of the snapshot. Field order is column order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SnapshotRow {
    pub codigoimovel: Option<String>,
    pub categoria: Option<String>,
    pub bairro: Option<String>,
    pub status: Option<String>,
    pub orulo: Option<String>,
    pub datahoraatualizacao: Option<String>,
    pub pendenteprontuario: Option<String>,
    pub datadeativacao: Option<String>,
    pub dataatualizacao: Option<String>,
}

impl SnapshotRow {
    pub fn from_raw(raw: &RawListing) -> Self {
        Self {
            codigoimovel: normalize_text(raw.codigo.as_ref()),
            categoria: normalize_text(raw.categoria.as_ref()),
            bairro: normalize_text(raw.bairro.as_ref()),
            status: normalize_text(raw.status.as_ref()),
            orulo: normalize_text(raw.orulo.as_ref()),
            datahoraatualizacao: normalize_date(raw.data_hora_atualizacao.as_ref()),
            pendenteprontuario: normalize_text(raw.pendente_prontuario.as_ref()),
            datadeativacao: normalize_date(raw.data_de_ativacao.as_ref()),
            dataatualizacao: normalize_date(raw.data_atualizacao.as_ref()),
        }
    }
}

/// Writes the BOM, the header and `rows`.
pub fn write_snapshot<W: Write>(mut writer: W, rows: &[SnapshotRow]) -> Result<(), AppError> {
    writer.write_all(UTF8_BOM)?;
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Fetches every listing with the export fields and writes them to `path`.
///
/// Returns the number of rows written. When the API returns no listings,
/// no file is created.
pub async fn export_snapshot(
    transport: Arc<dyn ApiTransport>,
    policy: RetryPolicy,
    config: &ApiConfig,
    path: &Path,
) -> Result<usize, AppError> {
    let fetcher = ListingFetcher::new(
        transport,
        policy,
        config.clone(),
        ListingQuery::for_export(config.listing_page_size),
    );
    let items = fetcher.fetch_all().await?;

    if items.is_empty() {
        log::warn!("No listings returned; {} not written", path.display());
        return Ok(0);
    }
    log_first_item(&items[0]);

    let rows: Vec<SnapshotRow> = items
        .iter()
        .map(|item| SnapshotRow::from_raw(&RawListing::from_value(item)))
        .collect();

    let file = File::create(path)?;
    write_snapshot(BufWriter::new(file), &rows)?;
    log::info!("{} listing(s) saved to {}", rows.len(), path.display());
    Ok(rows.len())
}

fn log_first_item(item: &Value) {
    if log::log_enabled!(log::Level::Debug) {
        log::debug!(
            "First listing received:\n{}",
            serde_json::to_string_pretty(item).unwrap_or_else(|_| item.to_string())
        );
    }
}
