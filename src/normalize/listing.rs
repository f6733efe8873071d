use super::fields::{normalize_date, normalize_text};
use crate::api::RawListing;
use crate::model::ListingRecord;
use serde_json::Value;

/// Maps one raw listing onto the listings table columns.
pub fn normalize_listing(raw: &RawListing) -> ListingRecord {
    ListingRecord {
        code: normalize_text(raw.codigo.as_ref()).filter(|code| !code.trim().is_empty()),
        category: normalize_text(raw.categoria.as_ref()),
        neighborhood: normalize_text(raw.bairro.as_ref()),
        status: normalize_text(raw.status.as_ref()),
        external_flag: normalize_text(raw.orulo.as_ref()),
        visible_on_site: normalize_text(raw.exibir_no_site.as_ref()),
        registered_at: normalize_date(raw.data_cadastro.as_ref()),
        activated_at: normalize_date(raw.data_de_ativacao.as_ref()),
        updated_at: normalize_date(raw.data_atualizacao.as_ref()),
    }
}

/// Normalizes raw items, dropping those without a code.
///
/// Returns the kept records and how many were dropped.
pub fn normalize_listings(items: &[Value]) -> (Vec<ListingRecord>, usize) {
    let mut records = Vec::with_capacity(items.len());
    let mut dropped = 0;

    for item in items {
        let record = normalize_listing(&RawListing::from_value(item));
        if record.code.is_some() {
            records.push(record);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        log::warn!("Dropped {} listing(s) without a code", dropped);
    }
    (records, dropped)
}
