use super::fields::{
    normalize_amount, normalize_bool, normalize_child_key, normalize_date, normalize_text,
};
use crate::api::{DetailBody, RawHistoryEntry};
use crate::model::HistoryRecord;
use crate::types::ListingCode;

/// Maps one history entry of `parent` onto the history table columns.
///
/// The child key comes from the entry's own `Codigo` when present, else
/// from `container_key`. Both candidates stay on the record.
pub fn normalize_history_entry(
    parent: &ListingCode,
    container_key: &str,
    raw: &RawHistoryEntry,
) -> HistoryRecord {
    let explicit_code = normalize_text(raw.codigo.as_ref());
    let child_code = normalize_child_key(explicit_code.as_deref().unwrap_or(container_key));

    HistoryRecord {
        parent_code: parent.as_str().to_string(),
        child_code,
        container_key: container_key.to_string(),
        explicit_code,
        data: normalize_date(raw.data.as_ref()),
        hora: normalize_text(raw.hora.as_ref()),
        assunto: normalize_text(raw.assunto.as_ref()),
        texto: normalize_text(raw.texto.as_ref()),
        pendente: normalize_bool(raw.pendente.as_ref()),
        bairro: normalize_text(raw.bairro.as_ref()),
        anunciado: normalize_bool(raw.anunciado.as_ref()),
        retranca: normalize_text(raw.retranca.as_ref()),
        corretor: normalize_text(raw.corretor.as_ref()),
        proposta: normalize_bool(raw.proposta.as_ref()),
        status: normalize_text(raw.status.as_ref()),
        datainicio: normalize_date(raw.datainicio.as_ref()),
        veiculopublicado: normalize_text(raw.veiculo_publicado.as_ref()),
        valorproposta: normalize_amount(raw.valor_proposta.as_ref()),
        bairroanuncio: normalize_text(raw.bairro_anuncio.as_ref()),
        statusbatecao: normalize_text(raw.status_batecao.as_ref()),
        valorbatido: normalize_amount(raw.valor_batido.as_ref()),
        privado: normalize_bool(raw.privado.as_ref()),
        cliente: normalize_text(raw.cliente.as_ref()),
        tipoanuncio: normalize_text(raw.tipo_anuncio.as_ref()),
        titulado: normalize_text(raw.titulado.as_ref()),
        statusdoimovel: normalize_text(raw.status_do_imovel.as_ref()),
        codigocorretor: normalize_text(raw.codigo_corretor.as_ref()),
    }
}

/// Normalizes every entry of a detail payload, in response order.
pub fn normalize_history(parent: &ListingCode, detail: &DetailBody) -> Vec<HistoryRecord> {
    let records: Vec<HistoryRecord> = detail
        .entries
        .iter()
        .map(|(key, value)| normalize_history_entry(parent, key, &RawHistoryEntry::from_value(value)))
        .collect();

    let unkeyed = records.iter().filter(|r| r.child_code.is_none()).count();
    if unkeyed > 0 {
        log::warn!(
            "Listing {}: {} history entr{} without a numeric key",
            parent,
            unkeyed,
            if unkeyed == 1 { "y" } else { "ies" }
        );
    }
    records
}
