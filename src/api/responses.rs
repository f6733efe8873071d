// src/api/responses.rs
//! Decoding of Vista payloads into typed raw structs.
//!
//! Everything here is tolerant: unknown fields are ignored and wrong-typed
//! fields stay as raw JSON values for the normalizers. Only the page and
//! envelope shapes can fail.

use crate::constants::{HISTORY_FIELD, RESERVED_PAGE_KEYS};
use crate::error::AppError;
use serde::Deserialize;
use serde_json::Value;

/// Fails with `ApiService` when the body is the API's error envelope.
///
/// Vista reports errors as an object carrying both `status` and `message`.
pub fn check_api_envelope(body: &Value) -> Result<(), AppError> {
    if let Some(object) = body.as_object() {
        if let (Some(status), Some(message)) = (object.get("status"), object.get("message")) {
            return Err(AppError::ApiService {
                status: value_to_display(status),
                message: value_to_display(message),
            });
        }
    }
    Ok(())
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One decoded page of the listing endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPageBody {
    /// Value of `paginas`, defaulting to 1 when absent.
    pub total_pages: u32,
    /// Object-typed values under non-reserved keys, in response order.
    pub items: Vec<Value>,
}

impl ListingPageBody {
    pub fn from_value(body: Value) -> Result<Self, AppError> {
        check_api_envelope(&body)?;

        let object = match body {
            Value::Object(object) => object,
            other => {
                return Err(AppError::MalformedPage(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let total_pages = parse_total_pages(object.get("paginas"))?;

        let mut items = Vec::with_capacity(object.len());
        for (key, value) in object {
            if RESERVED_PAGE_KEYS.contains(&key.as_str()) {
                continue;
            }
            if value.is_object() {
                items.push(value);
            } else {
                log::warn!(
                    "Skipping non-object entry '{}' ({}) in listing page",
                    key,
                    json_kind(&value)
                );
            }
        }

        Ok(Self { total_pages, items })
    }
}

fn parse_total_pages(value: Option<&Value>) -> Result<u32, AppError> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(1),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(1),
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    };

    parsed.ok_or_else(|| {
        AppError::MalformedPage(format!(
            "unreadable page count: {}",
            value.map(Value::to_string).unwrap_or_default()
        ))
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The detail payload of one listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailBody {
    /// History entries keyed by their container key, in response order.
    pub entries: Vec<(String, Value)>,
}

impl DetailBody {
    pub fn from_value(body: Value) -> Result<Self, AppError> {
        check_api_envelope(&body)?;

        let history = match body {
            Value::Object(mut object) => object.remove(HISTORY_FIELD),
            _ => None,
        };

        let entries = match history {
            Some(Value::Object(map)) => map.into_iter().collect(),
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(list)) if list.is_empty() => Vec::new(),
            Some(other) => {
                log::warn!(
                    "Ignoring '{}' member of unexpected shape ({})",
                    HISTORY_FIELD,
                    json_kind(&other)
                );
                Vec::new()
            }
        };

        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A listing item as the API sends it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawListing {
    #[serde(rename = "Codigo", default)]
    pub codigo: Option<Value>,
    #[serde(rename = "Categoria", default)]
    pub categoria: Option<Value>,
    #[serde(rename = "Bairro", default)]
    pub bairro: Option<Value>,
    #[serde(rename = "Status", default)]
    pub status: Option<Value>,
    #[serde(rename = "Orulo", default)]
    pub orulo: Option<Value>,
    #[serde(rename = "ExibirNoSite", default)]
    pub exibir_no_site: Option<Value>,
    #[serde(rename = "DataCadastro", default)]
    pub data_cadastro: Option<Value>,
    #[serde(rename = "DataDeAtivacao", default)]
    pub data_de_ativacao: Option<Value>,
    #[serde(rename = "DataAtualizacao", default)]
    pub data_atualizacao: Option<Value>,
    #[serde(rename = "DataHoraAtualizacao", default)]
    pub data_hora_atualizacao: Option<Value>,
    #[serde(rename = "PendenteProntuario", default)]
    pub pendente_prontuario: Option<Value>,
}

impl RawListing {
    /// Decodes an item; anything that is not an object yields an all-null listing.
    pub fn from_value(value: &Value) -> Self {
        decode_or_default(value)
    }
}

/// A history entry (prontuário) as the API sends it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawHistoryEntry {
    #[serde(rename = "Codigo", default)]
    pub codigo: Option<Value>,
    #[serde(rename = "Data", default)]
    pub data: Option<Value>,
    #[serde(rename = "Hora", default)]
    pub hora: Option<Value>,
    #[serde(rename = "Assunto", default)]
    pub assunto: Option<Value>,
    #[serde(rename = "Texto", default)]
    pub texto: Option<Value>,
    #[serde(rename = "Pendente", default)]
    pub pendente: Option<Value>,
    #[serde(rename = "Bairro", default)]
    pub bairro: Option<Value>,
    #[serde(rename = "Anunciado", default)]
    pub anunciado: Option<Value>,
    #[serde(rename = "Retranca", default)]
    pub retranca: Option<Value>,
    #[serde(rename = "Corretor", default)]
    pub corretor: Option<Value>,
    #[serde(rename = "PROPOSTA", default)]
    pub proposta: Option<Value>,
    #[serde(rename = "Status", default)]
    pub status: Option<Value>,
    #[serde(rename = "Datainicio", default)]
    pub datainicio: Option<Value>,
    #[serde(rename = "VeiculoPublicado", default)]
    pub veiculo_publicado: Option<Value>,
    #[serde(rename = "ValorProposta", default)]
    pub valor_proposta: Option<Value>,
    #[serde(rename = "BairroAnuncio", default)]
    pub bairro_anuncio: Option<Value>,
    #[serde(rename = "StatusBatecao", default)]
    pub status_batecao: Option<Value>,
    #[serde(rename = "ValorBatido", default)]
    pub valor_batido: Option<Value>,
    #[serde(rename = "Privado", default)]
    pub privado: Option<Value>,
    #[serde(rename = "Cliente", default)]
    pub cliente: Option<Value>,
    #[serde(rename = "Tipoanuncio", default)]
    pub tipo_anuncio: Option<Value>,
    #[serde(rename = "Titulado", default)]
    pub titulado: Option<Value>,
    #[serde(rename = "Statusdoimóvel", default)]
    pub status_do_imovel: Option<Value>,
    #[serde(rename = "CodigoCorretor", default)]
    pub codigo_corretor: Option<Value>,
}

impl RawHistoryEntry {
    /// Decodes an entry; anything that is not an object yields an all-null entry.
    pub fn from_value(value: &Value) -> Self {
        decode_or_default(value)
    }
}

fn decode_or_default<T>(value: &Value) -> T
where
    T: for<'de> Deserialize<'de> + Default,
{
    if value.is_object() {
        T::deserialize(value).unwrap_or_default()
    } else {
        T::default()
    }
}
