use super::{to_row, Row};
use crate::error::AppError;
use serde::Serialize;

/// One history entry (prontuário) of a listing.
///
/// `(codigo_imovel, codigo_prontuario)` is the composite identity.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HistoryRecord {
    #[serde(rename = "codigo_imovel")]
    pub parent_code: String,
    #[serde(rename = "codigo_prontuario")]
    pub child_code: Option<i64>,
    /// The key the entry was nested under in the detail response.
    #[serde(skip)]
    pub container_key: String,
    /// The entry's own `Codigo`, rendered as text, when it had one.
    #[serde(skip)]
    pub explicit_code: Option<String>,
    pub data: Option<String>,
    pub hora: Option<String>,
    pub assunto: Option<String>,
    pub texto: Option<String>,
    pub pendente: Option<bool>,
    pub bairro: Option<String>,
    pub anunciado: Option<bool>,
    pub retranca: Option<String>,
    pub corretor: Option<String>,
    pub proposta: Option<bool>,
    pub status: Option<String>,
    pub datainicio: Option<String>,
    pub veiculopublicado: Option<String>,
    pub valorproposta: Option<f64>,
    pub bairroanuncio: Option<String>,
    pub statusbatecao: Option<String>,
    pub valorbatido: Option<f64>,
    pub privado: Option<bool>,
    pub cliente: Option<String>,
    pub tipoanuncio: Option<String>,
    pub titulado: Option<String>,
    pub statusdoimovel: Option<String>,
    pub codigocorretor: Option<String>,
}

impl HistoryRecord {
    pub fn to_row(&self) -> Result<Row, AppError> {
        to_row(self)
    }
}
