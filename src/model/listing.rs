use super::{to_row, Row};
use crate::constants::LISTING_IDENTITY_COLUMN;
use crate::error::AppError;
use crate::types::ColumnName;
use serde::Serialize;

/// One property listing as known by the API at fetch time.
///
/// Serialized names are the store's column names. The identity column is
/// written as `codigo` and renamed by [`ListingRecord::to_row`] when the
/// store uses another name.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ListingRecord {
    #[serde(rename = "codigo")]
    pub code: Option<String>,
    #[serde(rename = "categoria")]
    pub category: Option<String>,
    #[serde(rename = "bairro")]
    pub neighborhood: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "orulo")]
    pub external_flag: Option<String>,
    #[serde(rename = "exibirnosite")]
    pub visible_on_site: Option<String>,
    #[serde(rename = "datacadastro")]
    pub registered_at: Option<String>,
    #[serde(rename = "datadeativacao")]
    pub activated_at: Option<String>,
    #[serde(rename = "dataatualizacao")]
    pub updated_at: Option<String>,
}

impl ListingRecord {
    /// Store row with the code written under `identity_column`.
    pub fn to_row(&self, identity_column: &ColumnName) -> Result<Row, AppError> {
        let mut row = to_row(self)?;
        if identity_column.as_str() != LISTING_IDENTITY_COLUMN {
            if let Some(code) = row.shift_remove(LISTING_IDENTITY_COLUMN) {
                let mut renamed = Row::new();
                renamed.insert(identity_column.as_str().to_string(), code);
                renamed.extend(row);
                row = renamed;
            }
        }
        Ok(row)
    }
}
