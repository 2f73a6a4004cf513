// src/models/client.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    /// CPF/CNPJ, somente dígitos
    pub document: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mantém só os dígitos do CPF/CNPJ. Documento vazio vira `None`.
pub fn normalize_document(raw: Option<&str>) -> Option<String> {
    let digits: String = raw?.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() { None } else { Some(digits) }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayload {
    #[validate(length(min = 1, max = 200, message = "O nome deve ter entre 1 e 200 caracteres."))]
    pub name: String,
    #[schema(example = "12.345.678/0001-90")]
    pub document: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ClientFilter {
    /// Busca por nome ou documento
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_keeps_only_digits() {
        assert_eq!(normalize_document(Some("123.456.789-09")).as_deref(), Some("12345678909"));
        assert_eq!(normalize_document(Some("12.345.678/0001-90")).as_deref(), Some("12345678000190"));
        assert_eq!(normalize_document(Some(" - ")), None);
        assert_eq!(normalize_document(None), None);
    }
}
