// src/models/withdrawal.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "withdrawal_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalKind {
    Total,
    Parcial,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "withdrawal_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    Pendente,
    Concluida,
    Cancelada,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub id: Uuid,
    pub product_id: Uuid,
    pub client_id: Option<Uuid>,
    pub kind: WithdrawalKind,
    /// Somente para retiradas parciais
    pub quantity: Option<Decimal>,
    pub status: WithdrawalStatus,
    pub reason: Option<String>,
    pub requested_by: Uuid,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub request: WithdrawalRequest,
    pub product_name: String,
    pub product_lot: String,
    pub product_quantity: Decimal,
    pub location_code: Option<String>,
    pub client_name: Option<String>,
    pub requested_by_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWithdrawalPayload {
    pub product_id: Uuid,
    pub kind: WithdrawalKind,
    /// Obrigatória para retiradas parciais
    pub quantity: Option<Decimal>,
    #[validate(length(max = 500, message = "O motivo deve ter no máximo 500 caracteres."))]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct WithdrawalFilter {
    pub status: Option<WithdrawalStatus>,
}
