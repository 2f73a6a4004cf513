// src/models/movement.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "movement_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Entrada,
    Saida,
    Transferencia,
    Ajuste,
}

// --- Movimentação (histórico, somente inserção) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: Uuid,
    pub product_id: Uuid,
    pub movement_type: MovementType,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub quantity: Decimal,
    pub weight: Decimal,
    pub user_id: Option<Uuid>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Movimentação com os nomes já resolvidos para exibição
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub movement: Movement,
    pub product_name: String,
    pub product_lot: String,
    pub from_location_code: Option<String>,
    pub to_location_code: Option<String>,
    pub user_name: Option<String>,
}

/// Entrada para gravação no histórico.
#[derive(Debug, Clone)]
pub struct NewMovement<'a> {
    pub product_id: Uuid,
    pub movement_type: MovementType,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub quantity: Decimal,
    pub weight: Decimal,
    pub user_id: Option<Uuid>,
    pub reason: Option<&'a str>,
    pub notes: Option<&'a str>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MovementFilter {
    pub product_id: Option<Uuid>,
    pub movement_type: Option<MovementType>,
    pub user_id: Option<Uuid>,
    /// Início do período (RFC 3339)
    pub from: Option<DateTime<Utc>>,
    /// Fim do período (RFC 3339)
    pub to: Option<DateTime<Utc>>,
}
