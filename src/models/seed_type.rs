// src/models/seed_type.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeedType {
    pub id: Uuid,
    #[schema(example = "Soja")]
    pub name: String,
    pub description: Option<String>,
    pub optimal_temperature: Option<Decimal>,
    pub optimal_humidity: Option<Decimal>,
    pub max_storage_days: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SeedTypePayload {
    #[validate(length(min = 1, max = 100, message = "O nome deve ter entre 1 e 100 caracteres."))]
    pub name: String,
    pub description: Option<String>,
    pub optimal_temperature: Option<Decimal>,
    pub optimal_humidity: Option<Decimal>,
    #[validate(range(min = 1, message = "O prazo máximo deve ser positivo."))]
    pub max_storage_days: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SeedTypeFilter {
    /// Somente tipos ativos
    pub active: Option<bool>,
}
