// src/models/report.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::{
    movement::{MovementDetail, MovementType},
    product::ProductStatus,
};

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Pdf,
}

// Uma linha do relatório de estoque
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReportLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub lot: String,
    pub status: ProductStatus,
    pub quantity: Decimal,
    pub weight_per_unit: Decimal,
    pub total_weight: Decimal,
    pub entry_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub chamber_name: Option<String>,
    pub location_code: Option<String>,
    pub seed_type_name: Option<String>,
    pub client_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub generated_at: DateTime<Utc>,
    pub total_products: usize,
    pub total_quantity: Decimal,
    pub total_weight_kg: Decimal,
    pub lines: Vec<InventoryReportLine>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementReport {
    pub generated_at: DateTime<Utc>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub total_entries_kg: Decimal,
    pub total_exits_kg: Decimal,
    pub movements: Vec<MovementDetail>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CapacityReportLine {
    pub chamber_id: Uuid,
    pub chamber_name: String,
    pub total_locations: i64,
    pub occupied_locations: i64,
    pub total_capacity_kg: Decimal,
    pub current_weight_kg: Decimal,
    pub available_capacity_kg: Decimal,
    /// Peso armazenado / capacidade total, em %
    #[sqlx(skip)]
    pub utilization_rate: Decimal,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct InventoryReportQuery {
    pub chamber_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    #[serde(default)]
    #[param(inline)]
    pub format: ReportFormat,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MovementReportQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub movement_type: Option<MovementType>,
    #[serde(default)]
    #[param(inline)]
    pub format: ReportFormat,
}
