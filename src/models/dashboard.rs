// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::product::ProductStatus;

// 1. Resumo geral (os cards do topo)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_chambers: i64,
    pub total_locations: i64,
    pub occupied_locations: i64,
    pub free_locations: i64,
    /// Percentual (0-100) com duas casas
    pub occupancy_rate: Decimal,
    pub total_weight_kg: Decimal,
    pub products_by_status: Vec<StatusCount>,
    pub pending_withdrawals: i64,
    pub movements_today: i64,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: ProductStatus,
    pub count: i64,
}

// 2. Ocupação por câmara
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChamberOccupancy {
    pub chamber_id: Uuid,
    pub chamber_name: String,
    pub total_locations: i64,
    pub occupied_locations: i64,
    pub total_capacity_kg: Decimal,
    pub current_weight_kg: Decimal,
    #[sqlx(skip)]
    pub occupancy_rate: Decimal,
}

/// Percentual `part / whole` com duas casas decimais. Zero quando `whole` é zero.
pub fn percentage(part: i64, whole: i64) -> Decimal {
    if whole <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_and_handles_zero() {
        assert_eq!(percentage(0, 0), Decimal::ZERO);
        assert_eq!(percentage(1, 3), Decimal::new(3333, 2));
        assert_eq!(percentage(48, 48), Decimal::ONE_HUNDRED);
    }
}
