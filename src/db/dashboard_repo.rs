// src/db/dashboard_repo.rs

use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

use crate::{
    common::error::AppError,
    models::dashboard::{percentage, ChamberOccupancy, DashboardSummary, StatusCount},
};

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Resumo Geral
    pub async fn get_summary(&self) -> Result<DashboardSummary, AppError> {
        // Todas as contagens sobre o mesmo snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        // A. Câmaras e locais
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM chambers)                          AS total_chambers,
                COUNT(l.id)                                              AS total_locations,
                COUNT(l.id) FILTER (WHERE l.is_occupied)                 AS occupied_locations,
                COALESCE(SUM(l.current_weight_kg), 0)                    AS total_weight_kg
            FROM locations l
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        let total_chambers: i64 = row.try_get("total_chambers")?;
        let total_locations: i64 = row.try_get("total_locations")?;
        let occupied_locations: i64 = row.try_get("occupied_locations")?;
        let total_weight_kg: Decimal = row.try_get("total_weight_kg")?;

        // B. Produtos por status
        let products_by_status = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM products GROUP BY status ORDER BY status",
        )
        .fetch_all(&mut *tx)
        .await?;

        // C. Retiradas pendentes
        let pending_withdrawals = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM withdrawal_requests WHERE status = 'PENDENTE'",
        )
        .fetch_one(&mut *tx)
        .await?;

        // D. Movimentações de hoje
        let movements_today = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM movements WHERE created_at::date = CURRENT_DATE",
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(DashboardSummary {
            total_chambers,
            total_locations,
            occupied_locations,
            free_locations: total_locations - occupied_locations,
            occupancy_rate: percentage(occupied_locations, total_locations),
            total_weight_kg,
            products_by_status,
            pending_withdrawals,
            movements_today,
        })
    }

    // 2. Ocupação por câmara
    pub async fn get_occupancy(&self) -> Result<Vec<ChamberOccupancy>, AppError> {
        let mut rows = sqlx::query_as::<_, ChamberOccupancy>(
            r#"
            SELECT c.id AS chamber_id,
                   c.name AS chamber_name,
                   COUNT(l.id) AS total_locations,
                   COUNT(l.id) FILTER (WHERE l.is_occupied) AS occupied_locations,
                   COALESCE(SUM(l.max_capacity_kg), 0) AS total_capacity_kg,
                   COALESCE(SUM(l.current_weight_kg), 0) AS current_weight_kg
            FROM chambers c
            LEFT JOIN locations l ON l.chamber_id = c.id
            GROUP BY c.id, c.name
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        for row in rows.iter_mut() {
            row.occupancy_rate = percentage(row.occupied_locations, row.total_locations);
        }
        Ok(rows)
    }
}
