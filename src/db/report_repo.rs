// src/db/report_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::report::{CapacityReportLine, InventoryReportLine},
};

#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Estoque atual: produtos ainda sob guarda (não retirados nem removidos).
    pub async fn inventory_lines(
        &self,
        chamber_id: Option<Uuid>,
        client_id: Option<Uuid>,
    ) -> Result<Vec<InventoryReportLine>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT p.id AS product_id, p.name AS product_name, p.lot, p.status,
                   p.quantity, p.weight_per_unit, p.total_weight,
                   p.entry_date, p.expiration_date,
                   c.name AS chamber_name, l.code AS location_code,
                   st.name AS seed_type_name, cl.name AS client_name
            FROM products p
            LEFT JOIN locations l   ON l.id = p.location_id
            LEFT JOIN chambers c    ON c.id = l.chamber_id
            LEFT JOIN seed_types st ON st.id = p.seed_type_id
            LEFT JOIN clients cl    ON cl.id = p.client_id
            WHERE p.status NOT IN ('RETIRADO', 'REMOVIDO')
            "#,
        );
        if let Some(chamber_id) = chamber_id {
            qb.push(" AND l.chamber_id = ").push_bind(chamber_id);
        }
        if let Some(client_id) = client_id {
            qb.push(" AND p.client_id = ").push_bind(client_id);
        }
        qb.push(" ORDER BY c.name NULLS LAST, l.quadra, l.lado, l.fila, l.andar, p.name");

        let lines = qb.build_query_as::<InventoryReportLine>().fetch_all(&self.pool).await?;
        Ok(lines)
    }

    pub async fn capacity_lines(&self) -> Result<Vec<CapacityReportLine>, AppError> {
        let lines = sqlx::query_as::<_, CapacityReportLine>(
            r#"
            SELECT c.id AS chamber_id,
                   c.name AS chamber_name,
                   COUNT(l.id) AS total_locations,
                   COUNT(l.id) FILTER (WHERE l.is_occupied) AS occupied_locations,
                   COALESCE(SUM(l.max_capacity_kg), 0) AS total_capacity_kg,
                   COALESCE(SUM(l.current_weight_kg), 0) AS current_weight_kg,
                   COALESCE(SUM(l.max_capacity_kg - l.current_weight_kg) FILTER (WHERE NOT l.is_occupied), 0)
                       AS available_capacity_kg
            FROM chambers c
            LEFT JOIN locations l ON l.chamber_id = c.id
            GROUP BY c.id, c.name
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }
}
