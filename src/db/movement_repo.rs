// src/db/movement_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Pagination},
    models::movement::{Movement, MovementDetail, MovementFilter, NewMovement},
};

const MOVEMENT_DETAIL: &str = r#"
    SELECT m.*,
           p.name  AS product_name,
           p.lot   AS product_lot,
           lf.code AS from_location_code,
           lt.code AS to_location_code,
           u.name  AS user_name
    FROM movements m
    JOIN products p        ON p.id = m.product_id
    LEFT JOIN locations lf ON lf.id = m.from_location_id
    LEFT JOIN locations lt ON lt.id = m.to_location_id
    LEFT JOIN users u      ON u.id = m.user_id
    WHERE 1 = 1
"#;

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &MovementFilter) {
    if let Some(product_id) = filter.product_id {
        qb.push(" AND m.product_id = ").push_bind(product_id);
    }
    if let Some(movement_type) = filter.movement_type {
        qb.push(" AND m.movement_type = ").push_bind(movement_type);
    }
    if let Some(user_id) = filter.user_id {
        qb.push(" AND m.user_id = ").push_bind(user_id);
    }
    if let Some(from) = filter.from {
        qb.push(" AND m.created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND m.created_at <= ").push_bind(to);
    }
}

// Histórico de movimentações: só existe INSERT aqui, nunca UPDATE/DELETE.
#[derive(Clone)]
pub struct MovementRepository {
    pool: PgPool,
}

impl MovementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registra uma movimentação no livro-razão (auditoria).
    pub async fn record<'e, E>(&self, executor: E, movement: &NewMovement<'_>) -> Result<Movement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movement = sqlx::query_as::<_, Movement>(
            r#"
            INSERT INTO movements (
                product_id, movement_type, from_location_id, to_location_id,
                quantity, weight, user_id, reason, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(movement.product_id)
        .bind(movement.movement_type)
        .bind(movement.from_location_id)
        .bind(movement.to_location_id)
        .bind(movement.quantity)
        .bind(movement.weight)
        .bind(movement.user_id)
        .bind(movement.reason)
        .bind(movement.notes)
        .fetch_one(executor)
        .await?;

        Ok(movement)
    }

    pub async fn list(
        &self,
        filter: &MovementFilter,
        pagination: &Pagination,
    ) -> Result<(Vec<MovementDetail>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM movements m WHERE 1 = 1");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(MOVEMENT_DETAIL);
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY m.created_at DESC");
        qb.push(" LIMIT ").push_bind(i64::from(pagination.limit()));
        qb.push(" OFFSET ").push_bind(pagination.offset());

        let movements = qb.build_query_as::<MovementDetail>().fetch_all(&self.pool).await?;
        Ok((movements, total))
    }

    /// Todas as movimentações do filtro, em ordem cronológica (relatórios).
    pub async fn list_all(&self, filter: &MovementFilter) -> Result<Vec<MovementDetail>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(MOVEMENT_DETAIL);
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY m.created_at ASC");

        let movements = qb.build_query_as::<MovementDetail>().fetch_all(&self.pool).await?;
        Ok(movements)
    }

    pub async fn find_detail(&self, id: Uuid) -> Result<Option<MovementDetail>, AppError> {
        let sql = format!("{} AND m.id = $1", MOVEMENT_DETAIL);
        let movement = sqlx::query_as::<_, MovementDetail>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(movement)
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<MovementDetail>, AppError> {
        let sql = format!("{} ORDER BY m.created_at DESC LIMIT $1", MOVEMENT_DETAIL);
        let movements = sqlx::query_as::<_, MovementDetail>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(movements)
    }
}
