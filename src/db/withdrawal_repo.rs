// src/db/withdrawal_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::withdrawal::{WithdrawalDetail, WithdrawalKind, WithdrawalRequest, WithdrawalStatus},
};

const WITHDRAWAL_DETAIL: &str = r#"
    SELECT w.*,
           p.name      AS product_name,
           p.lot       AS product_lot,
           p.quantity  AS product_quantity,
           l.code      AS location_code,
           cl.name     AS client_name,
           u.name      AS requested_by_name
    FROM withdrawal_requests w
    JOIN products p       ON p.id = w.product_id
    LEFT JOIN locations l ON l.id = p.location_id
    LEFT JOIN clients cl  ON cl.id = w.client_id
    JOIN users u          ON u.id = w.requested_by
"#;

#[derive(Clone)]
pub struct WithdrawalRepository {
    pool: PgPool,
}

impl WithdrawalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, status: Option<WithdrawalStatus>) -> Result<Vec<WithdrawalDetail>, AppError> {
        let sql = format!(
            "{} WHERE ($1::withdrawal_status IS NULL OR w.status = $1) ORDER BY w.created_at DESC",
            WITHDRAWAL_DETAIL
        );
        let requests = sqlx::query_as::<_, WithdrawalDetail>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(requests)
    }

    pub async fn find_detail<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<WithdrawalDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{} WHERE w.id = $1", WITHDRAWAL_DETAIL);
        let request = sqlx::query_as::<_, WithdrawalDetail>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(request)
    }

    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<WithdrawalRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, WithdrawalRequest>(
            "SELECT * FROM withdrawal_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(request)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        client_id: Option<Uuid>,
        kind: WithdrawalKind,
        quantity: Option<Decimal>,
        reason: Option<&str>,
        requested_by: Uuid,
    ) -> Result<WithdrawalRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, WithdrawalRequest>(
            r#"
            INSERT INTO withdrawal_requests (product_id, client_id, kind, quantity, reason, requested_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(client_id)
        .bind(kind)
        .bind(quantity)
        .bind(reason)
        .bind(requested_by)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict("Já existe uma solicitação de retirada pendente para este produto.".into());
                }
            }
            e.into()
        })
    }

    /// Encerra a solicitação (concluída ou cancelada).
    pub async fn resolve<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: WithdrawalStatus,
        resolved_by: Uuid,
    ) -> Result<WithdrawalRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, WithdrawalRequest>(
            r#"
            UPDATE withdrawal_requests SET
                status = $2, resolved_by = $3, resolved_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(resolved_by)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    pub async fn pending_for_product<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
    ) -> Result<Option<WithdrawalRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, WithdrawalRequest>(
            "SELECT * FROM withdrawal_requests WHERE product_id = $1 AND status = 'PENDENTE'",
        )
        .bind(product_id)
        .fetch_optional(executor)
        .await?;
        Ok(request)
    }
}
