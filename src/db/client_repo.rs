// src/db/client_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::client::Client,
};

pub struct ClientFields<'a> {
    pub name: &'a str,
    pub document: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub is_active: bool,
}

fn document_conflict(document: Option<&str>) -> AppError {
    AppError::UniqueConstraintViolation(format!(
        "Já existe um cliente com o documento '{}'.",
        document.unwrap_or_default()
    ))
}

#[derive(Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lista clientes; `search` busca por nome ou documento.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Client>, AppError> {
        let pattern = search.map(|s| format!("%{}%", s.trim()));
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT * FROM clients
            WHERE ($1::text IS NULL OR name ILIKE $1 OR document ILIKE $1)
            ORDER BY name ASC
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(clients)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(client)
    }

    pub async fn find_by_name<'e, E>(&self, executor: E, name: &str) -> Result<Option<Client>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let client = sqlx::query_as::<_, Client>(
            "SELECT * FROM clients WHERE LOWER(name) = LOWER($1) ORDER BY created_at LIMIT 1",
        )
        .bind(name.trim())
        .fetch_optional(executor)
        .await?;
        Ok(client)
    }

    pub async fn create<'e, E>(&self, executor: E, fields: &ClientFields<'_>) -> Result<Client, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (name, document, email, phone, address, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(fields.name.trim())
        .bind(fields.document)
        .bind(fields.email)
        .bind(fields.phone)
        .bind(fields.address)
        .bind(fields.is_active)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, |_| document_conflict(fields.document)))
    }

    pub async fn update(&self, id: Uuid, fields: &ClientFields<'_>) -> Result<Option<Client>, AppError> {
        sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients SET
                name = $2, document = $3, email = $4, phone = $5, address = $6,
                is_active = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.name.trim())
        .bind(fields.document)
        .bind(fields.email)
        .bind(fields.phone)
        .bind(fields.address)
        .bind(fields.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, |_| document_conflict(fields.document)))
    }

    pub async fn count_products(&self, id: Uuid, only_active: bool) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM products
            WHERE client_id = $1
              AND ($2 = FALSE OR status IN ('LOCADO', 'AGUARDANDO_RETIRADA', 'AGUARDANDO_LOCACAO', 'CADASTRADO'))
            "#,
        )
        .bind(id)
        .bind(only_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
