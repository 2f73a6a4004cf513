// src/db/seed_type_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::seed_type::SeedType,
};

pub struct SeedTypeFields<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub optimal_temperature: Option<Decimal>,
    pub optimal_humidity: Option<Decimal>,
    pub max_storage_days: Option<i32>,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct SeedTypeRepository {
    pool: PgPool,
}

impl SeedTypeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, only_active: bool) -> Result<Vec<SeedType>, AppError> {
        let seed_types = sqlx::query_as::<_, SeedType>(
            "SELECT * FROM seed_types WHERE ($1 = FALSE OR is_active) ORDER BY name ASC",
        )
        .bind(only_active)
        .fetch_all(&self.pool)
        .await?;
        Ok(seed_types)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<SeedType>, AppError> {
        let seed_type = sqlx::query_as::<_, SeedType>("SELECT * FROM seed_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(seed_type)
    }

    pub async fn find_by_name<'e, E>(&self, executor: E, name: &str) -> Result<Option<SeedType>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let seed_type = sqlx::query_as::<_, SeedType>(
            "SELECT * FROM seed_types WHERE LOWER(name) = LOWER($1)",
        )
        .bind(name.trim())
        .fetch_optional(executor)
        .await?;
        Ok(seed_type)
    }

    pub async fn create<'e, E>(&self, executor: E, fields: &SeedTypeFields<'_>) -> Result<SeedType, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, SeedType>(
            r#"
            INSERT INTO seed_types (name, description, optimal_temperature, optimal_humidity, max_storage_days, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(fields.name.trim())
        .bind(fields.description)
        .bind(fields.optimal_temperature)
        .bind(fields.optimal_humidity)
        .bind(fields.max_storage_days)
        .bind(fields.is_active)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| {
                AppError::UniqueConstraintViolation(format!("O tipo de semente '{}' já existe.", fields.name))
            })
        })
    }

    pub async fn update(&self, id: Uuid, fields: &SeedTypeFields<'_>) -> Result<Option<SeedType>, AppError> {
        sqlx::query_as::<_, SeedType>(
            r#"
            UPDATE seed_types SET
                name = $2, description = $3, optimal_temperature = $4,
                optimal_humidity = $5, max_storage_days = $6, is_active = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.name.trim())
        .bind(fields.description)
        .bind(fields.optimal_temperature)
        .bind(fields.optimal_humidity)
        .bind(fields.max_storage_days)
        .bind(fields.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| {
                AppError::UniqueConstraintViolation(format!("O tipo de semente '{}' já existe.", fields.name))
            })
        })
    }

    pub async fn count_products(&self, id: Uuid) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE seed_type_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM seed_types WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
