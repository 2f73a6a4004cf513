// src/db/chamber_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::{
        chamber::{Chamber, ChamberStatus, ChamberWithStats, Dimensions},
        location::Coordinates,
    },
};

// Agregados de ocupação reaproveitados em listagens e no detalhe
const CHAMBER_WITH_STATS: &str = r#"
    SELECT c.*,
           COUNT(l.id)                                  AS total_locations,
           COUNT(l.id) FILTER (WHERE l.is_occupied)     AS occupied_locations,
           COALESCE(SUM(l.max_capacity_kg), 0)          AS total_capacity_kg,
           COALESCE(SUM(l.current_weight_kg), 0)        AS current_weight_kg
    FROM chambers c
    LEFT JOIN locations l ON l.chamber_id = c.id
"#;

pub struct ChamberFields<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub dimensions: Dimensions,
    pub target_temperature: Option<Decimal>,
    pub target_humidity: Option<Decimal>,
    pub status: ChamberStatus,
    pub default_location_capacity_kg: Decimal,
}

#[derive(Clone)]
pub struct ChamberRepository {
    pool: PgPool,
}

impl ChamberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_with_stats(&self) -> Result<Vec<ChamberWithStats>, AppError> {
        let sql = format!("{} GROUP BY c.id ORDER BY c.name ASC", CHAMBER_WITH_STATS);
        let chambers = sqlx::query_as::<_, ChamberWithStats>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(chambers)
    }

    pub async fn find_with_stats(&self, id: Uuid) -> Result<Option<ChamberWithStats>, AppError> {
        let sql = format!("{} WHERE c.id = $1 GROUP BY c.id", CHAMBER_WITH_STATS);
        let chamber = sqlx::query_as::<_, ChamberWithStats>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(chamber)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Chamber>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let chamber = sqlx::query_as::<_, Chamber>("SELECT * FROM chambers WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(chamber)
    }

    pub async fn find_by_name<'e, E>(&self, executor: E, name: &str) -> Result<Option<Chamber>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let chamber = sqlx::query_as::<_, Chamber>("SELECT * FROM chambers WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(executor)
            .await?;
        Ok(chamber)
    }

    /// Busca a câmara travando a linha até o fim da transação.
    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Chamber>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let chamber = sqlx::query_as::<_, Chamber>("SELECT * FROM chambers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(chamber)
    }

    pub async fn create<'e, E>(&self, executor: E, fields: &ChamberFields<'_>) -> Result<Chamber, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Chamber>(
            r#"
            INSERT INTO chambers (
                name, description, quadras, lados, filas, andares,
                target_temperature, target_humidity, status, default_location_capacity_kg
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(fields.name)
        .bind(fields.description)
        .bind(fields.dimensions.quadras)
        .bind(fields.dimensions.lados)
        .bind(fields.dimensions.filas)
        .bind(fields.dimensions.andares)
        .bind(fields.target_temperature)
        .bind(fields.target_humidity)
        .bind(fields.status)
        .bind(fields.default_location_capacity_kg)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| {
                AppError::UniqueConstraintViolation(format!("Já existe uma câmara chamada '{}'.", fields.name))
            })
        })
    }

    pub async fn update<'e, E>(&self, executor: E, id: Uuid, fields: &ChamberFields<'_>) -> Result<Chamber, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Chamber>(
            r#"
            UPDATE chambers SET
                name = $2, description = $3,
                quadras = $4, lados = $5, filas = $6, andares = $7,
                target_temperature = $8, target_humidity = $9,
                status = $10, default_location_capacity_kg = $11,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(fields.name)
        .bind(fields.description)
        .bind(fields.dimensions.quadras)
        .bind(fields.dimensions.lados)
        .bind(fields.dimensions.filas)
        .bind(fields.dimensions.andares)
        .bind(fields.target_temperature)
        .bind(fields.target_humidity)
        .bind(fields.status)
        .bind(fields.default_location_capacity_kg)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            map_unique_violation(e, |_| {
                AppError::UniqueConstraintViolation(format!("Já existe uma câmara chamada '{}'.", fields.name))
            })
        })
    }

    /// Atualiza as leituras atuais de temperatura/umidade.
    pub async fn update_conditions(
        &self,
        id: Uuid,
        current_temperature: Option<Decimal>,
        current_humidity: Option<Decimal>,
    ) -> Result<Option<Chamber>, AppError> {
        let chamber = sqlx::query_as::<_, Chamber>(
            r#"
            UPDATE chambers SET
                current_temperature = COALESCE($2, current_temperature),
                current_humidity = COALESCE($3, current_humidity),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(current_temperature)
        .bind(current_humidity)
        .fetch_optional(&self.pool)
        .await?;
        Ok(chamber)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM chambers WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Cria os locais que faltam na grade. Locais existentes ficam intactos.
    pub async fn generate_locations<'e, E>(
        &self,
        executor: E,
        chamber_id: Uuid,
        coordinates: &[Coordinates],
        capacity_kg: Decimal,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let quadras: Vec<i32> = coordinates.iter().map(|c| c.quadra).collect();
        let lados: Vec<i32> = coordinates.iter().map(|c| c.lado).collect();
        let filas: Vec<i32> = coordinates.iter().map(|c| c.fila).collect();
        let andares: Vec<i32> = coordinates.iter().map(|c| c.andar).collect();
        let codes: Vec<String> = coordinates.iter().map(Coordinates::code).collect();

        // Inserção em massa usando UNNEST para performance
        let result = sqlx::query(
            r#"
            INSERT INTO locations (chamber_id, quadra, lado, fila, andar, code, max_capacity_kg)
            SELECT $1, t.q, t.l, t.f, t.a, t.code, $7
            FROM UNNEST($2::int4[], $3::int4[], $4::int4[], $5::int4[], $6::text[]) AS t(q, l, f, a, code)
            ON CONFLICT (chamber_id, quadra, lado, fila, andar) DO NOTHING
            "#,
        )
        .bind(chamber_id)
        .bind(&quadras)
        .bind(&lados)
        .bind(&filas)
        .bind(&andares)
        .bind(&codes)
        .bind(capacity_kg)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Conta locais ocupados fora das novas dimensões.
    pub async fn count_occupied_outside<'e, E>(
        &self,
        executor: E,
        chamber_id: Uuid,
        dims: Dimensions,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM locations
            WHERE chamber_id = $1 AND is_occupied
              AND (quadra > $2 OR lado > $3 OR fila > $4 OR andar > $5)
            "#,
        )
        .bind(chamber_id)
        .bind(dims.quadras)
        .bind(dims.lados)
        .bind(dims.filas)
        .bind(dims.andares)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    /// Remove os locais livres fora das novas dimensões.
    pub async fn delete_free_outside<'e, E>(
        &self,
        executor: E,
        chamber_id: Uuid,
        dims: Dimensions,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM locations
            WHERE chamber_id = $1 AND NOT is_occupied
              AND (quadra > $2 OR lado > $3 OR fila > $4 OR andar > $5)
            "#,
        )
        .bind(chamber_id)
        .bind(dims.quadras)
        .bind(dims.lados)
        .bind(dims.filas)
        .bind(dims.andares)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_occupied<'e, E>(&self, executor: E, chamber_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM locations WHERE chamber_id = $1 AND is_occupied",
        )
        .bind(chamber_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }
}
