// src/db/location_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Pagination},
    models::location::{Coordinates, Location, LocationFilter, LocationWithChamber},
};

const LOCATION_WITH_CHAMBER: &str = r#"
    SELECT l.*, c.name AS chamber_name
    FROM locations l
    JOIN chambers c ON c.id = l.chamber_id
    WHERE 1 = 1
"#;

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &LocationFilter) {
    if let Some(chamber_id) = filter.chamber_id {
        qb.push(" AND l.chamber_id = ").push_bind(chamber_id);
    }
    if let Some(occupied) = filter.occupied {
        qb.push(" AND l.is_occupied = ").push_bind(occupied);
    }
    if let Some(quadra) = filter.quadra {
        qb.push(" AND l.quadra = ").push_bind(quadra);
    }
    if let Some(lado) = filter.lado {
        qb.push(" AND l.lado = ").push_bind(lado);
    }
    if let Some(fila) = filter.fila {
        qb.push(" AND l.fila = ").push_bind(fila);
    }
    if let Some(andar) = filter.andar {
        qb.push(" AND l.andar = ").push_bind(andar);
    }
}

#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    pub async fn list(
        &self,
        filter: &LocationFilter,
        pagination: &Pagination,
    ) -> Result<(Vec<LocationWithChamber>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM locations l JOIN chambers c ON c.id = l.chamber_id WHERE 1 = 1",
        );
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(LOCATION_WITH_CHAMBER);
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY c.name, l.quadra, l.lado, l.fila, l.andar");
        qb.push(" LIMIT ").push_bind(i64::from(pagination.limit()));
        qb.push(" OFFSET ").push_bind(pagination.offset());

        let locations = qb
            .build_query_as::<LocationWithChamber>()
            .fetch_all(&self.pool)
            .await?;
        Ok((locations, total))
    }

    pub async fn list_by_chamber(&self, chamber_id: Uuid) -> Result<Vec<Location>, AppError> {
        let locations = sqlx::query_as::<_, Location>(
            "SELECT * FROM locations WHERE chamber_id = $1 ORDER BY quadra, lado, fila, andar",
        )
        .bind(chamber_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(locations)
    }

    pub async fn find_with_chamber(&self, id: Uuid) -> Result<Option<LocationWithChamber>, AppError> {
        let sql = format!("{} AND l.id = $1", LOCATION_WITH_CHAMBER);
        let location = sqlx::query_as::<_, LocationWithChamber>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(location)
    }

    /// Locais livres com pelo menos `min_free_kg` de capacidade, em câmaras ativas.
    pub async fn list_free<'e, E>(
        &self,
        executor: E,
        chamber_id: Option<Uuid>,
        min_free_kg: Decimal,
    ) -> Result<Vec<LocationWithChamber>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut qb = QueryBuilder::<Postgres>::new(LOCATION_WITH_CHAMBER);
        qb.push(" AND NOT l.is_occupied AND c.status = 'ACTIVE'");
        qb.push(" AND l.max_capacity_kg - l.current_weight_kg >= ").push_bind(min_free_kg);
        if let Some(chamber_id) = chamber_id {
            qb.push(" AND l.chamber_id = ").push_bind(chamber_id);
        }
        qb.push(" ORDER BY c.name, l.quadra, l.lado, l.fila, l.andar");

        let locations = qb
            .build_query_as::<LocationWithChamber>()
            .fetch_all(executor)
            .await?;
        Ok(locations)
    }

    // ---
    // Escrita (transacional)
    // ---

    /// Busca o local travando a linha até o fim da transação.
    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Location>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location = sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(location)
    }

    pub async fn find_by_coordinates<'e, E>(
        &self,
        executor: E,
        chamber_id: Uuid,
        coordinates: Coordinates,
    ) -> Result<Option<Location>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location = sqlx::query_as::<_, Location>(
            r#"
            SELECT * FROM locations
            WHERE chamber_id = $1 AND quadra = $2 AND lado = $3 AND fila = $4 AND andar = $5
            "#,
        )
        .bind(chamber_id)
        .bind(coordinates.quadra)
        .bind(coordinates.lado)
        .bind(coordinates.fila)
        .bind(coordinates.andar)
        .fetch_optional(executor)
        .await?;
        Ok(location)
    }

    /// Define o peso atual; `is_occupied` acompanha (peso > 0).
    pub async fn set_weight<'e, E>(&self, executor: E, id: Uuid, weight_kg: Decimal) -> Result<Location, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location = sqlx::query_as::<_, Location>(
            r#"
            UPDATE locations SET
                current_weight_kg = $2,
                is_occupied = ($2 > 0),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(weight_kg)
        .fetch_one(executor)
        .await?;
        Ok(location)
    }

    pub async fn update_capacity<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        max_capacity_kg: Decimal,
    ) -> Result<Location, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let location = sqlx::query_as::<_, Location>(
            "UPDATE locations SET max_capacity_kg = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(max_capacity_kg)
        .fetch_one(executor)
        .await?;
        Ok(location)
    }
}
