// src/db/product_repo.rs

use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::Pagination},
    models::product::{NewProduct, Product, ProductDetail, ProductFilter, ProductRow, ProductStatus},
};

// Produto + referências populadas (local/câmara, tipo de semente, cliente)
const PRODUCT_DETAIL: &str = r#"
    SELECT p.*,
           l.code   AS location_code,
           c.id     AS chamber_id,
           c.name   AS chamber_name,
           st.name  AS seed_type_name,
           cl.name  AS client_name
    FROM products p
    LEFT JOIN locations l   ON l.id = p.location_id
    LEFT JOIN chambers c    ON c.id = l.chamber_id
    LEFT JOIN seed_types st ON st.id = p.seed_type_id
    LEFT JOIN clients cl    ON cl.id = p.client_id
    WHERE 1 = 1
"#;

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, filter: &'a ProductFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND p.status = ").push_bind(status);
    }
    if let Some(chamber_id) = filter.chamber_id {
        qb.push(" AND l.chamber_id = ").push_bind(chamber_id);
    }
    if let Some(client_id) = filter.client_id {
        qb.push(" AND p.client_id = ").push_bind(client_id);
    }
    if let Some(seed_type_id) = filter.seed_type_id {
        qb.push(" AND p.seed_type_id = ").push_bind(seed_type_id);
    }
    if let Some(batch_id) = filter.batch_id {
        qb.push(" AND p.batch_id = ").push_bind(batch_id);
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        qb.push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.lot ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    pub async fn list(
        &self,
        filter: &ProductFilter,
        pagination: &Pagination,
    ) -> Result<(Vec<ProductDetail>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM products p LEFT JOIN locations l ON l.id = p.location_id WHERE 1 = 1",
        );
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(PRODUCT_DETAIL);
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC, p.name ASC");
        qb.push(" LIMIT ").push_bind(i64::from(pagination.limit()));
        qb.push(" OFFSET ").push_bind(pagination.offset());

        let rows = qb.build_query_as::<ProductRow>().fetch_all(&self.pool).await?;
        Ok((rows.into_iter().map(ProductDetail::from).collect(), total))
    }

    pub async fn find_detail<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<ProductDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{} AND p.id = $1", PRODUCT_DETAIL);
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row.map(ProductDetail::from))
    }

    /// Produto ativo que ocupa o local, se houver.
    pub async fn find_active_by_location<'e, E>(
        &self,
        executor: E,
        location_id: Uuid,
    ) -> Result<Option<ProductDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "{} AND p.location_id = $1 AND p.status IN ('LOCADO', 'AGUARDANDO_RETIRADA')",
            PRODUCT_DETAIL
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(location_id)
            .fetch_optional(executor)
            .await?;
        Ok(row.map(ProductDetail::from))
    }

    // ---
    // Escrita (transacional)
    // ---

    pub async fn find_for_update<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        new: &NewProduct,
        status: ProductStatus,
        total_weight: rust_decimal::Decimal,
        batch_id: Option<Uuid>,
        created_by: Option<Uuid>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                name, lot, seed_type_id, client_id, location_id, batch_id,
                quantity, weight_per_unit, total_weight, status, storage_type,
                entry_date, expiration_date, notes, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, COALESCE($12, CURRENT_DATE), $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(new.name.trim())
        .bind(new.lot.trim())
        .bind(new.seed_type_id)
        .bind(new.client_id)
        .bind(new.location_id)
        .bind(batch_id)
        .bind(new.quantity)
        .bind(new.weight_per_unit)
        .bind(total_weight)
        .bind(status)
        .bind(new.storage_type.as_deref())
        .bind(new.entry_date)
        .bind(new.expiration_date)
        .bind(new.notes.as_deref())
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict("O local escolhido já possui um produto ativo.".into());
                }
                if db_err.is_foreign_key_violation() {
                    return AppError::BadRequest("Tipo de semente, cliente ou local inexistente.".into());
                }
            }
            e.into()
        })?;

        Ok(product)
    }

    /// Grava o estado completo do produto, incrementando `version`.
    /// Devolve `None` se a versão no banco não for mais a de `product.version`.
    pub async fn save<'e, E>(&self, executor: E, product: &Product) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let saved = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = $3, lot = $4, seed_type_id = $5, client_id = $6, location_id = $7,
                quantity = $8, weight_per_unit = $9, total_weight = $10, status = $11,
                storage_type = $12, expiration_date = $13, notes = $14,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING *
            "#,
        )
        .bind(product.id)
        .bind(product.version)
        .bind(&product.name)
        .bind(&product.lot)
        .bind(product.seed_type_id)
        .bind(product.client_id)
        .bind(product.location_id)
        .bind(product.quantity)
        .bind(product.weight_per_unit)
        .bind(product.total_weight)
        .bind(product.status)
        .bind(product.storage_type.as_deref())
        .bind(product.expiration_date)
        .bind(product.notes.as_deref())
        .fetch_optional(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict("O local escolhido já possui um produto ativo.".into());
                }
                if db_err.is_foreign_key_violation() {
                    return AppError::BadRequest("Tipo de semente ou cliente inexistente.".into());
                }
            }
            e.into()
        })?;

        Ok(saved)
    }
}
