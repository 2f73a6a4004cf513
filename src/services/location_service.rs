// src/services/location_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, Pagination},
    },
    db::{LocationRepository, ProductRepository},
    models::{
        location::{
            AvailableLocationQuery, Location, LocationDetail, LocationFilter, LocationSuggestion, LocationWithChamber,
            OptimalLocationQuery,
        },
        product::measure,
    },
    services::allocation::{rank_candidates, DEFAULT_SUGGESTIONS},
};

// Teto de sugestões por consulta
const MAX_SUGGESTIONS: usize = 50;

#[derive(Clone)]
pub struct LocationService {
    pool: PgPool,
    repo: LocationRepository,
    product_repo: ProductRepository,
}

impl LocationService {
    pub fn new(pool: PgPool, repo: LocationRepository, product_repo: ProductRepository) -> Self {
        Self { pool, repo, product_repo }
    }

    pub async fn list(&self, filter: &LocationFilter, pagination: &Pagination) -> Result<Page<LocationWithChamber>, AppError> {
        let (data, total) = self.repo.list(filter, pagination).await?;
        Ok(Page::new(data, total, pagination))
    }

    pub async fn find(&self, id: Uuid) -> Result<LocationWithChamber, AppError> {
        self.repo.find_with_chamber(id).await?.ok_or(AppError::NotFound("Local"))
    }

    /// Local com o produto ativo que o ocupa.
    pub async fn get(&self, id: Uuid) -> Result<LocationDetail, AppError> {
        let location = self.find(id).await?;
        let product = self.product_repo.find_active_by_location(&self.pool, id).await?;
        Ok(LocationDetail { location, product })
    }

    pub async fn available(&self, query: &AvailableLocationQuery) -> Result<Vec<LocationWithChamber>, AppError> {
        let min = query.min_capacity_kg.unwrap_or(Decimal::ZERO).max(Decimal::ZERO);
        self.repo.list_free(&self.pool, query.chamber_id, min).await
    }

    /// Melhores locais para `weight_kg`: menor sobra de capacidade primeiro.
    pub async fn optimal(&self, query: &OptimalLocationQuery) -> Result<Vec<LocationSuggestion>, AppError> {
        if query.weight_kg <= Decimal::ZERO {
            return Err(AppError::BadRequest("O peso deve ser maior que zero.".into()));
        }
        let limit = query.limit.unwrap_or(DEFAULT_SUGGESTIONS).clamp(1, MAX_SUGGESTIONS);
        let candidates = self.repo.list_free(&self.pool, query.chamber_id, query.weight_kg).await?;
        Ok(rank_candidates(candidates, query.weight_kg, limit))
    }

    /// Nova capacidade: positiva e nunca abaixo do peso já armazenado.
    pub async fn update_capacity(&self, id: Uuid, max_capacity_kg: Decimal) -> Result<Location, AppError> {
        let max_capacity_kg = measure(max_capacity_kg, "A capacidade")?;

        let mut tx = self.pool.begin().await?;
        let location = self
            .repo
            .find_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Local"))?;

        if max_capacity_kg < location.current_weight_kg {
            return Err(AppError::BadRequest(format!(
                "A capacidade ({} kg) não pode ser menor que o peso armazenado ({} kg).",
                max_capacity_kg, location.current_weight_kg
            )));
        }

        let updated = self.repo.update_capacity(&mut *tx, id, max_capacity_kg).await?;
        tx.commit().await?;

        tracing::info!(location = %updated.code, capacity_kg = %updated.max_capacity_kg, "Capacidade do local alterada");
        Ok(updated)
    }
}
