// src/services/seed_type_service.rs

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{seed_type_repo::SeedTypeFields, SeedTypeRepository},
    models::seed_type::{SeedType, SeedTypePayload},
};

fn fields(payload: &SeedTypePayload) -> SeedTypeFields<'_> {
    SeedTypeFields {
        name: &payload.name,
        description: payload.description.as_deref(),
        optimal_temperature: payload.optimal_temperature,
        optimal_humidity: payload.optimal_humidity,
        max_storage_days: payload.max_storage_days,
        is_active: payload.is_active.unwrap_or(true),
    }
}

#[derive(Clone)]
pub struct SeedTypeService {
    pool: PgPool,
    repo: SeedTypeRepository,
}

impl SeedTypeService {
    pub fn new(pool: PgPool, repo: SeedTypeRepository) -> Self {
        Self { pool, repo }
    }

    pub async fn list(&self, only_active: bool) -> Result<Vec<SeedType>, AppError> {
        self.repo.list(only_active).await
    }

    pub async fn get(&self, id: Uuid) -> Result<SeedType, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::NotFound("Tipo de semente"))
    }

    pub async fn create(&self, payload: &SeedTypePayload) -> Result<SeedType, AppError> {
        let seed_type = self.repo.create(&self.pool, &fields(payload)).await?;
        tracing::info!(seed_type_id = %seed_type.id, name = %seed_type.name, "Tipo de semente criado");
        Ok(seed_type)
    }

    pub async fn update(&self, id: Uuid, payload: &SeedTypePayload) -> Result<SeedType, AppError> {
        self.repo
            .update(id, &fields(payload))
            .await?
            .ok_or(AppError::NotFound("Tipo de semente"))
    }

    /// Tipos referenciados por produtos não podem ser excluídos (desative-os).
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let used_by = self.repo.count_products(id).await?;
        if used_by > 0 {
            return Err(AppError::Conflict(format!(
                "O tipo de semente está em uso por {} produto(s). Desative-o em vez de excluir.",
                used_by
            )));
        }
        if !self.repo.delete(id).await? {
            return Err(AppError::NotFound("Tipo de semente"));
        }
        tracing::info!(seed_type_id = %id, "Tipo de semente excluído");
        Ok(())
    }

    /// Busca pelo nome (sem diferenciar maiúsculas) ou cria um tipo novo.
    pub(crate) async fn find_or_create(&self, conn: &mut PgConnection, name: &str) -> Result<(SeedType, bool), AppError> {
        if let Some(seed_type) = self.repo.find_by_name(&mut *conn, name).await? {
            return Ok((seed_type, false));
        }
        let seed_type = self
            .repo
            .create(
                &mut *conn,
                &SeedTypeFields {
                    name,
                    description: None,
                    optimal_temperature: None,
                    optimal_humidity: None,
                    max_storage_days: None,
                    is_active: true,
                },
            )
            .await?;
        Ok((seed_type, true))
    }
}
