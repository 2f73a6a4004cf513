// src/services/chamber_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{chamber_repo::ChamberFields, ChamberRepository, LocationRepository},
    models::{
        chamber::{
            Chamber, ChamberConditionsPayload, ChamberStatus, ChamberWithStats, CreateChamberPayload, Dimensions,
            UpdateChamberPayload,
        },
        location::Location,
        product::measure,
    },
};

#[derive(Clone)]
pub struct ChamberService {
    pool: PgPool,
    repo: ChamberRepository,
    location_repo: LocationRepository,
    default_capacity_kg: Decimal,
}

impl ChamberService {
    pub fn new(
        pool: PgPool,
        repo: ChamberRepository,
        location_repo: LocationRepository,
        default_capacity_kg: Decimal,
    ) -> Self {
        Self { pool, repo, location_repo, default_capacity_kg }
    }

    pub async fn list(&self) -> Result<Vec<ChamberWithStats>, AppError> {
        self.repo.list_with_stats().await
    }

    pub async fn get(&self, id: Uuid) -> Result<ChamberWithStats, AppError> {
        self.repo.find_with_stats(id).await?.ok_or(AppError::NotFound("Câmara"))
    }

    pub async fn locations(&self, id: Uuid) -> Result<Vec<Location>, AppError> {
        // 404 para câmara inexistente em vez de lista vazia
        self.get(id).await?;
        self.location_repo.list_by_chamber(id).await
    }

    /// Cria a câmara e gera toda a grade de locais na mesma transação.
    pub async fn create(&self, payload: CreateChamberPayload) -> Result<ChamberWithStats, AppError> {
        let capacity = ensure_capacity(payload.default_location_capacity_kg.unwrap_or(self.default_capacity_kg))?;

        let fields = ChamberFields {
            name: payload.name.trim(),
            description: payload.description.as_deref(),
            dimensions: Dimensions {
                quadras: payload.quadras,
                lados: payload.lados,
                filas: payload.filas,
                andares: payload.andares,
            },
            target_temperature: payload.target_temperature,
            target_humidity: payload.target_humidity,
            status: payload.status.unwrap_or(ChamberStatus::Active),
            default_location_capacity_kg: capacity,
        };

        let mut tx = self.pool.begin().await?;
        let chamber = self.repo.create(&mut *tx, &fields).await?;
        let generated = self
            .repo
            .generate_locations(&mut *tx, chamber.id, &fields.dimensions.coordinates(), capacity)
            .await?;
        tx.commit().await?;

        tracing::info!(chamber_id = %chamber.id, name = %chamber.name, locations = generated, "Câmara criada");
        self.get(chamber.id).await
    }

    /// Atualiza a câmara. Crescer gera os locais novos; encolher remove os
    /// locais livres fora da grade e é recusado se algum deles estiver ocupado.
    pub async fn update(&self, id: Uuid, payload: UpdateChamberPayload) -> Result<ChamberWithStats, AppError> {
        let mut tx = self.pool.begin().await?;
        let current: Chamber = self
            .repo
            .find_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Câmara"))?;

        let old_dims = Dimensions::from(&current);
        let new_dims = Dimensions {
            quadras: payload.quadras.unwrap_or(old_dims.quadras),
            lados: payload.lados.unwrap_or(old_dims.lados),
            filas: payload.filas.unwrap_or(old_dims.filas),
            andares: payload.andares.unwrap_or(old_dims.andares),
        };
        let capacity = ensure_capacity(
            payload
                .default_location_capacity_kg
                .unwrap_or(current.default_location_capacity_kg),
        )?;

        let name = payload.name.as_deref().map(str::trim).unwrap_or(&current.name);
        let fields = ChamberFields {
            name,
            description: payload.description.as_deref().or(current.description.as_deref()),
            dimensions: new_dims,
            target_temperature: payload.target_temperature.or(current.target_temperature),
            target_humidity: payload.target_humidity.or(current.target_humidity),
            status: payload.status.unwrap_or(current.status),
            default_location_capacity_kg: capacity,
        };

        if new_dims.shrinks_from(&old_dims) {
            let occupied = self.repo.count_occupied_outside(&mut *tx, id, new_dims).await?;
            if occupied > 0 {
                return Err(AppError::Conflict(format!(
                    "Não é possível reduzir a câmara: {} local(is) ocupado(s) ficariam fora das novas dimensões.",
                    occupied
                )));
            }
            let removed = self.repo.delete_free_outside(&mut *tx, id, new_dims).await?;
            tracing::info!(chamber_id = %id, removed, "Locais fora das novas dimensões removidos");
        }

        let chamber = self.repo.update(&mut *tx, id, &fields).await?;
        if new_dims != old_dims {
            let generated = self
                .repo
                .generate_locations(&mut *tx, id, &new_dims.coordinates(), capacity)
                .await?;
            tracing::info!(chamber_id = %id, generated, "Grade de locais ajustada");
        }
        tx.commit().await?;

        tracing::info!(chamber_id = %chamber.id, "Câmara atualizada");
        self.get(chamber.id).await
    }

    /// Exclui a câmara (e seus locais). Recusado enquanto houver local ocupado.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        self.repo
            .find_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Câmara"))?;

        let occupied = self.repo.count_occupied(&mut *tx, id).await?;
        if occupied > 0 {
            return Err(AppError::Conflict(format!(
                "A câmara possui {} local(is) ocupado(s) e não pode ser excluída.",
                occupied
            )));
        }
        self.repo.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::warn!(chamber_id = %id, "Câmara excluída");
        Ok(())
    }

    pub async fn update_conditions(&self, id: Uuid, payload: ChamberConditionsPayload) -> Result<Chamber, AppError> {
        if payload.current_temperature.is_none() && payload.current_humidity.is_none() {
            return Err(AppError::BadRequest("Informe a temperatura ou a umidade atual.".into()));
        }
        if let Some(humidity) = payload.current_humidity {
            if humidity < Decimal::ZERO || humidity > Decimal::ONE_HUNDRED {
                return Err(AppError::BadRequest("A umidade deve estar entre 0 e 100%.".into()));
            }
        }
        self.repo
            .update_conditions(id, payload.current_temperature, payload.current_humidity)
            .await?
            .ok_or(AppError::NotFound("Câmara"))
    }
}

fn ensure_capacity(capacity: Decimal) -> Result<Decimal, AppError> {
    Ok(measure(capacity, "A capacidade dos locais")?)
}
