// src/services/movement_service.rs

use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, Pagination},
    },
    db::MovementRepository,
    models::movement::{MovementDetail, MovementFilter},
};

// Histórico somente leitura; a escrita acontece nas operações de produto
#[derive(Clone)]
pub struct MovementService {
    repo: MovementRepository,
}

impl MovementService {
    pub fn new(repo: MovementRepository) -> Self {
        Self { repo }
    }

    pub async fn list(&self, filter: &MovementFilter, pagination: &Pagination) -> Result<Page<MovementDetail>, AppError> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(AppError::BadRequest("A data inicial deve ser anterior à data final.".into()));
            }
        }
        let (data, total) = self.repo.list(filter, pagination).await?;
        Ok(Page::new(data, total, pagination))
    }

    pub async fn get(&self, id: Uuid) -> Result<MovementDetail, AppError> {
        self.repo.find_detail(id).await?.ok_or(AppError::NotFound("Movimentação"))
    }
}
