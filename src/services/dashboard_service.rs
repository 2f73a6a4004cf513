// src/services/dashboard_service.rs

use crate::{
    common::error::AppError,
    db::{DashboardRepository, MovementRepository},
    models::{
        dashboard::{ChamberOccupancy, DashboardSummary},
        movement::MovementDetail,
    },
};

pub const DEFAULT_RECENT_MOVEMENTS: i64 = 10;
const MAX_RECENT_MOVEMENTS: i64 = 100;

#[derive(Clone)]
pub struct DashboardService {
    repo: DashboardRepository,
    movement_repo: MovementRepository,
}

impl DashboardService {
    pub fn new(repo: DashboardRepository, movement_repo: MovementRepository) -> Self {
        Self { repo, movement_repo }
    }

    pub async fn get_summary(&self) -> Result<DashboardSummary, AppError> {
        self.repo.get_summary().await
    }

    pub async fn get_occupancy(&self) -> Result<Vec<ChamberOccupancy>, AppError> {
        self.repo.get_occupancy().await
    }

    pub async fn get_recent_movements(&self, limit: Option<i64>) -> Result<Vec<MovementDetail>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_MOVEMENTS).clamp(1, MAX_RECENT_MOVEMENTS);
        self.movement_repo.recent(limit).await
    }
}
