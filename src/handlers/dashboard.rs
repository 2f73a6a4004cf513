// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        dashboard::{ChamberOccupancy, DashboardSummary},
        movement::MovementDetail,
    },
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentMovementsQuery {
    /// Quantidade de movimentações (padrão 10, máximo 100)
    pub limit: Option<i64>,
}

// GET /api/dashboard/summary
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Resumo de câmaras, locais, produtos e movimentações do dia", body = DashboardSummary),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_summary(State(app_state): State<AppState>) -> Result<Json<DashboardSummary>, AppError> {
    Ok(Json(app_state.dashboard_service.get_summary().await?))
}

// GET /api/dashboard/occupancy
#[utoipa::path(
    get,
    path = "/api/dashboard/occupancy",
    tag = "Dashboard",
    responses((status = 200, description = "Ocupação e peso por câmara", body = Vec<ChamberOccupancy>)),
    security(("api_jwt" = []))
)]
pub async fn get_occupancy(State(app_state): State<AppState>) -> Result<Json<Vec<ChamberOccupancy>>, AppError> {
    Ok(Json(app_state.dashboard_service.get_occupancy().await?))
}

// GET /api/dashboard/recent-movements
#[utoipa::path(
    get,
    path = "/api/dashboard/recent-movements",
    tag = "Dashboard",
    params(RecentMovementsQuery),
    responses((status = 200, description = "Últimas movimentações", body = Vec<MovementDetail>)),
    security(("api_jwt" = []))
)]
pub async fn get_recent_movements(
    State(app_state): State<AppState>,
    Query(query): Query<RecentMovementsQuery>,
) -> Result<Json<Vec<MovementDetail>>, AppError> {
    Ok(Json(app_state.dashboard_service.get_recent_movements(query.limit).await?))
}
