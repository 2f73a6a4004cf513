// src/handlers/movements.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    common::{
        error::{AppError, ErrorBody},
        pagination::{Page, Pagination},
    },
    config::AppState,
    models::movement::{MovementDetail, MovementFilter},
};

// GET /api/movements
#[utoipa::path(
    get,
    path = "/api/movements",
    tag = "Movements",
    params(MovementFilter, Pagination),
    responses(
        (status = 200, description = "Histórico de movimentações (mais recentes primeiro)", body = Page<MovementDetail>),
        (status = 400, description = "Período inválido", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    Query(filter): Query<MovementFilter>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Page<MovementDetail>>, AppError> {
    Ok(Json(app_state.movement_service.list(&filter, &pagination).await?))
}

// GET /api/movements/{id}
#[utoipa::path(
    get,
    path = "/api/movements/{id}",
    tag = "Movements",
    params(("id" = Uuid, Path, description = "ID da movimentação")),
    responses(
        (status = 200, description = "Movimentação", body = MovementDetail),
        (status = 404, description = "Não encontrada", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_movement(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MovementDetail>, AppError> {
    Ok(Json(app_state.movement_service.get(id).await?))
}
