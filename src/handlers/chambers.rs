// src/handlers/chambers.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{AppError, ErrorBody},
    config::AppState,
    middleware::rbac::{RequireRole, RoleAdmin},
    models::{
        chamber::{
            Chamber, ChamberConditionsPayload, ChamberWithStats, CreateChamberPayload, UpdateChamberPayload,
        },
        location::Location,
    },
};

// GET /api/chambers
#[utoipa::path(
    get,
    path = "/api/chambers",
    tag = "Chambers",
    responses((status = 200, description = "Câmaras com ocupação", body = Vec<ChamberWithStats>)),
    security(("api_jwt" = []))
)]
pub async fn list_chambers(State(app_state): State<AppState>) -> Result<Json<Vec<ChamberWithStats>>, AppError> {
    Ok(Json(app_state.chamber_service.list().await?))
}

// POST /api/chambers
#[utoipa::path(
    post,
    path = "/api/chambers",
    tag = "Chambers",
    request_body = CreateChamberPayload,
    responses(
        (status = 201, description = "Câmara criada com todos os locais", body = ChamberWithStats),
        (status = 400, description = "Dados inválidos", body = ErrorBody),
        (status = 409, description = "Nome já existe", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_chamber(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
    Json(payload): Json<CreateChamberPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let chamber = app_state.chamber_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(chamber)))
}

// GET /api/chambers/{id}
#[utoipa::path(
    get,
    path = "/api/chambers/{id}",
    tag = "Chambers",
    params(("id" = Uuid, Path, description = "ID da câmara")),
    responses(
        (status = 200, description = "Câmara", body = ChamberWithStats),
        (status = 404, description = "Não encontrada", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_chamber(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ChamberWithStats>, AppError> {
    Ok(Json(app_state.chamber_service.get(id).await?))
}

// PUT /api/chambers/{id}
#[utoipa::path(
    put,
    path = "/api/chambers/{id}",
    tag = "Chambers",
    params(("id" = Uuid, Path, description = "ID da câmara")),
    request_body = UpdateChamberPayload,
    responses(
        (status = 200, description = "Câmara atualizada", body = ChamberWithStats),
        (status = 409, description = "Redução deixaria locais ocupados de fora", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_chamber(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateChamberPayload>,
) -> Result<Json<ChamberWithStats>, AppError> {
    payload.validate()?;
    Ok(Json(app_state.chamber_service.update(id, payload).await?))
}

// DELETE /api/chambers/{id}
#[utoipa::path(
    delete,
    path = "/api/chambers/{id}",
    tag = "Chambers",
    params(("id" = Uuid, Path, description = "ID da câmara")),
    responses(
        (status = 204, description = "Câmara excluída"),
        (status = 409, description = "Há locais ocupados", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_chamber(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.chamber_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// PATCH /api/chambers/{id}/conditions
#[utoipa::path(
    patch,
    path = "/api/chambers/{id}/conditions",
    tag = "Chambers",
    params(("id" = Uuid, Path, description = "ID da câmara")),
    request_body = ChamberConditionsPayload,
    responses((status = 200, description = "Leituras registradas", body = Chamber)),
    security(("api_jwt" = []))
)]
pub async fn update_conditions(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChamberConditionsPayload>,
) -> Result<Json<Chamber>, AppError> {
    Ok(Json(app_state.chamber_service.update_conditions(id, payload).await?))
}

// GET /api/chambers/{id}/locations
#[utoipa::path(
    get,
    path = "/api/chambers/{id}/locations",
    tag = "Chambers",
    params(("id" = Uuid, Path, description = "ID da câmara")),
    responses((status = 200, description = "Grade de locais da câmara", body = Vec<Location>)),
    security(("api_jwt" = []))
)]
pub async fn list_chamber_locations(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Location>>, AppError> {
    Ok(Json(app_state.chamber_service.locations(id).await?))
}
