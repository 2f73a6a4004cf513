// src/handlers/seed_types.rs

use axum::{
    extract::{Path, Query, State},
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
    models::seed_type::{SeedType, SeedTypeFilter, SeedTypePayload},
};

// GET /api/seed-types
#[utoipa::path(
    get,
    path = "/api/seed-types",
    tag = "Seed Types",
    params(SeedTypeFilter),
    responses((status = 200, description = "Tipos de semente", body = Vec<SeedType>)),
    security(("api_jwt" = []))
)]
pub async fn list_seed_types(
    State(app_state): State<AppState>,
    Query(filter): Query<SeedTypeFilter>,
) -> Result<Json<Vec<SeedType>>, AppError> {
    let only_active = filter.active.unwrap_or(false);
    Ok(Json(app_state.seed_type_service.list(only_active).await?))
}

// POST /api/seed-types
#[utoipa::path(
    post,
    path = "/api/seed-types",
    tag = "Seed Types",
    request_body = SeedTypePayload,
    responses(
        (status = 201, description = "Tipo criado", body = SeedType),
        (status = 409, description = "Nome já existe", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_seed_type(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
    Json(payload): Json<SeedTypePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let seed_type = app_state.seed_type_service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(seed_type)))
}

// GET /api/seed-types/{id}
#[utoipa::path(
    get,
    path = "/api/seed-types/{id}",
    tag = "Seed Types",
    params(("id" = Uuid, Path, description = "ID do tipo de semente")),
    responses(
        (status = 200, description = "Tipo de semente", body = SeedType),
        (status = 404, description = "Não encontrado", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_seed_type(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SeedType>, AppError> {
    Ok(Json(app_state.seed_type_service.get(id).await?))
}

// PUT /api/seed-types/{id}
#[utoipa::path(
    put,
    path = "/api/seed-types/{id}",
    tag = "Seed Types",
    params(("id" = Uuid, Path, description = "ID do tipo de semente")),
    request_body = SeedTypePayload,
    responses((status = 200, description = "Tipo atualizado", body = SeedType)),
    security(("api_jwt" = []))
)]
pub async fn update_seed_type(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SeedTypePayload>,
) -> Result<Json<SeedType>, AppError> {
    payload.validate()?;
    Ok(Json(app_state.seed_type_service.update(id, &payload).await?))
}

// DELETE /api/seed-types/{id}
#[utoipa::path(
    delete,
    path = "/api/seed-types/{id}",
    tag = "Seed Types",
    params(("id" = Uuid, Path, description = "ID do tipo de semente")),
    responses(
        (status = 204, description = "Tipo excluído"),
        (status = 409, description = "Tipo em uso por produtos", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_seed_type(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.seed_type_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
