// src/handlers/locations.rs

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{AppError, ErrorBody},
        pagination::{Page, Pagination},
    },
    config::AppState,
    middleware::rbac::{RequireRole, RoleAdmin},
    models::location::{
        AvailableLocationQuery, Location, LocationDetail, LocationFilter, LocationSuggestion, LocationWithChamber,
        OptimalLocationQuery, UpdateLocationPayload,
    },
};

// GET /api/locations
#[utoipa::path(
    get,
    path = "/api/locations",
    tag = "Locations",
    params(LocationFilter, Pagination),
    responses((status = 200, description = "Locais (paginado)", body = Page<LocationWithChamber>)),
    security(("api_jwt" = []))
)]
pub async fn list_locations(
    State(app_state): State<AppState>,
    Query(filter): Query<LocationFilter>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Page<LocationWithChamber>>, AppError> {
    Ok(Json(app_state.location_service.list(&filter, &pagination).await?))
}

// GET /api/locations/available
#[utoipa::path(
    get,
    path = "/api/locations/available",
    tag = "Locations",
    params(AvailableLocationQuery),
    responses((status = 200, description = "Locais livres em câmaras ativas", body = Vec<LocationWithChamber>)),
    security(("api_jwt" = []))
)]
pub async fn list_available(
    State(app_state): State<AppState>,
    Query(query): Query<AvailableLocationQuery>,
) -> Result<Json<Vec<LocationWithChamber>>, AppError> {
    Ok(Json(app_state.location_service.available(&query).await?))
}

// GET /api/locations/optimal
#[utoipa::path(
    get,
    path = "/api/locations/optimal",
    tag = "Locations",
    params(OptimalLocationQuery),
    responses(
        (status = 200, description = "Sugestões ordenadas pelo menor desperdício", body = Vec<LocationSuggestion>),
        (status = 400, description = "Peso inválido", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn find_optimal(
    State(app_state): State<AppState>,
    Query(query): Query<OptimalLocationQuery>,
) -> Result<Json<Vec<LocationSuggestion>>, AppError> {
    Ok(Json(app_state.location_service.optimal(&query).await?))
}

// GET /api/locations/{id}
#[utoipa::path(
    get,
    path = "/api/locations/{id}",
    tag = "Locations",
    params(("id" = Uuid, Path, description = "ID do local")),
    responses(
        (status = 200, description = "Local com o produto ativo", body = LocationDetail),
        (status = 404, description = "Não encontrado", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_location(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LocationDetail>, AppError> {
    Ok(Json(app_state.location_service.get(id).await?))
}

// PUT /api/locations/{id}
#[utoipa::path(
    put,
    path = "/api/locations/{id}",
    tag = "Locations",
    params(("id" = Uuid, Path, description = "ID do local")),
    request_body = UpdateLocationPayload,
    responses(
        (status = 200, description = "Capacidade alterada", body = Location),
        (status = 400, description = "Capacidade abaixo do peso armazenado", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_location(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationPayload>,
) -> Result<Json<Location>, AppError> {
    payload.validate()?;
    Ok(Json(app_state.location_service.update_capacity(id, payload.max_capacity_kg).await?))
}

// GET /api/locations/{id}/label
#[utoipa::path(
    get,
    path = "/api/locations/{id}/label",
    tag = "Locations",
    params(("id" = Uuid, Path, description = "ID do local")),
    responses(
        (status = 200, description = "Etiqueta em PDF com QR code", content_type = "application/pdf"),
        (status = 404, description = "Não encontrado", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn location_label(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let location = app_state.location_service.find(id).await?;
    let pdf_bytes = app_state.document_service.location_label(&location)?;

    // Configura os Headers para o navegador baixar ou mostrar o PDF
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"etiqueta_{}.pdf\"", location.location.code),
        ),
    ];
    Ok((headers, pdf_bytes).into_response())
}
