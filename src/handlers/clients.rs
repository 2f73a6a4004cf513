// src/handlers/clients.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{AppError, ErrorBody},
        pagination::{Page, Pagination},
    },
    config::AppState,
    middleware::rbac::{RequireRole, RoleAdmin},
    models::{
        client::{Client, ClientFilter, ClientPayload},
        product::ProductDetail,
    },
    services::client_service::ClientRemoval,
};

// GET /api/clients
#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clients",
    params(ClientFilter),
    responses((status = 200, description = "Clientes", body = Vec<Client>)),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    Query(filter): Query<ClientFilter>,
) -> Result<Json<Vec<Client>>, AppError> {
    Ok(Json(app_state.client_service.list(filter.search.as_deref()).await?))
}

// POST /api/clients
#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clients",
    request_body = ClientPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Client),
        (status = 409, description = "Documento já cadastrado", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let client = app_state.client_service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

// GET /api/clients/{id}
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Client),
        (status = 404, description = "Não encontrado", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Client>, AppError> {
    Ok(Json(app_state.client_service.get(id).await?))
}

// PUT /api/clients/{id}
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    request_body = ClientPayload,
    responses((status = 200, description = "Cliente atualizado", body = Client)),
    security(("api_jwt" = []))
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClientPayload>,
) -> Result<Json<Client>, AppError> {
    payload.validate()?;
    Ok(Json(app_state.client_service.update(id, &payload).await?))
}

// DELETE /api/clients/{id}
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 204, description = "Cliente excluído"),
        (status = 200, description = "Cliente com histórico apenas desativado"),
        (status = 409, description = "Cliente com produtos em estoque", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_client(
    State(app_state): State<AppState>,
    _guard: RequireRole<RoleAdmin>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let response = match app_state.client_service.delete(id).await? {
        ClientRemoval::Deleted => StatusCode::NO_CONTENT.into_response(),
        ClientRemoval::Deactivated => (
            StatusCode::OK,
            Json(json!({ "message": "Cliente possui histórico e foi desativado." })),
        )
            .into_response(),
    };
    Ok(response)
}

// GET /api/clients/{id}/products
#[utoipa::path(
    get,
    path = "/api/clients/{id}/products",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "ID do cliente"), Pagination),
    responses((status = 200, description = "Produtos do cliente", body = Page<ProductDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_client_products(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Page<ProductDetail>>, AppError> {
    Ok(Json(app_state.client_service.products(id, &pagination).await?))
}
