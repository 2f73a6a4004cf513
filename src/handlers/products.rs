// src/handlers/products.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
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
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, RoleAdmin},
    },
    models::{
        movement::MovementDetail,
        product::{
            AddStockPayload, AllocateProductPayload, BatchProductPayload, CreateProductPayload, MoveProductPayload,
            NewProduct, PartialExitPayload, PartialMovePayload, ProductDetail, ProductFilter, RemoveProductQuery,
            UpdateProductPayload,
        },
    },
};

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(ProductFilter, Pagination),
    responses((status = 200, description = "Produtos (paginado)", body = Page<ProductDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    Query(filter): Query<ProductFilter>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Page<ProductDetail>>, AppError> {
    Ok(Json(app_state.product_service.list(&filter, &pagination).await?))
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto cadastrado", body = ProductDetail),
        (status = 400, description = "Dados inválidos", body = ErrorBody),
        (status = 409, description = "Local ocupado ou sem capacidade", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let product = app_state
        .product_service
        .create(NewProduct::from(payload), user.id)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

// POST /api/products/batch
#[utoipa::path(
    post,
    path = "/api/products/batch",
    tag = "Products",
    request_body = BatchProductPayload,
    responses(
        (status = 201, description = "Lote cadastrado (todos com o mesmo batchId)", body = Vec<ProductDetail>),
        (status = 400, description = "Algum item inválido; nada foi gravado", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_batch(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<BatchProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let items = payload.items.into_iter().map(NewProduct::from).collect();
    let products = app_state.product_service.create_batch(items, user.id).await?;
    Ok((StatusCode::CREATED, Json(products)))
}

// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto", body = ProductDetail),
        (status = 404, description = "Não encontrado", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductDetail>, AppError> {
    Ok(Json(app_state.product_service.get(id).await?))
}

// PUT /api/products/{id}
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = ProductDetail),
        (status = 409, description = "Versão desatualizada ou produto encerrado", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<Json<ProductDetail>, AppError> {
    payload.validate()?;
    Ok(Json(app_state.product_service.update(id, payload.into(), user.id).await?))
}

// DELETE /api/products/{id}
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto"), RemoveProductQuery),
    responses(
        (status = 200, description = "Produto REMOVIDO e local liberado", body = ProductDetail),
        (status = 409, description = "Produto já encerrado", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_product(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<RoleAdmin>,
    Path(id): Path<Uuid>,
    Query(query): Query<RemoveProductQuery>,
) -> Result<Json<ProductDetail>, AppError> {
    Ok(Json(
        app_state
            .product_service
            .remove(id, query.reason.as_deref(), user.id)
            .await?,
    ))
}

// POST /api/products/{id}/allocate
#[utoipa::path(
    post,
    path = "/api/products/{id}/allocate",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = AllocateProductPayload,
    responses(
        (status = 200, description = "Produto LOCADO", body = ProductDetail),
        (status = 400, description = "Produto já possui local ou câmara inativa", body = ErrorBody),
        (status = 409, description = "Local ocupado, sem capacidade ou status inválido", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn allocate_product(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AllocateProductPayload>,
) -> Result<Json<ProductDetail>, AppError> {
    Ok(Json(
        app_state
            .product_service
            .allocate(id, payload.location_id, user.id)
            .await?,
    ))
}

// POST /api/products/{id}/move
#[utoipa::path(
    post,
    path = "/api/products/{id}/move",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = MoveProductPayload,
    responses(
        (status = 200, description = "Produto transferido", body = ProductDetail),
        (status = 409, description = "Local de destino ocupado", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn move_product(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<MoveProductPayload>,
) -> Result<Json<ProductDetail>, AppError> {
    Ok(Json(
        app_state
            .product_service
            .move_product(id, payload.new_location_id, payload.reason.as_deref(), user.id)
            .await?,
    ))
}

// POST /api/products/{id}/partial-exit
#[utoipa::path(
    post,
    path = "/api/products/{id}/partial-exit",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = PartialExitPayload,
    responses(
        (status = 200, description = "Saída parcial registrada", body = ProductDetail),
        (status = 400, description = "Quantidade deve ser menor que a atual", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn partial_exit(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PartialExitPayload>,
) -> Result<Json<ProductDetail>, AppError> {
    payload.validate()?;
    Ok(Json(
        app_state
            .product_service
            .partial_exit(id, payload.quantity, payload.reason.as_deref(), user.id)
            .await?,
    ))
}

// POST /api/products/{id}/partial-move
#[utoipa::path(
    post,
    path = "/api/products/{id}/partial-move",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = PartialMovePayload,
    responses(
        (status = 201, description = "Novo produto criado no local de destino", body = ProductDetail),
        (status = 400, description = "Quantidade inválida", body = ErrorBody),
        (status = 409, description = "Local de destino ocupado ou sem capacidade", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn partial_move(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PartialMovePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let created = app_state
        .product_service
        .partial_move(
            id,
            payload.quantity,
            payload.new_location_id,
            payload.reason.as_deref(),
            user.id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// POST /api/products/{id}/add-stock
#[utoipa::path(
    post,
    path = "/api/products/{id}/add-stock",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = AddStockPayload,
    responses(
        (status = 200, description = "Entrada registrada", body = ProductDetail),
        (status = 409, description = "Capacidade do local excedida", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn add_stock(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddStockPayload>,
) -> Result<Json<ProductDetail>, AppError> {
    payload.validate()?;
    Ok(Json(
        app_state
            .product_service
            .add_stock(
                id,
                payload.quantity,
                payload.weight_per_unit,
                payload.reason.as_deref(),
                user.id,
            )
            .await?,
    ))
}

// GET /api/products/{id}/movements
#[utoipa::path(
    get,
    path = "/api/products/{id}/movements",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto"), Pagination),
    responses((status = 200, description = "Histórico do produto", body = Page<MovementDetail>)),
    security(("api_jwt" = []))
)]
pub async fn product_movements(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Page<MovementDetail>>, AppError> {
    Ok(Json(app_state.product_service.movements(id, &pagination).await?))
}
