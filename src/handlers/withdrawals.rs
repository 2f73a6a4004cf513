// src/handlers/withdrawals.rs

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
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, RoleAdmin, RoleOperator},
    },
    models::withdrawal::{CreateWithdrawalPayload, WithdrawalDetail, WithdrawalFilter},
};

// POST /api/withdrawal-requests
#[utoipa::path(
    post,
    path = "/api/withdrawal-requests",
    tag = "Withdrawals",
    request_body = CreateWithdrawalPayload,
    responses(
        (status = 201, description = "Solicitação aberta; produto AGUARDANDO_RETIRADA", body = WithdrawalDetail),
        (status = 400, description = "Produto não está LOCADO ou quantidade inválida", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_withdrawal(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<RoleAdmin>,
    Json(payload): Json<CreateWithdrawalPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let request = app_state
        .withdrawal_service
        .create(
            payload.product_id,
            payload.kind,
            payload.quantity,
            payload.reason.as_deref(),
            user.id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

// GET /api/withdrawal-requests
#[utoipa::path(
    get,
    path = "/api/withdrawal-requests",
    tag = "Withdrawals",
    params(WithdrawalFilter),
    responses((status = 200, description = "Solicitações de retirada", body = Vec<WithdrawalDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_withdrawals(
    State(app_state): State<AppState>,
    Query(filter): Query<WithdrawalFilter>,
) -> Result<Json<Vec<WithdrawalDetail>>, AppError> {
    Ok(Json(app_state.withdrawal_service.list(filter.status).await?))
}

// GET /api/withdrawal-requests/{id}
#[utoipa::path(
    get,
    path = "/api/withdrawal-requests/{id}",
    tag = "Withdrawals",
    params(("id" = Uuid, Path, description = "ID da solicitação")),
    responses(
        (status = 200, description = "Solicitação", body = WithdrawalDetail),
        (status = 404, description = "Não encontrada", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_withdrawal(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WithdrawalDetail>, AppError> {
    Ok(Json(app_state.withdrawal_service.get(id).await?))
}

// POST /api/withdrawal-requests/{id}/confirm
#[utoipa::path(
    post,
    path = "/api/withdrawal-requests/{id}/confirm",
    tag = "Withdrawals",
    params(("id" = Uuid, Path, description = "ID da solicitação")),
    responses(
        (status = 200, description = "Retirada concluída", body = WithdrawalDetail),
        (status = 409, description = "Solicitação já encerrada", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn confirm_withdrawal(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<RoleOperator>,
    Path(id): Path<Uuid>,
) -> Result<Json<WithdrawalDetail>, AppError> {
    Ok(Json(app_state.withdrawal_service.confirm(id, user.id).await?))
}

// POST /api/withdrawal-requests/{id}/cancel
#[utoipa::path(
    post,
    path = "/api/withdrawal-requests/{id}/cancel",
    tag = "Withdrawals",
    params(("id" = Uuid, Path, description = "ID da solicitação")),
    responses(
        (status = 200, description = "Solicitação cancelada; produto volta a LOCADO", body = WithdrawalDetail),
        (status = 409, description = "Solicitação já encerrada", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_withdrawal(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireRole<RoleAdmin>,
    Path(id): Path<Uuid>,
) -> Result<Json<WithdrawalDetail>, AppError> {
    Ok(Json(app_state.withdrawal_service.cancel(id, user.id).await?))
}
