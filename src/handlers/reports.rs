// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    common::error::{AppError, ErrorBody},
    config::AppState,
    models::{
        movement::MovementFilter,
        report::{
            CapacityReportLine, InventoryReport, InventoryReportQuery, MovementReport, MovementReportQuery,
            ReportFormat,
        },
    },
};

fn pdf_response(bytes: Vec<u8>, filename: &str) -> Response {
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("inline; filename=\"{}\"", filename)),
    ];
    (headers, bytes).into_response()
}

// GET /api/reports/inventory
#[utoipa::path(
    get,
    path = "/api/reports/inventory",
    tag = "Reports",
    params(InventoryReportQuery),
    responses(
        (status = 200, description = "Estoque atual (JSON ou PDF)", body = InventoryReport),
        (status = 500, description = "Fonte do PDF não encontrada", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn inventory_report(
    State(app_state): State<AppState>,
    Query(query): Query<InventoryReportQuery>,
) -> Result<Response, AppError> {
    let report = app_state
        .report_service
        .inventory(query.chamber_id, query.client_id)
        .await?;

    match query.format {
        ReportFormat::Json => Ok(Json(report).into_response()),
        ReportFormat::Pdf => {
            let bytes = app_state.document_service.inventory_pdf(&report)?;
            Ok(pdf_response(bytes, "relatorio_estoque.pdf"))
        }
    }
}

// GET /api/reports/movements
#[utoipa::path(
    get,
    path = "/api/reports/movements",
    tag = "Reports",
    params(MovementReportQuery),
    responses(
        (status = 200, description = "Movimentações do período (JSON ou PDF)", body = MovementReport),
        (status = 400, description = "Período inválido", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn movements_report(
    State(app_state): State<AppState>,
    Query(query): Query<MovementReportQuery>,
) -> Result<Response, AppError> {
    let filter = MovementFilter {
        movement_type: query.movement_type,
        from: query.from,
        to: query.to,
        ..Default::default()
    };
    let report = app_state.report_service.movements(&filter).await?;

    match query.format {
        ReportFormat::Json => Ok(Json(report).into_response()),
        ReportFormat::Pdf => {
            let bytes = app_state.document_service.movements_pdf(&report)?;
            Ok(pdf_response(bytes, "relatorio_movimentacoes.pdf"))
        }
    }
}

// GET /api/reports/capacity
#[utoipa::path(
    get,
    path = "/api/reports/capacity",
    tag = "Reports",
    responses((status = 200, description = "Capacidade e utilização por câmara", body = Vec<CapacityReportLine>)),
    security(("api_jwt" = []))
)]
pub async fn capacity_report(State(app_state): State<AppState>) -> Result<Json<Vec<CapacityReportLine>>, AppError> {
    Ok(Json(app_state.report_service.capacity().await?))
}
