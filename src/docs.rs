// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::common;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(title = "Câmara Fria de Sementes", description = "Controle de estoque refrigerado de sementes"),
    paths(
        // --- Health ---
        handlers::health::health,

        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,
        handlers::auth::change_password,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::deactivate_user,

        // --- Chambers ---
        handlers::chambers::list_chambers,
        handlers::chambers::create_chamber,
        handlers::chambers::get_chamber,
        handlers::chambers::update_chamber,
        handlers::chambers::delete_chamber,
        handlers::chambers::update_conditions,
        handlers::chambers::list_chamber_locations,

        // --- Locations ---
        handlers::locations::list_locations,
        handlers::locations::list_available,
        handlers::locations::find_optimal,
        handlers::locations::get_location,
        handlers::locations::update_location,
        handlers::locations::location_label,

        // --- Seed types ---
        handlers::seed_types::list_seed_types,
        handlers::seed_types::create_seed_type,
        handlers::seed_types::get_seed_type,
        handlers::seed_types::update_seed_type,
        handlers::seed_types::delete_seed_type,

        // --- Clients ---
        handlers::clients::list_clients,
        handlers::clients::create_client,
        handlers::clients::get_client,
        handlers::clients::update_client,
        handlers::clients::delete_client,
        handlers::clients::list_client_products,

        // --- Products ---
        handlers::products::list_products,
        handlers::products::create_product,
        handlers::products::create_batch,
        handlers::products::get_product,
        handlers::products::update_product,
        handlers::products::remove_product,
        handlers::products::allocate_product,
        handlers::products::move_product,
        handlers::products::partial_exit,
        handlers::products::partial_move,
        handlers::products::add_stock,
        handlers::products::product_movements,

        // --- Movements ---
        handlers::movements::list_movements,
        handlers::movements::get_movement,

        // --- Withdrawals ---
        handlers::withdrawals::create_withdrawal,
        handlers::withdrawals::list_withdrawals,
        handlers::withdrawals::get_withdrawal,
        handlers::withdrawals::confirm_withdrawal,
        handlers::withdrawals::cancel_withdrawal,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::get_occupancy,
        handlers::dashboard::get_recent_movements,

        // --- Reports ---
        handlers::reports::inventory_report,
        handlers::reports::movements_report,
        handlers::reports::capacity_report,
    ),
    components(
        schemas(
            common::error::ErrorBody,
            handlers::health::HealthResponse,

            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::ChangePasswordPayload,

            // --- Chambers / Locations ---
            models::chamber::ChamberStatus,
            models::chamber::Chamber,
            models::chamber::ChamberWithStats,
            models::chamber::CreateChamberPayload,
            models::chamber::UpdateChamberPayload,
            models::chamber::ChamberConditionsPayload,
            models::location::Location,
            models::location::LocationWithChamber,
            models::location::LocationDetail,
            models::location::LocationSuggestion,
            models::location::UpdateLocationPayload,

            // --- Cadastros ---
            models::seed_type::SeedType,
            models::seed_type::SeedTypePayload,
            models::client::Client,
            models::client::ClientPayload,

            // --- Products ---
            models::product::ProductStatus,
            models::product::Product,
            models::product::ProductDetail,
            models::product::NamedRef,
            models::product::LocationRef,
            models::product::CreateProductPayload,
            models::product::BatchProductPayload,
            models::product::UpdateProductPayload,
            models::product::AllocateProductPayload,
            models::product::MoveProductPayload,
            models::product::PartialExitPayload,
            models::product::PartialMovePayload,
            models::product::AddStockPayload,

            // --- Movements / Withdrawals ---
            models::movement::MovementType,
            models::movement::Movement,
            models::movement::MovementDetail,
            models::withdrawal::WithdrawalKind,
            models::withdrawal::WithdrawalStatus,
            models::withdrawal::WithdrawalRequest,
            models::withdrawal::WithdrawalDetail,
            models::withdrawal::CreateWithdrawalPayload,

            // --- Dashboard / Reports ---
            models::dashboard::DashboardSummary,
            models::dashboard::StatusCount,
            models::dashboard::ChamberOccupancy,
            models::report::ReportFormat,
            models::report::InventoryReportLine,
            models::report::InventoryReport,
            models::report::MovementReport,
            models::report::CapacityReportLine,
        )
    ),
    tags(
        (name = "Health", description = "Verificação do serviço"),
        (name = "Auth", description = "Autenticação"),
        (name = "Users", description = "Gestão de Usuários (ADMIN)"),
        (name = "Chambers", description = "Câmaras Frias e Condições"),
        (name = "Locations", description = "Locais de Armazenagem e Etiquetas"),
        (name = "Seed Types", description = "Tipos de Semente"),
        (name = "Clients", description = "Clientes Depositantes"),
        (name = "Products", description = "Estoque de Produtos e Operações"),
        (name = "Movements", description = "Histórico de Movimentações"),
        (name = "Withdrawals", description = "Solicitações de Retirada"),
        (name = "Dashboard", description = "Indicadores Gerenciais"),
        (name = "Reports", description = "Relatórios em JSON ou PDF")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_protected_routes_with_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/products/{id}/partial-move"));
        assert!(doc.paths.paths.contains_key("/api/withdrawal-requests/{id}/confirm"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
