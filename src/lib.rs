// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod export;
pub mod handlers;
pub mod importer;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{config::AppState, docs::ApiDoc, middleware::auth::auth_guard};

/// Monta todas as rotas da API. Somente login e health ficam sem token.
pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route(
            "/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::deactivate_user),
        );

    let chamber_routes = Router::new()
        .route(
            "/",
            get(handlers::chambers::list_chambers).post(handlers::chambers::create_chamber),
        )
        .route(
            "/{id}",
            get(handlers::chambers::get_chamber)
                .put(handlers::chambers::update_chamber)
                .delete(handlers::chambers::delete_chamber),
        )
        .route("/{id}/conditions", patch(handlers::chambers::update_conditions))
        .route("/{id}/locations", get(handlers::chambers::list_chamber_locations));

    let location_routes = Router::new()
        .route("/", get(handlers::locations::list_locations))
        .route("/available", get(handlers::locations::list_available))
        .route("/optimal", get(handlers::locations::find_optimal))
        .route(
            "/{id}",
            get(handlers::locations::get_location).put(handlers::locations::update_location),
        )
        .route("/{id}/label", get(handlers::locations::location_label));

    let seed_type_routes = Router::new()
        .route(
            "/",
            get(handlers::seed_types::list_seed_types).post(handlers::seed_types::create_seed_type),
        )
        .route(
            "/{id}",
            get(handlers::seed_types::get_seed_type)
                .put(handlers::seed_types::update_seed_type)
                .delete(handlers::seed_types::delete_seed_type),
        );

    let client_routes = Router::new()
        .route(
            "/",
            get(handlers::clients::list_clients).post(handlers::clients::create_client),
        )
        .route(
            "/{id}",
            get(handlers::clients::get_client)
                .put(handlers::clients::update_client)
                .delete(handlers::clients::delete_client),
        )
        .route("/{id}/products", get(handlers::clients::list_client_products));

    let product_routes = Router::new()
        .route(
            "/",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route("/batch", post(handlers::products::create_batch))
        .route(
            "/{id}",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::remove_product),
        )
        .route("/{id}/allocate", post(handlers::products::allocate_product))
        .route("/{id}/move", post(handlers::products::move_product))
        .route("/{id}/partial-exit", post(handlers::products::partial_exit))
        .route("/{id}/partial-move", post(handlers::products::partial_move))
        .route("/{id}/add-stock", post(handlers::products::add_stock))
        .route("/{id}/movements", get(handlers::products::product_movements));

    let movement_routes = Router::new()
        .route("/", get(handlers::movements::list_movements))
        .route("/{id}", get(handlers::movements::get_movement));

    let withdrawal_routes = Router::new()
        .route(
            "/",
            get(handlers::withdrawals::list_withdrawals).post(handlers::withdrawals::create_withdrawal),
        )
        .route("/{id}", get(handlers::withdrawals::get_withdrawal))
        .route("/{id}/confirm", post(handlers::withdrawals::confirm_withdrawal))
        .route("/{id}/cancel", post(handlers::withdrawals::cancel_withdrawal));

    let dashboard_routes = Router::new()
        .route("/summary", get(handlers::dashboard::get_summary))
        .route("/occupancy", get(handlers::dashboard::get_occupancy))
        .route("/recent-movements", get(handlers::dashboard::get_recent_movements));

    let report_routes = Router::new()
        .route("/inventory", get(handlers::reports::inventory_report))
        .route("/movements", get(handlers::reports::movements_report))
        .route("/capacity", get(handlers::reports::capacity_report));

    // Tudo aqui dentro exige Bearer token válido de usuário ativo
    let protected = Router::new()
        .route("/auth/me", get(handlers::auth::get_me))
        .route("/auth/me/password", put(handlers::auth::change_password))
        .nest("/users", user_routes)
        .nest("/chambers", chamber_routes)
        .nest("/locations", location_routes)
        .nest("/seed-types", seed_type_routes)
        .nest("/clients", client_routes)
        .nest("/products", product_routes)
        .nest("/movements", movement_routes)
        .nest("/withdrawal-requests", withdrawal_routes)
        .nest("/dashboard", dashboard_routes)
        .nest("/reports", report_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let api = Router::new()
        .route("/health", get(handlers::health::health))
        .nest("/auth", auth_routes)
        .merge(protected);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api)
        .with_state(app_state)
}
