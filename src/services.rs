// Regras de negócio. Os handlers só falam com os serviços.
pub mod allocation;
pub mod auth;
pub mod chamber_service;
pub mod client_service;
pub mod dashboard_service;
pub mod document_service;
pub mod location_service;
pub mod movement_service;
pub mod product_service;
pub mod report_service;
pub mod seed_type_service;
pub mod user_service;
pub mod withdrawal_service;
