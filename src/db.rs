pub mod user_repo;
pub use user_repo::UserRepository;
pub mod chamber_repo;
pub use chamber_repo::ChamberRepository;
pub mod location_repo;
pub use location_repo::LocationRepository;
pub mod seed_type_repo;
pub use seed_type_repo::SeedTypeRepository;
pub mod client_repo;
pub use client_repo::ClientRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod movement_repo;
pub use movement_repo::MovementRepository;
pub mod withdrawal_repo;
pub use withdrawal_repo::WithdrawalRepository;
pub mod dashboard_repo;
pub use dashboard_repo::DashboardRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
