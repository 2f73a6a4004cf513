pub mod auth;
pub mod chamber;
pub mod client;
pub mod dashboard;
pub mod location;
pub mod movement;
pub mod product;
pub mod report;
pub mod seed_type;
pub mod withdrawal;
