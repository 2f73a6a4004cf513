pub mod auth;
pub mod chambers;
pub mod clients;
pub mod dashboard;
pub mod health;
pub mod locations;
pub mod movements;
pub mod products;
pub mod reports;
pub mod seed_types;
pub mod users;
pub mod withdrawals;
