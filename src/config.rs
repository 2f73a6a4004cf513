// src/config.rs

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

use crate::{
    db::{
        ChamberRepository, ClientRepository, DashboardRepository, LocationRepository, MovementRepository,
        ProductRepository, ReportRepository, SeedTypeRepository, UserRepository, WithdrawalRepository,
    },
    services::{
        auth::AuthService, chamber_service::ChamberService, client_service::ClientService,
        dashboard_service::DashboardService, document_service::DocumentService, location_service::LocationService,
        movement_service::MovementService,
        product_service::ProductService, report_service::ReportService, seed_type_service::SeedTypeService,
        user_service::UserService, withdrawal_service::WithdrawalService,
    },
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("variável de ambiente {0} deve ser definida")]
    Missing(&'static str),

    #[error("valor inválido para {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub server_addr: String,
    pub db_max_connections: u32,
    pub default_location_capacity_kg: Decimal,
    pub fonts_dir: PathBuf,
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<String, ConfigError> {
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

impl Config {
    /// Lê a configuração do ambiente (depois de carregar o `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let default_location_capacity_kg = parsed(&lookup, "DEFAULT_LOCATION_CAPACITY_KG", Decimal::from(1000))?;
        if default_location_capacity_kg <= Decimal::ZERO {
            return Err(ConfigError::Invalid {
                name: "DEFAULT_LOCATION_CAPACITY_KG",
                value: default_location_capacity_kg.to_string(),
            });
        }

        Ok(Self {
            database_url: required(&lookup, "DATABASE_URL")?,
            jwt_secret: required(&lookup, "JWT_SECRET")?,
            jwt_expiration_hours: parsed(&lookup, "JWT_EXPIRATION_HOURS", 24)?,
            server_addr: lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            db_max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            default_location_capacity_kg,
            fonts_dir: lookup("FONTS_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./fonts")),
        })
    }
}

pub async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    let db_pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await?;

    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
    Ok(db_pool)
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Config,

    pub auth_service: AuthService,
    pub user_service: UserService,
    pub chamber_service: ChamberService,
    pub location_service: LocationService,
    pub movement_service: MovementService,
    pub seed_type_service: SeedTypeService,
    pub client_service: ClientService,
    pub product_service: ProductService,
    pub withdrawal_service: WithdrawalService,
    pub dashboard_service: DashboardService,
    pub report_service: ReportService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = connect(&config).await?;
        Ok(Self::from_pool(db_pool, config))
    }

    /// Monta o gráfico de dependências sobre um pool já criado.
    pub fn from_pool(db_pool: PgPool, config: Config) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let chamber_repo = ChamberRepository::new(db_pool.clone());
        let location_repo = LocationRepository::new(db_pool.clone());
        let seed_type_repo = SeedTypeRepository::new(db_pool.clone());
        let client_repo = ClientRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new(db_pool.clone());
        let movement_repo = MovementRepository::new(db_pool.clone());
        let withdrawal_repo = WithdrawalRepository::new(db_pool.clone());
        let dashboard_repo = DashboardRepository::new(db_pool.clone());
        let report_repo = ReportRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_expiration_hours,
        );
        let user_service = UserService::new(db_pool.clone(), user_repo);
        let chamber_service = ChamberService::new(
            db_pool.clone(),
            chamber_repo.clone(),
            location_repo.clone(),
            config.default_location_capacity_kg,
        );
        let location_service = LocationService::new(db_pool.clone(), location_repo.clone(), product_repo.clone());
        let seed_type_service = SeedTypeService::new(db_pool.clone(), seed_type_repo);
        let client_service = ClientService::new(db_pool.clone(), client_repo, product_repo.clone());
        let product_service = ProductService::new(
            db_pool.clone(),
            product_repo,
            location_repo,
            movement_repo.clone(),
            chamber_repo,
        );
        let withdrawal_service = WithdrawalService::new(db_pool.clone(), withdrawal_repo, product_service.clone());
        let movement_service = MovementService::new(movement_repo.clone());
        let dashboard_service = DashboardService::new(dashboard_repo, movement_repo.clone());
        let report_service = ReportService::new(report_repo, movement_repo);
        let document_service = DocumentService::new(config.fonts_dir.clone());

        Self {
            db_pool,
            config,
            auth_service,
            user_service,
            chamber_service,
            location_service,
            movement_service,
            seed_type_service,
            client_service,
            product_service,
            withdrawal_service,
            dashboard_service,
            report_service,
            document_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_absent() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/sementes"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(config.jwt_expiration_hours, 24);
        assert_eq!(config.server_addr, "0.0.0.0:3000");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.default_location_capacity_kg, Decimal::from(1000));
        assert_eq!(config.fonts_dir, PathBuf::from("./fonts"));
    }

    #[test]
    fn missing_required_var_is_an_error() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/sementes")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn invalid_number_is_reported() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/sementes"),
            ("JWT_SECRET", "segredo"),
            ("DB_MAX_CONNECTIONS", "muitas"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "DB_MAX_CONNECTIONS", .. }));
    }
}
