// src/bin/seedctl.rs
//
// Ferramenta administrativa: cria o primeiro admin, redefine senhas e
// importa/exporta o estoque em planilhas.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use seed_storage::{
    config::{AppState, Config},
    export::export_inventory,
    importer::{ImportOptions, Importer},
    models::auth::{CreateUserPayload, UserRole},
};
use validator::Validate;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Parser)]
#[command(name = "seedctl")]
#[command(about = "Administração da câmara fria de sementes")]
#[command(version)]
struct Cli {
    /// Mostra logs de depuração
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cria um usuário ADMIN
    CreateAdmin {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Redefine a senha de um usuário
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Importa produtos de uma planilha (.xlsx, .xls, .ods ou .csv)
    Import {
        path: PathBuf,

        /// Câmara das linhas com quadra/lado/fila/andar
        #[arg(long)]
        chamber: Option<String>,

        /// Valida sem gravar
        #[arg(long)]
        dry_run: bool,

        /// Aba da planilha (padrão: a primeira)
        #[arg(long)]
        sheet: Option<String>,
    },

    /// Exporta o estoque atual em CSV
    Export {
        path: PathBuf,

        #[arg(long)]
        chamber: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let state = AppState::new(config).await?;
    sqlx::migrate!().run(&state.db_pool).await?;

    match cli.command {
        Commands::CreateAdmin { name, email, password } => {
            let payload = CreateUserPayload { name, email, password, role: UserRole::Admin };
            payload.validate()?;
            let user = state.user_service.create_from_payload(&payload).await?;
            println!("Administrador criado: {} <{}> ({})", user.name, user.email, user.id);
        }
        Commands::ResetPassword { email, password } => {
            if password.chars().count() < MIN_PASSWORD_LEN {
                anyhow::bail!("A senha deve ter no mínimo {} caracteres", MIN_PASSWORD_LEN);
            }
            let user = state.user_service.reset_password(&email, &password).await?;
            println!("Senha redefinida para {}", user.email);
        }
        Commands::Import { path, chamber, dry_run, sheet } => {
            let options = ImportOptions { chamber, dry_run, sheet, user_id: None };
            let report = Importer::new(&state).import_file(&path, &options).await?;
            println!("{}", report);
            if report.imported == 0 && !report.errors.is_empty() {
                anyhow::bail!("Nenhuma linha importada");
            }
        }
        Commands::Export { path, chamber } => {
            let count = export_inventory(&state, &path, chamber.as_deref()).await?;
            println!("{} produto(s) exportado(s) para {}", count, path.display());
        }
    }

    Ok(())
}
