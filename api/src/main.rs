mod config;
mod database;
mod handlers;

use clap::{Parser, Subcommand};
use config::ApiConfig;
use database::Database;
use poem::{listener::TcpListener, middleware::Cors, EndpointExt, Server};
use std::sync::Arc;
use ticket_criteria::CriteriaCompiler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "api-server")]
#[command(about = "Ticket search criteria API server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve,
    /// Create and seed the lookup tables, then exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let cli = Cli::parse();

    // Load .env file if it exists
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env();
    match cli.command {
        Commands::Serve => serve_command(config).await,
        Commands::Migrate => migrate_command(config).await,
    }
}

async fn open_database(config: &ApiConfig) -> Result<Database, std::io::Error> {
    match Database::new(&config.database_url).await {
        Ok(db) => {
            tracing::info!("Database initialized at {}", config.database_url);
            Ok(db.with_sources(config.ticket_sources.clone()))
        }
        Err(e) => {
            tracing::error!(
                "Failed to initialize database at {}: {:#}",
                config.database_url,
                e
            );
            Err(std::io::Error::other(format!(
                "Database initialization failed: {:#}",
                e
            )))
        }
    }
}

async fn serve_command(config: ApiConfig) -> Result<(), std::io::Error> {
    let database = open_database(&config).await?;
    let compiler = Arc::new(
        CriteriaCompiler::new(Arc::new(database)).with_lookup_timeout(config.lookup_timeout),
    );

    let addr = config.bind_addr();
    tracing::info!(
        "Starting ticket criteria API server on {} (lookup timeout {:?})",
        addr,
        config.lookup_timeout
    );

    let app = handlers::routes(compiler).with(Cors::new());
    Server::new(TcpListener::bind(&addr)).run(app).await
}

async fn migrate_command(config: ApiConfig) -> Result<(), std::io::Error> {
    open_database(&config).await?;
    tracing::info!("Schema applied to {}", config.database_url);
    Ok(())
}
