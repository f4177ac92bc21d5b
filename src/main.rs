use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use restoration_tracker_api::{app, config, database::DatabaseManager, AppState};

#[derive(Parser)]
#[command(name = "restoration-tracker-api")]
#[command(about = "REST API for ecological restoration projects and plans")]
#[command(version)]
struct Args {
    /// Port to listen on; overrides API_PORT
    #[arg(long, env = "API_PORT")]
    port: Option<u16>,

    /// Run embedded migrations before serving
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and friends are picked up
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = config::config();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    info!("Starting Restoration Tracker API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    if args.migrate || config.database.run_migrations {
        DatabaseManager::run_migrations(&pool).await.context("failed to run migrations")?;
    }

    let state = AppState::from_config(pool, config).context("failed to configure token verification")?;

    let port = args.port.unwrap_or(config.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Restoration Tracker API listening on http://{}", bind_addr);
    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
