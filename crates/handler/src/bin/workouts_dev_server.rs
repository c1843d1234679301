use std::sync::Arc;

use anyhow::Context;
use handler::config::{Config, ServerConfig};
use handler::server::{self, AppState};
use handler::Dispatcher;
use storage::PgConnector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting workout log dev server");

    let config = Config::from_env().context("Failed to load configuration")?;
    let server_config = ServerConfig::from_env().context("Failed to load server configuration")?;

    let database_url = config
        .database_url()
        .context("Cannot load DATABASE_URL env variable")?;
    tracing::info!(
        "Connecting to database at: {}",
        database_url.split('@').next_back().unwrap_or("unknown")
    );

    tracing::info!("Running database migrations");
    storage::run_migrations(database_url)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let dispatcher = Dispatcher::new(config, PgConnector);
    let app = server::router(AppState::new(Arc::new(dispatcher)));

    let bind_address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
