use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use canteen_api::{AppConfig, prepare_state, routes};
use common::database::{DatabaseConfig, health_check, init_pool};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting canteen ledger API");

    let config = AppConfig::load()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let app_state = prepare_state(pool, &config).await?;
    info!(
        "Fallback product for legacy imports is {}",
        config.fallback_product_id
    );

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Canteen ledger API listening on {}", config.listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
