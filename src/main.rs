use std::sync::Arc;

use session_auth_api::{
    auth::repository::{IdentityStore, InMemoryIdentityStore, PgIdentityStore},
    build_service,
    config::AppConfig,
    create_router, db,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Session Auth API - Starting...");

    // The signing key is read here once and handed to the token codec
    let config = AppConfig::from_env()?;

    let backend: Arc<dyn IdentityStore> = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = db::connect_and_migrate(database_url, config.store_timeout).await?;
            Arc::new(PgIdentityStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; identities are kept in memory and lost on restart");
            Arc::new(InMemoryIdentityStore::new())
        }
    };

    let service = Arc::new(build_service(&config, backend)?);
    let app = create_router(service);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Session Auth API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
