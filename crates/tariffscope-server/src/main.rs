//! TariffScope — AD/CVD case research server.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = tariffscope_core::AppConfig::from_env();
    let port = config.port;
    let ttl = Duration::from_secs(config.cache_ttl_secs);

    let state = Arc::new(AppState::new(config, ttl));

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("TariffScope server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
