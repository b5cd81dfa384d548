//! IPAM API server

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ipam_api::{build_router, ApiConfig, ApiState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ApiConfig::from_env();
    if config.uses_dev_secret() {
        tracing::warn!("IPAM_JWT_SECRET not set, using the development secret");
    }

    let bind_addr = config.bind_addr.clone();
    let app = build_router(ApiState::in_memory(config));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("IPAM API listening on {}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
