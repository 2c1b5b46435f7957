//! Beacon relay server binary.

use anyhow::Result;
use beacon_server::config::Config;
use beacon_server::state::AppState;
use beacon_server::{app, metrics};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beacon=debug,beacon_server=debug,beacon_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;

    if config.metrics.enabled {
        metrics::init(config.metrics.bind_addr()?)?;
    }

    let addr = config.bind_addr()?;
    let state = AppState::new(config);
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Beacon relay listening");
    axum::serve(listener, app).await?;

    Ok(())
}
