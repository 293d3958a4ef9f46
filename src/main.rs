use bot_dashboard::{load_settings, pipeline, resolve_data_path, router, AppState, DashboardConfig};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = DashboardConfig::from_env();
    let data_path = resolve_data_path()?;
    let settings = load_settings(&data_path).await;
    info!(profile = ?config.profile, path = %data_path.display(), "loaded settings");

    let port = config.port;
    let state = AppState::new(config, data_path, settings);

    if let Some(url) = pipeline::startup_url(&state).await {
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(err) = pipeline::connect(&state, &url).await {
                warn!("initial connect to {url} failed: {err}");
            }
        });
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
    }
    info!("shutting down");
}
