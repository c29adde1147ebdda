mod broadcast;
mod clicks;
mod config;
mod intake;
mod protocol;
mod registry;
mod routes;
mod state;

use std::process::ExitCode;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::{Config, ConfigError};

#[derive(Debug, thiserror::Error)]
enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("server failed: {0}")]
    Serve(#[source] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "cursorsync failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ServerError> {
    let config = Config::from_env()?;
    info!(env = config.env.as_str(), asset_dir = %config.asset_dir().display(), "configuration loaded");

    let http_port = config.http_port;
    let ws_port = config.ws_port;
    let state = state::AppState::new(config);

    // Runs for the life of the process.
    let _broadcast = broadcast::spawn_broadcast_task(state.clone());

    if http_port == ws_port {
        return serve("http+ws", http_port, routes::http_router(state)).await;
    }

    let http = serve("http", http_port, routes::http_router(state.clone()));
    let ws = serve("ws", ws_port, routes::ws_router(state));
    tokio::try_join!(http, ws)?;
    Ok(())
}

async fn serve(label: &'static str, port: u16, app: Router) -> Result<(), ServerError> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .map_err(|source| ServerError::Bind { port, source })?;

    info!(%port, listener = label, "cursorsync listening");
    axum::serve(listener, app).await.map_err(ServerError::Serve)
}
