//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Two listeners by default. The HTTP listener serves the built client for
//! the selected environment plus `/ws` and `/healthz`; the websocket listener
//! upgrades at its root path. When both ports are configured equal only the
//! HTTP router is served and clients connect through `/ws`.

pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Static assets, favicon, health check, and the `/ws` upgrade route.
pub fn http_router(state: AppState) -> Router {
    let assets = ServeDir::new(state.config.asset_dir()).append_index_html_on_directories(true);
    let favicon = ServeFile::new(state.config.favicon_path());

    Router::new()
        .route("/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .route_service("/favicon.ico", favicon)
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bare websocket listener: upgrade at `/`.
pub fn ws_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ws::handle_ws))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
