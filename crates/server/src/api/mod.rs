//! HTTP surface.
//!
//! - `login`, `consent`, `logout` - challenge pages (/login, /consent, /logout)
//! - `health` - health check endpoint (/healthz)
//! - `openapi` - OpenAPI/Utoipa configuration, served by Redoc at /api-docs

pub mod consent;
pub mod error;
pub mod health;
pub mod login;
pub mod logout;
pub mod openapi;
pub mod pages;

pub use error::ApiError;
pub use health::MISC_TAG;

use std::sync::Arc;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_redoc::{Redoc, Servable};

use crate::config::PagesConfig;
use crate::flows::Flows;

/// Tag for the challenge endpoints in the OpenAPI document.
pub const CHALLENGE_TAG: &str = "Challenges";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub flows: Flows,
    pub pages: Arc<PagesConfig>,
}

/// Builds the application router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(openapi::ApiDoc::openapi())
        .merge(login::router())
        .merge(consent::router())
        .merge(logout::router())
        .routes(routes!(health::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .split_for_parts();

    router.merge(Redoc::with_url("/api-docs", api))
}

/// Starts the web server with all configured routes.
#[tracing::instrument(skip(state))]
pub async fn start_webserver(state: AppState, listen_addr: &str) -> color_eyre::Result<()> {
    let router = router(state);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(addr = %listen_addr, "Server running");
    axum::serve(listener, router)
        .await
        .map_err(|e| color_eyre::Report::msg(format!("Failed to start server: {e}")))?;

    Ok(())
}
