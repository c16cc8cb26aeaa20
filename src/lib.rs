//! Mic assignment and presenter rotation tracker.
//!
//! The server half (`routes`, `services`, `db`) owns days, sessions, mic
//! assignments, presenter slots and mic groups behind a JSON API. The
//! `client` module holds the page controllers that drive that API.

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use http::HeaderValue;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;

use config::Config;

pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub config: Config,
}

/// Full application router: `/health`, the tracker API under `/api` and
/// uploaded media under the configured prefix.
pub fn build_router(state: Arc<AppState>) -> Router {
    let config = &state.config;

    let origin = match config.server.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(_) => {
            tracing::warn!(
                "FRONTEND_URL '{}' is not a valid origin; cross-origin requests disabled",
                config.server.frontend_url
            );
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::OPTIONS])
        .allow_headers([
            http::header::CONTENT_TYPE,
            http::header::ACCEPT,
            http::HeaderName::from_static("x-csrftoken"),
        ])
        .allow_credentials(true);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", routes::api_router())
        .nest_service(
            &config.media.url_prefix,
            ServeDir::new(&config.media.root),
        )
        .layer(DefaultBodyLimit::max(config.media.max_upload_bytes))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::csrf::csrf_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::csp::csp_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
