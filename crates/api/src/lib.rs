mod auth;
pub mod routes;

use std::net::SocketAddr;

use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use jobs::JobContext;

/// Shared application state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub ctx: JobContext,
    /// Shared secret expected as `?key=` on the signals trigger endpoint.
    pub edge_secret: String,
}

/// Build and run the Axum API server.
pub async fn serve(state: AppState, port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    // Echoed on every response; the layer also answers OPTIONS preflights.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = Router::new()
        .merge(routes::trigger_router(state.clone()))
        .merge(routes::views_router())
        .merge(routes::health_router())
        .with_state(state)
        .layer(cors);

    info!(%addr, "Trigger API listening");
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
