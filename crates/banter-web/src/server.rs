//! Axum server setup and router construction.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use axum::routing::{get, post};
use banter_rs::prelude::SessionHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::api::{self, AppState};

/// Build the full axum router.
///
/// The router serves:
/// - REST API at `/api/*`
/// - Optional static frontend files behind the API routes
pub fn build_router(handle: SessionHandle, static_dir: Option<PathBuf>) -> Router {
    let app_state = AppState { handle };

    // CORS layer for development (frontend dev server on a different port).
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/api/chat", post(api::post_chat))
        .route("/api/reset", post(api::post_reset))
        .route("/api/memory", get(api::get_memory))
        .route("/api/history", get(api::get_history))
        .with_state(app_state);

    let mut router = Router::new().merge(api_routes).layer(cors);

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
}

/// Start the axum server and return the bound address.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind(bind_addr).await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    addr
}
