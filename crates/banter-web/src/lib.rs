//! Browser-facing chat server for `banter-rs` sessions.
//!
//! `banter-web` exposes a small REST API over a [`SessionHandle`]: send a
//! message, read or clear the conversation, check device memory. One
//! conversation lives server-side in the session worker, so any number of
//! browser tabs see (and extend) the same exchange, one generation at a
//! time.
//!
//! # Quick start
//!
//! ```ignore
//! use banter_rs::prelude::*;
//! use banter_web::{WebConfig, spawn_web};
//! use std::sync::Arc;
//!
//! let runtime = Arc::new(RemoteRuntime::new(DEFAULT_DAEMON_URL, "qwen3-0.6b")?);
//! let session = ChatSession::new(runtime, SessionConfig::default());
//! let handle = SessionWorker::spawn(session);
//!
//! let addr = spawn_web(handle, WebConfig::default()).await;
//! println!("chat API: http://{addr}");
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──POST /api/chat──▶ axum handlers ──commands──▶ SessionWorker ──▶ ChatSession ──▶ daemon
//!    ▲                                                         │
//!    └───────────── JSON response + updated history ◀──────────┘
//! ```
//!
//! The handlers hold nothing but a cloned [`SessionHandle`]; every request
//! queues on the worker's channel and concurrent submitters wait their turn.

mod api;
mod server;

pub use api::{ChatRequest, ChatResponse, HistoryResponse, MemoryStatus};

use std::net::SocketAddr;
use std::path::PathBuf;

use banter_rs::prelude::SessionHandle;

/// Default port for the chat API.
pub const DEFAULT_PORT: u16 = 7860;

/// Configuration for the web server.
pub struct WebConfig {
    /// Address to bind to. Default: `0.0.0.0:7860`.
    pub bind_addr: SocketAddr,
    /// Directory of static frontend files to serve behind the API routes.
    ///
    /// If `None`, only the API is served; the frontend runs separately.
    pub static_dir: Option<PathBuf>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            static_dir: None,
        }
    }
}

/// Spawn the web server on a Tokio task and return the bound address.
///
/// The server runs until the Tokio runtime shuts down. All request handling
/// goes through `handle`; the server owns no session state of its own.
pub async fn spawn_web(handle: SessionHandle, config: WebConfig) -> SocketAddr {
    let router = server::build_router(handle, config.static_dir);
    server::start_server(router, config.bind_addr).await
}
