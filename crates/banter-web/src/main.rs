//! Chat server over a local inference daemon.
//!
//! Boots one [`ChatSession`] against the daemon, parks it behind a session
//! worker, and serves the REST API until interrupted. The conversation lives
//! server-side; every client sees the same one.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p banter-web
//! cargo run -p banter-web -- --endpoint http://127.0.0.1:8090 --model qwen3-0.6b
//! cargo run -p banter-web -- --port 8080 --static-dir ./frontend/dist
//! ```
//!
//! Then talk to it:
//!
//! ```bash
//! curl -s localhost:7860/api/chat -H 'content-type: application/json' \
//!   -d '{"message": "What is the capital of France?"}'
//! curl -s localhost:7860/api/memory
//! curl -s -X POST localhost:7860/api/reset
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use banter_rs::prelude::*;
use banter_web::{DEFAULT_PORT, WebConfig, spawn_web};
use clap::Parser;
use tracing::info;

/// Chat server backed by a local inference daemon.
#[derive(Parser)]
#[command(about = "Chat server backed by a local inference daemon")]
struct Args {
    /// Base URL of the inference daemon.
    #[arg(long, default_value = DEFAULT_DAEMON_URL)]
    endpoint: String,

    /// Model identifier the daemon is serving.
    #[arg(long, default_value = "qwen3-0.6b")]
    model: String,

    /// Address to bind the API server to.
    #[arg(long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port for the API server.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Directory of static frontend files to serve behind the API.
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,banter_rs=debug".into()),
        )
        .init();

    // 1. Client for the inference daemon.
    let runtime = Arc::new(RemoteRuntime::new(&args.endpoint, &args.model)?);

    // 2. Log where device memory stands before the first request.
    info!("model {} via {}", args.model, args.endpoint);
    info!("{}", status_report(runtime.device_memory().await.as_ref()));

    // 3. One session, owned by its worker task.
    let session = ChatSession::new(runtime, SessionConfig::default());
    let handle = SessionWorker::spawn(session);

    // 4. Serve the API.
    let config = WebConfig {
        bind_addr: SocketAddr::from((args.host, args.port)),
        static_dir: args.static_dir,
    };
    let addr = spawn_web(handle, config).await;
    println!("chat API: http://{addr}");

    // 5. Run until interrupted.
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to listen for shutdown signal: {e}"))?;
    println!("shutting down");
    Ok(())
}
