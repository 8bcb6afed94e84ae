//! Benchmark command for banter chat sessions.
//!
//! Runs embedded dataset samples against the model daemon and writes a
//! timestamped JSON report into the output directory.
//!
//! # Examples
//!
//! ```sh
//! # Full suite against the default daemon
//! banter-bench
//!
//! # One category
//! banter-bench truthful
//!
//! # Different daemon and report location
//! banter-bench --endpoint http://127.0.0.1:9000 --out-dir /tmp/reports law
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use banter_bench::{BenchmarkRunner, Category, print_summary, save_report};
use banter_rs::prelude::*;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Benchmark suite for banter chat sessions.
#[derive(Parser)]
#[command(name = "banter-bench")]
struct Cli {
    /// Category to run. Without this, the full suite runs.
    #[arg(value_enum)]
    category: Option<Category>,

    /// Base URL of the model daemon.
    #[arg(long, default_value = DEFAULT_DAEMON_URL)]
    endpoint: String,

    /// Model identifier requested from the daemon.
    #[arg(long, default_value = "qwen3-0.6b")]
    model: String,

    /// Directory the report file is written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let runtime = match RemoteRuntime::new(&cli.endpoint, &cli.model) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: failed to create daemon client: {e}");
            std::process::exit(1);
        }
    };
    let session = ChatSession::new(Arc::new(runtime), SessionConfig::default());

    println!("Benchmarking {} via {}", cli.model, cli.endpoint);
    let started = Instant::now();
    let mut runner = BenchmarkRunner::new(session);
    match cli.category {
        Some(category) => runner.run_category(category).await,
        None => runner.run_all().await,
    }
    let elapsed_minutes = started.elapsed().as_secs_f64() / 60.0;

    let results = match runner.finish() {
        Ok(results) => results,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match save_report(&results, &cli.out_dir) {
        Ok((path, analysis)) => {
            print_summary(&results, &analysis);
            println!();
            println!("Completed in {elapsed_minutes:.1} minutes");
            println!("Report written to {}", path.display());
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
