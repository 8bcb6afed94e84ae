//! Benchmark suite for banter chat sessions.
//!
//! `banter-bench` drives embedded dataset samples through a
//! [`ChatSession`](banter_rs::prelude::ChatSession): open factual questions,
//! multiple-choice knowledge questions, scripted multi-turn conversations,
//! and adversarial prompts. Every call is timed, failures are recorded as
//! data points, and the run ends in a timestamped JSON report with
//! per-category summaries and multiple-choice accuracy.
//!
//! # Library usage
//!
//! ```ignore
//! use banter_bench::{BenchmarkRunner, Category, save_report};
//! use banter_rs::prelude::*;
//! use std::sync::Arc;
//!
//! let runtime = Arc::new(RemoteRuntime::new(DEFAULT_DAEMON_URL, "qwen3-0.6b")?);
//! let session = ChatSession::new(runtime, SessionConfig::default());
//!
//! let mut runner = BenchmarkRunner::new(session);
//! runner.run_category(Category::Truthful).await;
//! let results = runner.finish()?;
//! let (path, analysis) = save_report(&results, ".".as_ref())?;
//! ```
//!
//! # Binary
//!
//! ```sh
//! # Full suite
//! banter-bench
//!
//! # One category
//! banter-bench truthful
//! ```

pub mod datasets;
pub mod report;
pub mod runner;

pub use report::{Analysis, analyze, print_summary, save_report};
pub use runner::{BenchmarkRunner, Category, RunResults};
