//! Convenience re-exports for common `banter-rs` types.
//!
//! Meant to be glob-imported when driving sessions:
//!
//! ```ignore
//! use banter_rs::prelude::*;
//! ```
//!
//! This pulls in what the typical caller needs: the [`ChatSession`] and its
//! config, the conversation types, the [`ModelRuntime`] trait with both
//! shipped implementations, the worker handle, and the memory monitor.
//! Specialized pieces (the fallback rule table, wire-level sampling params)
//! live in their modules; import them directly when needed.

// ── Conversation types ──────────────────────────────────────────────
pub use crate::{ChatTurn, GenerationOptions, PromptMessage, Role, SamplingParams};

// ── Session ─────────────────────────────────────────────────────────
pub use crate::session::worker::{ChatReply, SessionHandle, SessionWorker};
pub use crate::session::{ChatSession, ERROR_PREFIX, MEMORY_SHORTAGE_NOTICE, SessionConfig};

// ── Model runtimes ──────────────────────────────────────────────────
pub use crate::model::remote::{DEFAULT_DAEMON_URL, RemoteRuntime};
pub use crate::model::scripted::{ScriptStep, ScriptedRuntime};
pub use crate::model::{GenerationError, ModelRuntime, ReclaimScope};

// ── Resource monitoring ─────────────────────────────────────────────
pub use crate::monitor::{MemorySnapshot, pressure_exceeded, status_report};

// ── History bounds ──────────────────────────────────────────────────
pub use crate::history::HistoryLimits;
