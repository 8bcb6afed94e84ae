//! Bounded-resource chat session controller for small local language models.
//!
//! `banter-rs` is the session layer that sits between a chat surface (a web
//! UI, a benchmark harness) and an opaque model runtime. The core abstraction
//! is the [`ChatSession`](session::ChatSession), a request/response cycle
//! that converts a stream of user turns into bounded model inputs, clamps
//! generation parameters, schedules device-memory reclamation, and recovers
//! from resource exhaustion without ever surfacing a hard failure to the
//! caller.
//!
//! The model itself is behind the [`ModelRuntime`](model::ModelRuntime)
//! trait: encode-and-generate, decode, chat templating, reclaim, and device
//! memory queries. [`RemoteRuntime`](model::remote::RemoteRuntime) speaks to
//! a local inference daemon over HTTP;
//! [`ScriptedRuntime`](model::scripted::ScriptedRuntime) replays scripted
//! outcomes for tests.
//!
//! # Getting started
//!
//! Add `banter-rs` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! banter-rs = { path = "../banter-rs" }
//! ```
//!
//! Then drive a conversation:
//!
//! ```ignore
//! use banter_rs::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), String> {
//!     let runtime = Arc::new(RemoteRuntime::new("http://127.0.0.1:8090", "qwen3-0.6b")?);
//!     let mut session = ChatSession::new(runtime, SessionConfig::default());
//!
//!     let mut history: Vec<ChatTurn> = Vec::new();
//!     let reply = session
//!         .generate("What is the capital of France?", &history, &GenerationOptions::default())
//!         .await;
//!     history.push(ChatTurn::new("What is the capital of France?", &reply));
//!     println!("{reply}");
//!     Ok(())
//! }
//! ```
//!
//! # Where to find things
//!
//! If you're looking for how to...
//!
//! - **Run a conversation:** see [`ChatSession`](session::ChatSession) and
//!   [`SessionConfig`](session::SessionConfig). Each call takes the caller's
//!   history as a slice and returns a response string; the caller owns the
//!   history and appends the new [`ChatTurn`] itself.
//! - **Share one session between concurrent callers:** see
//!   [`SessionWorker`](session::worker::SessionWorker), which owns the
//!   session on a dedicated task and serializes access through a command
//!   channel.
//! - **Plug in a model:** implement [`ModelRuntime`](model::ModelRuntime),
//!   or use [`RemoteRuntime`](model::remote::RemoteRuntime) against an
//!   inference daemon.
//! - **Watch device memory:** see [`MemorySnapshot`](monitor::MemorySnapshot)
//!   and [`pressure_exceeded`](monitor::pressure_exceeded).
//! - **Bound the history:** see [`history::trim`] and
//!   [`history::prompt_window`].
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | [`ChatSession`](session::ChatSession) cycle, config, fallback rules, worker queue |
//! | [`model`] | [`ModelRuntime`](model::ModelRuntime) trait, remote daemon client, scripted test runtime |
//! | [`monitor`] | Device memory snapshots, pressure threshold, status formatting |
//! | [`history`] | Storage-cap trimming and prompt windowing |
//!
//! # Design principles
//!
//! 1. **The controller never fails.** Every call to
//!    [`generate`](session::ChatSession::generate) returns a string. Resource
//!    exhaustion becomes an actionable diagnostic, any other failure becomes
//!    an error-prefixed string, and nothing propagates as `Err`.
//!
//! 2. **Memory is a budget, not an accident.** Reclamation is scheduled
//!    (every N turns), reactive (above a pressure threshold), and terminal
//!    (after every call). History is bounded on the storage side and again on
//!    the prompt side.
//!
//! 3. **One handle, one owner.** A session wraps a single model handle and is
//!    never shared; concurrent callers go through the worker queue and wait
//!    their turn.
//!
//! 4. **The model is a capability.** Everything the session needs from the
//!    model is five trait methods. Swapping the daemon for a scripted stub
//!    changes no controller code.

pub mod history;
pub mod model;
pub mod monitor;
pub mod prelude;
pub mod session;

use serde::{Deserialize, Serialize};

// ── Constants ──────────────────────────────────────────────────────

/// Input-side token cap applied when encoding a prompt.
pub const MAX_INPUT_TOKENS: u32 = 1024;

/// Hard cap on generated tokens, applied regardless of caller input.
pub const MAX_NEW_TOKENS_CAP: u32 = 128;

/// Default token budget for a single response.
pub const DEFAULT_MAX_TOKENS: u32 = 128;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default nucleus sampling threshold.
pub const DEFAULT_TOP_P: f32 = 0.8;

/// Accepted sampling temperature range; callers outside it are clamped.
pub const TEMPERATURE_BOUNDS: (f32, f32) = (0.1, 1.5);

/// Accepted top-p range; callers outside it are clamped.
pub const TOP_P_BOUNDS: (f32, f32) = (0.1, 1.0);

// ── Conversation types ─────────────────────────────────────────────

/// One completed exchange: what the user said and what came back.
///
/// Turns are immutable once created. The caller owns the history `Vec` and
/// appends a turn after each [`generate`](session::ChatSession::generate)
/// call; the session only ever borrows it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatTurn {
    pub user: String,
    pub assistant: String,
}

impl ChatTurn {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

/// Role of a prompt message.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A message in the flattened prompt handed to
/// [`apply_chat_template`](model::ModelRuntime::apply_chat_template).
///
/// The session builds these from the windowed history plus the current user
/// message; the runtime serializes them into its model-specific template.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ── Generation parameters ──────────────────────────────────────────

/// Caller-supplied generation knobs.
///
/// These are requests, not guarantees: the session clamps them into
/// [`SamplingParams`] before anything reaches the model, so a caller asking
/// for 4096 tokens still gets at most [`MAX_NEW_TOKENS_CAP`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
        }
    }
}

impl GenerationOptions {
    pub fn new(max_tokens: u32, temperature: f32, top_p: f32) -> Self {
        Self {
            max_tokens,
            temperature,
            top_p,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    /// Clamp into the effective parameters sent to the model.
    ///
    /// `max_new_tokens` is capped at `max_new_tokens_cap`, temperature and
    /// top-p are clamped into [`TEMPERATURE_BOUNDS`] / [`TOP_P_BOUNDS`], and
    /// the cache-reuse flag is always off.
    pub fn clamp(&self, max_new_tokens_cap: u32, truncate_input: u32) -> SamplingParams {
        SamplingParams {
            max_new_tokens: self.max_tokens.min(max_new_tokens_cap),
            temperature: self.temperature.clamp(TEMPERATURE_BOUNDS.0, TEMPERATURE_BOUNDS.1),
            top_p: self.top_p.clamp(TOP_P_BOUNDS.0, TOP_P_BOUNDS.1),
            truncate_input,
            use_cache: false,
        }
    }
}

/// Effective, clamped parameters for one generation call.
///
/// Serialized verbatim into the daemon's generate request. `use_cache` is
/// always `false`: no token-reuse cache is kept across calls.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SamplingParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub truncate_input: u32,
    pub use_cache: bool,
}
