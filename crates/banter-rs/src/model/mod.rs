//! The model capability seam.
//!
//! Everything the session controller needs from a language model is the
//! [`ModelRuntime`] trait: chat templating, encode-and-generate, decode,
//! reclaim, and device memory queries. The session holds an
//! `Arc<dyn ModelRuntime>` and never learns which implementation is behind
//! it.
//!
//! Two implementations ship with the crate:
//!
//! - [`remote::RemoteRuntime`] talks to a local inference daemon over HTTP.
//! - [`scripted::ScriptedRuntime`] replays scripted outcomes in-process, for
//!   tests and dry runs.

pub mod remote;
pub mod scripted;

use async_trait::async_trait;

use crate::monitor::MemorySnapshot;
use crate::{PromptMessage, SamplingParams};

// ── Errors ─────────────────────────────────────────────────────────

/// Why a generation call failed.
///
/// The session controller matches on the kind to choose a recovery action:
/// resource exhaustion gets an aggressive reclaim and an actionable
/// diagnostic, everything else gets logged and surfaced as an error string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The device could not satisfy an allocation mid-generation.
    ResourceExhaustion(String),
    /// Any other runtime failure (bad request, daemon fault, decode fault).
    Failure(String),
    /// No model or device is currently serving requests.
    Unavailable(String),
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationError::ResourceExhaustion(msg) => {
                write!(f, "device out of memory: {msg}")
            }
            GenerationError::Failure(msg) => write!(f, "generation failed: {msg}"),
            GenerationError::Unavailable(msg) => write!(f, "model unavailable: {msg}"),
        }
    }
}

impl std::error::Error for GenerationError {}

// ── Reclaim ────────────────────────────────────────────────────────

/// How much to give back when reclaiming device memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReclaimScope {
    /// Empty the allocator cache and run collection.
    Cache,
    /// `Cache`, plus release any cross-process memory handles the runtime
    /// offers. Used when recovering from resource exhaustion.
    Full,
}

impl ReclaimScope {
    /// Wire label for the daemon protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReclaimScope::Cache => "cache",
            ReclaimScope::Full => "full",
        }
    }
}

// ── Runtime trait ──────────────────────────────────────────────────

/// An opaque language model the session can drive.
///
/// Implementations own the tokenizer and the device. The contract the
/// session relies on:
///
/// - [`reclaim`](ModelRuntime::reclaim) is idempotent and best-effort; it
///   never fails and calling it twice in one cycle is harmless.
/// - [`device_memory`](ModelRuntime::device_memory) returns `None` when no
///   accelerator is present. That is a capability gap, not an error, and
///   callers degrade monitoring to a no-op.
/// - [`decode`](ModelRuntime::decode) strips special tokens; the session
///   only trims whitespace afterwards.
#[async_trait]
pub trait ModelRuntime: Send + Sync {
    /// Identifier of the loaded model, for logs and reports.
    fn name(&self) -> &str;

    /// Serialize messages into the model's chat template.
    ///
    /// With `direct_answer` set, the template asks the model to answer
    /// immediately instead of emitting a reasoning preamble.
    fn apply_chat_template(&self, messages: &[PromptMessage], direct_answer: bool) -> String;

    /// Tokenize the prompt (truncating to `params.truncate_input`) and
    /// generate, returning only the newly generated token ids.
    async fn encode_and_generate(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<Vec<u32>, GenerationError>;

    /// Turn generated token ids back into text, special tokens stripped.
    async fn decode(&self, tokens: &[u32]) -> Result<String, GenerationError>;

    /// Give device memory back. Best-effort; never fails.
    async fn reclaim(&self, scope: ReclaimScope);

    /// Point-in-time device memory stats, or `None` without an accelerator.
    async fn device_memory(&self) -> Option<MemorySnapshot>;
}
