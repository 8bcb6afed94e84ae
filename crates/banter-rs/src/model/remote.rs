//! HTTP client for a local inference daemon.
//!
//! The daemon owns the model weights, the tokenizer, and the accelerator;
//! this client drives it through a small JSON protocol:
//!
//! | Endpoint | Purpose |
//! |----------|---------|
//! | `POST /v1/generate` | Tokenize a prompt (truncated server-side) and generate; returns new token ids |
//! | `POST /v1/detokenize` | Token ids back to text, special tokens stripped |
//! | `POST /v1/reclaim` | Empty allocator caches; `full` scope also drops cross-process handles |
//! | `GET /v1/memory` | Device memory stats, or `available: false` |
//!
//! Chat templating happens client-side in the ChatML dialect the target
//! model family uses, so the daemon only ever sees a flat prompt string.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::model::{GenerationError, ModelRuntime, ReclaimScope};
use crate::monitor::MemorySnapshot;
use crate::{PromptMessage, SamplingParams};

/// Where the inference daemon listens unless configured otherwise.
pub const DEFAULT_DAEMON_URL: &str = "http://127.0.0.1:8090";

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    #[serde(flatten)]
    params: SamplingParams,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    tokens: Vec<u32>,
}

#[derive(Serialize, Debug)]
struct DetokenizeRequest<'a> {
    tokens: &'a [u32],
}

#[derive(Deserialize, Debug)]
struct DetokenizeResponse {
    text: String,
}

#[derive(Serialize, Debug)]
struct ReclaimRequest {
    scope: &'static str,
}

#[derive(Deserialize, Debug)]
struct MemoryResponse {
    #[serde(default)]
    available: bool,
    allocated_gb: Option<f64>,
    reserved_gb: Option<f64>,
    total_gb: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct DaemonError {
    error: String,
}

// ── Error classification ───────────────────────────────────────────

/// Pull the daemon's error message out of a response body, falling back to
/// the raw body when it isn't the expected JSON shape.
fn daemon_error_message(body: &str) -> String {
    match serde_json::from_str::<DaemonError>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => body.to_string(),
    }
}

/// Map a daemon failure onto a [`GenerationError`] kind by status and
/// message content. Matching is substring-based; daemons word these
/// messages differently across backends.
fn classify_daemon_error(status: Option<reqwest::StatusCode>, message: &str) -> GenerationError {
    let lower = message.to_lowercase();
    if lower.contains("out of memory")
        || lower.contains("oom")
        || lower.contains("failed to allocate")
    {
        return GenerationError::ResourceExhaustion(message.to_string());
    }
    if status == Some(reqwest::StatusCode::SERVICE_UNAVAILABLE)
        || lower.contains("no model")
        || lower.contains("not loaded")
        || lower.contains("unavailable")
    {
        return GenerationError::Unavailable(message.to_string());
    }
    GenerationError::Failure(message.to_string())
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client implementing [`ModelRuntime`] against an inference
/// daemon.
pub struct RemoteRuntime {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl RemoteRuntime {
    /// Create a client for the daemon at `base_url` serving `model`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent("banter-rs/0.2")
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a request body and hand back the successful response text, with
    /// daemon failures already classified.
    async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<String, GenerationError> {
        let resp = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GenerationError::Unavailable(format!("daemon unreachable: {e}"))
                } else {
                    GenerationError::Failure(format!("request failed: {e}"))
                }
            })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| GenerationError::Failure(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            let message = daemon_error_message(&text);
            return Err(classify_daemon_error(Some(status), &message));
        }
        Ok(text)
    }
}

#[async_trait]
impl ModelRuntime for RemoteRuntime {
    fn name(&self) -> &str {
        &self.model
    }

    fn apply_chat_template(&self, messages: &[PromptMessage], direct_answer: bool) -> String {
        let mut prompt = String::new();
        for msg in messages {
            prompt.push_str("<|im_start|>");
            prompt.push_str(&msg.role.to_string());
            prompt.push('\n');
            prompt.push_str(&msg.content);
            prompt.push_str("<|im_end|>\n");
        }
        prompt.push_str("<|im_start|>assistant\n");
        if direct_answer {
            // Pre-filled empty think block: the model family's convention
            // for skipping the reasoning preamble.
            prompt.push_str("<think>\n\n</think>\n\n");
        }
        prompt
    }

    async fn encode_and_generate(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<Vec<u32>, GenerationError> {
        debug!(
            "generate request: model={}, prompt_chars={}, max_new_tokens={}, temp={}, top_p={}",
            self.model,
            prompt.len(),
            params.max_new_tokens,
            params.temperature,
            params.top_p,
        );

        let start = Instant::now();
        let body = GenerateRequest {
            prompt,
            params: *params,
        };
        let text = self.post_json("/v1/generate", &body).await?;

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| GenerationError::Failure(format!("failed to parse response: {e}")))?;
        debug!(
            "generate response: {} tokens in {:.1}s",
            parsed.tokens.len(),
            start.elapsed().as_secs_f64(),
        );
        Ok(parsed.tokens)
    }

    async fn decode(&self, tokens: &[u32]) -> Result<String, GenerationError> {
        let text = self
            .post_json("/v1/detokenize", &DetokenizeRequest { tokens })
            .await?;
        let parsed: DetokenizeResponse = serde_json::from_str(&text)
            .map_err(|e| GenerationError::Failure(format!("failed to parse response: {e}")))?;
        Ok(parsed.text)
    }

    async fn reclaim(&self, scope: ReclaimScope) {
        trace!("reclaim request: scope={}", scope.as_str());
        let body = ReclaimRequest {
            scope: scope.as_str(),
        };
        // Best-effort by contract. A daemon that cannot reclaim right now is
        // not a failure the caller can act on.
        if let Err(e) = self.post_json("/v1/reclaim", &body).await {
            debug!("reclaim ignored a daemon error: {e}");
        }
    }

    async fn device_memory(&self) -> Option<MemorySnapshot> {
        let resp = match self.client.get(self.endpoint("/v1/memory")).send().await {
            Ok(resp) => resp,
            Err(e) => {
                debug!("memory probe failed: {e}");
                return None;
            }
        };
        if !resp.status().is_success() {
            debug!("memory probe returned HTTP {}", resp.status());
            return None;
        }
        let parsed: MemoryResponse = match resp.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("memory probe returned an unreadable body: {e}");
                return None;
            }
        };
        if !parsed.available {
            return None;
        }
        Some(MemorySnapshot::new(
            parsed.allocated_gb.unwrap_or(0.0),
            parsed.reserved_gb.unwrap_or(0.0),
            parsed.total_gb.unwrap_or(0.0),
        ))
    }
}
