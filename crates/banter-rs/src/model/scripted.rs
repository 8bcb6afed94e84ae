//! Deterministic scripted runtime for tests and dry runs.
//!
//! Outcomes are scripted up front and replayed in order; an exhausted script
//! falls back to a fixed acknowledgement so long test loops never starve.
//! Tokens are just the response's bytes, which keeps
//! [`decode`](crate::model::ModelRuntime::decode) an exact inverse of
//! generation without a tokenizer in sight.
//!
//! The runtime also records what the session sent it (last prompt, last
//! sampling parameters) and counts reclaim calls per scope, which is what
//! the session-cycle tests key on.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::model::{GenerationError, ModelRuntime, ReclaimScope};
use crate::monitor::MemorySnapshot;
use crate::{PromptMessage, SamplingParams};

/// Response the scripted runtime gives once its script is exhausted.
pub const SCRIPT_EXHAUSTED_RESPONSE: &str = "scripted-ok";

/// One scripted generation outcome.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Generate this text.
    Text(String),
    /// Fail with resource exhaustion.
    Oom(String),
    /// Fail with a generic runtime fault.
    Fail(String),
    /// Fail as if no model were serving.
    Unavailable(String),
}

impl ScriptStep {
    pub fn text(content: impl Into<String>) -> Self {
        ScriptStep::Text(content.into())
    }

    pub fn oom(message: impl Into<String>) -> Self {
        ScriptStep::Oom(message.into())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        ScriptStep::Fail(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        ScriptStep::Unavailable(message.into())
    }
}

/// A [`ModelRuntime`] that replays scripted outcomes.
#[derive(Debug, Default)]
pub struct ScriptedRuntime {
    script: Mutex<VecDeque<ScriptStep>>,
    memory: Mutex<Option<MemorySnapshot>>,
    last_prompt: Mutex<Option<String>>,
    last_params: Mutex<Option<SamplingParams>>,
    cache_reclaims: AtomicUsize,
    full_reclaims: AtomicUsize,
}

impl ScriptedRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<ScriptStep>) -> Self {
        Self {
            script: Mutex::new(VecDeque::from(steps)),
            ..Self::default()
        }
    }

    /// Report this snapshot from [`device_memory`](ModelRuntime::device_memory).
    pub fn with_memory(self, snapshot: MemorySnapshot) -> Self {
        *self.memory.lock().unwrap() = Some(snapshot);
        self
    }

    pub fn push_step(&self, step: ScriptStep) {
        self.script.lock().unwrap().push_back(step);
    }

    /// Replace the reported memory snapshot mid-test.
    pub fn set_memory(&self, snapshot: Option<MemorySnapshot>) {
        *self.memory.lock().unwrap() = snapshot;
    }

    /// The prompt string from the most recent generation call.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }

    /// The sampling parameters from the most recent generation call.
    pub fn last_params(&self) -> Option<SamplingParams> {
        *self.last_params.lock().unwrap()
    }

    /// How many cache-scope reclaims have been requested.
    pub fn cache_reclaims(&self) -> usize {
        self.cache_reclaims.load(Ordering::SeqCst)
    }

    /// How many full-scope reclaims have been requested.
    pub fn full_reclaims(&self) -> usize {
        self.full_reclaims.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Option<ScriptStep> {
        self.script.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl ModelRuntime for ScriptedRuntime {
    fn name(&self) -> &str {
        "scripted"
    }

    fn apply_chat_template(&self, messages: &[PromptMessage], direct_answer: bool) -> String {
        let mut prompt = String::new();
        for msg in messages {
            prompt.push_str(&format!("{}: {}\n", msg.role, msg.content));
        }
        prompt.push_str("assistant:");
        if direct_answer {
            prompt.push_str(" (direct)");
        }
        prompt
    }

    async fn encode_and_generate(
        &self,
        prompt: &str,
        params: &SamplingParams,
    ) -> Result<Vec<u32>, GenerationError> {
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        *self.last_params.lock().unwrap() = Some(*params);

        let text = match self.next_step() {
            None => SCRIPT_EXHAUSTED_RESPONSE.to_string(),
            Some(ScriptStep::Text(text)) => text,
            Some(ScriptStep::Oom(msg)) => return Err(GenerationError::ResourceExhaustion(msg)),
            Some(ScriptStep::Fail(msg)) => return Err(GenerationError::Failure(msg)),
            Some(ScriptStep::Unavailable(msg)) => return Err(GenerationError::Unavailable(msg)),
        };
        Ok(text.bytes().map(u32::from).collect())
    }

    async fn decode(&self, tokens: &[u32]) -> Result<String, GenerationError> {
        let bytes: Vec<u8> = tokens.iter().map(|&t| t as u8).collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn reclaim(&self, scope: ReclaimScope) {
        match scope {
            ReclaimScope::Cache => self.cache_reclaims.fetch_add(1, Ordering::SeqCst),
            ReclaimScope::Full => self.full_reclaims.fetch_add(1, Ordering::SeqCst),
        };
    }

    async fn device_memory(&self) -> Option<MemorySnapshot> {
        *self.memory.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_text_round_trips_through_the_byte_codec() {
        let runtime = ScriptedRuntime::from_steps(vec![ScriptStep::text("Paris.")]);
        let params = crate::GenerationOptions::default().clamp(128, 1024);
        let tokens = runtime.encode_and_generate("prompt", &params).await.unwrap();
        let text = runtime.decode(&tokens).await.unwrap();
        assert_eq!(text, "Paris.");
    }

    #[tokio::test]
    async fn exhausted_script_falls_back_instead_of_failing() {
        let runtime = ScriptedRuntime::new();
        let params = crate::GenerationOptions::default().clamp(128, 1024);
        let tokens = runtime.encode_and_generate("prompt", &params).await.unwrap();
        assert_eq!(
            runtime.decode(&tokens).await.unwrap(),
            SCRIPT_EXHAUSTED_RESPONSE
        );
    }

    #[tokio::test]
    async fn scripted_failures_carry_their_kind() {
        let runtime = ScriptedRuntime::from_steps(vec![
            ScriptStep::oom("allocation failed"),
            ScriptStep::fail("daemon crashed"),
            ScriptStep::unavailable("not loaded"),
        ]);
        let params = crate::GenerationOptions::default().clamp(128, 1024);

        let err = runtime.encode_and_generate("p", &params).await.unwrap_err();
        assert!(matches!(err, GenerationError::ResourceExhaustion(_)));
        let err = runtime.encode_and_generate("p", &params).await.unwrap_err();
        assert!(matches!(err, GenerationError::Failure(_)));
        let err = runtime.encode_and_generate("p", &params).await.unwrap_err();
        assert!(matches!(err, GenerationError::Unavailable(_)));
    }

    #[tokio::test]
    async fn reclaim_counts_split_by_scope() {
        let runtime = ScriptedRuntime::new();
        runtime.reclaim(ReclaimScope::Cache).await;
        runtime.reclaim(ReclaimScope::Cache).await;
        runtime.reclaim(ReclaimScope::Full).await;
        assert_eq!(runtime.cache_reclaims(), 2);
        assert_eq!(runtime.full_reclaims(), 1);
    }

    #[tokio::test]
    async fn memory_snapshot_is_configurable() {
        let runtime = ScriptedRuntime::new();
        assert!(runtime.device_memory().await.is_none());

        runtime.set_memory(Some(MemorySnapshot::new(1.0, 2.0, 8.0)));
        let snap = runtime.device_memory().await.unwrap();
        assert_eq!(snap.total_gb, 8.0);
    }

    #[test]
    fn template_joins_roles_and_marks_direct_mode() {
        let runtime = ScriptedRuntime::new();
        let messages = vec![
            PromptMessage::user("q1"),
            PromptMessage::assistant("a1"),
        ];
        let prompt = runtime.apply_chat_template(&messages, true);
        assert!(prompt.contains("user: q1\n"));
        assert!(prompt.contains("assistant: a1\n"));
        assert!(prompt.ends_with("assistant: (direct)"));
    }
}
