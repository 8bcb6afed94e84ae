//! The session controller: one request/response cycle at a time.
//!
//! [`ChatSession`] wraps a single model handle and turns each user message
//! into a bounded generation: history is trimmed and windowed, generation
//! parameters are clamped, device memory is reclaimed on a schedule and
//! under pressure, and every failure is converted into a response string.
//! The caller owns the conversation history; the session only borrows it.
//!
//! Sharing a session between concurrent callers goes through
//! [`worker::SessionWorker`], which owns the session on a dedicated task and
//! serializes access through a command channel.

pub mod fallback;
pub mod worker;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::history::{self, HistoryLimits};
use crate::model::{GenerationError, ModelRuntime, ReclaimScope};
use crate::monitor::{self, MemorySnapshot};
use crate::{ChatTurn, GenerationOptions, MAX_INPUT_TOKENS, MAX_NEW_TOKENS_CAP, PromptMessage};

/// Prefix on responses produced from a non-recoverable generation failure.
/// Downstream tooling keys on this marker when counting errors.
pub const ERROR_PREFIX: &str = "ERROR:";

/// Leading phrase of the resource-exhaustion diagnostic.
pub const MEMORY_SHORTAGE_NOTICE: &str = "Out of device memory.";

/// Scheduled reclaim cadence, in turns.
pub const DEFAULT_CLEANUP_INTERVAL: u64 = 5;

// ── Configuration ──────────────────────────────────────────────────

/// Knobs for the session cycle. `Default` gives the production values.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Storage cap and prompt window for the caller's history.
    pub limits: HistoryLimits,
    /// Input-side token cap handed to the runtime.
    pub max_input_tokens: u32,
    /// Hard cap on generated tokens, regardless of caller input.
    pub max_new_tokens_cap: u32,
    /// Reclaim the cache every this many turns; 0 disables the schedule.
    pub cleanup_interval: u64,
    /// Usage percentage above which a reactive reclaim runs.
    pub pressure_threshold: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            limits: HistoryLimits::default(),
            max_input_tokens: MAX_INPUT_TOKENS,
            max_new_tokens_cap: MAX_NEW_TOKENS_CAP,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            pressure_threshold: monitor::DEFAULT_PRESSURE_THRESHOLD,
        }
    }
}

impl SessionConfig {
    pub fn with_max_history_len(mut self, max_len: usize) -> Self {
        self.limits = self.limits.with_max_len(max_len);
        self
    }

    pub fn with_prompt_window(mut self, window: usize) -> Self {
        self.limits = self.limits.with_prompt_window(window);
        self
    }

    pub fn with_max_input_tokens(mut self, tokens: u32) -> Self {
        self.max_input_tokens = tokens;
        self
    }

    pub fn with_max_new_tokens_cap(mut self, cap: u32) -> Self {
        self.max_new_tokens_cap = cap;
        self
    }

    pub fn with_cleanup_interval(mut self, turns: u64) -> Self {
        self.cleanup_interval = turns;
        self
    }

    pub fn with_pressure_threshold(mut self, percent: f64) -> Self {
        self.pressure_threshold = percent;
        self
    }
}

// ── Session ────────────────────────────────────────────────────────

/// A conversation-serving session around one model handle.
///
/// Exactly one generation runs at a time: `generate` takes `&mut self`, and
/// multi-caller setups put the session behind a
/// [`SessionWorker`](worker::SessionWorker) instead of cloning it.
///
/// # Example
///
/// ```ignore
/// let runtime = Arc::new(RemoteRuntime::new(DEFAULT_DAEMON_URL, "qwen3-0.6b")?);
/// let mut session = ChatSession::new(runtime, SessionConfig::default());
///
/// let mut history = Vec::new();
/// let reply = session
///     .generate("hello", &history, &GenerationOptions::default())
///     .await;
/// history.push(ChatTurn::new("hello", &reply));
/// ```
pub struct ChatSession {
    runtime: Arc<dyn ModelRuntime>,
    config: SessionConfig,
    turn_count: u64,
}

impl ChatSession {
    pub fn new(runtime: Arc<dyn ModelRuntime>, config: SessionConfig) -> Self {
        Self {
            runtime,
            config,
            turn_count: 0,
        }
    }

    /// Identifier of the model behind this session.
    pub fn model_name(&self) -> &str {
        self.runtime.name()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Turns served since creation or the last [`reset`](Self::reset).
    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }

    /// Current device memory, straight from the runtime.
    pub async fn device_memory(&self) -> Option<MemorySnapshot> {
        self.runtime.device_memory().await
    }

    /// Serve one user message against the caller's history.
    ///
    /// Never fails: resource exhaustion comes back as an actionable
    /// diagnostic, any other failure as an [`ERROR_PREFIX`]-marked string.
    /// The caller appends `(message, response)` to its history afterwards;
    /// this method does not mutate the history it borrows.
    pub async fn generate(
        &mut self,
        message: &str,
        history: &[ChatTurn],
        options: &GenerationOptions,
    ) -> String {
        self.turn_count += 1;
        debug!(
            "turn {}: {} chars in, {} turns of history",
            self.turn_count,
            message.len(),
            history.len(),
        );

        // Scheduled reclaim, independent of how the device is doing.
        if self.config.cleanup_interval > 0 && self.turn_count % self.config.cleanup_interval == 0
        {
            debug!("turn {}: scheduled cache reclaim", self.turn_count);
            self.runtime.reclaim(ReclaimScope::Cache).await;
        }

        // Reactive reclaim when the device is running hot. A second reclaim
        // in the same cycle is harmless.
        if let Some(snap) = self.runtime.device_memory().await
            && monitor::pressure_exceeded(&snap, self.config.pressure_threshold)
        {
            warn!("memory pressure, reclaiming: {}", snap.to_log_string());
            self.runtime.reclaim(ReclaimScope::Cache).await;
        }

        let response = self.run_cycle(message, history, options).await;

        // Transient buffers from the cycle are gone by now; hand the cache
        // back before the next caller.
        self.runtime.reclaim(ReclaimScope::Cache).await;
        response
    }

    /// Prompt building, generation, and post-processing for one message.
    async fn run_cycle(
        &self,
        message: &str,
        history: &[ChatTurn],
        options: &GenerationOptions,
    ) -> String {
        let kept = history::trim(history, self.config.limits.max_len);
        let windowed = history::prompt_window(kept, self.config.limits.prompt_window);

        let mut messages = Vec::with_capacity(windowed.len() * 2 + 1);
        for turn in windowed {
            messages.push(PromptMessage::user(turn.user.clone()));
            messages.push(PromptMessage::assistant(turn.assistant.clone()));
        }
        messages.push(PromptMessage::user(message));

        let prompt = self.runtime.apply_chat_template(&messages, true);
        let params = options.clamp(self.config.max_new_tokens_cap, self.config.max_input_tokens);

        let tokens = match self.runtime.encode_and_generate(&prompt, &params).await {
            Ok(tokens) => tokens,
            Err(e) => return self.recover(e).await,
        };
        let text = match self.runtime.decode(&tokens).await {
            Ok(text) => text,
            Err(e) => return self.recover(e).await,
        };

        let text = text.trim();
        if text.is_empty() {
            debug!("empty generation, substituting a canned response");
            fallback::fallback_response(message).to_string()
        } else {
            text.to_string()
        }
    }

    /// Convert a generation failure into a response string. The failed call
    /// is never retried.
    async fn recover(&self, error: GenerationError) -> String {
        match error {
            GenerationError::ResourceExhaustion(msg) => {
                warn!("resource exhaustion during generation: {msg}");
                self.runtime.reclaim(ReclaimScope::Full).await;
                let snapshot = self.runtime.device_memory().await;
                oom_response(snapshot.as_ref())
            }
            other => {
                warn!("generation failed: {other}");
                format!("{ERROR_PREFIX} {other}")
            }
        }
    }

    /// Clear the turn counter and force a reclaim. Idempotent. Caller-held
    /// history is the caller's to clear.
    pub async fn reset(&mut self) {
        info!("session reset after {} turns", self.turn_count);
        self.turn_count = 0;
        self.runtime.reclaim(ReclaimScope::Cache).await;
    }
}

/// The user-facing resource-exhaustion diagnostic: what happened, what to do
/// about it, and how full the device is when that can still be measured.
fn oom_response(snapshot: Option<&MemorySnapshot>) -> String {
    let mut msg = format!(
        "{MEMORY_SHORTAGE_NOTICE} Try lowering the token budget to 64-128, clearing the conversation, or restarting the server.",
    );
    if let Some(snap) = snapshot {
        msg.push_str(&format!(
            " Current device usage: {:.1}%.",
            snap.usage_percent
        ));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::scripted::{ScriptStep, ScriptedRuntime};

    fn make_session(steps: Vec<ScriptStep>) -> (Arc<ScriptedRuntime>, ChatSession) {
        let runtime = Arc::new(ScriptedRuntime::from_steps(steps));
        let session = ChatSession::new(runtime.clone(), SessionConfig::default());
        (runtime, session)
    }

    fn make_history(len: usize) -> Vec<ChatTurn> {
        (0..len)
            .map(|i| ChatTurn::new(format!("question {i}"), format!("answer {i}")))
            .collect()
    }

    #[tokio::test]
    async fn returns_the_generated_text_trimmed() {
        let (_, mut session) = make_session(vec![ScriptStep::text("  The answer is 4.  \n")]);
        let reply = session
            .generate("what is 2 plus 2", &[], &GenerationOptions::default())
            .await;
        assert_eq!(reply, "The answer is 4.");
    }

    #[tokio::test]
    async fn empty_generation_falls_back_by_message_content() {
        let (_, mut session) = make_session(vec![
            ScriptStep::text(""),
            ScriptStep::text("   \n"),
        ]);
        let reply = session
            .generate("Hello there", &[], &GenerationOptions::default())
            .await;
        assert_eq!(reply, fallback::GREETING_RESPONSE);

        let reply = session
            .generate("tell me about rust", &[], &GenerationOptions::default())
            .await;
        assert_eq!(reply, fallback::GENERIC_RESPONSE);
    }

    #[tokio::test]
    async fn generation_failures_become_error_strings() {
        let (_, mut session) = make_session(vec![
            ScriptStep::fail("daemon returned HTTP 500"),
            ScriptStep::unavailable("no model loaded"),
        ]);

        let reply = session.generate("hi", &[], &GenerationOptions::default()).await;
        assert!(reply.starts_with(ERROR_PREFIX));
        assert!(reply.contains("daemon returned HTTP 500"));

        let reply = session.generate("hi", &[], &GenerationOptions::default()).await;
        assert!(reply.starts_with(ERROR_PREFIX));
        assert!(reply.contains("model unavailable"));
    }

    #[tokio::test]
    async fn resource_exhaustion_reclaims_fully_and_reports_usage() {
        let (runtime, mut session) = make_session(vec![ScriptStep::oom("allocation failed")]);
        runtime.set_memory(Some(MemorySnapshot::new(0.5, 9.32, 10.0)));

        let reply = session
            .generate("long question", &[], &GenerationOptions::default())
            .await;

        assert!(reply.contains(MEMORY_SHORTAGE_NOTICE));
        assert!(reply.contains("93.2%"));
        assert!(!reply.contains(ERROR_PREFIX));
        assert_eq!(runtime.full_reclaims(), 1);
    }

    #[tokio::test]
    async fn resource_exhaustion_without_a_snapshot_omits_the_percentage() {
        let (runtime, mut session) = make_session(vec![ScriptStep::oom("allocation failed")]);
        let reply = session
            .generate("question", &[], &GenerationOptions::default())
            .await;
        assert!(reply.contains(MEMORY_SHORTAGE_NOTICE));
        assert!(!reply.contains('%'));
        assert_eq!(runtime.full_reclaims(), 1);
    }

    #[tokio::test]
    async fn every_call_ends_with_a_cache_reclaim() {
        let (runtime, mut session) = make_session(vec![]);
        session.generate("one", &[], &GenerationOptions::default()).await;
        assert_eq!(runtime.cache_reclaims(), 1);
    }

    #[tokio::test]
    async fn scheduled_reclaim_fires_every_fifth_turn() {
        let (runtime, mut session) = make_session(vec![]);
        for _ in 0..4 {
            session.generate("q", &[], &GenerationOptions::default()).await;
        }
        // Four final reclaims, no scheduled one yet.
        assert_eq!(runtime.cache_reclaims(), 4);

        session.generate("q", &[], &GenerationOptions::default()).await;
        // Turn five adds the scheduled reclaim on top of its final one.
        assert_eq!(runtime.cache_reclaims(), 6);

        for _ in 0..5 {
            session.generate("q", &[], &GenerationOptions::default()).await;
        }
        assert_eq!(runtime.cache_reclaims(), 12);
    }

    #[tokio::test]
    async fn zero_interval_disables_the_schedule() {
        let runtime = Arc::new(ScriptedRuntime::new());
        let config = SessionConfig::default().with_cleanup_interval(0);
        let mut session = ChatSession::new(runtime.clone(), config);
        for _ in 0..6 {
            session.generate("q", &[], &GenerationOptions::default()).await;
        }
        // Only the per-call final reclaims.
        assert_eq!(runtime.cache_reclaims(), 6);
    }

    #[tokio::test]
    async fn pressure_above_threshold_triggers_an_extra_reclaim() {
        let (runtime, mut session) = make_session(vec![]);
        runtime.set_memory(Some(MemorySnapshot::new(0.0, 9.0, 10.0)));
        session.generate("q", &[], &GenerationOptions::default()).await;
        assert_eq!(runtime.cache_reclaims(), 2);

        runtime.set_memory(Some(MemorySnapshot::new(0.0, 4.0, 10.0)));
        session.generate("q", &[], &GenerationOptions::default()).await;
        assert_eq!(runtime.cache_reclaims(), 3);
    }

    #[tokio::test]
    async fn options_are_clamped_before_reaching_the_runtime() {
        let (runtime, mut session) = make_session(vec![]);
        let options = GenerationOptions::new(4096, 9.9, 0.5);
        session.generate("q", &[], &options).await;

        let params = runtime.last_params().unwrap();
        assert_eq!(params.max_new_tokens, 128);
        assert_eq!(params.temperature, 1.5);
        assert_eq!(params.top_p, 0.5);
        assert_eq!(params.truncate_input, 1024);
        assert!(!params.use_cache);
    }

    #[tokio::test]
    async fn prompt_carries_only_the_windowed_history() {
        let (runtime, mut session) = make_session(vec![]);
        let history = make_history(14);
        session
            .generate("What now?", &history, &GenerationOptions::default())
            .await;

        let prompt = runtime.last_prompt().unwrap();
        // Storage cap keeps 4..13, the window keeps 9..13.
        assert!(prompt.contains("user: question 9"));
        assert!(prompt.contains("assistant: answer 13"));
        assert!(!prompt.contains("question 8"));
        assert!(prompt.contains("user: What now?"));
        assert!(prompt.ends_with("assistant: (direct)"));
    }

    #[tokio::test]
    async fn never_fails_on_odd_input() {
        let (_, mut session) = make_session(vec![]);
        let huge_history = make_history(500);

        let reply = session.generate("", &[], &GenerationOptions::default()).await;
        assert!(!reply.is_empty());

        let reply = session
            .generate("こんにちは 🦀", &huge_history, &GenerationOptions::default())
            .await;
        assert!(!reply.is_empty());
    }

    #[tokio::test]
    async fn reset_clears_the_counter_and_is_idempotent() {
        let (runtime, mut session) = make_session(vec![]);
        for _ in 0..3 {
            session.generate("q", &[], &GenerationOptions::default()).await;
        }
        assert_eq!(session.turn_count(), 3);

        session.reset().await;
        assert_eq!(session.turn_count(), 0);
        let after_first_reset = runtime.cache_reclaims();

        session.reset().await;
        assert_eq!(session.turn_count(), 0);
        assert_eq!(runtime.cache_reclaims(), after_first_reset + 1);

        session.generate("q", &[], &GenerationOptions::default()).await;
        assert_eq!(session.turn_count(), 1);
    }
}
