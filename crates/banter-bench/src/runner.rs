//! Drives fixed prompt sets through a chat session and records what comes
//! back: the response text, a wall-clock timing, and whether the call
//! produced model output or an error string.
//!
//! The runner is an ordinary session caller. It owns its conversation
//! history, which keeps growing across the single-turn categories (so the
//! session's trimming and windowing get exercised under a long
//! conversation) and restarts from empty for each scripted scenario.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use banter_rs::prelude::*;
use chrono::Local;
use clap::ValueEnum;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::info;

use crate::datasets::{self, KnowledgeQuestion};

/// Token budget requested per benchmark answer. The session clamps this
/// down to its own hard cap.
pub const BENCH_MAX_TOKENS: u32 = 256;

/// Pause between calls, giving the device idle time between generations.
pub const CALL_DELAY: Duration = Duration::from_millis(500);

// Sample sizes for a full run. Pools smaller than their sample size are
// used whole.
const TRUTHFUL_SAMPLES: usize = 50;
const LAW_SAMPLES: usize = 50;
const REASONING_SAMPLES: usize = 30;
const MULTI_TURN_SESSIONS: usize = 5;
const ADVERSARIAL_SAMPLES: usize = 10;

// ── Categories ─────────────────────────────────────────────────────

/// A benchmark category, selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Category {
    /// Open factual questions that invite popular misconceptions.
    Truthful,
    /// Law knowledge, multiple-choice and open.
    Law,
    /// Basic science reasoning, multiple-choice and open.
    Reasoning,
    /// Scripted conversations that depend on earlier turns.
    Multiturn,
    /// Instruction-override and jailbreak attempts.
    Adversarial,
}

impl Category {
    /// Key this category's records are stored under in the report.
    pub fn storage_key(self) -> &'static str {
        match self {
            Category::Truthful => "truthfulqa",
            Category::Law => "mmlu_law",
            Category::Reasoning => "arc_easy",
            Category::Multiturn => "multi_turn",
            Category::Adversarial => "adversarial",
        }
    }
}

// ── Records ────────────────────────────────────────────────────────

/// One open-question exchange.
#[derive(Debug, Clone, Serialize)]
pub struct OpenRecord {
    pub question: String,
    pub response: String,
    pub response_time: f64,
    pub category: String,
}

/// One knowledge-question exchange. Multiple-choice questions carry their
/// lettered options and the expected letter for later scoring.
#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeRecord {
    pub question: String,
    pub formatted_question: String,
    pub response: String,
    pub response_time: f64,
    pub choices: Vec<String>,
    pub correct_answer: Option<String>,
    pub category: String,
}

/// One adversarial-prompt exchange.
#[derive(Debug, Clone, Serialize)]
pub struct PromptRecord {
    pub prompt: String,
    pub response: String,
    pub response_time: f64,
    pub category: String,
}

/// One scripted multi-turn session.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRecord {
    pub scenario: String,
    pub turns: Vec<TurnRecord>,
}

/// One turn within a scripted session.
#[derive(Debug, Clone, Serialize)]
pub struct TurnRecord {
    pub turn: usize,
    pub question: String,
    pub response: String,
    pub response_time: f64,
}

/// The records of one category. Serializes as a bare list, so the report
/// file keeps per-category shapes rather than one lowest-common-denominator
/// record type.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CategoryResults {
    Open(Vec<OpenRecord>),
    Knowledge(Vec<KnowledgeRecord>),
    Prompts(Vec<PromptRecord>),
    Sessions(Vec<ScenarioRecord>),
}

impl CategoryResults {
    /// Recorded interactions; scripted sessions count each turn.
    pub fn interaction_count(&self) -> usize {
        match self {
            CategoryResults::Open(items) => items.len(),
            CategoryResults::Knowledge(items) => items.len(),
            CategoryResults::Prompts(items) => items.len(),
            CategoryResults::Sessions(sessions) => {
                sessions.iter().map(|s| s.turns.len()).sum()
            }
        }
    }

    /// How many responses carry the failure marker instead of model output.
    pub fn error_count(&self) -> usize {
        self.responses().filter(|r| is_error_text(r)).count()
    }

    /// Timings of completed calls. Failed calls record zero and are left
    /// out, so averages only cover real generations.
    pub fn completed_times(&self) -> Vec<f64> {
        let times: Vec<f64> = match self {
            CategoryResults::Open(items) => {
                items.iter().map(|i| i.response_time).collect()
            }
            CategoryResults::Knowledge(items) => {
                items.iter().map(|i| i.response_time).collect()
            }
            CategoryResults::Prompts(items) => {
                items.iter().map(|i| i.response_time).collect()
            }
            CategoryResults::Sessions(sessions) => sessions
                .iter()
                .flat_map(|s| &s.turns)
                .map(|t| t.response_time)
                .collect(),
        };
        times.into_iter().filter(|t| *t > 0.0).collect()
    }

    fn responses(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            CategoryResults::Open(items) => {
                Box::new(items.iter().map(|i| i.response.as_str()))
            }
            CategoryResults::Knowledge(items) => {
                Box::new(items.iter().map(|i| i.response.as_str()))
            }
            CategoryResults::Prompts(items) => {
                Box::new(items.iter().map(|i| i.response.as_str()))
            }
            CategoryResults::Sessions(sessions) => Box::new(
                sessions
                    .iter()
                    .flat_map(|s| &s.turns)
                    .map(|t| t.response.as_str()),
            ),
        }
    }
}

/// Raw results of one benchmark run.
#[derive(Debug, Clone, Serialize)]
pub struct RunResults {
    pub timestamp: String,
    pub model: String,
    pub tests: BTreeMap<String, CategoryResults>,
}

/// Whether a recorded response is the session's failure marker rather than
/// model output.
pub fn is_error_text(response: &str) -> bool {
    response.contains(ERROR_PREFIX)
}

// ── Runner ─────────────────────────────────────────────────────────

/// Runs benchmark categories against one [`ChatSession`].
pub struct BenchmarkRunner {
    session: ChatSession,
    conversation: Vec<ChatTurn>,
    results: RunResults,
    delay: Duration,
}

impl BenchmarkRunner {
    pub fn new(session: ChatSession) -> Self {
        let model = session.model_name().to_string();
        Self {
            session,
            conversation: Vec::new(),
            results: RunResults {
                timestamp: Local::now().to_rfc3339(),
                model,
                tests: BTreeMap::new(),
            },
            delay: CALL_DELAY,
        }
    }

    /// Replace the pause between calls. Tests shorten it to zero.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Run one category with its full-suite sample size.
    pub async fn run_category(&mut self, category: Category) {
        match category {
            Category::Truthful => self.run_truthful(TRUTHFUL_SAMPLES).await,
            Category::Law => self.run_law(LAW_SAMPLES).await,
            Category::Reasoning => self.run_reasoning(REASONING_SAMPLES).await,
            Category::Multiturn => self.run_multi_turn(MULTI_TURN_SESSIONS).await,
            Category::Adversarial => self.run_adversarial(ADVERSARIAL_SAMPLES).await,
        }
    }

    /// Run every category, in the order the report lists them.
    pub async fn run_all(&mut self) {
        self.run_truthful(TRUTHFUL_SAMPLES).await;
        self.run_law(LAW_SAMPLES).await;
        self.run_reasoning(REASONING_SAMPLES).await;
        self.run_multi_turn(MULTI_TURN_SESSIONS).await;
        self.run_adversarial(ADVERSARIAL_SAMPLES).await;
    }

    /// Open factual questions probing hallucination resistance.
    pub async fn run_truthful(&mut self, count: usize) {
        let selected = sample(datasets::TRUTHFULQA_QUESTIONS, count);
        info!("truthfulqa: {} questions", selected.len());

        let mut records = Vec::with_capacity(selected.len());
        for (i, question) in selected.iter().enumerate() {
            info!("truthfulqa {}/{}: {question}", i + 1, selected.len());
            let (response, response_time) = self.chat(question).await;
            records.push(OpenRecord {
                question: (*question).to_string(),
                response,
                response_time,
                category: "truthfulness".to_string(),
            });
            tokio::time::sleep(self.delay).await;
        }
        self.store(Category::Truthful, CategoryResults::Open(records));
    }

    /// Bar-exam style law questions.
    pub async fn run_law(&mut self, count: usize) {
        let selected = sample(datasets::MMLU_LAW_QUESTIONS, count);
        info!("mmlu_law: {} questions", selected.len());
        let records = self.ask_knowledge(&selected, "law_knowledge").await;
        self.store(Category::Law, CategoryResults::Knowledge(records));
    }

    /// Grade-school science questions.
    pub async fn run_reasoning(&mut self, count: usize) {
        let selected = sample(datasets::ARC_EASY_QUESTIONS, count);
        info!("arc_easy: {} questions", selected.len());
        let records = self.ask_knowledge(&selected, "basic_reasoning").await;
        self.store(Category::Reasoning, CategoryResults::Knowledge(records));
    }

    /// Scripted conversations, each from a fresh history.
    pub async fn run_multi_turn(&mut self, session_count: usize) {
        let selected = sample(datasets::CONVERSATION_SCENARIOS, session_count);
        info!("multi_turn: {} scripted sessions", selected.len());

        let mut records = Vec::with_capacity(selected.len());
        for scenario in &selected {
            info!("multi_turn scenario: {}", scenario.name);
            // Each scenario stands on its own conversation.
            self.conversation.clear();

            let mut turns = Vec::with_capacity(scenario.turns.len());
            for (i, question) in scenario.turns.iter().enumerate() {
                let (response, response_time) = self.chat(question).await;
                turns.push(TurnRecord {
                    turn: i + 1,
                    question: (*question).to_string(),
                    response,
                    response_time,
                });
                tokio::time::sleep(self.delay).await;
            }
            records.push(ScenarioRecord {
                scenario: scenario.name.to_string(),
                turns,
            });
        }
        self.store(Category::Multiturn, CategoryResults::Sessions(records));
    }

    /// Instruction-override prompts.
    pub async fn run_adversarial(&mut self, count: usize) {
        let selected = sample(datasets::ADVERSARIAL_PROMPTS, count);
        info!("adversarial: {} prompts", selected.len());

        let mut records = Vec::with_capacity(selected.len());
        for (i, prompt) in selected.iter().enumerate() {
            info!("adversarial {}/{}: {prompt}", i + 1, selected.len());
            let (response, response_time) = self.chat(prompt).await;
            records.push(PromptRecord {
                prompt: (*prompt).to_string(),
                response,
                response_time,
                category: "adversarial".to_string(),
            });
            tokio::time::sleep(self.delay).await;
        }
        self.store(Category::Adversarial, CategoryResults::Prompts(records));
    }

    /// Total recorded interactions across everything run so far.
    pub fn total_interactions(&self) -> usize {
        self.results
            .tests
            .values()
            .map(CategoryResults::interaction_count)
            .sum()
    }

    /// Finish the run and keep the collected results.
    ///
    /// Zero recorded interactions means the model path never worked; that is
    /// a setup fault, not a statistic worth reporting.
    pub fn finish(self) -> Result<RunResults, String> {
        if self.total_interactions() == 0 {
            return Err(
                "no benchmark interactions were recorded; check that the model daemon is \
                 running and reachable, try a single category first (banter-bench truthful), \
                 and rerun with RUST_LOG=debug for request-level logs"
                    .to_string(),
            );
        }
        Ok(self.results)
    }

    async fn ask_knowledge(
        &mut self,
        questions: &[KnowledgeQuestion],
        category: &str,
    ) -> Vec<KnowledgeRecord> {
        let mut records = Vec::with_capacity(questions.len());
        for (i, item) in questions.iter().enumerate() {
            info!("{category} {}/{}: {}", i + 1, questions.len(), item.question);
            let formatted = format_question(item);
            let (response, response_time) = self.chat(&formatted).await;
            records.push(KnowledgeRecord {
                question: item.question.to_string(),
                formatted_question: formatted,
                response,
                response_time,
                choices: item.choices.iter().map(|c| (*c).to_string()).collect(),
                correct_answer: item.answer.map(str::to_string),
                category: category.to_string(),
            });
            tokio::time::sleep(self.delay).await;
        }
        records
    }

    /// One timed exchange, appended to the runner's conversation. Failed
    /// calls keep a zero timing so averages only cover real output.
    async fn chat(&mut self, message: &str) -> (String, f64) {
        let options = GenerationOptions::default().with_max_tokens(BENCH_MAX_TOKENS);
        let started = Instant::now();
        let response = self
            .session
            .generate(message, &self.conversation, &options)
            .await;
        let elapsed = started.elapsed().as_secs_f64();
        self.conversation.push(ChatTurn::new(message, response.clone()));
        let response_time = if is_error_text(&response) { 0.0 } else { elapsed };
        (response, response_time)
    }

    fn store(&mut self, category: Category, results: CategoryResults) {
        self.results
            .tests
            .insert(category.storage_key().to_string(), results);
    }
}

/// Multiple-choice questions get lettered options and an `Answer:` cue;
/// open questions go through verbatim.
pub fn format_question(item: &KnowledgeQuestion) -> String {
    if item.choices.is_empty() {
        return item.question.to_string();
    }
    let mut text = format!("{}\n\n", item.question);
    for (i, choice) in item.choices.iter().enumerate() {
        let letter = (b'A' + i as u8) as char;
        text.push_str(&format!("{letter}) {choice}\n"));
    }
    text.push_str("\nAnswer:");
    text
}

/// Sample `count` elements without replacement; pools smaller than `count`
/// come back whole.
fn sample<T: Copy>(pool: &[T], count: usize) -> Vec<T> {
    let mut rng = rand::thread_rng();
    pool.choose_multiple(&mut rng, count).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn make_runner(runtime: Arc<ScriptedRuntime>) -> BenchmarkRunner {
        let session = ChatSession::new(runtime, SessionConfig::default());
        BenchmarkRunner::new(session).with_delay(Duration::ZERO)
    }

    #[test]
    fn sampling_caps_at_the_pool_size() {
        let pool = ["a", "b", "c"];
        assert_eq!(sample(&pool, 10).len(), 3);
        assert_eq!(sample(&pool, 2).len(), 2);
        assert!(sample(&pool, 0).is_empty());
    }

    #[test]
    fn multiple_choice_questions_get_lettered_options() {
        let item = KnowledgeQuestion {
            question: "Which way is up?",
            choices: &["north", "south", "away from gravity"],
            answer: Some("C"),
        };
        let text = format_question(&item);
        assert!(text.starts_with("Which way is up?\n\n"));
        assert!(text.contains("A) north\n"));
        assert!(text.contains("C) away from gravity\n"));
        assert!(text.ends_with("\nAnswer:"));
    }

    #[test]
    fn open_questions_pass_through_verbatim() {
        let item = KnowledgeQuestion {
            question: "Why does ice float on water?",
            choices: &[],
            answer: None,
        };
        assert_eq!(format_question(&item), item.question);
    }

    #[tokio::test]
    async fn records_land_under_the_category_key() {
        let mut runner = make_runner(Arc::new(ScriptedRuntime::new()));
        runner.run_truthful(2).await;

        let results = runner.finish().unwrap();
        match results.tests.get("truthfulqa") {
            Some(CategoryResults::Open(items)) => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].category, "truthfulness");
                assert!(items[0].response_time > 0.0);
            }
            other => panic!("unexpected results: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_calls_record_zero_timing() {
        let runtime = Arc::new(ScriptedRuntime::from_steps(vec![
            ScriptStep::fail("daemon gone"),
        ]));
        let mut runner = make_runner(runtime);
        runner.run_adversarial(1).await;

        let results = runner.finish().unwrap();
        let category = &results.tests["adversarial"];
        assert_eq!(category.interaction_count(), 1);
        assert_eq!(category.error_count(), 1);
        assert!(category.completed_times().is_empty());

        match category {
            CategoryResults::Prompts(items) => {
                assert!(items[0].response.contains(ERROR_PREFIX));
                assert_eq!(items[0].response_time, 0.0);
            }
            other => panic!("unexpected results: {other:?}"),
        }
    }

    #[tokio::test]
    async fn conversation_carries_across_single_turn_categories() {
        let runtime = Arc::new(ScriptedRuntime::new());
        let mut runner = make_runner(runtime.clone());
        runner.run_truthful(3).await;
        runner.run_adversarial(1).await;

        // Three prior turns plus the current message in the last prompt.
        let prompt = runtime.last_prompt().unwrap();
        assert_eq!(prompt.matches("user:").count(), 4);
    }

    #[tokio::test]
    async fn each_scenario_starts_from_a_fresh_conversation() {
        let runtime = Arc::new(ScriptedRuntime::new());
        let mut runner = make_runner(runtime.clone());
        runner.run_truthful(4).await;
        runner.run_multi_turn(5).await;

        // The final prompt belongs to some scenario's third turn: two prior
        // turns plus the current message, with nothing from the truthful
        // round or earlier scenarios leaking in.
        let prompt = runtime.last_prompt().unwrap();
        assert_eq!(prompt.matches("user:").count(), 3);

        let results = runner.finish().unwrap();
        match &results.tests["multi_turn"] {
            CategoryResults::Sessions(sessions) => {
                assert_eq!(sessions.len(), 5);
                assert_eq!(results.tests["multi_turn"].interaction_count(), 15);
                for session in sessions {
                    assert_eq!(session.turns.len(), 3);
                    assert_eq!(session.turns[0].turn, 1);
                }
            }
            other => panic!("unexpected results: {other:?}"),
        }
    }

    #[tokio::test]
    async fn benchmark_requests_are_clamped_by_the_session() {
        let runtime = Arc::new(ScriptedRuntime::new());
        let mut runner = make_runner(runtime.clone());
        runner.run_truthful(1).await;

        // 256 requested, clamped down to the session's hard cap.
        let params = runtime.last_params().unwrap();
        assert_eq!(params.max_new_tokens, 128);
    }

    #[tokio::test]
    async fn an_empty_run_is_a_setup_fault() {
        let runner = make_runner(Arc::new(ScriptedRuntime::new()));
        let err = runner.finish().unwrap_err();
        assert!(err.contains("no benchmark interactions"));
    }
}
