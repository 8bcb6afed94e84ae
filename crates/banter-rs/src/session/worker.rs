//! Serialized session access for concurrent callers.
//!
//! A [`ChatSession`] holds the only handle to the model, so exactly one
//! generation may run at a time. [`SessionWorker::spawn`] moves the session
//! onto a dedicated task that owns it together with the server-side
//! conversation; callers talk to it through a cloneable [`SessionHandle`]
//! whose commands queue on a bounded channel. Two browsers submitting at
//! once therefore wait their turn instead of racing the model.
//!
//! The worker is also the session's *caller* in the history contract: it
//! owns the conversation `Vec`, appends each completed turn, and applies the
//! long-conversation guard before a message ever reaches the session.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::monitor::MemorySnapshot;
use crate::session::ChatSession;
use crate::{ChatTurn, GenerationOptions};

/// Conversation length past which the worker stops generating and answers
/// with a notice instead.
pub const DISPLAY_WARNING_THRESHOLD: usize = 15;

/// The notice appended (and returned) once the guard trips.
pub const HISTORY_WARNING_NOTICE: &str =
    "The conversation history is getting long. Clear the conversation to keep responses fast and memory bounded.";

/// Pseudo-user label on guard notice turns.
pub const NOTICE_LABEL: &str = "system notice";

/// Queued commands before senders start waiting.
const COMMAND_BUFFER: usize = 32;

// ── Protocol ───────────────────────────────────────────────────────

/// What callers can ask the worker to do.
enum SessionCommand {
    Generate {
        message: String,
        options: GenerationOptions,
        reply: oneshot::Sender<ChatReply>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    Memory {
        reply: oneshot::Sender<Option<MemorySnapshot>>,
    },
    History {
        reply: oneshot::Sender<Vec<ChatTurn>>,
    },
}

/// Outcome of a generate command: the response plus the conversation as it
/// stands after the append.
#[derive(Clone, Debug)]
pub struct ChatReply {
    pub response: String,
    pub history: Vec<ChatTurn>,
}

// ── Handle ─────────────────────────────────────────────────────────

/// Cloneable front door to the worker task.
///
/// Every method queues a command and waits for the worker's reply. `Err`
/// means the worker is gone (its task ended), which callers surface as a
/// service-level failure.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Serve one message against the worker's conversation.
    pub async fn generate(
        &self,
        message: impl Into<String>,
        options: GenerationOptions,
    ) -> Result<ChatReply, String> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Generate {
            message: message.into(),
            options,
            reply,
        })
        .await?;
        rx.await.map_err(|_| "session worker is gone".to_string())
    }

    /// Clear the conversation and reset the session.
    pub async fn reset(&self) -> Result<(), String> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Reset { reply }).await?;
        rx.await.map_err(|_| "session worker is gone".to_string())
    }

    /// Current device memory, as the session sees it.
    pub async fn memory(&self) -> Result<Option<MemorySnapshot>, String> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Memory { reply }).await?;
        rx.await.map_err(|_| "session worker is gone".to_string())
    }

    /// The conversation as it stands.
    pub async fn history(&self) -> Result<Vec<ChatTurn>, String> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::History { reply }).await?;
        rx.await.map_err(|_| "session worker is gone".to_string())
    }

    async fn send(&self, command: SessionCommand) -> Result<(), String> {
        self.tx
            .send(command)
            .await
            .map_err(|_| "session worker is gone".to_string())
    }
}

// ── Worker ─────────────────────────────────────────────────────────

/// Spawns the task that owns a [`ChatSession`] and its conversation.
pub struct SessionWorker;

impl SessionWorker {
    /// Move `session` onto a new task and return the handle to it.
    ///
    /// The task runs until every handle is dropped.
    pub fn spawn(session: ChatSession) -> SessionHandle {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(run_worker(session, rx));
        SessionHandle { tx }
    }
}

async fn run_worker(mut session: ChatSession, mut rx: mpsc::Receiver<SessionCommand>) {
    let mut conversation: Vec<ChatTurn> = Vec::new();

    while let Some(command) = rx.recv().await {
        match command {
            SessionCommand::Generate {
                message,
                options,
                reply,
            } => {
                let response = if conversation.len() > DISPLAY_WARNING_THRESHOLD {
                    warn!(
                        "conversation at {} turns, answering with the clear-history notice",
                        conversation.len()
                    );
                    conversation.push(ChatTurn::new(NOTICE_LABEL, HISTORY_WARNING_NOTICE));
                    HISTORY_WARNING_NOTICE.to_string()
                } else {
                    let response = session.generate(&message, &conversation, &options).await;
                    conversation.push(ChatTurn::new(message, response.clone()));
                    response
                };
                let _ = reply.send(ChatReply {
                    response,
                    history: conversation.clone(),
                });
            }
            SessionCommand::Reset { reply } => {
                conversation.clear();
                session.reset().await;
                let _ = reply.send(());
            }
            SessionCommand::Memory { reply } => {
                let _ = reply.send(session.device_memory().await);
            }
            SessionCommand::History { reply } => {
                let _ = reply.send(conversation.clone());
            }
        }
    }
    debug!("session worker stopping: all handles dropped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::scripted::{ScriptStep, ScriptedRuntime};
    use crate::session::SessionConfig;
    use std::sync::Arc;

    fn spawn_worker(steps: Vec<ScriptStep>) -> (Arc<ScriptedRuntime>, SessionHandle) {
        let runtime = Arc::new(ScriptedRuntime::from_steps(steps));
        let session = ChatSession::new(runtime.clone(), SessionConfig::default());
        (runtime, SessionWorker::spawn(session))
    }

    #[tokio::test]
    async fn generate_appends_the_turn_and_returns_it() {
        let (_, handle) = spawn_worker(vec![ScriptStep::text("Four.")]);
        let reply = handle
            .generate("What is 2 plus 2?", GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(reply.response, "Four.");
        assert_eq!(reply.history.len(), 1);
        assert_eq!(reply.history[0].user, "What is 2 plus 2?");
        assert_eq!(reply.history[0].assistant, "Four.");
    }

    #[tokio::test]
    async fn later_turns_see_earlier_ones_in_the_prompt() {
        let (runtime, handle) = spawn_worker(vec![
            ScriptStep::text("first answer"),
            ScriptStep::text("second answer"),
        ]);
        handle
            .generate("first question", GenerationOptions::default())
            .await
            .unwrap();
        handle
            .generate("second question", GenerationOptions::default())
            .await
            .unwrap();

        let prompt = runtime.last_prompt().unwrap();
        assert!(prompt.contains("user: first question"));
        assert!(prompt.contains("assistant: first answer"));
        assert!(prompt.contains("user: second question"));
    }

    #[tokio::test]
    async fn long_conversations_get_the_notice_without_generating() {
        let (runtime, handle) = spawn_worker(vec![]);
        for i in 0..16 {
            handle
                .generate(format!("q{i}"), GenerationOptions::default())
                .await
                .unwrap();
        }
        let prompt_before_guard = runtime.last_prompt();

        let reply = handle
            .generate("one more", GenerationOptions::default())
            .await
            .unwrap();

        assert_eq!(reply.response, HISTORY_WARNING_NOTICE);
        assert_eq!(reply.history.len(), 17);
        assert_eq!(reply.history[16].user, NOTICE_LABEL);
        // The guarded call never reached the model.
        assert_eq!(runtime.last_prompt(), prompt_before_guard);
    }

    #[tokio::test]
    async fn reset_clears_the_conversation() {
        let (_, handle) = spawn_worker(vec![]);
        handle
            .generate("hello", GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(handle.history().await.unwrap().len(), 1);

        handle.reset().await.unwrap();
        assert!(handle.history().await.unwrap().is_empty());

        let reply = handle
            .generate("fresh start", GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(reply.history.len(), 1);
    }

    #[tokio::test]
    async fn memory_passes_through_the_runtime_snapshot() {
        let (runtime, handle) = spawn_worker(vec![]);
        assert!(handle.memory().await.unwrap().is_none());

        runtime.set_memory(Some(crate::monitor::MemorySnapshot::new(1.0, 2.0, 8.0)));
        let snap = handle.memory().await.unwrap().unwrap();
        assert_eq!(snap.total_gb, 8.0);
    }

    #[tokio::test]
    async fn concurrent_callers_are_serialized_not_raced() {
        let (_, handle) = spawn_worker(vec![]);
        let (a, b) = tokio::join!(
            handle.generate("from caller a", GenerationOptions::default()),
            handle.generate("from caller b", GenerationOptions::default()),
        );
        a.unwrap();
        b.unwrap();
        assert_eq!(handle.history().await.unwrap().len(), 2);
    }
}
