//! History bounding: the storage cap and the prompt window.
//!
//! Two independent limits guard two different budgets. The storage cap
//! bounds how many turns a caller keeps at all (a sliding window, oldest
//! dropped first, never an error). The prompt window bounds how many of the
//! surviving turns are serialized into the next prompt. Both are pure slice
//! operations; nothing here allocates or mutates.

use tracing::debug;

use crate::ChatTurn;

/// Default number of turns a caller keeps.
pub const DEFAULT_MAX_HISTORY_LEN: usize = 10;

/// Default number of kept turns serialized into a prompt.
pub const DEFAULT_PROMPT_WINDOW: usize = 5;

/// The two history limits, bundled for configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryLimits {
    /// Storage cap: turns beyond this are dropped oldest-first.
    pub max_len: usize,
    /// Prompt cap: at most this many of the kept turns reach the model.
    pub prompt_window: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_HISTORY_LEN,
            prompt_window: DEFAULT_PROMPT_WINDOW,
        }
    }
}

impl HistoryLimits {
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn with_prompt_window(mut self, prompt_window: usize) -> Self {
        self.prompt_window = prompt_window;
        self
    }
}

/// Apply the storage cap: the newest `max_len` turns, order preserved.
///
/// Histories at or under the cap come back unchanged. Dropping old turns is
/// normal operation, logged at debug, never an error.
pub fn trim(history: &[ChatTurn], max_len: usize) -> &[ChatTurn] {
    if history.len() > max_len {
        let dropped = history.len() - max_len;
        debug!("history trim: dropped {dropped} oldest turns, kept {max_len}");
        &history[dropped..]
    } else {
        history
    }
}

/// The newest `window` turns of an already-trimmed history.
///
/// Callers pass the output of [`trim`], so the window can never resurrect a
/// turn the storage cap dropped.
pub fn prompt_window(history: &[ChatTurn], window: usize) -> &[ChatTurn] {
    if history.len() > window {
        &history[history.len() - window..]
    } else {
        history
    }
}
