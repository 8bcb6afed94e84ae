//! Canned responses for empty generations.
//!
//! Small models occasionally emit nothing but special tokens, which decodes
//! to an empty string. Rather than show the user a blank reply, the session
//! substitutes the first matching rule from an ordered table. Order matters
//! and the table ends in a catch-all, so every message gets something.

/// Canned reply for greeting-flavored messages.
pub const GREETING_RESPONSE: &str =
    "Hello! I'm an AI assistant, nice to meet you. How can I help you today?";

/// Canned reply for calculation-flavored messages.
pub const MATH_RESPONSE: &str =
    "I can help you with calculations. Please tell me the specific equation.";

/// Canned reply when nothing else matches.
pub const GENERIC_RESPONSE: &str =
    "I understand your question. Is there anything else I can help you with?";

/// What a rule matches on. Substring checks against the lowercased message;
/// "hi" inside a longer word counts as a hit.
#[derive(Debug, Clone, Copy)]
pub enum Predicate {
    /// Any of these needles appears in the message.
    KeywordAny(&'static [&'static str]),
    /// Always matches.
    CatchAll,
}

impl Predicate {
    pub fn matches(&self, message: &str) -> bool {
        match self {
            Predicate::KeywordAny(needles) => {
                let lower = message.to_lowercase();
                needles.iter().any(|needle| lower.contains(needle))
            }
            Predicate::CatchAll => true,
        }
    }
}

/// One fallback rule: a predicate and the reply it selects.
#[derive(Debug, Clone, Copy)]
pub struct FallbackRule {
    pub predicate: Predicate,
    pub response: &'static str,
}

/// The rule table, checked in order. First match wins.
pub const FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        predicate: Predicate::KeywordAny(&["hello", "hi"]),
        response: GREETING_RESPONSE,
    },
    FallbackRule {
        predicate: Predicate::KeywordAny(&["calculate", "math", "=", "+"]),
        response: MATH_RESPONSE,
    },
    FallbackRule {
        predicate: Predicate::CatchAll,
        response: GENERIC_RESPONSE,
    },
];

/// The canned reply for `message`, per the first matching rule.
pub fn fallback_response(message: &str) -> &'static str {
    FALLBACK_RULES
        .iter()
        .find(|rule| rule.predicate.matches(message))
        .map(|rule| rule.response)
        .unwrap_or(GENERIC_RESPONSE)
}
