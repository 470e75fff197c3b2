//! Pre-oracle guard rules.
//!
//! A deliberately small fast path that runs before the oracle call:
//! - blank or content-free input (no word characters) short-circuits to a
//!   canned prompt, saving an oracle round-trip that could only fail;
//! - overlong input is truncated before it reaches the oracle.
//!
//! Classification itself is entirely the oracle's job — no keyword
//! heuristics here.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum characters forwarded to the oracle per message.
pub const MAX_ORACLE_INPUT_CHARS: usize = 1500;

/// Canned reply for input with nothing to classify.
pub const EMPTY_INPUT_REPLY: &str =
    "Hello! Please describe the issue you would like to report, including where it is happening.";

static HAS_WORD_CHAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w").expect("static regex"));

/// Guard rules evaluated before every oracle call.
#[derive(Debug, Default)]
pub struct GuardRules;

impl GuardRules {
    pub fn new() -> Self {
        Self
    }

    /// Returns a canned reply if the input should never reach the oracle.
    pub fn short_circuit(&self, text: &str) -> Option<&'static str> {
        if !HAS_WORD_CHAR.is_match(text) {
            tracing::debug!("Guard rules short-circuited content-free input");
            return Some(EMPTY_INPUT_REPLY);
        }
        None
    }

    /// Trim and bound the input before the oracle call.
    pub fn prepare(&self, text: &str) -> String {
        text.trim().chars().take(MAX_ORACLE_INPUT_CHARS).collect()
    }
}
