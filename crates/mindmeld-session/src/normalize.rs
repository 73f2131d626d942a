//! Word normalization and round submissions.
//!
//! Players win a round by typing the *same* word, so "same" has to be
//! pinned down: leading/trailing whitespace is stripped and case is
//! folded before comparison. The raw text is kept alongside — the
//! reveal shows each player exactly what their partner typed.

use serde::{Deserialize, Serialize};

/// Canonicalizes a word for equality comparison.
///
/// Idempotent: `normalize(normalize(w)) == normalize(w)`.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// One slot's submission for the current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// The word exactly as typed, for the reveal.
    pub raw: String,
    /// The canonical form used for matching.
    pub normalized: String,
}

impl Submission {
    /// Builds a submission from raw player input.
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            normalized: normalize(raw),
        }
    }

    /// The deterministic sentinel synthesized when the input deadline
    /// passes with no submission from a slot.
    pub fn placeholder() -> Self {
        Self {
            raw: String::new(),
            normalized: String::new(),
        }
    }

    /// Whether this submission carries no usable word.
    ///
    /// True for the deadline placeholder and for any input that
    /// normalizes to empty — the two are deliberately
    /// indistinguishable.
    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    /// Whether two submissions match.
    ///
    /// Empty submissions never match anything, including each other:
    /// two players timing out must not score a free round.
    pub fn matches(&self, other: &Submission) -> bool {
        !self.is_empty() && self.normalized == other.normalized
    }
}
