//! Non-fatal diagnostics accumulated across ingestion and evaluation.
//!
//! Fatal conditions (duplicate symbols, artifact mismatches) abort the
//! analysis through error returns. Everything else, such as an unparsable
//! stack-usage line or a record left incomplete by a broken artifact, lands
//! here so the caller can decide whether a partial report is acceptable.

use serde::{Deserialize, Serialize};

/// One recoverable problem encountered while building or evaluating records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Where the problem was seen, e.g. `src/main.su:4` or a function identity.
    pub origin: String,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    pub fn new(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self { origin: origin.into(), message: message.into() }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.origin, self.message)
    }
}
