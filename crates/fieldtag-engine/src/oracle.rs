//! Boundary contract for the external variable-suggestion oracle.
//!
//! The engine never calls the AI service itself; it defines the batch
//! request/response shapes and defends against a misbehaving oracle.
//! The one hard rule: a response must line up positionally with the
//! request batch. When it does not, the affected positions fall back to
//! the original (untagged) text, never a misaligned array and never a
//! fabricated suggestion.

use fieldtag_core::{Category, Formatting, Result};
use log::warn;
use serde::{Deserialize, Serialize};

/// One token sent to the oracle for naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    /// The merged token text.
    pub text: String,
    /// The preceding label, when one was tracked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Formatting context of the token's first run.
    #[serde(default, skip_serializing_if = "Formatting::is_empty")]
    pub formatting: Formatting,
}

/// One suggested tag, positionally matched to the request batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub tag: String,
    pub category: Category,
}

/// The external suggestion service. Implementations are expected to be
/// remote calls; the engine only sees the batch in/out contract.
pub trait SuggestionOracle {
    /// Suggest one tag name and category per request, same order and
    /// same count as the input.
    fn suggest(&self, requests: &[SuggestionRequest]) -> Result<Vec<Suggestion>>;
}

/// Align an oracle response with its request batch.
///
/// Returns exactly `requests.len()` slots. Extra suggestions are
/// truncated; missing positions become `None`, meaning "keep the
/// original text". A count mismatch is logged as a warning and
/// recovered; it never aborts the batch.
#[must_use]
pub fn align_suggestions(
    requests: &[SuggestionRequest],
    mut suggestions: Vec<Suggestion>,
) -> Vec<Option<Suggestion>> {
    if suggestions.len() != requests.len() {
        warn!(
            "oracle returned {} suggestions for {} requests; unmatched positions fall back to original text",
            suggestions.len(),
            requests.len()
        );
    }
    suggestions.truncate(requests.len());
    let missing = requests.len() - suggestions.len();
    let mut aligned: Vec<Option<Suggestion>> = suggestions.into_iter().map(Some).collect();
    aligned.extend(std::iter::repeat_with(|| None).take(missing));
    aligned
}
