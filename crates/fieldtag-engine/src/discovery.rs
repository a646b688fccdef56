//! Offline constant discovery.
//!
//! A value that recurs identically across many documents is boilerplate,
//! not a variable, and belongs on the constant exclusion list. This is
//! a batch tool run over a corpus, explicitly not part of the
//! per-document tagging path, which receives the resulting list as
//! immutable configuration.

use fieldtag_core::Token;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Thresholds for promoting a value to constant.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryConfig {
    /// Fraction of documents a value must appear in (default 0.30).
    pub min_doc_fraction: f64,
    /// Absolute document count that promotes regardless of fraction
    /// (default 3).
    pub min_docs: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            min_doc_fraction: 0.30,
            min_docs: 3,
        }
    }
}

/// Normalize a value for cross-document comparison: trim and collapse
/// internal whitespace.
#[must_use]
pub fn normalize_value(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Count each normalized token value once per document and promote the
/// ones that clear either threshold. Single-character values and pure
/// punctuation never qualify.
#[must_use]
pub fn discover_constants(documents: &[Vec<Token>], config: DiscoveryConfig) -> BTreeSet<String> {
    let total = documents.len();
    if total == 0 {
        return BTreeSet::new();
    }

    let mut doc_counts: HashMap<String, usize> = HashMap::new();
    for tokens in documents {
        let distinct: HashSet<String> = tokens
            .iter()
            .filter(|t| !t.is_label)
            .map(|t| normalize_value(&t.merged_text))
            .filter(|v| v.chars().count() > 1 && v.chars().any(char::is_alphanumeric))
            .collect();
        for value in distinct {
            *doc_counts.entry(value).or_insert(0) += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    doc_counts
        .into_iter()
        .filter(|(_, count)| {
            *count >= config.min_docs || (*count as f64 / total as f64) >= config.min_doc_fraction
        })
        .map(|(value, _)| value)
        .collect()
}
