//! Per-document tagging pipeline: extract → merge → classify →
//! substitute, applied serially against one document's markup.
//!
//! Substitutions shift byte offsets, so they are applied one at a time,
//! each against the markup produced by the previous one. Two ways a
//! placeholder lands in the document:
//!
//! - **Substitution**: the value sits inside a single text node, so the
//!   safe substitution engine splices the tag in place and every other
//!   byte survives verbatim.
//! - **Spanning substitution**: the value was merged across several
//!   runs and no single leaf node contains it. The placeholder is
//!   spliced into the node where the match starts and the matched
//!   remainder is removed from the following nodes. Markup the run
//!   model does not capture (tables, paragraph and section properties,
//!   bookmarks) survives byte-for-byte on both paths.
//!
//! Re-running the pipeline over its own output is a no-op: tagged text
//! is never a classification candidate, and the substitution engine
//! rejects re-tagging.

use crate::classify::{classify_token, TagAllocator};
use crate::extract::extract_runs;
use crate::merge::merge_runs;
use crate::oracle::{align_suggestions, SuggestionOracle, SuggestionRequest};
use crate::rebuild::rebuild_body;
use crate::substitute::{substitute_first, substitute_spanning_first};
use fieldtag_core::{contains_tag, Field, FieldtagError, Result, Run, Token, Vocabulary};
use log::{debug, warn};

/// How a field's placeholder ended up in the output markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedVia {
    /// In-place splice within a single text-bearing leaf node.
    Substitution,
    /// Splice spanning the leaf nodes of a token merged from several
    /// runs.
    SpanningSubstitution,
}

/// A tagging operation that was skipped, with the reason it failed.
/// Recoverable by design: other operations proceed.
#[derive(Debug, Clone)]
pub struct SkippedOperation {
    pub tag: String,
    pub search_text: String,
    pub reason: String,
}

/// Result of a full tagging pass over one document.
#[derive(Debug)]
pub struct TaggingOutcome {
    /// The markup with placeholders applied.
    pub markup: String,
    /// Applied fields in document order, each with its application path.
    pub fields: Vec<(Field, AppliedVia)>,
    /// Operations that could not be applied.
    pub skipped: Vec<SkippedOperation>,
}

/// Result of an oracle-driven batch relabeling pass.
#[derive(Debug)]
pub struct RelabelOutcome {
    /// The edited run list (member runs of accepted tokens collapsed
    /// into single placeholder runs). Source spans are cleared on every
    /// run: the pre-edit spans would point into the old markup.
    pub runs: Vec<Run>,
    /// Body markup rebuilt from the edited run list.
    pub markup: String,
    pub fields: Vec<Field>,
    /// Set when the oracle response needed truncation or padding.
    /// Recoverable; unmatched positions kept their original text.
    pub mismatch: Option<FieldtagError>,
}

/// The tagging engine: pure, synchronous, single-document. Vocabularies
/// are injected at construction and never mutated.
#[derive(Debug, Clone, Default)]
pub struct TaggingEngine {
    vocab: Vocabulary,
}

impl TaggingEngine {
    #[must_use]
    pub fn new(vocab: Vocabulary) -> Self {
        Self { vocab }
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Extract and merge, without classifying. Useful for inspection
    /// tooling and for building oracle request batches.
    pub fn tokenize(&self, markup: &str) -> Result<Vec<Token>> {
        let runs = extract_runs(markup)?;
        Ok(merge_runs(&runs, &self.vocab))
    }

    /// Run the full deterministic tagging pass over one document.
    ///
    /// Fails only on a malformed document; per-field failures are
    /// reported in [`TaggingOutcome::skipped`].
    pub fn tag_document(&self, markup: &str) -> Result<TaggingOutcome> {
        let tokens = self.tokenize(markup)?;

        let mut alloc = TagAllocator::new();
        let mut candidates: Vec<(Field, usize)> = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            if let Some(field) = classify_token(token, &self.vocab, &mut alloc) {
                candidates.push((field, i));
            }
        }

        let mut current = markup.to_string();
        let mut fields = Vec::new();
        let mut skipped = Vec::new();

        for (field, token_index) in candidates {
            // A value merged across several runs has no single leaf node
            // containing it; the spanning splice places the tag without
            // touching any byte outside the matched text.
            let spanning = tokens[token_index].member_runs.len() > 1;
            let result = if spanning {
                substitute_spanning_first(&current, &field.original_value, &field.placeholder())
            } else {
                substitute_first(&current, &field.original_value, &field.placeholder())
            };
            match result {
                Ok(updated) => {
                    debug!("substituted {{{{{}}}}} for {:?}", field.tag, field.original_value);
                    current = updated;
                    let via = if spanning {
                        AppliedVia::SpanningSubstitution
                    } else {
                        AppliedVia::Substitution
                    };
                    fields.push((field, via));
                }
                Err(e @ (FieldtagError::TextNotFound(_) | FieldtagError::AlreadyTagged(_))) => {
                    warn!("skipping {}: {e}", field.tag);
                    skipped.push(SkippedOperation {
                        tag: field.tag,
                        search_text: field.original_value,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(TaggingOutcome {
            markup: current,
            fields,
            skipped,
        })
    }

    /// Oracle-driven batch relabeling: send every untagged value token
    /// to the suggestion oracle, apply the aligned answers to the run
    /// list, and rebuild the body. Positions the oracle failed to cover
    /// keep their original text.
    pub fn relabel_runs(
        &self,
        runs: &[Run],
        oracle: &dyn SuggestionOracle,
    ) -> Result<RelabelOutcome> {
        let tokens = merge_runs(runs, &self.vocab);
        let candidate_indexes: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| self.is_oracle_candidate(t))
            .map(|(i, _)| i)
            .collect();

        let requests: Vec<SuggestionRequest> = candidate_indexes
            .iter()
            .map(|&i| {
                let t = &tokens[i];
                SuggestionRequest {
                    text: t.merged_text.trim().to_string(),
                    label: t.preceding_label.clone(),
                    formatting: t
                        .member_runs
                        .first()
                        .map(|r| r.formatting.clone())
                        .unwrap_or_default(),
                }
            })
            .collect();

        let suggestions = oracle.suggest(&requests)?;
        let mismatch = (suggestions.len() != requests.len()).then(|| {
            FieldtagError::OracleCountMismatch {
                expected: requests.len(),
                got: suggestions.len(),
            }
        });
        let aligned = align_suggestions(&requests, suggestions);

        let mut assignments: Vec<Option<Field>> = vec![None; tokens.len()];
        let mut alloc = TagAllocator::new();
        for (&token_index, suggestion) in candidate_indexes.iter().zip(aligned) {
            if let Some(s) = suggestion {
                let token = &tokens[token_index];
                assignments[token_index] = Some(Field {
                    tag: alloc.allocate(&s.tag),
                    category: s.category,
                    original_value: token.merged_text.trim().to_string(),
                    formatting: token
                        .member_runs
                        .first()
                        .map(|r| r.formatting.clone())
                        .unwrap_or_default(),
                    paragraph_index: token.paragraph_index(),
                    label: token.preceding_label.clone(),
                });
            }
        }

        let mut edited = Vec::new();
        let mut fields = Vec::new();
        for (token, assignment) in tokens.into_iter().zip(assignments) {
            match assignment {
                Some(field) => {
                    let first = token.member_runs.first().expect("tokens are non-empty");
                    edited.push(Run {
                        text: token
                            .merged_text
                            .replacen(&field.original_value, &field.placeholder(), 1),
                        formatting: first.formatting.clone(),
                        paragraph_index: first.paragraph_index,
                        source_span: None,
                    });
                    fields.push(field);
                }
                None => edited.extend(token.member_runs.into_iter().map(|mut run| {
                    run.source_span = None;
                    run
                })),
            }
        }

        let markup = rebuild_body(&edited);
        Ok(RelabelOutcome { runs: edited, markup, fields, mismatch })
    }

    /// Which tokens are worth an oracle round trip: value tokens that
    /// are not labels, not constants, not already tagged, and either
    /// carry a digit or sit under a label.
    fn is_oracle_candidate(&self, token: &Token) -> bool {
        let text = token.merged_text.trim();
        !token.is_label
            && !text.is_empty()
            && !contains_tag(text)
            && !self.vocab.is_constant(text)
            && (text.chars().any(|c| c.is_ascii_digit()) || token.preceding_label.is_some())
    }
}
