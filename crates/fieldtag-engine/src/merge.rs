//! Run merging: collapse adjacent runs into semantic tokens.
//!
//! Word processors split a single logical value (a VIN, a date, a
//! reference number) across several runs whenever formatting changes
//! mid-token, and sometimes for no visible reason. Treating each run as
//! a candidate on its own breaks detection; joining everything in a
//! paragraph destroys label/value separation. The merger walks each
//! paragraph greedily left to right and decides per join point whether
//! to extend the open token or close it.
//!
//! The decision logic is an ordered table of named rules evaluated in a
//! fixed sequence; the first rule that fires wins. The ordering is
//! load-bearing: pattern continuation sits above the capital-letter
//! split, so a value split mid-pattern survives even when the next
//! fragment happens to start with a capital.

use fieldtag_core::{Run, Token, Vocabulary};
use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

/// Outcome of a single join-point decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinDecision {
    /// The candidate run continues the open token.
    Extend,
    /// Close the open token; the candidate starts a new one.
    Split,
}

/// One named merge rule. Returns `None` when the rule does not apply,
/// letting evaluation fall through to the next rule.
struct MergeRule {
    name: &'static str,
    decide: fn(current: &str, candidate: &str, vocab: &Vocabulary) -> Option<JoinDecision>,
}

// Prefix shapes of the recognized value formats. A join is forced when
// the combined text still looks like an unfinished VIN/MRN/date/
// container/reference, whatever formatting boundary split it.
static PARTIAL_MRN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}|\d{2}[A-Z]{1,2}|\d{2}[A-Z]{2}[A-Z0-9]{1,14})$").unwrap()
});
static PARTIAL_VIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-HJ-NPR-Z0-9]{6,17}$").unwrap());
static PARTIAL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,4}[-./]\d{0,2}([-./]\d{0,4})?$").unwrap());
static PARTIAL_CONTAINER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{4}\d{1,7}$").unwrap());
static PARTIAL_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{2,}([-/][A-Z0-9]*)+$").unwrap());

/// Numbered form-field caption, e.g. "8 Recipient".
static NUMBERED_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\s+[A-Z][a-z]").unwrap());

fn matches_partial_pattern(combined: &str) -> bool {
    if PARTIAL_MRN.is_match(combined)
        || PARTIAL_DATE.is_match(combined)
        || PARTIAL_CONTAINER.is_match(combined)
        || PARTIAL_REFERENCE.is_match(combined)
    {
        return true;
    }
    // The VIN alphabet alone matches too many ordinary words; require a
    // digit/letter mix before treating it as a split code.
    PARTIAL_VIN.is_match(combined)
        && combined.chars().any(|c| c.is_ascii_digit())
        && combined.chars().any(|c| c.is_ascii_alphabetic())
}

fn is_homogeneous_code(text: &str) -> bool {
    !text.is_empty()
        && (text.chars().all(|c| c.is_ascii_digit())
            || text.chars().all(|c| c.is_ascii_uppercase()))
}

/// The merge rule table, in precedence order.
static MERGE_RULES: &[MergeRule] = &[
    // Labels are always their own token: never extend past a closed
    // label, and never glue an incoming label onto a value. A bare ":"
    // candidate is exempt: that is a colon split off its own label
    // text, which the short-fragment rule below re-attaches.
    MergeRule {
        name: "label-terminator",
        decide: |current, candidate, _vocab| {
            if current.trim_end().ends_with(':') {
                return Some(JoinDecision::Split);
            }
            let c = candidate.trim();
            (c.ends_with(':') && c.len() > 1).then_some(JoinDecision::Split)
        },
    },
    // Combined text still matches a recognized partial shape: the value
    // was split mid-token, keep gluing.
    MergeRule {
        name: "pattern-continuation",
        decide: |current, candidate, _vocab| {
            let combined = format!("{}{}", current.trim(), candidate.trim());
            matches_partial_pattern(&combined).then_some(JoinDecision::Extend)
        },
    },
    // Fragments of four characters or fewer are almost never complete
    // tokens on their own.
    MergeRule {
        name: "short-fragment",
        decide: |current, candidate, _vocab| {
            (current.trim().chars().count() <= 4 || candidate.trim().chars().count() <= 4)
                .then_some(JoinDecision::Extend)
        },
    },
    // Hyphen or slash at the join point: dates, compound codes.
    MergeRule {
        name: "separator-join",
        decide: |current, candidate, _vocab| {
            (current.trim_end().ends_with(['-', '/']) || candidate.trim_start().starts_with(['-', '/']))
                .then_some(JoinDecision::Extend)
        },
    },
    // Classic split-numeral / split-code case: both sides digit-only or
    // uppercase-letter-only.
    MergeRule {
        name: "homogeneous-codes",
        decide: |current, candidate, _vocab| {
            (is_homogeneous_code(current.trim()) && is_homogeneous_code(candidate.trim()))
                .then_some(JoinDecision::Extend)
        },
    },
    // A capital letter opening the candidate after a token of useful
    // length usually means a new sentence or a new value.
    MergeRule {
        name: "capital-start",
        decide: |current, candidate, _vocab| {
            let starts_upper = candidate
                .trim_start()
                .chars()
                .next()
                .is_some_and(char::is_uppercase);
            (starts_upper && current.trim().chars().count() > 5).then_some(JoinDecision::Split)
        },
    },
];

/// Decide whether `candidate` extends the open token with accumulated
/// text `current`. Returns the deciding rule's name alongside the
/// decision; the fall-through default is a split.
#[must_use]
pub fn decide_join(current: &str, candidate: &str, vocab: &Vocabulary) -> (&'static str, JoinDecision) {
    for rule in MERGE_RULES {
        if let Some(decision) = (rule.decide)(current, candidate, vocab) {
            return (rule.name, decision);
        }
    }
    ("default", JoinDecision::Split)
}

/// True when `text` reads as a field caption: trailing colon, a known
/// label word (whole text or its last word, case-insensitive), or a
/// numbered form-field like "8 Recipient".
#[must_use]
pub fn is_label_text(text: &str, vocab: &Vocabulary) -> bool {
    let t = text.trim();
    if t.is_empty() {
        return false;
    }
    if t.ends_with(':') {
        return true;
    }
    if vocab.is_label_word(t) {
        return true;
    }
    if t.split_whitespace().last().is_some_and(|w| vocab.is_label_word(w)) {
        return true;
    }
    NUMBERED_LABEL.is_match(t)
}

/// Merge an extracted run sequence into tokens, one greedy pass per
/// paragraph. Tokens never cross paragraph boundaries, and every run
/// lands in exactly one token.
#[must_use]
pub fn merge_runs(runs: &[Run], vocab: &Vocabulary) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start = 0;
    while start < runs.len() {
        let paragraph = runs[start].paragraph_index;
        let mut end = start;
        while end < runs.len() && runs[end].paragraph_index == paragraph {
            end += 1;
        }
        merge_paragraph(&runs[start..end], vocab, &mut tokens);
        start = end;
    }
    tokens
}

fn merge_paragraph(runs: &[Run], vocab: &Vocabulary, out: &mut Vec<Token>) {
    let Some(first) = runs.first() else { return };

    let mut members = vec![first.clone()];
    let mut text = first.text.clone();
    // Most recent label token in this paragraph; value tokens produced
    // after it record it until the next label or end of paragraph.
    let mut last_label: Option<String> = None;

    for run in &runs[1..] {
        let (rule, decision) = decide_join(&text, &run.text, vocab);
        trace!(
            "merge p{}: {rule} -> {decision:?} for {:?} + {:?}",
            run.paragraph_index, text, run.text
        );
        match decision {
            JoinDecision::Extend => {
                text.push_str(&run.text);
                members.push(run.clone());
            }
            JoinDecision::Split => {
                close_token(std::mem::take(&mut text), std::mem::take(&mut members), &mut last_label, vocab, out);
                text = run.text.clone();
                members = vec![run.clone()];
            }
        }
    }
    close_token(text, members, &mut last_label, vocab, out);
}

fn close_token(
    text: String,
    members: Vec<Run>,
    last_label: &mut Option<String>,
    vocab: &Vocabulary,
    out: &mut Vec<Token>,
) {
    let is_label = is_label_text(&text, vocab);
    let token = Token {
        preceding_label: if is_label { None } else { last_label.clone() },
        merged_text: text,
        member_runs: members,
        is_label,
    };
    if is_label {
        *last_label = Some(token.merged_text.trim().to_string());
    }
    out.push(token);
}
