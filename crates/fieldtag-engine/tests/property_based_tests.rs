//! Property-Based Tests
//!
//! Tests using property-based testing (proptest) to verify the engine's
//! structural invariants:
//! - Extractor/Rebuilder round trip preserves text, formatting, order
//! - Merging is deterministic and partitions the run list
//! - Substitution touches exactly one leaf node and never corrupts markup
//!
//! These tests complement unit tests by exploring the input space
//! automatically.

use fieldtag_core::{Formatting, Run, Vocabulary};
use fieldtag_engine::{extract_runs, merge_runs, rebuild_body, substitute_first};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn formatting_strategy() -> impl Strategy<Value = Formatting> {
    (
        prop::option::of(Just(true)),
        prop::option::of(Just(true)),
        prop::option::of(Just(true)),
        prop::option::of(2u32..=96),
        prop::option::of("[A-Za-z][A-Za-z ]{0,10}"),
        prop::option::of("[0-9A-F]{6}"),
    )
        .prop_map(|(bold, italic, underline, size, font, color)| Formatting {
            bold,
            italic,
            underline,
            font_size_half_points: size,
            font_family: font,
            color_hex: color,
        })
}

/// Printable-ASCII run text, non-empty. Includes the XML metacharacters
/// so escaping is exercised.
fn text_strategy() -> impl Strategy<Value = String> {
    "[ -~]{1,24}"
}

fn runs_strategy() -> impl Strategy<Value = Vec<Run>> {
    prop::collection::vec((text_strategy(), formatting_strategy(), 0usize..=2), 1..20).prop_map(
        |items| {
            let mut paragraph = 0;
            items
                .into_iter()
                .map(|(text, formatting, step)| {
                    paragraph += step;
                    Run {
                        text,
                        formatting,
                        paragraph_index: paragraph,
                        source_span: None,
                    }
                })
                .collect()
        },
    )
}

// ============================================================================
// Round-Trip Properties
// ============================================================================

/// Property: Rebuilder output re-parses, and re-extraction yields runs
/// with identical text, formatting, and paragraph index, in order.
#[test]
fn proptest_rebuild_extract_round_trip() {
    proptest!(|(runs in runs_strategy())| {
        let markup = rebuild_body(&runs);
        let back = extract_runs(&markup);
        prop_assert!(back.is_ok(), "rebuilt markup must re-extract");
        let back = back.unwrap();
        prop_assert_eq!(back.len(), runs.len());
        for (a, b) in runs.iter().zip(&back) {
            prop_assert_eq!(&a.text, &b.text);
            prop_assert_eq!(&a.formatting, &b.formatting);
            prop_assert_eq!(a.paragraph_index, b.paragraph_index);
        }
    });
}

/// Property: extraction of rebuilt markup is a fixed point; a second
/// rebuild+extract changes nothing.
#[test]
fn proptest_round_trip_fixed_point() {
    proptest!(|(runs in runs_strategy())| {
        let once = extract_runs(&rebuild_body(&runs)).unwrap();
        let twice = extract_runs(&rebuild_body(&once)).unwrap();
        prop_assert_eq!(once, twice);
    });
}

// ============================================================================
// Merge Properties
// ============================================================================

/// Property: merging is a pure function of its input.
#[test]
fn proptest_merge_deterministic() {
    proptest!(|(runs in runs_strategy())| {
        let vocab = Vocabulary::builtin();
        let a = merge_runs(&runs, &vocab);
        let b = merge_runs(&runs, &vocab);
        prop_assert_eq!(a, b);
    });
}

/// Property: every run lands in exactly one token, order-preserved, and
/// no token crosses a paragraph boundary.
#[test]
fn proptest_merge_partitions_runs() {
    proptest!(|(runs in runs_strategy())| {
        let vocab = Vocabulary::builtin();
        let tokens = merge_runs(&runs, &vocab);

        let flattened: Vec<&Run> = tokens.iter().flat_map(|t| &t.member_runs).collect();
        prop_assert_eq!(flattened.len(), runs.len());
        for (a, b) in flattened.iter().zip(&runs) {
            prop_assert_eq!(*a, b);
        }

        for token in &tokens {
            let p = token.member_runs[0].paragraph_index;
            prop_assert!(token.member_runs.iter().all(|r| r.paragraph_index == p));
            let concat: String = token.member_runs.iter().map(|r| r.text.as_str()).collect();
            prop_assert_eq!(&concat, &token.merged_text);
        }
    });
}

// ============================================================================
// Substitution Properties
// ============================================================================

/// Property: with the needle planted in two different leaf nodes, the
/// first is replaced and everything after it is byte-identical.
#[test]
fn proptest_substitution_first_match_only() {
    proptest!(|(prefix in "[a-z ]{0,12}", suffix in "[a-z ]{0,12}")| {
        let needle = "NEEDLE9X";
        let markup = format!(
            "<w:body xmlns:w=\"ns\"><w:p><w:r><w:t>{prefix}{needle}</w:t></w:r></w:p>\
             <w:p><w:r><w:t>{needle}{suffix}</w:t></w:r></w:p></w:body>"
        );
        let out = substitute_first(&markup, needle, "{{tag}}").unwrap();
        prop_assert_eq!(out.matches("{{tag}}").count(), 1);
        prop_assert_eq!(out.matches(needle).count(), 1);
        // The second paragraph is untouched byte-for-byte.
        let tail = format!("<w:p><w:r><w:t>{needle}{suffix}</w:t></w:r></w:p></w:body>");
        prop_assert!(out.ends_with(&tail));
        // And the result still parses.
        prop_assert!(roxmltree::Document::parse(&out).is_ok());
    });
}

/// Property: substituting absent text fails and is reported as such, for
/// any document built from random runs.
#[test]
fn proptest_substitution_no_op_on_absence() {
    proptest!(|(runs in runs_strategy())| {
        let markup = rebuild_body(&runs);
        // The marker cannot appear: run texts are printable ASCII and
        // the marker uses characters outside the generated set.
        let result = substitute_first(&markup, "\u{2603}ABSENT\u{2603}", "{{tag}}");
        prop_assert!(matches!(result, Err(fieldtag_core::FieldtagError::TextNotFound(_))));
    });
}
