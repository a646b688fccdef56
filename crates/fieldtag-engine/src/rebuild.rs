//! Serialize an edited run list back into valid body markup.
//!
//! Inverse path of the extractor, used when the run list (not the raw
//! markup) is the system of record, e.g. after a batch relabeling pass
//! updated run texts in place. Emits one `w:p` per paragraph index and
//! one `w:r` per run; formatting property elements appear only for
//! attributes that are present, never as "false" markers. The result is
//! semantically equivalent, re-parseable markup, not a byte-identical
//! reproduction.

use fieldtag_core::{Formatting, Run};
use quick_xml::escape::escape;
use std::fmt::Write as _;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

fn write_run_properties(out: &mut String, fmt: &Formatting) {
    if fmt.is_empty() {
        return;
    }
    out.push_str("<w:rPr>");
    if let Some(font) = &fmt.font_family {
        let f = escape(font);
        let _ = write!(out, "<w:rFonts w:ascii=\"{f}\" w:hAnsi=\"{f}\"/>");
    }
    // Some(false) should not occur for extractor-produced runs (explicit
    // off is recorded as absent), but an edited list may carry it; emit
    // the explicit off marker rather than silently flipping to on.
    match fmt.bold {
        Some(true) => out.push_str("<w:b/>"),
        Some(false) => out.push_str("<w:b w:val=\"0\"/>"),
        None => {}
    }
    match fmt.italic {
        Some(true) => out.push_str("<w:i/>"),
        Some(false) => out.push_str("<w:i w:val=\"0\"/>"),
        None => {}
    }
    match fmt.underline {
        Some(true) => out.push_str("<w:u w:val=\"single\"/>"),
        Some(false) => out.push_str("<w:u w:val=\"none\"/>"),
        None => {}
    }
    if let Some(color) = &fmt.color_hex {
        let _ = write!(out, "<w:color w:val=\"{}\"/>", escape(color));
    }
    if let Some(sz) = fmt.font_size_half_points {
        let _ = write!(out, "<w:sz w:val=\"{sz}\"/>");
    }
    out.push_str("</w:rPr>");
}

/// Rebuild a complete `w:body` element from an ordered run list.
///
/// Runs are grouped by `paragraph_index` (stable, ascending); index
/// gaps produce empty paragraphs so that re-extraction assigns the
/// same paragraph numbers. Run text is escaped for the five XML
/// metacharacters and emitted with `xml:space="preserve"` so leading
/// and trailing spaces survive the round trip.
#[must_use]
pub fn rebuild_body(runs: &[Run]) -> String {
    let mut out = String::with_capacity(128 + runs.len() * 64);
    let _ = write!(out, "<w:body xmlns:w=\"{W_NS}\">");

    let mut current_paragraph: Option<usize> = None;
    for run in runs {
        match current_paragraph {
            Some(p) if p == run.paragraph_index => {}
            Some(p) => {
                out.push_str("</w:p>");
                // Empty paragraphs for any skipped indexes keep
                // paragraph numbering stable across a round trip.
                for _ in p + 1..run.paragraph_index {
                    out.push_str("<w:p/>");
                }
                out.push_str("<w:p>");
                current_paragraph = Some(run.paragraph_index);
            }
            None => {
                for _ in 0..run.paragraph_index {
                    out.push_str("<w:p/>");
                }
                out.push_str("<w:p>");
                current_paragraph = Some(run.paragraph_index);
            }
        }

        out.push_str("<w:r>");
        write_run_properties(&mut out, &run.formatting);
        let _ = write!(
            out,
            "<w:t xml:space=\"preserve\">{}</w:t>",
            escape(run.text.as_str())
        );
        out.push_str("</w:r>");
    }
    if current_paragraph.is_some() {
        out.push_str("</w:p>");
    }
    out.push_str("</w:body>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_runs;
    use fieldtag_core::{Formatting, Run};

    #[test]
    fn test_rebuild_emits_valid_markup() {
        let runs = vec![Run::new("hello", 0), Run::new("world", 1)];
        let markup = rebuild_body(&runs);
        assert!(roxmltree::Document::parse(&markup).is_ok());
        assert_eq!(markup.matches("<w:p>").count(), 2);
    }

    #[test]
    fn test_absent_formatting_emits_no_rpr() {
        let markup = rebuild_body(&[Run::new("plain", 0)]);
        assert!(!markup.contains("<w:rPr>"));
    }

    #[test]
    fn test_present_formatting_only() {
        let run = Run {
            text: "styled".to_string(),
            formatting: Formatting {
                bold: Some(true),
                font_size_half_points: Some(28),
                ..Formatting::default()
            },
            paragraph_index: 0,
            source_span: None,
        };
        let markup = rebuild_body(&[run]);
        assert!(markup.contains("<w:b/>"));
        assert!(markup.contains("<w:sz w:val=\"28\"/>"));
        // Absent attributes leave no trace, not even a false marker.
        assert!(!markup.contains("<w:i"));
        assert!(!markup.contains("<w:u"));
        assert!(!markup.contains("<w:color"));
    }

    #[test]
    fn test_text_escaped() {
        let markup = rebuild_body(&[Run::new("a < b & \"c\" > 'd'", 0)]);
        assert!(markup.contains("a &lt; b &amp;"));
        assert!(roxmltree::Document::parse(&markup).is_ok());
        let back = extract_runs(&markup).unwrap();
        assert_eq!(back[0].text, "a < b & \"c\" > 'd'");
    }

    #[test]
    fn test_round_trip_preserves_text_formatting_and_paragraphs() {
        let original = format!(
            "<w:body xmlns:w=\"{W_NS}\"><w:p><w:r><w:rPr><w:b/><w:i/></w:rPr>\
             <w:t>VIN: </w:t></w:r><w:r><w:t>WMZ83BR06P3R14626</w:t></w:r></w:p>\
             <w:p/><w:p><w:r><w:rPr><w:rFonts w:ascii=\"Courier\"/><w:color w:val=\"0000FF\"/>\
             </w:rPr><w:t>25NL7PU1EYHFR8FDR4</w:t></w:r></w:p></w:body>"
        );
        let runs = extract_runs(&original).unwrap();
        let rebuilt = rebuild_body(&runs);
        let again = extract_runs(&rebuilt).unwrap();

        assert_eq!(runs.len(), again.len());
        for (a, b) in runs.iter().zip(&again) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.formatting, b.formatting);
            assert_eq!(a.paragraph_index, b.paragraph_index);
        }
    }

    #[test]
    fn test_leading_paragraph_gap_preserved() {
        let runs = vec![Run::new("late start", 2)];
        let rebuilt = rebuild_body(&runs);
        let again = extract_runs(&rebuilt).unwrap();
        assert_eq!(again[0].paragraph_index, 2);
    }

    #[test]
    fn test_trailing_and_leading_spaces_survive() {
        let runs = vec![Run::new("  padded  ", 0)];
        let rebuilt = rebuild_body(&runs);
        let again = extract_runs(&rebuilt).unwrap();
        assert_eq!(again[0].text, "  padded  ");
    }

    #[test]
    fn test_empty_run_list_rebuilds_empty_body() {
        let markup = rebuild_body(&[]);
        assert!(roxmltree::Document::parse(&markup).is_ok());
        assert!(extract_runs(&markup).unwrap().is_empty());
    }
}
