//! Run extraction from WordprocessingML body markup.
//!
//! Walks `w:p` paragraphs in document order, then `w:r` runs inside
//! each paragraph, concatenating every `w:t` child of a run (a run may
//! carry more than one text node). Entity decoding is done by the XML
//! parser; formatting attributes default to absent, never `false`.
//!
//! Every run records the raw-byte span of its text content in the
//! original markup. The substitution engine depends on those spans
//! being in document order.

use fieldtag_core::{FieldtagError, Formatting, Result, Run, SourceSpan};

/// Look up an attribute by local name, ignoring the namespace prefix.
/// WordprocessingML attributes are namespaced (`w:val`), so a plain
/// `node.attribute("val")` would miss them.
fn attr_local<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|a| a.name() == name)
        .map(|a| a.value())
}

/// True when a toggle property element is explicitly switched off
/// (`w:val="0"` or `w:val="false"`).
fn val_off(node: roxmltree::Node<'_, '_>) -> bool {
    matches!(attr_local(node, "val"), Some("0") | Some("false"))
}

/// Parse a `w:rPr` element into a [`Formatting`] snapshot.
///
/// Unspecified attributes stay `None`; an explicitly-off toggle is
/// also recorded as absent so that rebuild never emits a false marker.
fn parse_run_properties(rpr: roxmltree::Node<'_, '_>) -> Formatting {
    let mut fmt = Formatting::default();
    for child in rpr.children().filter(roxmltree::Node::is_element) {
        match child.tag_name().name() {
            "b" => {
                if !val_off(child) {
                    fmt.bold = Some(true);
                }
            }
            "i" => {
                if !val_off(child) {
                    fmt.italic = Some(true);
                }
            }
            "u" => {
                if !matches!(attr_local(child, "val"), Some("none") | Some("0") | Some("false")) {
                    fmt.underline = Some(true);
                }
            }
            "sz" => {
                fmt.font_size_half_points = attr_local(child, "val").and_then(|v| v.parse().ok());
            }
            "rFonts" => {
                fmt.font_family = attr_local(child, "ascii").map(str::to_string);
            }
            "color" => {
                fmt.color_hex = attr_local(child, "val")
                    .filter(|v| !v.eq_ignore_ascii_case("auto"))
                    .map(str::to_string);
            }
            _ => {}
        }
    }
    fmt
}

/// Extract the ordered run list from body markup.
///
/// Input is the raw `document.xml` string (or any fragment containing a
/// `w:body` element). Runs whose concatenated text is empty are
/// dropped. Fails fast with [`FieldtagError::MalformedDocument`] when
/// the markup does not parse or contains no body element; there is no
/// partial-extraction mode.
pub fn extract_runs(markup: &str) -> Result<Vec<Run>> {
    let doc = roxmltree::Document::parse(markup)
        .map_err(|e| FieldtagError::MalformedDocument(e.to_string()))?;

    let body = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "body")
        .ok_or_else(|| FieldtagError::MalformedDocument("no body element".to_string()))?;

    let mut runs = Vec::new();
    for (paragraph_index, paragraph) in body
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "p")
        .enumerate()
    {
        for run_node in paragraph
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "r")
        {
            let mut text = String::new();
            let mut span: Option<SourceSpan> = None;
            let mut formatting = Formatting::default();

            for child in run_node.children().filter(roxmltree::Node::is_element) {
                match child.tag_name().name() {
                    "rPr" => formatting = parse_run_properties(child),
                    "t" => {
                        // The text node's range covers the raw
                        // (entity-encoded) content bytes.
                        if let Some(text_node) = child.first_child() {
                            if let Some(t) = text_node.text() {
                                text.push_str(t);
                                let r = text_node.range();
                                span = Some(match span {
                                    None => SourceSpan { start: r.start, end: r.end },
                                    Some(s) => SourceSpan { start: s.start, end: r.end },
                                });
                            }
                        }
                    }
                    _ => {}
                }
            }

            if text.is_empty() {
                continue;
            }
            runs.push(Run {
                text,
                formatting,
                paragraph_index,
                source_span: span,
            });
        }
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

    fn body(inner: &str) -> String {
        format!("<w:body xmlns:w=\"{W_NS}\">{inner}</w:body>")
    }

    #[test]
    fn test_extracts_runs_in_document_order() {
        let markup = body(
            "<w:p><w:r><w:t>VIN:</w:t></w:r><w:r><w:t>WMZ83BR06P3R14626</w:t></w:r></w:p>\
             <w:p><w:r><w:t>second paragraph</w:t></w:r></w:p>",
        );
        let runs = extract_runs(&markup).unwrap();
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].text, "VIN:");
        assert_eq!(runs[1].text, "WMZ83BR06P3R14626");
        assert_eq!(runs[0].paragraph_index, 0);
        assert_eq!(runs[1].paragraph_index, 0);
        assert_eq!(runs[2].paragraph_index, 1);
    }

    #[test]
    fn test_paragraph_index_monotonic() {
        let markup = body(
            "<w:p><w:r><w:t>a</w:t></w:r></w:p><w:p/><w:p><w:r><w:t>b</w:t></w:r></w:p>",
        );
        let runs = extract_runs(&markup).unwrap();
        let indexes: Vec<_> = runs.iter().map(|r| r.paragraph_index).collect();
        assert_eq!(indexes, vec![0, 2]);
    }

    #[test]
    fn test_multiple_text_nodes_concatenate() {
        let markup = body("<w:p><w:r><w:t>25</w:t><w:t>NL</w:t></w:r></w:p>");
        let runs = extract_runs(&markup).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "25NL");
    }

    #[test]
    fn test_entities_decoded() {
        let markup = body("<w:p><w:r><w:t>Fish &amp; Chips &lt;Ltd&gt;</w:t></w:r></w:p>");
        let runs = extract_runs(&markup).unwrap();
        assert_eq!(runs[0].text, "Fish & Chips <Ltd>");
    }

    #[test]
    fn test_formatting_parsed_with_absent_defaults() {
        let markup = body(
            "<w:p><w:r><w:rPr><w:b/><w:sz w:val=\"24\"/><w:rFonts w:ascii=\"Arial\"/>\
             <w:color w:val=\"FF0000\"/></w:rPr><w:t>bold</w:t></w:r>\
             <w:r><w:t>plain</w:t></w:r></w:p>",
        );
        let runs = extract_runs(&markup).unwrap();
        assert_eq!(runs[0].formatting.bold, Some(true));
        assert_eq!(runs[0].formatting.italic, None);
        assert_eq!(runs[0].formatting.font_size_half_points, Some(24));
        assert_eq!(runs[0].formatting.font_family.as_deref(), Some("Arial"));
        assert_eq!(runs[0].formatting.color_hex.as_deref(), Some("FF0000"));
        assert!(runs[1].formatting.is_empty());
    }

    #[test]
    fn test_explicit_off_toggle_is_absent() {
        let markup = body(
            "<w:p><w:r><w:rPr><w:b w:val=\"0\"/><w:u w:val=\"none\"/></w:rPr>\
             <w:t>not bold</w:t></w:r></w:p>",
        );
        let runs = extract_runs(&markup).unwrap();
        assert_eq!(runs[0].formatting.bold, None);
        assert_eq!(runs[0].formatting.underline, None);
    }

    #[test]
    fn test_empty_runs_dropped() {
        let markup = body("<w:p><w:r><w:t></w:t></w:r><w:r><w:t>kept</w:t></w:r></w:p>");
        let runs = extract_runs(&markup).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "kept");
    }

    #[test]
    fn test_source_span_points_at_raw_text() {
        let markup = body("<w:p><w:r><w:t>WMZ83BR06P3R14626</w:t></w:r></w:p>");
        let runs = extract_runs(&markup).unwrap();
        let span = runs[0].source_span.unwrap();
        assert_eq!(&markup[span.start..span.end], "WMZ83BR06P3R14626");
    }

    #[test]
    fn test_source_span_covers_encoded_entities() {
        let markup = body("<w:p><w:r><w:t>A &amp; B</w:t></w:r></w:p>");
        let runs = extract_runs(&markup).unwrap();
        let span = runs[0].source_span.unwrap();
        assert_eq!(&markup[span.start..span.end], "A &amp; B");
        assert_eq!(runs[0].text, "A & B");
    }

    #[test]
    fn test_missing_body_fails_fast() {
        let err = extract_runs("<root><child/></root>").unwrap_err();
        assert!(matches!(err, FieldtagError::MalformedDocument(_)));
    }

    #[test]
    fn test_unparseable_markup_fails_fast() {
        let err = extract_runs("<w:body><w:p>").unwrap_err();
        assert!(matches!(err, FieldtagError::MalformedDocument(_)));
    }

    #[test]
    fn test_ignores_table_content() {
        // Body-level paragraphs only; runs nested under w:tbl are the
        // concern of a different pipeline.
        let markup = body(
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             <w:p><w:r><w:t>body text</w:t></w:r></w:p>",
        );
        let runs = extract_runs(&markup).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "body text");
    }
}
