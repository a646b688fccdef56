//! Run, token, and field data model.
//!
//! Three layers, each produced from the one before it:
//!
//! - [`Run`]: the smallest styled text fragment as it appears in the
//!   document body markup. Created fresh on every extraction.
//! - [`Token`]: a group of contiguous runs merged into one semantic unit
//!   (a VIN, a date, a reference number). Ephemeral, produced per
//!   tagging pass.
//! - [`Field`]: a resolved variable, the durable record of what was
//!   tagged, with what value, under which tag.
//!
//! Formatting attributes are `Option` everywhere: absent means "not
//! specified in the markup", which must never collapse into `false`
//! during rebuild.

use serde::{Deserialize, Serialize};

/// Character formatting carried by a run.
///
/// Only the attributes needed for round-trip fidelity are modeled. A
/// property explicitly switched off in the markup (`w:val="0"`) is
/// recorded as absent, same as an unspecified one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Formatting {
    /// Whether text is bold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    /// Whether text is italic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    /// Whether text is underlined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    /// Font size in half-points (`w:sz w:val`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size_half_points: Option<u32>,
    /// Font family name (`w:rFonts w:ascii`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Text color as RRGGBB hex (`w:color w:val`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
}

impl Formatting {
    /// True when no attribute is present at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bold.is_none()
            && self.italic.is_none()
            && self.underline.is_none()
            && self.font_size_half_points.is_none()
            && self.font_family.is_none()
            && self.color_hex.is_none()
    }
}

/// Byte offset range of a run's text content in the original markup.
///
/// Owned by the extractor; required for exactly-once substitution. The
/// range covers the raw (entity-encoded) text of the run's first text
/// node through its last text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

/// An atomic styled text fragment from the document body.
///
/// Runs are totally ordered by document position; `paragraph_index` is
/// monotonically non-decreasing across an extracted sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Decoded text (markup entities resolved), concatenated across the
    /// run's text nodes.
    pub text: String,
    /// Character formatting, every attribute optional.
    #[serde(default, skip_serializing_if = "Formatting::is_empty")]
    pub formatting: Formatting,
    /// Which paragraph this run belongs to.
    pub paragraph_index: usize,
    /// Raw-byte range of the run's text in the original markup.
    /// Absent for runs that were never extracted (e.g. synthesized
    /// during relabeling).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_span: Option<SourceSpan>,
}

impl Run {
    /// Convenience constructor for runs with no formatting and no span,
    /// as produced by editing passes rather than extraction.
    #[must_use]
    pub fn new(text: impl Into<String>, paragraph_index: usize) -> Self {
        Self {
            text: text.into(),
            formatting: Formatting::default(),
            paragraph_index,
            source_span: None,
        }
    }
}

/// A merged group of contiguous runs judged to represent one semantic
/// value. Never crosses a paragraph boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Concatenation of member run texts, order preserved.
    pub merged_text: String,
    /// The runs that were collapsed into this token. Non-empty.
    pub member_runs: Vec<Run>,
    /// Nearest earlier token in the same paragraph classified as a
    /// label, if any.
    pub preceding_label: Option<String>,
    /// Whether this token is itself a label (ends with `:` or matches
    /// the label vocabulary).
    pub is_label: bool,
}

impl Token {
    /// Paragraph this token lives in (taken from its first member run).
    #[must_use]
    pub fn paragraph_index(&self) -> usize {
        self.member_runs.first().map_or(0, |r| r.paragraph_index)
    }
}

/// Semantic category assigned to a tagged field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Vehicle,
    Person,
    Address,
    Documents,
    Dates,
    Financial,
    Transport,
    Exporter,
    Customs,
    Other,
}

impl Category {
    /// Stable lowercase name used in persisted field rows.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vehicle => "vehicle",
            Self::Person => "person",
            Self::Address => "address",
            Self::Documents => "documents",
            Self::Dates => "dates",
            Self::Financial => "financial",
            Self::Transport => "transport",
            Self::Exporter => "exporter",
            Self::Customs => "customs",
            Self::Other => "other",
        }
    }
}

/// A resolved variable: the output of tagging.
///
/// `tag` is unique within one document's active field set; when several
/// fields resolve to the same base tag the later ones carry a numeric
/// suffix (`amount_2`, `amount_3`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Placeholder name, e.g. `vinNumber`. Embedded in markup as
    /// `{{vinNumber}}`.
    pub tag: String,
    pub category: Category,
    /// The literal text that was replaced.
    pub original_value: String,
    /// Formatting snapshot of the first member run, needed to
    /// reconstruct the run on rebuild.
    #[serde(default, skip_serializing_if = "Formatting::is_empty")]
    pub formatting: Formatting,
    /// Paragraph the source token lived in.
    pub paragraph_index: usize,
    /// The label that guided classification, when one did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Field {
    /// The placeholder as it appears in markup: `{{tag}}`.
    #[must_use]
    pub fn placeholder(&self) -> String {
        format!("{{{{{}}}}}", self.tag)
    }
}

/// Opening tag delimiter. Any text containing it is treated as already
/// tagged and excluded from classification and substitution.
pub const TAG_OPEN: &str = "{{";
/// Closing tag delimiter.
pub const TAG_CLOSE: &str = "}}";

/// True when `text` contains a tag delimiter and therefore must not be
/// re-tagged.
#[must_use]
pub fn contains_tag(text: &str) -> bool {
    text.contains(TAG_OPEN) || text.contains(TAG_CLOSE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatting_default_is_empty() {
        assert!(Formatting::default().is_empty());
    }

    #[test]
    fn test_formatting_absent_fields_not_serialized() {
        let fmt = Formatting {
            bold: Some(true),
            ..Formatting::default()
        };
        let json = serde_json::to_value(&fmt).unwrap();
        assert_eq!(json, serde_json::json!({"bold": true}));
        // Absent is absent, never false.
        assert!(json.get("italic").is_none());
        assert!(json.get("underline").is_none());
    }

    #[test]
    fn test_run_roundtrip_json() {
        let run = Run {
            text: "WMZ83BR06P3R14626".to_string(),
            formatting: Formatting {
                bold: Some(true),
                font_size_half_points: Some(24),
                ..Formatting::default()
            },
            paragraph_index: 3,
            source_span: Some(SourceSpan { start: 120, end: 137 }),
        };
        let json = serde_json::to_string(&run).unwrap();
        let back: Run = serde_json::from_str(&json).unwrap();
        assert_eq!(back, run);
    }

    #[test]
    fn test_field_placeholder() {
        let field = Field {
            tag: "vinNumber".to_string(),
            category: Category::Vehicle,
            original_value: "WMZ83BR06P3R14626".to_string(),
            formatting: Formatting::default(),
            paragraph_index: 0,
            label: None,
        };
        assert_eq!(field.placeholder(), "{{vinNumber}}");
    }

    #[test]
    fn test_category_serde_lowercase() {
        let json = serde_json::to_string(&Category::Financial).unwrap();
        assert_eq!(json, "\"financial\"");
        assert_eq!(Category::Dates.as_str(), "dates");
    }

    #[test]
    fn test_contains_tag() {
        assert!(contains_tag("{{vinNumber}}"));
        assert!(contains_tag("prefix {{amount}} suffix"));
        assert!(!contains_tag("plain text with braces { }"));
    }

    #[test]
    fn test_token_paragraph_index() {
        let token = Token {
            merged_text: "25NL7PU1EYHFR8FDR4".to_string(),
            member_runs: vec![Run::new("25", 7), Run::new("NL7PU1EYHFR8FDR4", 7)],
            preceding_label: Some("MRN:".to_string()),
            is_label: false,
        };
        assert_eq!(token.paragraph_index(), 7);
    }
}
