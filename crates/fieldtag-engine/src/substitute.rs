//! Exactly-once, structure-preserving tag substitution.
//!
//! The most safety-critical operation in the engine: replace the first
//! occurrence of a search text found inside a text-bearing leaf node
//! (never inside an attribute, a tag name, or spanning two nodes) and
//! leave every other byte of the markup untouched. A
//! failed substitution leaves the markup byte-identical to its
//! pre-call state; this function never returns a partially written
//! document.
//!
//! Matching happens on *decoded* node text (a value split around an
//! `&amp;` must still match), so each candidate node is decoded with a
//! byte-offset map back into the raw markup and the splice is applied
//! at raw positions.

use fieldtag_core::{FieldtagError, Result, TAG_OPEN};
use quick_xml::escape::escape;

/// A text node's decoded content plus, for every decoded byte, the raw
/// byte offset it came from. `raw_offsets` carries one extra sentinel
/// entry pointing one past the node's raw end, so any decoded byte
/// range maps to `raw_offsets[start]..raw_offsets[end]`.
struct DecodedNode {
    text: String,
    raw_offsets: Vec<usize>,
}

/// Decode the five XML entities and numeric character references in a
/// raw text-node slice, recording raw offsets per decoded byte.
/// `base` is the slice's byte offset in the whole markup.
fn decode_with_offsets(raw: &str, base: usize) -> DecodedNode {
    let mut text = String::with_capacity(raw.len());
    let mut raw_offsets = Vec::with_capacity(raw.len() + 1);
    let bytes = raw.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let entity = if bytes[i] == b'&' {
            raw[i..].find(';').and_then(|semi| {
                let body = &raw[i + 1..i + semi];
                let decoded = match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    _ => body.strip_prefix("#x").map_or_else(
                        || body.strip_prefix('#').and_then(|d| d.parse::<u32>().ok()),
                        |h| u32::from_str_radix(h, 16).ok(),
                    )
                    .and_then(char::from_u32),
                };
                decoded.map(|c| (c, semi + 1))
            })
        } else {
            None
        };

        if let Some((c, raw_len)) = entity {
            for _ in 0..c.len_utf8() {
                raw_offsets.push(base + i);
            }
            text.push(c);
            i += raw_len;
        } else {
            // Ordinary character: decoded bytes equal raw bytes.
            let c = raw[i..].chars().next().expect("in-bounds char boundary");
            for j in 0..c.len_utf8() {
                raw_offsets.push(base + i + j);
            }
            text.push(c);
            i += c.len_utf8();
        }
    }
    raw_offsets.push(base + raw.len());
    DecodedNode { text, raw_offsets }
}

/// Replace the first occurrence of `search_text` found in a
/// text-bearing leaf node with `replacement`, leaving the rest of the
/// markup byte-for-byte unchanged.
///
/// Scans text nodes in document order and stops at the first node whose
/// decoded text contains `search_text`. Errors:
///
/// - [`FieldtagError::AlreadyTagged`]: the markup already contains
///   `replacement` (rejected before scanning), or the owning node
///   already holds a tag. An already-tagged run must not be re-matched.
/// - [`FieldtagError::TextNotFound`]: no leaf node contains the text;
///   the caller surfaces this and proceeds with other operations.
/// - [`FieldtagError::MalformedDocument`]: the markup does not parse.
pub fn substitute_first(markup: &str, search_text: &str, replacement: &str) -> Result<String> {
    if search_text.is_empty() {
        return Err(FieldtagError::TextNotFound(String::new()));
    }
    if markup.contains(replacement) {
        return Err(FieldtagError::AlreadyTagged(replacement.to_string()));
    }

    let doc = roxmltree::Document::parse(markup)
        .map_err(|e| FieldtagError::MalformedDocument(e.to_string()))?;

    for node in doc.descendants().filter(roxmltree::Node::is_text) {
        let range = node.range();
        let decoded = decode_with_offsets(&markup[range.clone()], range.start);
        let Some(at) = decoded.text.find(search_text) else {
            continue;
        };
        if decoded.text.contains(TAG_OPEN) {
            return Err(FieldtagError::AlreadyTagged(search_text.to_string()));
        }

        let raw_start = decoded.raw_offsets[at];
        let raw_end = decoded.raw_offsets[at + search_text.len()];
        let mut out = String::with_capacity(markup.len() + replacement.len());
        out.push_str(&markup[..raw_start]);
        out.push_str(&escape(replacement));
        out.push_str(&markup[raw_end..]);
        return Ok(out);
    }

    Err(FieldtagError::TextNotFound(search_text.to_string()))
}

/// A leaf node prepared for cross-node matching: decoded content, its
/// byte offset in the document-order concatenation, and the owning
/// paragraph.
struct LeafSlot {
    decoded: DecodedNode,
    concat_start: usize,
    paragraph: Option<roxmltree::NodeId>,
}

/// Replace the first occurrence of `search_text` in the concatenated
/// decoded text of the document's leaf nodes, allowing the match to
/// span node boundaries within one paragraph.
///
/// This is the application path for values a word processor split
/// across several runs: no single leaf node contains the whole text, so
/// [`substitute_first`] cannot place the tag. The replacement lands at
/// the match start inside the first affected node and the matched
/// remainder is removed from the following nodes, which stay in place
/// (possibly emptied). Every byte outside the matched text survives
/// verbatim: paragraph properties, tables, section properties, and
/// bookmarks are untouched.
///
/// A candidate match whose nodes belong to different paragraphs is
/// skipped; tokens never cross paragraph boundaries. Error cases are
/// the same as [`substitute_first`].
pub fn substitute_spanning_first(
    markup: &str,
    search_text: &str,
    replacement: &str,
) -> Result<String> {
    if search_text.is_empty() {
        return Err(FieldtagError::TextNotFound(String::new()));
    }
    if markup.contains(replacement) {
        return Err(FieldtagError::AlreadyTagged(replacement.to_string()));
    }

    let doc = roxmltree::Document::parse(markup)
        .map_err(|e| FieldtagError::MalformedDocument(e.to_string()))?;

    let mut slots: Vec<LeafSlot> = Vec::new();
    let mut concat = String::new();
    for node in doc.descendants().filter(roxmltree::Node::is_text) {
        let range = node.range();
        let paragraph = node
            .ancestors()
            .find(|a| a.is_element() && a.tag_name().name() == "p")
            .map(|a| a.id());
        let decoded = decode_with_offsets(&markup[range.clone()], range.start);
        let concat_start = concat.len();
        concat.push_str(&decoded.text);
        slots.push(LeafSlot { decoded, concat_start, paragraph });
    }

    let mut from = 0;
    while let Some(rel) = concat[from..].find(search_text) {
        let start = from + rel;
        let end = start + search_text.len();
        let overlapped: Vec<&LeafSlot> = slots
            .iter()
            .filter(|s| s.concat_start < end && s.concat_start + s.decoded.text.len() > start)
            .collect();

        let same_paragraph = overlapped.len() == 1
            || (overlapped.iter().all(|s| s.paragraph.is_some())
                && overlapped.windows(2).all(|w| w[0].paragraph == w[1].paragraph));
        if !same_paragraph {
            from = start
                + concat[start..]
                    .chars()
                    .next()
                    .expect("match is non-empty")
                    .len_utf8();
            continue;
        }
        if overlapped.iter().any(|s| s.decoded.text.contains(TAG_OPEN)) {
            return Err(FieldtagError::AlreadyTagged(search_text.to_string()));
        }

        let mut out = String::with_capacity(markup.len() + replacement.len());
        let mut cursor = 0;
        for (i, slot) in overlapped.iter().enumerate() {
            let local_start = start.saturating_sub(slot.concat_start);
            let local_end = (end - slot.concat_start).min(slot.decoded.text.len());
            let raw_start = slot.decoded.raw_offsets[local_start];
            let raw_end = slot.decoded.raw_offsets[local_end];
            out.push_str(&markup[cursor..raw_start]);
            if i == 0 {
                out.push_str(&escape(replacement));
            }
            cursor = raw_end;
        }
        out.push_str(&markup[cursor..]);
        return Ok(out);
    }

    Err(FieldtagError::TextNotFound(search_text.to_string()))
}
