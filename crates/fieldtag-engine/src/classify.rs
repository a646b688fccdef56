//! Variable classification: decide which merged tokens are variable
//! data and assign tag names.
//!
//! Two independent detection paths, evaluated in order:
//!
//! 1. **Direct shape match**: the token text alone unambiguously
//!    matches a known value shape (VIN, MRN, date, money, container,
//!    EORI, postal code, all-uppercase person name).
//! 2. **Label-guided match**: no shape fired, but the preceding label
//!    names the kind of value ("MRN:", "Adres:", "8 Recipient"). Many
//!    domain values (free-text names, addresses) have no fixed shape
//!    and are only identifiable this way.
//!
//! Known constants always win: a value that repeats identically across
//! documents is never variable, whatever shape it matches. Tokens that
//! already contain a tag delimiter are never candidates, which is what
//! makes re-running the pipeline over tagged output a no-op.

use fieldtag_core::{contains_tag, Category, Field, Token, Vocabulary};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// 17-character VIN alphabet; I, O, Q are excluded by the standard.
static VIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").unwrap());
/// MRN: two digits, two letters, then 14+ alphanumerics.
static MRN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}[A-Z]{2}[A-Z0-9]{14,}$").unwrap());
static DATE_DMY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}[-./]\d{2}[-./]\d{4}$").unwrap());
static DATE_YMD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}[-./]\d{2}[-./]\d{2}$").unwrap());
/// European decimal-comma amount with optional thousands dots
/// ("2.572,86"), or a plain integer/decimal ("150", "99.50").
static AMOUNT_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3}(\.\d{3})*(,\d{1,2})?|\d+([.,]\d{1,2})?)$").unwrap());
/// Shipping container: four letters then seven digits.
static CONTAINER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{4}\d{7}$").unwrap());
/// EORI-style code: ISO country prefix then 8 to 15 digits.
static EORI: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2}\d{8,15}$").unwrap());
/// Dutch (1234 AB) and Polish (12-345) postal codes.
static POSTAL_NL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}\s?[A-Z]{2}$").unwrap());
static POSTAL_PL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}-\d{3}$").unwrap());

/// A detected variable kind, before tag uniqueness is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// Deterministic base tag name for the category (`vinNumber`,
    /// `amount`, ...). Duplicates get a numeric suffix later.
    pub base_tag: &'static str,
    pub category: Category,
}

const DETECT_VIN: Detection = Detection { base_tag: "vinNumber", category: Category::Vehicle };
const DETECT_MRN: Detection = Detection { base_tag: "mrnNumber", category: Category::Customs };
const DETECT_DATE: Detection = Detection { base_tag: "issueDate", category: Category::Dates };
const DETECT_AMOUNT: Detection = Detection { base_tag: "amount", category: Category::Financial };
const DETECT_CONTAINER: Detection =
    Detection { base_tag: "containerNumber", category: Category::Transport };
const DETECT_EORI: Detection = Detection { base_tag: "eoriNumber", category: Category::Customs };
const DETECT_POSTAL: Detection = Detection { base_tag: "postalCode", category: Category::Address };
const DETECT_PERSON: Detection = Detection { base_tag: "personName", category: Category::Person };
const DETECT_ADDRESS: Detection = Detection { base_tag: "address", category: Category::Address };
const DETECT_REFERENCE: Detection =
    Detection { base_tag: "referenceNumber", category: Category::Documents };

/// Money-with-currency shape: numeric part plus a recognized currency
/// word, e.g. "2.572,86 EUR".
fn is_amount_with_currency(text: &str, vocab: &Vocabulary) -> bool {
    let mut parts = text.split_whitespace();
    let (Some(number), Some(currency), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    AMOUNT_NUMBER.is_match(number) && vocab.is_currency(currency)
}

/// Restrictive two/three-word all-uppercase person-name shape. Words
/// from the organization/country stop list disqualify the whole token.
fn is_person_name(text: &str, vocab: &Vocabulary) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    if !(2..=3).contains(&words.len()) {
        return false;
    }
    words.iter().all(|w| {
        w.chars().count() >= 2
            && w.chars().all(|c| c.is_alphabetic() && c.is_uppercase())
            && !vocab.is_organization_word(w)
    })
}

/// Direct shape pass: the token text alone identifies the value kind.
fn detect_by_shape(text: &str, vocab: &Vocabulary) -> Option<Detection> {
    if VIN.is_match(text) && text.chars().any(|c| c.is_ascii_alphabetic()) {
        return Some(DETECT_VIN);
    }
    if MRN.is_match(text) {
        return Some(DETECT_MRN);
    }
    if CONTAINER.is_match(text) {
        return Some(DETECT_CONTAINER);
    }
    if DATE_DMY.is_match(text) || DATE_YMD.is_match(text) {
        return Some(DETECT_DATE);
    }
    if is_amount_with_currency(text, vocab) {
        return Some(DETECT_AMOUNT);
    }
    if EORI.is_match(text) {
        return Some(DETECT_EORI);
    }
    if POSTAL_NL.is_match(text) || POSTAL_PL.is_match(text) {
        return Some(DETECT_POSTAL);
    }
    if is_person_name(text, vocab) {
        return Some(DETECT_PERSON);
    }
    None
}

/// Label-guided pass: classify by what the preceding label says the
/// value is. `has_digit` gates the kinds that are always numeric.
fn detect_by_label(label: &str, text: &str) -> Option<Detection> {
    let label = label.to_lowercase();
    let has_digit = text.chars().any(|c| c.is_ascii_digit());

    if label.contains("vin") {
        return Some(DETECT_VIN);
    }
    if label.contains("mrn") {
        return Some(DETECT_MRN);
    }
    if label.contains("kontener") || label.contains("container") {
        return Some(DETECT_CONTAINER);
    }
    if label.contains("eori") {
        return Some(DETECT_EORI);
    }
    if label.contains("adres") || label.contains("address") {
        return Some(DETECT_ADDRESS);
    }
    if (label.contains("data") || label.contains("date")) && has_digit {
        return Some(DETECT_DATE);
    }
    if (label.contains("kwota") || label.contains("amount")) && has_digit {
        return Some(DETECT_AMOUNT);
    }
    if label.contains("nadawca")
        || label.contains("sender")
        || label.contains("odbiorca")
        || label.contains("recipient")
    {
        return Some(DETECT_PERSON);
    }
    if (label.contains("numer")
        || label.contains("number")
        || label.contains("referencja")
        || label.contains("reference"))
        && has_digit
    {
        return Some(DETECT_REFERENCE);
    }
    None
}

/// Run both detection paths for a token. `None` means boilerplate.
#[must_use]
pub fn detect(token: &Token, vocab: &Vocabulary) -> Option<Detection> {
    let text = token.merged_text.trim();
    detect_by_shape(text, vocab).or_else(|| {
        token
            .preceding_label
            .as_deref()
            .and_then(|label| detect_by_label(label, text))
    })
}

/// Keeps tag names unique within one document's field set by handing
/// out numeric suffixes: `amount`, `amount_2`, `amount_3`, ...
#[derive(Debug, Default)]
pub struct TagAllocator {
    counts: HashMap<String, usize>,
}

impl TagAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unique tag for `base`.
    pub fn allocate(&mut self, base: &str) -> String {
        let n = self.counts.entry(base.to_string()).or_insert(0);
        *n += 1;
        if *n == 1 {
            base.to_string()
        } else {
            format!("{base}_{n}")
        }
    }
}

/// Classify one token into a [`Field`], or `None` for boilerplate,
/// labels, constants, and already-tagged text.
#[must_use]
pub fn classify_token(token: &Token, vocab: &Vocabulary, alloc: &mut TagAllocator) -> Option<Field> {
    let text = token.merged_text.trim();
    if text.is_empty() || token.is_label {
        return None;
    }
    // Already-tagged text must never be re-matched.
    if contains_tag(text) {
        return None;
    }
    // Constants beat both detection paths.
    if vocab.is_constant(text) {
        return None;
    }

    let detection = detect(token, vocab)?;
    Some(Field {
        tag: alloc.allocate(detection.base_tag),
        category: detection.category,
        original_value: text.to_string(),
        formatting: token
            .member_runs
            .first()
            .map(|r| r.formatting.clone())
            .unwrap_or_default(),
        paragraph_index: token.paragraph_index(),
        label: token.preceding_label.clone(),
    })
}
