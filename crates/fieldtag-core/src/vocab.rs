//! Injected label and constant vocabularies.
//!
//! The merger and classifier never consult globals: they take a
//! [`Vocabulary`] by reference. The built-in vocabulary mirrors the
//! customs/vehicle-export domain the engine grew up in; deployments
//! override it from a JSON file produced by the offline constant
//! discovery tool.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Label and constant vocabularies supplied to the engine as immutable
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Words that mark a token as a label even without a trailing colon
    /// ("MRN", "VIN", "Date", ...). Matched case-insensitively against
    /// the token text and its last word.
    pub label_words: BTreeSet<String>,
    /// Literal values known to repeat identically across many documents.
    /// Never tagged as variable, whatever shape they match.
    pub constants: BTreeSet<String>,
    /// Currency codes accepted by the money shape.
    pub currencies: BTreeSet<String>,
    /// Organization/country words that disqualify the all-uppercase
    /// person-name shape ("BV", "GMBH", "NEDERLAND", ...).
    pub organization_words: BTreeSet<String>,
}

impl Vocabulary {
    /// The built-in domain vocabulary.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            label_words: set(&[
                "mrn", "vin", "date", "data", "number", "numer", "address", "adres", "sender",
                "nadawca", "recipient", "odbiorca", "container", "kontener", "eori", "amount",
                "kwota", "invoice", "faktura", "reference", "referencja",
            ]),
            constants: set(&[
                "MARLOG CAR HANDLING BV",
                "ROTTERDAM",
                "NEDERLAND",
                "EXPORT",
                "EX A",
            ]),
            currencies: set(&["EUR", "USD", "PLN", "GBP", "CHF"]),
            organization_words: set(&[
                "BV", "NV", "GMBH", "LTD", "SP", "ZOO", "SA", "AG", "INC", "HOLDING", "HANDLING",
                "LOGISTICS", "NEDERLAND", "HOLLAND", "POLSKA", "DEUTSCHLAND", "EUROPE",
            ]),
        }
    }

    /// Load a vocabulary from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// True when `text` is a known constant (exact match after trimming).
    #[must_use]
    pub fn is_constant(&self, text: &str) -> bool {
        self.constants.contains(text.trim())
    }

    /// True when `word` (case-insensitive) belongs to the label
    /// vocabulary.
    #[must_use]
    pub fn is_label_word(&self, word: &str) -> bool {
        self.label_words.contains(&word.to_lowercase())
    }

    /// True when `word` (uppercased) is an organization/country word.
    #[must_use]
    pub fn is_organization_word(&self, word: &str) -> bool {
        self.organization_words.contains(&word.to_uppercase())
    }

    /// True when `word` (uppercased) is a recognized currency code.
    #[must_use]
    pub fn is_currency(&self, word: &str) -> bool {
        self.currencies.contains(&word.to_uppercase())
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

fn set(words: &[&str]) -> BTreeSet<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_domain_labels() {
        let vocab = Vocabulary::builtin();
        assert!(vocab.is_label_word("MRN"));
        assert!(vocab.is_label_word("vin"));
        assert!(vocab.is_label_word("Kontener"));
        assert!(!vocab.is_label_word("lorem"));
    }

    #[test]
    fn test_constant_lookup_trims() {
        let vocab = Vocabulary::builtin();
        assert!(vocab.is_constant("MARLOG CAR HANDLING BV"));
        assert!(vocab.is_constant("  MARLOG CAR HANDLING BV  "));
        assert!(!vocab.is_constant("SOME OTHER COMPANY"));
    }

    #[test]
    fn test_currency_case_insensitive() {
        let vocab = Vocabulary::builtin();
        assert!(vocab.is_currency("eur"));
        assert!(vocab.is_currency("USD"));
        assert!(!vocab.is_currency("XYZ"));
    }

    #[test]
    fn test_json_roundtrip() {
        let vocab = Vocabulary::builtin();
        let json = serde_json::to_string(&vocab).unwrap();
        let back: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vocab);
    }
}
