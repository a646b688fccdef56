//! # Fieldtag Core - Run/Token/Field Data Model
//!
//! Shared types for the fieldtag template-tagging engine: the run model
//! extracted from WordprocessingML bodies, the merged-token layer, the
//! persisted field records, the error taxonomy, and the injected
//! label/constant vocabularies.
//!
//! ## Quick Start
//!
//! ```rust
//! use fieldtag_core::{Run, Formatting, Vocabulary};
//!
//! let run = Run {
//!     text: "WMZ83BR06P3R14626".to_string(),
//!     formatting: Formatting { bold: Some(true), ..Formatting::default() },
//!     paragraph_index: 0,
//!     source_span: None,
//! };
//! let vocab = Vocabulary::builtin();
//! assert!(vocab.is_label_word("VIN"));
//! assert!(!run.text.is_empty());
//! ```
//!
//! The algorithms live in `fieldtag-engine`; this crate stays
//! dependency-light so both the engine and external persistence layers
//! can share the record types.

pub mod error;
pub mod types;
pub mod vocab;

pub use error::{FieldtagError, Result};
pub use types::{contains_tag, Category, Field, Formatting, Run, SourceSpan, Token, TAG_CLOSE, TAG_OPEN};
pub use vocab::Vocabulary;
