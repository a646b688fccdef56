//! # Fieldtag Engine - Run Model & Variable Tagging
//!
//! Deterministic scaffolding for turning Word documents into reusable
//! templates: parse the body markup into styled runs, merge runs the
//! word processor split mid-value, classify which merged tokens are
//! variable data, splice `{{placeholder}}` tags into the markup exactly
//! once per value, and rebuild valid markup from an edited run list.
//!
//! ```rust
//! use fieldtag_core::Vocabulary;
//! use fieldtag_engine::TaggingEngine;
//!
//! let markup = r#"<w:body xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
//!     <w:p><w:r><w:t>VIN: </w:t></w:r><w:r><w:t>WMZ83BR06P3R14626</w:t></w:r></w:p>
//! </w:body>"#;
//!
//! let engine = TaggingEngine::new(Vocabulary::builtin());
//! let outcome = engine.tag_document(markup).unwrap();
//! assert!(outcome.markup.contains("{{vinNumber}}"));
//! ```
//!
//! All components are pure, synchronous, single-document
//! transformations with no I/O of their own; fetching documents,
//! calling the suggestion oracle, and persisting fields happen at the
//! boundary.

pub mod classify;
pub mod discovery;
pub mod docx;
pub mod extract;
pub mod merge;
pub mod oracle;
pub mod pipeline;
pub mod rebuild;
pub mod substitute;

pub use classify::{classify_token, detect, Detection, TagAllocator};
pub use discovery::{discover_constants, DiscoveryConfig};
pub use docx::read_document_xml;
pub use extract::extract_runs;
pub use merge::{decide_join, is_label_text, merge_runs, JoinDecision};
pub use oracle::{align_suggestions, Suggestion, SuggestionOracle, SuggestionRequest};
pub use pipeline::{AppliedVia, RelabelOutcome, SkippedOperation, TaggingEngine, TaggingOutcome};
pub use rebuild::rebuild_body;
pub use substitute::{substitute_first, substitute_spanning_first};
