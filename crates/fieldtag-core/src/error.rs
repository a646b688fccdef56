//! Error types for the tagging engine.
//!
//! Every fallible operation in the workspace returns [`Result`]. The
//! taxonomy separates the one fatal condition (a document whose body
//! cannot be parsed) from the recoverable per-operation conditions that
//! the caller surfaces to an operator and moves past.

use thiserror::Error;

/// Error types that can occur during extraction, tagging, and rebuild.
#[derive(Error, Debug)]
pub enum FieldtagError {
    /// The document body is missing or the markup does not parse.
    ///
    /// Fatal for the affected document: every downstream step assumes a
    /// complete, well-ordered run list, so there is no partial-extraction
    /// mode.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// A substitution's search text is absent from every text-bearing
    /// leaf node.
    ///
    /// Recoverable: the specific tagging operation is skipped and
    /// reported; the markup is left byte-identical to its pre-call state.
    #[error("text not found in any text node: {0:?}")]
    TextNotFound(String),

    /// The substitution target already contains a tag.
    ///
    /// Recoverable, surfaced as a user-facing conflict. An already-tagged
    /// run must not be re-split or re-matched.
    #[error("already tagged: {0}")]
    AlreadyTagged(String),

    /// The suggestion oracle returned a different number of results than
    /// requested.
    ///
    /// Recovered by positional fallback to the original text; never
    /// silently fabricated. Recorded on the relabel outcome so callers
    /// can see the truncation or padding that happened.
    #[error("oracle returned {got} suggestions for {expected} requests")]
    OracleCountMismatch { expected: usize, got: usize },

    /// File I/O error reading a document or vocabulary file.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error serializing fields or loading a vocabulary.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The `.docx` container could not be opened as a ZIP archive.
    #[error("archive error: {0}")]
    ZipError(#[from] zip::result::ZipError),
}

/// Type alias for [`Result<T, FieldtagError>`].
pub type Result<T> = std::result::Result<T, FieldtagError>;
