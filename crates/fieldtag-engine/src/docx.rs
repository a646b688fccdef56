//! `.docx` container access.
//!
//! DOCX files are ZIP archives; the body-text markup stream this engine
//! operates on lives at `word/document.xml`. Nothing else in the
//! archive is read; styles, numbering, and relationships are outside
//! the engine's scope.

use fieldtag_core::{FieldtagError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

const DOCUMENT_ENTRY: &str = "word/document.xml";

/// Read `word/document.xml` out of a `.docx` archive.
///
/// A missing entry is a [`FieldtagError::MalformedDocument`]: a Word
/// file without a document part cannot be extracted from, and there is
/// no partial mode.
pub fn read_document_xml<P: AsRef<Path>>(path: P) -> Result<String> {
    let file = File::open(path.as_ref())?;
    let mut archive = ZipArchive::new(file)?;
    let mut entry = archive.by_name(DOCUMENT_ENTRY).map_err(|_| {
        FieldtagError::MalformedDocument(format!(
            "{}: no {DOCUMENT_ENTRY} entry",
            path.as_ref().display()
        ))
    })?;
    let mut markup = String::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
    entry.read_to_string(&mut markup)?;
    Ok(markup)
}
