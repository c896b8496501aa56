//! PDF reader for petition documents.
//!
//! Implements [`petition_core::PageSource`] on top of `lopdf`, so the core
//! engine can read the cover page as plain text and the table page with its
//! column layout preserved.

use std::path::Path;

use thiserror::Error;

use petition_core::{Extractor, PageSource, ParseResult, PetitionError, TextMode};

use parser::backend::{LopdfBackend, PageBackend, PageId};
use parser::layout::{extract_page_spans, group_spans_into_lines, render_layout, render_plain};

pub mod parser {
    pub mod backend;
    pub mod layout;
}

pub mod render {
    pub mod cleanup;
}

pub use parser::layout::LayoutOptions;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("Page {index} is out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PdfError> for PetitionError {
    fn from(err: PdfError) -> Self {
        PetitionError::unreadable(err)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// A loaded PDF whose pages can be rendered as text.
pub struct Document {
    backend: LopdfBackend,
    pages: Vec<PageId>,
    layout: LayoutOptions,
}

impl Document {
    /// Parse PDF bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PdfError> {
        let backend = LopdfBackend::load_bytes(bytes)?;
        let pages = backend.page_ids();
        log::debug!("loaded PDF with {} page(s)", pages.len());

        Ok(Document {
            backend,
            pages,
            layout: LayoutOptions::default(),
        })
    }

    /// Read and parse a PDF file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Replace the point-to-character conversion used for layout text.
    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }
}

impl PageSource for Document {
    type Error = PdfError;

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize, mode: TextMode) -> Result<String, PdfError> {
        let page = *self.pages.get(index).ok_or(PdfError::PageOutOfRange {
            index,
            count: self.pages.len(),
        })?;

        let lines = group_spans_into_lines(extract_page_spans(&self.backend, page)?);
        let text = match mode {
            TextMode::Plain => render_plain(&lines),
            TextMode::Layout => render_layout(&lines, &self.layout),
        };

        Ok(render::cleanup::normalize_text(&text))
    }
}

// ---------------------------------------------------------------------------
// Convenience free functions
// ---------------------------------------------------------------------------

/// Extract the header and discipline records from PDF bytes.
pub fn parse_petition(
    bytes: &[u8],
    extractor: &Extractor,
    layout: &LayoutOptions,
) -> Result<ParseResult, PetitionError> {
    let document = Document::from_bytes(bytes)?.with_layout(*layout);
    extractor.extract(&document)
}

/// Extract the header and discipline records from a PDF file.
pub fn parse_petition_file(
    path: impl AsRef<Path>,
    extractor: &Extractor,
    layout: &LayoutOptions,
) -> Result<ParseResult, PetitionError> {
    let bytes = std::fs::read(path.as_ref()).map_err(PdfError::from)?;
    parse_petition(&bytes, extractor, layout)
}

/// Like [`parse_petition_file`], but any failure yields `None`.
///
/// The cause is logged at warn level.
pub fn try_parse_petition_file(
    path: impl AsRef<Path>,
    extractor: &Extractor,
    layout: &LayoutOptions,
) -> Option<ParseResult> {
    let path = path.as_ref();
    match parse_petition_file(path, extractor, layout) {
        Ok(result) => Some(result),
        Err(err) => {
            log::warn!("{}: {}", path.display(), err);
            None
        }
    }
}
