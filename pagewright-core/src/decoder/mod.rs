//! PDF source collaborators
//!
//! The pipeline never talks to a PDF library directly. It opens documents
//! through [`PdfSource`] and reads pages through [`SourcePage`], so the
//! pdfium-backed source and the scripted in-memory source are interchangeable.

mod memory;
mod pdf;

pub use memory::{MemoryDocument, MemoryPage, MemorySource};
pub use pdf::PdfiumSource;

use crate::error::SourceError;
use crate::types::{PageBitmap, TextRun};
use std::path::Path;

/// Opens documents from paths
pub trait PdfSource {
    /// Open the document at `path`
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn SourceDocument + 'a>, SourceError>;
}

/// An opened, paginated document
pub trait SourceDocument {
    /// Number of pages
    fn page_count(&self) -> usize;

    /// Page at a 0-based index, or `None` when it cannot be read
    fn page<'a>(&'a self, index: usize) -> Option<Box<dyn SourcePage + 'a>>;
}

/// One page of an opened document
pub trait SourcePage {
    /// Positioned, font-annotated text runs in content order
    fn text_runs(&self) -> Result<Vec<TextRun>, SourceError>;

    /// Rasterize the page
    fn render_bitmap(&self) -> Result<PageBitmap, SourceError>;

    /// Page height in layout units
    fn height(&self) -> f32;
}

/// Whether a path looks like a PDF by extension
pub fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
