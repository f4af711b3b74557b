//! In-memory PDF source (for testing and embedding)

use super::{PdfSource, SourceDocument, SourcePage};
use crate::error::SourceError;
use crate::types::{PageBitmap, TextRun};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default page height, US Letter in points
const LETTER_HEIGHT: f32 = 792.0;

/// A scripted page
#[derive(Debug, Clone)]
pub struct MemoryPage {
    runs: Vec<TextRun>,
    height: f32,
    bitmap: Option<PageBitmap>,
    text_error: Option<String>,
}

impl MemoryPage {
    /// A US Letter page with the given runs and no bitmap
    pub fn new(runs: Vec<TextRun>) -> Self {
        Self {
            runs,
            height: LETTER_HEIGHT,
            bitmap: None,
            text_error: None,
        }
    }

    /// Set the page height
    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    /// Set the bitmap returned by `render_bitmap`
    pub fn with_bitmap(mut self, bitmap: PageBitmap) -> Self {
        self.bitmap = Some(bitmap);
        self
    }

    /// Make `text_runs` fail
    pub fn with_text_error(mut self, reason: impl Into<String>) -> Self {
        self.text_error = Some(reason.into());
        self
    }
}

impl SourcePage for MemoryPage {
    fn text_runs(&self) -> Result<Vec<TextRun>, SourceError> {
        match &self.text_error {
            Some(reason) => Err(SourceError::Text(reason.clone())),
            None => Ok(self.runs.clone()),
        }
    }

    fn render_bitmap(&self) -> Result<PageBitmap, SourceError> {
        self.bitmap
            .clone()
            .ok_or_else(|| SourceError::Render("page has no bitmap".to_string()))
    }

    fn height(&self) -> f32 {
        self.height
    }
}

/// A scripted document; `None` entries are unreadable pages
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pages: Vec<Option<MemoryPage>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a readable page
    pub fn with_page(mut self, page: MemoryPage) -> Self {
        self.pages.push(Some(page));
        self
    }

    /// Append a page that cannot be read
    pub fn with_unreadable_page(mut self) -> Self {
        self.pages.push(None);
        self
    }
}

impl SourceDocument for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page<'a>(&'a self, index: usize) -> Option<Box<dyn SourcePage + 'a>> {
        self.pages
            .get(index)
            .and_then(|page| page.as_ref())
            .map(|page| Box::new(page.clone()) as Box<dyn SourcePage + 'a>)
    }
}

/// Serves registered documents by path
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<PathBuf, MemoryDocument>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under a path
    pub fn with_document(mut self, path: impl Into<PathBuf>, document: MemoryDocument) -> Self {
        self.documents.insert(path.into(), document);
        self
    }
}

impl PdfSource for MemorySource {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn SourceDocument + 'a>, SourceError> {
        self.documents
            .get(path)
            .map(|doc| Box::new(doc.clone()) as Box<dyn SourceDocument + 'a>)
            .ok_or_else(|| SourceError::Load(format!("no such document: {}", path.display())))
    }
}
