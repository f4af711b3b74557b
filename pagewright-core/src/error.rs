//! Error types for Pagewright Core

use thiserror::Error;

/// Result type alias using ConversionError
pub type Result<T> = std::result::Result<T, ConversionError>;

/// Top-level error type for a PDF to EPUB conversion
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Failed to load document: {0}")]
    DocumentLoadFailed(String),

    #[error("Page {page} is unreadable: {reason}")]
    PageUnreadable { page: usize, reason: String },

    #[error("Failed to write image {file_name}: {reason}")]
    ImageWriteFailed { file_name: String, reason: String },

    #[error("Failed to create archive: {0}")]
    ArchiveCreationFailed(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Document has no readable pages")]
    EmptyDocument,

    #[error("Conversion cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversionError {
    /// Whether the pipeline can skip past this error and keep going
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConversionError::PageUnreadable { .. } | ConversionError::ImageWriteFailed { .. }
        )
    }
}

/// Errors reported by a PDF source collaborator
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("PDF library unavailable: {0}")]
    LibraryUnavailable(String),

    #[error("Failed to load PDF: {0}")]
    Load(String),

    #[error("Page {0} not found (document has {1} pages)")]
    PageNotFound(usize, usize),

    #[error("Failed to read page text: {0}")]
    Text(String),

    #[error("Failed to render page: {0}")]
    Render(String),
}

impl From<SourceError> for ConversionError {
    fn from(err: SourceError) -> Self {
        ConversionError::DocumentLoadFailed(err.to_string())
    }
}
