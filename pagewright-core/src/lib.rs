//! Pagewright Core Library
//!
//! Converts PDF documents into reflowable EPUB 2 books. Each page's text runs
//! are classified into titles, headings, paragraphs and footers, rendered as
//! one XHTML document per page, and packed with an optional page image into a
//! single archive.

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod storage;
pub mod types;

pub use config::{ClassifierThresholds, ConversionOptions, DEFAULT_AUTHOR};
pub use decoder::{MemoryDocument, MemoryPage, MemorySource, PdfSource, PdfiumSource};
pub use encoder::{inspect_archive, ArchivePacker, ArchiveReport, EpubDocument, PageRenderer};
pub use error::{ConversionError, Result, SourceError};
pub use layout::{merge_blocks, ContentClassifier};
pub use pipeline::{
    analyze_document, convert, CancelFlag, ChannelProgress, ConversionPipeline, DocumentAnalysis,
    NoProgress, PipelineState, ProgressSink,
};
pub use types::{
    ContentBlock, ContentRole, EpubMetadata, ImageAsset, PageArtifact, PageBitmap, Position,
    TextRun,
};
