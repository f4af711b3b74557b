//! Core types shared by the conversion stages

mod metadata;
mod page;
mod run;

pub use metadata::EpubMetadata;
pub use page::{page_document_id, page_document_name, ImageAsset, PageArtifact, PageBitmap};
pub use run::{ClassifiedRun, ContentBlock, ContentRole, Position, TextRun};
