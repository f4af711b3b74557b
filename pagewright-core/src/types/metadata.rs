//! Package metadata (Dublin Core subset used by EPUB 2)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Book-level metadata, fixed when the EPUB model is initialized
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpubMetadata {
    /// Book title
    pub title: String,

    /// Primary author
    pub author: String,

    /// Language code (ISO 639-1)
    pub language: String,

    /// Unique book identifier, serialized as `urn:uuid:{identifier}`
    pub identifier: Uuid,

    /// Conversion timestamp, emitted as `dc:date`
    pub date: DateTime<Utc>,
}

impl EpubMetadata {
    /// Create metadata with a fresh identifier and the current date
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            language: language.into(),
            identifier: Uuid::new_v4(),
            date: Utc::now(),
        }
    }

    /// Use a fixed identifier
    pub fn with_identifier(mut self, identifier: Uuid) -> Self {
        self.identifier = identifier;
        self
    }

    /// Use a fixed date
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Identifier in URN form
    pub fn urn(&self) -> String {
        format!("urn:uuid:{}", self.identifier)
    }
}
