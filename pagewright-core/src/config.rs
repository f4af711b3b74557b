//! Conversion options
//!
//! Options can be built in code or loaded from a JSON file. Every field has a
//! default, so a config file only needs to name what it changes.

use crate::error::{ConversionError, Result};
use crate::types::EpubMetadata;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Author used when none is configured
pub const DEFAULT_AUTHOR: &str = "Unknown Author";

/// Thresholds driving the content classifier, in layout units
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// Runs closer than this to the bottom edge are footers
    pub footer_margin: f32,

    /// Minimum font size for a title
    pub title_size: f32,

    /// Minimum bold font size for a heading
    pub heading_size: f32,

    /// Minimum bold font size for an author line
    pub author_size: f32,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            footer_margin: 50.0,
            title_size: 20.0,
            heading_size: 16.0,
            author_size: 14.0,
        }
    }
}

/// Options for one conversion run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConversionOptions {
    /// Book title; defaults to the input file stem
    pub title: Option<String>,

    /// Book author
    pub author: Option<String>,

    /// Language code
    pub language: String,

    /// Fixed identifier; a random one is generated when absent
    pub identifier: Option<Uuid>,

    /// Whether to rasterize each page into an image
    pub render_images: bool,

    /// Target width of rendered page images in pixels
    pub image_width: u32,

    /// Classifier thresholds
    pub classifier: ClassifierThresholds,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            title: None,
            author: None,
            language: "en".to_string(),
            identifier: None,
            render_images: true,
            image_width: 1200,
            classifier: ClassifierThresholds::default(),
        }
    }
}

impl ConversionOptions {
    /// Load options from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
            .map_err(|e| ConversionError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse options from a JSON string
    pub fn from_json(data: &str) -> Result<Self> {
        let options: Self =
            serde_json::from_str(data).map_err(|e| ConversionError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.language.trim().is_empty() {
            return Err(ConversionError::Config("language must not be empty".to_string()));
        }
        if self.render_images && self.image_width == 0 {
            return Err(ConversionError::Config(
                "image_width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the book metadata for an input file
    pub fn metadata_for(&self, input: &Path) -> EpubMetadata {
        let title = self.title.clone().unwrap_or_else(|| {
            input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Untitled")
                .to_string()
        });
        let author = self
            .author
            .clone()
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

        let metadata = EpubMetadata::new(title, author, self.language.clone());
        match self.identifier {
            Some(id) => metadata.with_identifier(id),
            None => metadata,
        }
    }
}
