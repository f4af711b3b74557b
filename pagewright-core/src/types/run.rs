//! Text runs and the content blocks built from them

use serde::{Deserialize, Serialize};

/// Position of a run in layout units, origin at the top-left of the page
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A positioned, font-annotated piece of text as produced by a PDF source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextRun {
    /// Text content
    pub text: String,

    /// Font size in layout units
    pub font_size: f32,

    /// Whether the run is set in a bold face
    pub is_bold: bool,

    /// Where the run sits on the page
    pub position: Position,
}

impl TextRun {
    /// Create a regular-weight run
    pub fn new(text: impl Into<String>, font_size: f32, position: Position) -> Self {
        Self {
            text: text.into(),
            font_size,
            is_bold: false,
            position,
        }
    }

    /// Mark the run as bold
    pub fn bold(mut self) -> Self {
        self.is_bold = true;
        self
    }

    /// True when the run carries nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Semantic role assigned to a run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentRole {
    Title,
    Author,
    Heading,
    Paragraph,
    Footer,
}

/// A run together with the role the classifier gave it
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRun {
    pub role: ContentRole,
    pub text: String,
}

impl ClassifiedRun {
    pub fn new(role: ContentRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Unit of page content emitted into markup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentBlock {
    pub role: ContentRole,
    pub text: String,
}

impl ContentBlock {
    pub fn new(role: ContentRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Create a paragraph block
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(ContentRole::Paragraph, text)
    }
}
