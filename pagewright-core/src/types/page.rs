//! Per-page artifacts and the assets they carry

use super::ContentBlock;

/// Everything produced for a single page before it is written out
#[derive(Debug, Clone, PartialEq)]
pub struct PageArtifact {
    /// 0-based page index
    pub index: usize,

    /// Content blocks in markup order
    pub blocks: Vec<ContentBlock>,

    /// Images attached to the page, in markup order
    pub images: Vec<ImageAsset>,
}

impl PageArtifact {
    pub fn new(index: usize, blocks: Vec<ContentBlock>) -> Self {
        Self {
            index,
            blocks,
            images: Vec::new(),
        }
    }

    /// Attach images
    pub fn with_images(mut self, images: Vec<ImageAsset>) -> Self {
        self.images = images;
        self
    }

    /// 1-based page number
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// File name of the page document, e.g. `page3.xhtml`
    pub fn document_name(&self) -> String {
        page_document_name(self.index)
    }

    /// Manifest id of the page document
    pub fn document_id(&self) -> String {
        page_document_id(self.index)
    }
}

/// File name of the page document for a 0-based page index
pub fn page_document_name(index: usize) -> String {
    format!("page{}.xhtml", index + 1)
}

/// Manifest id of the page document for a 0-based page index
pub fn page_document_id(index: usize) -> String {
    format!("page{}", index + 1)
}

/// Binary image owned by a page until it lands in the working tree
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageAsset {
    /// Create an asset named after its page and position (both 0-based)
    pub fn for_page(page_index: usize, image_index: usize, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("page{}_image{}.png", page_index + 1, image_index + 1),
            bytes,
        }
    }
}

/// Raw RGBA8 raster of a rendered page
#[derive(Debug, Clone, PartialEq)]
pub struct PageBitmap {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA pixels, `width * height * 4` bytes
    pub pixels: Vec<u8>,
}

impl PageBitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A blank white bitmap
    pub fn blank(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * 4;
        Self::new(width, height, vec![255; len])
    }
}
