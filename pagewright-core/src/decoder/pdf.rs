//! pdfium-backed PDF source
//!
//! Text runs come from the page's text objects: each object contributes one
//! run with its scaled font size, a boldness guess from the font name, and the
//! bottom-left corner of its bounds converted to a top-left origin.

use super::{PdfSource, SourceDocument, SourcePage};
use crate::error::SourceError;
use crate::types::{PageBitmap, Position, TextRun};
use pdfium_render::prelude::*;
use std::path::Path;

/// Environment variable naming an explicit pdfium library file
pub const PDFIUM_LIB_PATH_ENV: &str = "PAGEWRIGHT_PDFIUM_LIB_PATH";

/// Font name fragments that indicate a bold face
const BOLD_MARKERS: [&str; 5] = ["bold", "black", "heavy", "semibold", "demi"];

/// PDF source using the pdfium library
pub struct PdfiumSource {
    pdfium: Pdfium,
    image_width: u32,
}

impl PdfiumSource {
    /// Bind to the pdfium library
    pub fn bind() -> Result<Self, SourceError> {
        Ok(Self {
            pdfium: bind_pdfium()?,
            image_width: 1200,
        })
    }

    /// Set the target width of rendered page bitmaps
    pub fn with_image_width(mut self, width: u32) -> Self {
        self.image_width = width.max(1);
        self
    }
}

impl PdfSource for PdfiumSource {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn SourceDocument + 'a>, SourceError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| SourceError::Load(format!("{}: {}", path.display(), e)))?;

        Ok(Box::new(PdfiumDocument {
            document,
            image_width: self.image_width,
        }))
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    image_width: u32,
}

impl SourceDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page<'a>(&'a self, index: usize) -> Option<Box<dyn SourcePage + 'a>> {
        let page_index = u16::try_from(index).ok()?;
        let page = self.document.pages().get(page_index).ok()?;
        Some(Box::new(PdfiumPage {
            page,
            image_width: self.image_width,
        }))
    }
}

struct PdfiumPage<'a> {
    page: PdfPage<'a>,
    image_width: u32,
}

impl SourcePage for PdfiumPage<'_> {
    fn text_runs(&self) -> Result<Vec<TextRun>, SourceError> {
        let height = self.page.height().value;
        let mut runs = Vec::new();

        for object in self.page.objects().iter() {
            let Some(text_object) = object.as_text_object() else {
                continue;
            };

            let text = text_object.text();
            if text.trim().is_empty() {
                continue;
            }

            let bounds = text_object
                .bounds()
                .map_err(|e| SourceError::Text(e.to_string()))?;

            runs.push(TextRun {
                text,
                font_size: text_object.scaled_font_size().value,
                is_bold: is_bold_font_name(&text_object.font().name()),
                position: Position::new(bounds.left().value, height - bounds.bottom().value),
            });
        }

        Ok(runs)
    }

    fn render_bitmap(&self) -> Result<PageBitmap, SourceError> {
        let target_width = i32::try_from(self.image_width).unwrap_or(i32::MAX);
        let config = PdfRenderConfig::new()
            .set_target_width(target_width)
            .render_form_data(false)
            .set_format(PdfBitmapFormat::BGRA);

        let bitmap = self
            .page
            .render_with_config(&config)
            .map_err(|e| SourceError::Render(e.to_string()))?;

        let width = bitmap.width().max(0) as usize;
        let height = bitmap.height().max(0) as usize;
        let src_pixels = bitmap.as_raw_bytes();
        let src_stride = if height == 0 {
            0
        } else {
            src_pixels.len() / height
        };

        // BGRA rows (possibly padded) into tightly packed RGBA
        let mut pixels = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            let base = y * src_stride;
            for x in 0..width {
                let idx = base + x * 4;
                let b = src_pixels.get(idx).copied().unwrap_or(255);
                let g = src_pixels.get(idx + 1).copied().unwrap_or(255);
                let r = src_pixels.get(idx + 2).copied().unwrap_or(255);
                let a = src_pixels.get(idx + 3).copied().unwrap_or(255);
                pixels.extend_from_slice(&[r, g, b, a]);
            }
        }

        Ok(PageBitmap::new(width as u32, height as u32, pixels))
    }

    fn height(&self) -> f32 {
        self.page.height().value
    }
}

/// Guess boldness from a font name such as `ABCDEF+Helvetica-Bold`
fn is_bold_font_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    BOLD_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Bind pdfium: explicit path, next to the executable, working directory, system
fn bind_pdfium() -> Result<Pdfium, SourceError> {
    if let Ok(path) = std::env::var(PDFIUM_LIB_PATH_ENV) {
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            SourceError::LibraryUnavailable(format!("{} ({}={})", e, PDFIUM_LIB_PATH_ENV, path))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    let mut candidates = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(Pdfium::pdfium_platform_library_name_at_path(dir));
        }
    }
    candidates.push(Pdfium::pdfium_platform_library_name_at_path(Path::new(".")));

    for path in candidates {
        if let Ok(bindings) = Pdfium::bind_to_library(&path) {
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| {
        SourceError::LibraryUnavailable(format!(
            "{}; install pdfium system-wide, place it next to the executable, or set {}",
            e, PDFIUM_LIB_PATH_ENV
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_font_names() {
        assert!(is_bold_font_name("ABCDEF+Helvetica-Bold"));
        assert!(is_bold_font_name("Arial Black"));
        assert!(is_bold_font_name("MinionPro-Semibold"));
        assert!(!is_bold_font_name("Times-Roman"));
        assert!(!is_bold_font_name("Helvetica-Oblique"));
    }
}
