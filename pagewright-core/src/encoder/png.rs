//! PNG encoding of rendered page bitmaps

use crate::error::{ConversionError, Result};
use crate::types::{ImageAsset, PageBitmap};
use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;

/// Encode an RGBA bitmap as PNG bytes
pub fn encode_png(bitmap: &PageBitmap) -> Result<Vec<u8>> {
    let image = RgbaImage::from_raw(bitmap.width, bitmap.height, bitmap.pixels.clone())
        .ok_or_else(|| ConversionError::ImageWriteFailed {
            file_name: String::new(),
            reason: format!(
                "bitmap buffer of {} bytes does not match {}x{}",
                bitmap.pixels.len(),
                bitmap.width,
                bitmap.height
            ),
        })?;

    let mut output = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
        .map_err(|e| ConversionError::ImageWriteFailed {
            file_name: String::new(),
            reason: e.to_string(),
        })?;

    Ok(output)
}

/// Encode a page bitmap into the named image asset
pub fn page_image(page_index: usize, image_index: usize, bitmap: &PageBitmap) -> Result<ImageAsset> {
    let mut asset = ImageAsset::for_page(page_index, image_index, Vec::new());
    match encode_png(bitmap) {
        Ok(bytes) => {
            asset.bytes = bytes;
            Ok(asset)
        }
        Err(ConversionError::ImageWriteFailed { reason, .. }) => {
            Err(ConversionError::ImageWriteFailed {
                file_name: asset.file_name,
                reason,
            })
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_encode_png() {
        let bytes = encode_png(&PageBitmap::blank(4, 3)).unwrap();
        assert_eq!(&bytes[..8], &PNG_SIGNATURE);
    }

    #[test]
    fn test_mismatched_buffer() {
        let bitmap = PageBitmap::new(10, 10, vec![0; 12]);
        let err = page_image(0, 0, &bitmap).unwrap_err();
        match err {
            ConversionError::ImageWriteFailed { file_name, .. } => {
                assert_eq!(file_name, "page1_image1.png");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
