//! Decoded RGBA8 source buffer handed to the conversion pipeline.

use crate::error::{PatternError, Result};

/// Alpha below this is treated as transparent fabric.
pub const OPAQUE_ALPHA: u8 = 128;

/// A decoded RGBA8 image. The pipeline consumes only this type; callers that
/// already decode elsewhere construct it with [`SourceImage::new`].
#[derive(Debug, Clone)]
pub struct SourceImage {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl SourceImage {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PatternError::InvalidDimensions { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(PatternError::BufferSizeMismatch {
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Decode an encoded image (PNG, JPEG, ...) into a source buffer.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| PatternError::Decode(e.to_string()))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = (rgba.width(), rgba.height());
        Self::new(width, height, rgba.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba[i] = rgb[0];
        self.rgba[i + 1] = rgb[1];
        self.rgba[i + 2] = rgb[2];
    }

    #[inline]
    pub fn is_opaque(&self, x: u32, y: u32) -> bool {
        self.pixel(x, y)[3] >= OPAQUE_ALPHA
    }
}

impl TryFrom<image::RgbaImage> for SourceImage {
    type Error = PatternError;

    fn try_from(img: image::RgbaImage) -> Result<Self> {
        let (width, height) = (img.width(), img.height());
        Self::new(width, height, img.into_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(matches!(
            SourceImage::new(0, 4, vec![]),
            Err(PatternError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_rejects_short_buffer() {
        assert!(matches!(
            SourceImage::new(2, 2, vec![0u8; 15]),
            Err(PatternError::BufferSizeMismatch {
                expected: 16,
                actual: 15
            })
        ));
    }

    #[test]
    fn test_pixel_access() {
        let mut rgba = vec![0u8; 2 * 2 * 4];
        rgba[4..8].copy_from_slice(&[10, 20, 30, 255]);
        let img = SourceImage::new(2, 2, rgba).unwrap();
        assert_eq!(img.pixel(1, 0), [10, 20, 30, 255]);
        assert!(img.is_opaque(1, 0));
        assert!(!img.is_opaque(0, 0));
    }
}
