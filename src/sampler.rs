//! Per-cell color extraction from a source image region.

use crate::source::{SourceImage, OPAQUE_ALPHA};
use serde::{Deserialize, Serialize};

/// How a cell's color is read from its source rectangle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SamplingMethod {
    /// Single pixel nearest the rectangle centroid. Fast, aliased; kept for
    /// compatibility with older charts.
    Center,
    /// Gaussian-weighted average over every opaque pixel in the rectangle.
    #[default]
    Weighted,
}

/// Axis-aligned cell rectangle in source-pixel coordinates.
#[derive(Debug, Copy, Clone)]
pub struct CellRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl CellRect {
    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).max(0.0)
    }
}

pub fn sample(img: &SourceImage, rect: CellRect, method: SamplingMethod) -> Option<[u8; 3]> {
    match method {
        SamplingMethod::Center => sample_center(img, rect),
        SamplingMethod::Weighted => sample_weighted(img, rect),
    }
}

/// Read the single pixel nearest the rectangle's centroid. A pixel with
/// alpha below the opacity cutoff reads as empty fabric.
pub fn sample_center(img: &SourceImage, rect: CellRect) -> Option<[u8; 3]> {
    let cx = ((rect.x0 + rect.x1) * 0.5).floor().max(0.0) as u32;
    let cy = ((rect.y0 + rect.y1) * 0.5).floor().max(0.0) as u32;
    let x = cx.min(img.width() - 1);
    let y = cy.min(img.height() - 1);
    let p = img.pixel(x, y);
    (p[3] >= OPAQUE_ALPHA).then_some([p[0], p[1], p[2]])
}

/// Gaussian-weighted average over all opaque pixels in the rectangle, with
/// sigma = min(cell width, cell height) / 3. Returns `None` when the
/// rectangle contains no opaque pixel.
pub fn sample_weighted(img: &SourceImage, rect: CellRect) -> Option<[u8; 3]> {
    let x_start = rect.x0.floor().max(0.0) as u32;
    let y_start = rect.y0.floor().max(0.0) as u32;
    let x_end = (rect.x1.ceil() as u32).min(img.width());
    let y_end = (rect.y1.ceil() as u32).min(img.height());
    if x_start >= x_end || y_start >= y_end {
        return None;
    }

    let cx = (rect.x0 + rect.x1) * 0.5;
    let cy = (rect.y0 + rect.y1) * 0.5;
    let sigma = (rect.width().min(rect.height()) / 3.0).max(1e-3);
    let inv_two_sigma_sq = 1.0 / (2.0 * sigma * sigma);

    let mut sum = [0.0f64; 3];
    let mut total_weight = 0.0f64;

    for y in y_start..y_end {
        for x in x_start..x_end {
            let p = img.pixel(x, y);
            if p[3] < OPAQUE_ALPHA {
                continue;
            }
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let w = (-(dx * dx + dy * dy) * inv_two_sigma_sq).exp() as f64;
            sum[0] += p[0] as f64 * w;
            sum[1] += p[1] as f64 * w;
            sum[2] += p[2] as f64 * w;
            total_weight += w;
        }
    }

    if total_weight <= 0.0 {
        return None;
    }
    Some([
        (sum[0] / total_weight).round() as u8,
        (sum[1] / total_weight).round() as u8,
        (sum[2] / total_weight).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(w: u32, h: u32, a: [u8; 4], b: [u8; 4]) -> SourceImage {
        let mut rgba = Vec::with_capacity((w * h * 4) as usize);
        for y in 0..h {
            for x in 0..w {
                let p = if (x + y) % 2 == 0 { a } else { b };
                rgba.extend_from_slice(&p);
            }
        }
        SourceImage::new(w, h, rgba).unwrap()
    }

    #[test]
    fn test_center_reads_centroid_pixel() {
        let img = checkerboard(4, 4, [255, 0, 0, 255], [0, 0, 255, 255]);
        let rect = CellRect {
            x0: 0.0,
            y0: 0.0,
            x1: 4.0,
            y1: 4.0,
        };
        // Centroid (2, 2) is even parity -> red.
        assert_eq!(sample_center(&img, rect), Some([255, 0, 0]));
    }

    #[test]
    fn test_center_transparent_is_empty() {
        let img = checkerboard(2, 2, [255, 0, 0, 10], [255, 0, 0, 10]);
        let rect = CellRect {
            x0: 0.0,
            y0: 0.0,
            x1: 2.0,
            y1: 2.0,
        };
        assert_eq!(sample_center(&img, rect), None);
    }

    #[test]
    fn test_weighted_averages_mixed_region() {
        let img = checkerboard(6, 6, [255, 0, 0, 255], [0, 0, 255, 255]);
        let rect = CellRect {
            x0: 0.0,
            y0: 0.0,
            x1: 6.0,
            y1: 6.0,
        };
        let [r, _, b] = sample_weighted(&img, rect).unwrap();
        // Equal mix of red and blue, weighted symmetrically.
        assert!(r > 80 && b > 80);
    }

    #[test]
    fn test_weighted_skips_transparent_pixels() {
        let img = checkerboard(4, 4, [0, 200, 0, 255], [255, 255, 255, 0]);
        let rect = CellRect {
            x0: 0.0,
            y0: 0.0,
            x1: 4.0,
            y1: 4.0,
        };
        assert_eq!(sample_weighted(&img, rect), Some([0, 200, 0]));
    }

    #[test]
    fn test_weighted_all_transparent_is_empty() {
        let img = checkerboard(3, 3, [9, 9, 9, 0], [7, 7, 7, 0]);
        let rect = CellRect {
            x0: 0.0,
            y0: 0.0,
            x1: 3.0,
            y1: 3.0,
        };
        assert_eq!(sample_weighted(&img, rect), None);
    }
}
