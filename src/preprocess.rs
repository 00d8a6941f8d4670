//! Optional source-image filters applied before sampling.
//!
//! Order is fixed: contrast first, then sharpen. Both operate in place on the
//! RGBA buffer and leave transparent pixels untouched.

use crate::color::luminance;
use crate::source::{SourceImage, OPAQUE_ALPHA};

/// Linear contrast stretch around the midpoint of the observed luminance
/// range. `strength` is 0..=100; 0 is a no-op. The scale factor is
/// `1 + strength / 50`, so 100 doubles the spread around the midpoint.
pub fn enhance_contrast(img: &mut SourceImage, strength: u8) {
    if strength == 0 {
        return;
    }
    let strength = strength.min(100);

    let mut min_lum = f32::MAX;
    let mut max_lum = f32::MIN;
    for y in 0..img.height() {
        for x in 0..img.width() {
            let p = img.pixel(x, y);
            if p[3] < OPAQUE_ALPHA {
                continue;
            }
            let lum = luminance([p[0], p[1], p[2]]);
            min_lum = min_lum.min(lum);
            max_lum = max_lum.max(lum);
        }
    }
    if min_lum > max_lum {
        // No opaque pixels at all.
        return;
    }

    let mid = (min_lum + max_lum) * 0.5;
    let factor = 1.0 + strength as f32 / 50.0;

    for y in 0..img.height() {
        for x in 0..img.width() {
            let p = img.pixel(x, y);
            if p[3] < OPAQUE_ALPHA {
                continue;
            }
            let stretch = |v: u8| (mid + (v as f32 - mid) * factor).clamp(0.0, 255.0) as u8;
            img.set_pixel(x, y, [stretch(p[0]), stretch(p[1]), stretch(p[2])]);
        }
    }
}

/// Unsharp mask built on the 4-neighbor discrete Laplacian,
/// `amount = strength / 100` per channel. The 1-pixel border and transparent
/// pixels are skipped; a transparent neighbor contributes the center value so
/// edges against fabric don't halo.
pub fn sharpen(img: &mut SourceImage, strength: u8) {
    if strength == 0 || img.width() < 3 || img.height() < 3 {
        return;
    }
    let amount = strength.min(100) as f32 / 100.0;
    let original = img.clone();

    for y in 1..img.height() - 1 {
        for x in 1..img.width() - 1 {
            let center = original.pixel(x, y);
            if center[3] < OPAQUE_ALPHA {
                continue;
            }

            let neighbor = |nx: u32, ny: u32, c: usize| -> f32 {
                let p = original.pixel(nx, ny);
                if p[3] < OPAQUE_ALPHA {
                    center[c] as f32
                } else {
                    p[c] as f32
                }
            };

            let mut out = [0u8; 3];
            for c in 0..3 {
                let laplacian = 4.0 * center[c] as f32
                    - neighbor(x - 1, y, c)
                    - neighbor(x + 1, y, c)
                    - neighbor(x, y - 1, c)
                    - neighbor(x, y + 1, c);
                out[c] = (center[c] as f32 + amount * laplacian).clamp(0.0, 255.0) as u8;
            }
            img.set_pixel(x, y, out);
        }
    }
}
