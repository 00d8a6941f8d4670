//! sRGB/Lab conversion and the perceptual distance metric.
//!
//! Delta-E here is CIE76: plain Euclidean distance in Lab space. The later
//! CIE94/CIEDE2000 formulations are more accurate near saturated blues, but
//! CIE76 is fast, monotonic, and entirely adequate for ranking ~400 thread
//! colors against a sampled cell. Callers relying on exact tie behavior in
//! the matcher depend on this metric staying CIE76.

use palette::{white_point::D65, FromColor, Lab, Srgb};

/// Convert an 8-bit sRGB triple to Lab (D65).
pub fn rgb_to_lab(rgb: [u8; 3]) -> [f32; 3] {
    let srgb = Srgb::new(
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
    );
    let lab = Lab::<D65, f32>::from_color(srgb);
    [lab.l, lab.a, lab.b]
}

/// Convert Lab (D65) back to 8-bit sRGB, clamping out-of-gamut components.
pub fn lab_to_rgb(lab: [f32; 3]) -> [u8; 3] {
    let srgb = Srgb::from_color(Lab::<D65, f32>::new(lab[0], lab[1], lab[2]));
    [
        (srgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
        (srgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
        (srgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
    ]
}

/// CIE76 Delta-E: Euclidean distance between two Lab colors.
pub fn delta_e(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dl = a[0] - b[0];
    let da = a[1] - b[1];
    let db = a[2] - b[2];
    (dl * dl + da * da + db * db).sqrt()
}

/// Rec. 601 luminance of an 8-bit sRGB triple, in [0, 255].
pub fn luminance(rgb: [u8; 3]) -> f32 {
    0.299 * rgb[0] as f32 + 0.587 * rgb[1] as f32 + 0.114 * rgb[2] as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_and_black_references() {
        let white = rgb_to_lab([255, 255, 255]);
        assert!((white[0] - 100.0).abs() < 0.1);
        assert!(white[1].abs() < 0.1);
        assert!(white[2].abs() < 0.1);

        let black = rgb_to_lab([0, 0, 0]);
        assert!(black[0].abs() < 0.1);
        assert!(black[1].abs() < 0.1);
        assert!(black[2].abs() < 0.1);
    }

    #[test]
    fn test_round_trip() {
        for rgb in [[255, 0, 0], [0, 255, 0], [0, 0, 255], [128, 64, 200]] {
            let back = lab_to_rgb(rgb_to_lab(rgb));
            for c in 0..3 {
                assert!(
                    (back[c] as i16 - rgb[c] as i16).abs() <= 1,
                    "round trip drifted for {:?} -> {:?}",
                    rgb,
                    back
                );
            }
        }
    }

    #[test]
    fn test_delta_e_identity_and_symmetry() {
        let a = rgb_to_lab([200, 30, 90]);
        let b = rgb_to_lab([10, 220, 45]);
        assert_eq!(delta_e(a, a), 0.0);
        assert_eq!(delta_e(a, b), delta_e(b, a));
        assert!(delta_e(a, b) > 0.0);
    }
}
