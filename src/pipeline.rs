//! Photo-to-pattern conversion: preprocess, sample, quantize, match, dither.
//!
//! The pipeline is CPU-bound and synchronous; hosts run [`convert`] on a
//! worker thread (it is a single blocking entry point that either completes
//! with a [`ConversionOutcome`] or fails with a structural error). Per-cell
//! anomalies never fail the run; a cell that cannot be sampled simply stays
//! empty fabric.

use crate::catalog::{ColorId, PaletteEntry, ThreadCatalog};
use crate::color::{delta_e, rgb_to_lab};
use crate::dither::dither_to_grid;
use crate::error::{PatternError, Result};
use crate::grid::PixelGrid;
use crate::matcher::PaletteMatcher;
use crate::preprocess::{enhance_contrast, sharpen};
use crate::quantize::{ColorSpaceMode, Quantizer, Seeding, WeightedColor};
use crate::sampler::{sample, CellRect, SamplingMethod};
use crate::source::SourceImage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Instant;

/// Conversion parameters with documented defaults.
///
/// This is the single options surface; the numeric behavior of the old
/// convert-call signatures survives only as the [`ConversionOptions::legacy`]
/// preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOptions {
    /// Output grid width in cells.
    pub grid_width: u32,
    /// Output grid height in cells.
    pub grid_height: u32,
    /// Upper bound on distinct thread colors in the result.
    pub max_colors: usize,
    /// Clustering space. Lab is the quality default.
    pub space: ColorSpaceMode,
    /// Centroid seeding. k-means++ is the quality default.
    pub seeding: Seeding,
    /// Cell sampling method. Weighted is the quality default.
    pub sampling: SamplingMethod,
    /// Enable serpentine Floyd–Steinberg dithering for the assignment pass.
    pub dither: bool,
    /// Error-diffusion strength in [0, 1]; ignored unless `dither` is set.
    pub dither_strength: f32,
    /// Contrast stretch strength 0..=100; 0 disables.
    pub contrast: u8,
    /// Unsharp mask strength 0..=100; 0 disables.
    pub sharpen: u8,
    /// Restrict matching to these catalog entries (e.g. threads on hand).
    pub restrict_palette: Option<Vec<ColorId>>,
    /// Treat sampled colors within this Delta-E of pure white as empty
    /// fabric. `None` keeps near-white cells.
    pub blank_threshold: Option<f32>,
    /// RNG seed for reproducible conversions; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            grid_width: 100,
            grid_height: 100,
            max_colors: 30,
            space: ColorSpaceMode::Lab,
            seeding: Seeding::KMeansPlusPlus,
            sampling: SamplingMethod::Weighted,
            dither: false,
            dither_strength: 0.8,
            contrast: 0,
            sharpen: 0,
            restrict_palette: None,
            blank_threshold: None,
            seed: None,
        }
    }
}

impl ConversionOptions {
    /// The pre-rework defaults: center sampling and randomly seeded RGB
    /// clustering, no dithering. Kept for charts that must reproduce old
    /// output exactly.
    pub fn legacy() -> Self {
        Self {
            max_colors: 16,
            space: ColorSpaceMode::Rgb,
            seeding: Seeding::Random,
            sampling: SamplingMethod::Center,
            dither: false,
            ..Self::default()
        }
    }
}

/// A finished conversion: the pattern grid plus the thread colors it uses,
/// ordered by cell count descending.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOutcome {
    pub grid: PixelGrid,
    pub used_colors: Vec<PaletteEntry>,
    /// Fingerprint of the source buffer and options, for host-side caching.
    pub cache_key: String,
    pub elapsed_ms: u64,
}

/// Region of the output grid actually covered by the scaled source image.
/// Cells outside it are letterbox/pillarbox fabric.
struct FittedArea {
    offset_x: u32,
    offset_y: u32,
    cells_w: u32,
    cells_h: u32,
}

fn fit_source(source: &SourceImage, grid_w: u32, grid_h: u32) -> FittedArea {
    let sx = grid_w as f32 / source.width() as f32;
    let sy = grid_h as f32 / source.height() as f32;
    let scale = sx.min(sy);
    let cells_w = ((source.width() as f32 * scale).round() as u32).clamp(1, grid_w);
    let cells_h = ((source.height() as f32 * scale).round() as u32).clamp(1, grid_h);
    FittedArea {
        offset_x: (grid_w - cells_w) / 2,
        offset_y: (grid_h - cells_h) / 2,
        cells_w,
        cells_h,
    }
}

/// Convert a photograph into a thread pattern.
pub fn convert(
    source: &SourceImage,
    catalog: &ThreadCatalog,
    options: &ConversionOptions,
) -> Result<ConversionOutcome> {
    let start = Instant::now();
    let (grid_w, grid_h) = (options.grid_width, options.grid_height);
    if grid_w == 0 || grid_h == 0 {
        return Err(PatternError::InvalidDimensions {
            width: grid_w,
            height: grid_h,
        });
    }
    if catalog.is_empty() || options.max_colors == 0 {
        return Err(PatternError::EmptyPalette);
    }

    log::info!(
        "converting {}x{} source to {}x{} grid, max {} colors, dither={}",
        source.width(),
        source.height(),
        grid_w,
        grid_h,
        options.max_colors,
        options.dither
    );

    let preprocessed;
    let work: &SourceImage = if options.contrast > 0 || options.sharpen > 0 {
        let mut img = source.clone();
        enhance_contrast(&mut img, options.contrast);
        sharpen(&mut img, options.sharpen);
        preprocessed = img;
        &preprocessed
    } else {
        source
    };

    let area = fit_source(work, grid_w, grid_h);
    let cell_w = work.width() as f32 / area.cells_w as f32;
    let cell_h = work.height() as f32 / area.cells_h as f32;
    let white_lab = rgb_to_lab([255, 255, 255]);

    // First pass: sample every output cell.
    let samples: Vec<Option<[u8; 3]>> = (0..grid_w as usize * grid_h as usize)
        .into_par_iter()
        .map(|i| {
            let gx = (i as u32) % grid_w;
            let gy = (i as u32) / grid_w;
            if gx < area.offset_x
                || gy < area.offset_y
                || gx >= area.offset_x + area.cells_w
                || gy >= area.offset_y + area.cells_h
            {
                return None;
            }
            let cx = (gx - area.offset_x) as f32;
            let cy = (gy - area.offset_y) as f32;
            let rect = CellRect {
                x0: cx * cell_w,
                y0: cy * cell_h,
                x1: (cx + 1.0) * cell_w,
                y1: (cy + 1.0) * cell_h,
            };
            let rgb = sample(work, rect, options.sampling)?;
            if let Some(threshold) = options.blank_threshold {
                if delta_e(rgb_to_lab(rgb), white_lab) < threshold {
                    return None;
                }
            }
            Some(rgb)
        })
        .collect();

    // Coarse 8-unit buckets keep the clustering input tractable; each bucket
    // contributes its mean color weighted by its population.
    let mut buckets: HashMap<u32, ([f64; 3], f64)> = HashMap::new();
    for rgb in samples.iter().flatten() {
        let key = ((rgb[0] as u32 >> 3) << 10) | ((rgb[1] as u32 >> 3) << 5) | (rgb[2] as u32 >> 3);
        let entry = buckets.entry(key).or_insert(([0.0; 3], 0.0));
        for c in 0..3 {
            entry.0[c] += rgb[c] as f64;
        }
        entry.1 += 1.0;
    }

    if buckets.is_empty() {
        // Nothing opaque to stitch; an all-fabric grid is a valid result.
        log::info!("conversion found no opaque cells; returning blank grid");
        return Ok(ConversionOutcome {
            grid: PixelGrid::new(grid_w, grid_h)?,
            used_colors: Vec::new(),
            cache_key: cache_key(source, options),
            elapsed_ms: start.elapsed().as_millis() as u64,
        });
    }

    let mut population: Vec<WeightedColor> = buckets
        .values()
        .map(|(sum, count)| {
            WeightedColor::new(
                [
                    (sum[0] / count).round() as u8,
                    (sum[1] / count).round() as u8,
                    (sum[2] / count).round() as u8,
                ],
                *count,
            )
        })
        .collect();
    // Heaviest buckets first so seeding scans are deterministic for a seed.
    population.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.rgb.cmp(&b.rgb))
    });

    let quantizer = Quantizer {
        space: options.space,
        seeding: options.seeding,
        ..Quantizer::default()
    };
    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let centroids = quantizer.quantize(&population, options.max_colors, &mut rng);

    let matcher = match &options.restrict_palette {
        Some(ids) => PaletteMatcher::new(catalog).restrict_to(ids),
        None => PaletteMatcher::new(catalog),
    };

    // Map centroids onto the catalog; distinct centroids can collapse onto
    // the same thread, so dedup while keeping first-appearance order.
    let mut used: Vec<ColorId> = Vec::new();
    for centroid in &centroids {
        if let Some(id) = matcher.nearest(*centroid) {
            if !used.contains(&id) {
                used.push(id);
            }
        }
    }
    if used.is_empty() {
        return Err(PatternError::EmptyPalette);
    }

    // Second pass: assign every sampled cell a color from the used set.
    let grid = if options.dither {
        dither_to_grid(
            &samples,
            grid_w,
            grid_h,
            catalog,
            &used,
            options.dither_strength,
        )?
    } else {
        let used_matcher = PaletteMatcher::new(catalog).restrict_to(&used);
        let assigned: Vec<Option<ColorId>> = samples
            .par_iter()
            .map(|cell| cell.and_then(|rgb| used_matcher.nearest(rgb)))
            .collect();
        let mut grid = PixelGrid::new(grid_w, grid_h)?;
        for (i, id) in assigned.into_iter().enumerate() {
            let x = (i as u32 % grid_w) as i32;
            let y = (i as u32 / grid_w) as i32;
            grid.set(x, y, id);
        }
        grid
    };

    let used_colors: Vec<PaletteEntry> = grid
        .color_usage()
        .into_iter()
        .filter_map(|(id, _)| catalog.entry(id).cloned())
        .collect();

    let elapsed_ms = start.elapsed().as_millis() as u64;
    log::info!(
        "conversion finished: {} cells, {} colors, {}ms",
        grid.cells().iter().filter(|c| c.is_some()).count(),
        used_colors.len(),
        elapsed_ms
    );

    Ok(ConversionOutcome {
        grid,
        used_colors,
        cache_key: cache_key(source, options),
        elapsed_ms,
    })
}

fn cache_key(source: &SourceImage, options: &ConversionOptions) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.width().to_le_bytes());
    hasher.update(source.height().to_le_bytes());
    hasher.update(source.rgba());
    if let Ok(opts) = serde_json::to_vec(options) {
        hasher.update(&opts);
    }
    format!("{:x}", hasher.finalize())
}
