//! K-means color quantization over a weighted color population.
//!
//! The population comes out of the pipeline's sampling histogram: deduplicated
//! source colors with observed frequency weights. Clustering runs either in
//! Lab space with k-means++ seeding (the quality default) or in plain RGB with
//! uniform random seeding, which reproduces the legacy chart behavior.

use crate::color::{delta_e, lab_to_rgb, rgb_to_lab};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A deduplicated source color and how often it was observed.
#[derive(Debug, Clone)]
pub struct WeightedColor {
    pub rgb: [u8; 3],
    pub lab: [f32; 3],
    pub weight: f64,
}

impl WeightedColor {
    pub fn new(rgb: [u8; 3], weight: f64) -> Self {
        Self {
            rgb,
            lab: rgb_to_lab(rgb),
            weight,
        }
    }
}

/// Color space the clustering distances are computed in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorSpaceMode {
    /// Legacy squared-Euclidean RGB clustering.
    Rgb,
    #[default]
    Lab,
}

/// Centroid seeding strategy.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Seeding {
    /// Uniform random distinct picks. Legacy behavior.
    Random,
    /// Weight- and distance-proportional seeding: spreads initial centroids
    /// apart, which converges faster and more stably than uniform picks.
    #[default]
    KMeansPlusPlus,
}

pub const MAX_ITERATIONS: usize = 30;
pub const CONVERGENCE_DELTA_E: f32 = 1.0;

#[derive(Debug, Copy, Clone)]
pub struct Quantizer {
    pub space: ColorSpaceMode,
    pub seeding: Seeding,
    pub max_iterations: usize,
}

impl Default for Quantizer {
    fn default() -> Self {
        Self {
            space: ColorSpaceMode::Lab,
            seeding: Seeding::KMeansPlusPlus,
            max_iterations: MAX_ITERATIONS,
        }
    }
}

impl Quantizer {
    /// Reduce the population to at most `k` representative RGB colors.
    ///
    /// When `k` covers every distinct input color, clustering is skipped and
    /// the deduplicated input comes back unchanged.
    pub fn quantize(
        &self,
        population: &[WeightedColor],
        k: usize,
        rng: &mut StdRng,
    ) -> Vec<[u8; 3]> {
        if population.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut distinct: Vec<[u8; 3]> = Vec::new();
        for color in population {
            if !distinct.contains(&color.rgb) {
                distinct.push(color.rgb);
            }
        }
        if distinct.len() <= k {
            return distinct;
        }

        let points: Vec<[f32; 3]> = population.iter().map(|c| self.point(c)).collect();
        let weights: Vec<f64> = population.iter().map(|c| c.weight.max(0.0)).collect();

        let mut centroids = match self.seeding {
            Seeding::Random => self.seed_random(&points, k, rng),
            Seeding::KMeansPlusPlus => self.seed_plus_plus(&points, &weights, k, rng),
        };

        let mut assignment = vec![0usize; points.len()];
        for _ in 0..self.max_iterations {
            for (i, point) in points.iter().enumerate() {
                assignment[i] = nearest_index(&centroids, *point);
            }

            let mut sums = vec![[0.0f64; 3]; centroids.len()];
            let mut totals = vec![0.0f64; centroids.len()];
            for (i, point) in points.iter().enumerate() {
                let cluster = assignment[i];
                let w = weights[i];
                for c in 0..3 {
                    sums[cluster][c] += point[c] as f64 * w;
                }
                totals[cluster] += w;
            }

            let mut max_move = 0.0f32;
            for (cluster, centroid) in centroids.iter_mut().enumerate() {
                if totals[cluster] <= 0.0 {
                    continue;
                }
                let updated = [
                    (sums[cluster][0] / totals[cluster]) as f32,
                    (sums[cluster][1] / totals[cluster]) as f32,
                    (sums[cluster][2] / totals[cluster]) as f32,
                ];
                max_move = max_move.max(distance(*centroid, updated));
                *centroid = updated;
            }

            if max_move < CONVERGENCE_DELTA_E {
                break;
            }
        }

        centroids
            .into_iter()
            .map(|p| self.point_to_rgb(p))
            .collect()
    }

    fn point(&self, color: &WeightedColor) -> [f32; 3] {
        match self.space {
            ColorSpaceMode::Rgb => [
                color.rgb[0] as f32,
                color.rgb[1] as f32,
                color.rgb[2] as f32,
            ],
            ColorSpaceMode::Lab => color.lab,
        }
    }

    fn point_to_rgb(&self, point: [f32; 3]) -> [u8; 3] {
        match self.space {
            ColorSpaceMode::Rgb => [
                point[0].clamp(0.0, 255.0).round() as u8,
                point[1].clamp(0.0, 255.0).round() as u8,
                point[2].clamp(0.0, 255.0).round() as u8,
            ],
            ColorSpaceMode::Lab => lab_to_rgb(point),
        }
    }

    fn seed_random(&self, points: &[[f32; 3]], k: usize, rng: &mut StdRng) -> Vec<[f32; 3]> {
        let mut indices: Vec<usize> = (0..points.len()).collect();
        for i in 0..k.min(indices.len()) {
            let j = rng.gen_range(i..indices.len());
            indices.swap(i, j);
        }
        indices.iter().take(k).map(|&i| points[i]).collect()
    }

    /// k-means++: the first centroid is a weight-proportional draw; each
    /// subsequent one is drawn with probability proportional to
    /// `weight * d(nearest existing centroid)^2`.
    fn seed_plus_plus(
        &self,
        points: &[[f32; 3]],
        weights: &[f64],
        k: usize,
        rng: &mut StdRng,
    ) -> Vec<[f32; 3]> {
        let mut centroids = Vec::with_capacity(k);
        let first = weighted_draw(weights, rng);
        centroids.push(points[first]);

        let mut min_dist_sq: Vec<f64> = points
            .iter()
            .map(|p| distance(*p, centroids[0]).powi(2) as f64)
            .collect();

        while centroids.len() < k {
            let scores: Vec<f64> = min_dist_sq
                .iter()
                .zip(weights)
                .map(|(d2, w)| d2 * w)
                .collect();
            let next = if scores.iter().sum::<f64>() > 0.0 {
                weighted_draw(&scores, rng)
            } else {
                // Every remaining point coincides with a centroid.
                weighted_draw(weights, rng)
            };
            let seed = points[next];
            centroids.push(seed);
            for (i, p) in points.iter().enumerate() {
                let d2 = distance(*p, seed).powi(2) as f64;
                if d2 < min_dist_sq[i] {
                    min_dist_sq[i] = d2;
                }
            }
        }

        centroids
    }
}

fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    // Euclidean in whichever space the points live in; for Lab points this
    // is exactly CIE76.
    delta_e(a, b)
}

fn nearest_index(centroids: &[[f32; 3]], point: [f32; 3]) -> usize {
    let mut best = 0;
    let mut best_d = f32::MAX;
    for (i, c) in centroids.iter().enumerate() {
        let d = distance(point, *c);
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

/// Draw an index with probability proportional to its weight.
fn weighted_draw(weights: &[f64], rng: &mut StdRng) -> usize {
    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    if total <= 0.0 {
        return rng.gen_range(0..weights.len());
    }
    let mut target = rng.gen::<f64>() * total;
    for (i, w) in weights.iter().enumerate() {
        if *w <= 0.0 {
            continue;
        }
        target -= w;
        if target <= 0.0 {
            return i;
        }
    }
    weights.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_k_covers_distinct_input() {
        let population = vec![
            WeightedColor::new([255, 0, 0], 3.0),
            WeightedColor::new([0, 255, 0], 2.0),
            WeightedColor::new([255, 0, 0], 1.0),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let out = Quantizer::default().quantize(&population, 4, &mut rng);
        assert_eq!(out, vec![[255, 0, 0], [0, 255, 0]]);
    }

    #[test]
    fn test_k_one_is_weighted_centroid() {
        let population = vec![
            WeightedColor::new([0, 0, 0], 1.0),
            WeightedColor::new([200, 0, 0], 3.0),
        ];
        let quantizer = Quantizer {
            space: ColorSpaceMode::Rgb,
            seeding: Seeding::Random,
            ..Quantizer::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let out = quantizer.quantize(&population, 1, &mut rng);
        assert_eq!(out.len(), 1);
        // (0*1 + 200*3) / 4 = 150
        assert_eq!(out[0], [150, 0, 0]);
    }

    #[test]
    fn test_red_blue_split_is_seed_independent() {
        let population = vec![
            WeightedColor::new([255, 0, 0], 10.0),
            WeightedColor::new([0, 0, 255], 10.0),
            WeightedColor::new([250, 5, 5], 2.0),
            WeightedColor::new([5, 5, 250], 2.0),
        ];
        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut out = Quantizer::default().quantize(&population, 2, &mut rng);
            out.sort_by(|a, b| b[0].cmp(&a[0]));
            assert!(out[0][0] > 200 && out[0][2] < 50, "seed {seed}: {out:?}");
            assert!(out[1][2] > 200 && out[1][0] < 50, "seed {seed}: {out:?}");
        }
    }

    #[test]
    fn test_empty_population() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Quantizer::default().quantize(&[], 4, &mut rng).is_empty());
    }
}
