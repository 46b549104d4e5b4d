//! K-means clustering of sampled pixels into representative colors.
//!
//! The default clusterer works directly in 8-bit RGB with a fixed iteration
//! budget, so its runtime depends only on the sample count and `k`. Seeds are
//! drawn from the samples with replacement and a cluster that receives no
//! samples keeps its previous centroid; it is never re-seeded.
//!
//! [`cluster_lab`] is an alternative backend that clusters in CIE Lab with
//! `kmeans_colors`, for callers that prefer perceptual grouping.

use kmeans_colors::get_kmeans;
use palette::{IntoColor, Lab, Srgb};
use rand::Rng;

use crate::color::Color;
use crate::error::{PaletteError, Result};
use crate::sampler::Pixel;

/// Number of assignment/update rounds. There is no early exit.
pub const ITERATIONS: usize = 10;

/// Cluster `samples` into exactly `k` colors using [`ITERATIONS`] rounds.
pub fn cluster<R: Rng>(samples: &[Pixel], k: usize, rng: &mut R) -> Result<Vec<Color>> {
    cluster_with_iterations(samples, k, ITERATIONS, rng)
}

pub fn cluster_with_iterations<R: Rng>(
    samples: &[Pixel],
    k: usize,
    iterations: usize,
    rng: &mut R,
) -> Result<Vec<Color>> {
    let mut centroids = seed_centroids(samples, k, rng)?;
    refine(samples, &mut centroids, iterations);

    tracing::debug!(samples = samples.len(), k, iterations, "Clustered samples");
    Ok(centroids
        .iter()
        .map(|c| Color::from_rgb(c.red, c.green, c.blue))
        .collect())
}

/// Draw `k` seeds uniformly from `samples`, with replacement.
pub fn seed_centroids<R: Rng>(samples: &[Pixel], k: usize, rng: &mut R) -> Result<Vec<Pixel>> {
    if samples.is_empty() {
        return Err(PaletteError::InsufficientData);
    }
    Ok((0..k)
        .map(|_| samples[rng.random_range(0..samples.len())])
        .collect())
}

/// Run `iterations` full rounds starting from `centroids`.
pub fn refine(samples: &[Pixel], centroids: &mut [Pixel], iterations: usize) {
    for iteration in 0..iterations {
        let empty = step(samples, centroids);
        tracing::trace!(iteration, empty, "k-means round");
    }
}

/// One assignment and update round. Returns the number of empty clusters.
pub fn step(samples: &[Pixel], centroids: &mut [Pixel]) -> usize {
    let mut sums = vec![[0u64; 3]; centroids.len()];
    let mut counts = vec![0u64; centroids.len()];

    for pixel in samples {
        let idx = nearest(pixel, centroids);
        sums[idx][0] += u64::from(pixel.red);
        sums[idx][1] += u64::from(pixel.green);
        sums[idx][2] += u64::from(pixel.blue);
        counts[idx] += 1;
    }

    let mut empty = 0;
    for ((centroid, sum), &count) in centroids.iter_mut().zip(&sums).zip(&counts) {
        if count == 0 {
            // left where it was
            empty += 1;
            continue;
        }
        *centroid = Srgb::new(
            rounded_mean(sum[0], count),
            rounded_mean(sum[1], count),
            rounded_mean(sum[2], count),
        );
    }
    empty
}

/// Index of the closest centroid; the lowest index wins ties.
fn nearest(pixel: &Pixel, centroids: &[Pixel]) -> usize {
    let mut best_idx = 0;
    let mut best_dist = u32::MAX;
    for (idx, c) in centroids.iter().enumerate() {
        let dr = i32::from(pixel.red) - i32::from(c.red);
        let dg = i32::from(pixel.green) - i32::from(c.green);
        let db = i32::from(pixel.blue) - i32::from(c.blue);
        let dist = (dr * dr + dg * dg + db * db) as u32;
        if dist < best_dist {
            best_dist = dist;
            best_idx = idx;
        }
    }
    best_idx
}

/// `sum / count` rounded half up.
fn rounded_mean(sum: u64, count: u64) -> u8 {
    ((2 * sum + count) / (2 * count)) as u8
}

/// Cluster `pixels` in CIE Lab with `kmeans_colors`.
///
/// Unlike [`cluster`] this converges on a tolerance (at most 20 rounds) and
/// uses k-means++ seeding driven by `seed`. `kmeans_colors` drops centroids
/// when there are fewer distinct colors than `k`; the ones it returns are
/// then repeated in order until there are exactly `k`.
pub fn cluster_lab(pixels: &[Pixel], k: usize, seed: u64) -> Result<Vec<Color>> {
    if pixels.is_empty() {
        return Err(PaletteError::InsufficientData);
    }
    if k == 0 {
        return Ok(Vec::new());
    }

    let mut lab_pixels: Vec<Lab> = Vec::with_capacity(pixels.len());
    for &pixel in pixels {
        lab_pixels.push(pixel.into_linear().into_color());
    }

    let kmeans = get_kmeans(k, 20, 1e-4, false, &lab_pixels, seed);
    let found: Vec<Color> = kmeans
        .centroids
        .iter()
        .map(|&lab| {
            let rgb_f32: Srgb<f32> = Srgb::from_linear(lab.into_color());
            let c: Srgb<u8> = rgb_f32.into_format::<u8>();
            Color::from_rgb(c.red, c.green, c.blue)
        })
        .collect();
    if found.is_empty() {
        return Err(PaletteError::InsufficientData);
    }
    tracing::debug!(pixels = pixels.len(), k, found = found.len(), "Clustered pixels in Lab");

    Ok(found.iter().copied().cycle().take(k).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn px(r: u8, g: u8, b: u8) -> Pixel {
        Srgb::new(r, g, b)
    }

    fn hue_distance(a: u16, b: u16) -> u16 {
        let d = a.abs_diff(b);
        d.min(360 - d)
    }

    #[test]
    fn returns_exactly_k_colors() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples: Vec<Pixel> = (0..50u8).map(|i| px(i * 5, 255 - i * 3, i)).collect();
        for k in 1..=10 {
            assert_eq!(cluster(&samples, k, &mut rng).unwrap().len(), k);
        }
    }

    #[test]
    fn more_clusters_than_samples_duplicates_points() {
        let mut rng = StdRng::seed_from_u64(1);
        let colors = cluster(&[px(255, 0, 0)], 4, &mut rng).unwrap();
        assert_eq!(colors, vec![Color::new(0, 100, 50); 4]);
    }

    #[test]
    fn empty_samples_are_insufficient() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(cluster(&[], 3, &mut rng), Err(PaletteError::InsufficientData)));
    }

    #[test]
    fn same_seed_same_palette() {
        let samples: Vec<Pixel> = (0..200u32)
            .map(|i| px((i * 37 % 256) as u8, (i * 91 % 256) as u8, (i * 13 % 256) as u8))
            .collect();
        let a = cluster(&samples, 5, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = cluster(&samples, 5, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn centroids_move_to_rounded_means() {
        let samples = vec![
            px(250, 0, 0),
            px(252, 0, 0),
            px(254, 0, 0),
            px(255, 0, 0),
            px(0, 0, 200),
            px(0, 0, 210),
        ];
        let mut centroids = vec![px(250, 0, 0), px(0, 0, 200)];
        refine(&samples, &mut centroids, ITERATIONS);
        // 1011 / 4 = 252.75
        assert_eq!(centroids, vec![px(253, 0, 0), px(0, 0, 205)]);
    }

    #[test]
    fn ties_go_to_lowest_index() {
        let mut centroids = vec![px(90, 100, 100), px(110, 100, 100)];
        let empty = step(&[px(100, 100, 100)], &mut centroids);
        assert_eq!(empty, 1);
        assert_eq!(centroids, vec![px(100, 100, 100), px(110, 100, 100)]);
    }

    // Empty clusters are not re-seeded: a centroid that wins no samples stays
    // exactly where it was for the whole run.
    #[test]
    fn empty_cluster_keeps_previous_centroid() {
        let samples = vec![px(10, 10, 10), px(12, 12, 12), px(240, 240, 240)];
        let mut centroids = vec![px(10, 10, 10), px(0, 255, 0), px(240, 240, 240)];
        refine(&samples, &mut centroids, ITERATIONS);
        assert_eq!(centroids, vec![px(11, 11, 11), px(0, 255, 0), px(240, 240, 240)]);

        let mut duplicated = vec![px(10, 10, 10), px(10, 10, 10)];
        assert_eq!(step(&samples, &mut duplicated), 1);
        assert_eq!(duplicated[1], px(10, 10, 10));
    }

    #[test]
    fn lab_backend_separates_distinct_colors() {
        let mut pixels = vec![px(255, 0, 0); 50];
        pixels.extend(vec![px(0, 0, 255); 50]);

        let colors = cluster_lab(&pixels, 2, 0).unwrap();
        assert_eq!(colors.len(), 2);
        assert!(colors.iter().any(|c| hue_distance(c.hue(), 0) <= 3));
        assert!(colors.iter().any(|c| hue_distance(c.hue(), 240) <= 3));
    }

    #[test]
    fn lab_backend_fills_k_from_a_solid_color() {
        let colors = cluster_lab(&[px(0, 128, 0); 16], 5, 4).unwrap();
        assert_eq!(colors.len(), 5);
        assert!(colors.iter().all(|c| *c == colors[0]));
        assert!(hue_distance(colors[0].hue(), 120) <= 3);
    }

    #[test]
    fn lab_backend_repeats_centroids_when_colors_run_out() {
        let colors = cluster_lab(&[px(255, 0, 0), px(0, 0, 255)], 5, 1).unwrap();
        assert_eq!(colors.len(), 5);
        assert!(colors.iter().all(|c| {
            hue_distance(c.hue(), 0) <= 3 || hue_distance(c.hue(), 240) <= 3
        }));
    }

    #[test]
    fn lab_backend_needs_pixels() {
        assert!(matches!(cluster_lab(&[], 2, 0), Err(PaletteError::InsufficientData)));
    }
}
