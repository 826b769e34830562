use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::homography::{estimate_homography_dlt, homography_from_quad, Homography};

/// Configuration for consensus-sampling homography estimation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RansacHomographyConfig {
    /// Hard cap on sampling iterations; estimation never retries beyond it.
    pub max_iterations: usize,
    /// Reprojection error (pixels, in the destination frame) below which a
    /// correspondence counts as an inlier.
    pub inlier_threshold: f32,
    /// Minimal consensus size required to accept the best model.
    pub min_inliers: usize,
    /// Seed for the sampler. Fixed by default so repeated runs on the same
    /// input produce the same transform; override to randomize.
    pub seed: u64,
}

impl Default for RansacHomographyConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            inlier_threshold: 5.0,
            min_inliers: 4,
            seed: 0x5ca4d,
        }
    }
}

/// Outcome statistics of a consensus estimation run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RansacStats {
    /// Iterations actually executed (early exit on full consensus).
    pub iterations: usize,
    /// Inlier count of the accepted model.
    pub inliers: usize,
    /// Total number of input correspondences.
    pub total: usize,
}

fn reprojection_error(h: &Homography, src: Point2<f32>, dst: Point2<f32>) -> f32 {
    let p = h.apply(src);
    let dx = p.x - dst.x;
    let dy = p.y - dst.y;
    (dx * dx + dy * dy).sqrt()
}

fn inlier_indices(
    h: &Homography,
    src: &[Point2<f32>],
    dst: &[Point2<f32>],
    threshold: f32,
) -> Vec<usize> {
    (0..src.len())
        .filter(|&i| reprojection_error(h, src[i], dst[i]) < threshold)
        .collect()
}

fn sample_quad(rng: &mut StdRng, n: usize) -> [usize; 4] {
    let mut picked = [0usize; 4];
    let mut count = 0;
    while count < 4 {
        let candidate = rng.random_range(0..n);
        if !picked[..count].contains(&candidate) {
            picked[count] = candidate;
            count += 1;
        }
    }
    picked
}

/// Estimate `dst ~ H * src` from correspondences containing outliers.
///
/// Repeatedly fits exact homographies from random minimal subsets, scores
/// each by inlier count under `inlier_threshold`, then refits the best
/// consensus set with the least-squares DLT. Returns `None` when no sampled
/// model reaches `min_inliers` or every candidate is degenerate.
pub fn estimate_homography_ransac(
    src: &[Point2<f32>],
    dst: &[Point2<f32>],
    cfg: &RansacHomographyConfig,
) -> Option<(Homography, RansacStats)> {
    let n = src.len();
    if n != dst.len() || n < 4 {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut best: Option<(Homography, Vec<usize>)> = None;
    let mut iterations = 0;

    for _ in 0..cfg.max_iterations {
        iterations += 1;

        let idx = sample_quad(&mut rng, n);
        let s = [src[idx[0]], src[idx[1]], src[idx[2]], src[idx[3]]];
        let d = [dst[idx[0]], dst[idx[1]], dst[idx[2]], dst[idx[3]]];

        let Some(h) = homography_from_quad(&s, &d) else {
            continue;
        };

        let inliers = inlier_indices(&h, src, dst, cfg.inlier_threshold);
        let is_better = best
            .as_ref()
            .map(|(_, prev)| inliers.len() > prev.len())
            .unwrap_or(true);
        if is_better {
            let full_consensus = inliers.len() == n;
            best = Some((h, inliers));
            if full_consensus {
                break;
            }
        }
    }

    let (minimal_fit, consensus) = best?;
    if consensus.len() < cfg.min_inliers.max(4) {
        log::debug!(
            "consensus too small: {} of {} correspondences",
            consensus.len(),
            n
        );
        return None;
    }

    // Refit over the whole consensus set; the minimal-sample model remains
    // the fallback when the refit degenerates.
    let src_in: Vec<Point2<f32>> = consensus.iter().map(|&i| src[i]).collect();
    let dst_in: Vec<Point2<f32>> = consensus.iter().map(|&i| dst[i]).collect();
    let refined = estimate_homography_dlt(&src_in, &dst_in).unwrap_or(minimal_fit);
    if refined.is_degenerate() || refined.inverse().is_none() {
        return None;
    }

    let inliers = inlier_indices(&refined, src, dst, cfg.inlier_threshold).len();
    log::debug!("homography consensus: {inliers}/{n} inliers after {iterations} iterations");

    Some((
        refined,
        RansacStats {
            iterations,
            inliers,
            total: n,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    fn grid_points() -> Vec<Point2<f32>> {
        (0..6)
            .flat_map(|y| (0..6).map(move |x| Point2::new(20.0 + x as f32 * 50.0, 15.0 + y as f32 * 40.0)))
            .collect()
    }

    fn truth() -> Homography {
        Homography::new(Matrix3::new(
            0.9, 0.12, 30.0, //
            -0.08, 1.05, 12.0, //
            0.0004, -0.0002, 1.0,
        ))
    }

    #[test]
    fn recovers_transform_despite_outliers() {
        let src = grid_points();
        let mut dst: Vec<Point2<f32>> = src.iter().map(|&p| truth().apply(p)).collect();
        // plant gross outliers
        for (i, p) in dst.iter_mut().enumerate().take(8) {
            p.x += 150.0 + i as f32 * 31.0;
            p.y -= 90.0;
        }

        let cfg = RansacHomographyConfig::default();
        let (h, stats) = estimate_homography_ransac(&src, &dst, &cfg).expect("consensus");

        assert!(stats.inliers >= src.len() - 8);
        for &p in &src[8..] {
            let err = {
                let q = h.apply(p);
                let t = truth().apply(p);
                ((q.x - t.x).powi(2) + (q.y - t.y).powi(2)).sqrt()
            };
            assert!(err < 0.5, "reprojection error {err} too large");
        }
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let src = grid_points();
        let mut dst: Vec<Point2<f32>> = src.iter().map(|&p| truth().apply(p)).collect();
        dst[0].x += 300.0;
        dst[1].y += 280.0;

        let cfg = RansacHomographyConfig::default();
        let (h1, s1) = estimate_homography_ransac(&src, &dst, &cfg).expect("first run");
        let (h2, s2) = estimate_homography_ransac(&src, &dst, &cfg).expect("second run");
        assert_eq!(h1.to_array(), h2.to_array());
        assert_eq!(s1.inliers, s2.inliers);
        assert_eq!(s1.iterations, s2.iterations);
    }

    #[test]
    fn too_few_correspondences_fail() {
        let src = vec![Point2::new(0.0_f32, 0.0); 3];
        let dst = src.clone();
        assert!(estimate_homography_ransac(&src, &dst, &RansacHomographyConfig::default()).is_none());
    }

    #[test]
    fn pure_noise_fails_min_inliers() {
        // a pseudo-random scatter with no consistent projective relation
        let mut state = 0x9e3779b97f4a7c15u64;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state % 1000) as f32
        };
        let src: Vec<Point2<f32>> = (0..24).map(|_| Point2::new(next(), next())).collect();
        let dst: Vec<Point2<f32>> = (0..24).map(|_| Point2::new(next(), next())).collect();

        let cfg = RansacHomographyConfig {
            min_inliers: 12,
            ..Default::default()
        };
        assert!(estimate_homography_ransac(&src, &dst, &cfg).is_none());
    }

    #[test]
    fn iteration_cap_is_respected() {
        let src = grid_points();
        let dst: Vec<Point2<f32>> = src.iter().map(|&p| truth().apply(p)).collect();
        let cfg = RansacHomographyConfig {
            max_iterations: 3,
            ..Default::default()
        };
        let (_, stats) = estimate_homography_ransac(&src, &dst, &cfg).expect("clean input");
        assert!(stats.iterations <= 3);
    }
}
