//! End-to-end detector/matcher checks on synthetic warped imagery.

use cardscan_core::{warp_perspective_gray, GrayImage, Homography};
use cardscan_orb::{match_descriptors, OrbDetector, OrbParams};
use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Mosaic of 16x16 blocks with random gray levels; block junctions give the
/// detector unique, high-contrast corners.
fn mosaic(width: usize, height: usize, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut img = GrayImage::new(width, height);
    let block = 16;
    for by in 0..height.div_ceil(block) {
        for bx in 0..width.div_ceil(block) {
            let v: u8 = rng.random_range(0..=255);
            for y in (by * block)..((by + 1) * block).min(height) {
                for x in (bx * block)..((bx + 1) * block).min(width) {
                    img.data[y * width + x] = v;
                }
            }
        }
    }
    img
}

/// Similarity transform (rotate by `angle`, scale by `scale`, about the image
/// center) mapping template coordinates into scene coordinates.
fn similarity(angle: f32, scale: f32, cx: f32, cy: f32) -> Homography {
    let (sin, cos) = angle.sin_cos();
    let (a, b) = (scale * cos, -scale * sin);
    let (c, d) = (scale * sin, scale * cos);
    Homography::from_array([
        [a as f64, b as f64, (cx - a * cx - b * cy) as f64],
        [c as f64, d as f64, (cy - c * cx - d * cy) as f64],
        [0.0, 0.0, 1.0],
    ])
}

fn match_inliers(angle: f32, scale: f32) -> (usize, usize) {
    let template = mosaic(320, 320, 42);
    let t2s = similarity(angle, scale, 160.0, 160.0);
    let s2t = t2s.inverse().expect("similarity is invertible");

    // scene pixel p samples the template at s2t * p
    let scene = warp_perspective_gray(&template.view(), s2t, 320, 320);

    let detector = OrbDetector::new(OrbParams::default());
    let (tkps, tdescs) = detector.detect_and_compute(&template.view());
    let (skps, sdescs) = detector.detect_and_compute(&scene.view());
    assert!(tkps.len() >= 50, "template too sparse: {}", tkps.len());
    assert!(skps.len() >= 50, "scene too sparse: {}", skps.len());

    let matches = match_descriptors(&tdescs, &sdescs, 0.75);

    let inliers = matches
        .iter()
        .filter(|m| {
            let t = tkps[m.template_idx];
            let s = skps[m.scene_idx];
            let p = t2s.apply(Point2::new(t.x, t.y));
            let dx = p.x - s.x;
            let dy = p.y - s.y;
            (dx * dx + dy * dy).sqrt() < 4.0
        })
        .count();
    (matches.len(), inliers)
}

#[test]
fn matches_survive_identity() {
    let (matches, inliers) = match_inliers(0.0, 1.0);
    assert!(matches >= 30, "only {matches} ratio-test matches");
    assert!(
        inliers * 2 >= matches,
        "inliers {inliers} of {matches} matches"
    );
    assert!(inliers >= 20);
}

#[test]
fn matches_survive_rotation_and_scale() {
    // the card-photo scenario: 15 degrees rotation at 0.9 scale
    let (matches, inliers) = match_inliers(15f32.to_radians(), 0.9);
    assert!(matches >= 8, "only {matches} ratio-test matches");
    assert!(inliers >= 8, "only {inliers} geometric inliers");
}

#[test]
fn matches_survive_pure_scaling() {
    let (_, inliers) = match_inliers(0.0, 0.85);
    assert!(inliers >= 8, "only {inliers} geometric inliers");
}
