use cardscan_core::GrayImageView;
use serde::{Deserialize, Serialize};

use crate::descriptor::{describe, orientation, Descriptor, IntegralImage, EDGE_MARGIN};
use crate::fast;
use crate::pyramid::build_pyramid;

/// A detected keypoint in level-0 (input image) pixel coordinates.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Pyramid scale the keypoint was detected at (1.0 = finest level).
    pub scale: f32,
    /// Patch orientation in radians.
    pub angle: f32,
    /// FAST corner response; larger is stronger.
    pub response: f32,
}

/// Configuration for the keypoint detector.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct OrbParams {
    /// Number of pyramid levels to search.
    pub n_levels: usize,
    /// Downsampling factor between consecutive levels.
    pub scale_factor: f32,
    /// FAST segment-test contrast threshold.
    pub fast_threshold: u8,
    /// Keep at most this many keypoints, strongest first.
    pub max_keypoints: usize,
}

impl Default for OrbParams {
    fn default() -> Self {
        Self {
            n_levels: 4,
            scale_factor: 1.2,
            fast_threshold: 20,
            max_keypoints: 1500,
        }
    }
}

/// Keypoint detector + descriptor extractor.
#[derive(Debug)]
pub struct OrbDetector {
    params: OrbParams,
}

impl OrbDetector {
    pub fn new(params: OrbParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &OrbParams {
        &self.params
    }

    /// Detect keypoints and compute their descriptors.
    ///
    /// Returns parallel vectors. Images too small to fit a descriptor patch
    /// inside the border margin produce empty output; so do featureless
    /// (flat) images.
    pub fn detect_and_compute(&self, img: &GrayImageView<'_>) -> (Vec<Keypoint>, Vec<Descriptor>) {
        let pyramid = build_pyramid(img, self.params.n_levels, self.params.scale_factor);

        let mut keypoints = Vec::new();
        let mut descriptors = Vec::new();

        for level in &pyramid.levels {
            let view = level.image.view();
            if view.width <= 2 * EDGE_MARGIN || view.height <= 2 * EDGE_MARGIN {
                continue;
            }

            let corners = fast::detect_corners(&view, self.params.fast_threshold, EDGE_MARGIN);
            if corners.is_empty() {
                continue;
            }
            let integral = IntegralImage::new(&view);

            for c in corners {
                let angle = orientation(&view, c.x, c.y);
                let desc = describe(&integral, c.x as i32, c.y as i32, angle);
                keypoints.push(Keypoint {
                    x: (c.x as f32 + 0.5) * level.scale - 0.5,
                    y: (c.y as f32 + 0.5) * level.scale - 0.5,
                    scale: level.scale,
                    angle,
                    response: c.response,
                });
                descriptors.push(desc);
            }
        }

        if keypoints.len() > self.params.max_keypoints {
            let mut order: Vec<usize> = (0..keypoints.len()).collect();
            order.sort_by(|&a, &b| {
                keypoints[b]
                    .response
                    .partial_cmp(&keypoints[a].response)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            order.truncate(self.params.max_keypoints);
            keypoints = order.iter().map(|&i| keypoints[i]).collect();
            descriptors = order.iter().map(|&i| descriptors[i]).collect();
        }

        log::debug!(
            "detected {} keypoints over {} pyramid levels",
            keypoints.len(),
            pyramid.levels.len()
        );
        (keypoints, descriptors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardscan_core::GrayImage;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn block_pattern(width: usize, height: usize, seed: u64) -> GrayImage {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut img = GrayImage::new(width, height);
        let block = 16;
        for by in 0..height.div_ceil(block) {
            for bx in 0..width.div_ceil(block) {
                let v: u8 = if rng.random_range(0..2) == 0 { 30 } else { 225 };
                for y in (by * block)..((by + 1) * block).min(height) {
                    for x in (bx * block)..((bx + 1) * block).min(width) {
                        img.data[y * width + x] = v;
                    }
                }
            }
        }
        img
    }

    #[test]
    fn textured_image_yields_keypoints_and_descriptors() {
        let img = block_pattern(256, 192, 11);
        let detector = OrbDetector::new(OrbParams::default());
        let (kps, descs) = detector.detect_and_compute(&img.view());
        assert_eq!(kps.len(), descs.len());
        assert!(kps.len() >= 20, "only {} keypoints found", kps.len());
        for kp in &kps {
            assert!(kp.x >= 0.0 && kp.x < 256.0);
            assert!(kp.y >= 0.0 && kp.y < 192.0);
        }
    }

    #[test]
    fn blank_image_yields_nothing() {
        let img = GrayImage {
            width: 256,
            height: 192,
            data: vec![255; 256 * 192],
        };
        let detector = OrbDetector::new(OrbParams::default());
        let (kps, descs) = detector.detect_and_compute(&img.view());
        assert!(kps.is_empty());
        assert!(descs.is_empty());
    }

    #[test]
    fn undersized_image_yields_nothing() {
        let img = block_pattern(40, 30, 3);
        let detector = OrbDetector::new(OrbParams::default());
        let (kps, _) = detector.detect_and_compute(&img.view());
        assert!(kps.is_empty());
    }

    #[test]
    fn keypoint_cap_keeps_the_strongest() {
        let img = block_pattern(320, 240, 5);
        let params = OrbParams {
            max_keypoints: 10,
            ..Default::default()
        };
        let (kps, descs) = OrbDetector::new(params).detect_and_compute(&img.view());
        assert!(kps.len() <= 10);
        assert_eq!(kps.len(), descs.len());
        for pair in kps.windows(2) {
            assert!(pair[0].response >= pair[1].response);
        }
    }
}
