use cardscan_core::{estimate_homography_ransac, warp_perspective_rgb};
use cardscan_orb::{match_descriptors, OrbDetector};
use nalgebra::Point2;

use super::{AlignError, AlignedCard, FeatureAlignParams};
use crate::convert::{gray_view, rgb_from_core, rgb_view};
use crate::template::ReferenceTemplate;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Registers a scene photo against the reference template.
///
/// Rotation, scale and moderate perspective are absorbed by the keypoint
/// matching; partial occlusion costs matches but not correctness as long as
/// `min_matches` survive.
#[derive(Debug)]
pub struct FeatureAligner {
    params: FeatureAlignParams,
    detector: OrbDetector,
}

impl FeatureAligner {
    pub fn new(params: FeatureAlignParams) -> Self {
        let detector = OrbDetector::new(params.orb);
        Self { params, detector }
    }

    #[inline]
    pub fn params(&self) -> &FeatureAlignParams {
        &self.params
    }

    /// Detector used for scene keypoints; templates must be described with
    /// an identically configured detector for distances to be meaningful.
    #[inline]
    pub fn detector(&self) -> &OrbDetector {
        &self.detector
    }

    /// Align `scene` into the template frame.
    ///
    /// On success the returned crop has exactly the template's dimensions,
    /// with the original color content warped through the estimated
    /// homography.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, scene, template), fields(width = scene.width(), height = scene.height()))
    )]
    pub fn align(
        &self,
        scene: &image::RgbImage,
        template: &ReferenceTemplate,
    ) -> Result<AlignedCard, AlignError> {
        if template.descriptors().is_empty() {
            return Err(AlignError::NoDescriptors("template"));
        }

        let scene_gray = image::imageops::grayscale(scene);
        let (scene_kps, scene_descs) = self.detector.detect_and_compute(&gray_view(&scene_gray));
        if scene_descs.is_empty() {
            return Err(AlignError::NoDescriptors("scene"));
        }

        let matches = match_descriptors(template.descriptors(), &scene_descs, self.params.ratio);
        log::debug!(
            "{} ratio-test matches from {} template / {} scene descriptors",
            matches.len(),
            template.descriptors().len(),
            scene_descs.len()
        );
        if matches.len() < self.params.min_matches {
            return Err(AlignError::NotEnoughMatches {
                found: matches.len(),
                needed: self.params.min_matches,
            });
        }

        // correspondences map scene points onto template points
        let src: Vec<Point2<f32>> = matches
            .iter()
            .map(|m| {
                let kp = scene_kps[m.scene_idx];
                Point2::new(kp.x, kp.y)
            })
            .collect();
        let dst: Vec<Point2<f32>> = matches
            .iter()
            .map(|m| {
                let kp = template.keypoints()[m.template_idx];
                Point2::new(kp.x, kp.y)
            })
            .collect();

        let (h, stats) = estimate_homography_ransac(&src, &dst, &self.params.ransac)
            .ok_or(AlignError::HomographyFailed)?;
        let h_scene_from_template = h.inverse().ok_or(AlignError::HomographyFailed)?;

        log::info!(
            "aligned card with {}/{} inliers after {} iterations",
            stats.inliers,
            stats.total,
            stats.iterations
        );

        let warped = warp_perspective_rgb(
            &rgb_view(scene),
            h_scene_from_template,
            template.width() as usize,
            template.height() as usize,
        );

        Ok(AlignedCard {
            rgb: rgb_from_core(warped),
            homography: Some(h),
            ransac: Some(stats),
        })
    }
}
