use cardscan_core::RansacHomographyConfig;
use cardscan_orb::OrbParams;
use serde::{Deserialize, Serialize};

/// Configuration for the feature-based aligner.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FeatureAlignParams {
    /// Minimal number of ratio-test matches required before estimating a
    /// transform. Below this there is not enough evidence for a reliable
    /// registration.
    pub min_matches: usize,
    /// Lowe ratio: a match is accepted only if its distance is below
    /// `ratio` times the runner-up distance.
    pub ratio: f32,
    /// Scene-side keypoint detector settings. The template is described by
    /// the same detector at load time.
    pub orb: OrbParams,
    /// Consensus homography estimation settings.
    pub ransac: RansacHomographyConfig,
}

impl Default for FeatureAlignParams {
    fn default() -> Self {
        Self {
            min_matches: 8,
            ratio: 0.75,
            orb: OrbParams::default(),
            ransac: RansacHomographyConfig::default(),
        }
    }
}

/// Configuration for the contour-based aligner.
///
/// The fractional insets cut the detected bounding rectangle down to the
/// card face, discarding background caught by the outline.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ContourAlignParams {
    /// Gaussian sigma applied before edge detection.
    pub blur_sigma: f32,
    /// Canny hysteresis thresholds.
    pub canny_low: f32,
    pub canny_high: f32,
    /// L-inf dilation radius closing gaps in the edge map.
    pub dilate_radius: u8,
    /// Kept row span of the bounding rectangle, as fractions of its height.
    pub row_start_frac: f32,
    pub row_end_frac: f32,
    /// Kept column span, as fractions of the rectangle width.
    pub col_start_frac: f32,
    pub col_end_frac: f32,
}

impl Default for ContourAlignParams {
    fn default() -> Self {
        Self {
            blur_sigma: 2.0,
            canny_low: 50.0,
            canny_high: 150.0,
            dilate_radius: 2,
            row_start_frac: 0.22,
            row_end_frac: 0.90,
            col_start_frac: 0.02,
            col_end_frac: 0.98,
        }
    }
}
