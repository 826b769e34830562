use cardscan_core::{Homography, RansacStats};

/// A registered card crop, still in aligner-native dimensions.
///
/// The feature-based aligner produces a crop matching the template's pixel
/// size together with the scene-to-template homography; the contour-based
/// aligner produces a plain axis-aligned crop, so `homography` is `None`.
/// Canonical resizing happens downstream in the extractor.
#[derive(Clone, Debug)]
pub struct AlignedCard {
    pub rgb: image::RgbImage,
    pub homography: Option<Homography>,
    pub ransac: Option<RansacStats>,
}
