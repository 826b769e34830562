use std::path::{Path, PathBuf};

use cardscan_orb::{Descriptor, Keypoint, OrbDetector};

use crate::convert::gray_view;

/// Errors raised while loading the reference template asset.
#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    /// The configured template file does not exist. This is a configuration
    /// problem and is reported before any scene image is touched.
    #[error("reference template not found at {path}")]
    Missing { path: PathBuf },
    #[error("failed to decode reference template: {0}")]
    Decode(#[from] image::ImageError),
}

/// The canonical card layout image, loaded once per process.
///
/// Keypoints and descriptors are computed at construction and reused for
/// every aligned scene, so repeated extractions only pay for scene-side
/// detection.
#[derive(Debug)]
pub struct ReferenceTemplate {
    rgb: image::RgbImage,
    gray: image::GrayImage,
    keypoints: Vec<Keypoint>,
    descriptors: Vec<Descriptor>,
}

impl ReferenceTemplate {
    /// Load the template from an image file on disk.
    pub fn load(path: impl AsRef<Path>, detector: &OrbDetector) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TemplateError::Missing {
                path: path.to_path_buf(),
            });
        }
        let img = image::open(path)?;
        log::info!(
            "loaded reference template {} ({}x{})",
            path.display(),
            img.width(),
            img.height()
        );
        Ok(Self::from_rgb(img.to_rgb8(), detector))
    }

    /// Decode the template from an in-memory byte buffer.
    pub fn from_bytes(bytes: &[u8], detector: &OrbDetector) -> Result<Self, TemplateError> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_rgb(img.to_rgb8(), detector))
    }

    /// Build a template from an already-decoded image.
    pub fn from_rgb(rgb: image::RgbImage, detector: &OrbDetector) -> Self {
        let gray = image::imageops::grayscale(&rgb);
        let (keypoints, descriptors) = detector.detect_and_compute(&gray_view(&gray));
        log::debug!("template has {} keypoints", keypoints.len());
        Self {
            rgb,
            gray,
            keypoints,
            descriptors,
        }
    }

    #[inline]
    pub fn rgb(&self) -> &image::RgbImage {
        &self.rgb
    }

    #[inline]
    pub fn gray(&self) -> &image::GrayImage {
        &self.gray
    }

    #[inline]
    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    #[inline]
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.rgb.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardscan_orb::OrbParams;

    #[test]
    fn missing_file_is_a_config_error_not_a_panic() {
        let detector = OrbDetector::new(OrbParams::default());
        let err = ReferenceTemplate::load("/nonexistent/template.png", &detector)
            .expect_err("should fail");
        assert!(matches!(err, TemplateError::Missing { .. }));
        assert!(err.to_string().contains("/nonexistent/template.png"));
    }

    #[test]
    fn from_rgb_caches_keypoints() {
        let rgb = crate::testutil::mosaic_rgb(160, 120, 9);
        let detector = OrbDetector::new(OrbParams::default());
        let template = ReferenceTemplate::from_rgb(rgb, &detector);
        assert_eq!(template.keypoints().len(), template.descriptors().len());
        assert!(!template.keypoints().is_empty());
        assert_eq!(template.width(), 160);
        assert_eq!(template.height(), 120);
    }
}
