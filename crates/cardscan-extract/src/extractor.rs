use cardscan_core::{Homography, RansacStats};
use serde::{Deserialize, Serialize};

use crate::aligner::{AlignError, AlignedCard, ContourAligner, FeatureAligner};
use crate::aligner::{ContourAlignParams, FeatureAlignParams};
use crate::clean::{clean_zone, CleanParams};
use crate::ocr::TextRecognizer;
use crate::postprocess::postprocess;
use crate::template::{ReferenceTemplate, TemplateError};
use crate::zone::{FieldKind, ZoneSet};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Which registration strategy the extractor runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignStrategy {
    /// Keypoint matching against the reference template (robust default).
    Feature,
    /// Largest-outline crop; template-free but assumes an axis-aligned card.
    Contour,
}

/// Full extractor configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractorParams {
    pub strategy: AlignStrategy,
    pub feature: FeatureAlignParams,
    pub contour: ContourAlignParams,
    pub zones: ZoneSet,
    pub clean: CleanParams,
}

impl Default for ExtractorParams {
    fn default() -> Self {
        Self {
            strategy: AlignStrategy::Feature,
            feature: FeatureAlignParams::default(),
            contour: ContourAlignParams::default(),
            zones: ZoneSet::default(),
            clean: CleanParams::default(),
        }
    }
}

/// Errors that abort an extraction.
///
/// Per-field OCR trouble does not appear here: it degrades that field to
/// "not detected" while the remaining fields continue.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("card detection failed: {0}")]
    Alignment(#[from] AlignError),
}

/// One extracted field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldResult {
    pub label: String,
    pub kind: FieldKind,
    /// Recognized, post-processed text; `None` means not detected.
    pub text: Option<String>,
}

/// Outcome of a successful extraction run. Built fresh per image; nothing
/// here persists beyond the request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub fields: Vec<FieldResult>,
    /// Scene-to-template transform, when the feature aligner ran.
    pub homography: Option<Homography>,
    /// Consensus statistics, when the feature aligner ran.
    pub ransac: Option<RansacStats>,
}

impl ExtractionResult {
    pub fn field(&self, label: &str) -> Option<&FieldResult> {
        self.fields.iter().find(|f| f.label == label)
    }
}

/// The per-process extraction engine.
///
/// Owns the reference template (with its cached keypoints) and both
/// aligners. Construct once, then call [`extract`](Self::extract) per
/// uploaded image with a shared [`TextRecognizer`].
#[derive(Debug)]
pub struct CardExtractor {
    template: ReferenceTemplate,
    params: ExtractorParams,
    feature: FeatureAligner,
    contour: ContourAligner,
}

impl CardExtractor {
    pub fn new(template: ReferenceTemplate, params: ExtractorParams) -> Self {
        let feature = FeatureAligner::new(params.feature);
        let contour = ContourAligner::new(params.contour);
        Self {
            template,
            params,
            feature,
            contour,
        }
    }

    #[inline]
    pub fn template(&self) -> &ReferenceTemplate {
        &self.template
    }

    #[inline]
    pub fn params(&self) -> &ExtractorParams {
        &self.params
    }

    /// Run only the registration stage.
    pub fn align(&self, scene: &image::RgbImage) -> Result<AlignedCard, AlignError> {
        match self.params.strategy {
            AlignStrategy::Feature => self.feature.align(scene, &self.template),
            AlignStrategy::Contour => self.contour.align(scene),
        }
    }

    /// Register the scene, slice the canonical frame into zones, clean each
    /// zone and run it through `ocr`, then post-filter by field kind.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(width = scene.width(), height = scene.height()))
    )]
    pub fn extract(
        &self,
        scene: &image::RgbImage,
        ocr: &dyn TextRecognizer,
    ) -> Result<ExtractionResult, ExtractError> {
        let aligned = self.align(scene)?;
        let canonical = self.canonical_gray(&aligned);

        let mut fields = Vec::with_capacity(self.params.zones.zones.len());
        for zone in &self.params.zones.zones {
            let crop = zone.crop(&canonical);
            let cleaned = clean_zone(&crop, &self.params.clean);

            let text = match ocr.recognize(&cleaned) {
                Ok(fragments) => {
                    let joined = fragments.join(" ");
                    let filtered = postprocess(&joined, zone.kind);
                    if filtered.is_empty() {
                        None
                    } else {
                        Some(filtered)
                    }
                }
                Err(err) => {
                    log::warn!("recognition failed for zone '{}': {err}", zone.label);
                    None
                }
            };

            fields.push(FieldResult {
                label: zone.label.clone(),
                kind: zone.kind,
                text,
            });
        }

        Ok(ExtractionResult {
            fields,
            homography: aligned.homography,
            ransac: aligned.ransac,
        })
    }

    /// Resize the aligned crop to the canonical frame and grayscale it.
    fn canonical_gray(&self, aligned: &AlignedCard) -> image::GrayImage {
        let resized = image::imageops::resize(
            &aligned.rgb,
            self.params.zones.canonical_width,
            self.params.zones.canonical_height,
            image::imageops::FilterType::Triangle,
        );
        image::imageops::grayscale(&resized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::OcrError;
    use cardscan_orb::OrbDetector;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Scripted recognizer: pops one canned response per zone.
    struct ScriptedOcr {
        responses: RefCell<VecDeque<Result<Vec<String>, OcrError>>>,
    }

    impl ScriptedOcr {
        fn new(responses: Vec<Result<Vec<String>, OcrError>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
            }
        }
    }

    impl TextRecognizer for ScriptedOcr {
        fn recognize(&self, _image: &image::GrayImage) -> Result<Vec<String>, OcrError> {
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn extractor() -> CardExtractor {
        let params = ExtractorParams::default();
        let detector = OrbDetector::new(params.feature.orb);
        let template =
            ReferenceTemplate::from_rgb(crate::testutil::mosaic_rgb(400, 250, 23), &detector);
        CardExtractor::new(template, params)
    }

    #[test]
    fn extracts_and_filters_fields_from_an_identical_scene() {
        let ex = extractor();
        let scene = crate::testutil::mosaic_rgb(400, 250, 23);
        let ocr = ScriptedOcr::new(vec![
            Ok(vec!["J0HN".to_string(), "DOE123".to_string()]),
            Ok(vec!["ID:".to_string(), "20-21-045".to_string()]),
        ]);

        let result = ex.extract(&scene, &ocr).expect("extraction");
        assert_eq!(result.fields.len(), 2);
        assert_eq!(
            result.field("Student Name").and_then(|f| f.text.as_deref()),
            Some("JHN DOE")
        );
        assert_eq!(
            result.field("ID Number").and_then(|f| f.text.as_deref()),
            Some("2021045")
        );

        // the scene is the template, so the transform is near-identity
        let h = result.homography.expect("feature strategy sets homography");
        let id = Homography::identity();
        for (row, id_row) in h.to_array().iter().zip(id.to_array()) {
            for (a, b) in row.iter().zip(id_row) {
                assert!((a - b).abs() < 0.05, "homography far from identity: {a} vs {b}");
            }
        }
        let stats = result.ransac.expect("stats present");
        assert!(stats.inliers >= 8);
    }

    #[test]
    fn empty_recognition_is_not_detected() {
        let ex = extractor();
        let scene = crate::testutil::mosaic_rgb(400, 250, 23);
        let ocr = ScriptedOcr::new(vec![
            Ok(vec![]),
            Ok(vec!["12".to_string(), "34".to_string()]),
        ]);

        let result = ex.extract(&scene, &ocr).expect("extraction");
        assert_eq!(result.field("Student Name").map(|f| f.text.clone()), Some(None));
        assert_eq!(
            result.field("ID Number").and_then(|f| f.text.as_deref()),
            Some("1234")
        );
    }

    #[test]
    fn per_field_ocr_failure_degrades_only_that_field() {
        let ex = extractor();
        let scene = crate::testutil::mosaic_rgb(400, 250, 23);
        let ocr = ScriptedOcr::new(vec![
            Err(OcrError::Recognition("backend hiccup".into())),
            Ok(vec!["777".to_string()]),
        ]);

        let result = ex.extract(&scene, &ocr).expect("extraction continues");
        assert_eq!(result.field("Student Name").map(|f| f.text.clone()), Some(None));
        assert_eq!(
            result.field("ID Number").and_then(|f| f.text.as_deref()),
            Some("777")
        );
    }

    #[test]
    fn blank_scene_reports_card_detection_failure() {
        let ex = extractor();
        let blank = image::RgbImage::from_pixel(400, 250, image::Rgb([255, 255, 255]));
        let ocr = ScriptedOcr::new(vec![]);
        let err = ex.extract(&blank, &ocr).expect_err("no card");
        assert!(matches!(err, ExtractError::Alignment(_)));
        assert!(err.to_string().contains("card detection failed"));
    }
}
