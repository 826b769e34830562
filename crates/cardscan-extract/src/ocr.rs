//! The text-recognition collaborator.
//!
//! The pipeline treats OCR as an injected dependency: anything that can
//! turn a cleaned binary raster into ordered text fragments works. The
//! `ocr` cargo feature provides an engine backed by the pure-Rust `ocrs`
//! crate with `rten`-executed models.

use std::path::PathBuf;

/// Errors from a text-recognition backend.
#[derive(thiserror::Error, Debug)]
pub enum OcrError {
    #[error("OCR model not found at {path}")]
    ModelMissing { path: PathBuf },
    #[error("failed to load OCR model: {0}")]
    ModelLoad(String),
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

/// A text-recognition engine.
///
/// `recognize` returns the fragments in reading order; the extractor joins
/// them with single spaces before post-processing. Engines are expected to
/// be expensive to construct and cheap to reuse, so build one per process
/// and share it across requests.
pub trait TextRecognizer {
    fn recognize(&self, image: &image::GrayImage) -> Result<Vec<String>, OcrError>;
}

#[cfg(feature = "ocr")]
pub use ocrs_backend::{OcrsConfig, OcrsRecognizer};

#[cfg(feature = "ocr")]
mod ocrs_backend {
    use std::path::{Path, PathBuf};

    use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
    use rten::Model;

    use super::{OcrError, TextRecognizer};

    const DETECTION_MODEL: &str = "text-detection.rten";
    const RECOGNITION_MODEL: &str = "text-recognition.rten";

    /// Model locations for the `ocrs` backend.
    #[derive(Debug, Clone)]
    pub struct OcrsConfig {
        pub detection_model_path: PathBuf,
        pub recognition_model_path: PathBuf,
    }

    impl OcrsConfig {
        /// Point at a directory containing the two standard model files.
        pub fn from_dir(dir: impl AsRef<Path>) -> Self {
            let dir = dir.as_ref();
            Self {
                detection_model_path: dir.join(DETECTION_MODEL),
                recognition_model_path: dir.join(RECOGNITION_MODEL),
            }
        }

        /// Fail early when a model file is missing; loading large models
        /// only to discover a bad path wastes startup time.
        pub fn validate(&self) -> Result<(), OcrError> {
            for path in [&self.detection_model_path, &self.recognition_model_path] {
                if !path.exists() {
                    return Err(OcrError::ModelMissing { path: path.clone() });
                }
            }
            Ok(())
        }
    }

    /// `ocrs`-backed recognizer. Construction loads both neural models;
    /// keep the instance around and reuse it for every zone.
    pub struct OcrsRecognizer {
        engine: OcrEngine,
    }

    impl OcrsRecognizer {
        pub fn new(config: OcrsConfig) -> Result<Self, OcrError> {
            config.validate()?;

            let detection = Model::load_file(&config.detection_model_path)
                .map_err(|err| OcrError::ModelLoad(err.to_string()))?;
            let recognition = Model::load_file(&config.recognition_model_path)
                .map_err(|err| OcrError::ModelLoad(err.to_string()))?;

            let engine = OcrEngine::new(OcrEngineParams {
                detection_model: Some(detection),
                recognition_model: Some(recognition),
                ..Default::default()
            })
            .map_err(|err| OcrError::ModelLoad(err.to_string()))?;

            log::info!("ocrs engine initialised");
            Ok(Self { engine })
        }
    }

    impl TextRecognizer for OcrsRecognizer {
        fn recognize(&self, image: &image::GrayImage) -> Result<Vec<String>, OcrError> {
            let rgb = image::DynamicImage::ImageLuma8(image.clone()).to_rgb8();
            let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())
                .map_err(|err| OcrError::Recognition(err.to_string()))?;
            let input = self
                .engine
                .prepare_input(source)
                .map_err(|err| OcrError::Recognition(err.to_string()))?;

            let words = self
                .engine
                .detect_words(&input)
                .map_err(|err| OcrError::Recognition(err.to_string()))?;
            let lines = self.engine.find_text_lines(&input, &words);
            let texts = self
                .engine
                .recognize_text(&input, &lines)
                .map_err(|err| OcrError::Recognition(err.to_string()))?;

            Ok(texts
                .into_iter()
                .flatten()
                .map(|line| line.to_string())
                .filter(|s| !s.trim().is_empty())
                .collect())
        }
    }
}
