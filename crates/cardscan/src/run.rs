//! End-to-end helpers: decode an uploaded image and run the pipeline.

use cardscan_extract::{CardExtractor, ExtractError, ExtractionResult, TextRecognizer};

/// Errors produced by the high-level helpers.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error("failed to decode scene image: {0}")]
    Decode(#[from] image::ImageError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Decode a JPEG/PNG byte buffer and extract fields from it.
pub fn extract_from_bytes(
    extractor: &CardExtractor,
    bytes: &[u8],
    ocr: &dyn TextRecognizer,
) -> Result<ExtractionResult, RunError> {
    let img = image::load_from_memory(bytes)?;
    log::debug!("decoded scene image {}x{}", img.width(), img.height());
    Ok(extractor.extract(&img.to_rgb8(), ocr)?)
}

/// Run the pipeline on an already-decoded image.
pub fn extract_from_rgb(
    extractor: &CardExtractor,
    scene: &image::RgbImage,
    ocr: &dyn TextRecognizer,
) -> Result<ExtractionResult, RunError> {
    Ok(extractor.extract(scene, ocr)?)
}
