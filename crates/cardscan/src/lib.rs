//! High-level facade crate for the `cardscan-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the underlying crates
//! - end-to-end helpers that decode an uploaded image buffer and run the
//!   full registration + zone extraction pipeline.
//!
//! ## Quickstart
//!
//! ```no_run
//! use cardscan::extract::{ExtractConfig, TextRecognizer, OcrError};
//! use cardscan::run::extract_from_bytes;
//!
//! struct NoopOcr;
//! impl TextRecognizer for NoopOcr {
//!     fn recognize(&self, _: &image::GrayImage) -> Result<Vec<String>, OcrError> {
//!         Ok(vec![])
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = ExtractConfig::load_json("extract_config.json")?;
//! let extractor = cfg.build_extractor()?;
//! let bytes = std::fs::read("card_photo.jpg")?;
//! let result = extract_from_bytes(&extractor, &bytes, &NoopOcr)?;
//! for field in &result.fields {
//!     println!("{}: {}", field.label, field.text.as_deref().unwrap_or("not detected"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `cardscan::core`: images, homographies, consensus estimation, warping.
//! - `cardscan::orb`: keypoints, descriptors and matching.
//! - `cardscan::extract`: template, aligners, zones, cleaning, extraction.
//! - `cardscan::run`: end-to-end helpers from encoded byte buffers.

pub use cardscan_core as core;
pub use cardscan_extract as extract;
pub use cardscan_orb as orb;

pub use cardscan_extract::{
    AlignStrategy, CardExtractor, ExtractConfig, ExtractError, ExtractionResult, FieldKind,
    FieldResult, ReferenceTemplate, TextRecognizer, ZoneDef, ZoneSet,
};

pub mod run;
