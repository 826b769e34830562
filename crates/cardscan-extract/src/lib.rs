//! Card registration and field extraction.
//!
//! Current focus:
//! - registering a photographed ID card against a stored reference template
//!   (feature-based) or by outline detection (contour-based),
//! - slicing the canonical card frame into configured field zones,
//! - cleaning each zone into an OCR-ready binary raster,
//! - post-filtering recognized text by the field's expected character class.
//!
//! Keypoints and descriptors live in `cardscan-orb`; homographies, consensus
//! estimation and warping live in `cardscan-core`. Text recognition itself is
//! an injected [`TextRecognizer`] collaborator (an `ocrs`-backed engine is
//! available behind the `ocr` feature).

mod aligner;
mod clean;
mod convert;
mod extractor;
mod io;
mod ocr;
mod postprocess;
mod template;
mod zone;

pub use aligner::{
    AlignError, AlignedCard, ContourAlignParams, ContourAligner, FeatureAlignParams,
    FeatureAligner,
};
pub use clean::{clean_zone, CleanParams};
pub use convert::{gray_view, rgb_from_core, rgb_view};
pub use extractor::{
    AlignStrategy, CardExtractor, ExtractError, ExtractionResult, ExtractorParams, FieldResult,
};
pub use io::{ExtractConfig, ExtractIoError, ExtractReport};
pub use ocr::{OcrError, TextRecognizer};
pub use postprocess::postprocess;
pub use template::{ReferenceTemplate, TemplateError};
pub use zone::{FieldKind, ZoneDef, ZoneSet};

#[cfg(feature = "ocr")]
pub use ocr::{OcrsConfig, OcrsRecognizer};
