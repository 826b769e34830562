//! Card registration strategies.
//!
//! Two aligners coexist: the feature-based one registers the scene against
//! the stored reference template through a consensus homography; the
//! contour-based one crops the dominant rectangular outline and assumes the
//! card is roughly axis-aligned. Both produce an [`AlignedCard`].

mod contour;
mod error;
mod feature;
mod params;
mod result;

pub use contour::ContourAligner;
pub use error::AlignError;
pub use feature::FeatureAligner;
pub use params::{ContourAlignParams, FeatureAlignParams};
pub use result::AlignedCard;
