//! Scale/rotation-invariant keypoints and binary descriptors.
//!
//! The detector is ORB-shaped: FAST-9 corners over a small image pyramid,
//! intensity-centroid orientation, and a steered 256-bit binary descriptor
//! compared by Hamming distance. It exists so the aligner can register a
//! card photo against a stored template without an external vision library.

mod descriptor;
mod detector;
mod fast;
mod matcher;
mod pyramid;

pub use descriptor::{Descriptor, DESCRIPTOR_BYTES};
pub use detector::{Keypoint, OrbDetector, OrbParams};
pub use matcher::{hamming_distance, match_descriptors, DescriptorMatch};
pub use pyramid::{build_pyramid, ImagePyramid, PyramidLevel};
