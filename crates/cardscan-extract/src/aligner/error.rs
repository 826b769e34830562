/// Recoverable per-image alignment failures.
///
/// Every variant means "card detection failed" for this photo; the caller
/// may resubmit a different one. Nothing here aborts the process.
#[derive(thiserror::Error, Debug)]
pub enum AlignError {
    #[error("no keypoint descriptors in the {0} image")]
    NoDescriptors(&'static str),
    #[error("not enough ratio-test matches ({found} < {needed})")]
    NotEnoughMatches { found: usize, needed: usize },
    #[error("homography estimation found no consensus")]
    HomographyFailed,
    #[error("no card outline found")]
    NoContours,
}
