//! Brute-force descriptor matching with the Lowe ratio test.
//!
//! Implementation note: this is a plain exhaustive search. For the
//! descriptor counts seen on a single card photo (hundreds to a couple of
//! thousand) it is fast enough, and it keeps the matcher allocation-free
//! per query.

use crate::descriptor::Descriptor;

/// An accepted template-to-scene descriptor correspondence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DescriptorMatch {
    pub template_idx: usize,
    pub scene_idx: usize,
    /// Hamming distance of the winning pair.
    pub distance: u32,
}

/// Hamming distance between two descriptors.
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Match every template descriptor against its two nearest scene
/// descriptors, accepting the best only when it beats the runner-up by the
/// ratio test: `best < ratio * second_best`.
///
/// Fewer than two scene descriptors cannot be ratio-tested, so the result
/// is empty. Lowering `ratio` never grows the accepted set.
pub fn match_descriptors(
    template: &[Descriptor],
    scene: &[Descriptor],
    ratio: f32,
) -> Vec<DescriptorMatch> {
    if scene.len() < 2 {
        return Vec::new();
    }

    let mut matches = Vec::new();
    for (template_idx, td) in template.iter().enumerate() {
        let mut best_idx = 0usize;
        let mut best = u32::MAX;
        let mut second = u32::MAX;

        for (scene_idx, sd) in scene.iter().enumerate() {
            let d = hamming_distance(td, sd);
            if d < best {
                second = best;
                best = d;
                best_idx = scene_idx;
            } else if d < second {
                second = d;
            }
        }

        if (best as f32) < ratio * (second as f32) {
            matches.push(DescriptorMatch {
                template_idx,
                scene_idx: best_idx,
                distance: best,
            });
        }
    }
    matches
}
