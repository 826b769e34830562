//! FAST-9 segment-test corner detection.

use cardscan_core::GrayImageView;

/// Corner candidate with its response score, in level pixel coordinates.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ScoredCorner {
    pub x: usize,
    pub y: usize,
    pub response: f32,
}

// Bresenham circle of radius 3 around the candidate pixel, clockwise from
// twelve o'clock.
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

// Segment length for the FAST-9 variant.
const ARC: usize = 9;

#[inline]
fn longest_circular_run(states: &[i8; 16], wanted: i8) -> usize {
    let mut longest = 0;
    let mut run = 0;
    // doubled scan handles wrap-around runs
    for i in 0..32 {
        if states[i % 16] == wanted {
            run += 1;
            longest = longest.max(run.min(16));
        } else {
            run = 0;
        }
    }
    longest
}

/// Detect FAST-9 corners, skipping a `margin`-pixel border.
///
/// The returned set is non-maximum suppressed over 3x3 neighbourhoods of the
/// response map, so clustered detections collapse to their strongest pixel.
pub(crate) fn detect_corners(
    img: &GrayImageView<'_>,
    threshold: u8,
    margin: usize,
) -> Vec<ScoredCorner> {
    let (w, h) = (img.width, img.height);
    let margin = margin.max(3);
    if w <= 2 * margin || h <= 2 * margin {
        return Vec::new();
    }

    let t = threshold as i16;
    let mut response = vec![0f32; w * h];

    for y in margin..h - margin {
        for x in margin..w - margin {
            let c = img.data[y * w + x] as i16;

            // compass pre-test: a 9-long arc always covers at least two of
            // the four compass points
            let mut bright_compass = 0;
            let mut dark_compass = 0;
            for &i in &[0usize, 4, 8, 12] {
                let (dx, dy) = CIRCLE[i];
                let p = img.data[(y as i32 + dy) as usize * w + (x as i32 + dx) as usize] as i16;
                if p >= c + t {
                    bright_compass += 1;
                } else if p <= c - t {
                    dark_compass += 1;
                }
            }
            if bright_compass < 2 && dark_compass < 2 {
                continue;
            }

            let mut states = [0i8; 16];
            let mut score = 0f32;
            for (i, &(dx, dy)) in CIRCLE.iter().enumerate() {
                let p = img.data[(y as i32 + dy) as usize * w + (x as i32 + dx) as usize] as i16;
                if p >= c + t {
                    states[i] = 1;
                } else if p <= c - t {
                    states[i] = -1;
                }
                score += ((p - c).abs() - t).max(0) as f32;
            }

            if longest_circular_run(&states, 1) >= ARC || longest_circular_run(&states, -1) >= ARC
            {
                response[y * w + x] = score;
            }
        }
    }

    let mut corners = Vec::new();
    for y in margin..h - margin {
        for x in margin..w - margin {
            let r = response[y * w + x];
            if r <= 0.0 {
                continue;
            }
            let mut keep = true;
            'nms: for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let n = response[(y as i32 + dy) as usize * w + (x as i32 + dx) as usize];
                    // ties resolve to the first pixel in scan order
                    let earlier = dy < 0 || (dy == 0 && dx < 0);
                    if n > r || (earlier && n == r) {
                        keep = false;
                        break 'nms;
                    }
                }
            }
            if keep {
                corners.push(ScoredCorner { x, y, response: r });
            }
        }
    }
    corners
}
