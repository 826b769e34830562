use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;

use super::{AlignError, AlignedCard, ContourAlignParams};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Template-free aligner: assumes the card is the dominant rectangular
/// object in frame and roughly axis-aligned.
///
/// Fragile to background clutter by design; the feature-based aligner is
/// the robust path, this one survives without a stored template.
#[derive(Debug)]
pub struct ContourAligner {
    params: ContourAlignParams,
}

struct BoundingRect {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
}

fn shoelace_area(points: &[imageproc::point::Point<i32>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0f64;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x as f64 * points[j].y as f64;
        area -= points[j].x as f64 * points[i].y as f64;
    }
    area.abs() / 2.0
}

fn bounding_rect(points: &[imageproc::point::Point<i32>]) -> BoundingRect {
    let mut min_x = i32::MAX;
    let mut min_y = i32::MAX;
    let mut max_x = i32::MIN;
    let mut max_y = i32::MIN;
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    BoundingRect {
        x: min_x.max(0) as u32,
        y: min_y.max(0) as u32,
        w: (max_x - min_x + 1).max(1) as u32,
        h: (max_y - min_y + 1).max(1) as u32,
    }
}

impl ContourAligner {
    pub fn new(params: ContourAlignParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &ContourAlignParams {
        &self.params
    }

    /// Crop the card region out of `scene`.
    ///
    /// Silently degrades to [`AlignError::NoContours`] when no outline is
    /// found; there are no partial results.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, scene), fields(width = scene.width(), height = scene.height()))
    )]
    pub fn align(&self, scene: &image::RgbImage) -> Result<AlignedCard, AlignError> {
        let p = &self.params;

        let gray = image::imageops::grayscale(scene);
        let blurred = gaussian_blur_f32(&gray, p.blur_sigma);
        let edges = canny(&blurred, p.canny_low, p.canny_high);
        let closed = if p.dilate_radius > 0 {
            dilate(&edges, Norm::LInf, p.dilate_radius)
        } else {
            edges
        };

        let contours: Vec<Contour<i32>> = find_contours(&closed);
        let outline = contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer)
            .max_by(|a, b| {
                shoelace_area(&a.points)
                    .partial_cmp(&shoelace_area(&b.points))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .ok_or(AlignError::NoContours)?;

        let rect = bounding_rect(&outline.points);
        log::debug!(
            "largest outline bounds ({}, {}) {}x{}",
            rect.x,
            rect.y,
            rect.w,
            rect.h
        );

        // inset crop, clamped to the scene
        let x0 = rect.x + (rect.w as f32 * p.col_start_frac) as u32;
        let x1 = rect.x + (rect.w as f32 * p.col_end_frac) as u32;
        let y0 = rect.y + (rect.h as f32 * p.row_start_frac) as u32;
        let y1 = rect.y + (rect.h as f32 * p.row_end_frac) as u32;

        let x0 = x0.min(scene.width().saturating_sub(1));
        let y0 = y0.min(scene.height().saturating_sub(1));
        let cw = x1.saturating_sub(x0).min(scene.width() - x0);
        let ch = y1.saturating_sub(y0).min(scene.height() - y0);
        if cw == 0 || ch == 0 {
            return Err(AlignError::NoContours);
        }

        let crop = image::imageops::crop_imm(scene, x0, y0, cw, ch).to_image();
        Ok(AlignedCard {
            rgb: crop,
            homography: None,
            ransac: None,
        })
    }
}
