use nalgebra::Point2;

use crate::homography::Homography;
use crate::image::{
    sample_bilinear_rgb, sample_bilinear_u8, GrayImage, GrayImageView, RgbImage, RgbImageView,
};

/// Warp `src` into an `out_w x out_h` destination frame.
///
/// `h_src_from_out` maps destination pixel coordinates back into the source
/// image; each output pixel is sampled bilinearly at its mapped position.
/// Pixels mapping outside the source come out black.
pub fn warp_perspective_gray(
    src: &GrayImageView<'_>,
    h_src_from_out: Homography,
    out_w: usize,
    out_h: usize,
) -> GrayImage {
    let mut out = GrayImage::new(out_w, out_h);
    for y in 0..out_h {
        for x in 0..out_w {
            // sample at pixel center
            let p = h_src_from_out.apply(Point2::new(x as f32 + 0.5, y as f32 + 0.5));
            out.data[y * out_w + x] = sample_bilinear_u8(src, p.x - 0.5, p.y - 0.5);
        }
    }
    out
}

/// Full-color variant of [`warp_perspective_gray`].
pub fn warp_perspective_rgb(
    src: &RgbImageView<'_>,
    h_src_from_out: Homography,
    out_w: usize,
    out_h: usize,
) -> RgbImage {
    let mut out = RgbImage::new(out_w, out_h);
    for y in 0..out_h {
        for x in 0..out_w {
            let p = h_src_from_out.apply(Point2::new(x as f32 + 0.5, y as f32 + 0.5));
            let rgb = sample_bilinear_rgb(src, p.x - 0.5, p.y - 0.5);
            let idx = (y * out_w + x) * 3;
            out.data[idx..idx + 3].copy_from_slice(&rgb);
        }
    }
    out
}
