//! Zone cleaning: turn a cropped field into a high-contrast binary raster
//! the OCR engine can read.
//!
//! Ordering matters: local contrast normalization first, then a small blur
//! to knock down the noise the contrast step amplifies, then the global
//! threshold. Blurring before normalization would smear strokes and then
//! amplify whatever noise survived.

use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::close;
use serde::{Deserialize, Serialize};

/// Cleaning parameters.
///
/// The defaults follow the deployed card profile; `closing_radius` selects
/// the variant that reconnects character strokes broken by thresholding.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CleanParams {
    /// CLAHE clip limit, as a multiple of the uniform histogram level.
    pub clahe_clip_limit: f32,
    /// CLAHE tile grid (columns, rows).
    pub clahe_grid: (u32, u32),
    /// Gaussian sigma of the post-contrast smoothing (0.8 ~ a 3x3 kernel).
    pub blur_sigma: f32,
    /// Optional morphological closing radius applied after thresholding.
    pub closing_radius: Option<u8>,
}

impl Default for CleanParams {
    fn default() -> Self {
        Self {
            clahe_clip_limit: 2.0,
            clahe_grid: (8, 8),
            blur_sigma: 0.8,
            closing_radius: None,
        }
    }
}

impl CleanParams {
    /// The stroke-reconnecting variant.
    pub fn with_closing(radius: u8) -> Self {
        Self {
            closing_radius: Some(radius),
            ..Default::default()
        }
    }
}

/// Clean a grayscale zone crop into a binary (0/255) image.
pub fn clean_zone(zone: &image::GrayImage, params: &CleanParams) -> image::GrayImage {
    let contrasted = clahe(zone, params.clahe_clip_limit, params.clahe_grid);
    let smoothed = if params.blur_sigma > 0.0 {
        gaussian_blur_f32(&contrasted, params.blur_sigma)
    } else {
        contrasted
    };

    let t = otsu_threshold(&smoothed);
    let mut binary = image::GrayImage::new(smoothed.width(), smoothed.height());
    for (src, dst) in smoothed.pixels().zip(binary.pixels_mut()) {
        dst[0] = if src[0] > t { 255 } else { 0 };
    }

    match params.closing_radius {
        Some(r) if r > 0 => close(&binary, Norm::LInf, r),
        _ => binary,
    }
}

/// Contrast-limited adaptive histogram equalization.
///
/// Each tile gets its own clipped-histogram equalization LUT; per-pixel
/// values are bilinearly blended between the four surrounding tile LUTs so
/// tile seams do not show. Uniform tiles keep an identity mapping.
pub(crate) fn clahe(img: &image::GrayImage, clip_limit: f32, grid: (u32, u32)) -> image::GrayImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }
    let gx = grid.0.clamp(1, w);
    let gy = grid.1.clamp(1, h);
    let tile_w = w.div_ceil(gx);
    let tile_h = h.div_ceil(gy);

    // per-tile LUTs
    let mut luts = vec![[0u8; 256]; (gx * gy) as usize];
    for ty in 0..gy {
        for tx in 0..gx {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[img.get_pixel(x, y)[0] as usize] += 1;
                }
            }
            let n = (x1 - x0) * (y1 - y0);
            luts[(ty * gx + tx) as usize] = tile_lut(&hist, n, clip_limit);
        }
    }

    // bilinear blend between the four nearest tile LUTs
    let mut out = image::GrayImage::new(w, h);
    for y in 0..h {
        let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let ty0 = fy.floor().max(0.0) as u32;
        let ty0 = ty0.min(gy - 1);
        let ty1 = (ty0 + 1).min(gy - 1);
        let wy = (fy - fy.floor()).clamp(0.0, 1.0);
        let wy = if fy < 0.0 { 0.0 } else { wy };

        for x in 0..w {
            let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
            let tx0 = fx.floor().max(0.0) as u32;
            let tx0 = tx0.min(gx - 1);
            let tx1 = (tx0 + 1).min(gx - 1);
            let wx = (fx - fx.floor()).clamp(0.0, 1.0);
            let wx = if fx < 0.0 { 0.0 } else { wx };

            let v = img.get_pixel(x, y)[0] as usize;
            let v00 = luts[(ty0 * gx + tx0) as usize][v] as f32;
            let v10 = luts[(ty0 * gx + tx1) as usize][v] as f32;
            let v01 = luts[(ty1 * gx + tx0) as usize][v] as f32;
            let v11 = luts[(ty1 * gx + tx1) as usize][v] as f32;

            let top = v00 + wx * (v10 - v00);
            let bottom = v01 + wx * (v11 - v01);
            out.put_pixel(x, y, image::Luma([(top + wy * (bottom - top)).round() as u8]));
        }
    }
    out
}

fn tile_lut(hist: &[u32; 256], n: u32, clip_limit: f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    let nonzero_bins = hist.iter().filter(|&&c| c > 0).count();
    if n == 0 || nonzero_bins <= 1 {
        // empty or single-level tile: equalization is meaningless
        for (v, e) in lut.iter_mut().enumerate() {
            *e = v as u8;
        }
        return lut;
    }

    // clip the histogram and spread the excess uniformly
    let clip = ((clip_limit * n as f32 / 256.0).ceil() as u32).max(1);
    let mut clipped = [0u32; 256];
    let mut excess = 0u32;
    for (i, &c) in hist.iter().enumerate() {
        if c > clip {
            clipped[i] = clip;
            excess += c - clip;
        } else {
            clipped[i] = c;
        }
    }
    let bonus = excess / 256;
    let mut remainder = excess % 256;
    for c in clipped.iter_mut() {
        *c += bonus;
        if remainder > 0 {
            *c += 1;
            remainder -= 1;
        }
    }

    let mut cdf = 0u32;
    let mut cdf_min = 0u32;
    let mut seen_first = false;
    let mut cdfs = [0u32; 256];
    for (i, &c) in clipped.iter().enumerate() {
        cdf += c;
        cdfs[i] = cdf;
        if !seen_first && c > 0 {
            cdf_min = cdf;
            seen_first = true;
        }
    }

    if cdf_min == n {
        for (v, e) in lut.iter_mut().enumerate() {
            *e = v as u8;
        }
        return lut;
    }

    for (v, e) in lut.iter_mut().enumerate() {
        let num = cdfs[v].saturating_sub(cdf_min) as f32;
        let den = (n - cdf_min) as f32;
        *e = (255.0 * num / den).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Otsu's threshold: maximize the between-class variance of the histogram.
pub(crate) fn otsu_threshold(img: &image::GrayImage) -> u8 {
    let mut hist = [0u64; 256];
    for p in img.pixels() {
        hist[p[0] as usize] += 1;
    }
    let total = img.width() as u64 * img.height() as u64;
    if total == 0 {
        return 127;
    }

    let mut sum_total = 0f64;
    for (i, &c) in hist.iter().enumerate() {
        sum_total += i as f64 * c as f64;
    }

    let mut sum_b = 0f64;
    let mut w_b = 0u64;
    let mut best_var = -1f64;
    let mut best_t = 127u8;

    for (t, &c) in hist.iter().enumerate() {
        w_b += c;
        if w_b == 0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f == 0 {
            break;
        }

        sum_b += t as f64 * c as f64;
        let m_b = sum_b / w_b as f64;
        let m_f = (sum_total - sum_b) / w_f as f64;

        let var_between = w_b as f64 * w_f as f64 * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }
    best_t
}
