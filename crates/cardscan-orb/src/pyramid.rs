use cardscan_core::{sample_bilinear_u8, GrayImage, GrayImageView};

/// One pyramid level; `scale` maps level coordinates back to level 0:
/// `x0 = (x + 0.5) * scale - 0.5`.
#[derive(Clone, Debug)]
pub struct PyramidLevel {
    pub image: GrayImage,
    pub scale: f32,
}

/// Fixed-factor downsampling pyramid, finest level first.
#[derive(Clone, Debug)]
pub struct ImagePyramid {
    pub levels: Vec<PyramidLevel>,
}

// Levels smaller than this carry no usable keypoints once the descriptor
// border is subtracted.
const MIN_LEVEL_SIDE: usize = 48;

pub fn build_pyramid(src: &GrayImageView<'_>, n_levels: usize, scale_factor: f32) -> ImagePyramid {
    let mut levels = Vec::with_capacity(n_levels);
    levels.push(PyramidLevel {
        image: GrayImage {
            width: src.width,
            height: src.height,
            data: src.data[..src.width * src.height].to_vec(),
        },
        scale: 1.0,
    });

    for i in 1..n_levels {
        let scale = scale_factor.powi(i as i32);
        let w = (src.width as f32 / scale).round() as usize;
        let h = (src.height as f32 / scale).round() as usize;
        if w < MIN_LEVEL_SIDE || h < MIN_LEVEL_SIDE {
            break;
        }

        let mut image = GrayImage::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let sx = (x as f32 + 0.5) * scale - 0.5;
                let sy = (y as f32 + 0.5) * scale - 0.5;
                image.data[y * w + x] = sample_bilinear_u8(src, sx, sy);
            }
        }
        levels.push(PyramidLevel { image, scale });
    }

    ImagePyramid { levels }
}
