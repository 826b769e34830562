//! Adapters between `image` buffers and the lightweight core view types.

use cardscan_core as core;

/// Borrow an `image::GrayImage` as a core view.
pub fn gray_view(img: &image::GrayImage) -> core::GrayImageView<'_> {
    core::GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Borrow an `image::RgbImage` as a core view.
pub fn rgb_view(img: &image::RgbImage) -> core::RgbImageView<'_> {
    core::RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Move a core RGB buffer into an `image::RgbImage`.
pub fn rgb_from_core(img: core::RgbImage) -> image::RgbImage {
    image::RgbImage::from_raw(img.width as u32, img.height as u32, img.data)
        .expect("core buffer length is width * height * 3 by construction")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_share_dimensions_and_bytes() {
        let img = image::GrayImage::from_fn(4, 3, |x, y| image::Luma([(x + 4 * y) as u8]));
        let view = gray_view(&img);
        assert_eq!(view.width, 4);
        assert_eq!(view.height, 3);
        assert_eq!(view.data[5], 5);
    }

    #[test]
    fn rgb_round_trips_through_core() {
        let img = image::RgbImage::from_fn(3, 2, |x, y| image::Rgb([x as u8, y as u8, 7]));
        let view = rgb_view(&img);
        let core_img = cardscan_core::RgbImage {
            width: view.width,
            height: view.height,
            data: view.data.to_vec(),
        };
        let back = rgb_from_core(core_img);
        assert_eq!(back, img);
    }
}
