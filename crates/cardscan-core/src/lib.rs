//! Core types and utilities for card registration.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any image codec or feature detector: images are plain row-major
//! byte buffers, and the homography machinery works on point correspondences
//! produced elsewhere.

mod homography;
mod image;
mod logger;
mod ransac;
mod warp;

pub use homography::{estimate_homography_dlt, homography_from_quad, Homography};
pub use image::{
    sample_bilinear, sample_bilinear_rgb, sample_bilinear_u8, GrayImage, GrayImageView, RgbImage,
    RgbImageView,
};
pub use ransac::{estimate_homography_ransac, RansacHomographyConfig, RansacStats};
pub use warp::{warp_perspective_gray, warp_perspective_rgb};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
