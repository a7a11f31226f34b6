//! Convert RGB(A) frames to luminance
//! Y = 0.299*R + 0.587*G + 0.114*B
//! Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8
//!
//! Frames at or above the `QR_PARALLEL_GRAYSCALE_MIN_PIXELS` tunable are
//! converted row-parallel on the rayon pool.

use rayon::prelude::*;

use crate::config::parallel_grayscale_min_pixels;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8).min(255) as u8
}

fn convert_row<const CHANNELS: usize>(src: &[u8], dst: &mut [u8]) {
    for (px, out) in src.chunks_exact(CHANNELS).zip(dst.iter_mut()) {
        *out = luma(px[0], px[1], px[2]);
    }
}

fn convert<const CHANNELS: usize>(src: &[u8], width: usize, height: usize, parallel: bool) -> Vec<u8> {
    let mut gray = vec![0u8; width * height];
    if width == 0 {
        return gray;
    }
    if parallel {
        gray.par_chunks_mut(width)
            .zip(src.par_chunks_exact(width * CHANNELS))
            .for_each(|(dst, row)| convert_row::<CHANNELS>(row, dst));
    } else {
        for (dst, row) in gray.chunks_mut(width).zip(src.chunks_exact(width * CHANNELS)) {
            convert_row::<CHANNELS>(row, dst);
        }
    }
    gray
}

/// Convert RGB image to grayscale, in parallel for large frames
pub fn rgb_to_grayscale(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    let parallel = width * height >= parallel_grayscale_min_pixels();
    convert::<3>(rgb, width, height, parallel)
}

/// Convert RGBA image to grayscale (ignores alpha channel)
pub fn rgba_to_grayscale(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    let parallel = width * height >= parallel_grayscale_min_pixels();
    convert::<4>(rgba, width, height, parallel)
}

/// Convert RGB to grayscale using parallel processing
/// Processes rows in parallel for multi-core speedup
pub fn rgb_to_grayscale_parallel(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    convert::<3>(rgb, width, height, true)
}

/// Convert RGBA to grayscale using parallel processing
pub fn rgba_to_grayscale_parallel(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    convert::<4>(rgba, width, height, true)
}
