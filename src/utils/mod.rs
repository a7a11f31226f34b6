//! Image preprocessing for the detector
//!
//! - Luminance sources (grayscale views over caller frames)
//! - Grayscale conversion (RGB/RGBA to luminance)
//! - Binarization (hybrid local threshold and global histogram)
//! - Geometry (perspective transforms)

/// Black/white thresholding
pub mod binarization;
/// Perspective transforms
pub mod geometry;
/// RGB(A) to luminance
pub mod grayscale;
/// Luminance source trait and implementations
pub mod luminance;
