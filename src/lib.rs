//! qr_reader - QR Code reading core
//!
//! Turns a grayscale image into the text of the QR code it contains:
//! binarization, finder and alignment pattern detection, perspective
//! sampling, format/version recovery, Reed-Solomon correction and bitstream
//! decoding. A small writer is included for producing test symbols.
//!
//! ```no_run
//! use qr_reader::{DecodeHints, GrayLuminanceSource, QrCodeReader};
//!
//! let image = image::open("code.png").unwrap();
//! let source = GrayLuminanceSource::from_image(&image);
//! let result = QrCodeReader::new().decode(&source, &DecodeHints::new()).unwrap();
//! println!("{}", result.text);
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Decode hints and process-wide tunables
pub mod config;
/// QR code decoding modules (error correction, format extraction, data modes)
pub mod decoder;
/// QR code detection modules (finder patterns, alignment, grid sampling)
pub mod detector;
/// QR code writer
pub mod encoder;
/// Error type shared by every stage
pub mod error;
/// Core data structures (BitMatrix, Point, Version, results)
pub mod models;
/// Top-level reader
pub mod reader;
/// Utility functions (grayscale, luminance sources, binarization, geometry)
pub mod utils;

pub use config::DecodeHints;
pub use encoder::{Encoder, QrCode};
pub use error::{QrError, Result};
pub use models::{
    BarcodeFormat, BitMatrix, DecodeOutcome, ECLevel, MaskPattern, Point, QrResult,
    ResultMetadataKey, ResultMetadataValue, RetryReason, Version,
};
pub use reader::QrCodeReader;
pub use utils::binarization::{BinaryBitmap, Binarizer};
pub use utils::luminance::{GrayLuminanceSource, InvertedLuminanceSource, LuminanceSource};

/// Decode the QR code in an RGB image
///
/// # Arguments
/// * `image` - Raw RGB bytes (3 bytes per pixel)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `hints` - Decode preferences
pub fn decode(image: &[u8], width: usize, height: usize, hints: &DecodeHints) -> Result<QrResult> {
    let source = GrayLuminanceSource::from_rgb(image, width, height)?;
    QrCodeReader::new().decode(&source, hints)
}

/// Decode the QR code in a pre-computed grayscale image (1 byte per pixel)
pub fn decode_from_grayscale(
    image: &[u8],
    width: usize,
    height: usize,
    hints: &DecodeHints,
) -> Result<QrResult> {
    let source = GrayLuminanceSource::new(image.to_vec(), width, height)?;
    QrCodeReader::new().decode(&source, hints)
}

/// Decode the QR code in any image the `image` crate can load
pub fn decode_image(image: &image::DynamicImage, hints: &DecodeHints) -> Result<QrResult> {
    QrCodeReader::new().decode(&GrayLuminanceSource::from_image(image), hints)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_empty() {
        // 10x10 black RGB frame
        let image = vec![0u8; 300];
        assert_eq!(
            decode(&image, 10, 10, &DecodeHints::new()),
            Err(QrError::NotFound)
        );
    }

    #[test]
    fn test_decode_wrong_length() {
        assert!(matches!(
            decode(&[0u8; 10], 10, 10, &DecodeHints::new()),
            Err(QrError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_decode_rgb_roundtrip() {
        let code = Encoder::encode("https://example.com/path?q=1", ECLevel::M).unwrap();
        let (luma, size) = code.to_luma(4, 4);
        let rgb: Vec<u8> = luma.iter().flat_map(|&v| [v, v, v]).collect();
        let result = decode(&rgb, size, size, &DecodeHints::new()).unwrap();
        assert_eq!(result.text, "https://example.com/path?q=1");

        let gray = decode_from_grayscale(&luma, size, size, &DecodeHints::new()).unwrap();
        assert_eq!(gray, result);
    }

    #[test]
    fn test_decode_dynamic_image() {
        let code = Encoder::encode("DYNAMIC", ECLevel::L).unwrap();
        let image = image::DynamicImage::ImageLuma8(code.to_image(5, 4));
        assert_eq!(decode_image(&image, &DecodeHints::new()).unwrap().text, "DYNAMIC");
    }
}
