//! Top-level reader: binarize, detect, decode, and attach result metadata

use log::debug;
use rayon::prelude::*;

use crate::config::DecodeHints;
use crate::decoder::qr_decoder::QrDecoder;
use crate::detector::Detector;
use crate::error::{QrError, Result};
use crate::models::{
    BitMatrix, DecodeOutcome, DecoderResult, Point, QrResult, ResultMetadataKey,
    ResultMetadataValue,
};
use crate::utils::binarization::{BinaryBitmap, Binarizer};
use crate::utils::luminance::LuminanceSource;

/// Reads one QR code per image.
///
/// The reader keeps no state between calls; one instance can serve any
/// number of threads.
#[derive(Default)]
pub struct QrCodeReader {
    decoder: QrDecoder,
    binarizer: Binarizer,
}

impl QrCodeReader {
    /// Reader with the hybrid binarizer
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader using a specific binarization strategy
    pub fn with_binarizer(binarizer: Binarizer) -> Self {
        Self {
            decoder: QrDecoder::new(),
            binarizer,
        }
    }

    /// Binarize `source` and read the symbol in it
    pub fn decode(&self, source: &dyn LuminanceSource, hints: &DecodeHints) -> Result<QrResult> {
        let bitmap = BinaryBitmap::new(source, self.binarizer);
        self.decode_bitmap(&bitmap, hints)
    }

    /// Read the symbol in an already paired source and binarizer
    pub fn decode_bitmap(&self, bitmap: &BinaryBitmap<'_>, hints: &DecodeHints) -> Result<QrResult> {
        hints.check_formats()?;
        let image = bitmap.black_matrix()?;

        let (decoded, mut points) = if hints.pure_barcode {
            let (bits, points) = extract_pure_bits(image)?;
            (self.decoder.decode(bits, hints)?, points)
        } else {
            let detected = Detector::new(image).detect(hints)?;
            (self.decoder.decode(detected.bits, hints)?, detected.points)
        };

        // Read mirrored: the corner finders were labelled the wrong way round
        if decoded.mirrored && points.len() >= 3 {
            points.swap(0, 2);
        }
        Ok(build_result(decoded, points))
    }

    /// [`Self::decode`] folded into a per-frame outcome
    pub fn decode_frame(&self, source: &dyn LuminanceSource, hints: &DecodeHints) -> DecodeOutcome {
        self.decode(source, hints).into()
    }

    /// Decode independent frames on the rayon pool, results in input order
    pub fn decode_batch<S>(&self, sources: &[S], hints: &DecodeHints) -> Vec<DecodeOutcome>
    where
        S: LuminanceSource + Sync,
    {
        debug!("decoding batch of {} frames", sources.len());
        sources
            .par_iter()
            .map(|source| self.decode_frame(source, hints))
            .collect()
    }
}

fn build_result(decoded: DecoderResult, points: Vec<Point>) -> QrResult {
    let DecoderResult {
        raw_bytes,
        num_bits,
        text,
        byte_segments,
        ec_level,
        errors_corrected,
        structured_append_sequence,
        structured_append_parity,
        symbology_modifier,
        ..
    } = decoded;

    let mut result = QrResult::new(text, raw_bytes, num_bits, points);
    result.put_metadata(
        ResultMetadataKey::ErrorCorrectionLevel,
        ResultMetadataValue::Text(ec_level.to_string()),
    );
    if !byte_segments.is_empty() {
        result.put_metadata(
            ResultMetadataKey::ByteSegments,
            ResultMetadataValue::Bytes(byte_segments),
        );
    }
    if let (Some(sequence), Some(parity)) = (structured_append_sequence, structured_append_parity) {
        result.put_metadata(
            ResultMetadataKey::StructuredAppendSequence,
            ResultMetadataValue::Int(sequence as u32),
        );
        result.put_metadata(
            ResultMetadataKey::StructuredAppendParity,
            ResultMetadataValue::Int(parity as u32),
        );
    }
    result.put_metadata(
        ResultMetadataKey::ErrorsCorrected,
        ResultMetadataValue::Int(errors_corrected as u32),
    );
    result.put_metadata(
        ResultMetadataKey::SymbologyIdentifier,
        ResultMetadataValue::Text(format!("]Q{symbology_modifier}")),
    );
    result
}

/// Read the module grid of an axis-aligned symbol surrounded only by its
/// quiet zone, without pattern search.
///
/// Returns the grid and the three finder centres in image coordinates.
pub fn extract_pure_bits(image: &BitMatrix) -> Result<(BitMatrix, Vec<Point>)> {
    let (left, top) = image.top_left_on_bit().ok_or(QrError::NotFound)?;
    let (mut right, bottom) = image.bottom_right_on_bit().ok_or(QrError::NotFound)?;

    let module_size = pure_module_size(image, left, top)?;
    if left >= right || top >= bottom {
        return Err(QrError::NotFound);
    }
    if bottom - top != right - left {
        // Trailing light modules on the right edge shorten the box; trust the height
        right = left + (bottom - top);
        if right >= image.width() {
            return Err(QrError::NotFound);
        }
    }

    let matrix_width = ((right - left + 1) as f32 / module_size).round() as usize;
    let matrix_height = ((bottom - top + 1) as f32 / module_size).round() as usize;
    if matrix_width == 0 || matrix_height == 0 || matrix_width != matrix_height {
        return Err(QrError::NotFound);
    }

    // Sample module centres
    let nudge = (module_size / 2.0) as usize;
    let mut top = top + nudge;
    let mut left = left + nudge;

    let too_far_right = (left + ((matrix_width - 1) as f32 * module_size) as usize) as i64 - right as i64;
    if too_far_right > 0 {
        if too_far_right > nudge as i64 {
            return Err(QrError::NotFound);
        }
        left -= too_far_right as usize;
    }
    let too_far_down = (top + ((matrix_height - 1) as f32 * module_size) as usize) as i64 - bottom as i64;
    if too_far_down > 0 {
        if too_far_down > nudge as i64 {
            return Err(QrError::NotFound);
        }
        top -= too_far_down as usize;
    }

    let mut bits = BitMatrix::square(matrix_width);
    for y in 0..matrix_height {
        let offset_y = top + (y as f32 * module_size) as usize;
        for x in 0..matrix_width {
            if image.get(left + (x as f32 * module_size) as usize, offset_y) {
                bits.set(x, y, true);
            }
        }
    }

    let origin_x = left as f32 - nudge as f32;
    let origin_y = top as f32 - nudge as f32;
    let at = |mx: f32, my: f32| Point::new(origin_x + mx * module_size, origin_y + my * module_size);
    let far = matrix_width as f32 - 3.5;
    let points = vec![at(3.5, far), at(3.5, 3.5), at(far, 3.5)];
    Ok((bits, points))
}

/// Width of the top-left finder along the diagonal, over 7
fn pure_module_size(image: &BitMatrix, left: usize, top: usize) -> Result<f32> {
    let (width, height) = (image.width(), image.height());
    let (mut x, mut y) = (left, top);
    let mut in_black = true;
    let mut transitions = 0;
    while x < width && y < height {
        if in_black != image.get(x, y) {
            transitions += 1;
            if transitions == 5 {
                break;
            }
            in_black = !in_black;
        }
        x += 1;
        y += 1;
    }
    if x == width || y == height {
        return Err(QrError::NotFound);
    }
    Ok((x - left) as f32 / 7.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;
    use crate::models::{BarcodeFormat, ECLevel};
    use crate::utils::luminance::GrayLuminanceSource;

    fn source_for(text: &str, level: ECLevel, scale: usize) -> GrayLuminanceSource {
        let code = Encoder::encode(text, level).unwrap();
        let (luma, size) = code.to_luma(scale, 4);
        GrayLuminanceSource::new(luma, size, size).unwrap()
    }

    #[test]
    fn test_decode_with_metadata() {
        let source = source_for("HELLO WORLD", ECLevel::M, 4);
        let result = QrCodeReader::new().decode(&source, &DecodeHints::new()).unwrap();
        assert_eq!(result.text, "HELLO WORLD");
        assert_eq!(result.format, BarcodeFormat::QrCode);
        assert_eq!(result.errors_corrected(), Some(0));
        assert_eq!(
            result.metadata(ResultMetadataKey::ErrorCorrectionLevel),
            Some(&ResultMetadataValue::Text("M".to_string()))
        );
        assert_eq!(
            result.metadata(ResultMetadataKey::SymbologyIdentifier),
            Some(&ResultMetadataValue::Text("]Q1".to_string()))
        );
        assert_eq!(result.result_points.len(), 3);
    }

    #[test]
    fn test_pure_barcode() {
        let source = source_for("pure barcode path", ECLevel::L, 3);
        let hints = DecodeHints::new().with_pure_barcode(true);
        let result = QrCodeReader::new().decode(&source, &hints).unwrap();
        assert_eq!(result.text, "pure barcode path");
        // top-left finder centre: quiet zone 4 modules + 3.5, at 3 px per module
        let top_left = result.result_points[1];
        assert!((top_left.x - 7.5 * 3.0).abs() < 1.5, "{top_left:?}");
        assert!(matches!(
            result.metadata(ResultMetadataKey::ByteSegments),
            Some(ResultMetadataValue::Bytes(segments)) if segments.len() == 1
        ));
    }

    #[test]
    fn test_format_filter() {
        let source = source_for("1234", ECLevel::L, 3);
        let reader = QrCodeReader::new();
        let empty = DecodeHints::new().with_possible_formats(vec![]);
        assert!(matches!(
            reader.decode(&source, &empty),
            Err(QrError::InvalidArgument(_))
        ));
        let qr = DecodeHints::new().with_possible_formats(vec![BarcodeFormat::QrCode]);
        assert_eq!(reader.decode(&source, &qr).unwrap().text, "1234");
    }

    #[test]
    fn test_blank_frame_outcome() {
        let source = GrayLuminanceSource::new(vec![255; 80 * 80], 80, 80).unwrap();
        let outcome = QrCodeReader::new().decode_frame(&source, &DecodeHints::new());
        assert!(matches!(outcome, DecodeOutcome::Retry(_)));
    }

    #[test]
    fn test_batch_preserves_order() {
        let sources = vec![
            source_for("FIRST", ECLevel::M, 3),
            GrayLuminanceSource::new(vec![255; 60 * 60], 60, 60).unwrap(),
            source_for("THIRD", ECLevel::M, 3),
        ];
        let outcomes = QrCodeReader::new().decode_batch(&sources, &DecodeHints::new());
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(&outcomes[0], DecodeOutcome::Success(r) if r.text == "FIRST"));
        assert!(matches!(outcomes[1], DecodeOutcome::Retry(_)));
        assert!(matches!(&outcomes[2], DecodeOutcome::Success(r) if r.text == "THIRD"));
    }

    #[test]
    fn test_pure_extraction_rejects_blank() {
        assert_eq!(
            extract_pure_bits(&BitMatrix::square(30)),
            Err(QrError::NotFound)
        );
    }
}
