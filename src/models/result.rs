use std::collections::BTreeMap;
use std::time::SystemTime;

use super::{BarcodeFormat, ECLevel, Point};
use crate::error::QrError;

/// Output of the symbol decoder, before it is tied to image coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderResult {
    /// Corrected data codewords
    pub raw_bytes: Vec<u8>,
    /// Number of valid bits in `raw_bytes`
    pub num_bits: usize,
    /// Decoded text
    pub text: String,
    /// Raw bytes of every byte-mode segment, in order
    pub byte_segments: Vec<Vec<u8>>,
    /// Level the symbol was encoded at
    pub ec_level: ECLevel,
    /// Codewords repaired by Reed-Solomon
    pub errors_corrected: usize,
    /// Known-position erasures (always 0 for QR)
    pub erasures: usize,
    /// Structured append position, if present
    pub structured_append_sequence: Option<u8>,
    /// Structured append parity, if present
    pub structured_append_parity: Option<u8>,
    /// Symbology identifier modifier (`]Q<n>`)
    pub symbology_modifier: u8,
    /// Whether the symbol was read from its mirror image
    pub mirrored: bool,
}

impl DecoderResult {
    /// Whether the symbol is part of a structured-append sequence
    pub fn has_structured_append(&self) -> bool {
        self.structured_append_sequence.is_some() && self.structured_append_parity.is_some()
    }
}

/// Keys of the open result metadata map
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResultMetadataKey {
    /// Level name, e.g. "M"
    ErrorCorrectionLevel,
    /// Raw byte-mode segments
    ByteSegments,
    /// Structured append sequence byte
    StructuredAppendSequence,
    /// Structured append parity byte
    StructuredAppendParity,
    /// AIM symbology identifier, e.g. "]Q1"
    SymbologyIdentifier,
    /// Number of corrected codewords
    ErrorsCorrected,
}

/// Values stored in the result metadata map
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultMetadataValue {
    /// Text value
    Text(String),
    /// Integer value
    Int(u32),
    /// Byte segments
    Bytes(Vec<Vec<u8>>),
}

/// A successful read
#[derive(Debug, Clone)]
pub struct QrResult {
    /// Decoded text
    pub text: String,
    /// Corrected data codewords
    pub raw_bytes: Vec<u8>,
    /// Number of valid bits in `raw_bytes`
    pub num_bits: usize,
    /// Pattern centres in image coordinates: bottom-left, top-left, top-right, then alignment
    pub result_points: Vec<Point>,
    /// Always [`BarcodeFormat::QrCode`]
    pub format: BarcodeFormat,
    /// When the result was produced
    pub timestamp: SystemTime,
    /// Open metadata map
    pub metadata: BTreeMap<ResultMetadataKey, ResultMetadataValue>,
}

impl QrResult {
    /// Build a result stamped with the current time
    pub fn new(text: String, raw_bytes: Vec<u8>, num_bits: usize, result_points: Vec<Point>) -> Self {
        Self {
            text,
            raw_bytes,
            num_bits,
            result_points,
            format: BarcodeFormat::QrCode,
            timestamp: SystemTime::now(),
            metadata: BTreeMap::new(),
        }
    }

    /// Add or replace a metadata entry
    pub fn put_metadata(&mut self, key: ResultMetadataKey, value: ResultMetadataValue) {
        self.metadata.insert(key, value);
    }

    /// Look up a metadata entry
    pub fn metadata(&self, key: ResultMetadataKey) -> Option<&ResultMetadataValue> {
        self.metadata.get(&key)
    }

    /// Corrected codeword count, if recorded
    pub fn errors_corrected(&self) -> Option<u32> {
        match self.metadata(ResultMetadataKey::ErrorsCorrected) {
            Some(ResultMetadataValue::Int(n)) => Some(*n),
            _ => None,
        }
    }
}

// Two reads of the same frame compare equal even though they were stamped at
// different instants.
impl PartialEq for QrResult {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
            && self.raw_bytes == other.raw_bytes
            && self.num_bits == other.num_bits
            && self.result_points == other.result_points
            && self.format == other.format
            && self.metadata == other.metadata
    }
}

/// Failure classes a scanning loop retries on the next frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// No symbol located
    NotFound,
    /// Symbol located but unreadable
    Format,
    /// Too many codeword errors
    Checksum,
}

/// Outcome of decoding a single frame
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// A symbol was read
    Success(QrResult),
    /// Nothing usable in this frame; try the next one
    Retry(RetryReason),
    /// The request itself is broken
    Fatal(QrError),
}

impl From<std::result::Result<QrResult, QrError>> for DecodeOutcome {
    fn from(result: std::result::Result<QrResult, QrError>) -> Self {
        match result {
            Ok(found) => DecodeOutcome::Success(found),
            Err(QrError::NotFound) => DecodeOutcome::Retry(RetryReason::NotFound),
            Err(QrError::Format(_)) => DecodeOutcome::Retry(RetryReason::Format),
            Err(QrError::Checksum(_)) => DecodeOutcome::Retry(RetryReason::Checksum),
            Err(err @ QrError::InvalidArgument(_)) => DecodeOutcome::Fatal(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_equality_ignores_timestamp() {
        let a = QrResult::new("hi".into(), vec![1, 2], 16, vec![Point::new(1.0, 2.0)]);
        let mut b = a.clone();
        b.timestamp += Duration::from_secs(5);
        assert_eq!(a, b);
        b.text.push('!');
        assert_ne!(a, b);
    }

    #[test]
    fn test_outcome_from_result() {
        assert_eq!(
            DecodeOutcome::from(Err(QrError::NotFound)),
            DecodeOutcome::Retry(RetryReason::NotFound)
        );
        assert_eq!(
            DecodeOutcome::from(Err(QrError::Checksum("x".into()))),
            DecodeOutcome::Retry(RetryReason::Checksum)
        );
        assert!(matches!(
            DecodeOutcome::from(Err(QrError::InvalidArgument("bad".into()))),
            DecodeOutcome::Fatal(_)
        ));
    }

    #[test]
    fn test_errors_corrected_lookup() {
        let mut r = QrResult::new(String::new(), vec![], 0, vec![]);
        assert_eq!(r.errors_corrected(), None);
        r.put_metadata(ResultMetadataKey::ErrorsCorrected, ResultMetadataValue::Int(3));
        assert_eq!(r.errors_corrected(), Some(3));
    }
}
