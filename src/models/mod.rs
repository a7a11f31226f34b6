/// Bit-packed module and pixel grids
pub mod matrix;
/// Finder and alignment pattern candidates
pub mod pattern;
/// Image coordinates
pub mod point;
/// Error correction levels, masks and barcode formats
pub mod qr_code;
/// Decoder and reader results
pub mod result;
/// The 40 symbol versions and their block layouts
pub mod version;

pub use matrix::BitMatrix;
pub use pattern::{Pattern, PatternKind};
pub use point::Point;
pub use qr_code::{BarcodeFormat, ECLevel, MaskPattern};
pub use result::{
    DecodeOutcome, DecoderResult, QrResult, ResultMetadataKey, ResultMetadataValue, RetryReason,
};
pub use version::{ECB, ECBlocks, Version};
