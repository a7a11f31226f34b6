//! QR code data mode decoders
//!
//! A segment starts with a 4-bit mode indicator. The character-count field
//! after it depends on the mode and on the version tier (1-9, 10-26, 27-40).
//! - Numeric: digits, 10 bits per group of three
//! - Alphanumeric: 45-symbol table, 11 bits per pair
//! - Byte: 8-bit data in the active character set
//! - Kanji / Hanzi: 13-bit double-byte codes

/// Alphanumeric segments
pub mod alphanumeric;
/// Byte segments
pub mod byte;
/// GB2312 Hanzi segments
pub mod hanzi;
/// Shift_JIS Kanji segments
pub mod kanji;
/// Numeric segments
pub mod numeric;

pub use alphanumeric::AlphanumericDecoder;
pub use byte::ByteDecoder;
pub use hanzi::HanziDecoder;
pub use kanji::KanjiDecoder;
pub use numeric::NumericDecoder;

use crate::error::{QrError, Result};
use crate::models::Version;

/// Segment mode indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// End of data
    Terminator,
    /// Decimal digits
    Numeric,
    /// Digits, upper case letters and nine symbols
    Alphanumeric,
    /// Position of this symbol in a sequence
    StructuredAppend,
    /// 8-bit data
    Byte,
    /// Extended Channel Interpretation designator
    Eci,
    /// Shift_JIS double-byte characters
    Kanji,
    /// GS1 data follows
    Fnc1FirstPosition,
    /// AIM application indicator follows
    Fnc1SecondPosition,
    /// GB2312 double-byte characters
    Hanzi,
}

impl Mode {
    /// Mode for a 4-bit indicator
    pub fn for_bits(bits: u32) -> Result<Mode> {
        Ok(match bits {
            0x0 => Mode::Terminator,
            0x1 => Mode::Numeric,
            0x2 => Mode::Alphanumeric,
            0x3 => Mode::StructuredAppend,
            0x4 => Mode::Byte,
            0x5 => Mode::Fnc1FirstPosition,
            0x7 => Mode::Eci,
            0x8 => Mode::Kanji,
            0x9 => Mode::Fnc1SecondPosition,
            0xD => Mode::Hanzi,
            _ => return Err(QrError::format(format!("invalid mode indicator {bits:#x}"))),
        })
    }

    /// The 4-bit indicator
    pub fn bits(self) -> u32 {
        match self {
            Mode::Terminator => 0x0,
            Mode::Numeric => 0x1,
            Mode::Alphanumeric => 0x2,
            Mode::StructuredAppend => 0x3,
            Mode::Byte => 0x4,
            Mode::Fnc1FirstPosition => 0x5,
            Mode::Eci => 0x7,
            Mode::Kanji => 0x8,
            Mode::Fnc1SecondPosition => 0x9,
            Mode::Hanzi => 0xD,
        }
    }

    /// Width of the character-count field; 0 for modes without one
    pub fn character_count_bits(self, version: &Version) -> usize {
        let tier = match version.number() {
            0..=9 => 0,
            10..=26 => 1,
            _ => 2,
        };
        let widths: [usize; 3] = match self {
            Mode::Numeric => [10, 12, 14],
            Mode::Alphanumeric => [9, 11, 13],
            Mode::Byte => [8, 16, 16],
            Mode::Kanji | Mode::Hanzi => [8, 10, 12],
            _ => [0, 0, 0],
        };
        widths[tier]
    }
}
