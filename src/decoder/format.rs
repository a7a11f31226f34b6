/// Format information: error correction level and data mask
use super::bch::{FORMAT_INFO_CODEWORDS, FORMAT_INFO_MASK_QR, nearest_codeword};
use crate::models::{ECLevel, MaskPattern};

/// Readings further than this from every valid codeword are rejected
const MAX_FORMAT_BIT_DIFFERENCE: u32 = 3;

/// Decoded 15-bit format information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInformation {
    /// Error correction level
    pub ec_level: ECLevel,
    /// Data mask applied to the symbol
    pub mask_pattern: MaskPattern,
}

impl FormatInformation {
    fn from_data_bits(data: u8) -> Option<Self> {
        Some(Self {
            ec_level: ECLevel::from_bits((data >> 3) & 0x03)?,
            mask_pattern: MaskPattern::from_bits(data & 0x07),
        })
    }

    /// Resolve the two raw 15-bit readings to the nearest valid codeword.
    ///
    /// Readings are first matched as stored (masked). Some encoders forget to
    /// apply the 0x5412 mask, so a second pass matches the unmasked readings.
    pub fn decode(masked_info1: u32, masked_info2: u32) -> Option<Self> {
        Self::do_decode(masked_info1, masked_info2).or_else(|| {
            Self::do_decode(
                masked_info1 ^ FORMAT_INFO_MASK_QR,
                masked_info2 ^ FORMAT_INFO_MASK_QR,
            )
        })
    }

    fn do_decode(info1: u32, info2: u32) -> Option<Self> {
        let readings = if info1 == info2 {
            &[info1][..]
        } else {
            &[info1, info2][..]
        };
        let (index, distance) = nearest_codeword(&FORMAT_INFO_CODEWORDS, readings)?;
        if distance > MAX_FORMAT_BIT_DIFFERENCE {
            return None;
        }
        Self::from_data_bits(index as u8)
    }

    /// 15-bit masked codeword for this level and mask
    pub fn codeword(ec_level: ECLevel, mask_pattern: MaskPattern) -> u32 {
        let data = (ec_level.bits() << 3) | mask_pattern.bits();
        FORMAT_INFO_CODEWORDS[data as usize]
    }
}
