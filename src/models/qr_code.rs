use std::fmt;
use std::str::FromStr;

use crate::error::QrError;

/// Error correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ECLevel {
    /// Low (~7% recovery capacity)
    L,
    /// Medium (~15% recovery capacity)
    M,
    /// Quartile (~25% recovery capacity)
    Q,
    /// High (~30% recovery capacity)
    H,
}

impl ECLevel {
    /// All levels in ordinal order
    pub const ALL: [ECLevel; 4] = [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H];

    /// Level from the 2-bit code stored in format information (01=L, 00=M, 11=Q, 10=H)
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0b01 => Some(ECLevel::L),
            0b00 => Some(ECLevel::M),
            0b11 => Some(ECLevel::Q),
            0b10 => Some(ECLevel::H),
            _ => None,
        }
    }

    /// 2-bit code stored in format information
    pub fn bits(self) -> u8 {
        match self {
            ECLevel::L => 0b01,
            ECLevel::M => 0b00,
            ECLevel::Q => 0b11,
            ECLevel::H => 0b10,
        }
    }

    /// Index into per-level tables (L=0 .. H=3)
    pub fn ordinal(self) -> usize {
        match self {
            ECLevel::L => 0,
            ECLevel::M => 1,
            ECLevel::Q => 2,
            ECLevel::H => 3,
        }
    }

    /// Approximate share of codewords that can be restored
    pub fn capacity(self) -> &'static str {
        match self {
            ECLevel::L => "~7%",
            ECLevel::M => "~15%",
            ECLevel::Q => "~25%",
            ECLevel::H => "~30%",
        }
    }
}

impl fmt::Display for ECLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ECLevel::L => "L",
            ECLevel::M => "M",
            ECLevel::Q => "Q",
            ECLevel::H => "H",
        };
        f.write_str(name)
    }
}

impl FromStr for ECLevel {
    type Err = QrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(ECLevel::L),
            "M" => Ok(ECLevel::M),
            "Q" => Ok(ECLevel::Q),
            "H" => Ok(ECLevel::H),
            other => Err(QrError::InvalidArgument(format!(
                "unknown error correction level '{other}'"
            ))),
        }
    }
}

/// Data mask pattern (0-7), evaluated at row `i`, column `j`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskPattern {
    /// (i + j) % 2 == 0
    Pattern0 = 0,
    /// i % 2 == 0
    Pattern1 = 1,
    /// j % 3 == 0
    Pattern2 = 2,
    /// (i + j) % 3 == 0
    Pattern3 = 3,
    /// (i/2 + j/3) % 2 == 0
    Pattern4 = 4,
    /// (i*j)%2 + (i*j)%3 == 0
    Pattern5 = 5,
    /// ((i*j)%2 + (i*j)%3) % 2 == 0
    Pattern6 = 6,
    /// ((i+j)%2 + (i*j)%3) % 2 == 0
    Pattern7 = 7,
}

impl MaskPattern {
    /// All patterns in reference order
    pub const ALL: [MaskPattern; 8] = [
        MaskPattern::Pattern0,
        MaskPattern::Pattern1,
        MaskPattern::Pattern2,
        MaskPattern::Pattern3,
        MaskPattern::Pattern4,
        MaskPattern::Pattern5,
        MaskPattern::Pattern6,
        MaskPattern::Pattern7,
    ];

    /// Get mask pattern from the low three bits
    pub fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & 0x07) as usize]
    }

    /// Reference number 0-7
    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Check if module at row `i`, column `j` is inverted by this mask
    #[inline]
    pub fn is_masked(&self, i: usize, j: usize) -> bool {
        match self {
            MaskPattern::Pattern0 => (i + j) % 2 == 0,
            MaskPattern::Pattern1 => i % 2 == 0,
            MaskPattern::Pattern2 => j % 3 == 0,
            MaskPattern::Pattern3 => (i + j) % 3 == 0,
            MaskPattern::Pattern4 => (i / 2 + j / 3) % 2 == 0,
            MaskPattern::Pattern5 => ((i * j) % 2 + (i * j) % 3) == 0,
            MaskPattern::Pattern6 => (((i * j) % 2) + ((i * j) % 3)) % 2 == 0,
            MaskPattern::Pattern7 => (((i + j) % 2) + ((i * j) % 3)) % 2 == 0,
        }
    }
}

/// Symbology tag. Only [`BarcodeFormat::QrCode`] is produced by this crate;
/// the others exist so callers can express `possible_formats` hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarcodeFormat {
    /// QR Code (model 2)
    QrCode,
    /// Aztec 2D
    Aztec,
    /// Data Matrix 2D
    DataMatrix,
    /// PDF417
    Pdf417,
    /// Code 128 1D
    Code128,
    /// EAN-13 1D
    Ean13,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ec_level_bits() {
        assert_eq!(ECLevel::from_bits(0b01), Some(ECLevel::L));
        assert_eq!(ECLevel::from_bits(0b00), Some(ECLevel::M));
        assert_eq!(ECLevel::from_bits(0b11), Some(ECLevel::Q));
        assert_eq!(ECLevel::from_bits(0b10), Some(ECLevel::H));
        for level in ECLevel::ALL {
            assert_eq!(ECLevel::from_bits(level.bits()), Some(level));
        }
    }

    #[test]
    fn test_ec_level_names() {
        assert_eq!("q".parse::<ECLevel>().unwrap(), ECLevel::Q);
        assert_eq!(ECLevel::H.to_string(), "H");
        assert_eq!(ECLevel::M.capacity(), "~15%");
        assert!("X".parse::<ECLevel>().is_err());
    }

    #[test]
    fn test_mask_pattern() {
        let mask = MaskPattern::Pattern0;
        assert!(mask.is_masked(0, 0));
        assert!(!mask.is_masked(0, 1));
        assert!(mask.is_masked(1, 1));
        assert_eq!(MaskPattern::from_bits(13), MaskPattern::Pattern5);
    }

    #[test]
    fn test_mask_pattern_7() {
        // ((i+j)%2 + (i*j)%3) % 2
        assert!(MaskPattern::Pattern7.is_masked(0, 0));
        assert!(!MaskPattern::Pattern7.is_masked(1, 1));
        assert!(MaskPattern::Pattern7.is_masked(1, 3));
        assert!(!MaskPattern::Pattern7.is_masked(1, 2));
    }
}
