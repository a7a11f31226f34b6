use crate::decoder::bit_source::BitSource;
use crate::error::{QrError, Result};

/// Alphanumeric character set: 0-9, A-Z, space, $%*+-./:
pub(crate) const ALPHANUMERIC_TABLE: [char; 45] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', ' ', '$',
    '%', '*', '+', '-', '.', '/', ':',
];

/// Index of `c` in the alphanumeric table
pub(crate) fn alphanumeric_value(c: char) -> Option<u32> {
    ALPHANUMERIC_TABLE.iter().position(|&t| t == c).map(|i| i as u32)
}

fn to_char(value: u32) -> Result<char> {
    ALPHANUMERIC_TABLE
        .get(value as usize)
        .copied()
        .ok_or_else(|| QrError::format(format!("alphanumeric value {value} out of range")))
}

/// Alphanumeric mode decoder (Mode 0010)
/// Pairs = 11 bits, single = 6 bits
pub struct AlphanumericDecoder;

impl AlphanumericDecoder {
    /// Append `count` characters from the 45-symbol table to `result`
    pub fn decode(bits: &mut BitSource, count: usize, result: &mut String) -> Result<()> {
        let truncated = || QrError::format("alphanumeric segment truncated");
        let mut remaining = count;
        while remaining > 1 {
            let value = bits.read_bits(11).ok_or_else(truncated)?;
            result.push(to_char(value / 45)?);
            result.push(to_char(value % 45)?);
            remaining -= 2;
        }
        if remaining == 1 {
            let value = bits.read_bits(6).ok_or_else(truncated)?;
            result.push(to_char(value)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_and_trailing_char() {
        // "AC-" : A=10, C=12 -> 10*45+12 = 462 = 00111001110, '-'=41 = 101001
        let bytes = [0b0011_1001, 0b1101_0100, 0b1000_0000];
        let mut out = String::new();
        AlphanumericDecoder::decode(&mut BitSource::new(&bytes), 3, &mut out).unwrap();
        assert_eq!(out, "AC-");
    }

    #[test]
    fn test_value_out_of_table() {
        // 2047 / 45 = 45
        let bytes = [0xFF, 0xE0];
        let mut out = String::new();
        assert!(AlphanumericDecoder::decode(&mut BitSource::new(&bytes), 2, &mut out).is_err());
    }

    #[test]
    fn test_table_lookup() {
        assert_eq!(alphanumeric_value('0'), Some(0));
        assert_eq!(alphanumeric_value(':'), Some(44));
        assert_eq!(alphanumeric_value('a'), None);
    }
}
