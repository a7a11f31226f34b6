use crate::decoder::bit_source::BitSource;
use crate::error::{QrError, Result};

/// Numeric mode decoder (Mode 0001)
/// Groups of 3 digits = 10 bits, 2 digits = 7 bits, 1 digit = 4 bits
pub struct NumericDecoder;

impl NumericDecoder {
    /// Append `count` digits read from `bits` to `result`
    pub fn decode(bits: &mut BitSource, count: usize, result: &mut String) -> Result<()> {
        let mut remaining = count;
        while remaining > 0 {
            let group = remaining.min(3);
            let (width, limit) = match group {
                3 => (10, 1000),
                2 => (7, 100),
                _ => (4, 10),
            };
            let value = bits
                .read_bits(width)
                .ok_or_else(|| QrError::format("numeric segment truncated"))?;
            if value >= limit {
                return Err(QrError::format(format!(
                    "numeric group value {value} out of range"
                )));
            }
            result.push_str(&format!("{value:0group$}"));
            remaining -= group;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_decode() {
        // 012 | 345 | 67 -> 0000001100 0101011001 1000011
        let bytes = [0b0000_0011, 0b0001_0101, 0b1001_1000, 0b0110_0000];
        let mut bits = BitSource::new(&bytes);
        let mut out = String::new();
        NumericDecoder::decode(&mut bits, 8, &mut out).unwrap();
        assert_eq!(out, "01234567");
        assert_eq!(bits.position(), 27);
    }

    #[test]
    fn test_group_out_of_range() {
        // 1023 does not fit three digits
        let bytes = [0xFF, 0xC0];
        let mut out = String::new();
        assert!(NumericDecoder::decode(&mut BitSource::new(&bytes), 3, &mut out).is_err());
    }

    #[test]
    fn test_truncated() {
        let mut out = String::new();
        assert!(NumericDecoder::decode(&mut BitSource::new(&[0x00]), 3, &mut out).is_err());
    }
}
