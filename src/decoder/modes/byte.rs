use crate::decoder::bit_source::BitSource;
use crate::decoder::eci::{Charset, guess_charset};
use crate::error::{QrError, Result};

/// Byte mode decoder (Mode 0100) for 8-bit data
pub struct ByteDecoder;

impl ByteDecoder {
    /// Read `count` bytes, decode them with the ECI charset if one is active,
    /// else the hinted charset, else a guess. The raw bytes are pushed onto
    /// `byte_segments`.
    pub fn decode(
        bits: &mut BitSource,
        count: usize,
        eci_charset: Option<Charset>,
        hint: Option<Charset>,
        result: &mut String,
        byte_segments: &mut Vec<Vec<u8>>,
    ) -> Result<()> {
        if 8 * count > bits.available() {
            return Err(QrError::format(format!(
                "byte segment of {count} bytes exceeds the {} remaining bits",
                bits.available()
            )));
        }
        let bytes: Vec<u8> = (0..count)
            .map(|_| bits.read_bits(8).map(|b| b as u8))
            .collect::<Option<_>>()
            .ok_or_else(|| QrError::format("byte segment truncated"))?;

        let charset = eci_charset.unwrap_or_else(|| guess_charset(&bytes, hint));
        result.push_str(&charset.decode(&bytes));
        byte_segments.push(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_decode() {
        let bytes = [0x48, 0x49];
        let mut out = String::new();
        let mut segments = Vec::new();
        ByteDecoder::decode(&mut BitSource::new(&bytes), 2, None, None, &mut out, &mut segments)
            .unwrap();
        assert_eq!(out, "HI");
        assert_eq!(segments, vec![vec![0x48, 0x49]]);
    }

    #[test]
    fn test_eci_charset_wins_over_hint() {
        let bytes = "\u{e9}t\u{e9}".as_bytes().to_vec();
        let mut out = String::new();
        let mut segments = Vec::new();
        ByteDecoder::decode(
            &mut BitSource::new(&bytes),
            bytes.len(),
            Some(Charset::UTF8),
            Some(Charset::Latin1),
            &mut out,
            &mut segments,
        )
        .unwrap();
        assert_eq!(out, "\u{e9}t\u{e9}");
    }

    #[test]
    fn test_hint_used_without_eci() {
        let bytes = [0xC3, 0xA9];
        let mut out = String::new();
        let mut segments = Vec::new();
        ByteDecoder::decode(
            &mut BitSource::new(&bytes),
            2,
            None,
            Some(Charset::Latin1),
            &mut out,
            &mut segments,
        )
        .unwrap();
        assert_eq!(out, "\u{c3}\u{a9}");
    }

    #[test]
    fn test_count_exceeds_stream() {
        let mut out = String::new();
        let mut segments = Vec::new();
        let result =
            ByteDecoder::decode(&mut BitSource::new(&[0x41]), 2, None, None, &mut out, &mut segments);
        assert!(result.is_err());
        assert!(segments.is_empty());
    }
}
