use crate::decoder::bit_source::BitSource;
use crate::decoder::eci::Charset;
use crate::error::{QrError, Result};

/// Kanji mode decoder (Mode 1000)
/// 13 bits per character, packed from the Shift_JIS ranges 0x8140-0x9FFC and
/// 0xE040-0xEBBF
pub struct KanjiDecoder;

impl KanjiDecoder {
    /// Append `count` Shift_JIS characters to `result`
    pub fn decode(bits: &mut BitSource, count: usize, result: &mut String) -> Result<()> {
        if 13 * count > bits.available() {
            return Err(QrError::format("kanji segment truncated"));
        }
        let mut buffer = Vec::with_capacity(2 * count);
        for _ in 0..count {
            let two_bytes = bits
                .read_bits(13)
                .ok_or_else(|| QrError::format("kanji segment truncated"))?;
            let mut assembled = ((two_bytes / 0x0C0) << 8) | (two_bytes % 0x0C0);
            assembled += if assembled < 0x01F00 { 0x08140 } else { 0x0C140 };
            buffer.push((assembled >> 8) as u8);
            buffer.push(assembled as u8);
        }
        result.push_str(&Charset::SHIFT_JIS.decode(&buffer));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kanji_decode() {
        // 0x935F and 0xE4AA pack to 3487 and 6826
        let bytes = [0x6C, 0xFE, 0xAA, 0x80];
        let mut out = String::new();
        KanjiDecoder::decode(&mut BitSource::new(&bytes), 2, &mut out).unwrap();
        assert_eq!(out, "点茗");
    }

    #[test]
    fn test_truncated() {
        let mut out = String::new();
        assert!(KanjiDecoder::decode(&mut BitSource::new(&[0x6C]), 1, &mut out).is_err());
    }
}
