use crate::decoder::bit_source::BitSource;
use crate::decoder::eci::Charset;
use crate::error::{QrError, Result};

/// GB2312 subset indicator following the Hanzi mode bits
pub const GB2312_SUBSET: u32 = 1;

/// Hanzi mode decoder (Mode 1101, GB/T 18284)
/// 13 bits per character, packed from GB2312 0xA1A1-0xAAFE and 0xB0A1-0xFAFE
pub struct HanziDecoder;

impl HanziDecoder {
    /// Append `count` GB2312 characters to `result`
    pub fn decode(bits: &mut BitSource, count: usize, result: &mut String) -> Result<()> {
        if 13 * count > bits.available() {
            return Err(QrError::format("hanzi segment truncated"));
        }
        let mut buffer = Vec::with_capacity(2 * count);
        for _ in 0..count {
            let two_bytes = bits
                .read_bits(13)
                .ok_or_else(|| QrError::format("hanzi segment truncated"))?;
            let mut assembled = ((two_bytes / 0x060) << 8) | (two_bytes % 0x060);
            assembled += if assembled < 0x00A00 { 0x0A1A1 } else { 0x0A6A1 };
            buffer.push((assembled >> 8) as u8);
            buffer.push(assembled as u8);
        }
        // encoding_rs serves GB2312 through its GBK superset
        let gb2312 = Charset::for_label("gb2312")?;
        result.push_str(&gb2312.decode(&buffer));
        Ok(())
    }
}
