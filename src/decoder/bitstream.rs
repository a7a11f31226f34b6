//! Interprets the corrected data codewords as a sequence of mode segments.

use log::trace;

use crate::decoder::bit_source::BitSource;
use crate::decoder::eci::Charset;
use crate::decoder::modes::hanzi::GB2312_SUBSET;
use crate::decoder::modes::{
    AlphanumericDecoder, ByteDecoder, HanziDecoder, KanjiDecoder, Mode, NumericDecoder,
};
use crate::error::{QrError, Result};
use crate::models::{DecoderResult, ECLevel, Version};

/// Parser for the segment stream of one symbol
pub struct DecodedBitStreamParser;

impl DecodedBitStreamParser {
    /// Decode `bytes` (the concatenated data codewords of every block).
    ///
    /// `hint` is the caller's character set for byte segments that carry no
    /// ECI designator.
    pub fn decode(
        bytes: &[u8],
        version: &Version,
        ec_level: ECLevel,
        hint: Option<Charset>,
    ) -> Result<DecoderResult> {
        let mut bits = BitSource::new(bytes);
        let mut text = String::with_capacity(50);
        let mut byte_segments = Vec::new();
        let mut sequence = None;
        let mut parity = None;
        let mut eci_charset: Option<Charset> = None;
        let mut has_fnc1_first = false;
        let mut has_fnc1_second = false;

        loop {
            // Fewer than 4 bits left is an implicit terminator
            let mode = match bits.read_bits(4) {
                Some(indicator) => Mode::for_bits(indicator)?,
                None => Mode::Terminator,
            };
            trace!("segment {mode:?} at bit {}", bits.position());

            match mode {
                Mode::Terminator => break,
                Mode::Fnc1FirstPosition => has_fnc1_first = true,
                Mode::Fnc1SecondPosition => {
                    has_fnc1_second = true;
                    // Application indicator
                    bits.read_bits(8)
                        .ok_or_else(|| QrError::format("FNC1 application indicator truncated"))?;
                }
                Mode::StructuredAppend => {
                    if bits.available() < 16 {
                        return Err(QrError::format(format!(
                            "structured append header needs 16 bits, {} left",
                            bits.available()
                        )));
                    }
                    sequence = bits.read_bits(8).map(|b| b as u8);
                    parity = bits.read_bits(8).map(|b| b as u8);
                }
                Mode::Eci => {
                    let value = parse_eci_value(&mut bits)?;
                    let charset = Charset::for_eci(value).ok_or_else(|| {
                        QrError::format(format!("unsupported ECI designator {value}"))
                    })?;
                    eci_charset = Some(charset);
                }
                Mode::Hanzi => {
                    let subset = bits
                        .read_bits(4)
                        .ok_or_else(|| QrError::format("hanzi subset truncated"))?;
                    let count = read_count(&mut bits, mode, version)?;
                    if subset == GB2312_SUBSET {
                        HanziDecoder::decode(&mut bits, count, &mut text)?;
                    }
                }
                Mode::Numeric => {
                    let count = read_count(&mut bits, mode, version)?;
                    NumericDecoder::decode(&mut bits, count, &mut text)?;
                }
                Mode::Alphanumeric => {
                    let count = read_count(&mut bits, mode, version)?;
                    AlphanumericDecoder::decode(&mut bits, count, &mut text)?;
                }
                Mode::Byte => {
                    let count = read_count(&mut bits, mode, version)?;
                    ByteDecoder::decode(
                        &mut bits,
                        count,
                        eci_charset,
                        hint,
                        &mut text,
                        &mut byte_segments,
                    )?;
                }
                Mode::Kanji => {
                    let count = read_count(&mut bits, mode, version)?;
                    KanjiDecoder::decode(&mut bits, count, &mut text)?;
                }
            }
        }

        let symbology_modifier = match (eci_charset.is_some(), has_fnc1_first, has_fnc1_second) {
            (true, true, _) => 4,
            (true, false, true) => 6,
            (true, false, false) => 2,
            (false, true, _) => 3,
            (false, false, true) => 5,
            (false, false, false) => 1,
        };

        Ok(DecoderResult {
            raw_bytes: bytes.to_vec(),
            num_bits: 8 * bytes.len(),
            text,
            byte_segments,
            ec_level,
            errors_corrected: 0,
            erasures: 0,
            structured_append_sequence: sequence,
            structured_append_parity: parity,
            symbology_modifier,
            mirrored: false,
        })
    }
}

fn read_count(bits: &mut BitSource, mode: Mode, version: &Version) -> Result<usize> {
    let width = mode.character_count_bits(version);
    bits.read_bits(width)
        .map(|count| count as usize)
        .ok_or_else(|| QrError::format(format!("{mode:?} character count truncated")))
}

/// ECI designator in its 1, 2 or 3 byte form
fn parse_eci_value(bits: &mut BitSource) -> Result<u32> {
    let truncated = || QrError::format("ECI designator truncated");
    let first = bits.read_bits(8).ok_or_else(truncated)?;
    if first & 0x80 == 0 {
        return Ok(first & 0x7F);
    }
    if first & 0xC0 == 0x80 {
        let second = bits.read_bits(8).ok_or_else(truncated)?;
        return Ok(((first & 0x3F) << 8) | second);
    }
    if first & 0xE0 == 0xC0 {
        let rest = bits.read_bits(16).ok_or_else(truncated)?;
        return Ok(((first & 0x1F) << 16) | rest);
    }
    Err(QrError::format(format!("bad ECI designator prefix {first:#04x}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// MSB-first bit writer for building test streams
    struct BitWriter {
        bits: Vec<bool>,
    }

    impl BitWriter {
        fn new() -> Self {
            Self { bits: Vec::new() }
        }

        fn put(&mut self, value: u32, width: usize) -> &mut Self {
            for i in (0..width).rev() {
                self.bits.push((value >> i) & 1 == 1);
            }
            self
        }

        fn bytes(&self) -> Vec<u8> {
            self.bits
                .chunks(8)
                .map(|chunk| {
                    chunk
                        .iter()
                        .enumerate()
                        .fold(0u8, |acc, (i, &b)| acc | ((b as u8) << (7 - i)))
                })
                .collect()
        }
    }

    fn v1() -> &'static Version {
        Version::for_number(1).unwrap()
    }

    #[test]
    fn test_numeric_segment() {
        let mut w = BitWriter::new();
        w.put(0x1, 4).put(8, 10);
        w.put(12, 10).put(345, 10).put(67, 7).put(0, 4);
        let result = DecodedBitStreamParser::decode(&w.bytes(), v1(), ECLevel::M, None).unwrap();
        assert_eq!(result.text, "01234567");
        assert_eq!(result.symbology_modifier, 1);
        assert!(result.byte_segments.is_empty());
    }

    #[test]
    fn test_mixed_segments() {
        let mut w = BitWriter::new();
        // "AB" alphanumeric, then "cd" bytes
        w.put(0x2, 4).put(2, 9).put(10 * 45 + 11, 11);
        w.put(0x4, 4).put(2, 8).put(b'c' as u32, 8).put(b'd' as u32, 8);
        w.put(0, 4);
        let result = DecodedBitStreamParser::decode(&w.bytes(), v1(), ECLevel::L, None).unwrap();
        assert_eq!(result.text, "ABcd");
        assert_eq!(result.byte_segments, vec![b"cd".to_vec()]);
        assert_eq!(result.num_bits, 8 * w.bytes().len());
    }

    #[test]
    fn test_eci_switches_charset() {
        let utf8 = "\u{e9}".as_bytes();
        let mut w = BitWriter::new();
        w.put(0x7, 4).put(26, 8);
        w.put(0x4, 4).put(utf8.len() as u32, 8);
        for &b in utf8 {
            w.put(b as u32, 8);
        }
        // Latin-1 hint must not override the ECI
        let result = DecodedBitStreamParser::decode(
            &w.bytes(),
            v1(),
            ECLevel::M,
            Some(Charset::Latin1),
        )
        .unwrap();
        assert_eq!(result.text, "\u{e9}");
        assert_eq!(result.symbology_modifier, 2);
    }

    #[test]
    fn test_two_byte_eci_designator() {
        let mut bits_bytes = BitWriter::new();
        bits_bytes.put(0x80 | 0x01, 8).put(0x23, 8);
        let bytes = bits_bytes.bytes();
        assert_eq!(parse_eci_value(&mut BitSource::new(&bytes)).unwrap(), 0x123);
    }

    #[test]
    fn test_unknown_eci_is_format_error() {
        let mut w = BitWriter::new();
        w.put(0x7, 4).put(99, 8).put(0, 4);
        assert!(matches!(
            DecodedBitStreamParser::decode(&w.bytes(), v1(), ECLevel::M, None),
            Err(QrError::Format(_))
        ));
    }

    #[test]
    fn test_structured_append_and_fnc1() {
        let mut w = BitWriter::new();
        w.put(0x3, 4).put(0x21, 8).put(0x5A, 8);
        w.put(0x5, 4);
        w.put(0x1, 4).put(1, 10).put(7, 4);
        w.put(0, 4);
        let result = DecodedBitStreamParser::decode(&w.bytes(), v1(), ECLevel::M, None).unwrap();
        assert_eq!(result.text, "7");
        assert_eq!(result.structured_append_sequence, Some(0x21));
        assert_eq!(result.structured_append_parity, Some(0x5A));
        assert!(result.has_structured_append());
        assert_eq!(result.symbology_modifier, 3);
    }

    #[test]
    fn test_kanji_segment() {
        let mut w = BitWriter::new();
        w.put(0x8, 4).put(2, 8).put(3487, 13).put(6826, 13).put(0, 4);
        let result = DecodedBitStreamParser::decode(&w.bytes(), v1(), ECLevel::M, None).unwrap();
        assert_eq!(result.text, "点茗");
    }

    #[test]
    fn test_hanzi_segment() {
        let mut w = BitWriter::new();
        w.put(0xD, 4).put(GB2312_SUBSET, 4).put(1, 8).put(4655, 13).put(0, 4);
        let result = DecodedBitStreamParser::decode(&w.bytes(), v1(), ECLevel::M, None).unwrap();
        assert_eq!(result.text, "中");
    }

    #[test]
    fn test_invalid_mode_is_format_error() {
        let bytes = [0x60];
        assert!(matches!(
            DecodedBitStreamParser::decode(&bytes, v1(), ECLevel::M, None),
            Err(QrError::Format(_))
        ));
    }

    #[test]
    fn test_missing_terminator_ends_stream() {
        // Numeric "56" leaves 3 bits in the last byte
        let mut w = BitWriter::new();
        w.put(0x1, 4).put(2, 10).put(56, 7);
        let result = DecodedBitStreamParser::decode(&w.bytes(), v1(), ECLevel::M, None).unwrap();
        assert_eq!(result.text, "56");
    }

    #[test]
    fn test_padding_after_terminator_ignored() {
        let mut w = BitWriter::new();
        w.put(0x1, 4).put(1, 10).put(9, 4).put(0, 4);
        let mut bytes = w.bytes();
        bytes.extend_from_slice(&[0xEC, 0x11, 0xEC]);
        let result = DecodedBitStreamParser::decode(&bytes, v1(), ECLevel::M, None).unwrap();
        assert_eq!(result.text, "9");
    }
}
