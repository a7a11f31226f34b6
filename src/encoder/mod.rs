//! QR code writer.
//!
//! Produces single-segment symbols: numeric, alphanumeric, or byte mode
//! (UTF-8 behind an ECI designator when the text is not ASCII), in the
//! smallest version that fits, with the mask of lowest penalty. Mostly used
//! to produce test input for the reader and by the `qrtool` CLI.

/// Growable bit sequence
pub mod bit_buffer;
/// Mask penalty rules
pub mod mask_penalty;
/// Function pattern and data placement
pub mod matrix_util;
/// Luminance rasterization
pub mod render;

use std::sync::LazyLock;

use image::GrayImage;
use log::debug;

use crate::decoder::galois::QR_CODE_FIELD_256;
use crate::decoder::modes::Mode;
use crate::decoder::modes::alphanumeric::alphanumeric_value;
use crate::decoder::reed_solomon::ReedSolomonEncoder;
use crate::error::{QrError, Result};
use crate::models::{BitMatrix, ECLevel, MaskPattern, Version};

use bit_buffer::BitBuffer;

/// ECI assignment number for UTF-8
const ECI_UTF8: u32 = 26;

static RS_ENCODER: LazyLock<ReedSolomonEncoder<'static>> =
    LazyLock::new(|| ReedSolomonEncoder::new(&QR_CODE_FIELD_256));

/// An encoded symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrCode {
    mode: Mode,
    ec_level: ECLevel,
    version: &'static Version,
    mask_pattern: MaskPattern,
    matrix: BitMatrix,
}

impl QrCode {
    /// Module grid, `true` is dark
    pub fn matrix(&self) -> &BitMatrix {
        &self.matrix
    }

    /// Segment mode of the payload
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Error correction level
    pub fn ec_level(&self) -> ECLevel {
        self.ec_level
    }

    /// Symbol version
    pub fn version(&self) -> &'static Version {
        self.version
    }

    /// Mask picked by the penalty rules
    pub fn mask_pattern(&self) -> MaskPattern {
        self.mask_pattern
    }

    /// Modules per side
    pub fn dimension(&self) -> usize {
        self.matrix.width()
    }

    /// Square luminance raster and its edge length in pixels
    pub fn to_luma(&self, scale: usize, quiet_zone: usize) -> (Vec<u8>, usize) {
        render::to_luma(&self.matrix, scale, quiet_zone)
    }

    /// Raster as an `image` buffer
    pub fn to_image(&self, scale: usize, quiet_zone: usize) -> GrayImage {
        render::to_image(&self.matrix, scale, quiet_zone)
    }
}

/// Text to symbol
pub struct Encoder;

impl Encoder {
    /// Encode `text` in the smallest version that holds it at `ec_level`
    pub fn encode(text: &str, ec_level: ECLevel) -> Result<QrCode> {
        Self::encode_inner(text, ec_level, None)
    }

    /// Encode `text` in exactly the given version
    pub fn encode_with_version(text: &str, ec_level: ECLevel, version: u32) -> Result<QrCode> {
        let version = Version::for_number(version)
            .map_err(|_| QrError::InvalidArgument(format!("no version {version}")))?;
        Self::encode_inner(text, ec_level, Some(version))
    }

    fn encode_inner(text: &str, ec_level: ECLevel, forced: Option<&'static Version>) -> Result<QrCode> {
        let mode = choose_mode(text);

        let mut header = BitBuffer::new();
        if mode == Mode::Byte && !text.is_ascii() {
            header.append_bits(Mode::Eci.bits(), 4);
            header.append_bits(ECI_UTF8, 8);
        }
        header.append_bits(mode.bits(), 4);

        let mut data = BitBuffer::new();
        let num_letters = append_data(text, mode, &mut data)?;

        let version = match forced {
            Some(version) => {
                if !will_fit(bits_needed(mode, &header, &data, version), version, ec_level) {
                    return Err(QrError::InvalidArgument(format!(
                        "data does not fit version {} at level {ec_level}",
                        version.number()
                    )));
                }
                version
            }
            None => recommend_version(mode, &header, &data, ec_level)?,
        };

        let count_bits = mode.character_count_bits(version);
        if num_letters >= 1 << count_bits {
            return Err(QrError::InvalidArgument(format!(
                "{num_letters} characters overflow a {count_bits}-bit count"
            )));
        }
        let mut bits = header;
        bits.append_bits(num_letters as u32, count_bits);
        bits.append_buffer(&data);

        let ec_blocks = version.ec_blocks_for(ec_level);
        let num_data_bytes = version.total_codewords() - ec_blocks.total_ec_codewords();
        terminate_bits(num_data_bytes, &mut bits)?;
        let final_bits = interleave_with_ec_bytes(&bits, version, ec_level)?;

        let mut best: Option<(u32, MaskPattern, matrix_util::ModuleGrid)> = None;
        for mask_pattern in MaskPattern::ALL {
            let grid = matrix_util::build_matrix(&final_bits, ec_level, version, mask_pattern)?;
            let penalty = mask_penalty::total_penalty(&grid);
            if best.as_ref().is_none_or(|(lowest, _, _)| penalty < *lowest) {
                best = Some((penalty, mask_pattern, grid));
            }
        }
        let (penalty, mask_pattern, grid) =
            best.ok_or_else(|| QrError::InvalidArgument("no mask pattern".to_string()))?;
        debug!(
            "encoded {} chars as {mode:?} in version {} {ec_level}, mask {} (penalty {penalty})",
            num_letters,
            version.number(),
            mask_pattern.bits()
        );

        Ok(QrCode {
            mode,
            ec_level,
            version,
            mask_pattern,
            matrix: grid.to_bit_matrix(),
        })
    }
}

/// Numeric if every character is a digit, alphanumeric if every character
/// is in the 45-symbol table, byte otherwise
fn choose_mode(text: &str) -> Mode {
    if text.is_empty() {
        return Mode::Byte;
    }
    if text.chars().all(|c| c.is_ascii_digit()) {
        Mode::Numeric
    } else if text.chars().all(|c| alphanumeric_value(c).is_some()) {
        Mode::Alphanumeric
    } else {
        Mode::Byte
    }
}

/// Append the segment payload; returns the character count field value
fn append_data(text: &str, mode: Mode, bits: &mut BitBuffer) -> Result<usize> {
    match mode {
        Mode::Numeric => {
            let digits: Vec<u32> = text.chars().filter_map(|c| c.to_digit(10)).collect();
            for group in digits.chunks(3) {
                let value = group.iter().fold(0, |acc, d| acc * 10 + d);
                let width = match group.len() {
                    3 => 10,
                    2 => 7,
                    _ => 4,
                };
                bits.append_bits(value, width);
            }
            Ok(digits.len())
        }
        Mode::Alphanumeric => {
            let values: Vec<u32> = text.chars().filter_map(alphanumeric_value).collect();
            for pair in values.chunks(2) {
                match *pair {
                    [a, b] => bits.append_bits(a * 45 + b, 11),
                    [a] => bits.append_bits(a, 6),
                    _ => {}
                }
            }
            Ok(values.len())
        }
        Mode::Byte => {
            for &byte in text.as_bytes() {
                bits.append_bits(byte as u32, 8);
            }
            Ok(text.len())
        }
        other => Err(QrError::InvalidArgument(format!("cannot encode in {other:?} mode"))),
    }
}

fn bits_needed(mode: Mode, header: &BitBuffer, data: &BitBuffer, version: &Version) -> usize {
    header.len() + mode.character_count_bits(version) + data.len()
}

fn will_fit(num_input_bits: usize, version: &Version, ec_level: ECLevel) -> bool {
    let num_data_bytes =
        version.total_codewords() - version.ec_blocks_for(ec_level).total_ec_codewords();
    num_data_bytes >= num_input_bits.div_ceil(8)
}

fn recommend_version(
    mode: Mode,
    header: &BitBuffer,
    data: &BitBuffer,
    ec_level: ECLevel,
) -> Result<&'static Version> {
    for number in 1..=40 {
        let version = Version::for_number(number)?;
        if will_fit(bits_needed(mode, header, data, version), version, ec_level) {
            return Ok(version);
        }
    }
    Err(QrError::InvalidArgument(format!(
        "data too big for any version at level {ec_level}"
    )))
}

/// Terminator, bit padding to a byte boundary, then alternating pad bytes
fn terminate_bits(num_data_bytes: usize, bits: &mut BitBuffer) -> Result<()> {
    let capacity = num_data_bytes * 8;
    if bits.len() > capacity {
        return Err(QrError::InvalidArgument(format!(
            "{} data bits exceed capacity {capacity}",
            bits.len()
        )));
    }
    for _ in 0..4 {
        if bits.len() >= capacity {
            break;
        }
        bits.append_bit(false);
    }
    while bits.len() % 8 != 0 {
        bits.append_bit(false);
    }
    for i in 0..num_data_bytes - bits.len_in_bytes() {
        bits.append_bits(if i % 2 == 0 { 0xEC } else { 0x11 }, 8);
    }
    Ok(())
}

/// Split data codewords into blocks, append each block's EC codewords, and
/// interleave: all first bytes, all second bytes, ...
fn interleave_with_ec_bytes(bits: &BitBuffer, version: &Version, ec_level: ECLevel) -> Result<BitBuffer> {
    let ec_blocks = version.ec_blocks_for(ec_level);
    let ec_count = ec_blocks.ec_codewords_per_block;

    let mut blocks: Vec<(Vec<u8>, Vec<u8>)> = Vec::with_capacity(ec_blocks.num_blocks());
    let mut offset = 0;
    for ecb in &ec_blocks.blocks {
        for _ in 0..ecb.count {
            let data = bits.to_bytes(offset * 8, ecb.data_codewords);
            let mut codewords: Vec<u16> = data.iter().map(|&b| b as u16).collect();
            codewords.resize(ecb.data_codewords + ec_count, 0);
            RS_ENCODER.encode(&mut codewords, ec_count)?;
            let ec = codewords[ecb.data_codewords..].iter().map(|&c| c as u8).collect();
            blocks.push((data, ec));
            offset += ecb.data_codewords;
        }
    }

    let max_data = blocks.iter().map(|(d, _)| d.len()).max().unwrap_or(0);
    let mut result = BitBuffer::new();
    for i in 0..max_data {
        for (data, _) in &blocks {
            if let Some(&byte) = data.get(i) {
                result.append_bits(byte as u32, 8);
            }
        }
    }
    for i in 0..ec_count {
        for (_, ec) in &blocks {
            result.append_bits(ec[i] as u32, 8);
        }
    }

    if result.len_in_bytes() != version.total_codewords() {
        return Err(QrError::InvalidArgument(format!(
            "interleaved {} codewords, expected {}",
            result.len_in_bytes(),
            version.total_codewords()
        )));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::parser::BitMatrixParser;

    #[test]
    fn test_mode_choice() {
        assert_eq!(choose_mode("0123"), Mode::Numeric);
        assert_eq!(choose_mode("HELLO WORLD"), Mode::Alphanumeric);
        assert_eq!(choose_mode("hello"), Mode::Byte);
        assert_eq!(choose_mode("Grüße"), Mode::Byte);
        assert_eq!(choose_mode(""), Mode::Byte);
    }

    #[test]
    fn test_annex_i_codewords() {
        // "01234567" at 1-M
        let code = Encoder::encode("01234567", ECLevel::M).unwrap();
        assert_eq!(code.version().number(), 1);
        let mut parser = BitMatrixParser::new(code.matrix().clone()).unwrap();
        let codewords = parser.read_codewords().unwrap();
        assert_eq!(
            &codewords[..16],
            &[0x10, 0x20, 0x0C, 0x56, 0x61, 0x80, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11]
        );
        assert_eq!(
            &codewords[16..],
            &[0xA5, 0x24, 0xD4, 0xC1, 0xED, 0x36, 0xC7, 0x87, 0x2C, 0x55]
        );
    }

    #[test]
    fn test_smallest_version_chosen() {
        assert_eq!(Encoder::encode("HELLO WORLD", ECLevel::M).unwrap().version().number(), 1);
        // 25 alphanumeric characters overflow 1-M (20) but fit 2-M (38)
        let text = "ABCDEFGHIJKLMNOPQRSTUVWXY";
        assert_eq!(Encoder::encode(text, ECLevel::M).unwrap().version().number(), 2);
    }

    #[test]
    fn test_forced_version() {
        let code = Encoder::encode_with_version("7", ECLevel::H, 7).unwrap();
        assert_eq!(code.dimension(), 45);
        let too_long = "9".repeat(100);
        assert!(matches!(
            Encoder::encode_with_version(&too_long, ECLevel::H, 1),
            Err(QrError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_too_big() {
        let text = "x".repeat(3000);
        assert!(matches!(
            Encoder::encode(&text, ECLevel::H),
            Err(QrError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_format_matches_chosen_mask() {
        let code = Encoder::encode("mask check", ECLevel::Q).unwrap();
        let mut parser = BitMatrixParser::new(code.matrix().clone()).unwrap();
        let format = parser.read_format_information().unwrap();
        assert_eq!(format.ec_level, ECLevel::Q);
        assert_eq!(format.mask_pattern, code.mask_pattern());
    }
}
