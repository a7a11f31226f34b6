//! Reads format information, version and raw codewords out of a sampled
//! symbol matrix.

use super::format::FormatInformation;
use super::function_mask::FunctionMask;
use super::unmask::unmask;
use super::version::decode_version_information;
use crate::error::{QrError, Result};
use crate::models::{BitMatrix, MaskPattern, Version};

/// Parser over a symbol-resolution [`BitMatrix`]. Holds the matrix mutably:
/// reading codewords unmasks it in place and `mirror` transposes it.
pub struct BitMatrixParser {
    bit_matrix: BitMatrix,
    parsed_version: Option<&'static Version>,
    parsed_format_info: Option<FormatInformation>,
    unmasked_with: Option<(MaskPattern, &'static Version)>,
    mirror: bool,
}

impl BitMatrixParser {
    /// Wrap a sampled symbol; the dimension must be 21..=177 and ≡ 1 (mod 4)
    pub fn new(bit_matrix: BitMatrix) -> Result<Self> {
        let dimension = bit_matrix.height();
        if dimension < 21 || dimension & 0x03 != 1 || bit_matrix.width() != dimension {
            return Err(QrError::format(format!(
                "symbol is {}x{}, not a QR dimension",
                bit_matrix.width(),
                dimension
            )));
        }
        Ok(Self {
            bit_matrix,
            parsed_version: None,
            parsed_format_info: None,
            unmasked_with: None,
            mirror: false,
        })
    }

    /// The matrix in its current (possibly unmasked or mirrored) state
    pub fn bit_matrix(&self) -> &BitMatrix {
        &self.bit_matrix
    }

    #[inline]
    fn copy_bit(&self, i: usize, j: usize, bits: u32) -> u32 {
        let bit = if self.mirror {
            self.bit_matrix.get(j, i)
        } else {
            self.bit_matrix.get(i, j)
        };
        (bits << 1) | bit as u32
    }

    /// Read both 15-bit format information copies and resolve them
    pub fn read_format_information(&mut self) -> Result<FormatInformation> {
        if let Some(info) = self.parsed_format_info {
            return Ok(info);
        }

        // Around the top-left finder
        let mut bits1 = 0;
        for i in 0..6 {
            bits1 = self.copy_bit(i, 8, bits1);
        }
        bits1 = self.copy_bit(7, 8, bits1);
        bits1 = self.copy_bit(8, 8, bits1);
        bits1 = self.copy_bit(8, 7, bits1);
        for j in (0..6).rev() {
            bits1 = self.copy_bit(8, j, bits1);
        }

        // Split between the top-right and bottom-left finders
        let dimension = self.bit_matrix.height();
        let mut bits2 = 0;
        for j in ((dimension - 7)..dimension).rev() {
            bits2 = self.copy_bit(8, j, bits2);
        }
        for i in (dimension - 8)..dimension {
            bits2 = self.copy_bit(i, 8, bits2);
        }

        let info = FormatInformation::decode(bits1, bits2)
            .ok_or_else(|| QrError::format("format information unreadable"))?;
        self.parsed_format_info = Some(info);
        Ok(info)
    }

    /// Version from the dimension (1-6) or the version information blocks (7+)
    pub fn read_version(&mut self) -> Result<&'static Version> {
        if let Some(version) = self.parsed_version {
            return Ok(version);
        }

        let dimension = self.bit_matrix.height();
        let provisional = (dimension - 17) / 4;
        if provisional <= 6 {
            return Version::for_number(provisional as u32);
        }

        let ij_min = dimension - 11;

        // Top-right block
        let mut bits = 0;
        for j in (0..6).rev() {
            for i in (ij_min..dimension - 8).rev() {
                bits = self.copy_bit(i, j, bits);
            }
        }
        if let Some(version) = decode_version_information(bits)
            .filter(|v| v.dimension() == dimension)
        {
            self.parsed_version = Some(version);
            return Ok(version);
        }

        // Bottom-left block
        bits = 0;
        for i in (0..6).rev() {
            for j in (ij_min..dimension - 8).rev() {
                bits = self.copy_bit(i, j, bits);
            }
        }
        if let Some(version) = decode_version_information(bits)
            .filter(|v| v.dimension() == dimension)
        {
            self.parsed_version = Some(version);
            return Ok(version);
        }
        Err(QrError::format("version information unreadable"))
    }

    /// Unmask the matrix and read data and EC codewords in placement order
    pub fn read_codewords(&mut self) -> Result<Vec<u8>> {
        let format_info = self.read_format_information()?;
        let version = self.read_version()?;

        let function_pattern = FunctionMask::new(version)?;
        unmask(&mut self.bit_matrix, format_info.mask_pattern, &function_pattern);
        self.unmasked_with = Some((format_info.mask_pattern, version));

        let dimension = self.bit_matrix.height();
        let mut result = Vec::with_capacity(version.total_codewords());
        let mut reading_up = true;
        let mut current_byte = 0u8;
        let mut bits_read = 0;

        // Column pairs from the right edge, skipping the vertical timing column
        let mut j = dimension - 1;
        while j > 0 {
            if j == 6 {
                j -= 1;
            }
            for count in 0..dimension {
                let i = if reading_up { dimension - 1 - count } else { count };
                for col in 0..2 {
                    let x = j - col;
                    if function_pattern.is_function(x, i) {
                        continue;
                    }
                    bits_read += 1;
                    current_byte <<= 1;
                    if self.bit_matrix.get(x, i) {
                        current_byte |= 1;
                    }
                    if bits_read == 8 {
                        result.push(current_byte);
                        bits_read = 0;
                        current_byte = 0;
                    }
                }
            }
            reading_up = !reading_up;
            j = j.saturating_sub(2);
        }

        if result.len() != version.total_codewords() {
            return Err(QrError::format(format!(
                "read {} codewords, expected {}",
                result.len(),
                version.total_codewords()
            )));
        }
        Ok(result)
    }

    /// Re-apply the data mask so the matrix is back in its sampled state.
    /// Does nothing if codewords were never read.
    pub fn remask(&mut self) -> Result<()> {
        if let Some((mask_pattern, version)) = self.unmasked_with.take() {
            let function_pattern = FunctionMask::new(version)?;
            unmask(&mut self.bit_matrix, mask_pattern, &function_pattern);
        }
        Ok(())
    }

    /// Switch between normal and transposed reads; forgets parsed state
    pub fn set_mirror(&mut self, mirror: bool) {
        self.parsed_version = None;
        self.parsed_format_info = None;
        self.mirror = mirror;
    }

    /// Transpose the matrix in place
    pub fn mirror(&mut self) {
        self.bit_matrix.transpose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;
    use crate::models::ECLevel;

    #[test]
    fn test_rejects_non_qr_dimensions() {
        assert!(BitMatrixParser::new(BitMatrix::square(20)).is_err());
        assert!(BitMatrixParser::new(BitMatrix::square(17)).is_err());
        assert!(BitMatrixParser::new(BitMatrix::new(21, 25)).is_err());
        assert!(BitMatrixParser::new(BitMatrix::square(21)).is_ok());
    }

    #[test]
    fn test_reads_format_and_version() {
        let code = Encoder::encode_with_version("PARSER", ECLevel::H, 8).unwrap();
        let mut parser = BitMatrixParser::new(code.matrix().clone()).unwrap();
        let info = parser.read_format_information().unwrap();
        assert_eq!(info.ec_level, ECLevel::H);
        assert_eq!(info.mask_pattern, code.mask_pattern());
        assert_eq!(parser.read_version().unwrap().number(), 8);
    }

    #[test]
    fn test_codeword_count_matches_version() {
        let code = Encoder::encode("0123456789", ECLevel::L).unwrap();
        let mut parser = BitMatrixParser::new(code.matrix().clone()).unwrap();
        let codewords = parser.read_codewords().unwrap();
        assert_eq!(codewords.len(), code.version().total_codewords());
    }

    #[test]
    fn test_remask_restores_sampled_matrix() {
        let code = Encoder::encode("REMASK", ECLevel::M).unwrap();
        let mut parser = BitMatrixParser::new(code.matrix().clone()).unwrap();
        parser.read_codewords().unwrap();
        assert_ne!(parser.bit_matrix(), code.matrix());
        parser.remask().unwrap();
        assert_eq!(parser.bit_matrix(), code.matrix());

        // A second remask is a no-op
        parser.remask().unwrap();
        assert_eq!(parser.bit_matrix(), code.matrix());
    }

    #[test]
    fn test_mirrored_read_of_transposed_symbol() {
        let code = Encoder::encode_with_version("MIRROR", ECLevel::Q, 7).unwrap();
        let mut transposed = code.matrix().clone();
        transposed.transpose();

        let mut parser = BitMatrixParser::new(transposed).unwrap();
        parser.set_mirror(true);
        assert_eq!(parser.read_version().unwrap().number(), 7);
        assert_eq!(parser.read_format_information().unwrap().ec_level, ECLevel::Q);
        parser.mirror();
        assert_eq!(parser.bit_matrix(), code.matrix());
    }
}
