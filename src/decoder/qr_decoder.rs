use log::debug;

use crate::config::DecodeHints;
use crate::decoder::bitstream::DecodedBitStreamParser;
use crate::decoder::data_block::DataBlock;
use crate::decoder::eci::Charset;
use crate::decoder::galois::QR_CODE_FIELD_256;
use crate::decoder::parser::BitMatrixParser;
use crate::decoder::reed_solomon::ReedSolomonDecoder;
use crate::error::{QrError, Result};
use crate::models::{BitMatrix, DecoderResult};

/// Decodes a sampled symbol matrix into text
pub struct QrDecoder {
    rs_decoder: ReedSolomonDecoder<'static>,
}

impl Default for QrDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDecoder {
    /// Decoder over the QR Code field GF(256)
    pub fn new() -> Self {
        Self {
            rs_decoder: ReedSolomonDecoder::new(&QR_CODE_FIELD_256),
        }
    }

    /// Decode a row-major grid of modules, `true` meaning dark
    pub fn decode_bools(
        &self,
        image: &[bool],
        dimension: usize,
        hints: &DecodeHints,
    ) -> Result<DecoderResult> {
        let bits = BitMatrix::from_bools(dimension, dimension, image)?;
        self.decode(bits, hints)
    }

    /// Decode a symbol-resolution matrix (one bit per module).
    ///
    /// On a format or checksum failure the symbol is read once more as its
    /// mirror image. If that also fails the first error is returned.
    pub fn decode(&self, bits: BitMatrix, hints: &DecodeHints) -> Result<DecoderResult> {
        let charset = hints.charset()?;
        let mut parser = BitMatrixParser::new(bits)?;

        let first_error = match self.decode_parser(&mut parser, charset) {
            Ok(result) => return Ok(result),
            Err(err @ (QrError::Format(_) | QrError::Checksum(_))) => err,
            Err(err) => return Err(err),
        };

        debug!("normal read failed ({first_error}), retrying mirrored");
        match self.decode_mirrored(&mut parser, charset) {
            Ok(result) => Ok(result),
            Err(err) => {
                debug!("mirrored read failed too: {err}");
                Err(first_error)
            }
        }
    }

    fn decode_mirrored(
        &self,
        parser: &mut BitMatrixParser,
        charset: Option<Charset>,
    ) -> Result<DecoderResult> {
        parser.remask()?;
        parser.set_mirror(true);
        parser.read_version()?;
        parser.read_format_information()?;
        parser.mirror();

        let mut result = self.decode_parser(parser, charset)?;
        result.mirrored = true;
        Ok(result)
    }

    fn decode_parser(
        &self,
        parser: &mut BitMatrixParser,
        charset: Option<Charset>,
    ) -> Result<DecoderResult> {
        let version = parser.read_version()?;
        let ec_level = parser.read_format_information()?.ec_level;
        let codewords = parser.read_codewords()?;

        let mut data_blocks = DataBlock::get_data_blocks(&codewords, version, ec_level)?;
        let total_data: usize = data_blocks.iter().map(DataBlock::num_data_codewords).sum();
        let mut result_bytes = Vec::with_capacity(total_data);
        let mut errors_corrected = 0;

        for block in &mut data_blocks {
            let num_data = block.num_data_codewords();
            errors_corrected += self.correct_errors(block.codewords_mut(), num_data)?;
            result_bytes.extend_from_slice(&block.codewords()[..num_data]);
        }
        if errors_corrected > 0 {
            debug!("corrected {errors_corrected} codewords in version {} symbol", version.number());
        }

        let mut result = DecodedBitStreamParser::decode(&result_bytes, version, ec_level, charset)?;
        result.errors_corrected = errors_corrected;
        Ok(result)
    }

    /// Correct one block in place; only the data codewords are copied back
    fn correct_errors(&self, codewords: &mut [u8], num_data_codewords: usize) -> Result<usize> {
        let mut ints: Vec<u16> = codewords.iter().map(|&b| b as u16).collect();
        let num_ec_codewords = codewords.len() - num_data_codewords;
        let corrected = self.rs_decoder.decode(&mut ints, num_ec_codewords)?;
        for (dst, &src) in codewords.iter_mut().zip(&ints).take(num_data_codewords) {
            *dst = src as u8;
        }
        Ok(corrected)
    }
}
