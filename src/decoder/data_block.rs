use crate::error::{QrError, Result};
use crate::models::{ECLevel, Version};

/// One Reed-Solomon block: data codewords followed by EC codewords
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock {
    num_data_codewords: usize,
    codewords: Vec<u8>,
}

impl DataBlock {
    /// Number of leading data codewords
    pub fn num_data_codewords(&self) -> usize {
        self.num_data_codewords
    }

    /// Data and EC codewords of the block
    pub fn codewords(&self) -> &[u8] {
        &self.codewords
    }

    /// Mutable access for in-place correction
    pub fn codewords_mut(&mut self) -> &mut [u8] {
        &mut self.codewords
    }

    /// Undo the interleaving of `raw_codewords`.
    ///
    /// Data codewords are interleaved block by block; longer blocks carry one
    /// extra data codeword that comes after all short blocks' data. EC
    /// codewords follow, interleaved the same way.
    pub fn get_data_blocks(
        raw_codewords: &[u8],
        version: &Version,
        ec_level: ECLevel,
    ) -> Result<Vec<DataBlock>> {
        if raw_codewords.len() != version.total_codewords() {
            return Err(QrError::InvalidArgument(format!(
                "{} codewords for a version {} symbol",
                raw_codewords.len(),
                version.number()
            )));
        }

        let ec_blocks = version.ec_blocks_for(ec_level);
        let ec_per_block = ec_blocks.ec_codewords_per_block;
        let mut result: Vec<DataBlock> = ec_blocks
            .blocks
            .iter()
            .flat_map(|ecb| std::iter::repeat_n(ecb.data_codewords, ecb.count))
            .map(|num_data| DataBlock {
                num_data_codewords: num_data,
                codewords: vec![0; ec_per_block + num_data],
            })
            .collect();
        let num_blocks = result.len();

        let shorter_total = result[0].codewords.len();
        let longer_start = result
            .iter()
            .position(|b| b.codewords.len() != shorter_total)
            .unwrap_or(num_blocks);
        let shorter_data = shorter_total - ec_per_block;

        let mut raw = raw_codewords.iter().copied();
        let mut next = || {
            raw.next()
                .ok_or_else(|| QrError::format("ran out of codewords while de-interleaving"))
        };

        for i in 0..shorter_data {
            for block in result.iter_mut() {
                block.codewords[i] = next()?;
            }
        }
        for block in result[longer_start..].iter_mut() {
            block.codewords[shorter_data] = next()?;
        }
        for i in shorter_data..shorter_total {
            for (j, block) in result.iter_mut().enumerate() {
                let offset = if j < longer_start { i } else { i + 1 };
                block.codewords[offset] = next()?;
            }
        }
        Ok(result)
    }
}
