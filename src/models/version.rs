use std::sync::LazyLock;

use super::ECLevel;
use crate::error::{QrError, Result};

// Per level (L, M, Q, H) and version (index 0 unused).
const ECC_CODEWORDS_PER_BLOCK: [[u8; 41]; 4] = [
    [
        0, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28,
        30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ],
    [
        0, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ],
    [
        0, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30,
        30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ],
    [
        0, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ],
];

const NUM_ERROR_CORRECTION_BLOCKS: [[u8; 41]; 4] = [
    [
        0, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12, 13,
        14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ],
    [
        0, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ],
    [
        0, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27,
        29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ],
    [
        0, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32,
        35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ],
];

const ALIGNMENT_PATTERN_CENTERS: [&[u8]; 40] = [
    &[],
    &[6, 18],
    &[6, 22],
    &[6, 26],
    &[6, 30],
    &[6, 34],
    &[6, 22, 38],
    &[6, 24, 42],
    &[6, 26, 46],
    &[6, 28, 50],
    &[6, 30, 54],
    &[6, 32, 58],
    &[6, 34, 62],
    &[6, 26, 46, 66],
    &[6, 26, 48, 70],
    &[6, 26, 50, 74],
    &[6, 30, 54, 78],
    &[6, 30, 56, 82],
    &[6, 30, 58, 86],
    &[6, 34, 62, 90],
    &[6, 28, 50, 72, 94],
    &[6, 26, 50, 74, 98],
    &[6, 30, 54, 78, 102],
    &[6, 28, 54, 80, 106],
    &[6, 32, 58, 84, 110],
    &[6, 30, 58, 86, 114],
    &[6, 34, 62, 90, 118],
    &[6, 26, 50, 74, 98, 122],
    &[6, 30, 54, 78, 102, 126],
    &[6, 26, 52, 78, 104, 130],
    &[6, 30, 56, 82, 108, 134],
    &[6, 34, 60, 86, 112, 138],
    &[6, 30, 58, 86, 114, 142],
    &[6, 34, 62, 90, 118, 146],
    &[6, 30, 54, 78, 102, 126, 150],
    &[6, 24, 50, 76, 102, 128, 154],
    &[6, 28, 54, 80, 106, 132, 158],
    &[6, 32, 58, 84, 110, 136, 162],
    &[6, 26, 54, 82, 110, 138, 166],
    &[6, 30, 58, 86, 114, 142, 170],
];

/// A run of equally sized blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ECB {
    /// Number of blocks in the run
    pub count: usize,
    /// Data codewords per block
    pub data_codewords: usize,
}

/// Block layout for one version at one error correction level.
/// Shorter blocks come first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ECBlocks {
    /// EC codewords appended to every block
    pub ec_codewords_per_block: usize,
    /// Block runs, short blocks first
    pub blocks: Vec<ECB>,
}

impl ECBlocks {
    /// Total number of blocks
    pub fn num_blocks(&self) -> usize {
        self.blocks.iter().map(|b| b.count).sum()
    }

    /// Total EC codewords across all blocks
    pub fn total_ec_codewords(&self) -> usize {
        self.ec_codewords_per_block * self.num_blocks()
    }

    /// Total data codewords across all blocks
    pub fn total_data_codewords(&self) -> usize {
        self.blocks.iter().map(|b| b.count * b.data_codewords).sum()
    }
}

/// One of the 40 QR Code symbol versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    number: u8,
    alignment_centers: &'static [u8],
    ec_blocks: [ECBlocks; 4],
    total_codewords: usize,
}

static VERSIONS: LazyLock<Vec<Version>> = LazyLock::new(|| (1..=40).map(Version::build).collect());

/// Data-carrying modules left after all function patterns (ISO 18004 layout)
fn raw_data_modules(version: usize) -> usize {
    let mut result = (16 * version + 128) * version + 64;
    if version >= 2 {
        let num_align = version / 7 + 2;
        result -= (25 * num_align - 10) * num_align - 55;
        if version >= 7 {
            result -= 36;
        }
    }
    result
}

impl Version {
    fn build(number: u8) -> Self {
        let v = number as usize;
        let total_codewords = raw_data_modules(v) / 8;
        let ec_blocks = ECLevel::ALL.map(|level| {
            let num_blocks = NUM_ERROR_CORRECTION_BLOCKS[level.ordinal()][v] as usize;
            let ec_per_block = ECC_CODEWORDS_PER_BLOCK[level.ordinal()][v] as usize;
            let data_total = total_codewords - num_blocks * ec_per_block;
            let short_data = data_total / num_blocks;
            let num_long = data_total % num_blocks;
            let mut blocks = vec![ECB {
                count: num_blocks - num_long,
                data_codewords: short_data,
            }];
            if num_long > 0 {
                blocks.push(ECB {
                    count: num_long,
                    data_codewords: short_data + 1,
                });
            }
            ECBlocks {
                ec_codewords_per_block: ec_per_block,
                blocks,
            }
        });
        Self {
            number,
            alignment_centers: ALIGNMENT_PATTERN_CENTERS[v - 1],
            ec_blocks,
            total_codewords,
        }
    }

    /// Look up a version by number (1-40)
    pub fn for_number(number: u32) -> Result<&'static Version> {
        if !(1..=40).contains(&number) {
            return Err(QrError::format(format!("invalid version number {number}")));
        }
        Ok(&VERSIONS[number as usize - 1])
    }

    /// Version implied by a symbol dimension, before reading version information
    pub fn provisional_for_dimension(dimension: usize) -> Result<&'static Version> {
        if dimension % 4 != 1 || dimension < 21 {
            return Err(QrError::format(format!("invalid dimension {dimension}")));
        }
        Self::for_number(((dimension - 17) / 4) as u32)
    }

    /// Version number 1-40
    pub fn number(&self) -> u32 {
        self.number as u32
    }

    /// Modules per side
    pub fn dimension(&self) -> usize {
        17 + 4 * self.number as usize
    }

    /// Row/column coordinates of alignment pattern centres
    pub fn alignment_centers(&self) -> &'static [u8] {
        self.alignment_centers
    }

    /// Total codewords (data + EC) in the symbol
    pub fn total_codewords(&self) -> usize {
        self.total_codewords
    }

    /// Block layout for a given level
    pub fn ec_blocks_for(&self, level: ECLevel) -> &ECBlocks {
        &self.ec_blocks[level.ordinal()]
    }
}
