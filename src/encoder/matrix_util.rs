//! Symbol layout: function patterns, format and version information, and
//! data placement in the same zig-zag order the parser reads them.

use super::bit_buffer::BitBuffer;
use crate::decoder::format::FormatInformation;
use crate::decoder::version::version_info_bits;
use crate::error::{QrError, Result};
use crate::models::{BitMatrix, ECLevel, MaskPattern, Version};

/// Square grid of modules that are dark, light, or not placed yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGrid {
    size: usize,
    cells: Vec<Option<bool>>,
}

impl ModuleGrid {
    /// `size` x `size` grid with every module unset
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// Edge length in modules
    pub fn size(&self) -> usize {
        self.size
    }

    /// Module colour, `None` while unset
    pub fn get(&self, x: usize, y: usize) -> Option<bool> {
        self.cells[y * self.size + x]
    }

    /// Whether the module at (x, y) is dark; unplaced modules count as light
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        self.get(x, y) == Some(true)
    }

    /// Set one module
    pub fn set(&mut self, x: usize, y: usize, dark: bool) {
        self.cells[y * self.size + x] = Some(dark);
    }

    fn is_empty(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_none()
    }

    /// Dark modules as set bits; unset modules are light
    pub fn to_bit_matrix(&self) -> BitMatrix {
        let mut matrix = BitMatrix::square(self.size);
        for y in 0..self.size {
            for x in 0..self.size {
                if self.is_dark(x, y) {
                    matrix.set(x, y, true);
                }
            }
        }
        matrix
    }
}

/// Format information bit positions around the top-left finder, LSB first
const TYPE_INFO_COORDINATES: [(usize, usize); 15] = [
    (8, 0),
    (8, 1),
    (8, 2),
    (8, 3),
    (8, 4),
    (8, 5),
    (8, 7),
    (8, 8),
    (7, 8),
    (5, 8),
    (4, 8),
    (3, 8),
    (2, 8),
    (1, 8),
    (0, 8),
];

/// Lay out a complete symbol from its interleaved codeword bits
pub fn build_matrix(
    data_bits: &BitBuffer,
    ec_level: ECLevel,
    version: &Version,
    mask_pattern: MaskPattern,
) -> Result<ModuleGrid> {
    let mut grid = ModuleGrid::new(version.dimension());
    embed_basic_patterns(version, &mut grid);
    embed_type_info(ec_level, mask_pattern, &mut grid);
    maybe_embed_version_info(version, &mut grid);
    embed_data_bits(data_bits, mask_pattern, &mut grid)?;
    Ok(grid)
}

/// Finders with separators, the dark module, alignment and timing patterns
pub fn embed_basic_patterns(version: &Version, grid: &mut ModuleGrid) {
    let size = grid.size();
    for (x, y) in [(0, 0), (size - 7, 0), (0, size - 7)] {
        embed_position_detection_pattern(x, y, grid);
    }
    embed_separators(grid);
    grid.set(8, size - 8, true);
    embed_alignment_patterns(version, grid);
    embed_timing_patterns(grid);
}

fn embed_position_detection_pattern(left: usize, top: usize, grid: &mut ModuleGrid) {
    for dy in 0..7 {
        for dx in 0..7 {
            let ring = dx.min(dy).min(6 - dx).min(6 - dy);
            grid.set(left + dx, top + dy, ring != 1);
        }
    }
}

fn embed_separators(grid: &mut ModuleGrid) {
    let size = grid.size();
    for i in 0..8 {
        // Horizontal
        grid.set(i, 7, false);
        grid.set(size - 8 + i, 7, false);
        grid.set(i, size - 8, false);
        // Vertical
        grid.set(7, i, false);
        grid.set(size - 8, i, false);
        grid.set(7, size - 8 + i, false);
    }
}

fn embed_alignment_patterns(version: &Version, grid: &mut ModuleGrid) {
    let centers = version.alignment_centers();
    for &cy in centers {
        for &cx in centers {
            let (cx, cy) = (cx as usize, cy as usize);
            // Positions overlapping a finder are already taken
            if !grid.is_empty(cx, cy) {
                continue;
            }
            for dy in 0..5 {
                for dx in 0..5 {
                    let ring = dx.min(dy).min(4 - dx).min(4 - dy);
                    grid.set(cx - 2 + dx, cy - 2 + dy, ring != 1);
                }
            }
        }
    }
}

fn embed_timing_patterns(grid: &mut ModuleGrid) {
    let size = grid.size();
    for i in 8..size - 8 {
        let dark = i % 2 == 0;
        if grid.is_empty(i, 6) {
            grid.set(i, 6, dark);
        }
        if grid.is_empty(6, i) {
            grid.set(6, i, dark);
        }
    }
}

/// Both copies of the 15-bit format information
pub fn embed_type_info(ec_level: ECLevel, mask_pattern: MaskPattern, grid: &mut ModuleGrid) {
    let size = grid.size();
    let type_info = FormatInformation::codeword(ec_level, mask_pattern);
    for (i, &(x1, y1)) in TYPE_INFO_COORDINATES.iter().enumerate() {
        let dark = (type_info >> i) & 1 == 1;
        grid.set(x1, y1, dark);
        if i < 8 {
            grid.set(size - 1 - i, 8, dark);
        } else {
            grid.set(8, size - 7 + (i - 8), dark);
        }
    }
}

/// Both 6x3 version information blocks, versions 7 and up
pub fn maybe_embed_version_info(version: &Version, grid: &mut ModuleGrid) {
    let Some(info) = version_info_bits(version) else {
        return;
    };
    let size = grid.size();
    let mut bit_index = 0;
    for i in 0..6 {
        for j in 0..3 {
            let dark = (info >> bit_index) & 1 == 1;
            bit_index += 1;
            grid.set(i, size - 11 + j, dark);
            grid.set(size - 11 + j, i, dark);
        }
    }
}

/// Fill every free module with masked data bits, two columns at a time from
/// the right edge, snaking up and down. Remainder modules get 0.
pub fn embed_data_bits(data_bits: &BitBuffer, mask_pattern: MaskPattern, grid: &mut ModuleGrid) -> Result<()> {
    let size = grid.size();
    let mut bit_index = 0;
    let mut upward = true;
    let mut x = size - 1;
    while x > 0 {
        if x == 6 {
            x -= 1;
        }
        for count in 0..size {
            let y = if upward { size - 1 - count } else { count };
            for col in 0..2 {
                let xx = x - col;
                if !grid.is_empty(xx, y) {
                    continue;
                }
                let mut dark = false;
                if bit_index < data_bits.len() {
                    dark = data_bits.get(bit_index);
                    bit_index += 1;
                }
                if mask_pattern.is_masked(y, xx) {
                    dark = !dark;
                }
                grid.set(xx, y, dark);
            }
        }
        upward = !upward;
        x = x.saturating_sub(2);
    }
    if bit_index != data_bits.len() {
        return Err(QrError::InvalidArgument(format!(
            "placed {bit_index} of {} data bits",
            data_bits.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::function_mask::FunctionMask;
    use crate::decoder::parser::BitMatrixParser;

    #[test]
    fn test_basic_patterns_match_function_mask() {
        for number in [1, 2, 7, 14] {
            let version = Version::for_number(number).unwrap();
            let mut grid = ModuleGrid::new(version.dimension());
            embed_basic_patterns(version, &mut grid);
            embed_type_info(ECLevel::M, MaskPattern::Pattern0, &mut grid);
            maybe_embed_version_info(version, &mut grid);
            let mask = FunctionMask::new(version).unwrap();
            for y in 0..grid.size() {
                for x in 0..grid.size() {
                    assert_eq!(
                        !grid.is_empty(x, y),
                        mask.is_function(x, y),
                        "version {number} module ({x}, {y})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_format_and_version_readable() {
        let version = Version::for_number(7).unwrap();
        let total_bits = version.total_codewords() * 8;
        let mut bits = BitBuffer::new();
        for i in 0..total_bits {
            bits.append_bit(i % 3 == 0);
        }
        let grid = build_matrix(&bits, ECLevel::Q, version, MaskPattern::Pattern5).unwrap();
        let mut parser = BitMatrixParser::new(grid.to_bit_matrix()).unwrap();
        let format = parser.read_format_information().unwrap();
        assert_eq!(format.ec_level, ECLevel::Q);
        assert_eq!(format.mask_pattern, MaskPattern::Pattern5);
        assert_eq!(parser.read_version().unwrap().number(), 7);
        assert_eq!(parser.read_codewords().unwrap(), bits.to_bytes(0, version.total_codewords()));
    }

    #[test]
    fn test_too_many_bits_rejected() {
        let version = Version::for_number(1).unwrap();
        let mut bits = BitBuffer::new();
        for _ in 0..version.total_codewords() * 8 + 8 {
            bits.append_bit(true);
        }
        assert!(build_matrix(&bits, ECLevel::L, version, MaskPattern::Pattern0).is_err());
    }
}
