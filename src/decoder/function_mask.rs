use crate::error::Result;
use crate::models::{BitMatrix, Version};

/// Function module mask for a specific QR version.
/// true = function module (not data), false = data module.
pub struct FunctionMask {
    mask: BitMatrix,
    version: u32,
}

impl FunctionMask {
    /// Mark finder patterns with separators and format areas, alignment
    /// patterns, timing patterns, and version areas.
    pub fn new(version: &Version) -> Result<Self> {
        let size = version.dimension();
        let mut mask = BitMatrix::square(size);

        // Finders, separators, format information (dark module included)
        mask.set_region(0, 0, 9, 9)?;
        mask.set_region(size - 8, 0, 8, 9)?;
        mask.set_region(0, size - 8, 9, 8)?;

        let centers = version.alignment_centers();
        let max = centers.len();
        for (x, &cx) in centers.iter().enumerate() {
            for (y, &cy) in centers.iter().enumerate() {
                // Skip the three positions that collide with finders
                if (x == 0 && (y == 0 || y == max - 1)) || (x == max - 1 && y == 0) {
                    continue;
                }
                mask.set_region(cy as usize - 2, cx as usize - 2, 5, 5)?;
            }
        }

        // Timing patterns
        mask.set_region(6, 9, 1, size - 17)?;
        mask.set_region(9, 6, size - 17, 1)?;

        if version.number() > 6 {
            mask.set_region(size - 11, 0, 3, 6)?;
            mask.set_region(0, size - 11, 6, 3)?;
        }

        Ok(Self {
            mask,
            version: version.number(),
        })
    }

    /// Symbol edge in modules
    pub fn size(&self) -> usize {
        self.mask.width()
    }

    /// Version number the mask was built for
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Whether (x, y) belongs to a function pattern
    #[inline]
    pub fn is_function(&self, x: usize, y: usize) -> bool {
        self.mask.get(x, y)
    }

    /// Modules left for codewords and remainder bits
    pub fn data_modules_count(&self) -> usize {
        self.size() * self.size() - self.mask.count_ones()
    }
}
