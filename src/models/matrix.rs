use std::fmt;

use crate::error::{QrError, Result};

/// Row-major bit-packed 2D grid. `true` means a black module/pixel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    row_size: usize,
    bits: Vec<u32>,
}

impl BitMatrix {
    /// Create an all-white matrix with the given dimensions
    pub fn new(width: usize, height: usize) -> Self {
        let row_size = width.div_ceil(32);
        Self {
            width,
            height,
            row_size,
            bits: vec![0; row_size * height],
        }
    }

    /// Create a square all-white matrix
    pub fn square(dimension: usize) -> Self {
        Self::new(dimension, dimension)
    }

    /// Build a matrix from a row-major slice of booleans
    pub fn from_bools(width: usize, height: usize, cells: &[bool]) -> Result<Self> {
        if cells.len() != width * height {
            return Err(QrError::InvalidArgument(format!(
                "expected {} cells, got {}",
                width * height,
                cells.len()
            )));
        }
        let mut matrix = Self::new(width, height);
        for (index, _) in cells.iter().enumerate().filter(|(_, black)| **black) {
            matrix.set(index % width, index / width, true);
        }
        Ok(matrix)
    }

    /// Get matrix width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Get matrix height
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> usize {
        y * self.row_size + x / 32
    }

    /// Get bit at (x, y); reads outside the matrix are white
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        (self.bits[self.offset(x, y)] >> (x & 31)) & 1 != 0
    }

    /// Same as [`BitMatrix::get`] but accepts signed coordinates
    #[inline]
    pub fn get_signed(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && self.get(x as usize, y as usize)
    }

    /// Set bit at (x, y); writes outside the matrix are ignored
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = self.offset(x, y);
        if value {
            self.bits[offset] |= 1 << (x & 31);
        } else {
            self.bits[offset] &= !(1 << (x & 31));
        }
    }

    /// Flip bit at (x, y)
    #[inline]
    pub fn flip(&mut self, x: usize, y: usize) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = self.offset(x, y);
        self.bits[offset] ^= 1 << (x & 31);
    }

    /// Clear all bits to white
    pub fn clear(&mut self) {
        self.bits.fill(0);
    }

    /// Set every bit of a rectangular region to black
    pub fn set_region(&mut self, left: usize, top: usize, width: usize, height: usize) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(QrError::InvalidArgument(
                "region must have positive size".into(),
            ));
        }
        let right = left + width;
        let bottom = top + height;
        if right > self.width || bottom > self.height {
            return Err(QrError::InvalidArgument(format!(
                "region {left},{top} {width}x{height} does not fit in {}x{}",
                self.width, self.height
            )));
        }
        for y in top..bottom {
            for x in left..right {
                let offset = self.offset(x, y);
                self.bits[offset] |= 1 << (x & 31);
            }
        }
        Ok(())
    }

    /// Copy one row out as booleans
    pub fn row(&self, y: usize) -> Vec<bool> {
        (0..self.width).map(|x| self.get(x, y)).collect()
    }

    /// Transpose a square matrix in place (reads it as its mirror image)
    pub fn transpose(&mut self) {
        let size = self.width.min(self.height);
        for x in 0..size {
            for y in (x + 1)..size {
                if self.get(x, y) != self.get(y, x) {
                    self.flip(y, x);
                    self.flip(x, y);
                }
            }
        }
    }

    /// First black bit in row-major order
    pub fn top_left_on_bit(&self) -> Option<(usize, usize)> {
        let index = self.bits.iter().position(|&word| word != 0)?;
        let y = index / self.row_size;
        let x = (index % self.row_size) * 32 + self.bits[index].trailing_zeros() as usize;
        Some((x, y))
    }

    /// Last black bit in row-major order
    pub fn bottom_right_on_bit(&self) -> Option<(usize, usize)> {
        let index = self.bits.iter().rposition(|&word| word != 0)?;
        let y = index / self.row_size;
        let x = (index % self.row_size) * 32 + 31 - self.bits[index].leading_zeros() as usize;
        Some((x, y))
    }

    /// Number of black bits
    pub fn count_ones(&self) -> usize {
        self.bits.iter().map(|word| word.count_ones() as usize).sum()
    }
}

impl Default for BitMatrix {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl fmt::Display for BitMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                f.write_str(if self.get(x, y) { "X " } else { "  " })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_matrix() {
        let mut matrix = BitMatrix::new(40, 8);
        assert_eq!(matrix.width(), 40);
        assert_eq!(matrix.height(), 8);

        matrix.set(35, 4, true);
        assert!(matrix.get(35, 4));
        assert!(!matrix.get(34, 4));

        matrix.flip(35, 4);
        assert!(!matrix.get(35, 4));

        matrix.set(3, 3, true);
        matrix.clear();
        assert!(!matrix.get(3, 3));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut matrix = BitMatrix::new(8, 8);
        matrix.set(10, 10, true);
        assert!(!matrix.get(10, 10));
        assert!(!matrix.get_signed(-1, 2));
        assert_eq!(matrix.count_ones(), 0);
    }

    #[test]
    fn test_set_region() {
        let mut matrix = BitMatrix::square(21);
        matrix.set_region(2, 3, 4, 5).unwrap();
        assert_eq!(matrix.count_ones(), 20);
        assert!(matrix.get(5, 7));
        assert!(!matrix.get(6, 7));
        assert!(matrix.set_region(20, 0, 2, 1).is_err());
    }

    #[test]
    fn test_transpose() {
        let mut matrix = BitMatrix::square(5);
        matrix.set(4, 1, true);
        matrix.set(2, 2, true);
        matrix.transpose();
        assert!(matrix.get(1, 4));
        assert!(!matrix.get(4, 1));
        assert!(matrix.get(2, 2));
    }

    #[test]
    fn test_on_bit_bounds() {
        let mut matrix = BitMatrix::new(70, 10);
        assert_eq!(matrix.top_left_on_bit(), None);
        matrix.set(40, 2, true);
        matrix.set(65, 7, true);
        matrix.set(3, 5, true);
        assert_eq!(matrix.top_left_on_bit(), Some((40, 2)));
        assert_eq!(matrix.bottom_right_on_bit(), Some((65, 7)));
    }
}
