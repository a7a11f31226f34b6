//! Data mask removal. Masking is an XOR, so applying it twice restores the
//! original matrix.
use crate::decoder::function_mask::FunctionMask;
use crate::models::{BitMatrix, MaskPattern};

/// XOR every data module selected by `mask_pattern`; function modules are left alone
pub fn unmask(matrix: &mut BitMatrix, mask_pattern: MaskPattern, func: &FunctionMask) {
    let width = matrix.width();
    let height = matrix.height();

    for y in 0..height {
        for x in 0..width {
            if !func.is_function(x, y) && mask_pattern.is_masked(y, x) {
                matrix.flip(x, y);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Version;

    #[test]
    fn test_unmask() {
        let mut matrix = BitMatrix::new(21, 21);
        matrix.set(10, 10, true);
        matrix.set(10, 11, true);

        let func = FunctionMask::new(Version::for_number(1).unwrap()).unwrap();
        unmask(&mut matrix, MaskPattern::Pattern0, &func);

        // (10+10)%2 == 0 flips, (10+11)%2 != 0 stays
        assert!(!matrix.get(10, 10));
        assert!(matrix.get(10, 11));
        assert!(!matrix.get(11, 10));
        assert!(matrix.get(11, 11));
        // finder area untouched
        assert!(!matrix.get(0, 0));
    }

    #[test]
    fn test_unmask_twice_restores() {
        let mut matrix = BitMatrix::new(25, 25);
        matrix.set(12, 17, true);
        let original = matrix.clone();
        let func = FunctionMask::new(Version::for_number(2).unwrap()).unwrap();
        for mask in MaskPattern::ALL {
            unmask(&mut matrix, mask, &func);
            unmask(&mut matrix, mask, &func);
            assert_eq!(matrix, original);
        }
    }
}
