//! Galois field GF(2^m) arithmetic and polynomials over it.
//!
//! The field is parametrized by its primitive polynomial, its size and the
//! generator base `b` (the first consecutive root of the RS generator is
//! `α^b`). QR Code uses x^8 + x^4 + x^3 + x^2 + 1 with base 0.

use std::fmt;
use std::sync::LazyLock;

/// GF(2^m) with exp/log lookup tables
pub struct GenericGF {
    exp_table: Vec<u16>,
    log_table: Vec<u16>,
    size: usize,
    primitive: u32,
    generator_base: usize,
}

/// QR Code: x^8 + x^4 + x^3 + x^2 + 1, base 0
pub static QR_CODE_FIELD_256: LazyLock<GenericGF> = LazyLock::new(|| GenericGF::new(0x011D, 256, 0));
/// Data Matrix: x^8 + x^5 + x^3 + x^2 + 1, base 1
pub static DATA_MATRIX_FIELD_256: LazyLock<GenericGF> =
    LazyLock::new(|| GenericGF::new(0x012D, 256, 1));
/// Aztec 12-bit data words: x^12 + x^6 + x^5 + x^3 + 1
pub static AZTEC_DATA_12: LazyLock<GenericGF> = LazyLock::new(|| GenericGF::new(0x1069, 4096, 1));
/// Aztec 10-bit data words: x^10 + x^3 + 1
pub static AZTEC_DATA_10: LazyLock<GenericGF> = LazyLock::new(|| GenericGF::new(0x409, 1024, 1));
/// Aztec 6-bit data words: x^6 + x + 1
pub static AZTEC_DATA_6: LazyLock<GenericGF> = LazyLock::new(|| GenericGF::new(0x43, 64, 1));
/// Aztec mode message: x^4 + x + 1
pub static AZTEC_PARAM: LazyLock<GenericGF> = LazyLock::new(|| GenericGF::new(0x13, 16, 1));
/// MaxiCode: x^6 + x + 1
pub static MAXICODE_FIELD_64: LazyLock<GenericGF> = LazyLock::new(|| GenericGF::new(0x43, 64, 1));

impl GenericGF {
    /// Build the field. `size` must be a power of two and `primitive` an
    /// irreducible polynomial of matching degree.
    pub fn new(primitive: u32, size: usize, generator_base: usize) -> Self {
        let mut exp_table = vec![0u16; size];
        let mut log_table = vec![0u16; size];
        let mut x: usize = 1;
        for slot in exp_table.iter_mut() {
            *slot = x as u16;
            x <<= 1;
            if x >= size {
                x ^= primitive as usize;
                x &= size - 1;
            }
        }
        for (i, &value) in exp_table.iter().enumerate().take(size - 1) {
            log_table[value as usize] = i as u16;
        }
        Self {
            exp_table,
            log_table,
            size,
            primitive,
            generator_base,
        }
    }

    /// Addition and subtraction are both XOR
    #[inline]
    pub fn add_or_subtract(a: u16, b: u16) -> u16 {
        a ^ b
    }

    /// α^a
    #[inline]
    pub fn exp(&self, a: usize) -> u16 {
        self.exp_table[a % (self.size - 1)]
    }

    /// log_α(a); `a` must be non-zero
    #[inline]
    pub fn log(&self, a: u16) -> usize {
        assert!(a != 0, "log(0) is undefined");
        self.log_table[a as usize] as usize
    }

    /// Multiplicative inverse; `a` must be non-zero
    #[inline]
    pub fn inverse(&self, a: u16) -> u16 {
        assert!(a != 0, "0 has no inverse");
        self.exp_table[self.size - self.log_table[a as usize] as usize - 1]
    }

    /// Field product
    #[inline]
    pub fn multiply(&self, a: u16, b: u16) -> u16 {
        if a == 0 || b == 0 {
            return 0;
        }
        let sum = self.log_table[a as usize] as usize + self.log_table[b as usize] as usize;
        self.exp_table[sum % (self.size - 1)]
    }

    /// Number of field elements
    pub fn size(&self) -> usize {
        self.size
    }

    /// Exponent of the first generator root
    pub fn generator_base(&self) -> usize {
        self.generator_base
    }

    /// `coefficient · x^degree`
    pub fn build_monomial(&self, degree: usize, coefficient: u16) -> GenericGFPoly<'_> {
        if coefficient == 0 {
            return GenericGFPoly::zero(self);
        }
        let mut coefficients = vec![0; degree + 1];
        coefficients[0] = coefficient;
        GenericGFPoly::new(self, coefficients)
    }
}

impl fmt::Debug for GenericGF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GF(0x{:x},{})", self.primitive, self.size)
    }
}

impl PartialEq for GenericGF {
    fn eq(&self, other: &Self) -> bool {
        self.primitive == other.primitive
            && self.size == other.size
            && self.generator_base == other.generator_base
    }
}

/// Immutable polynomial over a [`GenericGF`]. Coefficients are stored from
/// the highest degree term down; leading zeros are stripped.
#[derive(Clone, PartialEq)]
pub struct GenericGFPoly<'f> {
    field: &'f GenericGF,
    coefficients: Vec<u16>,
}

impl<'f> GenericGFPoly<'f> {
    /// Build from coefficients, most significant first
    pub fn new(field: &'f GenericGF, coefficients: Vec<u16>) -> Self {
        let first_non_zero = coefficients.iter().position(|&c| c != 0);
        let coefficients = match first_non_zero {
            None => vec![0],
            Some(0) => coefficients,
            Some(start) => coefficients[start..].to_vec(),
        };
        Self {
            field,
            coefficients,
        }
    }

    /// The zero polynomial
    pub fn zero(field: &'f GenericGF) -> Self {
        Self {
            field,
            coefficients: vec![0],
        }
    }

    /// The constant 1
    pub fn one(field: &'f GenericGF) -> Self {
        Self {
            field,
            coefficients: vec![1],
        }
    }

    /// Coefficients, most significant first
    pub fn coefficients(&self) -> &[u16] {
        &self.coefficients
    }

    /// Degree of the polynomial
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Whether this is the zero polynomial
    pub fn is_zero(&self) -> bool {
        self.coefficients[0] == 0
    }

    /// Coefficient of x^degree
    pub fn coefficient(&self, degree: usize) -> u16 {
        self.coefficients[self.coefficients.len() - 1 - degree]
    }

    /// Evaluate at `a` (Horner)
    pub fn evaluate_at(&self, a: u16) -> u16 {
        if a == 0 {
            return self.coefficient(0);
        }
        if a == 1 {
            return self.coefficients.iter().fold(0, |acc, &c| acc ^ c);
        }
        let mut result = self.coefficients[0];
        for &c in &self.coefficients[1..] {
            result = self.field.multiply(a, result) ^ c;
        }
        result
    }

    /// Sum (equal to the difference in characteristic 2)
    pub fn add_or_subtract(&self, other: &GenericGFPoly<'f>) -> GenericGFPoly<'f> {
        if self.is_zero() {
            return other.clone();
        }
        if other.is_zero() {
            return self.clone();
        }
        let (smaller, larger) = if self.coefficients.len() > other.coefficients.len() {
            (&other.coefficients, &self.coefficients)
        } else {
            (&self.coefficients, &other.coefficients)
        };
        let length_diff = larger.len() - smaller.len();
        let mut sum = larger.clone();
        for (slot, &c) in sum[length_diff..].iter_mut().zip(smaller.iter()) {
            *slot ^= c;
        }
        GenericGFPoly::new(self.field, sum)
    }

    /// Product of two polynomials
    pub fn multiply(&self, other: &GenericGFPoly<'f>) -> GenericGFPoly<'f> {
        if self.is_zero() || other.is_zero() {
            return GenericGFPoly::zero(self.field);
        }
        let a = &self.coefficients;
        let b = &other.coefficients;
        let mut product = vec![0u16; a.len() + b.len() - 1];
        for (i, &ac) in a.iter().enumerate() {
            for (j, &bc) in b.iter().enumerate() {
                product[i + j] ^= self.field.multiply(ac, bc);
            }
        }
        GenericGFPoly::new(self.field, product)
    }

    /// Product with a scalar
    pub fn multiply_scalar(&self, scalar: u16) -> GenericGFPoly<'f> {
        match scalar {
            0 => GenericGFPoly::zero(self.field),
            1 => self.clone(),
            _ => GenericGFPoly::new(
                self.field,
                self.coefficients
                    .iter()
                    .map(|&c| self.field.multiply(c, scalar))
                    .collect(),
            ),
        }
    }

    /// Product with `coefficient · x^degree`
    pub fn multiply_by_monomial(&self, degree: usize, coefficient: u16) -> GenericGFPoly<'f> {
        if coefficient == 0 {
            return GenericGFPoly::zero(self.field);
        }
        let mut product = vec![0u16; self.coefficients.len() + degree];
        for (slot, &c) in product.iter_mut().zip(self.coefficients.iter()) {
            *slot = self.field.multiply(c, coefficient);
        }
        GenericGFPoly::new(self.field, product)
    }

    /// Polynomial long division, returning `(quotient, remainder)`.
    /// `other` must be non-zero.
    pub fn divide(&self, other: &GenericGFPoly<'f>) -> (GenericGFPoly<'f>, GenericGFPoly<'f>) {
        assert!(!other.is_zero(), "polynomial division by zero");
        let mut quotient = GenericGFPoly::zero(self.field);
        let mut remainder = self.clone();
        let inverse_lead = self.field.inverse(other.coefficient(other.degree()));

        while remainder.degree() >= other.degree() && !remainder.is_zero() {
            let degree_diff = remainder.degree() - other.degree();
            let scale = self
                .field
                .multiply(remainder.coefficient(remainder.degree()), inverse_lead);
            let term = other.multiply_by_monomial(degree_diff, scale);
            quotient = quotient.add_or_subtract(&self.field.build_monomial(degree_diff, scale));
            remainder = remainder.add_or_subtract(&term);
        }
        (quotient, remainder)
    }
}

impl fmt::Debug for GenericGFPoly<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        let mut first = true;
        for degree in (0..=self.degree()).rev() {
            let c = self.coefficient(degree);
            if c == 0 {
                continue;
            }
            if !first {
                f.write_str(" + ")?;
            }
            first = false;
            match degree {
                0 => write!(f, "{c}")?,
                1 => write!(f, "{c}x")?,
                _ => write!(f, "{c}x^{degree}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_field_tables() {
        let gf = &*QR_CODE_FIELD_256;
        assert_eq!(gf.exp(0), 1);
        assert_eq!(gf.exp(8), 29);
        assert_eq!(gf.exp(255), 1);
        assert_eq!(gf.log(2), 1);
        for a in 1..256u16 {
            assert_eq!(gf.multiply(a, gf.inverse(a)), 1);
        }
    }

    #[test]
    fn test_multiply_matches_carryless_reduction() {
        let gf = &*QR_CODE_FIELD_256;
        // 0x53 * 0xCA over 0x11D
        let mut a = 0x53u32;
        let mut b = 0xCAu32;
        let mut p = 0u32;
        while b != 0 {
            if b & 1 != 0 {
                p ^= a;
            }
            a <<= 1;
            if a & 0x100 != 0 {
                a ^= 0x11D;
            }
            b >>= 1;
        }
        assert_eq!(gf.multiply(0x53, 0xCA) as u32, p);
    }

    #[test]
    fn test_poly_strips_leading_zeros() {
        let gf = &*QR_CODE_FIELD_256;
        let p = GenericGFPoly::new(gf, vec![0, 0, 3, 1]);
        assert_eq!(p.degree(), 1);
        assert_eq!(p.coefficient(1), 3);
        assert!(GenericGFPoly::new(gf, vec![0, 0]).is_zero());
    }

    #[test]
    fn test_divide_roundtrip() {
        let gf = &*QR_CODE_FIELD_256;
        let a = GenericGFPoly::new(gf, vec![7, 0, 13, 200, 5]);
        let b = GenericGFPoly::new(gf, vec![1, 19, 3]);
        let (q, r) = a.divide(&b);
        assert!(r.degree() < b.degree());
        assert_eq!(q.multiply(&b).add_or_subtract(&r), a);
    }

    #[test]
    fn test_evaluate() {
        let gf = &*QR_CODE_FIELD_256;
        // (x + 2)(x + 4) vanishes at 2 and 4
        let p = GenericGFPoly::new(gf, vec![1, 2]).multiply(&GenericGFPoly::new(gf, vec![1, 4]));
        assert_eq!(p.evaluate_at(2), 0);
        assert_eq!(p.evaluate_at(4), 0);
        assert_ne!(p.evaluate_at(3), 0);
    }

    #[test]
    fn test_other_fields_build() {
        assert_eq!(AZTEC_DATA_12.size(), 4096);
        assert_eq!(DATA_MATRIX_FIELD_256.generator_base(), 1);
        assert_eq!(AZTEC_PARAM.multiply(AZTEC_PARAM.inverse(7), 7), 1);
        assert_ne!(*QR_CODE_FIELD_256, *DATA_MATRIX_FIELD_256);
    }
}
