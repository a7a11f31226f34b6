/// Reed-Solomon error correction over a [`GenericGF`].
/// Codewords are stored most significant coefficient first.
use std::sync::RwLock;

use log::trace;
use thiserror::Error;

use super::galois::{GenericGF, GenericGFPoly};

/// Why a codeword block could not be corrected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReedSolomonError {
    /// More errors than the EC codewords can repair
    #[error("too many errors to correct")]
    TooManyErrors,
    /// The Euclidean algorithm hit a zero remainder too early
    #[error("r_{{i-1}} was zero")]
    ZeroRemainder,
    /// The error locator has no constant term
    #[error("sigma tilde(0) was zero")]
    ZeroSigma,
    /// The error locator did not split over the field
    #[error("error locator degree does not match number of roots")]
    LocatorRootMismatch,
    /// A root points outside the received block
    #[error("bad error location")]
    BadErrorLocation,
    /// Correction left a non-zero syndrome behind
    #[error("uncorrectable error")]
    Uncorrectable,
    /// Encoder asked for an impossible data/EC split
    #[error("invalid block layout")]
    InvalidBlock,
}

/// Reed-Solomon decoder
pub struct ReedSolomonDecoder<'f> {
    field: &'f GenericGF,
}

impl<'f> ReedSolomonDecoder<'f> {
    /// Decoder over the given field
    pub fn new(field: &'f GenericGF) -> Self {
        Self { field }
    }

    /// Correct `received` in place. The last `two_s` entries are EC
    /// codewords. Returns the number of corrected codewords.
    pub fn decode(&self, received: &mut [u16], two_s: usize) -> Result<usize, ReedSolomonError> {
        let field = self.field;
        let syndrome = self.calculate_syndrome(received, two_s);
        if syndrome.iter().all(|&s| s == 0) {
            return Ok(0);
        }

        let syndrome = GenericGFPoly::new(field, syndrome);
        let (sigma, omega) =
            self.run_euclidean_algorithm(field.build_monomial(two_s, 1), syndrome, two_s)?;
        let error_locations = self.find_error_locations(&sigma)?;
        if error_locations.len() > two_s / 2 {
            return Err(ReedSolomonError::TooManyErrors);
        }
        let error_magnitudes = self.find_error_magnitudes(&omega, &error_locations);

        for (&location, &magnitude) in error_locations.iter().zip(error_magnitudes.iter()) {
            let log = field.log(location);
            if log >= received.len() {
                return Err(ReedSolomonError::BadErrorLocation);
            }
            let position = received.len() - 1 - log;
            received[position] = GenericGF::add_or_subtract(received[position], magnitude);
        }

        // A miscorrection would leave syndromes behind
        if self.calculate_syndrome(received, two_s).iter().any(|&s| s != 0) {
            return Err(ReedSolomonError::Uncorrectable);
        }
        trace!("reed-solomon corrected {} codewords", error_locations.len());
        Ok(error_locations.len())
    }

    /// Syndromes S_i = r(α^(i+base)), stored highest index first
    fn calculate_syndrome(&self, received: &[u16], two_s: usize) -> Vec<u16> {
        let poly = GenericGFPoly::new(self.field, received.to_vec());
        let mut syndrome = vec![0u16; two_s];
        for i in 0..two_s {
            syndrome[two_s - 1 - i] = poly.evaluate_at(self.field.exp(i + self.field.generator_base()));
        }
        syndrome
    }

    fn run_euclidean_algorithm(
        &self,
        a: GenericGFPoly<'f>,
        b: GenericGFPoly<'f>,
        big_r: usize,
    ) -> Result<(GenericGFPoly<'f>, GenericGFPoly<'f>), ReedSolomonError> {
        let field = self.field;
        let (a, b) = if a.degree() < b.degree() { (b, a) } else { (a, b) };

        let mut r_last = a;
        let mut r = b;
        let mut t_last = GenericGFPoly::zero(field);
        let mut t = GenericGFPoly::one(field);

        // Stop once deg r < R/2
        while 2 * r.degree() >= big_r {
            let r_last_last = std::mem::replace(&mut r_last, r.clone());
            let t_last_last = std::mem::replace(&mut t_last, t.clone());

            if r_last.is_zero() {
                return Err(ReedSolomonError::ZeroRemainder);
            }
            r = r_last_last;
            let mut q = GenericGFPoly::zero(field);
            let inverse_lead = field.inverse(r_last.coefficient(r_last.degree()));
            while r.degree() >= r_last.degree() && !r.is_zero() {
                let degree_diff = r.degree() - r_last.degree();
                let scale = field.multiply(r.coefficient(r.degree()), inverse_lead);
                q = q.add_or_subtract(&field.build_monomial(degree_diff, scale));
                r = r.add_or_subtract(&r_last.multiply_by_monomial(degree_diff, scale));
            }

            t = q.multiply(&t_last).add_or_subtract(&t_last_last);

            if r.degree() >= r_last.degree() && !r.is_zero() {
                return Err(ReedSolomonError::Uncorrectable);
            }
        }

        let sigma_tilde_at_zero = t.coefficient(0);
        if sigma_tilde_at_zero == 0 {
            return Err(ReedSolomonError::ZeroSigma);
        }
        let inverse = field.inverse(sigma_tilde_at_zero);
        Ok((t.multiply_scalar(inverse), r.multiply_scalar(inverse)))
    }

    /// Chien search: brute-force every non-zero field element
    fn find_error_locations(&self, locator: &GenericGFPoly<'f>) -> Result<Vec<u16>, ReedSolomonError> {
        let num_errors = locator.degree();
        if num_errors == 1 {
            return Ok(vec![locator.coefficient(1)]);
        }
        let mut result = Vec::with_capacity(num_errors);
        for i in 1..self.field.size() {
            if result.len() >= num_errors {
                break;
            }
            if locator.evaluate_at(i as u16) == 0 {
                result.push(self.field.inverse(i as u16));
            }
        }
        if result.len() != num_errors {
            return Err(ReedSolomonError::LocatorRootMismatch);
        }
        Ok(result)
    }

    /// Forney's formula
    fn find_error_magnitudes(&self, evaluator: &GenericGFPoly<'f>, locations: &[u16]) -> Vec<u16> {
        let field = self.field;
        locations
            .iter()
            .enumerate()
            .map(|(i, &location)| {
                let xi_inverse = field.inverse(location);
                let denominator = locations
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .fold(1u16, |acc, (_, &other)| {
                        // 1 + X_j / X_i
                        let term = field.multiply(other, xi_inverse);
                        field.multiply(acc, term ^ 1)
                    });
                let mut magnitude =
                    field.multiply(evaluator.evaluate_at(xi_inverse), field.inverse(denominator));
                if field.generator_base() != 0 {
                    magnitude = field.multiply(magnitude, xi_inverse);
                }
                magnitude
            })
            .collect()
    }
}

/// Reed-Solomon encoder with a memoized generator polynomial table
pub struct ReedSolomonEncoder<'f> {
    field: &'f GenericGF,
    cached_generators: RwLock<Vec<Vec<u16>>>,
}

impl<'f> ReedSolomonEncoder<'f> {
    /// Encoder over the given field
    pub fn new(field: &'f GenericGF) -> Self {
        Self {
            field,
            cached_generators: RwLock::new(vec![vec![1]]),
        }
    }

    fn build_generator(&self, degree: usize) -> GenericGFPoly<'f> {
        if let Ok(cache) = self.cached_generators.read() {
            if let Some(coefficients) = cache.get(degree) {
                return GenericGFPoly::new(self.field, coefficients.clone());
            }
        }
        // A poisoned lock only means another thread panicked mid-push; the
        // vector itself is still a valid prefix.
        let mut cache = match self.cached_generators.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut last = GenericGFPoly::new(self.field, cache[cache.len() - 1].clone());
        for d in cache.len()..=degree {
            let root = self.field.exp(d - 1 + self.field.generator_base());
            last = last.multiply(&GenericGFPoly::new(self.field, vec![1, root]));
            cache.push(last.coefficients().to_vec());
        }
        GenericGFPoly::new(self.field, cache[degree].clone())
    }

    /// Overwrite the last `ec_count` entries of `to_encode` with EC codewords
    /// computed over the preceding data codewords.
    pub fn encode(&self, to_encode: &mut [u16], ec_count: usize) -> Result<(), ReedSolomonError> {
        if ec_count == 0 || ec_count >= to_encode.len() {
            return Err(ReedSolomonError::InvalidBlock);
        }
        let data_count = to_encode.len() - ec_count;
        let generator = self.build_generator(ec_count);
        let info = GenericGFPoly::new(self.field, to_encode[..data_count].to_vec())
            .multiply_by_monomial(ec_count, 1);
        let (_, remainder) = info.divide(&generator);
        let coefficients = remainder.coefficients();
        let num_zero = ec_count - coefficients.len();
        to_encode[data_count..data_count + num_zero].fill(0);
        to_encode[data_count + num_zero..].copy_from_slice(coefficients);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::galois::{DATA_MATRIX_FIELD_256, QR_CODE_FIELD_256};

    fn rs_encode(data: &[u8], ec_count: usize) -> Vec<u16> {
        let encoder = ReedSolomonEncoder::new(&QR_CODE_FIELD_256);
        let mut block: Vec<u16> = data.iter().map(|&b| b as u16).collect();
        block.resize(data.len() + ec_count, 0);
        encoder.encode(&mut block, ec_count).unwrap();
        block
    }

    #[test]
    fn test_known_v1m_block() {
        // "01234567" at 1-M, ISO 18004 Annex I
        let data = [
            0x10, 0x20, 0x0C, 0x56, 0x61, 0x80, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11, 0xEC, 0x11,
            0xEC, 0x11,
        ];
        let block = rs_encode(&data, 10);
        let ec: Vec<u16> = block[16..].to_vec();
        assert_eq!(ec, vec![0xA5, 0x24, 0xD4, 0xC1, 0xED, 0x36, 0xC7, 0x87, 0x2C, 0x55]);
    }

    #[test]
    fn test_no_errors() {
        let mut block = rs_encode(b"hello reed solomon", 10);
        let decoder = ReedSolomonDecoder::new(&QR_CODE_FIELD_256);
        assert_eq!(decoder.decode(&mut block, 10), Ok(0));
    }

    #[test]
    fn test_corrects_up_to_capacity() {
        let original = rs_encode(b"The quick brown fox", 10);
        let decoder = ReedSolomonDecoder::new(&QR_CODE_FIELD_256);
        for errors in 1..=5 {
            let mut block = original.clone();
            for k in 0..errors {
                block[k * 4] ^= 0x5A;
            }
            assert_eq!(decoder.decode(&mut block, 10), Ok(errors));
            assert_eq!(block, original);
        }
    }

    #[test]
    fn test_errors_in_ec_region() {
        let original = rs_encode(&[1, 2, 3, 4, 5, 6, 7, 8], 8);
        let decoder = ReedSolomonDecoder::new(&QR_CODE_FIELD_256);
        let mut block = original.clone();
        let last = block.len() - 1;
        block[last] ^= 0xFF;
        block[last - 3] ^= 0x01;
        assert_eq!(decoder.decode(&mut block, 8), Ok(2));
        assert_eq!(block, original);
    }

    #[test]
    fn test_too_many_errors() {
        let original = rs_encode(b"0123456789abcdef", 10);
        let decoder = ReedSolomonDecoder::new(&QR_CODE_FIELD_256);
        let mut block = original.clone();
        for slot in block.iter_mut().take(8) {
            *slot ^= 0xA7;
        }
        let result = decoder.decode(&mut block, 10);
        // 8 errors with 10 EC codewords either fails or miscorrects; never the original
        if result.is_ok() {
            assert_ne!(block, original);
        }
    }

    #[test]
    fn test_nonzero_generator_base() {
        let field = &*DATA_MATRIX_FIELD_256;
        let encoder = ReedSolomonEncoder::new(field);
        let mut block: Vec<u16> = (1..=12).collect();
        block.resize(12 + 6, 0);
        encoder.encode(&mut block, 6).unwrap();
        let original = block.clone();
        block[2] ^= 0x33;
        block[15] ^= 0x81;
        let decoder = ReedSolomonDecoder::new(field);
        assert_eq!(decoder.decode(&mut block, 6), Ok(2));
        assert_eq!(block, original);
    }

    #[test]
    fn test_generator_cache_grows_once() {
        let encoder = ReedSolomonEncoder::new(&QR_CODE_FIELD_256);
        let g10 = encoder.build_generator(10);
        assert_eq!(g10.degree(), 10);
        assert_eq!(encoder.cached_generators.read().unwrap().len(), 11);
        let g7 = encoder.build_generator(7);
        assert_eq!(g7.degree(), 7);
        assert_eq!(encoder.cached_generators.read().unwrap().len(), 11);
    }
}
