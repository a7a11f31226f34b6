/// Version information decoding for versions 7-40
use super::bch::{VERSION_INFO_CODEWORDS, nearest_codeword};
use crate::models::Version;

const MAX_VERSION_BIT_DIFFERENCE: u32 = 3;

/// Match an 18-bit version reading against the 34 valid codewords
pub fn decode_version_information(version_bits: u32) -> Option<&'static Version> {
    let (index, distance) = nearest_codeword(&VERSION_INFO_CODEWORDS, &[version_bits])?;
    if distance > MAX_VERSION_BIT_DIFFERENCE {
        return None;
    }
    Version::for_number(index as u32 + 7).ok()
}

/// 18-bit codeword stored in symbols of this version (versions 7+)
pub fn version_info_bits(version: &Version) -> Option<u32> {
    let number = version.number() as usize;
    (number >= 7).then(|| VERSION_INFO_CODEWORDS[number - 7])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact() {
        for n in 7..=40 {
            let bits = version_info_bits(Version::for_number(n).unwrap()).unwrap();
            assert_eq!(decode_version_information(bits).unwrap().number(), n);
        }
    }

    #[test]
    fn test_small_versions_have_no_bits() {
        assert_eq!(version_info_bits(Version::for_number(6).unwrap()), None);
    }

    #[test]
    fn test_noisy() {
        let bits = version_info_bits(Version::for_number(21).unwrap()).unwrap();
        assert_eq!(decode_version_information(bits ^ 0b10_0000_0001_0000_0001).unwrap().number(), 21);
        assert!(decode_version_information(bits ^ 0b11_1100_0000_0000_0000).is_none_or(|v| v.number() != 21));
    }
}
