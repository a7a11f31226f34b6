/// BCH codes protecting format (15,5) and version (18,6) information.
/// Decoding is nearest-codeword lookup over the small valid set.

/// x^10 + x^8 + x^5 + x^4 + x^2 + x + 1
pub const FORMAT_INFO_POLY: u32 = 0x537;
/// x^12 + x^11 + x^10 + x^9 + x^8 + x^5 + x^2 + 1
pub const VERSION_INFO_POLY: u32 = 0x1F25;
/// XOR applied to format information so it is never all-zero
pub const FORMAT_INFO_MASK_QR: u32 = 0x5412;

const fn bit_length(value: u32) -> u32 {
    32 - value.leading_zeros()
}

/// Remainder of `value · x^deg(poly)` divided by `poly`
pub const fn bch_remainder(value: u32, poly: u32) -> u32 {
    let poly_len = bit_length(poly);
    let mut v = value << (poly_len - 1);
    while bit_length(v) >= poly_len {
        v ^= poly << (bit_length(v) - poly_len);
    }
    v
}

/// Systematic BCH codeword: data bits followed by the remainder
pub const fn bch_codeword(data: u32, poly: u32) -> u32 {
    (data << (bit_length(poly) - 1)) | bch_remainder(data, poly)
}

/// All 32 masked format codewords; index = (ec bits << 3) | mask
pub const FORMAT_INFO_CODEWORDS: [u32; 32] = {
    let mut table = [0u32; 32];
    let mut data = 0;
    while data < 32 {
        table[data] = bch_codeword(data as u32, FORMAT_INFO_POLY) ^ FORMAT_INFO_MASK_QR;
        data += 1;
    }
    table
};

/// The 34 version codewords for versions 7..=40
pub const VERSION_INFO_CODEWORDS: [u32; 34] = {
    let mut table = [0u32; 34];
    let mut i = 0;
    while i < 34 {
        table[i] = bch_codeword(i as u32 + 7, VERSION_INFO_POLY);
        i += 1;
    }
    table
};

/// Number of differing bits
#[inline]
pub fn num_bits_differing(a: u32, b: u32) -> u32 {
    (a ^ b).count_ones()
}

/// Index of the codeword closest to any of `readings`, with its distance
pub fn nearest_codeword(table: &[u32], readings: &[u32]) -> Option<(usize, u32)> {
    let mut best: Option<(usize, u32)> = None;
    for (index, &target) in table.iter().enumerate() {
        for &reading in readings {
            let distance = num_bits_differing(reading, target);
            if distance == 0 {
                return Some((index, 0));
            }
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }
    }
    best
}
