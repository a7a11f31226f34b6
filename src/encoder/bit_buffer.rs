/// Growable MSB-first bit sequence used to assemble the data codewords
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuffer {
    bits: Vec<bool>,
}

impl BitBuffer {
    /// Empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether no bits were appended
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Whole bytes needed to hold the bits
    pub fn len_in_bytes(&self) -> usize {
        self.bits.len().div_ceil(8)
    }

    /// Bit at `index`, MSB-first
    pub fn get(&self, index: usize) -> bool {
        self.bits[index]
    }

    /// Append one bit
    pub fn append_bit(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Append the low `num_bits` of `value`, most significant first
    pub fn append_bits(&mut self, value: u32, num_bits: usize) {
        debug_assert!(num_bits <= 32);
        for shift in (0..num_bits).rev() {
            self.bits.push((value >> shift) & 1 == 1);
        }
    }

    /// Append every bit of `other`
    pub fn append_buffer(&mut self, other: &BitBuffer) {
        self.bits.extend_from_slice(&other.bits);
    }

    /// Pack `num_bytes` bytes starting at bit `bit_offset`; missing bits read as 0
    pub fn to_bytes(&self, bit_offset: usize, num_bytes: usize) -> Vec<u8> {
        (0..num_bytes)
            .map(|byte| {
                (0..8).fold(0u8, |acc, bit| {
                    let index = bit_offset + byte * 8 + bit;
                    (acc << 1) | self.bits.get(index).copied().unwrap_or(false) as u8
                })
            })
            .collect()
    }

    /// Bits in order
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }
}
