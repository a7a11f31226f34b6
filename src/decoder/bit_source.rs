/// MSB-first bit reader over a byte slice
pub struct BitSource<'a> {
    bytes: &'a [u8],
    byte_offset: usize,
    bit_offset: usize,
}

impl<'a> BitSource<'a> {
    /// Reader positioned at the first bit of `bytes`
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            byte_offset: 0,
            bit_offset: 0,
        }
    }

    /// Bits not yet read
    pub fn available(&self) -> usize {
        8 * (self.bytes.len() - self.byte_offset) - self.bit_offset
    }

    /// Bits read so far
    pub fn position(&self) -> usize {
        8 * self.byte_offset + self.bit_offset
    }

    /// Read `num_bits` (1..=32) as an unsigned integer, or `None` if fewer
    /// remain
    pub fn read_bits(&mut self, num_bits: usize) -> Option<u32> {
        if !(1..=32).contains(&num_bits) || num_bits > self.available() {
            return None;
        }

        let mut remaining = num_bits;
        let mut result: u32 = 0;

        // Finish the partially consumed byte first
        if self.bit_offset > 0 {
            let bits_left = 8 - self.bit_offset;
            let to_read = remaining.min(bits_left);
            let bits_to_not_read = bits_left - to_read;
            let mask = (0xFFu32 >> (8 - to_read)) << bits_to_not_read;
            result = (self.bytes[self.byte_offset] as u32 & mask) >> bits_to_not_read;
            remaining -= to_read;
            self.bit_offset += to_read;
            if self.bit_offset == 8 {
                self.bit_offset = 0;
                self.byte_offset += 1;
            }
        }

        while remaining >= 8 {
            result = (result << 8) | self.bytes[self.byte_offset] as u32;
            self.byte_offset += 1;
            remaining -= 8;
        }

        if remaining > 0 {
            let bits_to_not_read = 8 - remaining;
            let mask = (0xFFu32 >> bits_to_not_read) << bits_to_not_read;
            result = (result << remaining)
                | ((self.bytes[self.byte_offset] as u32 & mask) >> bits_to_not_read);
            self.bit_offset += remaining;
        }

        Some(result)
    }
}
