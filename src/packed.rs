//! Fixed-width integers packed into 64-bit words.
//!
//! Unlike the 1.16+ chunk format, entries here DO span across long
//! boundaries: value `i` occupies bits `i * bits .. (i + 1) * bits` of the
//! concatenated little-endian word stream. The array length is therefore
//! exactly `ceil(len * bits / 64)`.

#[derive(Debug, Clone)]
pub struct PackedBitStorage {
    data: Vec<u64>,
    bits: u32,
    len: usize,
    mask: u64,
}

impl PackedBitStorage {
    /// `bits` must be in `1..=32`.
    pub fn new(bits: u32, len: usize) -> Self {
        assert!((1..=32).contains(&bits), "bit width {} out of range", bits);
        let words = (len * bits as usize).div_ceil(64);
        PackedBitStorage {
            data: vec![0; words],
            bits,
            len,
            mask: (1u64 << bits) - 1,
        }
    }

    pub fn from_raw(bits: u32, len: usize, raw: &[i64]) -> Self {
        let mut storage = Self::new(bits, len);
        for (word, &value) in storage.data.iter_mut().zip(raw) {
            *word = value as u64;
        }
        storage
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn set(&mut self, index: usize, value: u32) {
        assert!(index < self.len, "index {} out of bounds", index);
        let bits = self.bits as usize;
        let value = value as u64 & self.mask;
        let bit_index = index * bits;
        let start = bit_index >> 6;
        let end = ((index + 1) * bits - 1) >> 6;
        let offset = (bit_index & 63) as u32;

        self.data[start] = (self.data[start] & !(self.mask << offset)) | (value << offset);
        if start != end {
            let low_bits = 64 - offset;
            let high_bits = self.bits - low_bits;
            self.data[end] = ((self.data[end] >> high_bits) << high_bits) | (value >> low_bits);
        }
    }

    pub fn get(&self, index: usize) -> u32 {
        assert!(index < self.len, "index {} out of bounds", index);
        let bits = self.bits as usize;
        let bit_index = index * bits;
        let start = bit_index >> 6;
        let end = ((index + 1) * bits - 1) >> 6;
        let offset = (bit_index & 63) as u32;

        if start == end {
            ((self.data[start] >> offset) & self.mask) as u32
        } else {
            let low_bits = 64 - offset;
            (((self.data[start] >> offset) | (self.data[end] << low_bits)) & self.mask) as u32
        }
    }

    /// Backing words as the signed longs NBT stores.
    pub fn raw(&self) -> Vec<i64> {
        self.data.iter().map(|&word| word as i64).collect()
    }
}

/// `ceil(log2(n))`, with 0 for `n <= 1`.
pub fn ceil_log2(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}

/// Minimum of four bits per entry, as legacy paletted sections require.
pub fn bits_for_palette(palette_len: usize) -> u32 {
    ceil_log2(palette_len).max(4)
}
