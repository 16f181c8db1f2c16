//! MSB-first bit reader and writer over byte buffers.

use super::error::{AlcError, AlcResult};

/// Bit-level reader
///
/// Bytes are pulled from the slice into a 64-bit refill buffer; reads are
/// served from its top. Running out of bytes is an `Underrun`, never zeros.
pub struct BitReader<'a> {
    bytes: &'a [u8],
    /// next byte to load into the cache
    byte_pos: usize,
    cache: u64,
    cache_bits: u32,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        let mut reader = BitReader {
            bytes,
            byte_pos: 0,
            cache: 0,
            cache_bits: 0,
        };
        reader.refill();
        reader
    }

    fn refill(&mut self) {
        while self.cache_bits <= 56 && self.byte_pos < self.bytes.len() {
            self.cache = (self.cache << 8) | self.bytes[self.byte_pos] as u64;
            self.byte_pos += 1;
            self.cache_bits += 8;
        }
    }

    /// Read `n` bits (0-32) as an unsigned value.
    pub fn read_bits(&mut self, n: u32) -> AlcResult<u32> {
        if n == 0 {
            return Ok(0);
        }
        debug_assert!(n <= 32);

        if self.cache_bits < n {
            self.refill();
            if self.cache_bits < n {
                return Err(AlcError::Underrun);
            }
        }

        let shift = self.cache_bits - n;
        let value = (self.cache >> shift) & ((1u64 << n) - 1);
        self.cache_bits -= n;

        Ok(value as u32)
    }

    /// Read `n` bits (1-32) as a two's-complement value.
    pub fn read_signed_bits(&mut self, n: u32) -> AlcResult<i32> {
        if n == 0 {
            return Ok(0);
        }
        let raw = self.read_bits(n)?;
        Ok(sign_extend(raw as i64, n))
    }

    pub fn read_bit(&mut self) -> AlcResult<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Drop the partial byte sitting in the refill buffer.
    pub fn align_to_byte(&mut self) {
        self.cache_bits -= self.cache_bits % 8;
    }

    /// Restart reading at a byte offset (clamped to the end).
    pub fn seek_to_byte(&mut self, offset: usize) {
        self.byte_pos = offset.min(self.bytes.len());
        self.cache = 0;
        self.cache_bits = 0;
        self.refill();
    }

    /// bits consumed so far
    pub fn bit_position(&self) -> usize {
        self.byte_pos * 8 - self.cache_bits as usize
    }

    /// offset of the byte holding the next unread bit
    pub fn byte_position(&self) -> usize {
        self.bit_position() / 8
    }

    /// bytes from `start` up to the current byte position
    pub fn bytes_since(&self, start: usize) -> &'a [u8] {
        let end = self.byte_position();
        &self.bytes[start.min(end)..end]
    }

    pub fn bits_remaining(&self) -> usize {
        self.bytes.len() * 8 - self.bit_position()
    }

    pub fn is_exhausted(&self) -> bool {
        self.bits_remaining() == 0
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Bit-level writer
pub struct BitWriter {
    bytes: Vec<u8>,
    cache: u64,
    cache_bits: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        BitWriter {
            bytes: Vec::with_capacity(capacity),
            cache: 0,
            cache_bits: 0,
        }
    }

    fn flush_cache(&mut self) {
        while self.cache_bits >= 8 {
            self.cache_bits -= 8;
            self.bytes.push((self.cache >> self.cache_bits) as u8);
        }
    }

    /// Append the low `n` bits (0-32) of `value`.
    pub fn write_bits(&mut self, value: u32, n: u32) {
        if n == 0 {
            return;
        }
        debug_assert!(n <= 32);

        let masked = value as u64 & ((1u64 << n) - 1);
        self.cache = (self.cache << n) | masked;
        self.cache_bits += n;

        if self.cache_bits >= 32 {
            self.flush_cache();
        }
    }

    /// Append `value` as an `n`-bit two's-complement field.
    pub fn write_signed_bits(&mut self, value: i32, n: u32) {
        self.write_bits(value as u32, n);
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u32, 1);
    }

    /// Pad the partial byte with zeros.
    pub fn align_to_byte(&mut self) {
        let partial = self.cache_bits % 8;
        if partial != 0 {
            self.write_bits(0, 8 - partial);
        }
        self.flush_cache();
    }

    /// bits written so far
    pub fn bit_position(&self) -> usize {
        self.bytes.len() * 8 + self.cache_bits as usize
    }

    pub fn byte_count(&self) -> usize {
        self.bit_position().div_ceil(8)
    }

    /// Append whole bytes from another writer's output. Must be aligned.
    pub fn append_bytes(&mut self, bytes: &[u8]) {
        debug_assert!(self.cache_bits % 8 == 0);
        self.flush_cache();
        self.bytes.extend_from_slice(bytes);
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.bytes
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// sign-extend the low `width` bits of `value`
#[inline]
pub fn sign_extend(value: i64, width: u32) -> i32 {
    let shift = 64 - width;
    ((value << shift) >> shift) as i32
}
