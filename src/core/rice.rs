// Adaptive Rice coding for prediction residuals

use super::bitstream::{sign_extend, BitReader, BitWriter};
use super::error::{AlcError, AlcResult};
use super::types::{ESCAPE_THRESHOLD, MAX_RICE_K};

/// Adaptive Rice parameter for one subframe pass.
///
/// Encoder and decoder each own one per channel and must advance it through
/// the exact same symbols; a single divergence corrupts the rest of the
/// subframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiceState {
    k: u8,
    kb: u8,
}

impl RiceState {
    /// start at `k`, fall back to `kb` after escapes
    pub fn new(k: u8, kb: u8) -> Self {
        RiceState {
            k: k.min(MAX_RICE_K),
            kb: kb.min(MAX_RICE_K),
        }
    }

    pub fn k(&self) -> u8 {
        self.k
    }

    /// grow `k` on large symbols, shrink it on small ones
    fn adapt(&mut self, unsigned: u64) {
        let k = self.k as u32;
        if unsigned > (1u64 << k) {
            self.k = (self.k + 1).min(MAX_RICE_K);
        } else if k > 0 && unsigned < (1u64 << (k - 1)) {
            self.k -= 1;
        }
    }

    fn reset(&mut self) {
        self.k = self.kb;
    }
}

/// Zigzag map: 0 → 0, -1 → 1, 1 → 2, -2 → 3, ...
#[inline]
pub fn zigzag(value: i32) -> u64 {
    let v = value as i64;
    if v < 0 {
        (-2 * v - 1) as u64
    } else {
        (2 * v) as u64
    }
}

#[inline]
pub fn unzigzag(unsigned: u64) -> i64 {
    if unsigned & 1 != 0 {
        -((unsigned >> 1) as i64) - 1
    } else {
        (unsigned >> 1) as i64
    }
}

/// Write one residual and advance the state.
///
/// `width` is the channel's coding width; `value` must fit in it.
pub fn encode_residual(bits: &mut BitWriter, value: i32, state: &mut RiceState, width: u32) {
    let unsigned = zigzag(value);
    let k = state.k as u32;
    let quotient = unsigned >> k;

    if quotient >= ESCAPE_THRESHOLD as u64 {
        // escape: threshold zeros, a one, then the raw value
        bits.write_bits(0, ESCAPE_THRESHOLD);
        bits.write_bit(true);
        bits.write_signed_bits(value, width);
        state.reset();
        return;
    }

    bits.write_bits(0, quotient as u32);
    bits.write_bit(true);
    bits.write_bits((unsigned & ((1u64 << k) - 1)) as u32, k);
    state.adapt(unsigned);
}

/// Read one residual and advance the state.
pub fn decode_residual(
    bits: &mut BitReader,
    state: &mut RiceState,
    width: u32,
) -> AlcResult<i32> {
    let mut quotient = 0u32;
    while !bits.read_bit()? {
        quotient += 1;
        if quotient > ESCAPE_THRESHOLD {
            return Err(AlcError::Desync(
                "rice prefix longer than the escape marker".to_string(),
            ));
        }
    }

    if quotient == ESCAPE_THRESHOLD {
        let value = bits.read_signed_bits(width)?;
        state.reset();
        return Ok(value);
    }

    let k = state.k as u32;
    let remainder = bits.read_bits(k)? as u64;
    let unsigned = ((quotient as u64) << k) | remainder;
    let value = unzigzag(unsigned);

    if sign_extend(value, width) as i64 != value {
        return Err(AlcError::Desync(format!(
            "residual {value} does not fit {width} bits"
        )));
    }

    state.adapt(unsigned);
    Ok(value as i32)
}

/// Rice encode a residual sequence with a fresh state
pub fn encode_residuals(
    bits: &mut BitWriter,
    residuals: &[i32],
    initial_k: u8,
    kb: u8,
    width: u32,
) {
    let mut state = RiceState::new(initial_k, kb);
    for &residual in residuals {
        encode_residual(bits, residual, &mut state, width);
    }
}

/// Rice decode `out.len()` residuals with a fresh state
pub fn decode_residuals(
    bits: &mut BitReader,
    out: &mut [i32],
    initial_k: u8,
    kb: u8,
    width: u32,
) -> AlcResult<()> {
    let mut state = RiceState::new(initial_k, kb);
    for slot in out.iter_mut() {
        *slot = decode_residual(bits, &mut state, width)?;
    }
    Ok(())
}

/// Rice encode residuals into a standalone byte buffer
pub fn encode(residuals: &[i32], k: u8, kb: u8, width: u32) -> Vec<u8> {
    let mut bits = BitWriter::new();
    encode_residuals(&mut bits, residuals, k, kb, width);
    bits.into_bytes()
}

/// Rice decode `count` residuals from a standalone byte buffer
pub fn decode(encoded: &[u8], k: u8, kb: u8, width: u32, count: usize) -> AlcResult<Vec<i32>> {
    let mut bits = BitReader::new(encoded);
    let mut residuals = vec![0; count];
    decode_residuals(&mut bits, &mut residuals, k, kb, width)?;
    Ok(residuals)
}

/// Starting Rice parameter from the mean zigzag magnitude
pub fn estimate_rice_parameter(residuals: &[i32]) -> u8 {
    if residuals.is_empty() {
        return 0;
    }

    let sum: u128 = residuals.iter().map(|&r| zigzag(r) as u128).sum();
    let mean = (sum / residuals.len() as u128) as u64;

    if mean == 0 {
        return 0;
    }

    // 2^k closest from below to the mean
    ((63 - mean.leading_zeros()) as u8).min(MAX_RICE_K)
}

/// Estimated coded size in bits at a fixed `k`, escapes included
pub fn estimate_bits(residuals: &[i32], k: u8, width: u32) -> u64 {
    let k = k.min(MAX_RICE_K) as u32;
    residuals
        .iter()
        .map(|&r| {
            let quotient = zigzag(r) >> k;
            if quotient >= ESCAPE_THRESHOLD as u64 {
                (ESCAPE_THRESHOLD + 1 + width) as u64
            } else {
                quotient + 1 + k as u64
            }
        })
        .sum()
}
