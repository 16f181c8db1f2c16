//! Frame layout: header, one subframe per channel, byte alignment.
//!
//! | field          | bits | notes                                   |
//! |----------------|------|-----------------------------------------|
//! | channel tag    | 3    | channels - 1                            |
//! | reserved       | 4    | zero                                    |
//! | explicit len   | 1    | set for frames shorter than the config  |
//! | mode           | 2    | see [`FrameMode`]                       |
//! | sample count   | 32   | only with explicit len                  |
//!
//! Compressed subframe: `prediction type:4 | shift:4 | k:5 | order:5 |
//! order x coeff:16`, then the Rice-coded residuals.
//!
//! After the byte alignment every frame carries a 16-bit CRC of all the
//! frame bytes before it.

use log::debug;

use super::lpc::{self, PredictorCandidate};
use super::stereo::{self, StereoMode};
use crate::core::bitstream::{BitReader, BitWriter};
use crate::core::{crc16, rice};
use crate::core::{AlcError, AlcResult, Config, FrameMode};

/// every residual is coded
const PREDICTION_RESIDUAL: u32 = 0;
/// only warm-up is coded, the rest of the residuals are zero
const PREDICTION_EXACT: u32 = 1;

const FRAME_HEADER_BITS: usize = 10;
const SAMPLE_COUNT_BITS: u32 = 32;
const CRC_BITS: u32 = 16;

/// Encoder knobs a frame needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameParams {
    pub max_order: usize,
    pub stereo: StereoMode,
}

/// Per-channel prediction unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subframe {
    pub exact: bool,
    pub coeffs: Vec<i32>,
    pub shift: u8,
    /// Rice parameter the residual pass starts from
    pub rice_parameter: u8,
    /// warm-up samples followed by prediction residuals
    pub residuals: Vec<i32>,
}

impl Subframe {
    pub fn order(&self) -> usize {
        self.coeffs.len()
    }

    fn coded_len(&self) -> usize {
        if self.exact {
            self.order()
        } else {
            self.residuals.len()
        }
    }

    fn write(&self, bits: &mut BitWriter, kb: u8, width: u32) {
        let prediction = if self.exact {
            PREDICTION_EXACT
        } else {
            PREDICTION_RESIDUAL
        };

        bits.write_bits(prediction, 4);
        bits.write_bits(self.shift as u32, 4);
        bits.write_bits(self.rice_parameter as u32, 5);
        bits.write_bits(self.order() as u32, 5);
        for &coeff in &self.coeffs {
            bits.write_signed_bits(coeff, lpc::COEFF_BITS);
        }

        rice::encode_residuals(
            bits,
            &self.residuals[..self.coded_len()],
            self.rice_parameter,
            kb,
            width,
        );
    }

    fn read(bits: &mut BitReader, num_samples: usize, kb: u8, width: u32) -> AlcResult<Self> {
        let exact = match bits.read_bits(4)? {
            PREDICTION_RESIDUAL => false,
            PREDICTION_EXACT => true,
            other => {
                return Err(AlcError::Desync(format!("unknown prediction type {other}")));
            }
        };
        let shift = bits.read_bits(4)? as u8;
        let rice_parameter = bits.read_bits(5)? as u8;
        let order = bits.read_bits(5)? as usize;
        lpc::check_order(order, num_samples)?;

        let mut coeffs = Vec::with_capacity(order);
        for _ in 0..order {
            coeffs.push(bits.read_signed_bits(lpc::COEFF_BITS)?);
        }

        let mut subframe = Subframe {
            exact,
            coeffs,
            shift,
            rice_parameter,
            residuals: vec![0; num_samples],
        };
        let coded = subframe.coded_len();
        rice::decode_residuals(
            bits,
            &mut subframe.residuals[..coded],
            rice_parameter,
            kb,
            width,
        )?;

        Ok(subframe)
    }

    /// Undo prediction, turning residuals into samples.
    fn reconstruct(mut self, width: u32) -> Vec<i32> {
        lpc::reconstruct_samples(&mut self.residuals, &self.coeffs, self.shift, width);
        self.residuals
    }
}

impl From<PredictorCandidate> for Subframe {
    fn from(candidate: PredictorCandidate) -> Self {
        let rice_parameter = rice::estimate_rice_parameter(candidate.coded_residuals());
        Subframe {
            exact: candidate.exact,
            coeffs: candidate.coeffs,
            shift: candidate.shift,
            rice_parameter,
            residuals: candidate.residuals,
        }
    }
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub mode: FrameMode,
    pub channels: Vec<Vec<i32>>,
    pub num_samples: usize,
}

fn header_bits(config: &Config, num_samples: usize) -> usize {
    if num_samples == config.frame_length as usize {
        FRAME_HEADER_BITS
    } else {
        FRAME_HEADER_BITS + SAMPLE_COUNT_BITS as usize
    }
}

fn write_header(bits: &mut BitWriter, config: &Config, num_samples: usize, mode: FrameMode) {
    let explicit_length = num_samples != config.frame_length as usize;

    bits.write_bits(config.channels as u32 - 1, 3);
    bits.write_bits(0, 4);
    bits.write_bit(explicit_length);
    bits.write_bits(mode as u32, 2);
    if explicit_length {
        bits.write_bits(num_samples as u32, SAMPLE_COUNT_BITS);
    }
}

fn encode_subframe(bits: &mut BitWriter, samples: &[i32], kb: u8, max_order: usize, width: u32) {
    let candidate = lpc::search_best_predictor(samples, max_order, width);
    let subframe = Subframe::from(candidate);
    debug!(
        "alc: subframe order {} shift {} k {} exact {}",
        subframe.order(),
        subframe.shift,
        subframe.rice_parameter,
        subframe.exact
    );
    subframe.write(bits, kb, width);
}

fn encode_compressed(
    config: &Config,
    channels: &[&[i32]],
    params: &FrameParams,
    num_samples: usize,
) -> BitWriter {
    let width = config.bit_depth as u32;
    let use_mid_side = config.supports_mid_side()
        && match params.stereo {
            StereoMode::Independent => false,
            StereoMode::MidSide => true,
            StereoMode::Auto => stereo::should_use_mid_side(channels[0], channels[1]),
        };

    let mut bits = BitWriter::with_capacity(num_samples * channels.len() * 2);

    if use_mid_side {
        write_header(&mut bits, config, num_samples, FrameMode::CompressedMidSide);
        let (mid, side) = stereo::to_mid_side(channels[0], channels[1]);
        encode_subframe(&mut bits, &mid, config.kb, params.max_order, width);
        encode_subframe(&mut bits, &side, config.kb, params.max_order, width + 1);
    } else {
        write_header(&mut bits, config, num_samples, FrameMode::Compressed);
        for samples in channels {
            encode_subframe(&mut bits, samples, config.kb, params.max_order, width);
        }
    }

    bits.align_to_byte();
    bits
}

fn encode_verbatim(config: &Config, channels: &[&[i32]], num_samples: usize) -> Vec<u8> {
    let width = config.bit_depth as u32;
    let mut bits = BitWriter::with_capacity(num_samples * channels.len() * 4 + 8);

    write_header(&mut bits, config, num_samples, FrameMode::Verbatim);
    for samples in channels {
        for &sample in samples.iter() {
            bits.write_signed_bits(sample, width);
        }
    }

    bits.into_bytes()
}

/// Encode one frame.
///
/// `channels` must hold `config.channels` equally long slices of 1 to
/// `frame_length` samples that fit the bit depth. Falls back to a verbatim
/// frame when prediction would not save anything.
pub fn encode_frame(
    config: &Config,
    channels: &[&[i32]],
    params: &FrameParams,
) -> AlcResult<Vec<u8>> {
    config.validate()?;
    let num_samples = channels.first().map_or(0, |c| c.len());

    if channels.len() != config.channels as usize {
        return Err(AlcError::InvalidInput(format!(
            "frame has {} channels, config says {}",
            channels.len(),
            config.channels
        )));
    }
    if num_samples == 0 || num_samples > config.frame_length as usize {
        return Err(AlcError::InvalidInput(format!(
            "frame of {num_samples} samples, limit {}",
            config.frame_length
        )));
    }
    if channels.iter().any(|c| c.len() != num_samples) {
        return Err(AlcError::InvalidInput(
            "channels in a frame differ in length".to_string(),
        ));
    }
    for samples in channels {
        check_range(config, samples).map_err(|_| {
            AlcError::InvalidInput(format!("samples do not fit {} bits", config.bit_depth))
        })?;
    }

    let compressed = encode_compressed(config, channels, params, num_samples);

    let verbatim_bits =
        header_bits(config, num_samples) + num_samples * channels.len() * config.bit_depth as usize;
    if compressed.bit_position() > verbatim_bits {
        debug!(
            "alc: {num_samples}-sample frame stored verbatim ({} > {verbatim_bits} bits)",
            compressed.bit_position()
        );
        return Ok(with_crc(encode_verbatim(config, channels, num_samples)));
    }

    Ok(with_crc(compressed.into_bytes()))
}

fn with_crc(mut frame: Vec<u8>) -> Vec<u8> {
    let crc = crc16(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());
    frame
}

fn check_range(config: &Config, samples: &[i32]) -> AlcResult<()> {
    let (lo, hi) = config.sample_range();
    match samples.iter().find(|&&s| (s as i64) < lo || (s as i64) > hi) {
        Some(s) => Err(AlcError::Desync(format!(
            "sample {s} outside {}-bit range",
            config.bit_depth
        ))),
        None => Ok(()),
    }
}

/// Decode one frame starting at the reader's position.
///
/// The reader must sit on a byte boundary. Leaves it just past the frame's
/// checksum on success.
pub fn decode_frame(bits: &mut BitReader, config: &Config) -> AlcResult<DecodedFrame> {
    config.validate()?;
    let start = bits.byte_position();
    let width = config.bit_depth as u32;
    let channel_count = config.channels as usize;

    let tagged = bits.read_bits(3)? as usize + 1;
    if tagged != channel_count {
        return Err(AlcError::Desync(format!(
            "frame tagged for {tagged} channels, stream has {channel_count}"
        )));
    }
    if bits.read_bits(4)? != 0 {
        return Err(AlcError::Desync("reserved header bits set".to_string()));
    }

    let explicit_length = bits.read_bit()?;
    let mode = FrameMode::from(bits.read_bits(2)? as u8);

    let num_samples = if explicit_length {
        let count = bits.read_bits(SAMPLE_COUNT_BITS)? as usize;
        if count == 0 || count >= config.frame_length as usize {
            return Err(AlcError::Desync(format!(
                "explicit sample count {count} for frame length {}",
                config.frame_length
            )));
        }
        count
    } else {
        config.frame_length as usize
    };

    let channels = match mode {
        FrameMode::Verbatim => {
            let mut channels = Vec::with_capacity(channel_count);
            for _ in 0..channel_count {
                let mut samples = Vec::with_capacity(num_samples);
                for _ in 0..num_samples {
                    samples.push(bits.read_signed_bits(width)?);
                }
                channels.push(samples);
            }
            channels
        }
        FrameMode::Compressed => {
            let mut channels = Vec::with_capacity(channel_count);
            for _ in 0..channel_count {
                let subframe = Subframe::read(bits, num_samples, config.kb, width)?;
                channels.push(subframe.reconstruct(width));
            }
            channels
        }
        FrameMode::CompressedMidSide => {
            if !config.supports_mid_side() {
                return Err(AlcError::Desync(
                    "mid/side frame in a stream that cannot carry it".to_string(),
                ));
            }
            let mut mid = Subframe::read(bits, num_samples, config.kb, width)?.reconstruct(width);
            let mut side =
                Subframe::read(bits, num_samples, config.kb, width + 1)?.reconstruct(width + 1);
            stereo::from_mid_side(&mut mid, &mut side);
            check_range(config, &mid)?;
            check_range(config, &side)?;
            vec![mid, side]
        }
        FrameMode::Reserved => {
            return Err(AlcError::Desync("reserved frame mode".to_string()));
        }
    };

    bits.align_to_byte();
    let actual = crc16(bits.bytes_since(start));
    let expected = bits.read_bits(CRC_BITS)? as u16;
    if expected != actual {
        return Err(AlcError::Desync(format!(
            "frame checksum {expected:#06x}, computed {actual:#06x}"
        )));
    }

    Ok(DecodedFrame {
        mode,
        channels,
        num_samples,
    })
}
