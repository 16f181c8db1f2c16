//! Lossless predictive coding
//!
//! Each frame is optionally decorrelated to mid/side, predicted with a
//! quantized LPC filter and entropy coded with adaptive Rice codes. Decoding
//! reverses every step with integer arithmetic only, so samples come back
//! bit for bit.

pub mod decoder;
pub mod encoder;
pub mod frame;
pub mod lpc;
pub mod stereo;

pub use lpc::{
    autocorrelation, calc_residuals, check_order, levinson_durbin, quantize_coefficients,
    reconstruct_samples, search_best_predictor, PredictorCandidate,
};

pub use decoder::{Decoder, DEFAULT_RESYNC_LIMIT};
pub use encoder::Encoder;
pub use frame::{decode_frame, encode_frame, DecodedFrame, FrameParams, Subframe};
pub use stereo::{from_mid_side, should_use_mid_side, to_mid_side, StereoMode};

use crate::core::{AlcResult, Config, DecodedStream};

/// encode per-channel buffers with default encoder settings
pub fn encode(config: &Config, channels: &[Vec<i32>]) -> AlcResult<Vec<u8>> {
    Encoder::new(*config).encode(channels)
}

/// decode a stream with default decoder settings
pub fn decode(data: &[u8], config: &Config) -> AlcResult<DecodedStream> {
    Decoder::new(*config).decode(data)
}
