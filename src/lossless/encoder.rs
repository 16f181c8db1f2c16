use log::debug;

use super::frame::{encode_frame, FrameParams};
use super::stereo::StereoMode;
use crate::core::{AlcError, AlcResult, Config, MAX_LPC_ORDER};

/// maximum LPC order searched at each compression level
const LEVEL_ORDERS: [usize; 10] = [0, 2, 4, 6, 8, 8, 12, 16, 24, 31];

/// Stream encoder: slices channel buffers into frames.
pub struct Encoder {
    config: Config,
    max_order: usize,
    stereo: StereoMode,
}

impl Encoder {
    pub fn new(config: Config) -> Self {
        Encoder {
            config,
            max_order: LEVEL_ORDERS[5],
            stereo: StereoMode::default(),
        }
    }

    /// compression level 0-9, mapped to the LPC order search range
    pub fn with_compression(mut self, level: u8) -> Self {
        self.max_order = LEVEL_ORDERS[level.min(9) as usize];
        self
    }

    pub fn with_max_order(mut self, order: usize) -> Self {
        self.max_order = order.min(MAX_LPC_ORDER);
        self
    }

    pub fn with_stereo_mode(mut self, stereo: StereoMode) -> Self {
        self.stereo = stereo;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn max_order(&self) -> usize {
        self.max_order
    }

    /// encode per-channel sample buffers to an elementary stream
    pub fn encode(&self, channels: &[Vec<i32>]) -> AlcResult<Vec<u8>> {
        self.config.validate()?;
        let num_samples = self.check_channels(channels)?;

        let frame_length = self.config.frame_length as usize;
        let params = FrameParams {
            max_order: self.max_order,
            stereo: self.stereo,
        };

        let mut out = Vec::new();
        let mut frames = 0usize;
        let mut start = 0;

        while start < num_samples {
            let end = (start + frame_length).min(num_samples);
            let frame: Vec<&[i32]> = channels.iter().map(|c| &c[start..end]).collect();

            out.extend_from_slice(&encode_frame(&self.config, &frame, &params)?);
            frames += 1;
            start = end;
        }

        debug!(
            "alc: encoded {} samples x {} channels in {} frames, {} bytes",
            num_samples,
            channels.len(),
            frames,
            out.len()
        );

        Ok(out)
    }

    /// encode an interleaved buffer (`[L0, R0, L1, R1, ...]`)
    pub fn encode_interleaved(&self, samples: &[i32]) -> AlcResult<Vec<u8>> {
        self.config.validate()?;
        let channels = self.config.channels as usize;

        if samples.len() % channels != 0 {
            return Err(AlcError::InvalidInput(format!(
                "{} interleaved samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }

        let deinterleaved: Vec<Vec<i32>> = (0..channels)
            .map(|ch| samples.iter().skip(ch).step_by(channels).copied().collect())
            .collect();

        self.encode(&deinterleaved)
    }

    /// returns the per-channel sample count
    fn check_channels(&self, channels: &[Vec<i32>]) -> AlcResult<usize> {
        if channels.len() != self.config.channels as usize {
            return Err(AlcError::InvalidInput(format!(
                "got {} channel buffers, config says {}",
                channels.len(),
                self.config.channels
            )));
        }

        let num_samples = channels.first().map_or(0, |c| c.len());
        if channels.iter().any(|c| c.len() != num_samples) {
            return Err(AlcError::InvalidInput(
                "channel buffers differ in length".to_string(),
            ));
        }

        Ok(num_samples)
    }
}
