//! common types for the codec core

use serde::{Deserialize, Serialize};

use super::error::{AlcError, AlcResult};

// constants

/// format version
pub const VERSION_MAJOR: u8 = 0;
pub const VERSION_MINOR: u8 = 1;

/// default samples per frame
pub const DEFAULT_FRAME_LENGTH: u32 = 4096;

/// largest frame the sample-count field may announce
pub const MAX_FRAME_LENGTH: u32 = 1 << 16;

/// most channels a frame tag can describe (3 bits)
pub const MAX_CHANNELS: u8 = 8;

/// hard cap on prediction order (5-bit field)
pub const MAX_LPC_ORDER: usize = 31;

/// fixed-point scale the quantizer starts from
pub const DEFAULT_SHIFT: u8 = 9;

/// largest shift the 4-bit field can carry
pub const MAX_SHIFT: u8 = 15;

/// Rice quotient at which a symbol is escaped
pub const ESCAPE_THRESHOLD: u32 = 9;

/// largest Rice parameter
pub const MAX_RICE_K: u8 = 31;

/// default tuning triple, same values ALAC encoders ship with
pub const DEFAULT_PB: u8 = 40;
pub const DEFAULT_MB: u8 = 10;
pub const DEFAULT_KB: u8 = 14;

/// bytes in a serialized config record
pub const CONFIG_RECORD_SIZE: usize = 12;

// types

/// frame coding mode (2-bit header field)
///
/// | Value | Mode              | Description                          |
/// |-------|-------------------|--------------------------------------|
/// | 0     | Compressed        | LPC + Rice, channels independent     |
/// | 1     | CompressedMidSide | LPC + Rice over mid/side             |
/// | 2     | Verbatim          | Raw `bit_depth`-bit samples          |
/// | 3     | Reserved          | Never written                        |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameMode {
    Compressed = 0,
    CompressedMidSide = 1,
    Verbatim = 2,
    Reserved = 3,
}

impl FrameMode {
    /// is this an LPC frame?
    pub fn is_compressed(self) -> bool {
        matches!(self, FrameMode::Compressed | FrameMode::CompressedMidSide)
    }
}

impl From<u8> for FrameMode {
    fn from(v: u8) -> Self {
        match v {
            0 => FrameMode::Compressed,
            1 => FrameMode::CompressedMidSide,
            2 => FrameMode::Verbatim,
            _ => FrameMode::Reserved,
        }
    }
}

/// Stream configuration. Built once by the caller, never mutated by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// samples per channel in a full frame
    pub frame_length: u32,
    /// bits per sample, 1-32
    pub bit_depth: u8,
    /// number of channels, 1-8
    pub channels: u8,
    /// Rice tuning: history multiplier.
    ///
    /// Only stored in the config record so containers keep the full ALAC
    /// tuning triple. The codec's `k` adaptation never reads it.
    pub pb: u8,
    /// Rice tuning: initial history. Record-only, like `pb`.
    pub mb: u8,
    /// Rice tuning: base parameter `k` resets to after an escape.
    /// The only member of the triple that changes the bitstream.
    pub kb: u8,
}

impl Config {
    /// default config for a channel count and bit depth
    pub fn new(channels: u8, bit_depth: u8) -> Self {
        Config {
            frame_length: DEFAULT_FRAME_LENGTH,
            bit_depth,
            channels,
            pb: DEFAULT_PB,
            mb: DEFAULT_MB,
            kb: DEFAULT_KB,
        }
    }

    pub fn with_frame_length(mut self, frame_length: u32) -> Self {
        self.frame_length = frame_length;
        self
    }

    pub fn with_rice_tuning(mut self, pb: u8, mb: u8, kb: u8) -> Self {
        self.pb = pb;
        self.mb = mb;
        self.kb = kb;
        self
    }

    /// reject anything the frame format cannot describe
    pub fn validate(&self) -> AlcResult<()> {
        if self.frame_length == 0 || self.frame_length > MAX_FRAME_LENGTH {
            return Err(AlcError::MalformedConfig(format!(
                "frame length {} outside 1..={}",
                self.frame_length, MAX_FRAME_LENGTH
            )));
        }
        if !(1..=32).contains(&self.bit_depth) {
            return Err(AlcError::MalformedConfig(format!(
                "bit depth {} outside 1..=32",
                self.bit_depth
            )));
        }
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            return Err(AlcError::MalformedConfig(format!(
                "channel count {} outside 1..={}",
                self.channels, MAX_CHANNELS
            )));
        }
        if self.kb > MAX_RICE_K {
            return Err(AlcError::MalformedConfig(format!(
                "rice base {} above {}",
                self.kb, MAX_RICE_K
            )));
        }
        Ok(())
    }

    /// smallest and largest sample a channel may hold
    pub fn sample_range(&self) -> (i64, i64) {
        let half = 1i64 << (self.bit_depth - 1);
        (-half, half - 1)
    }

    /// whether mid/side fits in the coding width
    pub fn supports_mid_side(&self) -> bool {
        self.channels == 2 && self.bit_depth < 32
    }

    /// serialize to the config record a container stores
    ///
    /// `frame_length:u32 BE | bit_depth | channels | pb | mb | kb | 3 reserved`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut record = Vec::with_capacity(CONFIG_RECORD_SIZE);
        record.extend_from_slice(&self.frame_length.to_be_bytes());
        record.push(self.bit_depth);
        record.push(self.channels);
        record.push(self.pb);
        record.push(self.mb);
        record.push(self.kb);
        record.extend_from_slice(&[0; 3]);
        record
    }

    /// parse and validate a config record
    pub fn from_bytes(data: &[u8]) -> AlcResult<Self> {
        if data.len() < CONFIG_RECORD_SIZE {
            return Err(AlcError::MalformedConfig(format!(
                "config record is {} bytes, need {}",
                data.len(),
                CONFIG_RECORD_SIZE
            )));
        }

        let config = Config {
            frame_length: u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
            bit_depth: data[4],
            channels: data[5],
            pb: data[6],
            mb: data[7],
            kb: data[8],
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(2, 16)
    }
}

/// everything a stream decode recovered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedStream {
    /// config the stream was decoded with
    pub config: Config,
    /// one buffer per channel, all `samples_recovered` long
    pub channels: Vec<Vec<i32>>,
    /// samples per channel actually recovered
    pub samples_recovered: usize,
    /// frames decoded cleanly
    pub frames_decoded: usize,
    /// corruption events the decoder had to skip past
    pub frames_lost: usize,
    /// bytes discarded while resynchronizing
    pub bytes_skipped: usize,
}

impl DecodedStream {
    /// true when nothing had to be skipped
    pub fn is_complete(&self) -> bool {
        self.frames_lost == 0 && self.bytes_skipped == 0
    }

    /// interleave channels into one buffer
    pub fn interleaved(&self) -> Vec<i32> {
        let mut out = Vec::with_capacity(self.samples_recovered * self.channels.len());
        for i in 0..self.samples_recovered {
            for ch in &self.channels {
                out.push(ch[i]);
            }
        }
        out
    }
}
