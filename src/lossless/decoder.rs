use log::{debug, warn};

use super::frame::{decode_frame, DecodedFrame};
use crate::core::bitstream::BitReader;
use crate::core::{AlcResult, Config, DecodedStream};

/// default byte-skip budget per corruption event
pub const DEFAULT_RESYNC_LIMIT: usize = 4096;

/// Stream decoder: concatenates frames, skipping past corruption.
pub struct Decoder {
    config: Config,
    resync_limit: usize,
}

impl Decoder {
    pub fn new(config: Config) -> Self {
        Decoder {
            config,
            resync_limit: DEFAULT_RESYNC_LIMIT,
        }
    }

    /// how many bytes past a bad frame to try before giving up (0 disables)
    pub fn with_resync_limit(mut self, bytes: usize) -> Self {
        self.resync_limit = bytes;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// decode an elementary stream
    ///
    /// Only a bad config is fatal. Frame errors trigger resynchronization;
    /// when that fails the frames decoded so far are returned.
    pub fn decode(&self, data: &[u8]) -> AlcResult<DecodedStream> {
        self.config.validate()?;

        let mut stream = DecodedStream {
            config: self.config,
            channels: vec![Vec::new(); self.config.channels as usize],
            samples_recovered: 0,
            frames_decoded: 0,
            frames_lost: 0,
            bytes_skipped: 0,
        };

        let mut reader = BitReader::new(data);
        let mut pos = 0;

        while pos < data.len() {
            match decode_frame(&mut reader, &self.config) {
                Ok(frame) => {
                    append_frame(&mut stream, frame);
                    pos = reader.byte_position();
                }
                Err(err) if err.is_recoverable() => {
                    warn!("alc: frame at byte {pos} failed: {err}");
                    stream.frames_lost += 1;

                    match self.resync(&mut reader, pos, data.len()) {
                        Some((skipped, frame)) => {
                            debug!("alc: resynchronized after skipping {skipped} bytes");
                            stream.bytes_skipped += skipped;
                            append_frame(&mut stream, frame);
                            pos = reader.byte_position();
                        }
                        None => {
                            warn!(
                                "alc: no frame within {} bytes of {pos}, stopping",
                                self.resync_limit
                            );
                            stream.bytes_skipped += data.len() - pos;
                            break;
                        }
                    }
                }
                Err(err) => return Err(err),
            }
        }

        debug!(
            "alc: decoded {} frames, {} samples per channel",
            stream.frames_decoded, stream.samples_recovered
        );

        Ok(stream)
    }

    /// decode to an interleaved buffer
    pub fn decode_interleaved(&self, data: &[u8]) -> AlcResult<Vec<i32>> {
        Ok(self.decode(data)?.interleaved())
    }

    /// Retry frame decode one byte further each time. On success returns the
    /// bytes skipped and the frame, with the reader just past it.
    fn resync(
        &self,
        reader: &mut BitReader,
        failed_at: usize,
        len: usize,
    ) -> Option<(usize, DecodedFrame)> {
        let last = failed_at
            .saturating_add(self.resync_limit)
            .min(len.saturating_sub(1));

        for offset in failed_at + 1..=last {
            reader.seek_to_byte(offset);
            if let Ok(frame) = decode_frame(reader, &self.config) {
                return Some((offset - failed_at, frame));
            }
        }

        None
    }
}

fn append_frame(stream: &mut DecodedStream, frame: DecodedFrame) {
    for (out, samples) in stream.channels.iter_mut().zip(frame.channels) {
        out.extend(samples);
    }
    stream.samples_recovered += frame.num_samples;
    stream.frames_decoded += 1;
}
