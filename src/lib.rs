#![allow(clippy::needless_range_loop)]

use wasm_bindgen::prelude::*;

pub mod core;
pub mod lossless;

pub use crate::core::{
    rice, AlcError, AlcResult, BitReader, BitWriter, Config, DecodedStream, FrameMode,
    VERSION_MAJOR, VERSION_MINOR,
};
pub use lossless::{decode as decode_stream, encode as encode_stream};
pub use lossless::{lpc, Decoder, Encoder, StereoMode};

// result helpers

/// turn an error into js
fn to_js_err(e: AlcError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn stream_config(channels: u8, bit_depth: u8, frame_length: Option<u32>) -> Config {
    let config = Config::new(channels, bit_depth);
    match frame_length {
        Some(len) => config.with_frame_length(len),
        None => config,
    }
}

// api functions

/// route rust panics to the browser console
#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// encode interleaved integer PCM
///
/// # Arguments
/// * `samples` - Interleaved samples, each fitting `bit_depth` bits
/// * `channels` - Number of channels (1-8)
/// * `bit_depth` - Bits per sample (1-32)
/// * `frame_length` - Samples per channel per frame (default 4096)
/// * `compression_level` - 0-9, higher searches longer predictors (default 5)
///
/// # Returns
/// elementary stream bytes; store `config_record` alongside them
#[wasm_bindgen]
pub fn encode(
    samples: &[i32],
    channels: u8,
    bit_depth: u8,
    frame_length: Option<u32>,
    compression_level: Option<u8>,
) -> Result<Vec<u8>, JsValue> {
    let config = stream_config(channels, bit_depth, frame_length);
    Encoder::new(config)
        .with_compression(compression_level.unwrap_or(5))
        .encode_interleaved(samples)
        .map_err(to_js_err)
}

/// decode a stream back to interleaved samples
///
/// Corrupt frames are skipped; use `decode_report` to see what was lost.
#[wasm_bindgen]
pub fn decode(
    data: &[u8],
    channels: u8,
    bit_depth: u8,
    frame_length: Option<u32>,
) -> Result<Vec<i32>, JsValue> {
    let config = stream_config(channels, bit_depth, frame_length);
    Decoder::new(config)
        .decode_interleaved(data)
        .map_err(to_js_err)
}

/// 12-byte config record for a container to store
#[wasm_bindgen]
pub fn config_record(
    channels: u8,
    bit_depth: u8,
    frame_length: Option<u32>,
) -> Result<Vec<u8>, JsValue> {
    let config = stream_config(channels, bit_depth, frame_length);
    config.validate().map_err(to_js_err)?;
    Ok(config.to_bytes())
}

/// decode a stream described by a stored config record
#[wasm_bindgen]
pub fn decode_with_record(record: &[u8], data: &[u8]) -> Result<Vec<i32>, JsValue> {
    let config = Config::from_bytes(record).map_err(to_js_err)?;
    Decoder::new(config)
        .decode_interleaved(data)
        .map_err(to_js_err)
}

/// decode and return the full `DecodedStream` (samples plus recovery stats)
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn decode_report(
    data: &[u8],
    channels: u8,
    bit_depth: u8,
    frame_length: Option<u32>,
) -> Result<JsValue, JsValue> {
    let config = stream_config(channels, bit_depth, frame_length);
    let stream = Decoder::new(config).decode(data).map_err(to_js_err)?;
    serde_wasm_bindgen::to_value(&stream)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// get lib version
#[wasm_bindgen]
pub fn version() -> String {
    format!("{}.{}", VERSION_MAJOR, VERSION_MINOR)
}
