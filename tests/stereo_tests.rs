//! Stereo decorrelation tests for libalc

use libalc::core::bitstream::BitReader;
use libalc::lossless::{
    decode_frame, encode_frame, from_mid_side, to_mid_side, FrameParams, StereoMode,
};
use libalc::{AlcError, Config, Decoder, Encoder, FrameMode};

fn correlated_pair(len: usize) -> (Vec<i32>, Vec<i32>) {
    let left: Vec<i32> = (0..len)
        .map(|i| ((i as f64 * 0.03).sin() * 15000.0) as i32)
        .collect();
    let right: Vec<i32> = left
        .iter()
        .enumerate()
        .map(|(i, &l)| l / 2 + (i as i32 % 7) - 3)
        .collect();
    (left, right)
}

fn roundtrip(config: Config, mode: StereoMode, left: &[i32], right: &[i32]) {
    let channels = vec![left.to_vec(), right.to_vec()];
    let encoded = Encoder::new(config)
        .with_stereo_mode(mode)
        .encode(&channels)
        .expect("Encoding failed");
    let decoded = Decoder::new(config).decode(&encoded).expect("Decoding failed");

    assert!(decoded.is_complete());
    assert_eq!(decoded.channels, channels, "mode {:?}", mode);
}

#[test]
fn test_transform_inverts_exactly() {
    let left: Vec<i32> = (-500..500).collect();
    let right: Vec<i32> = (-500..500).map(|v: i32| v * 3 + 1).collect();

    let (mut mid, mut side) = to_mid_side(&left, &right);
    from_mid_side(&mut mid, &mut side);
    assert_eq!(mid, left);
    assert_eq!(side, right);
}

#[test]
fn test_every_mode_roundtrips() {
    let config = Config::new(2, 16).with_frame_length(1024);
    let (left, right) = correlated_pair(5000);

    for mode in [StereoMode::Independent, StereoMode::MidSide, StereoMode::Auto] {
        roundtrip(config, mode, &left, &right);
    }
}

#[test]
fn test_extreme_stereo_roundtrips() {
    let config = Config::new(2, 16).with_frame_length(256);
    let left: Vec<i32> = (0..1000)
        .map(|i| if i % 2 == 0 { 32767 } else { -32768 })
        .collect();
    let right: Vec<i32> = left.iter().map(|&l| -1 - l).collect();

    roundtrip(config, StereoMode::MidSide, &left, &right);
}

#[test]
fn test_mid_side_frame_mode() {
    let config = Config::new(2, 16).with_frame_length(512);
    let (left, right) = correlated_pair(512);
    let params = FrameParams {
        max_order: 8,
        stereo: StereoMode::MidSide,
    };

    let channels = [left.as_slice(), right.as_slice()];
    let bytes = encode_frame(&config, &channels, &params).unwrap();
    let mut reader = BitReader::new(&bytes);
    let frame = decode_frame(&mut reader, &config).unwrap();

    assert_eq!(frame.mode, FrameMode::CompressedMidSide);
    assert_eq!(frame.channels, vec![left, right]);
}

#[test]
fn test_independent_mode_skips_transform() {
    let config = Config::new(2, 16).with_frame_length(512);
    let (left, right) = correlated_pair(512);
    let params = FrameParams {
        max_order: 8,
        stereo: StereoMode::Independent,
    };

    let channels = [left.as_slice(), right.as_slice()];
    let bytes = encode_frame(&config, &channels, &params).unwrap();
    let frame = decode_frame(&mut BitReader::new(&bytes), &config).unwrap();
    assert_eq!(frame.mode, FrameMode::Compressed);
}

#[test]
fn test_32_bit_stereo_codes_channels_independently() {
    let config = Config::new(2, 32).with_frame_length(512);
    let left: Vec<i32> = (0..512)
        .map(|i| ((i as f64 * 0.02).sin() * 2.0e9) as i32)
        .collect();
    let right: Vec<i32> = left.iter().map(|&l| -l).collect();
    let params = FrameParams {
        max_order: 8,
        stereo: StereoMode::MidSide,
    };

    let channels = [left.as_slice(), right.as_slice()];
    let bytes = encode_frame(&config, &channels, &params).unwrap();
    let frame = decode_frame(&mut BitReader::new(&bytes), &config).unwrap();

    assert_ne!(frame.mode, FrameMode::CompressedMidSide);
    assert_eq!(frame.channels, vec![left.clone(), right.clone()]);

    roundtrip(config, StereoMode::MidSide, &left, &right);
}

#[test]
fn test_mid_side_frame_rejected_by_32_bit_config() {
    let config16 = Config::new(2, 16).with_frame_length(256);
    let (left, right) = correlated_pair(256);
    let params = FrameParams {
        max_order: 4,
        stereo: StereoMode::MidSide,
    };
    let channels = [left.as_slice(), right.as_slice()];
    let bytes = encode_frame(&config16, &channels, &params).unwrap();

    let config32 = Config::new(2, 32).with_frame_length(256);
    let result = decode_frame(&mut BitReader::new(&bytes), &config32);
    assert!(matches!(result, Err(AlcError::Desync(_))));
}
