//! Linear predictor tests for libalc

use libalc::lpc::*;
use libalc::rice::{estimate_bits, estimate_rice_parameter};
use libalc::AlcError;

fn sine(len: usize, step: f64, amplitude: f64) -> Vec<i32> {
    (0..len)
        .map(|i| ((i as f64 * step).sin() * amplitude) as i32)
        .collect()
}

#[test]
fn test_sine_prefers_prediction() {
    let samples = sine(2048, 0.05, 10000.0);
    let best = search_best_predictor(&samples, 8, 16);

    assert!(best.order >= 2, "order {}", best.order);

    let k = estimate_rice_parameter(&samples);
    let baseline = estimate_bits(&samples, k, 16);
    assert!(best.estimated_bits < baseline / 2);
}

#[test]
fn test_best_candidate_reconstructs() {
    let samples = sine(1000, 0.11, 20000.0);
    let best = search_best_predictor(&samples, 12, 16);

    let mut buffer = best.residuals.clone();
    reconstruct_samples(&mut buffer, &best.coeffs, best.shift, 16);
    assert_eq!(buffer, samples);
}

#[test]
fn test_reconstruction_independent_of_shift() {
    let samples: Vec<i32> = (0..500).map(|i| ((i * 7919) % 20001) - 10000).collect();
    let coeffs = vec![410, -120, 33, 7];

    for shift in 0..=15u8 {
        let residuals = calc_residuals(&samples, &coeffs, shift, 16);
        assert_eq!(&residuals[..4], &samples[..4]);

        let mut buffer = residuals;
        reconstruct_samples(&mut buffer, &coeffs, shift, 16);
        assert_eq!(buffer, samples, "shift {}", shift);
    }
}

#[test]
fn test_levinson_error_decreases() {
    let samples = sine(4096, 0.07, 8000.0);
    let autocorr = autocorrelation(&samples, 16);
    let solutions = levinson_durbin(&autocorr, 16);

    assert!(!solutions.is_empty());
    let mut last_error = autocorr[0];
    for (i, (coeffs, error)) in solutions.iter().enumerate() {
        assert_eq!(coeffs.len(), i + 1);
        assert!(*error <= last_error);
        last_error = *error;
    }
}

#[test]
fn test_quantized_coefficients_fit_header() {
    let samples = sine(4096, 0.01, 30000.0);
    let autocorr = autocorrelation(&samples, 31);

    for (coeffs, _) in levinson_durbin(&autocorr, 31) {
        let (quantized, shift) = quantize_coefficients(&coeffs);
        assert_eq!(quantized.len(), coeffs.len());
        assert!(shift <= 9);
        assert!(quantized
            .iter()
            .all(|&c| c >= i16::MIN as i32 && c <= i16::MAX as i32));
    }
}

#[test]
fn test_search_respects_limits() {
    let short = vec![10, 20, 30, 40, 50];
    assert!(search_best_predictor(&short, 31, 16).order <= 4);

    let samples = sine(512, 0.05, 1000.0);
    assert_eq!(search_best_predictor(&samples, 0, 16).order, 0);
    assert!(search_best_predictor(&samples, 3, 16).order <= 3);
}

#[test]
fn test_constant_channel_is_exact() {
    let samples = vec![1000; 4096];
    let best = search_best_predictor(&samples, 8, 16);

    assert!(best.exact);
    assert_eq!(best.order, 1);
    assert_eq!(best.coded_residuals(), &[1000]);
}

#[test]
fn test_check_order_bounds() {
    assert!(check_order(31, 32).is_ok());
    assert!(check_order(0, 1).is_ok());
    assert!(matches!(
        check_order(31, 31),
        Err(AlcError::UnsupportedOrder { .. })
    ));
    assert!(matches!(
        check_order(40, 4096),
        Err(AlcError::UnsupportedOrder { limit: 31, .. })
    ));
}
