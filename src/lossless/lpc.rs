use crate::core::bitstream::sign_extend;
use crate::core::rice::{estimate_bits, estimate_rice_parameter};
use crate::core::{AlcError, AlcResult, DEFAULT_SHIFT, MAX_LPC_ORDER};

/// Bits spent on one quantized coefficient in a subframe header.
pub const COEFF_BITS: u32 = 16;

/// Calculate autocorrelation coefficients for lags `0..=max_lag`
pub fn autocorrelation(samples: &[i32], max_lag: usize) -> Vec<f64> {
    let mut autocorr = vec![0.0; max_lag + 1];

    for (lag, slot) in autocorr.iter_mut().enumerate() {
        let mut sum: i128 = 0;
        for i in lag..samples.len() {
            sum += (samples[i] as i128) * (samples[i - lag] as i128);
        }
        *slot = sum as f64;
    }

    autocorr
}

/// Levinson-Durbin recursion.
///
/// Returns `(coefficients, prediction error)` for every order from 1 up to
/// `max_order`, stopping early once the recursion turns unstable. Empty for
/// silent input.
pub fn levinson_durbin(autocorr: &[f64], max_order: usize) -> Vec<(Vec<f64>, f64)> {
    let max_order = max_order.min(autocorr.len().saturating_sub(1));
    let mut solutions = Vec::with_capacity(max_order);

    if autocorr.is_empty() || autocorr[0] <= 0.0 {
        return solutions;
    }

    let mut coeffs = vec![0.0f64; max_order];
    let mut error = autocorr[0];

    for i in 0..max_order {
        let mut lambda = autocorr[i + 1];
        for j in 0..i {
            lambda -= coeffs[j] * autocorr[i - j];
        }

        if error.abs() < 1e-10 {
            break;
        }

        let gamma = lambda / error;
        if !gamma.is_finite() || gamma.abs() >= 1.0 {
            break;
        }

        let prev = coeffs.clone();
        coeffs[i] = gamma;
        for j in 0..i {
            coeffs[j] = prev[j] - gamma * prev[i - 1 - j];
        }

        error *= 1.0 - gamma * gamma;
        solutions.push((coeffs[..=i].to_vec(), error));
    }

    solutions
}

/// Quantize real coefficients to 16-bit fixed point.
///
/// Starts from `DEFAULT_SHIFT` and lowers the shift until every coefficient
/// fits; anything still too large at shift 0 is clamped. The decoder only
/// ever sees the quantized values, so clamping never breaks exactness.
pub fn quantize_coefficients(coeffs: &[f64]) -> (Vec<i32>, u8) {
    if coeffs.is_empty() {
        return (vec![], 0);
    }

    let max_val = coeffs.iter().map(|c| c.abs()).fold(0.0f64, f64::max);

    let mut shift = DEFAULT_SHIFT;
    while shift > 0 && (max_val * (1u32 << shift) as f64).round() > i16::MAX as f64 {
        shift -= 1;
    }

    let scale = (1u32 << shift) as f64;
    let quantized = coeffs
        .iter()
        .map(|&c| (c * scale).round().clamp(i16::MIN as f64, i16::MAX as f64) as i32)
        .collect();

    (quantized, shift)
}

#[inline]
fn predict(history: &[i32], i: usize, coeffs: &[i32], shift: u8) -> i64 {
    let mut prediction: i64 = 0;
    for (j, &coeff) in coeffs.iter().enumerate() {
        prediction += (coeff as i64) * (history[i - j - 1] as i64);
    }
    prediction >> shift
}

/// Calculate residuals using the integer predictor.
///
/// The first `order` samples are copied as warm-up. Residuals are wrapped to
/// `width` bits so they always fit the escape field.
pub fn calc_residuals(samples: &[i32], coeffs: &[i32], shift: u8, width: u32) -> Vec<i32> {
    let order = coeffs.len();
    let mut residuals = Vec::with_capacity(samples.len());

    residuals.extend_from_slice(&samples[..order.min(samples.len())]);

    for i in order..samples.len() {
        let prediction = predict(samples, i, coeffs, shift);
        residuals.push(sign_extend(samples[i] as i64 - prediction, width));
    }

    residuals
}

/// Reconstruct samples from residuals, in place.
///
/// Uses the same integer prediction and width wrapping as `calc_residuals`,
/// so the result is exact for any shift.
pub fn reconstruct_samples(buffer: &mut [i32], coeffs: &[i32], shift: u8, width: u32) {
    let order = coeffs.len();

    for i in order..buffer.len() {
        let prediction = predict(buffer, i, coeffs, shift);
        buffer[i] = sign_extend(buffer[i] as i64 + prediction, width);
    }
}

/// Reject orders the frame cannot carry.
pub fn check_order(order: usize, frame_samples: usize) -> AlcResult<()> {
    if order > MAX_LPC_ORDER {
        return Err(AlcError::UnsupportedOrder {
            order,
            limit: MAX_LPC_ORDER,
        });
    }
    if order > 0 && order >= frame_samples {
        return Err(AlcError::UnsupportedOrder {
            order,
            limit: frame_samples,
        });
    }
    Ok(())
}

/// One prediction order tried by the encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictorCandidate {
    pub order: usize,
    pub coeffs: Vec<i32>,
    pub shift: u8,
    pub residuals: Vec<i32>,
    /// nothing but warm-up is non-zero
    pub exact: bool,
    pub estimated_bits: u64,
}

impl PredictorCandidate {
    fn new(coeffs: Vec<i32>, shift: u8, residuals: Vec<i32>, width: u32) -> Self {
        let order = coeffs.len();
        let exact = residuals[order.min(residuals.len())..]
            .iter()
            .all(|&r| r == 0);

        let coded = if exact {
            &residuals[..order.min(residuals.len())]
        } else {
            &residuals[..]
        };
        let k = estimate_rice_parameter(coded);
        let estimated_bits = estimate_bits(coded, k, width) + order as u64 * COEFF_BITS as u64;

        PredictorCandidate {
            order,
            coeffs,
            shift,
            residuals,
            exact,
            estimated_bits,
        }
    }

    /// residuals that actually go into the bitstream
    pub fn coded_residuals(&self) -> &[i32] {
        if self.exact {
            &self.residuals[..self.order.min(self.residuals.len())]
        } else {
            &self.residuals
        }
    }
}

/// Try every order up to `max_order` and keep the cheapest.
///
/// Order 0 (samples as residuals) is always a candidate; orders at or above
/// the sample count are never tried.
pub fn search_best_predictor(samples: &[i32], max_order: usize, width: u32) -> PredictorCandidate {
    let mut best = PredictorCandidate::new(vec![], 0, samples.to_vec(), width);

    let max_order = max_order
        .min(MAX_LPC_ORDER)
        .min(samples.len().saturating_sub(1));
    if max_order == 0 || best.exact {
        return best;
    }

    let autocorr = autocorrelation(samples, max_order);

    for (real_coeffs, _error) in levinson_durbin(&autocorr, max_order) {
        let (coeffs, shift) = quantize_coefficients(&real_coeffs);
        let residuals = calc_residuals(samples, &coeffs, shift, width);
        let candidate = PredictorCandidate::new(coeffs, shift, residuals, width);

        if candidate.estimated_bits < best.estimated_bits {
            best = candidate;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autocorrelation_constant() {
        let ac = autocorrelation(&[2; 10], 3);
        assert_eq!(ac, vec![40.0, 36.0, 32.0, 28.0]);
    }

    #[test]
    fn test_levinson_first_order() {
        // r1/r0 is the single reflection coefficient
        let solutions = levinson_durbin(&[10.0, 5.0], 1);
        assert_eq!(solutions.len(), 1);
        assert!((solutions[0].0[0] - 0.5).abs() < 1e-12);
        assert!((solutions[0].1 - 7.5).abs() < 1e-12);
    }

    #[test]
    fn test_levinson_silence() {
        assert!(levinson_durbin(&[0.0, 0.0, 0.0], 2).is_empty());
    }

    #[test]
    fn test_quantize_default_shift() {
        let (q, shift) = quantize_coefficients(&[0.5, -0.25]);
        assert_eq!(shift, 9);
        assert_eq!(q, vec![256, -128]);
    }

    #[test]
    fn test_quantize_lowers_shift() {
        // 100 * 512 overflows i16, 100 * 256 fits
        let (q, shift) = quantize_coefficients(&[100.0]);
        assert_eq!(shift, 8);
        assert_eq!(q, vec![25600]);
    }

    #[test]
    fn test_residual_roundtrip_in_place() {
        let samples: Vec<i32> = (0..200).map(|i| ((i * 37) % 101) - 50).collect();
        let coeffs = vec![700, -300, 90];
        let mut buffer = calc_residuals(&samples, &coeffs, 9, 16);
        reconstruct_samples(&mut buffer, &coeffs, 9, 16);
        assert_eq!(buffer, samples);
    }

    #[test]
    fn test_wrapping_keeps_width() {
        // prediction overshoots: 2 * 32767 - 32767 -> residual wraps
        let samples = vec![32767, 32767, -32768];
        let coeffs = vec![1024];
        let residuals = calc_residuals(&samples, &coeffs, 9, 16);
        assert!(residuals
            .iter()
            .all(|&r| (-32768..=32767).contains(&r)));

        let mut buffer = residuals.clone();
        reconstruct_samples(&mut buffer, &coeffs, 9, 16);
        assert_eq!(buffer, samples);
    }

    #[test]
    fn test_check_order() {
        assert!(check_order(0, 1).is_ok());
        assert!(check_order(4, 5).is_ok());
        assert_eq!(
            check_order(5, 5),
            Err(AlcError::UnsupportedOrder { order: 5, limit: 5 })
        );
        assert_eq!(
            check_order(32, 4096),
            Err(AlcError::UnsupportedOrder { order: 32, limit: 31 })
        );
    }

    #[test]
    fn test_search_prefers_prediction_for_ramp() {
        let samples: Vec<i32> = (0..1024).map(|i| i * 10).collect();
        let best = search_best_predictor(&samples, 8, 16);
        assert!(best.order > 0);
        let baseline = PredictorCandidate::new(vec![], 0, samples.clone(), 16);
        assert!(best.estimated_bits < baseline.estimated_bits);
    }

    #[test]
    fn test_search_silence_is_order_zero() {
        let best = search_best_predictor(&[0; 256], 8, 16);
        assert_eq!(best.order, 0);
        assert!(best.exact);
        assert!(best.coded_residuals().is_empty());
    }

    #[test]
    fn test_search_single_sample() {
        let best = search_best_predictor(&[1000], 8, 16);
        assert_eq!(best.order, 0);
        assert_eq!(best.residuals, vec![1000]);
    }
}
