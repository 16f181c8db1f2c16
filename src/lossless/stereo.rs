//! Reversible mid/side transform for stereo frames.
//!
//! Forward: `mid = (l + r) >> 1`, `side = l - r`. The bit dropped by the shift
//! is not lost: `l + r` and `l - r` always share parity, so the inverse reads
//! it back from the low bit of `side`.

/// How the encoder treats two-channel frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StereoMode {
    /// code left and right as they are
    Independent,
    /// always code mid/side
    #[default]
    MidSide,
    /// mid/side only when the side channel carries less energy
    Auto,
}

/// Convert stereo to mid-side
pub fn to_mid_side(left: &[i32], right: &[i32]) -> (Vec<i32>, Vec<i32>) {
    left.iter()
        .zip(right.iter())
        .map(|(&l, &r)| {
            let (l, r) = (l as i64, r as i64);
            (((l + r) >> 1) as i32, (l - r) as i32)
        })
        .unzip()
}

/// Convert mid-side back to left-right, in place
pub fn from_mid_side(mid_left: &mut [i32], side_right: &mut [i32]) {
    for (m, s) in mid_left.iter_mut().zip(side_right.iter_mut()) {
        let side = *s as i64;
        let sum = ((*m as i64) << 1) | (side & 1);
        *m = ((sum + side) >> 1) as i32;
        *s = ((sum - side) >> 1) as i32;
    }
}

/// Check if mid-side coding would help
pub fn should_use_mid_side(left: &[i32], right: &[i32]) -> bool {
    let mut var_l: i128 = 0;
    let mut var_r: i128 = 0;
    let mut var_side: i128 = 0;

    for (&l, &r) in left.iter().zip(right.iter()) {
        var_l += (l as i128) * (l as i128);
        var_r += (r as i128) * (r as i128);
        let side = l as i128 - r as i128;
        var_side += side * side;
    }

    // If side channel has less energy, mid-side helps
    var_side < (var_l + var_r) / 2
}
