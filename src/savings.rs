//! percentage difference of the HLS figures against the RTL ones

use itertools::Itertools;

/// round to `digits` decimals, ties to even on the scaled value
pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round_ties_even() / scale
}

/// `(a - b) / a * 100` rounded to 2 decimals, 0 when either side is 0
pub fn saving(a: f64, b: f64) -> f64 {
    if a == 0.0 || b == 0.0 {
        0.0
    } else {
        round_to((a - b) / a * 100.0, 2)
    }
}

/// pairwise savings of two metric lists of the same length
pub fn calc_savings<const N: usize>(hls: &[f64; N], rtl: &[f64; N]) -> Vec<f64> {
    hls.iter()
        .zip(rtl)
        .map(|(&a, &b)| saving(a, b))
        .collect_vec()
}
