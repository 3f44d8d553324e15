//! Symbol duration estimation
//!
//! Infers samples-per-symbol from the lengths of same-value runs in
//! the binarized demodulation stream. Runs cluster around integer
//! multiples of the symbol length; an approximate greatest common
//! divisor of the dominant cluster centers recovers the length
//! itself, so a capture need not contain any isolated single symbol.

#[cfg(not(test))]
use log::debug;
#[cfg(test)]
use std::println as debug;

use crate::dsp;
use crate::estimator::segment::Plateau;

/// Relative tolerance when matching run lengths to multiples
const GCD_TOLERANCE: f64 = 0.10;

/// Estimate the symbol duration in samples
///
/// Returns `None` when the run lengths do not support a symbol
/// duration of at least two samples, which makes the whole parameter
/// estimate unusable.
pub(crate) fn estimate_bit_length(stream: &[f32], plateaus: &[Plateau]) -> Option<u32> {
    let mut runs: Vec<usize> = Vec::new();
    for p in plateaus {
        let end = p.end.min(stream.len());
        if end <= p.start {
            continue;
        }
        let slice = &stream[p.start..end];
        // provisional center; the mean sits between the two level
        // clusters even when one level dominates the plateau
        let split = dsp::mean(slice);
        collect_runs(slice, split, &mut runs);
    }
    if runs.is_empty() {
        return None;
    }

    let bins = cluster_runs(&mut runs);
    let max_count = bins.iter().map(|b| b.len()).max().unwrap_or(0);
    let dominant: Vec<f64> = bins
        .iter()
        .filter(|b| b.len() * 4 >= max_count)
        .map(|b| bin_center(b))
        .collect();

    let mut gcd = dominant[0];
    for &c in &dominant[1..] {
        gcd = approx_gcd(c, gcd);
    }

    debug!(
        "symbol rate: {} runs, {} bins, {} dominant, gcd {:.1}",
        runs.len(),
        bins.len(),
        dominant.len(),
        gcd
    );

    let bit_length = gcd.floor() as u32;
    if bit_length < 2 {
        None
    } else {
        Some(bit_length)
    }
}

fn collect_runs(slice: &[f32], split: f32, runs: &mut Vec<usize>) {
    let mut local: Vec<usize> = Vec::new();
    let mut run = 0usize;
    let mut prev = false;
    for (i, &v) in slice.iter().enumerate() {
        let level = v > split;
        if i == 0 || level == prev {
            run += 1;
        } else {
            local.push(run);
            run = 1;
        }
        prev = level;
    }
    local.push(run);

    // the first and last run of a burst are truncated by the
    // segmentation boundary and would bias the histogram
    if local.len() > 2 {
        runs.extend_from_slice(&local[1..local.len() - 1]);
    } else {
        runs.extend_from_slice(&local);
    }
}

/// Group sorted run lengths into clusters of ±10%
///
/// Greedy over the sorted lengths: a run joins the current cluster
/// while it stays within 10% of the cluster's running center.
fn cluster_runs(runs: &mut Vec<usize>) -> Vec<Vec<usize>> {
    runs.sort_unstable();
    let mut bins: Vec<Vec<usize>> = Vec::new();
    for &run in runs.iter() {
        match bins.last_mut() {
            Some(bin) if (run as f64) <= bin_center(bin) * (1.0 + GCD_TOLERANCE) => {
                bin.push(run);
            }
            _ => bins.push(vec![run]),
        }
    }
    bins
}

/// Robust cluster center: the median run length of the bin
fn bin_center(bin: &[usize]) -> f64 {
    bin[bin.len() / 2] as f64
}

/// Approximate GCD under the matching tolerance
///
/// Euclid's algorithm with rounded quotients; a remainder within
/// tolerance of zero means "divides".
fn approx_gcd(a: f64, b: f64) -> f64 {
    let (mut a, mut b) = if a >= b { (a, b) } else { (b, a) };
    for _ in 0..64 {
        let r = (a - (a / b).round() * b).abs();
        if r <= GCD_TOLERANCE * b {
            return b;
        }
        a = b;
        b = r;
    }
    b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plateau_over(stream: &[f32]) -> Vec<Plateau> {
        vec![Plateau {
            start: 0,
            end: stream.len(),
            pause: 0,
        }]
    }

    fn two_level_stream(bits: &[u8], symbol_len: usize) -> Vec<f32> {
        let mut out = Vec::new();
        for &b in bits {
            let level = if b == 1 { 1.0 } else { -1.0 };
            out.extend(std::iter::repeat(level).take(symbol_len));
        }
        out
    }

    #[test]
    fn test_alternating_bits() {
        let stream = two_level_stream(&[1, 0, 1, 0, 1, 0, 1, 0], 100);
        let bl = estimate_bit_length(&stream, &plateau_over(&stream));
        assert_eq!(bl, Some(100));
    }

    #[test]
    fn test_multi_symbol_runs() {
        // runs of 1, 2, and 3 symbols must still resolve to one symbol
        let stream = two_level_stream(&[1, 0, 0, 1, 1, 1, 0, 1, 0, 0, 1], 50);
        let bl = estimate_bit_length(&stream, &plateau_over(&stream));
        assert_eq!(bl, Some(50));
    }

    #[test]
    fn test_jittered_runs() {
        // boundary jitter of one sample must not shift the estimate
        let mut stream = Vec::new();
        for (i, &b) in [1u8, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 0, 1, 0].iter().enumerate() {
            let level = if b == 1 { 1.0 } else { -1.0 };
            let len = 100 + [0i32, 1, -1][i % 3];
            stream.extend(std::iter::repeat(level).take(len as usize));
        }
        let bl = estimate_bit_length(&stream, &plateau_over(&stream));
        assert_eq!(bl, Some(100));
    }

    #[test]
    fn test_noise_runs_fail() {
        // pseudo-random dither produces runs of 1-3 samples
        let stream: Vec<f32> = (0..4096u32)
            .map(|i| {
                if i.wrapping_mul(2654435761) & 0x8000_0000 != 0 {
                    1.0
                } else {
                    -1.0
                }
            })
            .collect();
        let bl = estimate_bit_length(&stream, &plateau_over(&stream));
        assert_eq!(bl, None);
    }

    #[test]
    fn test_approx_gcd() {
        assert!((approx_gcd(300.0, 100.0) - 100.0).abs() < 1e-9);
        assert!((approx_gcd(99.0, 200.0) - 99.0).abs() < 1e-9);
        assert!(approx_gcd(7.0, 3.0) < 2.0);
    }
}
