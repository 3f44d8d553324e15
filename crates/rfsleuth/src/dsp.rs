//! Derived streams and small numeric helpers
//!
//! The estimator stages work on three arrays derived from the IQ
//! buffer: the magnitude envelope, the unwrapped instantaneous phase,
//! and the instantaneous frequency (first difference of the phase).
//! Each is computed on demand; only the stream the selected modulation
//! needs is ever materialized.

use num_complex::Complex;

use std::f32::consts::PI;

/// Magnitude envelope `|z[n]|`
pub(crate) fn magnitude(iq: &[Complex<f32>]) -> Vec<f32> {
    iq.iter().map(|z| z.norm()).collect()
}

/// Unwrapped instantaneous phase
///
/// Computes `atan2(Q, I)` per sample and removes 2π discontinuities
/// so consecutive samples never differ by more than π.
pub(crate) fn phase(iq: &[Complex<f32>]) -> Vec<f32> {
    let mut out = Vec::with_capacity(iq.len());
    let mut offset = 0.0f32;
    let mut prev_raw = 0.0f32;
    for (n, z) in iq.iter().enumerate() {
        let raw = z.im.atan2(z.re);
        if n > 0 {
            let delta = raw - prev_raw;
            if delta > PI {
                offset -= 2.0 * PI;
            } else if delta < -PI {
                offset += 2.0 * PI;
            }
        }
        prev_raw = raw;
        out.push(raw + offset);
    }
    out
}

/// Instantaneous frequency `φ[n+1] − φ[n]`, in rad/sample
///
/// The result has one element fewer than the phase array; the last
/// value is repeated so all derived streams share the buffer length.
pub(crate) fn instantaneous_frequency(phase: &[f32]) -> Vec<f32> {
    if phase.len() < 2 {
        return vec![0.0; phase.len()];
    }
    let mut out: Vec<f32> = phase.windows(2).map(|w| w[1] - w[0]).collect();
    let last = *out.last().expect("len >= 2");
    out.push(last);
    out
}

/// Wrap an angle to (−π, π]
pub(crate) fn wrap_angle(x: f32) -> f32 {
    let mut w = x % (2.0 * PI);
    if w > PI {
        w -= 2.0 * PI;
    } else if w <= -PI {
        w += 2.0 * PI;
    }
    w
}

pub(crate) fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

pub(crate) fn std_dev(values: &[f32]) -> f32 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f32>() / values.len() as f32;
    var.sqrt()
}

/// Median by sorting a copy; deterministic under total float order
pub(crate) fn median(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    sorted[sorted.len() / 2]
}

/// Result of two-means clustering of a scalar sample set
#[derive(Clone, Copy, Debug)]
pub(crate) struct TwoMeans {
    /// Lower centroid
    pub lo: f32,
    /// Upper centroid
    pub hi: f32,
    /// Samples assigned to the lower centroid
    pub n_lo: usize,
    /// Samples assigned to the upper centroid
    pub n_hi: usize,
    /// Pooled within-cluster variance
    pub within_var: f32,
    /// Variance of the full sample set
    pub total_var: f32,
}

impl TwoMeans {
    /// Fraction of samples in the smaller cluster
    pub fn minor_fraction(&self) -> f32 {
        let n = (self.n_lo + self.n_hi) as f32;
        self.n_lo.min(self.n_hi) as f32 / n
    }

    /// Fraction of the total variance explained by the split
    ///
    /// Close to 1.0 for a cleanly bimodal sample set; around 0.6–0.75
    /// for unimodal distributions.
    pub fn separation(&self) -> f32 {
        if self.total_var <= f32::MIN_POSITIVE {
            return 0.0;
        }
        1.0 - self.within_var / self.total_var
    }
}

/// Two-means clustering with deterministic initialization
///
/// Centroids start at the sample minimum and maximum and iterate
/// until both move less than `epsilon`. Returns `None` for inputs
/// that cannot form two clusters (fewer than two samples, or a
/// constant stream).
pub(crate) fn two_means(values: &[f32], epsilon: f32) -> Option<TwoMeans> {
    if values.len() < 2 {
        return None;
    }
    let mut lo = values.iter().copied().fold(f32::INFINITY, f32::min);
    let mut hi = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !(hi - lo).is_finite() || hi - lo <= f32::MIN_POSITIVE {
        return None;
    }

    let mut n_lo = 0usize;
    let mut n_hi = 0usize;
    for _ in 0..100 {
        let split = 0.5 * (lo + hi);
        let mut sum_lo = 0.0f64;
        let mut sum_hi = 0.0f64;
        n_lo = 0;
        n_hi = 0;
        for &v in values {
            if v <= split {
                sum_lo += v as f64;
                n_lo += 1;
            } else {
                sum_hi += v as f64;
                n_hi += 1;
            }
        }
        if n_lo == 0 || n_hi == 0 {
            break;
        }
        let new_lo = (sum_lo / n_lo as f64) as f32;
        let new_hi = (sum_hi / n_hi as f64) as f32;
        let moved = (new_lo - lo).abs() + (new_hi - hi).abs();
        lo = new_lo;
        hi = new_hi;
        if moved < epsilon {
            break;
        }
    }
    if n_lo == 0 || n_hi == 0 {
        return None;
    }

    let split = 0.5 * (lo + hi);
    let mut within = 0.0f64;
    for &v in values {
        let c = if v <= split { lo } else { hi };
        within += ((v - c) as f64).powi(2);
    }
    let within_var = (within / values.len() as f64) as f32;
    let total_var = {
        let s = std_dev(values);
        s * s
    };

    Some(TwoMeans {
        lo,
        hi,
        n_lo,
        n_hi,
        within_var,
        total_var,
    })
}
