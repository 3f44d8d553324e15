//! Burst segmentation
//!
//! Splits the magnitude envelope into plateaus: contiguous regions
//! above the noise floor, each a candidate message. The envelope is
//! smoothed by a short moving average before thresholding, so single
//! noise spikes neither open a burst nor reset the closing pause, and
//! hysteresis keeps brief dips (zero-bits of an amplitude keyed
//! burst, fading) from splitting one transmission into many.

use crate::config::AnalysisConfig;

/// A candidate message region of the capture
///
/// Half-open sample interval `[start, end)` over the derived streams,
/// plus the silence separating it from the next plateau.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Plateau {
    /// First sample of the burst
    pub start: usize,
    /// One past the last sample of the burst
    pub end: usize,
    /// Samples of silence before the next plateau (0 for the last)
    pub pause: usize,
}

impl Plateau {
    /// Number of samples in the plateau
    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Segment the envelope into plateaus
///
/// A plateau opens at the first sample whose smoothed envelope
/// reaches `noise * (1 + hysteresis_rise)` and closes at the first
/// later sample below `noise * (1 - hysteresis_fall)` that stays
/// below for at least `min_pause` samples. Smoothing widens every
/// region by up to one window, so the glitch cut compensates: a
/// surviving plateau must outlast `min_plateau` plus the window.
pub(crate) fn find_plateaus(
    magnitude: &[f32],
    noise: f32,
    min_pause: usize,
    cfg: &AnalysisConfig,
) -> Vec<Plateau> {
    let envelope = smooth(magnitude, cfg.envelope_window);
    let enter = noise * (1.0 + cfg.hysteresis_rise);
    let exit = noise * (1.0 - cfg.hysteresis_fall);
    let min_pause = min_pause.max(1);

    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut active: Option<usize> = None;
    let mut below_since: Option<usize> = None;

    for (n, &v) in envelope.iter().enumerate() {
        match active {
            None => {
                if v >= enter {
                    active = Some(n);
                    below_since = None;
                }
            }
            Some(start) => {
                if v < exit {
                    let b = *below_since.get_or_insert(n);
                    if n - b + 1 >= min_pause {
                        spans.push((start, b));
                        active = None;
                        below_since = None;
                    }
                } else {
                    below_since = None;
                }
            }
        }
    }
    if let Some(start) = active {
        // the capture ended mid-burst or mid-pause
        spans.push((start, below_since.unwrap_or(magnitude.len())));
    }

    let min_len = cfg.min_plateau + cfg.envelope_window;
    spans.retain(|(start, end)| end - start >= min_len);

    spans
        .iter()
        .enumerate()
        .map(|(k, &(start, end))| Plateau {
            start,
            end,
            pause: match spans.get(k + 1) {
                Some(&(next_start, _)) => next_start - end,
                None => 0,
            },
        })
        .collect()
}

/// Centered moving average over `window` samples
fn smooth(magnitude: &[f32], window: usize) -> Vec<f32> {
    let window = window.max(1);
    let half = window / 2;
    let mut prefix = Vec::with_capacity(magnitude.len() + 1);
    let mut acc = 0.0f64;
    prefix.push(0.0f64);
    for &v in magnitude {
        acc += v as f64;
        prefix.push(acc);
    }

    (0..magnitude.len())
        .map(|n| {
            let lo = n.saturating_sub(half);
            let hi = (n + half + 1).min(magnitude.len());
            ((prefix[hi] - prefix[lo]) / (hi - lo) as f64) as f32
        })
        .collect()
}
