//! Demodulation and message extraction
//!
//! Applies the estimated signal parameters to slice each plateau of
//! the capture into a message bitstring. The slicer is run-length
//! based: the quantized stream is reduced to same-value runs, and
//! each run contributes as many bits as symbol lengths it spans,
//! re-synchronizing the symbol clock at every transition.

#[cfg(not(test))]
use log::debug;
#[cfg(test)]
use std::println as debug;

use crate::config::AnalysisConfig;
use crate::dsp;
use crate::estimator::segment::Plateau;
use crate::estimator::{Modulation, SignalParameters};
use crate::message::Message;

use std::f32::consts::PI;

/// Build the demodulation stream for a modulation class
///
/// * ASK: the magnitude envelope itself.
/// * FSK: instantaneous frequency; higher frequency maps to `1`.
/// * PSK: absolute phase rotation relative to the start of each
///   plateau, normalized to `[0, 1]`. A message therefore decodes
///   with its leading symbol as `0`; absolute phase is unknowable
///   without a pilot tone.
pub(crate) fn build_stream(
    modulation: Modulation,
    magnitude: &[f32],
    phase: &[f32],
    frequency: &[f32],
    plateaus: &[Plateau],
) -> Vec<f32> {
    match modulation {
        Modulation::Ask => magnitude.to_vec(),
        Modulation::Fsk => frequency.to_vec(),
        Modulation::Psk => {
            let mut out = vec![0.0f32; phase.len()];
            for p in plateaus {
                let end = p.end.min(phase.len());
                if end <= p.start {
                    continue;
                }
                let reference = phase[reference_index(p.start, end)];
                for i in p.start..end {
                    out[i] = dsp::wrap_angle(phase[i] - reference).abs() / PI;
                }
            }
            out
        }
    }
}

/// Phase reference sample for a plateau
///
/// Segmentation boundaries are blurred by envelope smoothing, so the
/// very first samples of a plateau may predate the burst. The
/// reference is taken a few samples in, safely inside the first
/// symbol.
pub(crate) fn reference_index(start: usize, end: usize) -> usize {
    start + ((end - start) / 4).min(16)
}

/// Slice every plateau into a message
///
/// Plateaus whose run lengths disagree with the symbol length beyond
/// the configured ambiguity budget are dropped; the rest are emitted
/// in capture order.
pub(crate) fn extract_messages(
    stream: &[f32],
    plateaus: &[Plateau],
    params: &SignalParameters,
    cfg: &AnalysisConfig,
) -> Vec<Message> {
    let bit_length = params.bit_length as usize;
    let tolerance = params.tolerance as usize;

    let mut messages = Vec::new();
    for p in plateaus {
        let end = p.end.min(stream.len());
        if end <= p.start {
            continue;
        }

        let mut bits: Vec<bool> = Vec::new();
        let mut ambiguous = 0usize;
        for (level, run_len) in runs(&stream[p.start..end], params.center) {
            let symbols = (run_len + bit_length / 2) / bit_length;
            if symbols == 0 {
                // shorter than half a symbol: spurious transition
                ambiguous += 1;
                continue;
            }
            let residual = run_len.abs_diff(symbols * bit_length);
            if residual > tolerance {
                ambiguous += symbols;
            }
            bits.extend(std::iter::repeat(level).take(symbols));
        }

        if bits.is_empty() {
            continue;
        }
        if ambiguous as f32 > cfg.max_ambiguous_fraction * bits.len() as f32 {
            debug!(
                "dropping plateau [{}, {}): {} of {} symbols ambiguous",
                p.start,
                p.end,
                ambiguous,
                bits.len()
            );
            continue;
        }

        messages.push(Message::new(bits, p.pause));
    }
    messages
}

/// Same-value runs of the quantized stream
fn runs(slice: &[f32], center: f32) -> Vec<(bool, usize)> {
    let mut out: Vec<(bool, usize)> = Vec::new();
    for &v in slice {
        let level = v > center;
        match out.last_mut() {
            Some((prev, len)) if *prev == level => *len += 1,
            _ => out.push((level, 1)),
        }
    }
    out
}
