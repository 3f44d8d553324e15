//! Modulation classification
//!
//! Decides among ASK, FSK, and PSK from three dispersion features,
//! each compared against what pure noise produces:
//!
//! * amplitude keying shows up as envelope dispersion inside bursts
//!   far above the noise-window baseline;
//! * frequency keying makes the instantaneous frequency bimodal, so
//!   splitting it into two clusters explains almost all of its
//!   variance;
//! * phase keying leaves the envelope and frequency quiet but makes
//!   symbol-spaced phase hops bimodal (near 0 and near π).
//!
//! The decision is ordered: ASK on envelope dominance, else FSK on
//! frequency dominance, else PSK. When all three scores agree to
//! within 10% the capture is ambiguous and FSK is assumed.

#[cfg(not(test))]
use log::debug;
#[cfg(test)]
use std::println as debug;

use crate::config::AnalysisConfig;
use crate::dsp;
use crate::estimator::segment::Plateau;
use crate::estimator::Modulation;

/// Envelope dispersion of noise: coefficient of variation of a
/// Rayleigh-distributed magnitude. Used when the capture has no
/// quiet windows to measure.
const NOISE_CV_FALLBACK: f32 = 0.52;

/// Minimum share of samples in the smaller cluster for a two-cluster
/// split to count as bimodal.
const MIN_BIMODAL_FRACTION: f32 = 0.15;

/// Classify the modulation of a segmented capture
pub(crate) fn classify(
    magnitude: &[f32],
    phase: &[f32],
    frequency: &[f32],
    plateaus: &[Plateau],
    noise: f32,
    cfg: &AnalysisConfig,
) -> Modulation {
    let s_ask = envelope_score(magnitude, plateaus, cfg);
    let s_fsk = bimodality(&gated_frequency(magnitude, frequency, plateaus, noise), cfg);
    let stride = phase_stride(phase, plateaus);
    let s_psk = bimodality(
        &symbol_phase_hops(magnitude, phase, plateaus, noise, stride),
        cfg,
    );

    debug!(
        "modulation scores: ask {:.3}, fsk {:.3}, psk {:.3} (stride {})",
        s_ask, s_fsk, s_psk, stride
    );

    let max = s_ask.max(s_fsk).max(s_psk);
    let min = s_ask.min(s_fsk).min(s_psk);
    if max - min <= 0.1 * max {
        // ambiguous; take the conventional default
        return Modulation::Fsk;
    }

    if s_fsk >= s_ask && s_fsk >= s_psk {
        Modulation::Fsk
    } else if s_ask >= s_psk {
        Modulation::Ask
    } else {
        Modulation::Psk
    }
}

/// Envelope dispersion inside bursts, relative to the noise baseline
fn envelope_score(magnitude: &[f32], plateaus: &[Plateau], cfg: &AnalysisConfig) -> f32 {
    let cvs: Vec<f32> = plateaus
        .iter()
        .map(|p| {
            let slice = &magnitude[p.start..p.end];
            let m = dsp::mean(slice);
            if m <= f32::MIN_POSITIVE {
                0.0
            } else {
                dsp::std_dev(slice) / m
            }
        })
        .collect();
    let baseline = noise_window_cv(magnitude, plateaus, cfg).max(1e-3);
    dsp::median(&cvs) / baseline
}

/// Envelope dispersion of windows outside every plateau
fn noise_window_cv(magnitude: &[f32], plateaus: &[Plateau], cfg: &AnalysisConfig) -> f32 {
    let mut cvs = Vec::new();
    let mut cursor = 0usize;
    for p in plateaus {
        collect_window_cvs(&magnitude[cursor..p.start.min(magnitude.len())], cfg, &mut cvs);
        cursor = p.end.min(magnitude.len());
    }
    collect_window_cvs(&magnitude[cursor..], cfg, &mut cvs);

    if cvs.len() < 4 {
        NOISE_CV_FALLBACK
    } else {
        dsp::median(&cvs)
    }
}

fn collect_window_cvs(quiet: &[f32], cfg: &AnalysisConfig, out: &mut Vec<f32>) {
    for w in quiet.chunks_exact(cfg.noise_window) {
        let m = dsp::mean(w);
        if m > f32::MIN_POSITIVE {
            out.push(dsp::std_dev(w) / m);
        }
    }
}

/// Instantaneous frequency of signal-bearing samples
fn gated_frequency(
    magnitude: &[f32],
    frequency: &[f32],
    plateaus: &[Plateau],
    noise: f32,
) -> Vec<f32> {
    let mut out = Vec::new();
    for p in plateaus {
        let end = p.end.min(frequency.len());
        for i in p.start..end {
            if magnitude[i] >= noise {
                out.push(frequency[i]);
            }
        }
    }
    out
}

/// Fraction of a sample set's variance explained by a two-cluster
/// split, or zero when the split is not genuinely bimodal
fn bimodality(values: &[f32], cfg: &AnalysisConfig) -> f32 {
    match dsp::two_means(values, cfg.centroid_epsilon) {
        Some(tm) if tm.minor_fraction() >= MIN_BIMODAL_FRACTION => tm.separation(),
        _ => 0.0,
    }
}

/// Coarse symbol length for the phase-hop feature
///
/// Median run length of the binarized phase-rotation stream; a rough
/// but deterministic stand-in for the symbol duration, adequate for
/// sampling phase hops one symbol apart.
fn phase_stride(phase: &[f32], plateaus: &[Plateau]) -> usize {
    let mut runs: Vec<f32> = Vec::new();
    for p in plateaus {
        let end = p.end.min(phase.len());
        if end <= p.start {
            continue;
        }
        let reference = phase[crate::demod::reference_index(p.start, end)];
        let rotation: Vec<f32> = (p.start..end)
            .map(|i| dsp::wrap_angle(phase[i] - reference).abs())
            .collect();
        let split = dsp::mean(&rotation);
        let mut run = 0usize;
        let mut prev = false;
        for (i, &r) in rotation.iter().enumerate() {
            let level = r > split;
            if i == 0 || level == prev {
                run += 1;
            } else {
                runs.push(run as f32);
                run = 1;
            }
            prev = level;
        }
        runs.push(run as f32);
    }
    (dsp::median(&runs) as usize).clamp(2, 1024)
}

/// Absolute wrapped phase differences one stride apart
fn symbol_phase_hops(
    magnitude: &[f32],
    phase: &[f32],
    plateaus: &[Plateau],
    noise: f32,
    stride: usize,
) -> Vec<f32> {
    let mut out = Vec::new();
    for p in plateaus {
        let end = p.end.min(phase.len());
        let mut i = p.start;
        while i + stride < end {
            if magnitude[i] >= noise && magnitude[i + stride] >= noise {
                out.push(dsp::wrap_angle(phase[i + stride] - phase[i]).abs());
            }
            i += stride;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth;

    fn segmented(iq: &[num_complex::Complex<f32>], cfg: &AnalysisConfig) -> (Vec<f32>, Vec<f32>, Vec<f32>, Vec<Plateau>, f32) {
        let m = dsp::magnitude(iq);
        let ph = dsp::phase(iq);
        let f = dsp::instantaneous_frequency(&ph);
        let noise = crate::estimator::noise::estimate_noise(&m, cfg);
        let plateaus = crate::estimator::segment::find_plateaus(&m, noise, cfg.min_pause, cfg);
        (m, ph, f, plateaus, noise)
    }

    fn classify_capture(iq: &[num_complex::Complex<f32>]) -> Modulation {
        let cfg = AnalysisConfig::default();
        let (m, ph, f, plateaus, noise) = segmented(iq, &cfg);
        assert!(!plateaus.is_empty(), "fixture must segment");
        classify(&m, &ph, &f, &plateaus, noise, &cfg)
    }

    #[test]
    fn test_detects_ask() {
        let bits = synth::bits_from_hex("b25b6db6c80");
        let mut iq = synth::silence(3000, 0.01, 7);
        iq.extend(synth::modulate_ask(&bits, 100, 1.0, 0.1, 0.02, 0.01, 11));
        iq.extend(synth::silence(3000, 0.01, 13));
        assert_eq!(classify_capture(&iq), Modulation::Ask);
    }

    #[test]
    fn test_detects_fsk() {
        let bits = synth::bits_from_hex("aaaaaaaac626c626f4dc");
        let mut iq = synth::silence(3000, 0.02, 5);
        iq.extend(synth::modulate_fsk(&bits, 100, 0.3, -0.3, 0.05, 17));
        iq.extend(synth::silence(3000, 0.02, 19));
        assert_eq!(classify_capture(&iq), Modulation::Fsk);
    }

    #[test]
    fn test_detects_psk() {
        let bits = synth::bits_from_hex("55555555d2a4b1c3");
        let mut iq = synth::silence(3000, 0.02, 23);
        iq.extend(synth::modulate_psk(&bits, 100, 0.05, 29));
        iq.extend(synth::silence(3000, 0.02, 31));
        assert_eq!(classify_capture(&iq), Modulation::Psk);
    }
}
