//! Noise floor estimation

use crate::config::AnalysisConfig;
use crate::dsp;

/// Estimate the noise floor of a magnitude envelope
///
/// The envelope is cut into consecutive windows and the window at a
/// low quantile of the window means is taken as representative noise;
/// the floor is that window's peak, so it sits above essentially all
/// noise samples rather than in the middle of them. Selecting by
/// window mean is robust both to long active regions dominating the
/// capture and to sparse outliers, and needs no prior segmentation.
/// The result is clamped away from zero so downstream ratios stay
/// finite.
pub(crate) fn estimate_noise(magnitude: &[f32], cfg: &AnalysisConfig) -> f32 {
    let mut windows: Vec<(f32, f32)> = magnitude
        .chunks_exact(cfg.noise_window)
        .map(|w| {
            let peak = w.iter().copied().fold(0.0f32, f32::max);
            (dsp::mean(w), peak)
        })
        .collect();

    let floor = if windows.is_empty() {
        // capture shorter than one window
        magnitude.iter().copied().fold(0.0f32, f32::max)
    } else {
        windows.sort_by(|a, b| a.0.total_cmp(&b.0));
        let idx = ((windows.len() as f32 * cfg.noise_quantile) as usize).min(windows.len() - 1);
        windows[idx].1
    };

    floor.max(cfg.noise_floor_min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_ignores_bursts() {
        let cfg = AnalysisConfig::default();
        // 80% quiet at ~0.01, 20% burst at 1.0
        let mut m = vec![0.01f32; 4096];
        m.extend(vec![1.0f32; 1024]);
        let noise = estimate_noise(&m, &cfg);
        assert!((noise - 0.01).abs() < 1e-3, "noise={noise}");
    }

    #[test]
    fn test_floor_covers_noise_peaks() {
        let cfg = AnalysisConfig::default();
        // sawtooth "noise" between 0.0 and 0.02: the floor must sit
        // at the top of the band, not at its mean
        let m: Vec<f32> = (0..4096).map(|i| (i % 8) as f32 * 0.02 / 7.0).collect();
        let noise = estimate_noise(&m, &cfg);
        assert!((noise - 0.02).abs() < 1e-6, "noise={noise}");
    }

    #[test]
    fn test_clamps_to_floor() {
        let cfg = AnalysisConfig::default();
        let noise = estimate_noise(&vec![0.0f32; 1024], &cfg);
        assert_eq!(noise, cfg.noise_floor_min);
    }

    #[test]
    fn test_short_capture_uses_peak() {
        let cfg = AnalysisConfig::default();
        let noise = estimate_noise(&[0.1, 0.5, 0.2], &cfg);
        assert!((noise - 0.5).abs() < 1e-6);
    }
}
