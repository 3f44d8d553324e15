//! Pipeline configuration

use crate::awre::checksum::CrcAlgorithm;

/// Tuning knobs for the analysis pipeline
///
/// Every stage of the pipeline reads its constants from this struct,
/// which is threaded through as an immutable argument; there is no
/// global state. The defaults are appropriate for typical short-range
/// device captures (remote controls, sensors, pagers) and rarely need
/// changing. Construct with [`Default`] and adjust individual fields:
///
/// ```
/// use rfsleuth::AnalysisConfig;
///
/// let cfg = AnalysisConfig {
///     noise_quantile: 0.10,
///     ..AnalysisConfig::default()
/// };
/// assert!(cfg.min_plateau >= 2);
/// ```
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    /// Window length, in samples, for noise floor estimation.
    pub noise_window: usize,

    /// Quantile of window means taken as the noise floor (0.0..1.0).
    pub noise_quantile: f32,

    /// Lower clamp for the noise floor. Guards against a zero
    /// threshold on synthetic or DC-free captures.
    pub noise_floor_min: f32,

    /// Moving-average length applied to the envelope before
    /// segmentation. Smoothing keeps single noise spikes from
    /// opening or splitting bursts.
    pub envelope_window: usize,

    /// Rising-edge hysteresis: a burst starts when the envelope
    /// exceeds `noise * (1 + hysteresis_rise)`.
    pub hysteresis_rise: f32,

    /// Falling-edge hysteresis: a burst ends when the envelope stays
    /// below `noise * (1 - hysteresis_fall)` for a full pause.
    pub hysteresis_fall: f32,

    /// Minimum silence, in samples, that separates two bursts during
    /// the first segmentation pass (before the symbol length is
    /// known).
    pub min_pause: usize,

    /// Once the symbol length is known, the minimum inter-burst
    /// silence becomes `pause_symbols * bit_length` samples.
    pub pause_symbols: usize,

    /// Bursts shorter than this many samples are glitches and are
    /// dropped.
    pub min_plateau: usize,

    /// Captures with fewer samples than this produce an empty result.
    pub min_input_samples: usize,

    /// Two-means clustering: iteration stops when both centroids move
    /// less than this.
    pub centroid_epsilon: f32,

    /// Two-means clustering: each cluster must hold at least this
    /// fraction of the samples, or center estimation fails.
    pub cluster_min_fraction: f32,

    /// Symbol-boundary slack as a fraction of the symbol length.
    pub tolerance_fraction: f32,

    /// A burst is dropped when more than this fraction of its symbols
    /// are inconsistent with the estimated symbol length.
    pub max_ambiguous_fraction: f32,

    /// Minimum preamble length, in bits, for the format finder.
    pub min_preamble_bits: usize,

    /// Minimum sync word length, in bits, for the format finder.
    pub min_sync_bits: usize,

    /// How far past the sync word, in bits, the length-field scan
    /// extends.
    pub length_scan_bits: usize,

    /// Checksum algorithms the format finder tries, in order, before
    /// falling back to a plain byte sum.
    pub checksum_catalogue: Vec<CrcAlgorithm>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            noise_window: 64,
            noise_quantile: 0.05,
            noise_floor_min: 1e-6,
            envelope_window: 16,
            hysteresis_rise: 0.1,
            hysteresis_fall: 0.05,
            min_pause: 1000,
            pause_symbols: 8,
            min_plateau: 10,
            min_input_samples: 16,
            centroid_epsilon: 1e-6,
            cluster_min_fraction: 0.05,
            tolerance_fraction: 0.05,
            max_ambiguous_fraction: 0.25,
            min_preamble_bits: 8,
            min_sync_bits: 8,
            length_scan_bits: 64,
            checksum_catalogue: CrcAlgorithm::default_catalogue(),
        }
    }
}
