//! The analysis pipeline

#[cfg(not(test))]
use log::{debug, info};
#[cfg(test)]
use std::{println as debug, println as info};

use num_complex::Complex;

use crate::awre::{self, Field};
use crate::config::AnalysisConfig;
use crate::decoder::IqDecoder;
use crate::demod;
use crate::dsp;
use crate::error::AnalysisError;
use crate::estimator::segment::Plateau;
use crate::estimator::{self, Modulation, SignalParameters};
use crate::iq::{IqInput, Normalized};
use crate::message::Message;

/// The complete outcome of one analysis run
///
/// When the estimator cannot recover usable parameters,
/// `signal_parameters` is `None` and the message and field lists are
/// empty; this is a normal outcome for noise-only captures, not an
/// error. Nothing in the result is mutated after the run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AnalysisResult {
    /// Recovered physical-layer parameters, if any
    pub signal_parameters: Option<SignalParameters>,

    /// Demodulated messages in capture order
    pub messages: Vec<Message>,

    /// Inferred protocol fields, ascending within each message type
    pub protocol_fields: Vec<Field>,

    /// Convenience count of `messages`
    pub num_messages: usize,
}

impl AnalysisResult {
    fn empty() -> Self {
        Self {
            signal_parameters: None,
            messages: Vec::new(),
            protocol_fields: Vec::new(),
            num_messages: 0,
        }
    }
}

/// Configurable analysis pipeline
///
/// The plain [`analyze_iq`] and [`analyze_from_source`] functions
/// cover the common cases; build an `Analyzer` to adjust the
/// configuration or to pin parameters the caller already knows:
///
/// ```
/// use rfsleuth::{Analyzer, IqInput, Modulation};
///
/// let mut analyzer = Analyzer::new();
/// analyzer
///     .with_modulation(Modulation::Fsk)
///     .with_noise(0.01);
/// let result = analyzer.analyze(IqInput::from_interleaved(vec![0.0; 64]));
/// assert!(result.unwrap().signal_parameters.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Analyzer {
    config: AnalysisConfig,
    noise_override: Option<f32>,
    modulation_override: Option<Modulation>,
    sample_rate_hz: Option<f64>,
}

impl Analyzer {
    /// New analyzer with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// New analyzer with an explicit configuration
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Pin the noise floor instead of estimating it
    pub fn with_noise(&mut self, noise: f32) -> &mut Self {
        self.noise_override = Some(noise);
        self
    }

    /// Pin the modulation instead of classifying it
    pub fn with_modulation(&mut self, modulation: Modulation) -> &mut Self {
        self.modulation_override = Some(modulation);
        self
    }

    /// Record the capture sample rate, in Hz
    ///
    /// Detection is sample-rate agnostic; the rate only appears in
    /// log output.
    pub fn with_sample_rate(&mut self, sample_rate_hz: f64) -> &mut Self {
        self.sample_rate_hz = Some(sample_rate_hz);
        self
    }

    /// Analyze an in-memory capture
    ///
    /// Returns `Err` only for an illegal override; captures without a
    /// recoverable signal produce an empty result.
    pub fn analyze(&self, input: IqInput) -> Result<AnalysisResult, AnalysisError> {
        if let Some(noise) = self.noise_override {
            if !noise.is_finite() || noise <= 0.0 {
                return Err(AnalysisError::InvalidOverride(format!(
                    "noise floor must be finite and positive, got {noise}"
                )));
            }
        }

        if let Some(rate) = self.sample_rate_hz {
            debug!(
                "analyzing {} samples at {:.0} Hz ({:.3} s)",
                input.len(),
                rate,
                input.len() as f64 / rate
            );
        }

        if input.len() < self.config.min_input_samples {
            info!("capture too short to analyze ({} samples)", input.len());
            return Ok(AnalysisResult::empty());
        }

        match input.normalize() {
            Normalized::Complex(iq) => Ok(self.analyze_complex(&iq)),
            Normalized::Scalar(stream) => Ok(self.analyze_scalar(&stream)),
        }
    }

    /// Analyze a capture supplied by a pluggable decoder
    ///
    /// Decoder failures propagate; no partial analysis is attempted.
    pub fn analyze_from_source(
        &self,
        decoder: &dyn IqDecoder,
        source: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let recording = decoder.open(source)?;
        let mut analyzer = self.clone();
        if analyzer.sample_rate_hz.is_none() {
            analyzer.sample_rate_hz = Some(recording.sample_rate_hz);
        }
        analyzer.analyze(recording.samples)
    }

    fn analyze_complex(&self, iq: &[Complex<f32>]) -> AnalysisResult {
        let magnitude = dsp::magnitude(iq);
        let Some((noise, plateaus)) = self.front_end(&magnitude) else {
            return AnalysisResult::empty();
        };

        // phase-derived streams are materialized only when the
        // modulation (or its classification) needs them
        let (phase, frequency) = match self.modulation_override {
            Some(Modulation::Ask) => (Vec::new(), Vec::new()),
            Some(Modulation::Psk) => (dsp::phase(iq), Vec::new()),
            Some(Modulation::Fsk) | None => {
                let phase = dsp::phase(iq);
                let frequency = dsp::instantaneous_frequency(&phase);
                (phase, frequency)
            }
        };

        let modulation = self.modulation_override.unwrap_or_else(|| {
            estimator::modulation::classify(
                &magnitude,
                &phase,
                &frequency,
                &plateaus,
                noise,
                &self.config,
            )
        });
        debug!("modulation: {modulation}");

        self.back_end(&magnitude, noise, plateaus, modulation, |plats| {
            demod::build_stream(modulation, &magnitude, &phase, &frequency, plats)
        })
    }

    /// Real-only input: the buffer is already a demodulation stream
    fn analyze_scalar(&self, stream: &[f32]) -> AnalysisResult {
        let magnitude: Vec<f32> = stream.iter().map(|v| v.abs()).collect();
        let Some((noise, plateaus)) = self.front_end(&magnitude) else {
            return AnalysisResult::empty();
        };
        let modulation = self.modulation_override.unwrap_or(Modulation::Ask);
        self.back_end(&magnitude, noise, plateaus, modulation, |_| stream.to_vec())
    }

    /// Noise floor and first-pass segmentation
    fn front_end(&self, magnitude: &[f32]) -> Option<(f32, Vec<Plateau>)> {
        let cfg = &self.config;
        let noise = self
            .noise_override
            .unwrap_or_else(|| estimator::noise::estimate_noise(magnitude, cfg));
        let peak = magnitude.iter().copied().fold(0.0f32, f32::max);
        if noise > 0.95 * peak {
            info!("noise floor {noise:.4} dominates peak {peak:.4}; no signal");
            return None;
        }

        let plateaus = estimator::segment::find_plateaus(magnitude, noise, cfg.min_pause, cfg);
        if plateaus.is_empty() {
            info!("no bursts above the noise floor");
            return None;
        }
        debug!(
            "first pass: {} burst(s) spanning {} samples, noise {:.4}",
            plateaus.len(),
            plateaus.iter().map(|p| p.len()).sum::<usize>(),
            noise
        );
        Some((noise, plateaus))
    }

    /// Symbol parameters, demodulation, and format inference
    fn back_end<F>(
        &self,
        magnitude: &[f32],
        noise: f32,
        plateaus: Vec<Plateau>,
        modulation: Modulation,
        stream_for: F,
    ) -> AnalysisResult
    where
        F: Fn(&[Plateau]) -> Vec<f32>,
    {
        let cfg = &self.config;
        let stream = stream_for(&plateaus);

        let Some(bit_length) = estimator::symbol_rate::estimate_bit_length(&stream, &plateaus)
        else {
            info!("symbol rate undetectable");
            return AnalysisResult::empty();
        };

        let Some(center) = estimator::center::estimate_center(&stream, &plateaus, cfg) else {
            info!("decision threshold undetectable");
            return AnalysisResult::empty();
        };

        let params = SignalParameters {
            modulation,
            bit_length,
            center,
            noise,
            tolerance: estimator::tolerance_for(bit_length, cfg.tolerance_fraction),
        };
        info!(
            "parameters: {} @ {} samples/symbol, center {:.4}, tolerance {}",
            params.modulation, params.bit_length, params.center, params.tolerance
        );

        // second pass: with the symbol length known, the inter-burst
        // silence requirement becomes a symbol count
        let min_pause = cfg.pause_symbols * bit_length as usize;
        let plateaus = estimator::segment::find_plateaus(magnitude, noise, min_pause, cfg);
        let stream = stream_for(&plateaus);

        let messages = demod::extract_messages(&stream, &plateaus, &params, cfg);
        info!("demodulated {} message(s)", messages.len());

        let protocol_fields = awre::infer_fields(&messages, cfg);
        AnalysisResult {
            signal_parameters: Some(params),
            num_messages: messages.len(),
            messages,
            protocol_fields,
        }
    }
}

/// Analyze an in-memory IQ buffer
///
/// Optional `noise` and `modulation` overrides replace the matching
/// estimation stages. See [`Analyzer`] for more control.
pub fn analyze_iq(
    input: IqInput,
    noise: Option<f32>,
    modulation: Option<Modulation>,
) -> Result<AnalysisResult, AnalysisError> {
    let mut analyzer = Analyzer::new();
    if let Some(n) = noise {
        analyzer.with_noise(n);
    }
    if let Some(m) = modulation {
        analyzer.with_modulation(m);
    }
    analyzer.analyze(input)
}

/// Analyze a capture acquired through a pluggable decoder
pub fn analyze_from_source(
    decoder: &dyn IqDecoder,
    source: &str,
    sample_rate_hz: f64,
) -> Result<AnalysisResult, AnalysisError> {
    let mut analyzer = Analyzer::new();
    analyzer.with_sample_rate(sample_rate_hz);
    analyzer.analyze_from_source(decoder, source)
}
