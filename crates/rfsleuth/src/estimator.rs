//! Signal parameter estimation
//!
//! Recovers the physical-layer parameters of a capture without any
//! prior knowledge: noise floor, burst boundaries, modulation class,
//! symbol duration, decision threshold, and timing tolerance. The
//! stages run in a fixed order and each consumes the output of the
//! previous one; [`crate::Analyzer`] drives them.

pub(crate) mod center;
pub(crate) mod modulation;
pub(crate) mod noise;
pub(crate) mod segment;
pub(crate) mod symbol_rate;

use strum::{Display, EnumString};

/// Modulation class of a capture
///
/// Parses from and displays as the conventional uppercase
/// abbreviation:
///
/// ```
/// use rfsleuth::Modulation;
/// use std::str::FromStr;
///
/// assert_eq!(Modulation::from_str("FSK").unwrap(), Modulation::Fsk);
/// assert_eq!(Modulation::Ask.to_string(), "ASK");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Modulation {
    /// Amplitude shift keying, including on-off keying
    #[strum(serialize = "ASK")]
    #[cfg_attr(feature = "serde", serde(rename = "ASK"))]
    Ask,

    /// Frequency shift keying
    #[strum(serialize = "FSK")]
    #[cfg_attr(feature = "serde", serde(rename = "FSK"))]
    Fsk,

    /// Phase shift keying
    #[strum(serialize = "PSK")]
    #[cfg_attr(feature = "serde", serde(rename = "PSK"))]
    Psk,
}

/// Recovered physical-layer parameters
///
/// Produced by the estimator, or assembled from caller overrides
/// where supplied. `center` always lies between the two level
/// clusters of the demodulated stream, and `tolerance` is strictly
/// less than half a symbol.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SignalParameters {
    /// Modulation class
    #[cfg_attr(feature = "serde", serde(rename = "modulation_type"))]
    pub modulation: Modulation,

    /// Symbol duration in samples (≥ 2)
    pub bit_length: u32,

    /// Decision threshold separating the two binary levels
    pub center: f32,

    /// Noise floor of the magnitude envelope
    pub noise: f32,

    /// Symbol-boundary jitter absorbed by the slicer, in samples
    pub tolerance: u32,
}

/// Timing tolerance for a symbol length
///
/// A twentieth of a symbol, at least one sample, and always strictly
/// less than half a symbol. Degenerates to zero for symbols too short
/// to absorb any jitter.
pub(crate) fn tolerance_for(bit_length: u32, fraction: f32) -> u32 {
    let t = ((bit_length as f32 * fraction).round() as u32).max(1);
    if 2 * t >= bit_length {
        (bit_length / 2).saturating_sub(1)
    } else {
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_modulation_strings() {
        for (s, m) in [
            ("ASK", Modulation::Ask),
            ("FSK", Modulation::Fsk),
            ("PSK", Modulation::Psk),
        ] {
            assert_eq!(Modulation::from_str(s).unwrap(), m);
            assert_eq!(m.to_string(), s);
        }
        assert!(Modulation::from_str("QAM").is_err());
    }

    #[test]
    fn test_tolerance_bounds() {
        assert_eq!(tolerance_for(100, 0.05), 5);
        assert_eq!(tolerance_for(20, 0.05), 1);
        // too short for any slack
        assert_eq!(tolerance_for(2, 0.05), 0);
        assert_eq!(tolerance_for(3, 0.05), 1);
        for bl in 2..200 {
            let t = tolerance_for(bl, 0.05);
            assert!((t as f32) < bl as f32 / 2.0, "bl={bl} t={t}");
        }
    }
}
