//! IQ sample containers

use num_complex::Complex;

/// Raw input samples for the analyzer
///
/// Captures arrive in one of three shapes. All three normalize to a
/// single complex buffer at the pipeline boundary, so the detection
/// stages only ever see one representation.
#[derive(Clone, Debug, PartialEq)]
pub enum IqInput {
    /// Complex baseband samples.
    Complex(Vec<Complex<f32>>),

    /// Interleaved real values, `I,Q,I,Q,…` (length `2N`).
    ///
    /// This is the layout of raw `.complex` files and of most SDR
    /// streaming APIs. A trailing unpaired value is dropped.
    InterleavedReal(Vec<f32>),

    /// An already-demodulated real-valued stream.
    ///
    /// The pipeline skips demodulation-stream synthesis and slices
    /// this buffer directly, assuming ASK unless the caller overrides
    /// the modulation.
    ScalarReal(Vec<f32>),
}

impl IqInput {
    /// Wrap complex baseband samples
    pub fn from_complex(samples: Vec<Complex<f32>>) -> Self {
        IqInput::Complex(samples)
    }

    /// Wrap an interleaved `I,Q,I,Q,…` buffer
    pub fn from_interleaved(samples: Vec<f32>) -> Self {
        IqInput::InterleavedReal(samples)
    }

    /// Wrap a real-valued, already-demodulated stream
    pub fn from_scalar(samples: Vec<f32>) -> Self {
        IqInput::ScalarReal(samples)
    }

    /// Number of time steps in the buffer
    pub fn len(&self) -> usize {
        match self {
            IqInput::Complex(v) => v.len(),
            IqInput::InterleavedReal(v) => v.len() / 2,
            IqInput::ScalarReal(v) => v.len(),
        }
    }

    /// True if the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize to complex samples, or return the scalar stream
    ///
    /// Real-only buffers are not promoted to complex: they carry no
    /// phase and take a shortcut through the pipeline.
    pub(crate) fn normalize(self) -> Normalized {
        match self {
            IqInput::Complex(v) => Normalized::Complex(v),
            IqInput::InterleavedReal(v) => Normalized::Complex(
                v.chunks_exact(2)
                    .map(|iq| Complex::new(iq[0], iq[1]))
                    .collect(),
            ),
            IqInput::ScalarReal(v) => Normalized::Scalar(v),
        }
    }
}

/// Internal normalized form of [`IqInput`]
#[derive(Clone, Debug)]
pub(crate) enum Normalized {
    Complex(Vec<Complex<f32>>),
    Scalar(Vec<f32>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleaved_normalization() {
        let input = IqInput::from_interleaved(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(input.len(), 2);
        match input.normalize() {
            Normalized::Complex(v) => {
                assert_eq!(v, vec![Complex::new(1.0, 2.0), Complex::new(3.0, 4.0)]);
            }
            Normalized::Scalar(_) => panic!("expected complex"),
        }
    }

    #[test]
    fn test_scalar_passthrough() {
        let input = IqInput::from_scalar(vec![0.5, -0.5]);
        assert_eq!(input.len(), 2);
        match input.normalize() {
            Normalized::Scalar(v) => assert_eq!(v, vec![0.5, -0.5]),
            Normalized::Complex(_) => panic!("expected scalar"),
        }
    }
}
