//! Analysis errors

use thiserror::Error;

use crate::decoder::DecoderError;

/// Error running the analysis pipeline
///
/// Most detection failures are *not* errors: a capture without a
/// recoverable signal yields an [`AnalysisResult`] with empty
/// `signal_parameters`. Only the two conditions below abort a call.
///
/// [`AnalysisResult`]: crate::AnalysisResult
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A caller-supplied override is not a legal value
    #[error("invalid argument: {0}")]
    InvalidOverride(String),

    /// The pluggable IQ decoder failed to open the source
    #[error("signal source decoder failed")]
    Decoder(#[from] DecoderError),
}
