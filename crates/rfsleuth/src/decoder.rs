//! Pluggable IQ source decoders
//!
//! Container formats are not part of the core pipeline. Anything that
//! can turn a source designator (file path, URI, buffer handle) into
//! samples plugs in through [`IqDecoder`]; the `sleuthdec` frontend
//! ships implementations for the common raw sample formats.

use thiserror::Error;

use crate::iq::IqInput;

/// A decoded recording, ready for analysis
#[derive(Clone, Debug)]
pub struct IqRecording {
    /// The samples, complex or real-valued.
    pub samples: IqInput,

    /// Sample rate of the recording in Hz.
    ///
    /// Detection is sample-rate agnostic; the rate is only used to
    /// report timing in physical units.
    pub sample_rate_hz: f64,
}

/// Error opening a signal source
#[derive(Error, Debug)]
pub enum DecoderError {
    /// The source designator does not name a known format
    #[error("unknown signal format: {0}")]
    UnknownFormat(String),

    /// The source was recognized but its header is damaged
    #[error("corrupt header: {0}")]
    CorruptHeader(String),

    /// A recognized container uses an unsupported variant
    #[error("unsupported variant: {0}")]
    UnsupportedVariant(String),

    /// Reading the source failed
    #[error("i/o error reading signal source")]
    Io(#[from] std::io::Error),
}

/// Turns a source designator into IQ samples
///
/// Implementations own all knowledge of container formats and sample
/// encodings. A decoder either produces a complete [`IqRecording`] or
/// fails; the pipeline never attempts partial analysis of a source
/// that did not decode.
pub trait IqDecoder {
    /// Open and fully decode `source`
    fn open(&self, source: &str) -> Result<IqRecording, DecoderError>;
}
