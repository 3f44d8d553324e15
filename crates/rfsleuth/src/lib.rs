//! # rfsleuth: automated radio signal reverse engineering
//!
//! This crate turns a recorded IQ capture of an unknown digital
//! transmission into a structured description of what was sent. It
//! chains three subsystems into a single headless pipeline:
//!
//! 1. **Parameter estimation** — noise floor, burst boundaries,
//!    modulation class (ASK/OOK, FSK, or PSK), symbol duration, and
//!    the binary decision threshold are recovered directly from the
//!    samples. No manual tuning is required.
//! 2. **Demodulation** — each burst is sliced into a message
//!    bitstring using the estimated parameters, together with the
//!    silence that trails it.
//! 3. **Format inference** — given two or more messages, a field
//!    layout (preamble, sync word, length, address, sequence number,
//!    payload, checksum) is induced by statistical comparison of the
//!    message set.
//!
//! ## Example
//!
//! ```no_run
//! use rfsleuth::{Analyzer, IqInput};
//!
//! // interleaved I/Q samples, e.g. read from a ".complex" file
//! let samples: Vec<f32> = std::fs::read("capture.complex")
//!     .unwrap()
//!     .chunks_exact(4)
//!     .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
//!     .collect();
//!
//! let result = Analyzer::new()
//!     .analyze(IqInput::from_interleaved(samples))
//!     .unwrap();
//!
//! if let Some(params) = &result.signal_parameters {
//!     println!("modulation: {}", params.modulation);
//!     println!("samples per symbol: {}", params.bit_length);
//! }
//! for msg in &result.messages {
//!     println!("{}  (pause {})", msg.hex(), msg.pause());
//! }
//! ```
//!
//! The analysis is synchronous and single-threaded: one call, one
//! [`AnalysisResult`]. Captures that contain no decodable signal
//! produce a result with `signal_parameters == None` and empty
//! message/field lists rather than an error; only an invalid caller
//! override or a failing signal-source decoder raises
//! [`AnalysisError`].
//!
//! ## Input formats
//!
//! [`IqInput`] accepts complex samples, an interleaved real buffer
//! (`I,Q,I,Q,…`), or an already-demodulated real-valued stream.
//! Container formats are out of scope here: implement [`IqDecoder`]
//! to plug in file readers (the `sleuthdec` command-line frontend
//! ships decoders for the common raw formats).
//!
//! ## Crate features
//!
//! * `serde`: derive `Serialize` for [`AnalysisResult`] and its
//!   contents, using the stable wire names (`modulation_type`,
//!   `bits`, `hex`, …). Off by default.

mod analysis;
mod awre;
mod config;
mod demod;
mod dsp;
mod error;
mod estimator;
mod iq;
mod message;
#[cfg(test)]
pub(crate) mod synth;

pub mod decoder;

pub use analysis::{analyze_from_source, analyze_iq, AnalysisResult, Analyzer};
pub use awre::checksum::CrcAlgorithm;
pub use awre::{Field, FieldLabel};
pub use config::AnalysisConfig;
pub use decoder::{DecoderError, IqDecoder, IqRecording};
pub use error::AnalysisError;
pub use estimator::{Modulation, SignalParameters};
pub use iq::IqInput;
pub use message::Message;
