//! Raw IQ file decoders
//!
//! The frameless formats every SDR toolchain emits: interleaved I/Q
//! pairs with no container header, distinguished only by file
//! extension. Anything with an actual header belongs in its own
//! decoder.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;

use rfsleuth::{DecoderError, IqDecoder, IqInput, IqRecording};

/// Decoder for raw interleaved sample files
///
/// | extension          | sample encoding                      |
/// |--------------------|--------------------------------------|
/// | `.complex` `.cfile`| float32 little endian                |
/// | `.cs8`             | signed 8-bit                         |
/// | `.cu8`             | unsigned 8-bit, zero at 127.5        |
/// | `.cs16`            | signed 16-bit little endian          |
pub struct RawIqDecoder {
    sample_rate_hz: f64,
}

impl RawIqDecoder {
    pub fn new(sample_rate_hz: f64) -> Self {
        Self { sample_rate_hz }
    }
}

impl IqDecoder for RawIqDecoder {
    fn open(&self, source: &str) -> Result<IqRecording, DecoderError> {
        let extension = Path::new(source)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| DecoderError::UnknownFormat(source.to_string()))?;

        let samples = match extension.as_str() {
            "complex" | "cfile" => read_f32(&mut open_file(source)?)?,
            "cs8" => read_i8(&mut open_file(source)?)?,
            "cu8" => read_u8(&mut open_file(source)?)?,
            "cs16" => read_i16(&mut open_file(source)?)?,
            _ => return Err(DecoderError::UnknownFormat(extension)),
        };

        if samples.len() % 2 != 0 {
            return Err(DecoderError::CorruptHeader(format!(
                "{source}: odd number of interleaved values"
            )));
        }
        debug!("decoded {} IQ samples from {source}", samples.len() / 2);

        Ok(IqRecording {
            samples: IqInput::from_interleaved(samples),
            sample_rate_hz: self.sample_rate_hz,
        })
    }
}

fn open_file(source: &str) -> Result<BufReader<File>, DecoderError> {
    Ok(BufReader::new(File::open(source)?))
}

fn read_f32<R: Read>(reader: &mut R) -> Result<Vec<f32>, DecoderError> {
    let mut out = Vec::new();
    loop {
        match reader.read_f32::<LittleEndian>() {
            Ok(v) => out.push(v),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(out)
}

fn read_i8<R: Read>(reader: &mut R) -> Result<Vec<f32>, DecoderError> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw).map_err(DecoderError::from)?;
    Ok(raw.iter().map(|&b| b as i8 as f32 / 128.0).collect())
}

fn read_u8<R: Read>(reader: &mut R) -> Result<Vec<f32>, DecoderError> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw).map_err(DecoderError::from)?;
    Ok(raw.iter().map(|&b| (b as f32 - 127.5) / 127.5).collect())
}

fn read_i16<R: Read>(reader: &mut R) -> Result<Vec<f32>, DecoderError> {
    let mut out = Vec::new();
    loop {
        match reader.read_i16::<LittleEndian>() {
            Ok(v) => out.push(v as f32 / 32768.0),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, contents).expect("write temp file");
        path
    }

    #[test]
    fn test_unknown_extension() {
        let decoder = RawIqDecoder::new(1e6);
        match decoder.open("capture.wav") {
            Err(DecoderError::UnknownFormat(_)) => {}
            other => panic!("expected UnknownFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_cs8_scaling() {
        let path = temp_file("sleuthdec_test.cs8", &[0x7f, 0x80, 0x00, 0x40]);
        let decoder = RawIqDecoder::new(2e6);
        let recording = decoder.open(path.to_str().unwrap()).expect("decode");
        assert_eq!(recording.sample_rate_hz, 2e6);
        match recording.samples {
            IqInput::InterleavedReal(v) => {
                assert_eq!(v.len(), 4);
                assert!((v[0] - 127.0 / 128.0).abs() < 1e-6);
                assert!((v[1] + 1.0).abs() < 1e-6);
                assert_eq!(v[2], 0.0);
                assert!((v[3] - 0.5).abs() < 1e-6);
            }
            other => panic!("expected interleaved samples, got {other:?}"),
        }
    }

    #[test]
    fn test_odd_sample_count_rejected() {
        let path = temp_file("sleuthdec_test_odd.cs8", &[1, 2, 3]);
        let decoder = RawIqDecoder::new(1e6);
        match decoder.open(path.to_str().unwrap()) {
            Err(DecoderError::CorruptHeader(_)) => {}
            other => panic!("expected CorruptHeader, got {other:?}"),
        }
    }

    #[test]
    fn test_f32_roundtrip() {
        let mut bytes = Vec::new();
        for v in [0.25f32, -0.5, 1.0, 0.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        let path = temp_file("sleuthdec_test.complex", &bytes);
        let decoder = RawIqDecoder::new(1e6);
        let recording = decoder.open(path.to_str().unwrap()).expect("decode");
        match recording.samples {
            IqInput::InterleavedReal(v) => assert_eq!(v, vec![0.25, -0.5, 1.0, 0.0]),
            other => panic!("expected interleaved samples, got {other:?}"),
        }
    }
}
