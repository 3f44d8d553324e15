//! Length field detection
//!
//! A length field encodes how much payload follows it. Detection
//! scans byte-aligned windows after the sync word, interprets each as
//! an unsigned value in both byte orders, and accepts a window whose
//! values relate affinely to the observed payload lengths of every
//! message, counted either in bits or in bytes.
//!
//! When all messages happen to have the same payload length the
//! affine fit is degenerate; in that case the window must count the
//! payload exactly (zero intercept) and be non-zero, which keeps
//! arbitrary constant bytes from qualifying.

use crate::message::{read_be, read_le, Message};

/// Nibble-granular window widths, narrowest first
const WIDTHS: [usize; 4] = [4, 8, 12, 16];

/// A successful length-field fit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LengthFit {
    /// Bit range of the length field
    pub start: usize,
    pub end: usize,
    /// Where the payload the field counts begins
    ///
    /// Everything between the field and this offset is a plausible
    /// address region.
    pub payload_start: usize,
}

/// Search for a length field
///
/// `scan_base` is the sync end (or preamble end, or 0) and bounds the
/// search together with `scan_bits`. Ties resolve to the earliest
/// offset, then the narrowest width, then big-endian order, then the
/// earliest payload origin.
pub(crate) fn find(
    messages: &[&Message],
    common_len: usize,
    scan_base: usize,
    scan_bits: usize,
) -> Option<LengthFit> {
    let first_byte = scan_base.div_ceil(8) * 8;
    let limit = (scan_base + scan_bits).min(common_len);

    for off in (first_byte..limit).step_by(8) {
        for w in WIDTHS {
            if off + w > common_len {
                continue;
            }
            let orders: &[bool] = if w == 16 { &[false, true] } else { &[false] };
            for &little_endian in orders {
                let values: Vec<u64> = messages
                    .iter()
                    .filter_map(|m| {
                        if little_endian {
                            read_le(m.bits(), off, w)
                        } else {
                            read_be(m.bits(), off, w)
                        }
                    })
                    .collect();
                if values.len() != messages.len() {
                    continue;
                }

                let origin_limit = (off + w + scan_bits).min(common_len);
                let mut s = (off + w).div_ceil(8) * 8;
                while s <= origin_limit {
                    if let Some(fit) = try_origin(messages, &values, off, w, s) {
                        return Some(fit);
                    }
                    s += 8;
                }
            }
        }
    }
    None
}

/// Check one payload origin against the window values
fn try_origin(
    messages: &[&Message],
    values: &[u64],
    off: usize,
    w: usize,
    origin: usize,
) -> Option<LengthFit> {
    if messages.iter().any(|m| m.len() < origin) {
        return None;
    }
    let payload_bits: Vec<u64> = messages.iter().map(|m| (m.len() - origin) as u64).collect();

    // bytes first: the common encoding
    for in_bytes in [true, false] {
        let units: Vec<u64> = if in_bytes {
            if payload_bits.iter().any(|p| p % 8 != 0) {
                continue;
            }
            payload_bits.iter().map(|p| p / 8).collect()
        } else {
            payload_bits.clone()
        };

        let degenerate = units.windows(2).all(|u| u[0] == u[1]);
        let ok = if degenerate {
            values[0] > 0 && values.iter().zip(&units).all(|(v, u)| v == u)
        } else {
            let intercept = values[0] as i64 - units[0] as i64;
            values
                .iter()
                .zip(&units)
                .all(|(&v, &u)| v as i64 - u as i64 == intercept)
        };
        if ok {
            return Some(LengthFit {
                start: off,
                end: off + w,
                payload_start: origin,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::bits_from_hex;

    fn msgs_of(hexes: &[&str]) -> Vec<Message> {
        hexes
            .iter()
            .map(|h| Message::new(bits_from_hex(h), 0))
            .collect()
    }

    #[test]
    fn test_byte_count_with_equal_lengths() {
        // aaaa | ffff | 08 | a1b2c3d4 42 | 8 bytes of payload
        // the length byte (0x08) counts the payload bytes after the
        // 5-byte address/sequence region
        let hex1 = "aaaaffff08a1b2c3d4425a697b8c9dae1234";
        let hex2 = "aaaaffff08a1b2c3d4435a697b8c9dae1234";
        let msgs = msgs_of(&[hex1, hex2]);
        let refs: Vec<&Message> = msgs.iter().collect();
        let fit = find(&refs, 144, 32, 64).expect("length field");
        assert_eq!(fit.start, 32);
        assert_eq!(fit.end, 40);
        assert_eq!(fit.payload_start, 80);
    }

    #[test]
    fn test_zero_nibble_rejected() {
        // the high nibble of 0x08 is zero and must not win as a
        // 4-bit length field
        let hex = "aaaaffff08a1b2c3d4425a697b8c9dae1234";
        let msgs = msgs_of(&[hex, hex]);
        let refs: Vec<&Message> = msgs.iter().collect();
        let fit = find(&refs, 144, 32, 64).expect("length field");
        assert_eq!((fit.start, fit.end), (32, 40));
    }

    #[test]
    fn test_varying_lengths_solve_intercept() {
        // two messages whose third byte counts the bytes after it
        let msgs = msgs_of(&[
            "ffff06112233445566", // 6 bytes follow
            "ffff0411223344",     // 4 bytes follow
        ]);
        let refs: Vec<&Message> = msgs.iter().collect();
        let fit = find(&refs, 56, 16, 64).expect("length field");
        assert_eq!((fit.start, fit.end), (16, 24));
        assert_eq!(fit.payload_start, 24);
    }

    #[test]
    fn test_no_length_field() {
        // bytes too large to count any plausible payload
        let msgs = msgs_of(&["ffffe7eed9c8b7a6", "ffffe7eed9c8b7a6"]);
        let refs: Vec<&Message> = msgs.iter().collect();
        assert_eq!(find(&refs, 64, 16, 64), None);
    }
}
