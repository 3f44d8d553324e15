//! Trailing checksum recognition
//!
//! Tries to explain the trailing bits of every message as a checksum
//! over the bytes that precede them. Polynomial CRCs from the
//! configured catalogue are tried first, widest first, then a plain
//! byte sum. The checked region may start at the beginning of the
//! message, after the preamble, or after the sync word.

use crate::message::Message;

/// One entry of the checksum recognition catalogue
///
/// Parameters follow the usual CRC model: `poly` is the generator in
/// normal (MSB-first) form, `reflect` selects the reflected
/// (LSB-first) variant, and the final remainder is XORed with
/// `xor_out`.
#[derive(Clone, Debug)]
pub struct CrcAlgorithm {
    /// Display name, e.g. `"CRC-16/CCITT"`
    pub name: &'static str,
    /// Width in bits (8, 16, or 32)
    pub width: u32,
    /// Generator polynomial, normal form
    pub poly: u64,
    /// Initial shift register value
    pub init: u64,
    /// Reflected (LSB-first) processing
    pub reflect: bool,
    /// Final XOR value
    pub xor_out: u64,
}

impl CrcAlgorithm {
    /// The default recognition catalogue
    ///
    /// CRC-8 (ATM HEC), CRC-16/CCITT-FALSE, CRC-16/IBM (ARC), and
    /// CRC-32 (ISO-HDLC). Extend or replace via
    /// [`AnalysisConfig::checksum_catalogue`](crate::AnalysisConfig).
    pub fn default_catalogue() -> Vec<CrcAlgorithm> {
        vec![
            CrcAlgorithm {
                name: "CRC-8",
                width: 8,
                poly: 0x07,
                init: 0x00,
                reflect: false,
                xor_out: 0x00,
            },
            CrcAlgorithm {
                name: "CRC-16/CCITT",
                width: 16,
                poly: 0x1021,
                init: 0xFFFF,
                reflect: false,
                xor_out: 0x0000,
            },
            CrcAlgorithm {
                name: "CRC-16/IBM",
                width: 16,
                poly: 0x8005,
                init: 0x0000,
                reflect: true,
                xor_out: 0x0000,
            },
            CrcAlgorithm {
                name: "CRC-32",
                width: 32,
                poly: 0x04C1_1DB7,
                init: 0xFFFF_FFFF,
                reflect: true,
                xor_out: 0xFFFF_FFFF,
            },
        ]
    }

    /// Compute this CRC over `bytes`
    pub fn compute(&self, bytes: &[u8]) -> u64 {
        let mask = if self.width == 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        };

        let mut crc;
        if self.reflect {
            let poly = reflect_bits(self.poly, self.width) & mask;
            crc = self.init & mask;
            for &b in bytes {
                crc ^= b as u64;
                for _ in 0..8 {
                    crc = if crc & 1 != 0 { (crc >> 1) ^ poly } else { crc >> 1 };
                }
            }
        } else {
            let top = 1u64 << (self.width - 1);
            crc = self.init & mask;
            for &b in bytes {
                crc ^= (b as u64) << (self.width - 8);
                for _ in 0..8 {
                    crc = if crc & top != 0 {
                        ((crc << 1) ^ self.poly) & mask
                    } else {
                        (crc << 1) & mask
                    };
                }
            }
        }
        (crc ^ self.xor_out) & mask
    }
}

fn reflect_bits(value: u64, width: u32) -> u64 {
    let mut out = 0u64;
    for i in 0..width {
        if value & (1 << i) != 0 {
            out |= 1 << (width - 1 - i);
        }
    }
    out
}

/// Find a trailing checksum common to all messages
///
/// `region_starts` are the candidate offsets of the checked region
/// (message start, preamble end, sync end); only byte-aligned starts
/// are usable. Returns the bit range of the checksum field.
pub(crate) fn find(
    messages: &[&Message],
    common_len: usize,
    region_starts: &[usize],
    catalogue: &[CrcAlgorithm],
) -> Option<(usize, usize)> {
    // a trailing field only has a fixed position when all messages
    // share one length
    if messages.iter().any(|m| m.len() != common_len) {
        return None;
    }

    let mut starts: Vec<usize> = region_starts
        .iter()
        .copied()
        .filter(|r| r % 8 == 0)
        .collect();
    starts.sort_unstable();
    starts.dedup();

    // polynomial CRCs, widest first
    for width in [32usize, 16, 8] {
        let Some(cks_start) = field_start(common_len, width) else {
            continue;
        };
        for algo in catalogue.iter().filter(|a| a.width as usize == width) {
            for &r in &starts {
                if r + 8 > cks_start {
                    continue;
                }
                if matches_all(messages, r, cks_start, width, |bytes| algo.compute(bytes)) {
                    return Some((cks_start, common_len));
                }
            }
        }
    }

    // byte-sum fallback
    for width in [16usize, 8] {
        let Some(cks_start) = field_start(common_len, width) else {
            continue;
        };
        let mask = (1u64 << width) - 1;
        for &r in &starts {
            if r + 8 > cks_start {
                continue;
            }
            let sum = move |bytes: &[u8]| bytes.iter().map(|&b| b as u64).sum::<u64>() & mask;
            if matches_all(messages, r, cks_start, width, sum) {
                return Some((cks_start, common_len));
            }
        }
    }

    None
}

fn field_start(common_len: usize, width: usize) -> Option<usize> {
    if common_len < width + 8 {
        return None;
    }
    let start = common_len - width;
    // the checked region must pack into whole bytes
    if start % 8 != 0 {
        None
    } else {
        Some(start)
    }
}

fn matches_all<F>(
    messages: &[&Message],
    region_start: usize,
    cks_start: usize,
    width: usize,
    f: F,
) -> bool
where
    F: Fn(&[u8]) -> u64,
{
    messages.iter().all(|m| {
        let bytes = pack_bytes(m.bits(), region_start, cks_start);
        match crate::message::read_be(m.bits(), cks_start, width) {
            Some(expected) => f(&bytes) == expected,
            None => false,
        }
    })
}

/// Pack a byte-aligned bit range into bytes, MSB first
pub(crate) fn pack_bytes(bits: &[bool], start: usize, end: usize) -> Vec<u8> {
    bits[start..end]
        .chunks_exact(8)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::bits_from_hex;

    const CHECK_INPUT: &[u8] = b"123456789";

    #[test]
    fn test_catalogue_check_values() {
        let catalogue = CrcAlgorithm::default_catalogue();
        let expected: &[(&str, u64)] = &[
            ("CRC-8", 0xF4),
            ("CRC-16/CCITT", 0x29B1),
            ("CRC-16/IBM", 0xBB3D),
            ("CRC-32", 0xCBF4_3926),
        ];
        for (name, value) in expected {
            let algo = catalogue.iter().find(|a| &a.name == name).unwrap();
            assert_eq!(algo.compute(CHECK_INPUT), *value, "{name}");
        }
    }

    fn message_with_crc16(payload: &[u8]) -> Message {
        let algo = &CrcAlgorithm::default_catalogue()[1];
        let crc = algo.compute(payload) as u16;
        let mut bits = Vec::new();
        for &b in payload {
            bits.extend(bits_from_hex(&format!("{b:02x}")));
        }
        bits.extend(bits_from_hex(&format!("{crc:04x}")));
        Message::new(bits, 0)
    }

    #[test]
    fn test_finds_crc16_over_full_message() {
        let m1 = message_with_crc16(&[0x10, 0x22, 0x33, 0x44]);
        let m2 = message_with_crc16(&[0x10, 0x22, 0x35, 0x99]);
        let msgs = vec![&m1, &m2];
        let found = find(&msgs, 48, &[0], &CrcAlgorithm::default_catalogue());
        assert_eq!(found, Some((32, 48)));
    }

    fn message_with_sum8(payload: &[u8]) -> Message {
        let sum: u64 = payload.iter().map(|&b| b as u64).sum();
        let mut bytes = payload.to_vec();
        bytes.push((sum & 0xff) as u8);
        let mut bits = Vec::new();
        for b in bytes {
            bits.extend(bits_from_hex(&format!("{b:02x}")));
        }
        Message::new(bits, 0)
    }

    #[test]
    fn test_sum_fallback() {
        let m1 = message_with_sum8(&[0x01, 0x02, 0x03]);
        let m2 = message_with_sum8(&[0x0a, 0x0b, 0x0c]);
        let msgs = vec![&m1, &m2];
        let found = find(&msgs, 32, &[0], &CrcAlgorithm::default_catalogue());
        assert_eq!(found, Some((24, 32)));
    }

    #[test]
    fn test_no_checksum_present() {
        let m1 = message_with_sum8(&[0x01, 0x02, 0x03]);
        // different trailing byte breaks every candidate
        let m2 = Message::new(bits_from_hex("0a0b0cff"), 0);
        let msgs = vec![&m1, &m2];
        assert_eq!(find(&msgs, 32, &[0], &CrcAlgorithm::default_catalogue()), None);
    }

    #[test]
    fn test_variable_lengths_skip_stage() {
        let m1 = message_with_sum8(&[0x01, 0x02, 0x03]);
        let m2 = message_with_sum8(&[0x01, 0x02, 0x03, 0x04]);
        let msgs = vec![&m1, &m2];
        assert_eq!(find(&msgs, 32, &[0], &CrcAlgorithm::default_catalogue()), None);
    }
}
