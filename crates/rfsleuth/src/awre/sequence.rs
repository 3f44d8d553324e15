//! Sequence number detection
//!
//! Many protocols number their frames. A byte-aligned window is a
//! sequence counter when its values, taken in arrival order, increase
//! by a constant 1 or 2 modulo the window width. At most one such
//! field exists per message type; the earliest qualifying window
//! wins.

use crate::message::{read_be, read_le, Message};

const WIDTHS: [usize; 2] = [8, 16];

/// Find the sequence number window outside `assigned` ranges
///
/// The scan is width-major: all byte windows first, then 16-bit
/// windows. A wider window whose extra byte never changes would
/// otherwise shadow the true counter from an earlier offset.
pub(crate) fn find(
    messages: &[&Message],
    common_len: usize,
    assigned: &[(usize, usize)],
) -> Option<(usize, usize)> {
    for w in WIDTHS {
        for off in (0..common_len).step_by(8) {
            if off + w > common_len {
                continue;
            }
            if assigned.iter().any(|&(s, e)| off < e && s < off + w) {
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
                if values.len() == messages.len() && is_counter(&values, w) {
                    return Some((off, off + w));
                }
            }
        }
    }
    None
}

/// Strictly increasing with constant step 1 or 2, modulo 2^width
fn is_counter(values: &[u64], width: usize) -> bool {
    if values.len() < 2 {
        return false;
    }
    let modulus = 1u64 << width;
    let step = (values[1].wrapping_sub(values[0])) % modulus;
    if step != 1 && step != 2 {
        return false;
    }
    values
        .windows(2)
        .all(|v| (v[1].wrapping_sub(v[0])) % modulus == step)
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
    fn test_incrementing_byte() {
        let msgs = msgs_of(&["ff1101aa", "ff1102aa", "ff1103aa"]);
        let refs: Vec<&Message> = msgs.iter().collect();
        assert_eq!(find(&refs, 32, &[]), Some((16, 24)));
    }

    #[test]
    fn test_step_two() {
        let msgs = msgs_of(&["ff1110aa", "ff1112aa", "ff1114aa"]);
        let refs: Vec<&Message> = msgs.iter().collect();
        assert_eq!(find(&refs, 32, &[]), Some((16, 24)));
    }

    #[test]
    fn test_wraparound() {
        let msgs = msgs_of(&["ff11feaa", "ff11ffaa", "ff1100aa"]);
        let refs: Vec<&Message> = msgs.iter().collect();
        assert_eq!(find(&refs, 32, &[]), Some((16, 24)));
    }

    #[test]
    fn test_irregular_step_rejected() {
        let msgs = msgs_of(&["ff1101aa", "ff1102aa", "ff1105aa"]);
        let refs: Vec<&Message> = msgs.iter().collect();
        assert_eq!(find(&refs, 32, &[]), None);
    }

    #[test]
    fn test_assigned_window_skipped() {
        let msgs = msgs_of(&["ff1101aa", "ff1102aa", "ff1103aa"]);
        let refs: Vec<&Message> = msgs.iter().collect();
        assert_eq!(find(&refs, 32, &[(16, 24)]), None);
    }

    #[test]
    fn test_counter_crossing_byte_boundary() {
        // 0x01fe, 0x0200, 0x0202: the low byte keeps counting
        // modulo 256 across the carry, so it is the minimal window
        let msgs = msgs_of(&["aa01febb", "aa0200bb", "aa0202bb"]);
        let refs: Vec<&Message> = msgs.iter().collect();
        assert_eq!(find(&refs, 32, &[]), Some((16, 24)));
    }

}
