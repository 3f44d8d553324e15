//! Address field detection
//!
//! Two independent clues reveal addresses. First, a found length
//! field implies that the bytes between it and the payload it counts
//! form a header region; the leading part of that gap is an address.
//! Second, source/destination pairs show cross-message symmetry: the
//! value one message carries in its first address slot reappears in
//! the other slot of another message, as happens whenever two
//! stations answer each other.

use crate::awre::length::LengthFit;
use crate::message::{read_be, Message};

/// Allowed address widths in bits
const WIDTHS: [usize; 6] = [8, 16, 24, 32, 48, 64];

/// Most addresses emitted per message type
const MAX_FIELDS: usize = 2;

/// Detect address fields, widest-gap rule first
///
/// Returns up to two non-overlapping bit ranges in ascending order of
/// discovery: the length-implied header region (if any), then
/// symmetric value recurrences outside every `assigned` range.
pub(crate) fn find(
    messages: &[&Message],
    common_len: usize,
    scan_base: usize,
    assigned: &[(usize, usize)],
    length_fit: Option<&LengthFit>,
) -> Vec<(usize, usize)> {
    let mut out: Vec<(usize, usize)> = Vec::new();

    if let Some(fit) = length_fit {
        let gap = fit.payload_start.saturating_sub(fit.end);
        // widest allowed width that fits the header gap
        if let Some(&w) = WIDTHS.iter().rev().find(|&&w| w <= gap) {
            out.push((fit.end, fit.end + w));
        }
    }

    let first_byte = scan_base.div_ceil(8) * 8;
    'scan: for off in (first_byte..common_len).step_by(8) {
        if out.len() >= MAX_FIELDS {
            break;
        }
        // widest first: a 16-bit station id must not be claimed as
        // two adjacent byte fields
        for &w in WIDTHS.iter().rev() {
            if off + w > common_len {
                continue;
            }
            let window = (off, off + w);
            if overlaps_any(window, assigned) || overlaps_any(window, &out) {
                continue;
            }
            if has_symmetric_partner(messages, common_len, off, w) {
                out.push(window);
                continue 'scan;
            }
        }
    }

    out.truncate(MAX_FIELDS);
    out
}

fn overlaps_any(window: (usize, usize), ranges: &[(usize, usize)]) -> bool {
    ranges
        .iter()
        .any(|&(s, e)| window.0 < e && s < window.1)
}

/// True when the window swaps values with another window
///
/// Looks for a second byte-aligned window of the same width and two
/// messages that exchange non-zero values between the two positions,
/// the signature of swapped source and destination.
fn has_symmetric_partner(
    messages: &[&Message],
    common_len: usize,
    off: usize,
    w: usize,
) -> bool {
    let k = messages.len();
    for other in (0..=common_len.saturating_sub(w)).step_by(8) {
        if other == off {
            continue;
        }
        for i in 0..k {
            for j in 0..k {
                if i == j {
                    continue;
                }
                let (Some(a_here), Some(a_there)) = (
                    read_be(messages[i].bits(), off, w),
                    read_be(messages[i].bits(), other, w),
                ) else {
                    continue;
                };
                let (Some(b_here), Some(b_there)) = (
                    read_be(messages[j].bits(), off, w),
                    read_be(messages[j].bits(), other, w),
                ) else {
                    continue;
                };
                if a_here != 0 && a_there != 0 && a_here == b_there && a_there == b_here {
                    return true;
                }
            }
        }
    }
    false
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
    fn test_length_gap_becomes_address() {
        let msgs = msgs_of(&[
            "aaaaffff08a1b2c3d4425a697b8c9dae1234",
            "aaaaffff08a1b2c3d4435a697b8c9dae1234",
        ]);
        let refs: Vec<&Message> = msgs.iter().collect();
        let fit = LengthFit {
            start: 32,
            end: 40,
            payload_start: 80,
        };
        // 40-bit gap: a 32-bit address fits, leaving one byte over
        let fields = find(&refs, 144, 32, &[(0, 32), (32, 40)], Some(&fit));
        assert_eq!(fields, vec![(40, 72)]);
    }

    #[test]
    fn test_source_destination_swap() {
        // 16-bit stations 0x1be7 and 0x2c99 answering each other:
        // both the source and the destination slot are addresses
        let msgs = msgs_of(&["ffff1be72c9905", "ffff2c991be706"]);
        let refs: Vec<&Message> = msgs.iter().collect();
        let fields = find(&refs, 56, 16, &[(0, 16)], None);
        assert_eq!(fields, vec![(16, 32), (32, 48)]);
    }

    #[test]
    fn test_no_address_without_evidence() {
        let msgs = msgs_of(&["ffff01020304", "ffff01020305"]);
        let refs: Vec<&Message> = msgs.iter().collect();
        assert!(find(&refs, 48, 16, &[(0, 16)], None).is_empty());
    }
}
