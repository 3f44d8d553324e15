//! Sync word detection
//!
//! The sync word sits directly after the preamble: a maximal run of
//! one bit value, identical in every message, that marks the end of
//! the settling pattern. Only whole nibbles count, and short runs are
//! rejected.

use crate::message::Message;

/// Find the sync word `[start, end)` beginning at `start`
///
/// `start` is the preamble end, or 0 when no preamble was found.
/// The run is truncated to a multiple of four bits and must reach the
/// minimum length.
pub(crate) fn find(
    messages: &[&Message],
    start: usize,
    limit: usize,
    min_bits: usize,
) -> Option<usize> {
    if start >= limit {
        return None;
    }

    let first = messages[0].bits();
    let value = first[start];
    let mut end = start;
    while end < limit
        && first[end] == value
        && messages.iter().all(|m| m.bits()[end] == value)
    {
        end += 1;
    }

    let run = (end - start) - (end - start) % 4;
    if run >= min_bits {
        Some(start + run)
    } else {
        None
    }
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
    fn test_sync_after_preamble() {
        // 0xaaaa preamble, 0xffffffff sync, then a length byte
        let msgs = msgs_of(&["aaaaffffffff08a1", "aaaaffffffff08a2"]);
        let refs: Vec<&Message> = msgs.iter().collect();
        assert_eq!(find(&refs, 16, 64, 8), Some(48));
    }

    #[test]
    fn test_truncated_to_nibble() {
        // 0xfffe: run of 15 ones truncates to 12
        let msgs = msgs_of(&["fffe1234", "fffe1234"]);
        let refs: Vec<&Message> = msgs.iter().collect();
        assert_eq!(find(&refs, 0, 32, 8), Some(12));
    }

    #[test]
    fn test_short_run_rejected() {
        let msgs = msgs_of(&["f0123456", "f0123456"]);
        let refs: Vec<&Message> = msgs.iter().collect();
        assert_eq!(find(&refs, 0, 32, 8), None);
    }

    #[test]
    fn test_disagreement_ends_run() {
        // second message flips a bit inside the run
        let msgs = msgs_of(&["ffffff12", "ffdfff12"]);
        let refs: Vec<&Message> = msgs.iter().collect();
        assert_eq!(find(&refs, 0, 32, 8), Some(8));
    }
}
