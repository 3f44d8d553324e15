//! Preamble detection
//!
//! A preamble is a short pattern repeated at the start of every
//! message to give the receiver time to settle. Detection looks for
//! the longest prefix, identical across all messages, that is a
//! repetition of its first `p` bits for a period `p` of 1, 2, 4, or
//! 8, keeping only whole periods.

use crate::message::Message;

const PERIODS: [usize; 4] = [1, 2, 4, 8];

/// Find the preamble of a message set
///
/// Returns the end bit of the preamble field `[0, end)`, or `None`
/// when no repeating prefix of the minimum length exists. Ties
/// between periods resolve to the shortest period.
///
/// `min_periods` is normally 2: a single occurrence of a pattern is
/// not a repetition. For a set of byte-identical messages there is no
/// variance to separate settling bits from payload, and the caller
/// relaxes this to 1 so the leading byte still marks a preamble.
pub(crate) fn find(messages: &[&Message], min_bits: usize, min_periods: usize) -> Option<usize> {
    let common = common_prefix_len(messages);
    let bits = messages[0].bits();

    let mut best = 0usize;
    for p in PERIODS {
        let mut n = 0usize;
        while n < common && bits[n] == bits[n % p] {
            n += 1;
        }
        let whole = n - n % p;
        if whole >= min_periods * p && whole > best {
            best = whole;
        }
    }

    if best >= min_bits {
        Some(best)
    } else {
        None
    }
}

/// Length of the bit prefix shared by every message
pub(crate) fn common_prefix_len(messages: &[&Message]) -> usize {
    let first = messages[0].bits();
    let limit = messages.iter().map(|m| m.len()).min().unwrap_or(0);
    (0..limit)
        .take_while(|&i| messages.iter().all(|m| m.bits()[i] == first[i]))
        .count()
}
