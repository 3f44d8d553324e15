//! Automated protocol format inference
//!
//! Given at least two demodulated messages, this module induces a
//! shared field layout: preamble, sync word, length field, addresses,
//! sequence counter, payload, and trailing checksum. Every stage is a
//! statistical comparison across the message set; a stage that finds
//! nothing simply emits nothing, and gaps left between recognized
//! fields are labeled unknown so each message type is always covered
//! without holes from the start of the message to the end of its
//! common prefix.
//!
//! Messages that differ structurally are first clustered into
//! message types by length; each type is analyzed independently.

mod address;
pub(crate) mod checksum;
mod length;
mod preamble;
mod sequence;
mod sync;

#[cfg(not(test))]
use log::debug;
#[cfg(test)]
use std::println as debug;

use std::collections::BTreeMap;

use strum::Display;

use crate::config::AnalysisConfig;
use crate::message::Message;

/// Role of a protocol field
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum FieldLabel {
    /// Repeated settling pattern at the start of the message
    #[strum(serialize = "preamble")]
    Preamble,

    /// Fixed word marking the end of the preamble
    #[strum(serialize = "sync")]
    Sync,

    /// Payload length encoding
    #[strum(serialize = "length")]
    Length,

    /// Station or device address
    #[strum(serialize = "address")]
    Address,

    /// Frame counter
    #[strum(serialize = "sequence_number")]
    SequenceNumber,

    /// Opaque payload
    #[strum(serialize = "data")]
    Data,

    /// Trailing checksum
    #[strum(serialize = "checksum")]
    Checksum,

    /// Bits no stage could explain
    #[strum(serialize = "unknown")]
    Unknown,
}

/// One inferred protocol field
///
/// `start` and `end` delimit a half-open bit range within the
/// messages of the named message type. Within a type, fields never
/// overlap and are emitted in ascending start order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// What the field is
    pub label: FieldLabel,
    /// First bit of the field
    pub start: usize,
    /// One past the last bit of the field
    pub end: usize,
    /// Message type this field belongs to
    pub message_type: String,
}

#[cfg(feature = "serde")]
impl serde::Serialize for Field {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut st = serializer.serialize_struct("Field", 4)?;
        st.serialize_field("name", &self.label.to_string())?;
        st.serialize_field("start", &self.start)?;
        st.serialize_field("end", &self.end)?;
        st.serialize_field("message_type", &self.message_type)?;
        st.end()
    }
}

/// Infer the field layout of a message set
///
/// With fewer than two messages there is nothing to compare and no
/// fields are emitted.
pub(crate) fn infer_fields(messages: &[Message], cfg: &AnalysisConfig) -> Vec<Field> {
    if messages.len() < 2 {
        return Vec::new();
    }
    let mut fields = Vec::new();
    for cluster in cluster_by_length(messages) {
        debug!(
            "format finder: type \"{}\" with {} messages",
            cluster.name,
            cluster.messages.len()
        );
        fields.extend(infer_type(&cluster, cfg));
    }
    fields
}

/// Messages sharing one field layout
struct Cluster<'m> {
    name: String,
    messages: Vec<&'m Message>,
}

/// Group messages into types by bit length
///
/// Lengths split the set only when every length is seen at least
/// twice; otherwise differing lengths are taken as a variable-length
/// payload within a single type. The type containing the earliest
/// message is named "Default", the rest "Type 2", "Type 3", … in
/// order of first arrival.
fn cluster_by_length(messages: &[Message]) -> Vec<Cluster<'_>> {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, m) in messages.iter().enumerate() {
        groups.entry(m.len()).or_default().push(i);
    }

    if groups.len() < 2 || groups.values().any(|g| g.len() < 2) {
        return vec![Cluster {
            name: "Default".to_string(),
            messages: messages.iter().collect(),
        }];
    }

    let mut ordered: Vec<Vec<usize>> = groups.into_values().collect();
    ordered.sort_by_key(|g| g[0]);
    ordered
        .into_iter()
        .enumerate()
        .map(|(i, group)| Cluster {
            name: if i == 0 {
                "Default".to_string()
            } else {
                format!("Type {}", i + 1)
            },
            messages: group.into_iter().map(|idx| &messages[idx]).collect(),
        })
        .collect()
}

/// Run the detection stages for one message type
fn infer_type(cluster: &Cluster<'_>, cfg: &AnalysisConfig) -> Vec<Field> {
    let msgs = &cluster.messages;
    let common = msgs.iter().map(|m| m.len()).min().unwrap_or(0);
    if common == 0 {
        return Vec::new();
    }

    let mut ranges: Vec<(FieldLabel, usize, usize)> = Vec::new();

    let identical = all_identical(msgs);
    let min_periods = if identical { 1 } else { 2 };
    let preamble_end = preamble::find(msgs, cfg.min_preamble_bits, min_periods);
    if let Some(end) = preamble_end {
        ranges.push((FieldLabel::Preamble, 0, end));
    }

    if identical {
        // no variance to compare: everything after the preamble is
        // opaque
        let start = preamble_end.unwrap_or(0);
        if start < common {
            ranges.push((FieldLabel::Data, start, common));
        }
        return into_fields(ranges, &cluster.name);
    }

    let sync_start = preamble_end.unwrap_or(0);
    let sync_end = sync::find(msgs, sync_start, common, cfg.min_sync_bits);
    if let Some(end) = sync_end {
        ranges.push((FieldLabel::Sync, sync_start, end));
    }

    let scan_base = sync_end.or(preamble_end).unwrap_or(0);

    let fit = length::find(msgs, common, scan_base, cfg.length_scan_bits);
    if let Some(f) = &fit {
        ranges.push((FieldLabel::Length, f.start, f.end));
    }

    let addresses = address::find(msgs, common, scan_base, &spans(&ranges), fit.as_ref());
    for &(start, end) in &addresses {
        ranges.push((FieldLabel::Address, start, end));
    }

    if let Some((start, end)) = sequence::find(msgs, common, &spans(&ranges)) {
        ranges.push((FieldLabel::SequenceNumber, start, end));
    }

    let mut region_starts = vec![0];
    region_starts.extend(preamble_end);
    region_starts.extend(sync_end);
    let cks = checksum::find(msgs, common, &region_starts, &cfg.checksum_catalogue)
        .filter(|&(start, end)| {
            !spans(&ranges)
                .iter()
                .any(|&(s, e)| start < e && s < end)
        });
    if let Some((start, end)) = cks {
        ranges.push((FieldLabel::Checksum, start, end));
    }

    // payload: everything between the last recognized field and the
    // checksum (or the end of the common prefix)
    let data_end = cks.map(|(start, _)| start).unwrap_or(common);
    let data_start = ranges
        .iter()
        .filter(|(label, _, _)| *label != FieldLabel::Checksum)
        .map(|&(_, _, end)| end)
        .max()
        .unwrap_or(0);
    if data_start < data_end {
        ranges.push((FieldLabel::Data, data_start, data_end));
    }

    // cover interior gaps so the layout tiles the common prefix
    ranges.sort_by_key(|&(_, start, _)| start);
    let mut covered = Vec::with_capacity(ranges.len() + 2);
    let mut cursor = 0usize;
    for &(label, start, end) in &ranges {
        if start > cursor {
            covered.push((FieldLabel::Unknown, cursor, start));
        }
        covered.push((label, start, end));
        cursor = end;
    }

    into_fields(covered, &cluster.name)
}

fn spans(ranges: &[(FieldLabel, usize, usize)]) -> Vec<(usize, usize)> {
    ranges.iter().map(|&(_, start, end)| (start, end)).collect()
}

fn all_identical(msgs: &[&Message]) -> bool {
    msgs.windows(2).all(|w| w[0].bits() == w[1].bits())
}

fn into_fields(ranges: Vec<(FieldLabel, usize, usize)>, type_name: &str) -> Vec<Field> {
    ranges
        .into_iter()
        .map(|(label, start, end)| Field {
            label,
            start,
            end,
            message_type: type_name.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::awre::checksum::CrcAlgorithm;
    use crate::synth::bits_from_hex;

    /// Frame used across the engine tests:
    /// preamble aaaaaaaa | sync ffffffff | len 08 | addr a1b2c3d4 |
    /// seq NN | data 5a697b8c9dae | crc16-ccitt over bytes 8..20
    fn frame(seq: u8) -> Message {
        let mut body = vec![0x08, 0xa1, 0xb2, 0xc3, 0xd4, seq];
        body.extend([0x5a, 0x69, 0x7b, 0x8c, 0x9d, 0xae]);
        let crc = CrcAlgorithm::default_catalogue()[1].compute(&body) as u16;

        let mut hex = String::from("aaaaaaaaffffffff");
        for b in &body {
            hex.push_str(&format!("{b:02x}"));
        }
        hex.push_str(&format!("{crc:04x}"));
        Message::new(bits_from_hex(&hex), 0)
    }

    fn labels_of(fields: &[Field]) -> Vec<(FieldLabel, usize, usize)> {
        fields.iter().map(|f| (f.label, f.start, f.end)).collect()
    }

    #[test]
    fn test_full_frame_layout() {
        let messages = vec![frame(0x42), frame(0x43)];
        let fields = infer_fields(&messages, &AnalysisConfig::default());

        assert_eq!(
            labels_of(&fields),
            vec![
                (FieldLabel::Preamble, 0, 32),
                (FieldLabel::Sync, 32, 64),
                (FieldLabel::Length, 64, 72),
                (FieldLabel::Address, 72, 104),
                (FieldLabel::SequenceNumber, 104, 112),
                (FieldLabel::Data, 112, 160),
                (FieldLabel::Checksum, 160, 176),
            ]
        );
        assert!(fields.iter().all(|f| f.message_type == "Default"));
    }

    #[test]
    fn test_field_ranges_tile_common_prefix() {
        let messages = vec![frame(0x01), frame(0x02), frame(0x03)];
        let fields = infer_fields(&messages, &AnalysisConfig::default());

        let mut cursor = 0;
        for f in &fields {
            assert_eq!(f.start, cursor, "gap or overlap before {:?}", f.label);
            assert!(f.end > f.start);
            cursor = f.end;
        }
        assert_eq!(cursor, messages[0].len());
    }

    #[test]
    fn test_identical_messages_yield_preamble_and_data() {
        let m = Message::new(bits_from_hex("aaaaaaaa1b2c3d4e"), 0);
        let messages = vec![m.clone(), m.clone(), m];
        let fields = infer_fields(&messages, &AnalysisConfig::default());
        assert_eq!(
            labels_of(&fields),
            vec![(FieldLabel::Preamble, 0, 32), (FieldLabel::Data, 32, 64)]
        );
    }

    #[test]
    fn test_single_message_yields_nothing() {
        let messages = vec![frame(0x42)];
        assert!(infer_fields(&messages, &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn test_two_lengths_split_into_types() {
        let short = Message::new(bits_from_hex("ffff4201e7"), 0);
        let short2 = Message::new(bits_from_hex("ffff4202e7"), 0);
        let long = Message::new(bits_from_hex("ffff4201112233e7"), 0);
        let long2 = Message::new(bits_from_hex("ffff4202112233e7"), 0);
        let messages = vec![short, long, short2, long2];
        let fields = infer_fields(&messages, &AnalysisConfig::default());

        let types: Vec<&str> = fields.iter().map(|f| f.message_type.as_str()).collect();
        assert!(types.contains(&"Default"));
        assert!(types.contains(&"Type 2"));
        // each type tiles its own common prefix
        for (name, len) in [("Default", 40), ("Type 2", 64)] {
            let mut cursor = 0;
            for f in fields.iter().filter(|f| f.message_type == name) {
                assert_eq!(f.start, cursor, "{name}");
                cursor = f.end;
            }
            assert_eq!(cursor, len, "{name}");
        }
    }

    #[test]
    fn test_variable_lengths_stay_one_type() {
        // three distinct lengths, each seen once: variable payload
        let messages = vec![
            Message::new(bits_from_hex("ffff03a1b2c3"), 0),
            Message::new(bits_from_hex("ffff04a1b2c3d4"), 0),
            Message::new(bits_from_hex("ffff05a1b2c3d4e5"), 0),
        ];
        let fields = infer_fields(&messages, &AnalysisConfig::default());
        assert!(fields.iter().all(|f| f.message_type == "Default"));
    }
}
