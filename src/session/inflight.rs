use std::collections::VecDeque;

use foldhash::HashMap;

use crate::timer::TimerHandle;
use crate::types::message::PublishMessage;

/// Messages sent to the client, not yet fully acknowledged.
///
/// Order is insertion order, required for in-order retransmit on resume
/// and ack-timeout retry (§4.2). Bounded by `max_inflight` (`0` =
/// unbounded, checked by the caller before `push`).
///
/// Grounded on `mesquitte-core`'s `PendingPackets`'s outgoing `VecDeque`,
/// generalized to the spec's exact transition set rather than the
/// teacher's pull-based timeout sweep.
#[derive(Debug, Default)]
pub struct InflightWindow {
    entries: VecDeque<(u16, PublishMessage)>,
}

impl InflightWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_back(&mut self, packet_id: u16, msg: PublishMessage) {
        self.entries.push_back((packet_id, msg));
    }

    /// Removes the entry for `packet_id`, wherever it sits in the window.
    /// Returns it if present.
    pub fn remove(&mut self, packet_id: u16) -> Option<PublishMessage> {
        let pos = self.entries.iter().position(|(id, _)| *id == packet_id)?;
        self.entries.remove(pos).map(|(_, msg)| msg)
    }

    pub fn contains(&self, packet_id: u16) -> bool {
        self.entries.iter().any(|(id, _)| *id == packet_id)
    }

    /// Looks up an entry without disturbing its position — used for
    /// timeout-driven redelivery, which must not reorder `inflight`.
    pub fn get(&self, packet_id: u16) -> Option<&PublishMessage> {
        self.entries.iter().find(|(id, _)| *id == packet_id).map(|(_, msg)| msg)
    }

    /// Iterates oldest to newest — the order redelivery must follow.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &(u16, PublishMessage)> {
        self.entries.iter()
    }
}

/// `awaiting_ack`: packet_ids whose PUBACK (QoS 1) or PUBREC (QoS 2) we
/// await, each keyed to its retry timer.
pub type AwaitingAck = HashMap<u16, TimerHandle>;

/// `awaiting_comp`: QoS 2 packet_ids for which PUBREC was received, still
/// awaiting PUBCOMP.
pub type AwaitingComp = HashMap<u16, TimerHandle>;

/// `awaiting_rel`: inbound QoS 2 messages buffered pending PUBREL from the
/// client, each with its own timeout timer.
pub type AwaitingRel = HashMap<u16, (PublishMessage, TimerHandle)>;

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::types::{QualityOfService, TopicName};

    fn msg() -> PublishMessage {
        PublishMessage::new(
            TopicName::new("a/b".to_string()).unwrap(),
            Bytes::from_static(b"x"),
            QualityOfService::Level1,
            false,
        )
    }

    #[test]
    fn preserves_insertion_order() {
        let mut w = InflightWindow::new();
        w.push_back(1, msg());
        w.push_back(2, msg());
        let ids: Vec<u16> = w.iter_oldest_first().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn remove_takes_entry_out_regardless_of_position() {
        let mut w = InflightWindow::new();
        w.push_back(1, msg());
        w.push_back(2, msg());
        assert!(w.remove(1).is_some());
        assert_eq!(w.len(), 1);
        assert!(!w.contains(1));
        assert!(w.contains(2));
    }
}
