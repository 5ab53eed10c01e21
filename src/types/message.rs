use bytes::Bytes;

use super::{QualityOfService, TopicName};

/// A message in flight between the router and a session, or between a
/// session and its client.
///
/// Grounded on `mesquitte-core`'s `store::message::PublishMessage` /
/// `types::publish` field shape; the `packet_id` and `dup` fields are
/// mutated by the session itself as a message moves through `deliver`,
/// `redeliver`, and the QoS 2 receiver path, rather than being fixed at
/// construction as the wire PUBLISH packet's fields are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishMessage {
    topic_name: TopicName,
    payload: Bytes,
    qos: QualityOfService,
    retain: bool,
    dup: bool,
    /// Set once the session assigns an outbound packet id via `deliver`;
    /// `None` for a QoS 0 message or a message not yet delivered.
    packet_id: Option<u16>,
}

impl PublishMessage {
    pub fn new(topic_name: TopicName, payload: Bytes, qos: QualityOfService, retain: bool) -> Self {
        Self {
            topic_name,
            payload,
            qos,
            retain,
            dup: false,
            packet_id: None,
        }
    }

    pub fn topic_name(&self) -> &TopicName {
        &self.topic_name
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn qos(&self) -> QualityOfService {
        self.qos
    }

    pub fn retain(&self) -> bool {
        self.retain
    }

    pub fn set_retain(&mut self, retain: bool) {
        self.retain = retain;
    }

    pub fn set_qos(&mut self, qos: QualityOfService) {
        self.qos = qos;
    }

    pub fn dup(&self) -> bool {
        self.dup
    }

    pub fn set_dup(&mut self, dup: bool) {
        self.dup = dup;
    }

    pub fn packet_id(&self) -> Option<u16> {
        self.packet_id
    }

    pub fn set_packet_id(&mut self, packet_id: u16) {
        self.packet_id = Some(packet_id);
    }
}
