use std::future::Future;
use std::pin::Pin;

use dashmap::DashMap;

use crate::types::{
    client::ClientHandle, client::ClientMessage, message::PublishMessage, QualityOfService,
    TopicFilter, TopicName,
};

/// The retained-message store. Out of this crate's implementation scope by
/// design (§1); `dispatch` is what the spec calls `Retained.dispatch(topic,
/// session)`, fired once per *new* subscription filter (§4.1 step 4).
pub trait RetainStore: Send + Sync {
    fn insert(&self, msg: PublishMessage) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    fn dispatch<'a>(
        &'a self,
        filter: &'a TopicFilter,
        client: &'a ClientHandle,
        qos: QualityOfService,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Reference in-memory `RetainStore`: a flat map scanned linearly on
/// dispatch. This is a deliberately simplified stand-in for the teacher's
/// trie-based `store::memory::retain::RetainMessageMemoryStore` (good
/// enough for this crate's own test suite, which never holds more than a
/// handful of retained messages at once).
#[derive(Default)]
pub struct MemoryRetainStore {
    by_topic: DashMap<String, PublishMessage, foldhash::fast::RandomState>,
}

impl MemoryRetainStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RetainStore for MemoryRetainStore {
    fn insert(&self, msg: PublishMessage) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let topic = msg.topic_name().to_string();
            if msg.payload().is_empty() {
                self.by_topic.remove(&topic);
            } else {
                self.by_topic.insert(topic, msg);
            }
        })
    }

    fn dispatch<'a>(
        &'a self,
        filter: &'a TopicFilter,
        client: &'a ClientHandle,
        qos: QualityOfService,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            let matcher = filter.get_matcher();
            let matches: Vec<PublishMessage> = self
                .by_topic
                .iter()
                .map(|entry| entry.value().clone())
                .filter(|msg| matcher.is_match(msg.topic_name()))
                .collect();
            for mut msg in matches {
                msg.set_retain(true);
                // downgrade to the granted subscription qos, same rule the
                // dispatch pipeline applies to live publishes
                msg.set_qos(std::cmp::min(msg.qos(), qos));
                let _ = client.send(ClientMessage::Deliver(msg)).await;
            }
        })
    }
}
