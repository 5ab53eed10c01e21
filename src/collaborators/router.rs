use std::future::Future;
use std::pin::Pin;

use crate::types::{message::PublishMessage, QualityOfService, TopicFilter};

/// The topic-matching / global-dispatch fabric. Out of this crate's
/// implementation scope by design (§1); a session only ever calls through
/// this trait.
///
/// Grounded on `mesquitte-core`'s `store::{message,retain,topic}` trait
/// split — each external concern gets its own narrow trait rather than one
/// monolithic "broker" interface.
pub trait Router: Send + Sync {
    fn publish(&self, msg: PublishMessage) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    fn subscribe(
        &self,
        client_id: &str,
        topics: &[(TopicFilter, QualityOfService)],
    ) -> Pin<Box<dyn Future<Output = Vec<QualityOfService>> + Send + '_>>;

    fn unsubscribe(
        &self,
        client_id: &str,
        topics: &[TopicFilter],
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Reference in-memory `Router`. Records the last publish and always grants
/// the requested QoS — enough to drive this crate's own test suite without
/// a real topic tree attached.
#[derive(Default)]
pub struct MemoryRouter {
    published: parking_lot::Mutex<Vec<PublishMessage>>,
}

impl MemoryRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<PublishMessage> {
        self.published.lock().clone()
    }
}

impl Router for MemoryRouter {
    fn publish(&self, msg: PublishMessage) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.published.lock().push(msg);
        })
    }

    fn subscribe(
        &self,
        _client_id: &str,
        topics: &[(TopicFilter, QualityOfService)],
    ) -> Pin<Box<dyn Future<Output = Vec<QualityOfService>> + Send + '_>> {
        let granted: Vec<QualityOfService> = topics.iter().map(|(_, qos)| *qos).collect();
        Box::pin(async move { granted })
    }

    fn unsubscribe(
        &self,
        _client_id: &str,
        _topics: &[TopicFilter],
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }
}
