use super::{message::PublishMessage, QualityOfService, TopicFilter};

type Subscribes = Vec<(TopicFilter, QualityOfService)>;

/// Observer/interceptor points the spec calls "the hook bus".
///
/// `client_subscribe` is a `foldl` hook: it may filter or rewrite the
/// requested topic list before the session acts on it. The rest are
/// `foreach` (pure notification) hooks. Absence of any hook is identity/
/// no-op, matching the teacher's convention that a missing collaborator
/// behaves as a transparent default rather than an error.
#[derive(Default)]
pub struct HookBus {
    client_subscribe: Option<Box<dyn Fn(&str, Subscribes) -> Subscribes + Send + Sync>>,
    client_subscribe_after: Option<Box<dyn Fn(&str, &Subscribes) + Send + Sync>>,
    client_unsubscribe: Option<Box<dyn Fn(&str, &[TopicFilter]) + Send + Sync>>,
    message_acked: Option<Box<dyn Fn(&str, &PublishMessage) + Send + Sync>>,
}

impl HookBus {
    pub fn with_client_subscribe(
        mut self,
        f: impl Fn(&str, Subscribes) -> Subscribes + Send + Sync + 'static,
    ) -> Self {
        self.client_subscribe = Some(Box::new(f));
        self
    }

    pub fn with_client_subscribe_after(
        mut self,
        f: impl Fn(&str, &Subscribes) + Send + Sync + 'static,
    ) -> Self {
        self.client_subscribe_after = Some(Box::new(f));
        self
    }

    pub fn with_client_unsubscribe(
        mut self,
        f: impl Fn(&str, &[TopicFilter]) + Send + Sync + 'static,
    ) -> Self {
        self.client_unsubscribe = Some(Box::new(f));
        self
    }

    pub fn with_message_acked(
        mut self,
        f: impl Fn(&str, &PublishMessage) + Send + Sync + 'static,
    ) -> Self {
        self.message_acked = Some(Box::new(f));
        self
    }

    pub(crate) fn apply_client_subscribe(&self, client_id: &str, topics: Subscribes) -> Subscribes {
        match &self.client_subscribe {
            Some(f) => f(client_id, topics),
            None => topics,
        }
    }

    pub(crate) fn fire_client_subscribe_after(&self, client_id: &str, topics: &Subscribes) {
        if let Some(f) = &self.client_subscribe_after {
            f(client_id, topics);
        }
    }

    pub(crate) fn fire_client_unsubscribe(&self, client_id: &str, topics: &[TopicFilter]) {
        if let Some(f) = &self.client_unsubscribe {
            f(client_id, topics);
        }
    }

    pub(crate) fn fire_message_acked(&self, client_id: &str, msg: &PublishMessage) {
        if let Some(f) = &self.message_acked {
            f(client_id, msg);
        }
    }
}
