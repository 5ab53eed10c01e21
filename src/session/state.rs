use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::collaborators::{MQueue, RetainStore, Router, SessionManager};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::timer::{self, TimerHandle};
use crate::types::client::{ClientHandle, ClientMessage, KickReason, RedeliverKind};
use crate::types::hooks::HookBus;
use crate::types::message::PublishMessage;
use crate::types::stats::SessionStats;
use crate::types::{QualityOfService, TopicFilter};

use super::event::{AdminEvent, ClientDownReason, TimerEvent};
use super::inflight::{AwaitingAck, AwaitingComp, AwaitingRel, InflightWindow};
use super::packet_id::PacketIdAllocator;

/// Outcome of an event that may end the session actor's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Destroy,
    Expired,
    ClientDownCleanSession,
}

/// The §3 data model plus the §4.1-§4.6 operations, generic over its four
/// external collaborators.
///
/// Grounded on `mesquitte-core`'s `types::session::Session` for field
/// shape and getter/setter naming, generalized from the teacher's
/// pull-based per-connection session to this crate's actor-driven
/// push/timer model.
pub struct SessionCore {
    client_id: String,
    clean_sess: bool,
    client: Option<ClientHandle>,
    /// Liveness watch on `client`: a task that resolves once the client's
    /// receiver is dropped and reports back as `AdminEvent::ClientDown`.
    /// Replaced wholesale (old one aborted) whenever `client` changes.
    client_down_watch: Option<JoinHandle<()>>,
    next_packet_id: PacketIdAllocator,
    subscriptions: Vec<(TopicFilter, QualityOfService)>,
    inflight: InflightWindow,
    mqueue: Box<dyn MQueue>,
    awaiting_ack: AwaitingAck,
    awaiting_comp: AwaitingComp,
    awaiting_rel: AwaitingRel,
    expired_timer: Option<TimerHandle>,
    collect_timer: Option<TimerHandle>,
    created_at: Instant,
    config: SessionConfig,
    message_dropped: u64,
    hooks: HookBus,
    router: Arc<dyn Router>,
    retain: Arc<dyn RetainStore>,
    manager: Arc<dyn SessionManager>,
    timer_tx: mpsc::Sender<TimerEvent>,
    collect_tx: mpsc::Sender<()>,
    admin_tx: mpsc::Sender<AdminEvent>,
}

/// Everything a [`SessionCore`] needs that isn't part of its own state.
pub struct SessionDeps {
    pub client_id: String,
    pub clean_sess: bool,
    pub client: ClientHandle,
    pub config: SessionConfig,
    pub hooks: HookBus,
    pub router: Arc<dyn Router>,
    pub retain: Arc<dyn RetainStore>,
    pub manager: Arc<dyn SessionManager>,
    pub mqueue: Box<dyn MQueue>,
    pub timer_tx: mpsc::Sender<TimerEvent>,
    pub collect_tx: mpsc::Sender<()>,
    pub admin_tx: mpsc::Sender<AdminEvent>,
}

impl SessionCore {
    pub fn new(deps: SessionDeps) -> Self {
        let mut core = Self {
            client_id: deps.client_id,
            clean_sess: deps.clean_sess,
            client: None,
            client_down_watch: None,
            next_packet_id: PacketIdAllocator::new(),
            subscriptions: Vec::new(),
            inflight: InflightWindow::new(),
            mqueue: deps.mqueue,
            awaiting_ack: AwaitingAck::default(),
            awaiting_comp: AwaitingComp::default(),
            awaiting_rel: AwaitingRel::default(),
            expired_timer: None,
            collect_timer: None,
            created_at: Instant::now(),
            config: deps.config,
            message_dropped: 0,
            hooks: deps.hooks,
            router: deps.router,
            retain: deps.retain,
            manager: deps.manager,
            timer_tx: deps.timer_tx,
            collect_tx: deps.collect_tx,
            admin_tx: deps.admin_tx,
        };
        core.set_client(deps.client);
        core
    }

    /// Installs `client` as the current owner and (re)arms its liveness
    /// watch, aborting whatever watch was running for the previous
    /// handle (§3 invariant 5, §4.4 step 6).
    fn set_client(&mut self, client: ClientHandle) {
        if let Some(watch) = self.client_down_watch.take() {
            watch.abort();
        }
        let admin_tx = self.admin_tx.clone();
        let watched = client.clone();
        self.client_down_watch = Some(tokio::spawn(async move {
            watched.closed().await;
            let _ = admin_tx.send(AdminEvent::ClientDown(watched, ClientDownReason::Disconnected)).await;
        }));
        self.client = Some(client);
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn is_online(&self) -> bool {
        self.client.is_some()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            client_id: self.client_id.clone(),
            clean_sess: self.clean_sess,
            subscriptions: self.subscriptions.len(),
            max_inflight: self.config.max_inflight,
            inflight_queue_len: self.inflight.len(),
            message_queue_len: self.mqueue.len(),
            message_dropped: self.message_dropped,
            awaiting_rel: self.awaiting_rel.len(),
            awaiting_ack: self.awaiting_ack.len(),
            awaiting_comp: self.awaiting_comp.len(),
            created_at: self.created_at,
        }
    }

    /// Registers with the Session Manager and publishes the initial stats
    /// snapshot. Called once by the actor before entering its event loop.
    pub async fn register(&self) {
        self.manager.register_session(&self.client_id).await;
        self.report_stats().await;
    }

    pub async fn report_stats(&self) {
        self.manager.report_stats(self.stats()).await;
    }

    /// Arms the first `CollectInfo` tick if configured. Called once on
    /// start; re-armed by the actor after each tick fires.
    pub fn arm_collect_timer(&mut self) {
        if self.config.collect_interval > Duration::ZERO {
            self.collect_timer = Some(timer::arm(self.config.collect_interval, self.collect_tx.clone(), || ()));
        }
    }

    fn arm_ack_timer(&self, packet_id: u16) -> TimerHandle {
        timer::arm(self.config.unack_retry_interval, self.timer_tx.clone(), move || {
            TimerEvent::AwaitingAckTimeout(packet_id)
        })
    }

    fn arm_rel_timer(&self, packet_id: u16) -> TimerHandle {
        timer::arm(self.config.await_rel_timeout, self.timer_tx.clone(), move || {
            TimerEvent::AwaitingRelTimeout(packet_id)
        })
    }

    fn arm_comp_timer(&self, packet_id: u16) -> TimerHandle {
        timer::arm(self.config.await_rel_timeout, self.timer_tx.clone(), move || {
            TimerEvent::AwaitingCompTimeout(packet_id)
        })
    }

    // ---- §4.1 operations --------------------------------------------

    /// Synchronous QoS 2 inbound publish. Buffers the message pending
    /// PUBREL; never touches the Router directly (that happens on
    /// `pubrel`).
    pub async fn publish_qos2(&mut self, msg: PublishMessage) -> Result<(), SessionError> {
        if self.config.max_awaiting_rel > 0 && self.awaiting_rel.len() >= self.config.max_awaiting_rel {
            crate::warn!(
                "session {}: awaiting_rel full ({}), dropping qos2 publish",
                self.client_id,
                self.config.max_awaiting_rel
            );
            return Err(SessionError::Dropped);
        }
        let packet_id = msg
            .packet_id()
            .expect("qos 2 inbound publish must carry a packet id");
        let timer = self.arm_rel_timer(packet_id);
        self.awaiting_rel.insert(packet_id, (msg, timer));
        Ok(())
    }

    /// §4.1 `subscribe`. Returns the ack list in request order.
    pub async fn subscribe(&mut self, topics: Vec<(TopicFilter, QualityOfService)>) -> Vec<QualityOfService> {
        let topics = self.hooks.apply_client_subscribe(&self.client_id, topics);

        let all_identical = !topics.is_empty()
            && topics
                .iter()
                .all(|(filter, qos)| self.subscriptions.iter().any(|(f, q)| f == filter && q == qos));

        let granted = if all_identical {
            topics.iter().map(|(_, qos)| *qos).collect::<Vec<_>>()
        } else {
            self.router.subscribe(&self.client_id, &topics).await
        };

        if !all_identical {
            for (filter, granted_qos) in topics.iter().map(|(f, _)| f).zip(granted.iter().copied()) {
                let is_new = !self.subscriptions.iter().any(|(f, _)| f == filter);
                match self.subscriptions.iter_mut().find(|(f, _)| f == filter) {
                    Some(entry) => entry.1 = granted_qos,
                    None => self.subscriptions.push((filter.clone(), granted_qos)),
                }
                if is_new {
                    if let Some(client) = &self.client {
                        self.retain.dispatch(filter, client, granted_qos).await;
                    }
                }
            }
        }

        self.hooks.fire_client_subscribe_after(&self.client_id, &topics);
        granted
    }

    /// §4.1 `unsubscribe`.
    pub async fn unsubscribe(&mut self, topics: Vec<TopicFilter>) {
        self.hooks.fire_client_unsubscribe(&self.client_id, &topics);
        self.router.unsubscribe(&self.client_id, &topics).await;
        for filter in &topics {
            match self.subscriptions.iter().position(|(f, _)| f == filter) {
                Some(pos) => {
                    self.subscriptions.remove(pos);
                }
                None => {
                    crate::debug!("session {}: unsubscribe of unknown filter {}", self.client_id, filter);
                }
            }
        }
    }

    /// §4.1 `puback` — QoS 1 completion.
    pub async fn puback(&mut self, packet_id: u16) {
        let Some(timer) = self.awaiting_ack.remove(&packet_id) else {
            crate::debug!("session {}: puback for unknown packet id {}", self.client_id, packet_id);
            return;
        };
        timer.cancel();
        if let Some(msg) = self.inflight.remove(packet_id) {
            self.hooks.fire_message_acked(&self.client_id, &msg);
        }
        self.dequeue().await;
    }

    /// §4.1 `pubrec` — QoS 2 phase 1. Removes from both `inflight` and
    /// `awaiting_ack` at once (Invariant 1): the rest of the handshake
    /// lives only in `awaiting_comp` from here on.
    pub async fn pubrec(&mut self, packet_id: u16) {
        let Some(ack_timer) = self.awaiting_ack.remove(&packet_id) else {
            crate::debug!("session {}: pubrec for unknown packet id {}", self.client_id, packet_id);
            return;
        };
        ack_timer.cancel();
        if let Some(msg) = self.inflight.remove(packet_id) {
            self.hooks.fire_message_acked(&self.client_id, &msg);
        }
        let comp_timer = self.arm_comp_timer(packet_id);
        self.awaiting_comp.insert(packet_id, comp_timer);
        self.dequeue().await;
    }

    /// §4.1 `pubrel` — inbound phase 2. This is where the at-most-once
    /// commit to the Router happens.
    pub async fn pubrel(&mut self, packet_id: u16) {
        let Some((msg, timer)) = self.awaiting_rel.remove(&packet_id) else {
            crate::debug!("session {}: pubrel for unknown packet id {}", self.client_id, packet_id);
            return;
        };
        timer.cancel();
        self.router.publish(msg).await;
    }

    /// §4.1 `pubcomp` — QoS 2 final.
    pub async fn pubcomp(&mut self, packet_id: u16) {
        match self.awaiting_comp.remove(&packet_id) {
            Some(timer) => timer.cancel(),
            None => {
                crate::debug!("session {}: pubcomp for unknown packet id {}", self.client_id, packet_id);
            }
        }
    }

    // ---- §4.2 outbound delivery pipeline -----------------------------

    /// `Dispatch(msg)` arriving from the Router.
    pub async fn dispatch(&mut self, msg: PublishMessage) {
        if self.client.is_none() {
            self.enqueue(msg);
            return;
        }
        match msg.qos() {
            QualityOfService::Level0 => self.send_qos0(msg).await,
            _ if self.has_room() => self.deliver(msg).await,
            _ => self.enqueue(msg),
        }
    }

    fn has_room(&self) -> bool {
        self.config.max_inflight == 0 || self.inflight.len() < self.config.max_inflight as usize
    }

    fn enqueue(&mut self, msg: PublishMessage) {
        if self.mqueue.push(msg) {
            self.message_dropped += 1;
        }
    }

    async fn send_qos0(&self, msg: PublishMessage) {
        if let Some(client) = &self.client {
            let _ = client.send(ClientMessage::Deliver(msg)).await;
        }
    }

    /// Assigns a fresh packet id, sends, records into `inflight`, arms the
    /// ack timer.
    async fn deliver(&mut self, mut msg: PublishMessage) {
        let packet_id = self.next_packet_id.next();
        msg.set_packet_id(packet_id);
        msg.set_dup(false);
        if let Some(client) = &self.client {
            let _ = client.send(ClientMessage::Deliver(msg.clone())).await;
        }
        self.inflight.push_back(packet_id, msg);
        self.await_ack(packet_id);
    }

    fn await_ack(&mut self, packet_id: u16) {
        let timer = self.arm_ack_timer(packet_id);
        self.awaiting_ack.insert(packet_id, timer);
    }

    /// Drains the message queue into the inflight window while there's
    /// room and the client is online.
    async fn dequeue(&mut self) {
        while self.client.is_some() && self.has_room() {
            let Some(msg) = self.mqueue.pop() else { break };
            if msg.qos() == QualityOfService::Level0 {
                self.send_qos0(msg).await;
            } else {
                self.deliver(msg).await;
            }
        }
    }

    /// Re-sends an already-inflight message with `dup=true`, reusing its
    /// packet id, and rearms `awaiting_ack`.
    async fn redeliver(&mut self, packet_id: u16, mut msg: PublishMessage) {
        msg.set_dup(true);
        if let Some(client) = &self.client {
            let _ = client.send(ClientMessage::Deliver(msg)).await;
        }
        self.await_ack(packet_id);
    }

    // ---- §4.3 timeout handling ----------------------------------------

    pub async fn handle_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::AwaitingAckTimeout(packet_id) => {
                if self.awaiting_ack.remove(&packet_id).is_none() {
                    // Timer fired after the ack already landed; nothing to do.
                    return;
                }
                if self.client.is_none() {
                    crate::debug!("session {}: ack timeout for {} while offline, will retry on resume", self.client_id, packet_id);
                    return;
                }
                match self.inflight.get(packet_id).cloned() {
                    Some(msg) => self.redeliver(packet_id, msg).await,
                    None => {
                        crate::debug!("session {}: ack timeout for {} raced an ack, dequeuing", self.client_id, packet_id);
                        self.dequeue().await;
                    }
                }
            }
            TimerEvent::AwaitingRelTimeout(packet_id) => {
                if self.awaiting_rel.remove(&packet_id).is_some() {
                    crate::warn!("session {}: awaiting_rel timeout for {}, dropping buffered publish", self.client_id, packet_id);
                }
            }
            TimerEvent::AwaitingCompTimeout(packet_id) => {
                if self.awaiting_comp.remove(&packet_id).is_some() {
                    crate::warn!("session {}: awaiting_comp timeout for {}, giving up on pubcomp", self.client_id, packet_id);
                }
            }
        }
    }

    // ---- §4.4 resume ----------------------------------------------------

    pub async fn resume(&mut self, new_client: ClientHandle) {
        if let Some(old) = &self.client {
            if *old == new_client {
                crate::debug!("session {}: resume with identical client handle, no-op", self.client_id);
                return;
            }
        }

        if let Some(timer) = self.expired_timer.take() {
            timer.cancel();
        }

        if let Some(old) = &self.client {
            let _ = old.send(ClientMessage::Kickout(KickReason::DuplicateClientId, new_client.clone())).await;
        }

        for packet_id in self.awaiting_comp.keys().copied().collect::<Vec<_>>() {
            let _ = new_client.send(ClientMessage::Redeliver(RedeliverKind::PubRel, packet_id)).await;
        }

        for (_, timer) in self.awaiting_ack.drain() {
            timer.cancel();
        }
        for (_, timer) in self.awaiting_comp.drain() {
            timer.cancel();
        }

        self.set_client(new_client);

        let entries: Vec<(u16, PublishMessage)> = self.inflight.iter_oldest_first().cloned().collect();
        for (packet_id, msg) in entries {
            self.redeliver(packet_id, msg).await;
        }

        self.dequeue().await;
    }

    // ---- §4.5 client-down -------------------------------------------------

    pub async fn client_down(&mut self, handle: ClientHandle, _reason: ClientDownReason) -> Option<Termination> {
        match &self.client {
            Some(current) if *current == handle => {}
            _ => {
                crate::debug!("session {}: client-down for unrelated handle, ignoring", self.client_id);
                return None;
            }
        }

        if self.clean_sess {
            return Some(Termination::ClientDownCleanSession);
        }

        self.client = None;
        self.client_down_watch = None;
        self.expired_timer = Some(timer::arm(self.config.expired_after, self.admin_tx.clone(), || {
            AdminEvent::SessionExpired
        }));
        None
    }

    // ---- teardown -----------------------------------------------------

    pub async fn teardown(&mut self) {
        if let Some(watch) = self.client_down_watch.take() {
            watch.abort();
        }
        if let Some(timer) = self.expired_timer.take() {
            timer.cancel();
        }
        if let Some(timer) = self.collect_timer.take() {
            timer.cancel();
        }
        for (_, timer) in self.awaiting_ack.drain() {
            timer.cancel();
        }
        for (_, timer) in self.awaiting_comp.drain() {
            timer.cancel();
        }
        for (_, (_, timer)) in self.awaiting_rel.drain() {
            timer.cancel();
        }
        self.manager.unregister_session(&self.client_id).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use super::*;
    use crate::collaborators::{BoundedMemoryQueue, MemoryRetainStore, MemoryRouter, NoopSessionManager};
    use crate::types::client::ClientMessage;
    use crate::types::hooks::HookBus;
    use crate::types::TopicName;

    struct Fixture {
        core: SessionCore,
        client_rx: mpsc::Receiver<ClientMessage>,
        timer_rx: mpsc::Receiver<TimerEvent>,
        router: Arc<MemoryRouter>,
    }

    fn publish(topic: &str, qos: QualityOfService) -> PublishMessage {
        PublishMessage::new(TopicName::new(topic.to_string()).unwrap(), Bytes::from_static(b"x"), qos, false)
    }

    fn build(config: SessionConfig) -> Fixture {
        let (client, client_rx) = ClientHandle::new(32);
        let (timer_tx, timer_rx) = mpsc::channel(32);
        let (collect_tx, _collect_rx) = mpsc::channel(1);
        let (admin_tx, _admin_rx) = mpsc::channel(32);
        let router = Arc::new(MemoryRouter::new());
        let deps = SessionDeps {
            client_id: "fixture".to_string(),
            clean_sess: false,
            client,
            config,
            hooks: HookBus::default(),
            router: router.clone(),
            retain: Arc::new(MemoryRetainStore::new()),
            manager: Arc::new(NoopSessionManager::new()),
            mqueue: Box::new(BoundedMemoryQueue::new(100)),
            timer_tx,
            collect_tx,
            admin_tx,
        };
        Fixture { core: SessionCore::new(deps), client_rx, timer_rx, router }
    }

    async fn expect_deliver(rx: &mut mpsc::Receiver<ClientMessage>) -> PublishMessage {
        match rx.recv().await.unwrap() {
            ClientMessage::Deliver(msg) => msg,
            other => panic!("expected Deliver, got {other:?}"),
        }
    }

    // S1 — QoS 1 happy path.
    #[tokio::test]
    async fn qos1_happy_path() {
        let mut f = build(SessionConfig::default());
        f.core.dispatch(publish("a/b", QualityOfService::Level1)).await;

        let delivered = expect_deliver(&mut f.client_rx).await;
        assert_eq!(delivered.packet_id(), Some(1));
        assert!(!delivered.dup());
        assert_eq!(f.core.inflight.len(), 1);
        assert_eq!(f.core.awaiting_ack.len(), 1);

        f.core.puback(1).await;
        assert!(f.core.inflight.is_empty());
        assert!(f.core.awaiting_ack.is_empty());
    }

    // S2 — QoS 2 sender side; invariant 1 (pubrec moves pktid out of both
    // `inflight` and `awaiting_ack` at once, into `awaiting_comp`).
    #[tokio::test]
    async fn qos2_sender_pubrec_then_pubcomp() {
        let mut f = build(SessionConfig::default());
        f.core.dispatch(publish("a/b", QualityOfService::Level2)).await;
        expect_deliver(&mut f.client_rx).await;

        f.core.pubrec(1).await;
        assert!(f.core.inflight.is_empty());
        assert!(f.core.awaiting_ack.is_empty());
        assert_eq!(f.core.awaiting_comp.len(), 1);

        f.core.pubcomp(1).await;
        assert!(f.core.awaiting_comp.is_empty());
    }

    // S3 — QoS 2 receiver side: publish_qos2 buffers, Router is only
    // touched on pubrel.
    #[tokio::test]
    async fn qos2_receiver_buffers_until_pubrel() {
        let mut f = build(SessionConfig::default());
        let mut inbound = publish("a/b", QualityOfService::Level2);
        inbound.set_packet_id(42);

        f.core.publish_qos2(inbound).await.unwrap();
        assert_eq!(f.core.awaiting_rel.len(), 1);
        assert!(f.router.published().is_empty());

        f.core.pubrel(42).await;
        assert!(f.core.awaiting_rel.is_empty());
        assert_eq!(f.router.published().len(), 1);
    }

    // S5 — inflight cap backpressure: second QoS1 dispatch queues until the
    // first is acked, then dequeues.
    #[tokio::test]
    async fn inflight_cap_queues_and_dequeues() {
        let mut config = SessionConfig::default();
        config.max_inflight = 1;
        let mut f = build(config);

        f.core.dispatch(publish("a", QualityOfService::Level1)).await;
        f.core.dispatch(publish("b", QualityOfService::Level1)).await;
        let first = expect_deliver(&mut f.client_rx).await;
        assert_eq!(first.topic_name().to_string(), "a");
        assert_eq!(f.core.inflight.len(), 1);
        assert_eq!(f.core.mqueue.len(), 1);

        f.core.puback(1).await;
        let second = expect_deliver(&mut f.client_rx).await;
        assert_eq!(second.topic_name().to_string(), "b");
        assert_eq!(second.packet_id(), Some(2));
    }

    // S6 — ack-timeout retry: redelivered with dup=true, same packet id,
    // awaiting_ack rearmed (not left empty). Time is paused and advanced
    // past the configured retry interval instead of sleeping for real.
    #[tokio::test(start_paused = true)]
    async fn ack_timeout_redelivers_with_dup() {
        let config = SessionConfig::default();
        let retry_interval = config.unack_retry_interval;
        let mut f = build(config);
        f.core.dispatch(publish("a/b", QualityOfService::Level1)).await;
        expect_deliver(&mut f.client_rx).await;

        tokio::time::advance(retry_interval + Duration::from_millis(1)).await;
        let event = f.timer_rx.recv().await.unwrap();
        f.core.handle_timer(event).await;

        let redelivered = expect_deliver(&mut f.client_rx).await;
        assert_eq!(redelivered.packet_id(), Some(1));
        assert!(redelivered.dup());
        assert_eq!(f.core.awaiting_ack.len(), 1);
        assert_eq!(f.core.inflight.len(), 1);
    }

    // Idempotence: identical resubscribe doesn't duplicate the entry or
    // replay retained messages a second time.
    #[tokio::test]
    async fn duplicate_subscribe_is_a_no_op() {
        let mut f = build(SessionConfig::default());
        let filter = TopicFilter::new("a/b").unwrap();
        f.core.subscribe(vec![(filter.clone(), QualityOfService::Level1)]).await;
        assert_eq!(f.core.subscriptions.len(), 1);

        f.core.subscribe(vec![(filter, QualityOfService::Level1)]).await;
        assert_eq!(f.core.subscriptions.len(), 1);
    }

    // Idempotence: a second puback for an already-acked packet id is a
    // logged no-op, not a panic or a double-decrement.
    #[tokio::test]
    async fn duplicate_puback_is_a_no_op() {
        let mut f = build(SessionConfig::default());
        f.core.dispatch(publish("a/b", QualityOfService::Level1)).await;
        expect_deliver(&mut f.client_rx).await;

        f.core.puback(1).await;
        f.core.puback(1).await;
        assert!(f.core.inflight.is_empty());
        assert!(f.core.awaiting_ack.is_empty());
    }

    // Boundary: qos2 inbound publish is rejected once awaiting_rel is at cap.
    #[tokio::test]
    async fn qos2_publish_dropped_at_awaiting_rel_cap() {
        let mut config = SessionConfig::default();
        config.max_awaiting_rel = 1;
        let mut f = build(config);

        let mut first = publish("a", QualityOfService::Level2);
        first.set_packet_id(1);
        f.core.publish_qos2(first).await.unwrap();

        let mut second = publish("b", QualityOfService::Level2);
        second.set_packet_id(2);
        let err = f.core.publish_qos2(second).await.unwrap_err();
        assert!(matches!(err, SessionError::Dropped));
    }

    // Property-style: random sequences of ack-path events (including
    // replays against unknown/already-consumed packet ids) must never panic
    // and must never let the two bounded sets exceed their caps or let
    // awaiting_ack/awaiting_comp overlap (invariants 1-3).
    #[tokio::test]
    async fn random_ack_sequences_preserve_invariants() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut config = SessionConfig::default();
        config.max_inflight = 3;
        config.max_awaiting_rel = 3;
        let mut f = build(config);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..3 {
            f.core.dispatch(publish("t", QualityOfService::Level1)).await;
            expect_deliver(&mut f.client_rx).await;
        }

        for _ in 0..300 {
            let pid = rng.gen_range(1..=4);
            match rng.gen_range(0..4) {
                0 => f.core.puback(pid).await,
                1 => f.core.pubrec(pid).await,
                2 => f.core.pubcomp(pid).await,
                _ => {
                    let mut msg = publish("t", QualityOfService::Level2);
                    msg.set_packet_id(pid);
                    let _ = f.core.publish_qos2(msg).await;
                }
            }

            assert!(f.core.inflight.len() <= f.core.config.max_inflight as usize);
            assert!(f.core.awaiting_rel.len() <= f.core.config.max_awaiting_rel);
            assert!(f.core.awaiting_ack.keys().all(|id| !f.core.awaiting_comp.contains_key(id)));
        }
    }

    // Resume redelivers inflight oldest-first and replays PubRel for
    // anything already in awaiting_comp, preserving invariant 1.
    #[tokio::test]
    async fn resume_redelivers_inflight_and_replays_pubrel() {
        let mut f = build(SessionConfig::default());
        f.core.dispatch(publish("a", QualityOfService::Level1)).await;
        f.core.dispatch(publish("b", QualityOfService::Level2)).await;
        expect_deliver(&mut f.client_rx).await;
        expect_deliver(&mut f.client_rx).await;
        f.core.pubrec(2).await;
        assert_eq!(f.core.awaiting_comp.len(), 1);

        let (new_client, mut new_rx) = ClientHandle::new(32);
        f.core.resume(new_client).await;

        match new_rx.recv().await.unwrap() {
            ClientMessage::Redeliver(RedeliverKind::PubRel, 2) => {}
            other => panic!("expected PubRel replay first, got {other:?}"),
        }
        let redelivered = expect_deliver(&mut new_rx).await;
        assert_eq!(redelivered.packet_id(), Some(1));
        assert!(redelivered.dup());
    }
}
