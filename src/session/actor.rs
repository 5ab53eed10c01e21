use tokio::sync::mpsc;

use crate::types::message::PublishMessage;

use super::event::{AckEvent, AdminEvent, PublishRequest, Resume, Subscribe, TimerEvent};
use super::state::{SessionCore, Termination};

/// The event loop: one `tokio::select!` with `biased;` ordering over one
/// receiver per priority band (§4.1). Band order below is exactly the
/// spec's priority ladder, top (10, admin) to bottom (1, `Dispatch`); the
/// `keepalive` branch has no numbered priority of its own — it only ever
/// fires once, at actor teardown.
///
/// Grounded on `mesquitte-core`'s `read_from_client` loop
/// (`protocols/v4/read_loop.rs`): a `select!` over socket-read /
/// deliver-channel / keepalive-tick, generalized here to many more bands
/// since the spec's ladder is finer-grained than a connection read loop.
pub struct SessionActor {
    pub core: SessionCore,
    pub admin_rx: mpsc::Receiver<AdminEvent>,
    pub resume_rx: mpsc::Receiver<Resume>,
    pub acks_rx: mpsc::Receiver<AckEvent>,
    pub publish_rx: mpsc::Receiver<PublishRequest>,
    pub puback_rx: mpsc::Receiver<u16>,
    pub unsubscribe_rx: mpsc::Receiver<Vec<crate::types::TopicFilter>>,
    pub subscribe_rx: mpsc::Receiver<Subscribe>,
    pub timer_rx: mpsc::Receiver<TimerEvent>,
    pub collect_rx: mpsc::Receiver<()>,
    pub dispatch_rx: mpsc::Receiver<PublishMessage>,
    pub keepalive_rx: mpsc::Receiver<()>,
}

impl SessionActor {
    pub async fn run(mut self) {
        let client_id = self.core.client_id().to_string();
        self.core.register().await;
        let reason = self.event_loop().await;
        crate::info!("session {}: terminating ({:?})", client_id, reason);
        self.core.teardown().await;
    }

    async fn event_loop(&mut self) -> Termination {
        loop {
            tokio::select! {
                biased;

                Some(event) = self.admin_rx.recv() => {
                    match event {
                        AdminEvent::Destroy => return Termination::Destroy,
                        AdminEvent::SessionExpired => return Termination::Expired,
                        AdminEvent::ClientDown(handle, reason) => {
                            if let Some(term) = self.core.client_down(handle, reason).await {
                                return term;
                            }
                        }
                    }
                }

                Some(resume) = self.resume_rx.recv() => {
                    self.core.resume(resume.new_client).await;
                }

                Some(ack) = self.acks_rx.recv() => {
                    match ack {
                        AckEvent::PubRel(id) => self.core.pubrel(id).await,
                        AckEvent::PubComp(id) => self.core.pubcomp(id).await,
                        AckEvent::PubRec(id) => self.core.pubrec(id).await,
                    }
                }

                Some(req) = self.publish_rx.recv() => {
                    let result = self.core.publish_qos2(req.msg).await;
                    let _ = req.reply.send(result);
                }

                Some(packet_id) = self.puback_rx.recv() => {
                    self.core.puback(packet_id).await;
                }

                Some(topics) = self.unsubscribe_rx.recv() => {
                    self.core.unsubscribe(topics).await;
                }

                Some(subscribe) = self.subscribe_rx.recv() => {
                    let granted = self.core.subscribe(subscribe.topics).await;
                    let _ = subscribe.ack.send(granted);
                }

                Some(timer_event) = self.timer_rx.recv() => {
                    self.core.handle_timer(timer_event).await;
                }

                Some(()) = self.collect_rx.recv() => {
                    self.core.report_stats().await;
                    self.core.arm_collect_timer();
                }

                Some(msg) = self.dispatch_rx.recv() => {
                    self.core.dispatch(msg).await;
                }

                _ = self.keepalive_rx.recv() => {
                    return Termination::Destroy;
                }
            }
        }
    }
}
