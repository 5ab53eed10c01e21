use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::collaborators::{MQueue, RetainStore, Router, SessionManager};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::types::client::ClientHandle;
use crate::types::hooks::HookBus;
use crate::types::message::PublishMessage;
use crate::types::{QualityOfService, TopicFilter};

use super::actor::SessionActor;
use super::event::{AckEvent, AdminEvent, PublishRequest, Resume, Subscribe};
use super::state::{SessionCore, SessionDeps};

/// Mailbox capacity per priority band. Grounded on `mesquitte-core`'s
/// `mpsc::channel(8)` for its deliver channel; picked generously here since
/// a session's own bands see far less traffic than a read loop's raw byte
/// stream.
const BAND_CAPACITY: usize = 32;

/// Everything outside this crate needed to start a session: the
/// collaborators, plus the owning client's initial connection.
pub struct SessionStart {
    pub client_id: String,
    pub clean_sess: bool,
    pub client: ClientHandle,
    pub config: SessionConfig,
    pub hooks: HookBus,
    pub router: Arc<dyn Router>,
    pub retain: Arc<dyn RetainStore>,
    pub manager: Arc<dyn SessionManager>,
    pub mqueue: Box<dyn MQueue>,
}

/// Public handle to a running session actor: cloneable, cheap, made
/// entirely of channel senders. Matches §6's `SessionHandle` surface.
///
/// Grounded on `mesquitte-core`'s pattern of addressing a connection only
/// through its outbox sender — a `SessionHandle` is the same idea turned
/// around, addressing the *session* side instead of the client side.
#[derive(Clone)]
pub struct SessionHandle {
    router: Arc<dyn Router>,
    admin_tx: mpsc::Sender<AdminEvent>,
    resume_tx: mpsc::Sender<Resume>,
    acks_tx: mpsc::Sender<AckEvent>,
    publish_tx: mpsc::Sender<PublishRequest>,
    puback_tx: mpsc::Sender<u16>,
    unsubscribe_tx: mpsc::Sender<Vec<TopicFilter>>,
    subscribe_tx: mpsc::Sender<Subscribe>,
    dispatch_tx: mpsc::Sender<PublishMessage>,
    publish_qos2_timeout: std::time::Duration,
    // Held only here (never cloned into the actor); the actor's keepalive
    // receiver resolves to `None` once every clone of this handle is
    // dropped, which is the session's "every SessionHandle dropped" exit.
    _keepalive: mpsc::Sender<()>,
}

impl SessionHandle {
    /// §6 `start`. Spawns the actor task and returns a handle to it.
    pub fn start(start: SessionStart) -> SessionHandle {
        let (admin_tx, admin_rx) = mpsc::channel(BAND_CAPACITY);
        let (resume_tx, resume_rx) = mpsc::channel(BAND_CAPACITY);
        let (acks_tx, acks_rx) = mpsc::channel(BAND_CAPACITY);
        let (publish_tx, publish_rx) = mpsc::channel(BAND_CAPACITY);
        let (puback_tx, puback_rx) = mpsc::channel(BAND_CAPACITY);
        let (unsubscribe_tx, unsubscribe_rx) = mpsc::channel(BAND_CAPACITY);
        let (subscribe_tx, subscribe_rx) = mpsc::channel(BAND_CAPACITY);
        let (timer_tx, timer_rx) = mpsc::channel(BAND_CAPACITY);
        let (collect_tx, collect_rx) = mpsc::channel(1);
        let (dispatch_tx, dispatch_rx) = mpsc::channel(BAND_CAPACITY);
        let (keepalive_tx, keepalive_rx) = mpsc::channel::<()>(1);

        let router = start.router.clone();
        let publish_qos2_timeout = start.config.publish_qos2_timeout;

        let deps = SessionDeps {
            client_id: start.client_id,
            clean_sess: start.clean_sess,
            client: start.client,
            config: start.config,
            hooks: start.hooks,
            router: start.router,
            retain: start.retain,
            manager: start.manager,
            mqueue: start.mqueue,
            timer_tx,
            collect_tx,
            admin_tx: admin_tx.clone(),
        };
        let mut core = SessionCore::new(deps);
        core.arm_collect_timer();

        let actor = SessionActor {
            core,
            admin_rx,
            resume_rx,
            acks_rx,
            publish_rx,
            puback_rx,
            unsubscribe_rx,
            subscribe_rx,
            timer_rx,
            collect_rx,
            dispatch_rx,
            keepalive_rx,
        };
        tokio::spawn(actor.run());

        SessionHandle {
            router,
            admin_tx,
            resume_tx,
            acks_tx,
            publish_tx,
            puback_tx,
            unsubscribe_tx,
            subscribe_tx,
            dispatch_tx,
            publish_qos2_timeout,
            _keepalive: keepalive_tx,
        }
    }

    /// The Router's entry point for delivering a matched message to this
    /// session (`Dispatch(msg)`, §6).
    pub async fn dispatch(&self, msg: PublishMessage) -> Result<(), SessionError> {
        self.dispatch_tx.send(msg).await.map_err(|_| SessionError::MailboxClosed)
    }

    pub async fn resume(&self, new_client: ClientHandle) -> Result<(), SessionError> {
        self.resume_tx
            .send(Resume { new_client })
            .await
            .map_err(|_| SessionError::MailboxClosed)
    }

    pub async fn destroy(&self) -> Result<(), SessionError> {
        self.admin_tx.send(AdminEvent::Destroy).await.map_err(|_| SessionError::MailboxClosed)
    }

    pub async fn client_down(&self, handle: ClientHandle, reason: super::event::ClientDownReason) -> Result<(), SessionError> {
        self.admin_tx
            .send(AdminEvent::ClientDown(handle, reason))
            .await
            .map_err(|_| SessionError::MailboxClosed)
    }

    /// §4.1 `publish`: QoS 0/1 bypass the session and go straight to the
    /// Router; QoS 2 is the session's one synchronous operation.
    pub async fn publish(&self, msg: PublishMessage) -> Result<(), SessionError> {
        match msg.qos() {
            QualityOfService::Level0 | QualityOfService::Level1 => {
                self.router.publish(msg).await;
                Ok(())
            }
            QualityOfService::Level2 => {
                let (reply_tx, reply_rx) = oneshot::channel();
                self.publish_tx
                    .send(PublishRequest { msg, reply: reply_tx })
                    .await
                    .map_err(|_| SessionError::MailboxClosed)?;
                tokio::time::timeout(self.publish_qos2_timeout, reply_rx)
                    .await
                    .map_err(|_| SessionError::Timeout)?
                    .map_err(|_| SessionError::MailboxClosed)?
            }
        }
    }

    pub async fn puback(&self, packet_id: u16) -> Result<(), SessionError> {
        self.puback_tx.send(packet_id).await.map_err(|_| SessionError::MailboxClosed)
    }

    pub async fn pubrec(&self, packet_id: u16) -> Result<(), SessionError> {
        self.acks_tx.send(AckEvent::PubRec(packet_id)).await.map_err(|_| SessionError::MailboxClosed)
    }

    pub async fn pubrel(&self, packet_id: u16) -> Result<(), SessionError> {
        self.acks_tx.send(AckEvent::PubRel(packet_id)).await.map_err(|_| SessionError::MailboxClosed)
    }

    pub async fn pubcomp(&self, packet_id: u16) -> Result<(), SessionError> {
        self.acks_tx.send(AckEvent::PubComp(packet_id)).await.map_err(|_| SessionError::MailboxClosed)
    }

    pub async fn subscribe(&self, topics: Vec<(TopicFilter, QualityOfService)>) -> Result<Vec<QualityOfService>, SessionError> {
        let (ack, ack_rx) = oneshot::channel();
        self.subscribe_tx
            .send(Subscribe { topics, ack })
            .await
            .map_err(|_| SessionError::MailboxClosed)?;
        ack_rx.await.map_err(|_| SessionError::MailboxClosed)
    }

    pub async fn unsubscribe(&self, topics: Vec<TopicFilter>) -> Result<(), SessionError> {
        self.unsubscribe_tx.send(topics).await.map_err(|_| SessionError::MailboxClosed)
    }
}
