use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use super::message::PublishMessage;

static NEXT_CONNECTION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Reason a previous connection is being kicked out by a resuming one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KickReason {
    DuplicateClientId,
}

impl fmt::Display for KickReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KickReason::DuplicateClientId => write!(f, "kicked out by a new connection"),
        }
    }
}

/// A QoS 2 redelivery kind. Only `PubRel` replay is ever sent standalone;
/// ordinary QoS 1/2 redelivery goes through `ClientMessage::Deliver` with
/// `dup` set, reusing the original packet id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeliverKind {
    PubRel,
}

/// Outbox message sent to a client connection's mailbox.
#[derive(Debug)]
pub enum ClientMessage {
    Deliver(PublishMessage),
    Redeliver(RedeliverKind, u16),
    Kickout(KickReason, ClientHandle),
}

/// A handle to the client connection currently owning a session.
///
/// Grounded on `mesquitte-core`'s `clients: DashMap<ClientId, mpsc::Sender<Outgoing>>`:
/// the connection itself is addressed purely by channel. The
/// `connection_seq` is this crate's own addition, needed to give `resume`'s
/// "old handle == new handle" comparison (open question in the spec) a
/// well-defined identity that survives cloning a handle.
#[derive(Clone)]
pub struct ClientHandle {
    connection_seq: u64,
    tx: mpsc::Sender<ClientMessage>,
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("connection_seq", &self.connection_seq)
            .finish()
    }
}

impl PartialEq for ClientHandle {
    fn eq(&self, other: &Self) -> bool {
        self.connection_seq == other.connection_seq
    }
}

impl Eq for ClientHandle {}

impl ClientHandle {
    /// Builds a new handle and its matching receiver, as a fresh connection identity.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ClientMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        let handle = Self {
            connection_seq: NEXT_CONNECTION_SEQ.fetch_add(1, Ordering::Relaxed),
            tx,
        };
        (handle, rx)
    }

    pub fn connection_seq(&self) -> u64 {
        self.connection_seq
    }

    pub async fn send(&self, msg: ClientMessage) -> Result<(), mpsc::error::SendError<ClientMessage>> {
        self.tx.send(msg).await
    }

    /// Resolves once the client's receiver has been dropped — the liveness
    /// signal a session's `client_down_watch` waits on.
    pub async fn closed(&self) {
        self.tx.closed().await;
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
