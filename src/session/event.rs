use tokio::sync::oneshot;

use crate::error::SessionError;
use crate::types::client::ClientHandle;
use crate::types::message::PublishMessage;
use crate::types::{QualityOfService, TopicFilter};

/// Why a client connection went down. The reference `ClientHandle` only
/// ever reports `Disconnected` (its receiver was dropped); the variant
/// exists so a real connection handler can report richer reasons without
/// changing the session's dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientDownReason {
    Disconnected,
}

/// Priority band 10 — admin/liveness. Always drained first.
#[derive(Debug)]
pub enum AdminEvent {
    ClientDown(ClientHandle, ClientDownReason),
    SessionExpired,
    Destroy,
}

/// Priority band 9 — resume.
#[derive(Debug)]
pub struct Resume {
    pub new_client: ClientHandle,
}

/// Priority band 8 — client-originated QoS 2 / ack traffic.
#[derive(Debug)]
pub enum AckEvent {
    PubRel(u16),
    PubComp(u16),
    PubRec(u16),
}

/// Synchronous QoS 2 inbound publish request, also band 8. Carries its own
/// reply channel since the caller blocks on the session's decision.
#[derive(Debug)]
pub struct PublishRequest {
    pub msg: PublishMessage,
    pub reply: oneshot::Sender<Result<(), SessionError>>,
}

/// Priority band 5 — timer ticks.
#[derive(Debug, Clone, Copy)]
pub enum TimerEvent {
    AwaitingAckTimeout(u16),
    AwaitingRelTimeout(u16),
    AwaitingCompTimeout(u16),
}

/// Priority band 5 — subscribe. `ack` is the spec's `ack_fn`: the granted
/// (or echoed) QoS list for the request, in request order.
#[derive(Debug)]
pub struct Subscribe {
    pub topics: Vec<(TopicFilter, QualityOfService)>,
    pub ack: oneshot::Sender<Vec<QualityOfService>>,
}
