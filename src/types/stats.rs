use tokio::time::Instant;

/// Snapshot published to the Session Manager on start and on each
/// `CollectInfo` tick. Field shape mirrors `mesquitte-core`'s `Session`
/// getters, reshaped as an immutable value instead of a live borrow since
/// it crosses an actor boundary.
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub client_id: String,
    pub clean_sess: bool,
    pub subscriptions: usize,
    pub max_inflight: u16,
    pub inflight_queue_len: usize,
    pub message_queue_len: usize,
    pub message_dropped: u64,
    pub awaiting_rel: usize,
    pub awaiting_ack: usize,
    pub awaiting_comp: usize,
    pub created_at: Instant,
}
