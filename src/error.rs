#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("qos 2 awaiting_rel window full, message dropped")]
    Dropped,
    #[error("session mailbox closed")]
    MailboxClosed,
    #[error("timed out waiting for session reply")]
    Timeout,
    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),
}
