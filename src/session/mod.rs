//! The per-client Session actor: mailbox, state machine, and public
//! handle. See `SPEC_FULL.md` §3-§6 for the full contract.

mod actor;
mod event;
mod handle;
mod inflight;
mod packet_id;
mod state;

pub use event::ClientDownReason;
pub use handle::{SessionHandle, SessionStart};
pub use state::Termination;
