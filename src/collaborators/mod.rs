//! External collaborators a session talks to but never owns: the topic
//! router, the retained-message store, the pending-message queue, and the
//! session registry. Each is a narrow trait plus an in-memory reference
//! implementation, following `mesquitte-core`'s `store::{message,retain,
//! topic}` split rather than one monolithic broker interface.

pub mod manager;
pub mod mqueue;
pub mod retain;
pub mod router;

pub use manager::{NoopSessionManager, SessionManager};
pub use mqueue::{BoundedMemoryQueue, MQueue};
pub use retain::{MemoryRetainStore, RetainStore};
pub use router::{MemoryRouter, Router};
