use std::future::Future;
use std::pin::Pin;

use crate::types::stats::SessionStats;

/// The session registry. Out of this crate's implementation scope by
/// design (§1) — a real broker keeps a global table of live sessions here,
/// keyed by client id, to answer "who holds this client id" and to expose
/// stats to an admin surface.
///
/// Grounded on `mesquitte-core`'s `GlobalState::add_client` /
/// `remove_client`, split into its own narrow trait the way `Router` and
/// `RetainStore` are.
pub trait SessionManager: Send + Sync {
    fn register_session(&self, client_id: &str) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    fn unregister_session(&self, client_id: &str) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    fn report_stats(&self, stats: SessionStats) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Reference `SessionManager`: does nothing. Enough to drive this crate's
/// own test suite, which never needs to answer "who else holds this client
/// id" across sessions.
#[derive(Default)]
pub struct NoopSessionManager;

impl NoopSessionManager {
    pub fn new() -> Self {
        Self
    }
}

impl SessionManager for NoopSessionManager {
    fn register_session(&self, _client_id: &str) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }

    fn unregister_session(&self, _client_id: &str) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }

    fn report_stats(&self, _stats: SessionStats) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }
}
