//! Owned, named, cancellable one-shot timers.
//!
//! Each live timer in `Session` state is a [`TimerHandle`] wrapping a spawned
//! sleep task. `cancel` aborts the task; aborting an already-fired (or
//! already-aborted) task is a no-op, which is what gives Invariant 6
//! ("every timer has a corresponding cancel") its idempotence for free.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct TimerHandle {
    join: JoinHandle<()>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.join.abort();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.join.abort();
    }
}

/// Arms a one-shot timer that sends `make_event()` on `tx` after `delay`.
///
/// `make_event` is evaluated only if the timer actually fires, so the event
/// it produces can borrow nothing and just needs to be `'static`.
pub fn arm<E, F>(delay: Duration, tx: mpsc::Sender<E>, make_event: F) -> TimerHandle
where
    E: Send + 'static,
    F: FnOnce() -> E + Send + 'static,
{
    let join = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tx.send(make_event()).await;
    });
    TimerHandle { join }
}
