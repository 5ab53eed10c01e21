//! Per-client MQTT 3.1.1 session actor.
//!
//! One [`session::SessionHandle`] models one logical client identity: its
//! subscriptions, its QoS 1/2 in-flight windows, and the resume protocol that
//! hands an existing session to a newly reconnected client. The wire codec,
//! topic-matching router, retained-message store, and session registry are
//! external collaborators, reachable here only through the traits in
//! [`collaborators`].

pub mod collaborators;
pub mod config;
pub mod error;
pub mod session;
pub mod timer;
pub mod types;

#[macro_export]
macro_rules! trace { ($($x:tt)*) => (
    #[cfg(feature = "log")] {
        log::trace!($($x)*)
    }
) }

#[macro_export]
macro_rules! debug { ($($x:tt)*) => (
    #[cfg(feature = "log")] {
        log::debug!($($x)*)
    }
) }

#[macro_export]
macro_rules! info { ($($x:tt)*) => (
    #[cfg(feature = "log")] {
        log::info!($($x)*)
    }
) }

#[macro_export]
macro_rules! warn { ($($x:tt)*) => (
    #[cfg(feature = "log")] {
        log::warn!($($x)*)
    }
) }

#[macro_export]
macro_rules! error { ($($x:tt)*) => (
    #[cfg(feature = "log")] {
        log::error!($($x)*)
    }
) }
