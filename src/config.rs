use std::time::Duration;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Per-session tunables, loaded from the environment at session start.
///
/// Every key has a hard-coded default (see table in the crate spec), so
/// `from_env` can never fail — an unset or unparsable variable just falls
/// back silently.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Max unacked QoS 1/2 messages outstanding to the client. 0 = unbounded.
    pub max_inflight: u16,
    /// Max in-progress inbound QoS 2 messages (`awaiting_rel`). 0 = unbounded.
    pub max_awaiting_rel: usize,
    /// Timeout waiting for PUBREL (receiver side) / PUBCOMP (sender side).
    pub await_rel_timeout: Duration,
    /// Retransmit interval for unacked QoS 1/2 deliveries.
    pub unack_retry_interval: Duration,
    /// TTL for a persistent (`clean_sess=false`) session after the client disconnects.
    pub expired_after: Duration,
    /// Interval between `CollectInfo` stats ticks. `Duration::ZERO` disables it.
    pub collect_interval: Duration,
    /// Bound on the reference in-memory `MQueue` implementation.
    pub max_in_mem_pending_messages: usize,
    /// Caller-side deadline for the synchronous QoS 2 `publish` call.
    pub publish_qos2_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_inflight: 0,
            max_awaiting_rel: 100,
            await_rel_timeout: Duration::from_secs(8),
            unack_retry_interval: Duration::from_secs(20),
            expired_after: Duration::from_secs(48 * 3600),
            collect_interval: Duration::ZERO,
            max_in_mem_pending_messages: 1000,
            publish_qos2_timeout: Duration::from_secs(60),
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_inflight: env_or("MQTT_SESSION_MAX_INFLIGHT", default.max_inflight),
            max_awaiting_rel: env_or("MQTT_SESSION_MAX_AWAITING_REL", default.max_awaiting_rel),
            await_rel_timeout: Duration::from_secs(env_or(
                "MQTT_SESSION_AWAIT_REL_TIMEOUT",
                default.await_rel_timeout.as_secs(),
            )),
            unack_retry_interval: Duration::from_secs(env_or(
                "MQTT_SESSION_UNACK_RETRY_INTERVAL",
                default.unack_retry_interval.as_secs(),
            )),
            expired_after: Duration::from_secs(
                env_or("MQTT_SESSION_EXPIRED_AFTER_HOURS", 48u64) * 3600,
            ),
            collect_interval: Duration::from_secs(env_or(
                "MQTT_SESSION_COLLECT_INTERVAL",
                default.collect_interval.as_secs(),
            )),
            max_in_mem_pending_messages: env_or(
                "MQTT_SESSION_MAX_PENDING_MESSAGES",
                default.max_in_mem_pending_messages,
            ),
            publish_qos2_timeout: Duration::from_secs(env_or(
                "MQTT_SESSION_PUBLISH_QOS2_TIMEOUT",
                default.publish_qos2_timeout.as_secs(),
            )),
        }
    }
}
