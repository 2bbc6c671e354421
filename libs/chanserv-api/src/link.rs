use serde::{Deserialize, Serialize};

use crate::actor::Actor;

/// Outbound topic change, as propagated to the rest of the network.
///
/// Peers resolve concurrent changes by comparing timestamps, so the event
/// carries both the new timestamp and the one it superseded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicChange {
    pub channel: String,
    pub setter: String,
    /// Timestamp of this change.
    pub ts: i64,
    /// Timestamp in effect before this change (0 = no previous topic).
    pub prev_ts: i64,
    pub text: String,
}

/// Connection to the rest of the network. Hand-off is fire-and-forget.
pub trait UpstreamLink: Send + Sync {
    fn emit_topic_change(&self, change: &TopicChange);
}

/// Sink for the record of actions performed by services.
pub trait AuditLog: Send + Sync {
    fn log_action(&self, actor: &Actor, verb: &str, channel: &str);
}
